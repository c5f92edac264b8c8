//-
// Copyright (c) 2020, the Mockimap authors
//
// This file is part of Mockimap.
//
// Mockimap is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mockimap is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along
// with Mockimap. If not, see <http://www.gnu.org/licenses/>.

//! The in-memory store of users and their mailbox hierarchies.
//!
//! One `MailStore` is shared by every connection of a server. It owns the
//! name-to-mailbox mapping; the mailboxes themselves are reference-counted so
//! that sessions can keep using one while the store's lock is released.
//!
//! The store lock is always taken before any mailbox lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::prelude::*;
use log::info;

use super::mailbox::{ListenerId, Mailbox};
use super::model::*;
use crate::support::error::Error;
use crate::support::mailbox_paths::*;
use crate::support::system_config::UserConfig;

pub struct MailStore {
    state: Mutex<StoreState>,
}

struct StoreState {
    users: HashMap<String, User>,
    next_uid_validity: u32,
}

struct User {
    password: String,
    mailboxes: BTreeMap<String, Arc<Mailbox>>,
}

/// One line of a `LIST` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListResponse {
    pub name: String,
    pub attributes: Vec<MailboxAttribute>,
}

impl Default for MailStore {
    fn default() -> Self {
        MailStore::new()
    }
}

impl MailStore {
    pub fn new() -> Self {
        MailStore {
            state: Mutex::new(StoreState {
                users: HashMap::new(),
                // RFC 3501 2.3.1.1: must not repeat across restarts
                next_uid_validity: Utc::now().timestamp() as u32,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    /// Create a user with an empty `INBOX`.
    pub fn add_user(&self, name: &str, password: &str) -> Result<(), Error> {
        let mut state = self.lock();
        if state.users.contains_key(name) {
            return Err(Error::UserExists);
        }

        let inbox = state.new_mailbox("INBOX", true);
        let mut mailboxes = BTreeMap::new();
        mailboxes.insert("INBOX".to_owned(), inbox);
        state.users.insert(
            name.to_owned(),
            User {
                password: password.to_owned(),
                mailboxes,
            },
        );
        Ok(())
    }

    /// Create the user described by `config` along with its mailboxes.
    pub fn provision(&self, config: &UserConfig) -> Result<(), Error> {
        self.add_user(&config.name, &config.password)?;
        for mailbox in &config.mailboxes {
            match self.create_mailbox(&config.name, mailbox) {
                Ok(()) | Err(Error::MailboxExists) => (),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Check a user's credentials.
    ///
    /// If `auto_create` is set, an unknown user is created on the spot with
    /// the given password.
    pub fn authenticate(
        &self,
        name: &str,
        password: &str,
        auto_create: bool,
    ) -> Result<(), Error> {
        {
            let state = self.lock();
            match state.users.get(name) {
                Some(user) if user.password == password => return Ok(()),
                Some(_) => return Err(Error::BadCredentials),
                None if !auto_create => return Err(Error::BadCredentials),
                None => (),
            }
        }

        info!("Auto-creating user {}", name);
        match self.add_user(name, password) {
            // Lost a race with another session creating the same user
            Err(Error::UserExists) => {
                self.authenticate(name, password, false)
            }
            r => r,
        }
    }

    /// Look up a mailbox by (unnormalised) name.
    pub fn mailbox(
        &self,
        user: &str,
        name: &str,
    ) -> Result<Arc<Mailbox>, Error> {
        let name = normalise_mailbox_name(name)?;
        let state = self.lock();
        state
            .user(user)?
            .mailboxes
            .get(&name)
            .cloned()
            .ok_or(Error::NxMailbox)
    }

    /// Create a mailbox along with any missing superiors.
    ///
    /// A name which exists only as a non-selectable hierarchy node is turned
    /// back into a real mailbox.
    pub fn create_mailbox(&self, user: &str, name: &str) -> Result<(), Error> {
        let name = normalise_mailbox_name(name)?;
        let mut state = self.lock();
        if let Some(existing) = state.user(user)?.mailboxes.get(&name) {
            if existing.is_selectable() {
                return Err(Error::MailboxExists);
            }
        }

        let missing: Vec<String> = superiors(&name)
            .filter(|s| {
                state
                    .users
                    .get(user)
                    .map_or(false, |u| !u.mailboxes.contains_key(*s))
            })
            .map(str::to_owned)
            .collect();
        let new_mailboxes: Vec<(String, Arc<Mailbox>)> = missing
            .into_iter()
            .chain(std::iter::once(name))
            .map(|n| {
                let mailbox = state.new_mailbox(&n, true);
                (n, mailbox)
            })
            .collect();

        let user = state.user_mut(user)?;
        for (name, mailbox) in new_mailboxes {
            user.mailboxes.insert(name, mailbox);
        }
        Ok(())
    }

    /// Delete a mailbox.
    ///
    /// Every session with the mailbox selected, except the one registered as
    /// `quiet`, is told that it has been deleted. A mailbox with inferiors
    /// survives as a non-selectable hierarchy node.
    pub fn delete_mailbox(
        &self,
        user: &str,
        name: &str,
        quiet: Option<ListenerId>,
    ) -> Result<(), Error> {
        let name = normalise_mailbox_name(name)?;
        if "INBOX" == name {
            return Err(Error::BadOperationOnInbox);
        }

        let mut state = self.lock();
        let existing = state
            .user(user)?
            .mailboxes
            .get(&name)
            .cloned()
            .ok_or(Error::NxMailbox)?;
        let has_inferiors = state
            .user(user)?
            .mailboxes
            .keys()
            .any(|k| is_inferior_of(k, &name));

        if has_inferiors {
            if !existing.is_selectable() {
                return Err(Error::MailboxHasInferiors);
            }

            let placeholder = state.new_mailbox(&name, false);
            state.user_mut(user)?.mailboxes.insert(name, placeholder);
        } else {
            state.user_mut(user)?.mailboxes.remove(&name);
        }

        existing.mark_deleted(quiet);
        Ok(())
    }

    /// List the mailboxes whose names match `reference` + `pattern`.
    pub fn list(
        &self,
        user: &str,
        reference: &str,
        pattern: &str,
    ) -> Result<Vec<ListResponse>, Error> {
        let full_pattern = format!("{}{}", reference, pattern);
        let matcher = mailbox_path_matcher(&full_pattern);

        let state = self.lock();
        let mailboxes = &state.user(user)?.mailboxes;
        Ok(mailboxes
            .iter()
            .filter(|&(name, _)| matcher(name))
            .map(|(name, mailbox)| {
                let mut attributes = Vec::new();
                if !mailbox.is_selectable() {
                    attributes.push(MailboxAttribute::Noselect);
                }
                if mailboxes.keys().any(|k| is_inferior_of(k, name)) {
                    attributes.push(MailboxAttribute::HasChildren);
                } else {
                    attributes.push(MailboxAttribute::HasNoChildren);
                }

                ListResponse {
                    name: name.clone(),
                    attributes,
                }
            })
            .collect())
    }
}

impl StoreState {
    fn user(&self, name: &str) -> Result<&User, Error> {
        self.users.get(name).ok_or(Error::NxUser)
    }

    fn user_mut(&mut self, name: &str) -> Result<&mut User, Error> {
        self.users.get_mut(name).ok_or(Error::NxUser)
    }

    fn new_mailbox(&mut self, name: &str, selectable: bool) -> Arc<Mailbox> {
        let uid_validity = self.next_uid_validity.max(1);
        self.next_uid_validity = uid_validity.wrapping_add(1);
        Arc::new(Mailbox::new(name.to_owned(), uid_validity, selectable))
    }
}
