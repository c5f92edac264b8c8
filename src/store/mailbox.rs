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

//! The shared, canonical state of a single mailbox.
//!
//! Every session with the mailbox selected holds an `Arc<Mailbox>`. All
//! structural changes go through `MailboxState` with the mailbox lock held,
//! and every registered listener is told about each change before the lock
//! is released. A listener therefore never observes events out of order with
//! respect to the counters it can read under the same lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::prelude::*;
use log::warn;

use super::message::StoredMessage;
use super::model::*;
use crate::support::error::Error;

/// The callbacks a mailbox makes into the views watching it.
///
/// All callbacks are invoked with the mailbox lock held. Implementations
/// must not call back into the mailbox.
pub trait MailboxListener: Send + Sync {
    /// A message was added to the end of the mailbox.
    fn on_appended(&self);
    /// The message at `seqnum` in the mailbox's numbering at the instant of
    /// deletion was removed.
    fn on_expunged(&self, seqnum: Seqnum);
    /// The flags of the message at `seqnum` (canonical numbering) changed.
    fn on_flags_changed(&self, seqnum: Seqnum, uid: Uid, flags: &[Flag]);
    /// The mailbox itself was deleted. No further callbacks will be made.
    fn on_mailbox_deleted(&self);
}

/// Identifies one registration of a listener with a mailbox.
///
/// Ids are unique across all mailboxes in the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

pub struct Mailbox {
    name: String,
    state: Mutex<MailboxState>,
}

pub struct MailboxState {
    messages: Vec<StoredMessage>,
    uid_validity: u32,
    next_uid: Uid,
    selectable: bool,
    deleted: bool,
    listeners: Vec<(ListenerId, Weak<dyn MailboxListener>)>,
}

impl Mailbox {
    pub fn new(name: String, uid_validity: u32, selectable: bool) -> Self {
        Mailbox {
            name,
            state: Mutex::new(MailboxState {
                messages: Vec::new(),
                uid_validity,
                next_uid: Uid::MIN,
                selectable,
                deleted: false,
                listeners: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the mailbox state.
    ///
    /// Nothing else may be locked while the guard is held except the buffers
    /// of views, which the mailbox itself locks in its callbacks.
    pub fn lock(&self) -> MutexGuard<'_, MailboxState> {
        self.state.lock().unwrap()
    }

    pub fn is_selectable(&self) -> bool {
        let state = self.lock();
        state.selectable && !state.deleted
    }

    pub fn append(
        &self,
        data: Arc<[u8]>,
        flags: Vec<Flag>,
        internal_date: DateTime<FixedOffset>,
    ) -> Result<Uid, Error> {
        self.lock().append(data, flags, internal_date)
    }

    pub fn status(&self) -> Result<StatusResponse, Error> {
        let state = self.lock();
        if state.deleted {
            return Err(Error::MailboxDeleted);
        }
        if !state.selectable {
            return Err(Error::MailboxUnselectable);
        }

        Ok(StatusResponse {
            messages: state.messages.len(),
            recent: state.messages.iter().filter(|m| m.recent).count(),
            uidnext: state.next_uid.0.get(),
            uidvalidity: state.uid_validity,
            unseen: state
                .messages
                .iter()
                .filter(|m| !m.has_flag(&Flag::Seen))
                .count(),
        })
    }

    /// Mark this mailbox as deleted, discarding its messages and telling
    /// every listener other than `quiet` about it.
    pub(super) fn mark_deleted(&self, quiet: Option<ListenerId>) {
        let mut state = self.lock();
        state.deleted = true;
        state.selectable = false;
        state.messages.clear();
        state.notify(quiet, |l| l.on_mailbox_deleted());
        state.listeners.clear();
    }
}

impl MailboxState {
    /// Register `listener` to receive change notifications.
    ///
    /// The mailbox only holds a weak reference. A listener that has been
    /// dropped is forgotten the next time a notification is sent.
    pub fn subscribe(
        &mut self,
        listener: Weak<dyn MailboxListener>,
    ) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|&(lid, _)| lid != id);
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn messages(&self) -> &[StoredMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Count the messages with `\Recent`, clearing it from all of them if
    /// `reset` is true.
    pub fn recent_count(&mut self, reset: bool) -> usize {
        let mut count = 0;
        for message in &mut self.messages {
            if message.recent {
                count += 1;
                if reset {
                    message.recent = false;
                }
            }
        }
        count
    }

    /// Return the canonical sequence number of the first message without
    /// `\Seen`.
    pub fn first_unseen(&self) -> Option<Seqnum> {
        self.messages
            .iter()
            .position(|m| !m.has_flag(&Flag::Seen))
            .map(Seqnum::from_index)
    }

    pub fn uid_validity(&self) -> u32 {
        self.uid_validity
    }

    pub fn uid_next(&self) -> Uid {
        self.next_uid
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable && !self.deleted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Return the canonical sequence number of the message with the given
    /// UID, if it still exists.
    pub fn seqnum_of(&self, uid: Uid) -> Option<Seqnum> {
        self.messages
            .binary_search_by_key(&uid, |m| m.uid)
            .ok()
            .map(Seqnum::from_index)
    }

    pub fn append(
        &mut self,
        data: Arc<[u8]>,
        flags: Vec<Flag>,
        internal_date: DateTime<FixedOffset>,
    ) -> Result<Uid, Error> {
        if self.deleted {
            return Err(Error::MailboxDeleted);
        }
        if !self.selectable {
            return Err(Error::MailboxUnselectable);
        }

        let uid = self.next_uid;
        self.next_uid = uid.next().ok_or_else(|| {
            warn!("UID space exhausted");
            Error::MailboxUnselectable
        })?;

        let mut deduped: Vec<Flag> = Vec::with_capacity(flags.len());
        for flag in flags {
            if !deduped.contains(&flag) {
                deduped.push(flag);
            }
        }

        self.messages
            .push(StoredMessage::new(uid, data, deduped, internal_date));
        self.notify(None, |l| l.on_appended());
        Ok(uid)
    }

    /// Change the flags of every message in `uids` that still exists.
    ///
    /// Every listener except `silent` is notified of the new flags of each
    /// affected message, even if they did not actually change.
    pub fn store(
        &mut self,
        uids: &[Uid],
        mode: StoreMode,
        flags: &[Flag],
        silent: Option<ListenerId>,
    ) {
        for &uid in uids {
            let seqnum = match self.seqnum_of(uid) {
                Some(s) => s,
                None => continue,
            };

            let message = &mut self.messages[seqnum.to_index()];
            match mode {
                StoreMode::Replace => message.flags.clear(),
                StoreMode::Add => (),
                StoreMode::Remove => {
                    message.flags.retain(|f| !flags.contains(f));
                }
            }
            if StoreMode::Remove != mode {
                for flag in flags {
                    if !message.flags.contains(flag) {
                        message.flags.push(flag.clone());
                    }
                }
            }

            let new_flags = message.flags.clone();
            self.notify(silent, |l| {
                l.on_flags_changed(seqnum, uid, &new_flags)
            });
        }
    }

    /// Remove every message with `\Deleted`, optionally restricted to `uids`.
    ///
    /// Messages are removed front to back, and each removal is reported with
    /// the sequence number the message had at that instant.
    pub fn expunge(&mut self, uids: Option<&SeqRange<Uid>>) -> Vec<Uid> {
        let mut expunged = Vec::new();
        let mut ix = 0;
        while ix < self.messages.len() {
            let message = &self.messages[ix];
            if message.has_flag(&Flag::Deleted)
                && uids.map_or(true, |u| u.contains(message.uid))
            {
                let message = self.messages.remove(ix);
                expunged.push(message.uid);
                let seqnum = Seqnum::from_index(ix);
                self.notify(None, |l| l.on_expunged(seqnum));
            } else {
                ix += 1;
            }
        }

        expunged
    }

    fn notify(
        &mut self,
        except: Option<ListenerId>,
        f: impl Fn(&dyn MailboxListener),
    ) {
        self.listeners.retain(|&(id, ref listener)| {
            match listener.upgrade() {
                Some(listener) => {
                    if Some(id) != except {
                        f(&*listener);
                    }
                    true
                }
                None => false,
            }
        });
    }
}
