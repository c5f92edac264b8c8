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

use std::borrow::Cow;
use std::sync::Arc;

use log::error;

use crate::{
    imap::session_view::{SessionMailboxView, Terminator},
    store::{mail_store::MailStore, model::*},
    support::{
        error::Error, log_prefix::LogPrefix, system_config::SystemConfig,
    },
};

pub(super) use crate::imap::response as s;

pub(super) static CAPABILITIES: &[&str] = &["IMAP4rev1", "LITERAL+", "UIDPLUS"];

pub(super) static TAGLINE: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " ",
    env!("CARGO_PKG_VERSION_MAJOR"),
    ".",
    env!("CARGO_PKG_VERSION_MINOR"),
    ".",
    env!("CARGO_PKG_VERSION_PATCH"),
    " ready"
);

/// Where a session is in the RFC 3501 state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotAuthenticated,
    Authenticated,
    Selected,
    Logout,
}

/// Reads commands off a `RequestReader` and emits responses in the model
/// defined in the `response` module.
///
/// Besides dispatching each command, it owns the high-level IMAP state of the
/// session (who is logged in, which mailbox is selected) and runs the
/// unsolicited-response cycle after each successful command.
pub struct CommandProcessor {
    pub(super) log_prefix: LogPrefix,
    pub(super) system_config: Arc<SystemConfig>,
    pub(super) store: Arc<MailStore>,

    pub(super) user: Option<String>,
    pub(super) selected: Option<SessionMailboxView>,
    /// Handed to every view this session attaches, so that deleting the
    /// selected mailbox from elsewhere can end the session.
    pub(super) terminator: Option<Terminator>,

    pub(super) logged_out: bool,
}

/// Used just for the convenient `?` operator. We mostly don't distinguish `Ok`
/// from `Err` --- the contained value is sent down the wire --- though on
/// `Err` no polling happens.
pub(super) type CmdResult = Result<s::Response<'static>, s::Response<'static>>;

/// Return value from an operation that can either succeed with a value, or
/// fail with an IMAP response.
pub(super) type PartialResult<T> = Result<T, s::Response<'static>>;

/// Callback used to send additional non-tagged responses as they become
/// available.
pub type SendResponse<'a> = &'a (dyn Send + Sync + Fn(s::Response<'_>));

impl CommandProcessor {
    pub fn new(
        log_prefix: LogPrefix,
        system_config: Arc<SystemConfig>,
        store: Arc<MailStore>,
        terminator: Option<Terminator>,
    ) -> Self {
        CommandProcessor {
            log_prefix,
            system_config,
            store,

            user: None,
            selected: None,
            terminator,

            logged_out: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.logged_out {
            SessionState::Logout
        } else if self.selected.is_some() {
            SessionState::Selected
        } else if self.user.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::NotAuthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn logged_out(&self) -> bool {
        self.logged_out
    }

    pub fn log_prefix(&self) -> &LogPrefix {
        &self.log_prefix
    }
}

pub(super) fn success() -> CmdResult {
    Ok(s::Response::Cond(s::CondResponse {
        cond: s::RespCondType::Ok,
        code: None,
        quip: Some(Cow::Borrowed("Completed")),
    }))
}

pub(super) fn capability_data() -> Vec<Cow<'static, str>> {
    CAPABILITIES.iter().copied().map(Cow::Borrowed).collect()
}

/// Format a list of UIDs the way `COPYUID` wants them.
pub(super) fn uid_set_text(uids: &[Uid]) -> String {
    let mut range = SeqRange::<Uid>::new();
    for &uid in uids {
        range.insert(uid.0.get(), uid.0.get());
    }
    range.to_string()
}

#[cfg(not(test))]
pub(super) fn catch_all_error_handling(
    log_prefix: &LogPrefix,
    e: Error,
) -> s::Response<'static> {
    error!("{} Unhandled internal error: {}", log_prefix, e);

    s::Response::Cond(s::CondResponse {
        cond: s::RespCondType::No,
        code: None,
        quip: Some(Cow::Borrowed(
            "Unexpected error; check server logs for details",
        )),
    })
}

#[cfg(test)]
pub(super) fn catch_all_error_handling(
    log_prefix: &LogPrefix,
    e: Error,
) -> s::Response<'static> {
    error!("{} Unhandled internal error: {}", log_prefix, e);
    panic!("{} Unhandled internal error: {}", log_prefix, e);
}
