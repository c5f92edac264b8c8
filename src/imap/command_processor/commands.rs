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
use std::convert::TryInto;

use log::info;

use super::defs::*;
use super::registry;
use crate::imap::request_reader::RequestReader;
use crate::support::error::{bad_syntax, Error};

impl CommandProcessor {
    /// Return the greeting line to return to the client.
    pub fn greet(&self) -> s::ResponseLine<'static> {
        s::ResponseLine {
            tag: None,
            response: s::Response::Cond(s::CondResponse {
                cond: s::RespCondType::Ok,
                code: Some(s::RespTextCode::Capability(capability_data())),
                quip: Some(Cow::Borrowed(TAGLINE)),
            }),
        }
    }

    /// Handles one command whose tag and name have already been read.
    ///
    /// The handler reads the rest of the command line itself. `sender` can be
    /// called with untagged responses as needed.
    ///
    /// On success, returns the final response, to be tagged by the caller.
    /// `Err` means the command could not be executed at all. A syntax-tier
    /// error leaves the session unchanged, though the caller still has to
    /// discard whatever remains of the line. Anything else is fatal to the
    /// connection.
    pub fn handle_command(
        &mut self,
        name: &str,
        reader: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<s::Response<'static>, Error> {
        let uid = "UID".eq_ignore_ascii_case(name);
        let (spec, handler) = if uid {
            if SessionState::Selected != self.state() {
                return Err(Error::InvalidState);
            }

            let sub = reader.atom()?;
            registry::lookup(&sub)
                .and_then(|spec| spec.uid_handler.map(|h| (spec, h)))
                .ok_or_else(|| {
                    bad_syntax(format!("UID {} is not a command", sub))
                })?
        } else {
            let spec = registry::lookup(name).ok_or(Error::UnknownCommand)?;
            (spec, spec.handler)
        };

        if !spec.valid_states.contains(&self.state()) {
            return Err(Error::InvalidState);
        }

        let result = handler(self, reader, sender).map_err(|e| match e {
            Error::BadSyntax(msg) => Error::BadSyntax(format!(
                "{} (usage: {})",
                msg,
                registry::usage(spec)
            )),
            e => e,
        })?;

        match result {
            Ok(response) => {
                // FETCH, STORE, and SEARCH (the non-UID versions) are the
                // only cursed commands that don't allow us to send EXPUNGE
                // responses.
                self.poll(uid || spec.allow_expunge, sender);
                Ok(response)
            }
            Err(response) => Ok(response),
        }
    }

    /// Run the unsolicited-response cycle for the selected mailbox, if any.
    pub(super) fn poll(&mut self, allow_expunge: bool, sender: SendResponse<'_>) {
        let selected = match self.selected.as_ref() {
            Some(s) => s,
            None => return,
        };

        let poll = selected.poll(allow_expunge);
        if let Some(exists) = poll.exists {
            sender(s::Response::Exists(exists.try_into().unwrap_or(u32::MAX)));
        }
        if let Some(recent) = poll.recent {
            sender(s::Response::Recent(recent.try_into().unwrap_or(u32::MAX)));
        }
        for update in poll.flag_updates {
            sender(s::Response::Fetch(s::FetchResponse {
                seqnum: update.seqnum,
                atts: vec![
                    s::MsgAtt::Flags(update.flags, false),
                    s::MsgAtt::Uid(update.uid.0.get()),
                ],
            }));
        }
        for seqnum in poll.expunged {
            sender(s::Response::Expunge(seqnum));
        }
    }

    pub(super) fn handle_capability(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        r.end_of_line()?;
        Ok(self.cmd_capability(sender))
    }

    pub(super) fn handle_noop(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        r.end_of_line()?;
        Ok(self.cmd_noop("NOOP OK", sender))
    }

    pub(super) fn handle_check(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        r.end_of_line()?;
        Ok(self.cmd_noop("Nothing exciting", sender))
    }

    pub(super) fn handle_log_out(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        r.end_of_line()?;
        Ok(self.cmd_log_out(sender))
    }

    fn cmd_capability(&mut self, sender: SendResponse<'_>) -> CmdResult {
        sender(s::Response::Capability(capability_data()));
        success()
    }

    fn cmd_noop(
        &mut self,
        quip: &'static str,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        // Nothing to do here; shared command processing takes care of the
        // actual poll operation.
        Ok(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: None,
            quip: Some(Cow::Borrowed(quip)),
        }))
    }

    fn cmd_log_out(&mut self, sender: SendResponse<'_>) -> CmdResult {
        self.selected = None;
        self.user = None;

        // LOGOUT is a bit weird because RFC 3501 requires sending an OK
        // response *AFTER* the BYE.
        self.logged_out = true;
        info!("{} Logged out", self.log_prefix);
        sender(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Bye,
            code: None,
            quip: Some(Cow::Borrowed("Logging out")),
        }));
        success()
    }
}
