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

use log::{info, warn};

use super::defs::*;
use crate::imap::request_reader::RequestReader;
use crate::imap::session_view::SessionMailboxView;
use crate::store::model::*;
use crate::support::error::{bad_syntax, Error};
use crate::support::mailbox_paths::DELIMITER;

impl CommandProcessor {
    pub(super) fn handle_create(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let mailbox = r.mailbox()?;
        r.end_of_line()?;
        Ok(self.cmd_create(mailbox, sender))
    }

    pub(super) fn handle_delete(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let mailbox = r.mailbox()?;
        r.end_of_line()?;
        Ok(self.cmd_delete(&mailbox, sender))
    }

    pub(super) fn handle_list(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let reference = r.mailbox()?;
        let pattern = r.list_mailbox()?;
        r.end_of_line()?;
        Ok(self.cmd_list(&reference, &pattern, sender))
    }

    pub(super) fn handle_status(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let mailbox = r.mailbox()?;
        if b'(' != r.next_word_char()? {
            return Err(bad_syntax("Expected status attribute list"));
        }
        r.consume()?;

        let mut atts = Vec::new();
        loop {
            if b')' == r.next_word_char()? {
                r.consume()?;
                break;
            }

            let att = r.atom()?;
            atts.push(parse_status_att(&att)?);
        }
        r.end_of_line()?;

        if atts.is_empty() {
            return Err(bad_syntax("Empty status attribute list"));
        }

        Ok(self.cmd_status(&mailbox, &atts, sender))
    }

    pub(super) fn handle_select(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let mailbox = r.mailbox()?;
        r.end_of_line()?;
        Ok(self.cmd_select(&mailbox, false, sender))
    }

    pub(super) fn handle_examine(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let mailbox = r.mailbox()?;
        r.end_of_line()?;
        Ok(self.cmd_select(&mailbox, true, sender))
    }

    pub(super) fn handle_close(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        r.end_of_line()?;
        Ok(self.cmd_close(sender))
    }

    pub(super) fn cmd_close(&mut self, _sender: SendResponse<'_>) -> CmdResult {
        {
            let selected = selected!(self)?;
            if !selected.read_only() {
                if let Err(e) = selected.expunge(None) {
                    warn!("{} Implicit EXPUNGE failed: {}", self.log_prefix, e);
                }
            }
        }

        // CLOSE sends no EXPUNGE responses; the buffered ones go with the view
        if let Some(view) = self.selected.take() {
            view.deselect();
        }
        success()
    }

    pub(super) fn cmd_create(
        &mut self,
        mut mailbox: String,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        // RFC 3501 6.3.3: a trailing delimiter only declares the intent to
        // create inferiors.
        if mailbox.ends_with(DELIMITER) {
            mailbox.pop();
        }

        let user = user!(self)?;
        self.store.create_mailbox(user, &mailbox).map_err(map_error! {
            self,
            MailboxExists | UnsafeName => (No, None),
        })?;
        info!("{} Created mailbox {}", self.log_prefix, mailbox);
        success()
    }

    pub(super) fn cmd_delete(
        &mut self,
        mailbox: &str,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        let user = user!(self)?;

        // If this session has the mailbox selected, it is not told about the
        // deletion through its own listener; it just loses the selection.
        let own = self.selected.as_ref().filter(|view| {
            self.store
                .mailbox(user, mailbox)
                .map_or(false, |m| m.name() == view.mailbox_name())
        });
        let quiet = own.map(SessionMailboxView::listener_id);
        let deselect = own.is_some();

        self.store
            .delete_mailbox(user, mailbox, quiet)
            .map_err(map_error! {
                self,
                NxMailbox | UnsafeName | MailboxHasInferiors
                    | BadOperationOnInbox => (No, None),
            })?;
        info!("{} Deleted mailbox {}", self.log_prefix, mailbox);

        if deselect {
            self.selected = None;
        }
        success()
    }

    pub(super) fn cmd_list(
        &mut self,
        reference: &str,
        pattern: &str,
        sender: SendResponse<'_>,
    ) -> CmdResult {
        let user = user!(self)?;

        // RFC 3501 6.3.8: an empty pattern asks for the hierarchy delimiter
        // and the root of the reference.
        if pattern.is_empty() {
            sender(s::Response::List(s::MailboxList {
                attributes: vec![MailboxAttribute::Noselect],
                name: Cow::Borrowed(""),
            }));
            return success();
        }

        let responses = self
            .store
            .list(user, reference, pattern)
            .map_err(map_error!(self))?;
        for response in responses {
            sender(s::Response::List(s::MailboxList {
                attributes: response.attributes,
                name: Cow::Owned(response.name),
            }));
        }

        success()
    }

    pub(super) fn cmd_status(
        &mut self,
        mailbox: &str,
        atts: &[StatusAttName],
        sender: SendResponse<'_>,
    ) -> CmdResult {
        let user = user!(self)?;
        let status = self
            .store
            .mailbox(user, mailbox)
            .and_then(|m| m.status())
            .map_err(map_error! {
                self,
                NxMailbox | UnsafeName | MailboxUnselectable
                    | MailboxDeleted => (No, None),
            })?;

        let atts = atts
            .iter()
            .map(|att| match *att {
                StatusAttName::Messages => {
                    s::StatusAtt::Messages(saturate(status.messages))
                }
                StatusAttName::Recent => {
                    s::StatusAtt::Recent(saturate(status.recent))
                }
                StatusAttName::UidNext => s::StatusAtt::UidNext(status.uidnext),
                StatusAttName::UidValidity => {
                    s::StatusAtt::UidValidity(status.uidvalidity)
                }
                StatusAttName::Unseen => {
                    s::StatusAtt::Unseen(saturate(status.unseen))
                }
            })
            .collect();

        sender(s::Response::Status(s::StatusResponse {
            mailbox: Cow::Owned(mailbox.to_owned()),
            atts,
        }));
        success()
    }

    pub(super) fn cmd_select(
        &mut self,
        mailbox: &str,
        read_only: bool,
        sender: SendResponse<'_>,
    ) -> CmdResult {
        // Any prior selection goes away even if this one fails
        if let Some(view) = self.selected.take() {
            view.deselect();
        }

        let user = user!(self)?;
        let mailbox = self.store.mailbox(user, mailbox).map_err(map_error! {
            self,
            NxMailbox | UnsafeName => (No, None),
        })?;
        let (view, select) = SessionMailboxView::attach(
            mailbox,
            read_only,
            self.terminator.clone(),
        )
        .map_err(map_error! {
            self,
            NxMailbox | MailboxUnselectable => (No, None),
        })?;

        sender(s::Response::Exists(saturate(select.exists)));
        sender(s::Response::Recent(saturate(select.recent)));
        if let Some(unseen) = select.unseen {
            sender(s::Response::Cond(s::CondResponse {
                cond: s::RespCondType::Ok,
                code: Some(s::RespTextCode::Unseen(unseen.0.get())),
                quip: Some(Cow::Borrowed("First unseen")),
            }));
        } else {
            sender(s::Response::Cond(s::CondResponse {
                cond: s::RespCondType::Ok,
                code: None,
                quip: Some(Cow::Borrowed("No messages unseen")),
            }));
        }
        sender(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: Some(s::RespTextCode::UidValidity(select.uidvalidity)),
            quip: Some(Cow::Borrowed("UIDs valid")),
        }));
        sender(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: Some(s::RespTextCode::UidNext(select.uidnext.0.get())),
            quip: Some(Cow::Borrowed("Predicted next UID")),
        }));
        sender(s::Response::Flags(select.flags));
        sender(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: Some(s::RespTextCode::PermanentFlags(select.permanent_flags)),
            quip: Some(Cow::Borrowed("Limited")),
        }));

        info!(
            "{} {} {}",
            self.log_prefix,
            if read_only { "Examined" } else { "Selected" },
            view.mailbox_name()
        );
        self.selected = Some(view);

        Ok(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: Some(if select.read_only {
                s::RespTextCode::ReadOnly
            } else {
                s::RespTextCode::ReadWrite
            }),
            quip: Some(Cow::Borrowed(if read_only {
                "EXAMINE completed"
            } else {
                "SELECT completed"
            })),
        }))
    }
}

/// The attributes `STATUS` can be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum StatusAttName {
    Messages,
    Recent,
    UidNext,
    UidValidity,
    Unseen,
}

fn parse_status_att(raw: &str) -> Result<StatusAttName, Error> {
    let att = match raw.to_ascii_uppercase().as_str() {
        "MESSAGES" => StatusAttName::Messages,
        "RECENT" => StatusAttName::Recent,
        "UIDNEXT" => StatusAttName::UidNext,
        "UIDVALIDITY" => StatusAttName::UidValidity,
        "UNSEEN" => StatusAttName::Unseen,
        _ => {
            return Err(bad_syntax(format!("Unknown status attribute {}", raw)))
        }
    };
    Ok(att)
}

pub(super) fn saturate(n: usize) -> u32 {
    n.try_into().unwrap_or(u32::MAX)
}
