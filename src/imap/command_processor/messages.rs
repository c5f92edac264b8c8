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

use chrono::prelude::*;
use log::info;

use super::defs::*;
use crate::imap::request_reader::RequestReader;
use crate::store::model::*;
use crate::support::error::Error;

impl CommandProcessor {
    pub(super) fn handle_append(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let mailbox = r.mailbox()?;

        let flags = if b'(' == r.next_word_char()? {
            r.flag_list()?
        } else {
            vec![]
        };
        let internal_date = if b'"' == r.next_word_char()? {
            Some(r.datetime()?)
        } else {
            None
        };

        // The whole literal is read before anything is checked, so that a
        // failure still leaves the stream at the end of the command.
        let data = r.literal()?;
        r.end_of_line()?;

        Ok(self.cmd_append(
            &mailbox,
            flags,
            internal_date,
            data,
            sender,
        ))
    }

    pub(super) fn handle_expunge(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        r.end_of_line()?;
        Ok(self.cmd_expunge(None, sender))
    }

    pub(super) fn handle_uid_expunge(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let uids = r.sequence_set()?;
        r.end_of_line()?;
        Ok(self.cmd_expunge(Some(&uids), sender))
    }

    pub(super) fn handle_copy(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let ids = r.sequence_set()?;
        let mailbox = r.mailbox()?;
        r.end_of_line()?;
        Ok(self.cmd_copy(&ids, &mailbox, false, sender))
    }

    pub(super) fn handle_uid_copy(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let ids = r.sequence_set()?;
        let mailbox = r.mailbox()?;
        r.end_of_line()?;
        Ok(self.cmd_copy(&ids, &mailbox, true, sender))
    }

    pub(super) fn cmd_append(
        &mut self,
        mailbox: &str,
        flags: Vec<Flag>,
        internal_date: Option<DateTime<FixedOffset>>,
        data: Vec<u8>,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        let user = user!(self)?;
        let mailbox = self.store.mailbox(user, mailbox).map_err(map_error! {
            self,
            NxMailbox => (No, Some(s::RespTextCode::TryCreate)),
            UnsafeName => (No, None),
        })?;

        let internal_date = internal_date.unwrap_or_else(|| Utc::now().into());
        let (uid_validity, uid) = {
            let mut state = mailbox.lock();
            let uid = state
                .append(Arc::from(data), flags, internal_date)
                .map_err(map_error! {
                    self,
                    MailboxDeleted => (No, Some(s::RespTextCode::TryCreate)),
                    MailboxUnselectable => (No, None),
                })?;
            (state.uid_validity(), uid)
        };

        info!(
            "{} Appended UID {} to {}",
            self.log_prefix,
            uid.0.get(),
            mailbox.name()
        );

        Ok(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: Some(s::RespTextCode::AppendUid(uid_validity, uid.0.get())),
            quip: Some(Cow::Borrowed("APPEND completed")),
        }))
    }

    pub(super) fn cmd_expunge(
        &mut self,
        uids: Option<&SequenceSet>,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        let selected = selected!(self)?;
        // The EXPUNGE responses themselves come out of the poll cycle which
        // follows every successful command.
        selected.expunge(uids).map_err(map_error! {
            self,
            ReadOnlyMailbox => (No, None),
        })?;
        success()
    }

    pub(super) fn cmd_copy(
        &mut self,
        ids: &SequenceSet,
        mailbox: &str,
        uid: bool,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        let selected = selected!(self)?;
        let user = user!(self)?;

        let messages = selected.messages(ids, uid).map_err(map_error! {
            self,
            SeqnumOutOfRange => (Bad, None),
        })?;
        let dst = self.store.mailbox(user, mailbox).map_err(map_error! {
            self,
            NxMailbox => (No, Some(s::RespTextCode::TryCreate)),
            UnsafeName => (No, None),
        })?;

        let mut src_uids = Vec::with_capacity(messages.len());
        let mut dst_uids = Vec::with_capacity(messages.len());
        let uid_validity = {
            let mut state = dst.lock();
            for selected_message in messages {
                let message = selected_message.message;
                let new_uid = state
                    .append(
                        message.shared_data(),
                        message.flags.clone(),
                        message.internal_date,
                    )
                    .map_err(map_error! {
                        self,
                        MailboxDeleted => (No, Some(s::RespTextCode::TryCreate)),
                        MailboxUnselectable => (No, None),
                    })?;
                src_uids.push(message.uid);
                dst_uids.push(new_uid);
            }
            state.uid_validity()
        };

        if src_uids.is_empty() {
            return success();
        }

        Ok(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: Some(s::RespTextCode::CopyUid(
                uid_validity,
                uid_set_text(&src_uids),
                uid_set_text(&dst_uids),
            )),
            quip: Some(Cow::Borrowed("COPY completed")),
        }))
    }
}
