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

use super::defs::*;
use crate::imap::request_reader::RequestReader;
use crate::imap::search_parser::{SearchCommand, SearchTermParser};
use crate::support::error::Error;

impl CommandProcessor {
    pub(super) fn handle_search(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let cmd = SearchTermParser::new(r).parse()?;
        Ok(self.cmd_search(cmd, false, sender))
    }

    pub(super) fn handle_uid_search(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let cmd = SearchTermParser::new(r).parse()?;
        Ok(self.cmd_search(cmd, true, sender))
    }

    pub(super) fn cmd_search(
        &mut self,
        cmd: SearchCommand,
        uid: bool,
        sender: SendResponse<'_>,
    ) -> CmdResult {
        cmd.check_charset().map_err(map_error! {
            self,
            UnsupportedCharset => (No, Some(s::RespTextCode::BadCharset)),
        })?;

        let selected = selected!(self)?;
        let hits = selected.search(&cmd.criteria, uid);
        sender(s::Response::Search(hits));
        success()
    }
}
