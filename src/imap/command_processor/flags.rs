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
use crate::store::model::*;
use crate::support::error::{bad_syntax, Error};

impl CommandProcessor {
    pub(super) fn handle_store(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let (ids, mode, silent, flags) = parse_store_args(r)?;
        Ok(self.cmd_store(&ids, mode, silent, &flags, false, sender))
    }

    pub(super) fn handle_uid_store(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let (ids, mode, silent, flags) = parse_store_args(r)?;
        Ok(self.cmd_store(&ids, mode, silent, &flags, true, sender))
    }

    /// `STORE` never sends `FETCH` responses itself. Unless `silent`, the
    /// view's own listener picks up the new flags and the poll cycle after
    /// the command reports them.
    pub(super) fn cmd_store(
        &mut self,
        ids: &SequenceSet,
        mode: StoreMode,
        silent: bool,
        flags: &[Flag],
        uid: bool,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        let selected = selected!(self)?;
        selected
            .store(ids, uid, mode, flags, silent)
            .map_err(map_error! {
                self,
                ReadOnlyMailbox => (No, None),
                SeqnumOutOfRange => (Bad, None),
            })?;
        success()
    }
}

fn parse_store_args(
    r: &mut RequestReader,
) -> Result<(SequenceSet, StoreMode, bool, Vec<Flag>), Error> {
    let ids = r.sequence_set()?;
    let (mode, silent) = parse_store_item(&r.atom()?)?;
    let flags = r.flag_list()?;
    r.end_of_line()?;
    Ok((ids, mode, silent, flags))
}

/// Parse `[+-]FLAGS[.SILENT]`.
fn parse_store_item(raw: &str) -> Result<(StoreMode, bool), Error> {
    let upper = raw.to_ascii_uppercase();
    let (mode, rest) = if let Some(rest) = upper.strip_prefix('+') {
        (StoreMode::Add, rest)
    } else if let Some(rest) = upper.strip_prefix('-') {
        (StoreMode::Remove, rest)
    } else {
        (StoreMode::Replace, upper.as_str())
    };

    match rest {
        "FLAGS" => Ok((mode, false)),
        "FLAGS.SILENT" => Ok((mode, true)),
        _ => Err(bad_syntax(format!("Bad STORE data item {}", raw))),
    }
}
