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

use log::{info, warn};

use super::defs::*;
use crate::imap::request_reader::RequestReader;
use crate::support::error::Error;

impl CommandProcessor {
    pub(super) fn handle_log_in(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let userid = r.astring()?;
        let password = r.astring()?;
        r.end_of_line()?;
        Ok(self.cmd_log_in(&userid, &password, sender))
    }

    pub(super) fn cmd_log_in(
        &mut self,
        userid: &str,
        password: &str,
        _sender: SendResponse<'_>,
    ) -> CmdResult {
        if self.user.is_some() {
            return Err(s::Response::Cond(s::CondResponse {
                cond: s::RespCondType::Bad,
                code: None,
                quip: Some(Cow::Borrowed("Already logged in")),
            }));
        }

        let auto_create = self.system_config.imap.auto_create_users;
        self.store
            .authenticate(userid, password, auto_create)
            .map_err(|e| {
                warn!(
                    "{} Rejected login for {:?}: {}",
                    self.log_prefix, userid, e
                );
                e
            })
            .map_err(map_error! {
                self,
                BadCredentials | NxUser => (No, None),
            })?;

        self.log_prefix.set_user(userid.to_owned());
        self.user = Some(userid.to_owned());
        info!("{} Login successful", self.log_prefix);

        Ok(s::Response::Cond(s::CondResponse {
            cond: s::RespCondType::Ok,
            code: None,
            quip: Some(Cow::Borrowed("User login successful")),
        }))
    }
}
