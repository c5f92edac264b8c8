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

//! The table of commands the server understands.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::defs::*;
use crate::imap::request_reader::RequestReader;
use crate::support::error::Error;

/// Reads the arguments of one command (through the end of the line) and
/// executes it.
///
/// The outer `Result` carries failures to read the command at all; the inner
/// one is the outcome of executing it.
pub(super) type Handler = fn(
    &mut CommandProcessor,
    &mut RequestReader,
    SendResponse<'_>,
) -> Result<CmdResult, Error>;

pub(super) struct CommandSpec {
    pub(super) name: &'static str,
    pub(super) valid_states: &'static [SessionState],
    /// The argument syntax, as shown in RFC 3501.
    pub(super) syntax: &'static str,
    pub(super) handler: Handler,
    /// The handler for the `UID`-prefixed form, if there is one.
    pub(super) uid_handler: Option<Handler>,
    /// Whether the unsolicited-response cycle after the plain (non-`UID`)
    /// form may report expunges.
    pub(super) allow_expunge: bool,
}

use super::defs::SessionState::*;

const ANY: &[SessionState] = &[NotAuthenticated, Authenticated, Selected];
const NOT_AUTH: &[SessionState] = &[NotAuthenticated];
const AUTH: &[SessionState] = &[Authenticated, Selected];
const SELECTED: &[SessionState] = &[Selected];

lazy_static! {
    static ref COMMANDS: HashMap<&'static str, CommandSpec> = {
        let mut commands = HashMap::new();
        let mut add = |spec: CommandSpec| {
            commands.insert(spec.name, spec);
        };

        add(CommandSpec {
            name: "CAPABILITY",
            valid_states: ANY,
            syntax: "",
            handler: CommandProcessor::handle_capability,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "NOOP",
            valid_states: ANY,
            syntax: "",
            handler: CommandProcessor::handle_noop,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "LOGOUT",
            valid_states: ANY,
            syntax: "",
            handler: CommandProcessor::handle_log_out,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "LOGIN",
            valid_states: NOT_AUTH,
            syntax: "userid password",
            handler: CommandProcessor::handle_log_in,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "CREATE",
            valid_states: AUTH,
            syntax: "mailbox",
            handler: CommandProcessor::handle_create,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "DELETE",
            valid_states: AUTH,
            syntax: "mailbox",
            handler: CommandProcessor::handle_delete,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "LIST",
            valid_states: AUTH,
            syntax: "reference mailbox-pattern",
            handler: CommandProcessor::handle_list,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "STATUS",
            valid_states: AUTH,
            syntax: "mailbox (status-att ...)",
            handler: CommandProcessor::handle_status,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "APPEND",
            valid_states: AUTH,
            syntax: "mailbox [(flag-list)] [date-time] literal",
            handler: CommandProcessor::handle_append,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "SELECT",
            valid_states: AUTH,
            syntax: "mailbox",
            handler: CommandProcessor::handle_select,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "EXAMINE",
            valid_states: AUTH,
            syntax: "mailbox",
            handler: CommandProcessor::handle_examine,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "CHECK",
            valid_states: SELECTED,
            syntax: "",
            handler: CommandProcessor::handle_check,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "CLOSE",
            valid_states: SELECTED,
            syntax: "",
            handler: CommandProcessor::handle_close,
            uid_handler: None,
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "EXPUNGE",
            valid_states: SELECTED,
            syntax: "",
            handler: CommandProcessor::handle_expunge,
            uid_handler: Some(CommandProcessor::handle_uid_expunge),
            allow_expunge: true,
        });
        add(CommandSpec {
            name: "SEARCH",
            valid_states: SELECTED,
            syntax: "[CHARSET charset] search-key ...",
            handler: CommandProcessor::handle_search,
            uid_handler: Some(CommandProcessor::handle_uid_search),
            allow_expunge: false,
        });
        add(CommandSpec {
            name: "FETCH",
            valid_states: SELECTED,
            syntax: "sequence-set (fetch-att ...)",
            handler: CommandProcessor::handle_fetch,
            uid_handler: Some(CommandProcessor::handle_uid_fetch),
            allow_expunge: false,
        });
        add(CommandSpec {
            name: "STORE",
            valid_states: SELECTED,
            syntax: "sequence-set [+-]FLAGS[.SILENT] (flag-list)",
            handler: CommandProcessor::handle_store,
            uid_handler: Some(CommandProcessor::handle_uid_store),
            allow_expunge: false,
        });
        add(CommandSpec {
            name: "COPY",
            valid_states: SELECTED,
            syntax: "sequence-set mailbox",
            handler: CommandProcessor::handle_copy,
            uid_handler: Some(CommandProcessor::handle_uid_copy),
            allow_expunge: true,
        });

        commands
    };
}

/// Look a command up by its case-insensitive name.
pub(super) fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.get(name.to_ascii_uppercase().as_str())
}

/// Return the usage line for a command, e.g. `COPY sequence-set mailbox`.
pub(super) fn usage(spec: &CommandSpec) -> String {
    if spec.syntax.is_empty() {
        spec.name.to_owned()
    } else {
        format!("{} {}", spec.name, spec.syntax)
    }
}
