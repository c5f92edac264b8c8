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

//! The IMAP4rev1 protocol engine.
//!
//! `server` drives one connection: it reads commands through
//! `request_reader` (with the grammar pieces in `command_parser` and
//! `search_parser`), dispatches them to `command_processor`, and writes the
//! `response` model out through `lex`. `session_view` keeps a session's
//! picture of its selected mailbox in step with the shared store.

pub mod command_parser;
pub mod command_processor;
pub mod lex;
pub mod request_reader;
pub mod response;
pub mod search_parser;
pub mod server;
pub mod session_view;

#[cfg(test)]
mod integration_tests;
