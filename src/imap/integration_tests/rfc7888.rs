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

//! LITERAL+ (non-synchronising literals).
//!
//! Recovery from a literal following a malformed command is covered by
//! `rfc3501::bad_commands`.

use super::defs::*;
use crate::support::system_config::SystemConfig;

#[test]
fn capability_declared() {
    let setup = set_up();
    let mut client = setup.connect("7888capa");

    let greeting = client.read_line();
    assert_line_like(&greeting, r"^\* OK \[CAPABILITY [^\]]* LITERAL\+[ \]]");
}

#[test]
fn log_in_with_literals() {
    let setup = set_up();
    let mut client = setup.connect("7888lilt");
    client.skip_greeting();

    // No continuation prompt, so the tagged response is the first line back
    client.write_raw(b"A1 LOGIN {5+}\r\nazure {7+}\r\nhunter2\r\n");
    let responses = client.read_until_tagged("A1");
    assert_eq!(1, responses.len(), "{:?}", responses);
    assert_line_like(&responses[0], r"^A1 OK ");

    // A synchronising literal is prompted for
    client.write_raw(b"A2 CREATE {8}\r\n");
    let prompt = client.read_line();
    assert!(prompt.starts_with("+"), "Unexpected {:?}", prompt);
    client.write_raw(b"7888lilt\r\n");
    let responses = client.read_until_tagged("A2");
    assert_line_like(&responses[0], r"^A2 OK ");

    let responses = client.ok_command("LIST \"\" 7888lilt");
    assert_eq!(vec!["* LIST (\\HasNoChildren) \".\" 7888lilt"], responses);
}

#[test]
fn search_with_literals() {
    let setup = set_up();
    let mut client = setup.connect("7888swl");
    client.quick_log_in();
    client.quick_create("7888swl");
    client.quick_append("7888swl", 3);
    client.quick_select("7888swl");

    client.write_raw(
        b"A1 SEARCH FROM {7+}\r\nsender1 SUBJECT {9+}\r\nMessage 1\r\n",
    );
    let responses = client.read_until_tagged("A1");
    assert_eq!(
        vec!["* SEARCH 2".to_owned(), "A1 OK Completed".to_owned()],
        responses
    );

    // Literal content that looks like a literal announcement is just data
    client.write_raw(b"A2 SEARCH TEXT {4+}\r\n{3+}\r\n");
    let responses = client.read_until_tagged("A2");
    assert_eq!(
        vec!["* SEARCH".to_owned(), "A2 OK Completed".to_owned()],
        responses
    );

    client.ok_command("NOOP");
}

#[test]
fn oversized_literals() {
    let mut config = SystemConfig::default();
    config.imap.max_literal = 10;
    let setup = set_up_with(config);
    let mut client = setup.connect("7888ovsz");
    client.quick_log_in();

    let message = "x".repeat(100);
    let responses = client.command(&format!(
        "APPEND INBOX {{{}+}}\r\n{}",
        message.len(),
        message
    ));
    assert_eq!(1, responses.len(), "{:?}", responses);
    assert_line_like(
        &responses[0],
        r"^7888ovsz\d+ BAD \[PARSE\] Literal too large",
    );

    // No prompt for a synchronising literal that is too large; the client
    // then sends nothing further for it
    client.write_raw(b"A1 APPEND INBOX {100}\r\n");
    let responses = client.read_until_tagged("A1");
    assert_eq!(1, responses.len(), "{:?}", responses);
    assert_line_like(&responses[0], r"^A1 BAD \[PARSE\] Literal too large");

    // Within the limit is fine
    client.ok_command("APPEND INBOX {5+}\r\nsmall");
    let responses = client.ok_command("STATUS INBOX (MESSAGES)");
    assert_eq!(vec!["* STATUS INBOX (MESSAGES 1)"], responses);
}
