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

use super::super::defs::*;

#[test]
fn unknown_and_malformed_commands() {
    let setup = set_up();
    let mut client = setup.connect("3501bcum");
    client.quick_log_in();

    let responses = client.command("FROBNICATE INBOX");
    assert_eq!(1, responses.len());
    assert_line_like(&responses[0], r"^3501bcum\d+ BAD Unknown command$");

    client.write_raw(b"\r\n");
    assert_eq!("* BAD [PARSE] Missing tag", client.read_line());

    let responses = client.command("CREATE");
    assert_eq!(1, responses.len());
    assert_line_like(
        &responses[0],
        r"^3501bcum\d+ BAD \[PARSE\] .* \(usage: CREATE mailbox\)$",
    );

    let responses = client.command("NOOP extra");
    assert_line_like(
        &responses[0],
        r"^3501bcum\d+ BAD \[PARSE\] Expected end of line \(usage: NOOP\)$",
    );

    let responses = client.command("LIST \"unterminated");
    assert_line_like(&responses[0], r"^3501bcum\d+ BAD \[PARSE\] ");

    // Still perfectly usable
    client.ok_command("NOOP");
    client.quick_select("INBOX");
}

#[test]
fn uid_prefix() {
    let setup = set_up();
    let mut client = setup.connect("3501bcup");
    client.quick_log_in();

    let responses = client.command("UID FETCH 1 FLAGS");
    assert_line_like(
        &responses[0],
        r"^3501bcup\d+ BAD Command not valid in this state$",
    );

    client.quick_select("INBOX");
    let responses = client.command("UID NOOP");
    assert_eq!(1, responses.len());
    assert_line_like(
        &responses[0],
        r"^3501bcup\d+ BAD \[PARSE\] UID NOOP is not a command$",
    );

    client.ok_command("uid fetch 1:* flags");
}

#[test]
fn literal_after_error_is_skipped() {
    let setup = set_up();
    let mut client = setup.connect("3501bcls");
    client.quick_log_in();

    let responses = client.command("FROBNICATE {6+}\r\nLOGOUT");
    assert_eq!(1, responses.len(), "{:?}", responses);
    assert_line_like(&responses[0], r"^3501bcls\d+ BAD Unknown command$");

    client.ok_command("NOOP");
}
