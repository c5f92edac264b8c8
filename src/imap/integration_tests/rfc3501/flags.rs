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
fn store_modes() {
    let setup = set_up();
    let mut client = setup.connect("3501flsm");
    client.quick_log_in();
    client.quick_create("3501flsm");
    client.quick_append("3501flsm", 2);
    client.quick_select("3501flsm");

    let responses = client.ok_command("STORE 1 +FLAGS (\\Flagged)");
    assert_eq!(vec!["* 1 FETCH (FLAGS (\\Flagged) UID 1)"], responses);

    let responses = client.ok_command("STORE 1 +FLAGS (foo \\Seen)");
    assert_eq!(
        vec!["* 1 FETCH (FLAGS (\\Flagged foo \\Seen) UID 1)"],
        responses
    );

    let responses = client.ok_command("STORE 1 -FLAGS (\\Flagged)");
    assert_eq!(vec!["* 1 FETCH (FLAGS (foo \\Seen) UID 1)"], responses);

    let responses = client.ok_command("STORE 1:2 FLAGS (\\Answered)");
    assert_eq!(
        vec![
            "* 1 FETCH (FLAGS (\\Answered) UID 1)",
            "* 2 FETCH (FLAGS (\\Answered) UID 2)",
        ],
        responses
    );

    // Every addressed message is reported, even if nothing changed
    let responses = client.ok_command("UID STORE 2 +FLAGS (\\Answered)");
    assert_eq!(vec!["* 2 FETCH (FLAGS (\\Answered) UID 2)"], responses);
}

#[test]
fn silent_store() {
    let setup = set_up();
    let mut client = setup.connect("3501flss");
    client.quick_log_in();
    client.quick_create("3501flss");
    client.quick_append("3501flss", 1);
    client.quick_select("3501flss");

    let responses = client.ok_command("STORE 1 +FLAGS.SILENT (\\Draft)");
    assert!(responses.is_empty(), "{:?}", responses);

    let responses = client.ok_command("FETCH 1 FLAGS");
    assert_eq!(vec!["* 1 FETCH (FLAGS (\\Draft))"], responses);

    // A silent store by another session is still reported here
    let mut other = setup.connect("3501flss2");
    other.quick_log_in();
    other.quick_select("3501flss");
    other.ok_command("STORE 1 -FLAGS.SILENT (\\Draft)");

    let responses = client.ok_command("NOOP");
    assert_eq!(vec!["* 1 FETCH (FLAGS () UID 1)"], responses);
}

#[test]
fn store_errors() {
    let setup = set_up();
    let mut client = setup.connect("3501flse");
    client.quick_log_in();
    client.quick_create("3501flse");
    client.quick_append("3501flse", 1);
    client.quick_select("3501flse");

    let responses = client.command("STORE 2 +FLAGS (\\Seen)");
    assert_line_like(&responses[0], r"^3501flse\d+ BAD ");

    let responses = client.command("STORE 1 +FLAGS (\\Recent)");
    assert_line_like(&responses[0], r"^3501flse\d+ BAD \[PARSE\] ");

    let responses = client.command("STORE 1 +LABELS (\\Seen)");
    assert_line_like(
        &responses[0],
        r"^3501flse\d+ BAD \[PARSE\] Bad STORE data item \+LABELS",
    );

    client.ok_command("EXAMINE 3501flse");
    let responses = client.command("STORE 1 +FLAGS (\\Seen)");
    assert_line_like(&responses[0], r"^3501flse\d+ NO Mailbox is read-only$");
}
