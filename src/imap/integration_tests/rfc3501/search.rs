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

fn set_up_mailbox(client: &mut TestClient, mailbox: &str) {
    client.quick_log_in();
    client.quick_create(mailbox);
    client.quick_append(mailbox, 3);
    client.quick_select(mailbox);
    client.ok_command("STORE 2 +FLAGS.SILENT (\\Flagged)");
}

#[test]
fn basic_criteria() {
    let setup = set_up();
    let mut client = setup.connect("3501sebc");
    set_up_mailbox(&mut client, "3501sebc");

    let responses = client.ok_command("SEARCH FLAGGED");
    assert_eq!(vec!["* SEARCH 2"], responses);

    let responses = client.ok_command("SEARCH ALL");
    assert_eq!(vec!["* SEARCH 1 2 3"], responses);

    let responses = client.ok_command("search subject \"message 1\"");
    assert_eq!(vec!["* SEARCH 2"], responses);

    let responses = client.ok_command("UID SEARCH UNFLAGGED");
    assert_eq!(vec!["* SEARCH 1 3"], responses);

    let responses = client.ok_command("SEARCH OR FROM sender0 FROM sender2");
    assert_eq!(vec!["* SEARCH 1 3"], responses);

    let responses = client.ok_command("SEARCH NOT (FLAGGED) 2:*");
    assert_eq!(vec!["* SEARCH 3"], responses);

    let responses = client.ok_command("SEARCH BODY \"message 2\"");
    assert_eq!(vec!["* SEARCH 3"], responses);

    let responses = client.ok_command("SEARCH CHARSET US-ASCII DELETED");
    assert_eq!(vec!["* SEARCH"], responses);
}

#[test]
fn search_after_expunge_elsewhere() {
    let setup = set_up();
    let mut client = setup.connect("3501seae");
    set_up_mailbox(&mut client, "3501seae");

    let mut other = setup.connect("3501seae2");
    other.quick_log_in();
    other.quick_select("3501seae");
    other.ok_command("STORE 1 +FLAGS.SILENT (\\Deleted)");
    other.ok_command("EXPUNGE");

    // The expunge can't be reported yet, so the client's numbering stays
    let responses = client.ok_command("SEARCH FLAGGED");
    assert_eq!(
        vec!["* SEARCH 2", "* 1 FETCH (FLAGS (\\Deleted) UID 1)"],
        responses
    );

    let responses = client.ok_command("UID SEARCH ALL");
    assert_eq!(vec!["* SEARCH 2 3", "* 1 EXPUNGE"], responses);

    let responses = client.ok_command("SEARCH FLAGGED");
    assert_eq!(vec!["* SEARCH 1"], responses);
}

#[test]
fn search_errors() {
    let setup = set_up();
    let mut client = setup.connect("3501sere");
    set_up_mailbox(&mut client, "3501sere");

    let responses = client.command("SEARCH CHARSET KOI8-R ALL");
    assert_eq!(1, responses.len());
    assert_line_like(
        &responses[0],
        r"^3501sere\d+ NO \[BADCHARSET\] Unsupported charset$",
    );

    let responses = client.command("SEARCH");
    assert_line_like(&responses[0], r"^3501sere\d+ BAD \[PARSE\] ");

    let responses = client.command("SEARCH FROBNICATED");
    assert_line_like(
        &responses[0],
        r"^3501sere\d+ BAD \[PARSE\] Unknown search key FROBNICATED",
    );

    let responses = client.command("SEARCH (FLAGGED");
    assert_line_like(&responses[0], r"^3501sere\d+ BAD \[PARSE\] ");

    client.ok_command("NOOP");
}
