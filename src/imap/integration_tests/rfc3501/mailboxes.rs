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
fn create_and_list() {
    let setup = set_up();
    let mut client = setup.connect("3501mbcl");
    client.quick_log_in();

    client.quick_create("work.2020.q1");
    let responses = client.ok_command("LIST \"\" *");
    assert_eq!(
        vec![
            "* LIST (\\HasNoChildren) \".\" INBOX",
            "* LIST (\\HasChildren) \".\" work",
            "* LIST (\\HasChildren) \".\" work.2020",
            "* LIST (\\HasNoChildren) \".\" work.2020.q1",
        ],
        responses
    );

    let responses = client.ok_command("LIST \"\" %");
    assert_eq!(2, responses.len());

    let responses = client.ok_command("LIST work. %");
    assert_eq!(
        vec!["* LIST (\\HasChildren) \".\" work.2020"],
        responses
    );

    let responses = client.ok_command("LIST \"\" \"\"");
    assert_eq!(vec!["* LIST (\\Noselect) \".\" \"\""], responses);

    let responses = client.ok_command("LIST \"\" nothing*");
    assert!(responses.is_empty());
}

#[test]
fn create_errors() {
    let setup = set_up();
    let mut client = setup.connect("3501mbce");
    client.quick_log_in();

    client.quick_create("dup");
    let responses = client.command("CREATE dup");
    assert_line_like(&responses[0], r"^3501mbce\d+ NO Mailbox already exists$");

    let responses = client.command("CREATE inbox");
    assert_line_like(&responses[0], r"^3501mbce\d+ NO Mailbox already exists$");

    let responses = client.command("CREATE a..b");
    assert_line_like(&responses[0], r"^3501mbce\d+ NO Unsafe mailbox name$");

    // A trailing delimiter is allowed and ignored
    client.quick_create("parent.");
    let responses = client.ok_command("LIST \"\" parent");
    assert_eq!(
        vec!["* LIST (\\HasNoChildren) \".\" parent"],
        responses
    );
}

#[test]
fn delete_semantics() {
    let setup = set_up();
    let mut client = setup.connect("3501mbds");
    client.quick_log_in();

    let responses = client.command("DELETE INBOX");
    assert_line_like(&responses[0], r"^3501mbds\d+ NO ");
    let responses = client.command("DELETE nonexistent");
    assert_line_like(&responses[0], r"^3501mbds\d+ NO No such mailbox$");

    client.quick_create("top.child");
    client.ok_command("DELETE top");
    let responses = client.ok_command("LIST \"\" top");
    assert_eq!(
        vec!["* LIST (\\Noselect \\HasChildren) \".\" top"],
        responses
    );

    let responses = client.command("SELECT top");
    assert_line_like(&responses[0], r"^3501mbds\d+ NO ");
    let responses = client.command("DELETE top");
    assert_line_like(&responses[0], r"^3501mbds\d+ NO Mailbox has inferiors$");

    client.ok_command("DELETE top.child");
    client.ok_command("DELETE top");
    let responses = client.ok_command("LIST \"\" *");
    assert_eq!(vec!["* LIST (\\HasNoChildren) \".\" INBOX"], responses);
}

#[test]
fn status() {
    let setup = set_up();
    let mut client = setup.connect("3501mbst");
    client.quick_log_in();
    client.quick_create("stat");
    client.quick_append("stat", 2);

    let responses =
        client.ok_command("STATUS stat (MESSAGES RECENT UIDNEXT UNSEEN)");
    assert_eq!(
        vec!["* STATUS stat (MESSAGES 2 RECENT 2 UIDNEXT 3 UNSEEN 2)"],
        responses
    );

    let responses = client.ok_command("status stat (uidvalidity)");
    assert_eq!(1, responses.len());
    assert_line_like(&responses[0], r"^\* STATUS stat \(UIDVALIDITY \d+\)$");

    let responses = client.command("STATUS nonexistent (MESSAGES)");
    assert_line_like(&responses[0], r"^3501mbst\d+ NO No such mailbox$");

    let responses = client.command("STATUS stat (BOGUS)");
    assert_line_like(
        &responses[0],
        r"^3501mbst\d+ BAD \[PARSE\] Unknown status attribute BOGUS",
    );
    let responses = client.command("STATUS stat ()");
    assert_line_like(&responses[0], r"^3501mbst\d+ BAD \[PARSE\] ");
}
