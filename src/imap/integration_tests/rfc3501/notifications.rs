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
fn new_messages() {
    let setup = set_up();
    let mut client = setup.connect("3501nonm");
    let mut other = setup.connect("3501nonm2");
    client.quick_log_in();
    other.quick_log_in();
    client.quick_create("3501nonm");
    client.quick_append("3501nonm", 3);
    client.quick_select("3501nonm");

    other.quick_append("3501nonm", 1);
    let responses = client.ok_command("NOOP");
    assert_eq!(vec!["* 4 EXISTS", "* 1 RECENT"], responses);

    // Reported once only
    let responses = client.ok_command("NOOP");
    assert!(responses.is_empty(), "{:?}", responses);

    // Size changes may be reported even during FETCH
    other.quick_append("3501nonm", 1);
    let responses = client.ok_command("FETCH 1 UID");
    assert_eq!(
        vec!["* 1 FETCH (UID 1)", "* 5 EXISTS", "* 1 RECENT"],
        responses
    );
}

#[test]
fn expunge_deferred_during_fetch() {
    let setup = set_up();
    let mut client = setup.connect("3501noed");
    let mut other = setup.connect("3501noed2");
    client.quick_log_in();
    other.quick_log_in();
    client.quick_create("3501noed");
    client.quick_append("3501noed", 3);
    client.quick_select("3501noed");
    other.quick_select("3501noed");

    other.ok_command("STORE 2 +FLAGS.SILENT (\\Deleted)");
    other.ok_command("EXPUNGE");

    let responses = client.ok_command("FETCH 1:* UID");
    assert_eq!(
        vec![
            "* 1 FETCH (UID 1)",
            "* 3 FETCH (UID 3)",
            "* 2 FETCH (FLAGS (\\Deleted) UID 2)",
        ],
        responses
    );

    // STORE and SEARCH can't report it either
    let responses = client.ok_command("STORE 3 +FLAGS (\\Seen)");
    assert_eq!(vec!["* 3 FETCH (FLAGS (\\Seen) UID 3)"], responses);
    let responses = client.ok_command("SEARCH SEEN");
    assert_eq!(vec!["* SEARCH 3"], responses);

    let responses = client.ok_command("NOOP");
    assert_eq!(vec!["* 2 EXPUNGE"], responses);

    // The numbering has caught up
    let responses = client.ok_command("FETCH 1:* UID");
    assert_eq!(vec!["* 1 FETCH (UID 1)", "* 2 FETCH (UID 3)"], responses);
}

#[test]
fn uid_commands_report_expunges() {
    let setup = set_up();
    let mut client = setup.connect("3501nouc");
    let mut other = setup.connect("3501nouc2");
    client.quick_log_in();
    other.quick_log_in();
    client.quick_create("3501nouc");
    client.quick_append("3501nouc", 4);
    client.quick_select("3501nouc");
    other.quick_select("3501nouc");

    other.ok_command("STORE 2,4 +FLAGS.SILENT (\\Deleted)");
    other.ok_command("EXPUNGE");

    let responses = client.ok_command("UID FETCH 1:* UID");
    assert_eq!(
        vec![
            "* 1 FETCH (UID 1)",
            "* 3 FETCH (UID 3)",
            "* 2 FETCH (FLAGS (\\Deleted) UID 2)",
            "* 4 FETCH (FLAGS (\\Deleted) UID 4)",
            "* 2 EXPUNGE",
            "* 3 EXPUNGE",
        ],
        responses
    );
}

#[test]
fn expunge_then_append() {
    let setup = set_up();
    let mut client = setup.connect("3501noea");
    let mut other = setup.connect("3501noea2");
    client.quick_log_in();
    other.quick_log_in();
    client.quick_create("3501noea");
    client.quick_append("3501noea", 2);
    client.quick_select("3501noea");
    other.quick_select("3501noea");

    other.ok_command("STORE 1 +FLAGS.SILENT (\\Deleted)");
    other.ok_command("EXPUNGE");
    other.quick_append("3501noea", 1);

    // EXISTS counts the message the client still believes in
    let responses = client.ok_command("NOOP");
    assert_eq!(
        vec![
            "* 3 EXISTS",
            "* 0 RECENT",
            "* 1 FETCH (FLAGS (\\Deleted) UID 1)",
            "* 1 EXPUNGE",
        ],
        responses
    );
}

#[test]
fn mailbox_deleted_elsewhere() {
    let setup = set_up();
    let mut client = setup.connect("3501nomd");
    let mut other = setup.connect("3501nomd2");
    client.quick_log_in();
    other.quick_log_in();
    client.quick_create("doomed");
    client.quick_select("doomed");

    other.ok_command("DELETE doomed");

    assert_eq!("* BYE Mailbox doomed has been deleted", client.read_line());
    assert_eq!(Ok(()), client.server_result());

    // Nobody is listening to anything anymore
    let responses = other.ok_command("LIST \"\" doomed");
    assert!(responses.is_empty(), "{:?}", responses);
}

#[test]
fn own_mailbox_deleted() {
    let setup = set_up();
    let mut client = setup.connect("3501noom");
    client.quick_log_in();
    client.quick_create("3501noom");
    client.quick_select("3501noom");

    let responses = client.ok_command("DELETE 3501noom");
    assert!(responses.is_empty(), "{:?}", responses);

    let responses = client.command("CHECK");
    assert_line_like(
        &responses[0],
        r"^3501noom\d+ BAD Command not valid in this state$",
    );
}
