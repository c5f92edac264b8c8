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
fn append_synchronising_literal() {
    let setup = set_up();
    let mut client = setup.connect("3501meas");
    client.quick_log_in();

    let message = "Subject: Literal\r\n\r\nHello.\r\n";
    client.write_raw(
        format!(
            "A1 APPEND INBOX (\\Flagged) \"14-Jul-2020 02:44:25 -0700\" {{{}}}\r\n",
            message.len()
        )
        .as_bytes(),
    );
    let prompt = client.read_line();
    assert!(prompt.starts_with("+"), "Unexpected {:?}", prompt);

    client.write_raw(format!("{}\r\n", message).as_bytes());
    let responses = client.read_until_tagged("A1");
    assert_eq!(1, responses.len(), "{:?}", responses);
    assert_line_like(&responses[0], r"^A1 OK \[APPENDUID \d+ 1\] ");

    client.quick_select("INBOX");
    let responses = client.ok_command("FETCH 1 (FLAGS INTERNALDATE RFC822.SIZE)");
    assert_eq!(
        vec![format!(
            "* 1 FETCH (FLAGS (\\Flagged) \
             INTERNALDATE \"14-Jul-2020 02:44:25 -0700\" RFC822.SIZE {})",
            message.len()
        )],
        responses
    );
}

#[test]
fn append_errors() {
    let setup = set_up();
    let mut client = setup.connect("3501meae");
    client.quick_log_in();

    let responses = client.command("APPEND nonexistent {3+}\r\nfoo");
    assert_eq!(1, responses.len());
    assert_line_like(
        &responses[0],
        r"^3501meae\d+ NO \[TRYCREATE\] No such mailbox$",
    );

    let responses = client.command("APPEND INBOX (\\Bogus) {3+}\r\nfoo");
    assert_line_like(&responses[0], r"^3501meae\d+ BAD \[PARSE\] ");

    let responses = client.command("APPEND INBOX \"not a date\" {3+}\r\nfoo");
    assert_line_like(&responses[0], r"^3501meae\d+ BAD \[PARSE\] ");

    // Nothing got in, and the connection is still usable
    let responses = client.ok_command("STATUS INBOX (MESSAGES)");
    assert_eq!(vec!["* STATUS INBOX (MESSAGES 0)"], responses);
}

#[test]
fn expunge() {
    let setup = set_up();
    let mut client = setup.connect("3501meex");
    client.quick_log_in();
    client.quick_create("3501meex");
    client.quick_append("3501meex", 4);
    client.quick_select("3501meex");

    let responses = client.ok_command("STORE 1,3 +FLAGS (\\Deleted)");
    assert_eq!(
        vec![
            "* 1 FETCH (FLAGS (\\Deleted) UID 1)",
            "* 3 FETCH (FLAGS (\\Deleted) UID 3)",
        ],
        responses
    );

    let responses = client.ok_command("EXPUNGE");
    assert_eq!(vec!["* 1 EXPUNGE", "* 2 EXPUNGE"], responses);

    let responses = client.ok_command("FETCH 1:* UID");
    assert_eq!(
        vec!["* 1 FETCH (UID 2)", "* 2 FETCH (UID 4)"],
        responses
    );

    // Nothing left to expunge
    let responses = client.ok_command("EXPUNGE");
    assert!(responses.is_empty(), "{:?}", responses);

    client.ok_command("EXAMINE 3501meex");
    let responses = client.command("EXPUNGE");
    assert_line_like(&responses[0], r"^3501meex\d+ NO Mailbox is read-only$");
}

#[test]
fn close_expunges_silently() {
    let setup = set_up();
    let mut client = setup.connect("3501mecs");
    client.quick_log_in();
    client.quick_create("3501mecs");
    client.quick_append("3501mecs", 3);
    client.quick_select("3501mecs");

    client.ok_command("STORE 2 +FLAGS.SILENT (\\Deleted)");
    let responses = client.ok_command("CLOSE");
    assert!(responses.is_empty(), "{:?}", responses);

    let responses = client.ok_command("STATUS 3501mecs (MESSAGES)");
    assert_eq!(vec!["* STATUS 3501mecs (MESSAGES 2)"], responses);

    // CLOSE on a read-only view leaves \Deleted messages in place
    client.ok_command("EXAMINE 3501mecs");
    let mut other = setup.connect("3501mecs2");
    other.quick_log_in();
    other.quick_select("3501mecs");
    other.ok_command("STORE 1 +FLAGS.SILENT (\\Deleted)");

    client.ok_command("CLOSE");
    let responses = client.ok_command("STATUS 3501mecs (MESSAGES)");
    assert_eq!(vec!["* STATUS 3501mecs (MESSAGES 2)"], responses);
}

#[test]
fn copy() {
    let setup = set_up();
    let mut client = setup.connect("3501meco");
    client.quick_log_in();
    client.quick_create("3501meco");
    client.quick_create("3501meco.dst");
    client.quick_append("3501meco", 3);
    client.quick_select("3501meco");
    client.ok_command("STORE 2 +FLAGS.SILENT (\\Flagged)");

    let responses = client.command("COPY 2:3 3501meco.dst");
    assert_eq!(1, responses.len());
    assert_line_like(
        &responses[0],
        r"^3501meco\d+ OK \[COPYUID \d+ 2:3 1:2\] ",
    );

    let responses = client.command("UID COPY 1 3501meco.dst");
    assert_line_like(&responses[0], r"^3501meco\d+ OK \[COPYUID \d+ 1 3\] ");

    // Nothing matched; still OK, but without COPYUID
    let responses = client.command("UID COPY 99 3501meco.dst");
    assert_line_like(&responses[0], r"^3501meco\d+ OK Completed$");

    let responses = client.command("COPY 1 nonexistent");
    assert_line_like(
        &responses[0],
        r"^3501meco\d+ NO \[TRYCREATE\] No such mailbox$",
    );
    let responses = client.command("COPY 4 3501meco.dst");
    assert_line_like(&responses[0], r"^3501meco\d+ BAD ");

    // The copies keep their flags and are \Recent
    let responses = client.ok_command("STATUS 3501meco.dst (MESSAGES RECENT)");
    assert_eq!(
        vec!["* STATUS 3501meco.dst (MESSAGES 3 RECENT 3)"],
        responses
    );
    client.quick_select("3501meco.dst");
    let responses = client.ok_command("FETCH 1:* FLAGS");
    assert_eq!(
        vec![
            "* 1 FETCH (FLAGS (\\Flagged))",
            "* 2 FETCH (FLAGS ())",
            "* 3 FETCH (FLAGS ())",
        ],
        responses
    );
}

#[test]
fn copy_into_selected_mailbox() {
    let setup = set_up();
    let mut client = setup.connect("3501mecm");
    client.quick_log_in();
    client.quick_create("3501mecm");
    client.quick_append("3501mecm", 2);
    client.quick_select("3501mecm");

    let responses = client.ok_command("COPY 1:* 3501mecm");
    assert_eq!(
        vec!["* 4 EXISTS".to_owned(), "* 2 RECENT".to_owned()],
        responses
    );
}
