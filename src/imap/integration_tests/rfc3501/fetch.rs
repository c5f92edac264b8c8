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

const HEADER: &str = "From: sender0@example.com\r\nSubject: Message 0\r\n\r\n";
const TEXT: &str = "Body of message 0.\r\n";

#[test]
fn simple_attributes() {
    let setup = set_up();
    let mut client = setup.connect("3501fesa");
    client.quick_log_in();
    client.quick_create("3501fesa");
    client.quick_append("3501fesa", 2);
    client.quick_select("3501fesa");

    let responses = client.ok_command("FETCH 1 (FLAGS UID RFC822.SIZE)");
    assert_eq!(
        vec![format!(
            "* 1 FETCH (FLAGS () UID 1 RFC822.SIZE {})",
            HEADER.len() + TEXT.len()
        )],
        responses
    );

    let responses = client.ok_command("FETCH 1:* FAST");
    assert_eq!(2, responses.len(), "{:?}", responses);
    assert_line_like(
        &responses[1],
        r#"^\* 2 FETCH \(FLAGS \(\) INTERNALDATE "[^"]+" RFC822\.SIZE \d+\)$"#,
    );

    // UID FETCH implies UID
    let responses = client.ok_command("UID FETCH 2 FLAGS");
    assert_eq!(vec!["* 2 FETCH (FLAGS () UID 2)"], responses);

    // UIDs that don't exist are silently skipped
    let responses = client.ok_command("UID FETCH 5:7 FLAGS");
    assert!(responses.is_empty(), "{:?}", responses);
}

#[test]
fn body_sections() {
    let setup = set_up();
    let mut client = setup.connect("3501febs");
    client.quick_log_in();
    client.quick_create("3501febs");
    client.quick_append("3501febs", 1);
    client.quick_select("3501febs");

    let responses = client.ok_command("FETCH 1 BODY.PEEK[HEADER]");
    assert_eq!(
        vec![
            format!("* 1 FETCH (BODY[HEADER] {{{}}}", HEADER.len()),
            "From: sender0@example.com".to_owned(),
            "Subject: Message 0".to_owned(),
            "".to_owned(),
            ")".to_owned(),
        ],
        responses
    );

    // PEEK left \Seen alone
    let responses = client.ok_command("FETCH 1 FLAGS");
    assert_eq!(vec!["* 1 FETCH (FLAGS ())"], responses);

    let responses = client.ok_command("FETCH 1 BODY[TEXT]");
    assert_eq!(
        vec![
            format!("* 1 FETCH (BODY[TEXT] {{{}}}", TEXT.len()),
            "Body of message 0.".to_owned(),
            ")".to_owned(),
            "* 1 FETCH (FLAGS (\\Seen) UID 1)".to_owned(),
        ],
        responses
    );

    let responses = client.ok_command("FETCH 1 RFC822");
    assert_eq!(
        format!("* 1 FETCH (RFC822 {{{}}}", HEADER.len() + TEXT.len()),
        responses[0]
    );
    // Already \Seen, so nothing changed
    assert_eq!(")", responses[responses.len() - 1]);
}

#[test]
fn examine_does_not_set_seen() {
    let setup = set_up();
    let mut client = setup.connect("3501feex");
    client.quick_log_in();
    client.quick_create("3501feex");
    client.quick_append("3501feex", 1);
    client.ok_command("EXAMINE 3501feex");

    let responses = client.ok_command("FETCH 1 (FLAGS BODY[])");
    assert_line_like(&responses[0], r"^\* 1 FETCH \(FLAGS \(\\Recent\) BODY\[\] \{\d+\}$");

    let responses = client.ok_command("FETCH 1 FLAGS");
    assert_eq!(vec!["* 1 FETCH (FLAGS (\\Recent))"], responses);
}

#[test]
fn fetch_errors() {
    let setup = set_up();
    let mut client = setup.connect("3501feer");
    client.quick_log_in();
    client.quick_create("3501feer");
    client.quick_append("3501feer", 2);
    client.quick_select("3501feer");

    let responses = client.command("FETCH 3 FLAGS");
    assert_eq!(1, responses.len());
    assert_line_like(&responses[0], r"^3501feer\d+ BAD ");

    let responses = client.command("FETCH 1 ENVELOPE");
    assert_line_like(
        &responses[0],
        r"^3501feer\d+ BAD \[PARSE\] Unsupported fetch attribute ENVELOPE",
    );

    let responses = client.command("FETCH 1 BODY[]<0.10>");
    assert_line_like(&responses[0], r"^3501feer\d+ BAD \[PARSE\] ");

    let responses = client.command("FETCH 1 ()");
    assert_line_like(&responses[0], r"^3501feer\d+ BAD \[PARSE\] ");

    // Nothing got marked \Seen along the way
    let responses = client.ok_command("FETCH 1:2 FLAGS");
    assert_eq!(
        vec!["* 1 FETCH (FLAGS ())", "* 2 FETCH (FLAGS ())"],
        responses
    );
}
