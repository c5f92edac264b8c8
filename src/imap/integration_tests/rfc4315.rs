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

use super::defs::*;

#[test]
fn capability_declared() {
    let setup = set_up();
    let mut client = setup.connect("4315capa");

    let greeting = client.read_line();
    assert_line_like(&greeting, r"^\* OK \[CAPABILITY [^\]]* UIDPLUS[ \]]");
}

#[test]
fn uid_expunge() {
    let setup = set_up();
    let mut client = setup.connect("4315uidx");
    client.quick_log_in();
    client.quick_create("4315uidx");
    client.quick_append("4315uidx", 4);
    client.quick_select("4315uidx");

    client.ok_command("STORE 1:3 +FLAGS.SILENT (\\Deleted)");
    let responses = client.ok_command("UID EXPUNGE 2:3");
    assert_eq!(vec!["* 2 EXPUNGE", "* 2 EXPUNGE"], responses);

    // Message 1 is still \Deleted, but was outside the UID set
    let responses = client.ok_command("FETCH 1:* (UID FLAGS)");
    assert_eq!(
        vec![
            "* 1 FETCH (UID 1 FLAGS (\\Deleted))",
            "* 2 FETCH (UID 4 FLAGS ())",
        ],
        responses
    );

    client.ok_command("EXAMINE 4315uidx");
    let responses = client.command("UID EXPUNGE 1:*");
    assert_eq!(1, responses.len());
    assert_line_like(&responses[0], r"^4315uidx\d+ NO Mailbox is read-only$");

    let responses = client.command("UID EXPUNGE");
    assert_line_like(&responses[0], r"^4315uidx\d+ BAD \[PARSE\] ");
}

#[test]
fn append_uid() {
    let setup = set_up();
    let mut client = setup.connect("4315appu");
    client.quick_log_in();
    client.quick_create("4315appu");

    let responses = client.command("APPEND 4315appu {3+}\r\nfoo");
    let first = &responses[0];
    assert_line_like(first, r"^4315appu\d+ OK \[APPENDUID \d+ 1\] ");
    let responses = client.command("APPEND 4315appu {3+}\r\nbar");
    assert_line_like(&responses[0], r"^4315appu\d+ OK \[APPENDUID \d+ 2\] ");

    let uid_validity = uid_validity_of(first);
    let responses = client.quick_select("4315appu");
    has_line_like(
        &responses,
        &format!(r"^\* OK \[UIDVALIDITY {}\] ", uid_validity),
    );
}

#[test]
fn copy_uid() {
    let setup = set_up();
    let mut client = setup.connect("4315copu");
    client.quick_log_in();
    client.quick_create("4315copu.src");
    client.quick_create("4315copu.dst");
    client.quick_append("4315copu.src", 3);
    client.quick_append("4315copu.dst", 1);
    client.quick_select("4315copu.src");
    client.ok_command("STORE 2 +FLAGS.SILENT (\\Deleted)");
    client.ok_command("EXPUNGE");

    let responses = client.command("UID COPY 1:3 4315copu.dst");
    assert_eq!(1, responses.len());
    let response = &responses[0];
    assert_line_like(response, r"^4315copu\d+ OK \[COPYUID \d+ 1,3 2:3\] ");

    let uid_validity = uid_validity_of(response);
    let responses = client.quick_select("4315copu.dst");
    has_line_like(
        &responses,
        &format!(r"^\* OK \[UIDVALIDITY {}\] ", uid_validity),
    );
}

/// Extract the UID validity from an `APPENDUID` or `COPYUID` response.
fn uid_validity_of(response: &str) -> &str {
    let start = response.find("UID ").unwrap() + 4;
    let len = response[start..].find(' ').unwrap();
    &response[start..start + len]
}
