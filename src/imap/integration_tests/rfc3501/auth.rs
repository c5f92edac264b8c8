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
use crate::support::system_config::SystemConfig;

#[test]
fn log_in_success_and_failure() {
    let setup = set_up();
    let mut client = setup.connect("3501aulf");
    client.skip_greeting();

    let responses = client.command("LOGIN azure wrong");
    assert_line_like(&responses[0], r"^3501aulf\d+ NO Bad user name or password$");

    let responses = client.command("LOGIN nobody hunter2");
    assert_line_like(&responses[0], r"^3501aulf\d+ NO ");

    // Still not logged in
    let responses = client.command("LIST \"\" *");
    assert_line_like(
        &responses[0],
        r"^3501aulf\d+ BAD Command not valid in this state$",
    );

    client.ok_command("LOGIN \"azure\" \"hunter2\"");
    client.ok_command("LIST \"\" *");

    // LOGIN is only valid before authentication
    let responses = client.command("LOGIN azure hunter2");
    assert_line_like(
        &responses[0],
        r"^3501aulf\d+ BAD Command not valid in this state$",
    );
}

#[test]
fn commands_require_log_in() {
    let setup = set_up();
    let mut client = setup.connect("3501aurl");
    client.skip_greeting();

    for cmd in &[
        "SELECT INBOX",
        "EXAMINE INBOX",
        "CREATE foo",
        "DELETE foo",
        "STATUS INBOX (MESSAGES)",
        "FETCH 1 FLAGS",
        "UID FETCH 1 FLAGS",
        "CLOSE",
    ] {
        let responses = client.command(cmd);
        assert_eq!(1, responses.len(), "{}", cmd);
        assert_line_like(
            &responses[0],
            r"^3501aurl\d+ BAD Command not valid in this state$",
        );
    }

    // The connection is still in a sane state
    client.ok_command("NOOP");
    client.ok_command("LOGIN azure hunter2");
}

#[test]
fn auto_create_users() {
    let mut config = SystemConfig::default();
    config.imap.auto_create_users = true;
    let setup = set_up_with(config);

    let mut client = setup.connect("3501auac");
    client.skip_greeting();
    client.ok_command("LOGIN newbie s3cret");
    let responses = client.quick_select("INBOX");
    has_line_like(&responses, r"^\* 0 EXISTS$");

    // The user now exists with that password
    let mut client2 = setup.connect("3501auac2");
    client2.skip_greeting();
    let responses = client2.command("LOGIN newbie guess");
    assert_line_like(&responses[0], r"^3501auac2\d+ NO ");
    client2.ok_command("LOGIN newbie s3cret");
}
