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

//! Mailbox name handling: normalisation, validation, and `LIST` patterns.
//!
//! The hierarchy delimiter is `.`. The root `INBOX` is case-insensitive, so
//! `inbox.Sent` and `INBOX.Sent` name the same mailbox.

use crate::support::error::Error;

pub const DELIMITER: char = '.';

/// Normalise a raw mailbox name.
///
/// The first component is upper-cased if it is some spelling of `INBOX`.
/// Every component must be a safe name; an empty component (as in `a..b`
/// or `.a`) makes the whole name unsafe.
pub fn normalise_mailbox_name(name: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(name.len());
    for (ix, part) in name.split(DELIMITER).enumerate() {
        if !is_safe_name(part) {
            return Err(Error::UnsafeName);
        }

        if ix > 0 {
            out.push(DELIMITER);
        }

        if 0 == ix && "inbox".eq_ignore_ascii_case(part) {
            out.push_str("INBOX");
        } else {
            out.push_str(part);
        }
    }

    Ok(out)
}

/// Return the names of every strict superior of `name`, outermost first.
pub fn superiors(name: &str) -> impl Iterator<Item = &str> + '_ {
    name.match_indices(DELIMITER).map(move |(ix, _)| &name[..ix])
}

/// Return whether `child` is a strict inferior of `parent`.
pub fn is_inferior_of(child: &str, parent: &str) -> bool {
    child.len() > parent.len() + 1
        && child.starts_with(parent)
        && child[parent.len()..].starts_with(DELIMITER)
}

/// Determine whether the given name is usable as one component of a mailbox
/// name.
///
/// It excludes empty names, the delimiter, and things that have special
/// meaning within IMAP.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() &&
        name.find(DELIMITER).is_none() &&
        // Names beginning with # have special meaning in IMAP
        name.chars().next() != Some('#') &&
        // Don't allow any ASCII control characters
        name.find(|c| c < ' ' || c == '\x7F').is_none() &&
        // * and % are very special in *some* IMAP contexts, so forbid
        // everywhere
        name.find(|c| c == '*' || c == '%').is_none()
}

/// Creates a predicate which identifies which normalised mailbox names match
/// `pattern`, with pattern matching performed as per RFC 3501.
///
/// `*` matches anything, including the delimiter; `%` matches anything but
/// the delimiter. A leading `INBOX` component in the pattern is matched
/// case-insensitively.
pub fn mailbox_path_matcher(pattern: &str) -> impl Fn(&str) -> bool {
    let mut rx = "^".to_owned();
    for (part_ix, part) in pattern.split(DELIMITER).enumerate() {
        if part_ix > 0 {
            rx.push_str(&regex::escape(&DELIMITER.to_string()));
        }

        if 0 == part_ix && "inbox".eq_ignore_ascii_case(part) {
            rx.push_str("INBOX");
            continue;
        }

        let mut start = 0;
        for end in part
            .match_indices(|c| '%' == c || '*' == c)
            .map(|(ix, _)| ix)
            .chain(part.len()..=part.len())
        {
            let chunk = &part[start..end];
            start = (end + 1).min(part.len());

            rx.push_str(&regex::escape(chunk));
            match part.get(end..end + 1) {
                Some("*") => rx.push_str(".*"),
                Some("%") => rx.push_str("[^.]*"),
                _ => (),
            }
        }
    }
    rx.push('$');

    let rx = regex::Regex::new(&rx).expect("Built invalid regex?");
    move |s| rx.is_match(s)
}
