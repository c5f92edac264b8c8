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

//! Messages as the store keeps them.
//!
//! There is no real MIME handling here. The only structure we care about is
//! the split between the header block and the body, and the individual
//! (unfolded) header fields, since that is all SEARCH and the simple FETCH
//! items need.

use std::str;
use std::sync::Arc;

use chrono::prelude::*;

use super::model::{Flag, Uid};

#[derive(Clone, Debug)]
pub struct StoredMessage {
    pub uid: Uid,
    pub flags: Vec<Flag>,
    /// Whether the message still carries `\Recent`.
    pub recent: bool,
    pub internal_date: DateTime<FixedOffset>,
    data: Arc<[u8]>,
}

impl StoredMessage {
    pub fn new(
        uid: Uid,
        data: Arc<[u8]>,
        flags: Vec<Flag>,
        internal_date: DateTime<FixedOffset>,
    ) -> Self {
        StoredMessage {
            uid,
            flags,
            recent: true,
            internal_date,
            data,
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// Return a new handle on the raw data without copying it.
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn has_flag(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Return the header block, including the blank line that terminates it.
    pub fn header_block(&self) -> &[u8] {
        &self.data[..self.body_offset()]
    }

    pub fn body(&self) -> &[u8] {
        &self.data[self.body_offset()..]
    }

    fn body_offset(&self) -> usize {
        let data = &self.data[..];
        let mut line_start = 0;
        while line_start < data.len() {
            let line_end = data[line_start..]
                .iter()
                .position(|&b| b'\n' == b)
                .map(|p| line_start + p + 1)
                .unwrap_or_else(|| data.len());
            let line = &data[line_start..line_end];
            if b"\r\n" == line || b"\n" == line {
                return line_end;
            }
            line_start = line_end;
        }

        data.len()
    }

    /// Return all header fields in order, unfolded.
    ///
    /// Lines that are neither a field nor a continuation are skipped.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = Vec::new();
        let text = String::from_utf8_lossy(self.header_block());
        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(&mut (_, ref mut value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some(colon) = line.find(':') {
                let (name, value) = line.split_at(colon);
                headers
                    .push((name.trim().to_owned(), value[1..].trim().to_owned()));
            }
        }

        headers
    }

    /// Return the value of every header named `name`, case-insensitively.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers()
            .into_iter()
            .filter(|&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
            .collect()
    }

    /// Return the date from the `Date:` header, if it is present and valid.
    pub fn sent_date(&self) -> Option<NaiveDate> {
        self.header_values("Date").into_iter().find_map(|v| {
            DateTime::parse_from_rfc2822(v.trim())
                .ok()
                .map(|dt| dt.naive_local().date())
        })
    }
}

#[cfg(test)]
pub(crate) fn message_of(uid: u32, text: &str) -> StoredMessage {
    StoredMessage::new(
        Uid::u(uid),
        Arc::from(text.as_bytes()),
        vec![],
        FixedOffset::east(0).ymd(2020, 7, 12).and_hms(10, 0, 0),
    )
}
