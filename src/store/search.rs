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

//! The SEARCH criteria tree and its evaluation against stored messages.
//!
//! String matching follows RFC 3501: a key matches if its string is a
//! case-insensitive substring of the field. No charset conversion is done
//! beyond treating the message as (lossy) UTF-8.

use chrono::prelude::*;

use super::message::StoredMessage;
use super::model::{Flag, SequenceSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateCmp {
    Before,
    On,
    Since,
}

impl DateCmp {
    fn matches(self, actual: NaiveDate, key: NaiveDate) -> bool {
        match self {
            DateCmp::Before => actual < key,
            DateCmp::On => actual == key,
            DateCmp::Since => actual >= key,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeCmp {
    Larger,
    Smaller,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchTerm {
    All,
    /// Matches if the message has (`true`) or lacks (`false`) the flag.
    Flag(Flag, bool),
    /// Matches if the message has (`true`) or lacks (`false`) `\Recent`.
    Recent(bool),
    /// The named header contains the string. An empty string matches any
    /// message which has the header at all.
    Header(String, String),
    Body(String),
    /// Anywhere in the header or body.
    Text(String),
    InternalDate(DateCmp, NaiveDate),
    SentDate(DateCmp, NaiveDate),
    Size(SizeCmp, u32),
    Uid(SequenceSet),
    Seqnum(SequenceSet),
    And(Vec<SearchTerm>),
    Or(Box<SearchTerm>, Box<SearchTerm>),
    Not(Box<SearchTerm>),
}

/// What a single message looks like to the evaluator.
///
/// Sequence numbers here are those of the *client*, since a client searching
/// by sequence number means its own numbering.
pub struct Candidate<'a> {
    pub message: &'a StoredMessage,
    pub seqnum: u32,
    pub max_seqnum: u32,
    pub max_uid: u32,
}

impl SearchTerm {
    pub fn matches(&self, c: &Candidate<'_>) -> bool {
        let message = c.message;
        match *self {
            SearchTerm::All => true,
            SearchTerm::Flag(ref flag, set) => message.has_flag(flag) == set,
            SearchTerm::Recent(set) => message.recent == set,
            SearchTerm::Header(ref name, ref value) => message
                .header_values(name)
                .iter()
                .any(|v| contains_ignore_case(v, value)),
            SearchTerm::Body(ref s) => {
                contains_ignore_case(&String::from_utf8_lossy(message.body()), s)
            }
            SearchTerm::Text(ref s) => {
                contains_ignore_case(&String::from_utf8_lossy(message.raw()), s)
            }
            SearchTerm::InternalDate(cmp, date) => {
                cmp.matches(message.internal_date.naive_local().date(), date)
            }
            SearchTerm::SentDate(cmp, date) => message
                .sent_date()
                .map_or(false, |sent| cmp.matches(sent, date)),
            SearchTerm::Size(SizeCmp::Larger, n) => message.size() > n as usize,
            SearchTerm::Size(SizeCmp::Smaller, n) => {
                message.size() < n as usize
            }
            SearchTerm::Uid(ref set) => {
                set.contains(message.uid.0.get(), c.max_uid)
            }
            SearchTerm::Seqnum(ref set) => set.contains(c.seqnum, c.max_seqnum),
            SearchTerm::And(ref terms) => terms.iter().all(|t| t.matches(c)),
            SearchTerm::Or(ref a, ref b) => a.matches(c) || b.matches(c),
            SearchTerm::Not(ref t) => !t.matches(c),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
