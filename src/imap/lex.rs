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

//! Utilities for *writing* values under IMAP's "lexical rules".
//!
//! This is write-only since IMAP's lexical syntax is not separable from its
//! grammar.
//!
//! # Encoding Decisions
//!
//! We're generally pretty conservative here.
//!
//! Given the choice between encoding a string as an atom-like value or some
//! other form, we only use atom if all characters are in the set
//! `a-zA-Z0-9?=+/_.-` and the string is not "NIL".
//!
//! Given the choice between encoding a string as a quoted string or a literal,
//! we only choose the quoted string if it only contains printable ASCII other
//! than backslash and double-quote, and is less than 100 bytes long.
//! Everything else, including non-ASCII mailbox names, goes out as a literal.

use std::io::{self, Write};

use chrono::prelude::*;

use crate::store::model::Flag;

#[derive(Clone, Copy, Debug)]
pub struct LexWriter<W> {
    writer: W,
}

impl<W: Write> LexWriter<W> {
    pub fn new(writer: W) -> Self {
        LexWriter { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn verbatim(&mut self, s: &str) -> io::Result<()> {
        self.verbatim_bytes(s.as_bytes())
    }

    pub fn verbatim_bytes(&mut self, s: &[u8]) -> io::Result<()> {
        self.writer.write_all(s)
    }

    pub fn nil(&mut self) -> io::Result<()> {
        self.verbatim("NIL")
    }

    pub fn astring(&mut self, s: &str) -> io::Result<()> {
        if is_conservative_atom(s) {
            self.verbatim(s)
        } else {
            self.string(s)
        }
    }

    pub fn string(&mut self, s: &str) -> io::Result<()> {
        if is_quotable(s) {
            write!(self.writer, "\"{}\"", s)
        } else {
            self.literal(s.as_bytes())
        }
    }

    pub fn mailbox(&mut self, name: &str) -> io::Result<()> {
        self.astring(name)
    }

    pub fn literal(&mut self, data: &[u8]) -> io::Result<()> {
        write!(self.writer, "{{{}}}\r\n", data.len())?;
        self.writer.write_all(data)
    }

    pub fn flag(&mut self, flag: &Flag) -> io::Result<()> {
        write!(self.writer, "{}", flag)
    }

    pub fn datetime(
        &mut self,
        datetime: &DateTime<FixedOffset>,
    ) -> io::Result<()> {
        write!(
            self.writer,
            "\"{}\"",
            datetime.format("%_d-%b-%Y %H:%M:%S %z")
        )
    }

    pub fn num_u32(&mut self, value: u32) -> io::Result<()> {
        write!(self.writer, "{}", value)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn is_conservative_atom(s: &str) -> bool {
    !"nil".eq_ignore_ascii_case(s)
        && !s.is_empty()
        && s.bytes().all(|b| {
            matches!(
                b,
                b'a'..=b'z'
                    | b'A'..=b'Z'
                    | b'0'..=b'9'
                    | b'='
                    | b'?'
                    | b'/'
                    | b'+'
                    | b'_'
                    | b'.'
                    | b'-'
            )
        })
}

fn is_quotable(s: &str) -> bool {
    s.len() < 100
        && s.bytes().all(|b| match b {
            0..=31 | 127..=255 | b'\\' | b'"' => false,
            _ => true,
        })
}
