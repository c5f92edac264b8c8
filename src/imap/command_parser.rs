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

//! Argument parsing for IMAP commands.
//!
//! Everything here is layered on the `RequestReader` primitives. Each helper
//! skips leading spaces itself, so a command handler just calls the helpers
//! for its arguments in order and finishes with `end_of_line()`.
//!
//! Dates are parsed with `nom` once the raw text has been scanned off the
//! stream. Month names are always English, regardless of the locale of the
//! process.

use std::str;

use chrono::prelude::*;
use nom::{
    branch::alt,
    bytes::complete::{tag, take, take_while_m_n},
    character::is_digit,
    combinator::{all_consuming, map, map_opt},
    sequence, IResult,
};

use super::request_reader::RequestReader;
use crate::store::model::{Flag, SequenceSet};
use crate::support::error::{bad_syntax, Error};

/// The maximum length of any single atom or quoted string.
pub const MAX_ATOM: usize = 65536;

impl RequestReader {
    /// Consume bytes for as long as `pred` holds.
    ///
    /// At least one byte that fails `pred` (or end of stream) must follow
    /// within `MAX_ATOM` bytes.
    pub fn take_while(
        &mut self,
        pred: impl Fn(u8) -> bool,
    ) -> Result<Vec<u8>, Error> {
        let mut accum = Vec::new();
        loop {
            let ch = self.next_char()?;
            if !pred(ch) {
                return Ok(accum);
            }

            if accum.len() >= MAX_ATOM {
                return Err(bad_syntax("Token too long"));
            }

            accum.push(self.consume()?);
        }
    }

    /// Read a command tag at the very start of a line.
    pub fn tag(&mut self) -> Result<String, Error> {
        let raw = self.take_while(is_tag_char)?;
        if raw.is_empty() {
            return Err(bad_syntax("Missing tag"));
        }
        Ok(string_of(raw)?)
    }

    pub fn atom(&mut self) -> Result<String, Error> {
        let first = self.next_word_char()?;
        let raw = self.take_while(is_atom_char)?;
        if raw.is_empty() {
            return Err(bad_syntax(format!(
                "Unexpected '{}'",
                char::from(first).escape_default()
            )));
        }
        Ok(string_of(raw)?)
    }

    /// Read an atom, quoted string, or literal.
    pub fn astring(&mut self) -> Result<String, Error> {
        match self.next_word_char()? {
            b'"' => self.quoted(),
            b'{' => string_of(self.literal()?),
            _ => {
                let raw = self.take_while(is_astring_char)?;
                if raw.is_empty() {
                    return Err(bad_syntax("Expected string"));
                }
                string_of(raw)
            }
        }
    }

    /// Read a mailbox name. `INBOX` is canonicalised to upper case.
    pub fn mailbox(&mut self) -> Result<String, Error> {
        let name = self.astring()?;
        if name.eq_ignore_ascii_case("INBOX") {
            Ok("INBOX".to_owned())
        } else {
            Ok(name)
        }
    }

    /// Read a `LIST` pattern, which additionally permits bare `%` and `*`.
    pub fn list_mailbox(&mut self) -> Result<String, Error> {
        match self.next_word_char()? {
            b'"' => self.quoted(),
            b'{' => string_of(self.literal()?),
            _ => {
                let raw = self.take_while(|ch| {
                    is_astring_char(ch) || b'%' == ch || b'*' == ch
                })?;
                if raw.is_empty() {
                    return Err(bad_syntax("Expected mailbox pattern"));
                }
                string_of(raw)
            }
        }
    }

    /// Read a quoted string, starting at the opening quote.
    ///
    /// Only `\\` and `\"` are valid escapes, and the string may not span
    /// lines.
    pub fn quoted(&mut self) -> Result<String, Error> {
        if b'"' != self.next_word_char()? {
            return Err(bad_syntax("Expected quoted string"));
        }
        self.consume()?;

        let mut accum = Vec::new();
        loop {
            match self.consume()? {
                b'"' => break,
                b'\\' => match self.consume()? {
                    ch @ b'\\' | ch @ b'"' => accum.push(ch),
                    _ => return Err(bad_syntax("Bad escape in quoted string")),
                },
                b'\r' | b'\n' => {
                    return Err(bad_syntax("Unterminated quoted string"))
                }
                ch => accum.push(ch),
            }

            if accum.len() > MAX_ATOM {
                return Err(bad_syntax("Quoted string too long"));
            }
        }

        string_of(accum)
    }

    /// Read a literal, starting at the opening `{`.
    ///
    /// A synchronising literal gets a continuation prompt before its payload
    /// is read; a `{n+}` literal does not. A literal larger than the
    /// configured limit is refused with a syntax error. When it was a
    /// non-synchronising literal, its payload is discarded first so the
    /// stream stays in step with the client.
    pub fn literal(&mut self) -> Result<Vec<u8>, Error> {
        if b'{' != self.next_word_char()? {
            return Err(bad_syntax("Expected literal"));
        }
        self.consume()?;

        let digits = self.take_while(|ch| ch.is_ascii_digit())?;
        let len = str::from_utf8(&digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| bad_syntax("Bad literal length"))?;

        let synchronising = if b'+' == self.next_char()? {
            self.consume()?;
            false
        } else {
            true
        };

        if b'}' != self.consume()? {
            return Err(bad_syntax("Bad literal syntax"));
        }
        self.end_of_line()?;

        if len > self.max_literal() {
            if !synchronising {
                self.skip_exact(len)?;
            }
            return Err(bad_syntax("Literal too large"));
        }

        if synchronising {
            self.continuation_prompt()?;
        }

        self.read_exact(len)
    }

    pub fn number(&mut self) -> Result<u32, Error> {
        self.next_word_char()?;
        let digits = self.take_while(|ch| ch.is_ascii_digit())?;
        str::from_utf8(&digits)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| bad_syntax("Expected number"))
    }

    pub fn sequence_set(&mut self) -> Result<SequenceSet, Error> {
        self.next_word_char()?;
        let raw = self.take_while(is_sequence_set_char)?;
        str::from_utf8(&raw)
            .ok()
            .and_then(SequenceSet::parse)
            .ok_or_else(|| bad_syntax("Bad sequence set"))
    }

    pub fn flag(&mut self) -> Result<Flag, Error> {
        let mut raw = Vec::new();
        if b'\\' == self.next_word_char()? {
            raw.push(self.consume()?);
        }
        raw.extend(self.take_while(is_atom_char)?);
        string_of(raw)?.parse()
    }

    /// Read either a parenthesised list of flags or a single bare flag.
    pub fn flag_list(&mut self) -> Result<Vec<Flag>, Error> {
        if b'(' != self.next_word_char()? {
            return Ok(vec![self.flag()?]);
        }
        self.consume()?;

        let mut flags = Vec::new();
        loop {
            if b')' == self.next_word_char()? {
                self.consume()?;
                return Ok(flags);
            }

            flags.push(self.flag()?);
        }
    }

    /// Read a `d-Mon-yyyy` date, optionally quoted.
    pub fn date(&mut self) -> Result<NaiveDate, Error> {
        self.next_word_char()?;
        let raw = self.take_while(|ch| {
            !matches!(ch, b' ' | b'\r' | b'\n' | b'(' | b')')
        })?;
        parse_date(&raw).ok_or_else(|| bad_syntax("Bad date"))
    }

    /// Read a quoted `date-time` as used by `APPEND`.
    pub fn datetime(&mut self) -> Result<DateTime<FixedOffset>, Error> {
        let raw = self.quoted()?;
        parse_datetime(raw.as_bytes()).ok_or_else(|| bad_syntax("Bad date-time"))
    }
}

fn string_of(raw: Vec<u8>) -> Result<String, Error> {
    String::from_utf8(raw).map_err(|_| bad_syntax("Invalid UTF-8"))
}

pub fn is_atom_char(ch: u8) -> bool {
    match ch {
        0..=b' ' | 127..=255 => false,
        b'(' | b')' | b'{' | b'*' | b'%' | b'\\' | b'"' | b']' => false,
        _ => true,
    }
}

fn is_astring_char(ch: u8) -> bool {
    is_atom_char(ch) || b']' == ch
}

fn is_tag_char(ch: u8) -> bool {
    is_atom_char(ch) && b'+' != ch
}

pub fn is_sequence_set_char(ch: u8) -> bool {
    ch.is_ascii_digit() || b':' == ch || b',' == ch || b'*' == ch
}

/// Parse a `date`: `d-Mon-yyyy`, optionally surrounded by double quotes.
pub fn parse_date(raw: &[u8]) -> Option<NaiveDate> {
    all_consuming(date)(raw).ok().map(|(_, d)| d)
}

/// Parse the content of a quoted `date-time`, without the quotes.
pub fn parse_datetime(raw: &[u8]) -> Option<DateTime<FixedOffset>> {
    all_consuming(datetime)(raw).ok().map(|(_, d)| d)
}

fn parse_u32_infallible(i: &[u8]) -> u32 {
    // Only ever called on runs of at most four ASCII digits
    i.iter().fold(0, |accum, &d| accum * 10 + u32::from(d - b'0'))
}

fn one_digit(i: &[u8]) -> IResult<&[u8], u32> {
    map(take_while_m_n(1, 1, is_digit), parse_u32_infallible)(i)
}

fn two_digit(i: &[u8]) -> IResult<&[u8], u32> {
    map(take_while_m_n(2, 2, is_digit), parse_u32_infallible)(i)
}

fn four_digit(i: &[u8]) -> IResult<&[u8], u32> {
    map(take_while_m_n(4, 4, is_digit), parse_u32_infallible)(i)
}

static MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov",
    "dec",
];

fn month(i: &[u8]) -> IResult<&[u8], u32> {
    map_opt(take(3usize), |name| {
        str::from_utf8(name).ok().and_then(|name| {
            MONTH_NAMES
                .iter()
                .position(|n| n.eq_ignore_ascii_case(name))
                .map(|ix| ix as u32 + 1)
        })
    })(i)
}

fn date_text(i: &[u8]) -> IResult<&[u8], NaiveDate> {
    map_opt(
        sequence::tuple((
            sequence::terminated(alt((two_digit, one_digit)), tag("-")),
            sequence::terminated(month, tag("-")),
            four_digit,
        )),
        |(d, m, y)| NaiveDate::from_ymd_opt(y as i32, m, d),
    )(i)
}

fn date(i: &[u8]) -> IResult<&[u8], NaiveDate> {
    alt((
        date_text,
        sequence::delimited(tag("\""), date_text, tag("\"")),
    ))(i)
}

fn time_of_day(i: &[u8]) -> IResult<&[u8], (u32, u32, u32)> {
    sequence::tuple((
        two_digit,
        sequence::preceded(tag(":"), two_digit),
        sequence::preceded(tag(":"), two_digit),
    ))(i)
}

fn numeric_zone(i: &[u8]) -> IResult<&[u8], i32> {
    map(
        sequence::pair(
            alt((tag("+"), tag("-"))),
            sequence::pair(two_digit, two_digit),
        ),
        |(sign, (h, m))| {
            let n = (h * 60 + m) as i32;
            if b"-" == sign {
                -n
            } else {
                n
            }
        },
    )(i)
}

fn datetime_date(i: &[u8]) -> IResult<&[u8], NaiveDate> {
    map_opt(
        sequence::tuple((
            sequence::terminated(
                alt((two_digit, sequence::preceded(tag(" "), one_digit))),
                tag("-"),
            ),
            sequence::terminated(month, tag("-")),
            four_digit,
        )),
        |(d, m, y)| NaiveDate::from_ymd_opt(y as i32, m, d),
    )(i)
}

fn datetime(i: &[u8]) -> IResult<&[u8], DateTime<FixedOffset>> {
    map_opt(
        sequence::tuple((
            sequence::terminated(datetime_date, tag(" ")),
            sequence::terminated(time_of_day, tag(" ")),
            numeric_zone,
        )),
        |(date, (h, m, s), zone)| {
            FixedOffset::east_opt(zone * 60).and_then(|offset| {
                date.and_hms_opt(h, m, s).and_then(|datetime| {
                    offset.from_local_datetime(&datetime).latest()
                })
            })
        },
    )(i)
}
