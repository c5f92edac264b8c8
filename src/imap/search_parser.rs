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

//! Recursive-descent parser for `SEARCH` criteria.
//!
//! ```text
//! criteria  := term (SP term)*
//! term      := key-token (SP parameter)* | '(' criteria ')'
//! ```
//!
//! Siblings are AND-conjoined, and a parenthesised group is spliced into the
//! conjunction around it, so `(DELETED FLAGGED)` and `DELETED FLAGGED`
//! produce the same tree.
//!
//! Parameters of the string kind are scanned off the stream directly rather
//! than through the `astring` helper, because quoted search parameters have
//! looser rules: any character may be backslash-escaped, and a quoted string
//! that is never closed runs to the end of the line.

use super::command_parser::{is_sequence_set_char, parse_date};
use super::request_reader::RequestReader;
use crate::store::model::{Flag, SequenceSet};
use crate::store::search::{DateCmp, SearchTerm, SizeCmp};
use crate::support::error::{bad_syntax, Error};

/// Groups and `NOT`/`OR` operands may not nest deeper than this.
const MAX_DEPTH: usize = 64;

/// A fully parsed `SEARCH` argument list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCommand {
    pub charset: Option<String>,
    pub criteria: SearchTerm,
}

impl SearchCommand {
    /// Fail with `UnsupportedCharset` unless the requested charset, if any,
    /// is one we can search in.
    pub fn check_charset(&self) -> Result<(), Error> {
        let supported = self.charset.as_ref().map_or(true, |cs| {
            cs.eq_ignore_ascii_case("US-ASCII")
                || cs.eq_ignore_ascii_case("UTF-8")
        });

        if supported {
            Ok(())
        } else {
            Err(Error::UnsupportedCharset)
        }
    }
}

pub struct SearchTermParser<'r> {
    reader: &'r mut RequestReader,
    charset: Option<String>,
    seen_term: bool,
    depth: usize,
}

impl<'r> SearchTermParser<'r> {
    pub fn new(reader: &'r mut RequestReader) -> Self {
        SearchTermParser {
            reader,
            charset: None,
            seen_term: false,
            depth: 0,
        }
    }

    /// Parse the criteria through the end of the line.
    pub fn parse(mut self) -> Result<SearchCommand, Error> {
        let criteria = self
            .criteria(false)?
            .ok_or_else(|| bad_syntax("No search criteria"))?;
        self.reader.end_of_line()?;

        Ok(SearchCommand {
            charset: self.charset,
            criteria,
        })
    }

    /// Parse a sequence of terms, ending before the line terminator or (if
    /// `in_group`) after the closing parenthesis.
    fn criteria(
        &mut self,
        in_group: bool,
    ) -> Result<Option<SearchTerm>, Error> {
        let mut terms = Vec::new();
        loop {
            match self.skip_spaces()? {
                b'\r' | b'\n' if in_group => {
                    return Err(bad_syntax("Unbalanced parentheses"))
                }
                b'\r' | b'\n' => break,
                b')' if in_group => {
                    self.reader.consume()?;
                    break;
                }
                b')' => return Err(bad_syntax("Unbalanced parentheses")),
                _ => {
                    if let Some(term) = self.term()? {
                        terms.push(term);
                    }
                }
            }
        }

        Ok(conjoin(terms))
    }

    fn skip_spaces(&mut self) -> Result<u8, Error> {
        loop {
            let ch = self.reader.next_char()?;
            if b' ' != ch {
                return Ok(ch);
            }
            self.reader.consume()?;
        }
    }

    /// Parse one term. An empty group yields `None`.
    fn term(&mut self) -> Result<Option<SearchTerm>, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(bad_syntax("Search criteria nested too deeply"));
        }

        self.depth += 1;
        let result = self.term_inner();
        self.depth -= 1;
        result
    }

    fn term_inner(&mut self) -> Result<Option<SearchTerm>, Error> {
        if b'(' == self.reader.next_word_char()? {
            self.reader.consume()?;
            self.seen_term = true;
            return self.criteria(true);
        }

        let key = self.key_token()?;
        let first = !self.seen_term;
        self.seen_term = true;

        if key.bytes().all(is_sequence_set_char) {
            return SequenceSet::parse(&key)
                .map(|set| Some(SearchTerm::Seqnum(set)))
                .ok_or_else(|| bad_syntax("Bad sequence set"));
        }

        let key = key.to_ascii_uppercase();
        let term = match &key[..] {
            "CHARSET" if first => {
                self.charset = Some(self.string_param()?);
                self.seen_term = false;
                return Ok(None);
            }

            "ALL" => SearchTerm::All,
            "ANSWERED" => SearchTerm::Flag(Flag::Answered, true),
            "DELETED" => SearchTerm::Flag(Flag::Deleted, true),
            "DRAFT" => SearchTerm::Flag(Flag::Draft, true),
            "FLAGGED" => SearchTerm::Flag(Flag::Flagged, true),
            "SEEN" => SearchTerm::Flag(Flag::Seen, true),
            "UNANSWERED" => SearchTerm::Flag(Flag::Answered, false),
            "UNDELETED" => SearchTerm::Flag(Flag::Deleted, false),
            "UNDRAFT" => SearchTerm::Flag(Flag::Draft, false),
            "UNFLAGGED" => SearchTerm::Flag(Flag::Flagged, false),
            "UNSEEN" => SearchTerm::Flag(Flag::Seen, false),
            "RECENT" => SearchTerm::Recent(true),
            "OLD" => SearchTerm::Recent(false),
            "NEW" => SearchTerm::And(vec![
                SearchTerm::Recent(true),
                SearchTerm::Flag(Flag::Seen, false),
            ]),

            "KEYWORD" => SearchTerm::Flag(self.keyword_param()?, true),
            "UNKEYWORD" => SearchTerm::Flag(self.keyword_param()?, false),

            "BCC" => self.header_term("Bcc")?,
            "CC" => self.header_term("Cc")?,
            "FROM" => self.header_term("From")?,
            "SUBJECT" => self.header_term("Subject")?,
            "TO" => self.header_term("To")?,
            "HEADER" => {
                let name = self.string_param()?;
                let value = self.string_param()?;
                SearchTerm::Header(name, value)
            }
            "BODY" => SearchTerm::Body(self.string_param()?),
            "TEXT" => SearchTerm::Text(self.string_param()?),

            "BEFORE" => {
                SearchTerm::InternalDate(DateCmp::Before, self.date_param()?)
            }
            "ON" => SearchTerm::InternalDate(DateCmp::On, self.date_param()?),
            "SINCE" => {
                SearchTerm::InternalDate(DateCmp::Since, self.date_param()?)
            }
            "SENTBEFORE" => {
                SearchTerm::SentDate(DateCmp::Before, self.date_param()?)
            }
            "SENTON" => SearchTerm::SentDate(DateCmp::On, self.date_param()?),
            "SENTSINCE" => {
                SearchTerm::SentDate(DateCmp::Since, self.date_param()?)
            }

            "LARGER" => {
                SearchTerm::Size(SizeCmp::Larger, self.number_param()?)
            }
            "SMALLER" => {
                SearchTerm::Size(SizeCmp::Smaller, self.number_param()?)
            }

            "UID" => {
                let raw = self.string_param()?;
                SearchTerm::Uid(
                    SequenceSet::parse(&raw)
                        .ok_or_else(|| bad_syntax("Bad UID set"))?,
                )
            }

            "NOT" => SearchTerm::Not(Box::new(self.operand()?)),
            "OR" => {
                let a = self.operand()?;
                let b = self.operand()?;
                SearchTerm::Or(Box::new(a), Box::new(b))
            }

            _ => {
                return Err(bad_syntax(format!("Unknown search key {}", key)))
            }
        };

        Ok(Some(term))
    }

    /// Parse the operand of `NOT` or `OR`. An empty group stands for `ALL`.
    fn operand(&mut self) -> Result<SearchTerm, Error> {
        Ok(self.term()?.unwrap_or(SearchTerm::All))
    }

    fn key_token(&mut self) -> Result<String, Error> {
        let raw = self
            .reader
            .take_while(|ch| !matches!(ch, b' ' | b'\r' | b'\n' | b')'))?;
        if raw.is_empty() {
            return Err(bad_syntax("Expected search key"));
        }
        String::from_utf8(raw).map_err(|_| bad_syntax("Invalid UTF-8"))
    }

    /// Read a string parameter: quoted, literal, or bare.
    fn string_param(&mut self) -> Result<String, Error> {
        match self.reader.next_word_char()? {
            b'{' => {
                let raw = self.reader.literal()?;
                String::from_utf8(raw).map_err(|_| bad_syntax("Invalid UTF-8"))
            }
            b'"' => {
                self.reader.consume()?;
                let raw = self.quoted_raw()?;
                Ok(unescape(&raw))
            }
            _ => {
                let raw = self.reader.take_while(|ch| {
                    !matches!(ch, b' ' | b'\r' | b'\n' | b')')
                })?;
                String::from_utf8(raw).map_err(|_| bad_syntax("Invalid UTF-8"))
            }
        }
    }

    /// Scan the body of a quoted parameter, after the opening quote,
    /// returning it still escaped.
    ///
    /// The closing quote is consumed. A quote preceded by an unescaped
    /// backslash does not terminate the string. If the line ends first, the
    /// line ending is left in place and everything up to it is the value.
    fn quoted_raw(&mut self) -> Result<String, Error> {
        let mut raw = Vec::new();
        let mut escaped = false;
        loop {
            let ch = self.reader.next_char()?;
            if b'\r' == ch || b'\n' == ch {
                break;
            }

            self.reader.consume()?;
            if b'"' == ch && !escaped {
                break;
            }

            escaped = b'\\' == ch && !escaped;
            raw.push(ch);
            if raw.len() > super::command_parser::MAX_ATOM {
                return Err(bad_syntax("Quoted string too long"));
            }
        }

        String::from_utf8(raw).map_err(|_| bad_syntax("Invalid UTF-8"))
    }

    fn header_term(&mut self, name: &str) -> Result<SearchTerm, Error> {
        Ok(SearchTerm::Header(name.to_owned(), self.string_param()?))
    }

    fn keyword_param(&mut self) -> Result<Flag, Error> {
        self.string_param()?.parse()
    }

    fn date_param(&mut self) -> Result<chrono::NaiveDate, Error> {
        let raw = self.string_param()?;
        parse_date(raw.as_bytes())
            .ok_or_else(|| bad_syntax(format!("Bad date: {}", raw)))
    }

    fn number_param(&mut self) -> Result<u32, Error> {
        let raw = self.string_param()?;
        raw.parse()
            .map_err(|_| bad_syntax(format!("Bad number: {}", raw)))
    }
}

/// Undo quoted-string escaping: `\\` becomes `\`, and a backslash before any
/// other character is dropped.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if '\\' == ch {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// AND together `terms`, splicing in the children of nested conjunctions.
fn conjoin(terms: Vec<SearchTerm>) -> Option<SearchTerm> {
    let mut flat = Vec::with_capacity(terms.len());
    for term in terms {
        match term {
            SearchTerm::And(children) => flat.extend(children),
            term => flat.push(term),
        }
    }

    match flat.len() {
        0 => None,
        1 => flat.pop(),
        _ => Some(SearchTerm::And(flat)),
    }
}
