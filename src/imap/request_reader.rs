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

//! Lexing of the raw request stream.
//!
//! `RequestReader` holds at most one byte of look-ahead over a blocking byte
//! stream. Everything above it (argument parsing, the SEARCH grammar, command
//! dispatch) is written in terms of its handful of primitives, so the
//! look-ahead rules only need to be gotten right once.

use std::io::{self, BufRead, Read, Write};
use std::str;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::support::error::{bad_syntax, Error};

/// How much of the end of a discarded line is kept to look for a literal.
const MAX_LITERAL_ANNOUNCEMENT: usize = 32;

lazy_static! {
    static ref LITERAL_AT_EOL: Regex =
        Regex::new(r"\{([0-9]+)\+\}\r?\n$").unwrap();
}

/// The write half of a connection, shared between the command loop, the
/// continuation prompt, and anything that needs to send unsolicited
/// responses from another thread.
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// The default limit on the size of a single literal.
pub const DEFAULT_MAX_LITERAL: usize = 64 * 1024 * 1024;

pub struct RequestReader {
    input: Box<dyn BufRead + Send>,
    output: SharedWriter,
    lookahead: Option<u8>,
    /// Whether the last byte consumed was a LF (or nothing has been consumed
    /// yet).
    line_start: bool,
    max_literal: usize,
}

impl RequestReader {
    pub fn new(input: Box<dyn BufRead + Send>, output: SharedWriter) -> Self {
        RequestReader {
            input,
            output,
            lookahead: None,
            line_start: true,
            max_literal: DEFAULT_MAX_LITERAL,
        }
    }

    pub fn set_max_literal(&mut self, max_literal: usize) {
        self.max_literal = max_literal;
    }

    pub fn max_literal(&self) -> usize {
        self.max_literal
    }

    /// Return whether the stream is positioned at the very start of a line,
    /// with nothing buffered.
    ///
    /// After a syntax error, this tells the caller whether the rest of the
    /// offending line still needs to be discarded.
    pub fn at_line_start(&self) -> bool {
        self.line_start && self.lookahead.is_none()
    }

    /// Return the current look-ahead byte without consuming it.
    ///
    /// If no byte is buffered, one is read from the stream. Fails with
    /// `UnexpectedEof` if the stream has ended.
    pub fn next_char(&mut self) -> Result<u8, Error> {
        if let Some(ch) = self.lookahead {
            return Ok(ch);
        }

        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Err(Error::UnexpectedEof),
                Ok(_) => break,
                Err(e) if io::ErrorKind::Interrupted == e.kind() => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }

        self.lookahead = Some(buf[0]);
        Ok(buf[0])
    }

    /// Skip spaces and return the first non-space byte, without consuming it.
    ///
    /// It is an error for that byte to be a line ending, since callers use
    /// this to find the start of a required argument.
    pub fn next_word_char(&mut self) -> Result<u8, Error> {
        let mut ch = self.next_char()?;
        while b' ' == ch {
            self.consume()?;
            ch = self.next_char()?;
        }

        if b'\r' == ch || b'\n' == ch {
            return Err(bad_syntax("Missing argument"));
        }

        Ok(ch)
    }

    /// Consume and return the current look-ahead byte.
    pub fn consume(&mut self) -> Result<u8, Error> {
        let ch = self.next_char()?;
        self.lookahead = None;
        self.line_start = b'\n' == ch;
        Ok(ch)
    }

    /// Consume the end of the current line.
    ///
    /// Trailing spaces and a CR are permitted before the LF. Anything else is
    /// a syntax error, in which case the offending byte is left unconsumed.
    pub fn end_of_line(&mut self) -> Result<(), Error> {
        let mut ch = self.next_char()?;
        while b' ' == ch {
            self.consume()?;
            ch = self.next_char()?;
        }

        if b'\r' == ch {
            self.consume()?;
            ch = self.next_char()?;
        }

        if b'\n' != ch {
            return Err(bad_syntax("Expected end of line"));
        }

        self.consume()?;
        Ok(())
    }

    /// Read exactly `n` raw bytes, as for the payload of a literal.
    ///
    /// The look-ahead byte is discarded first. It can only legitimately be
    /// the LF that ended the literal announcement, since anything else would
    /// belong to the payload and throw the byte count off.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        if let Some(ch) = self.lookahead.take() {
            if b'\n' != ch {
                return Err(bad_syntax("Unexpected data before literal"));
            }
        }

        self.line_start = false;
        let mut data = Vec::with_capacity(n.min(65536));
        let nread = self.input.by_ref().take(n as u64).read_to_end(&mut data)?;
        if nread != n {
            return Err(Error::UnexpectedEof);
        }

        Ok(data)
    }

    /// Discard exactly `n` raw bytes, for a literal we refused but which the
    /// client sends anyway.
    pub fn skip_exact(&mut self, n: usize) -> Result<(), Error> {
        self.lookahead = None;
        self.line_start = false;
        let nread =
            io::copy(&mut self.input.by_ref().take(n as u64), &mut io::sink())?;
        if nread != n as u64 {
            return Err(Error::UnexpectedEof);
        }
        Ok(())
    }

    /// Prompt the client to send the literal it announced.
    pub fn continuation_prompt(&mut self) -> Result<(), Error> {
        let mut w = self.output.lock().unwrap();
        w.write_all(b"+ \r\n")?;
        w.flush()?;
        Ok(())
    }

    /// Discard everything up to and including the next LF.
    ///
    /// If the discarded line ended with a non-synchronising literal
    /// announcement, returns the announced length. The client sends that
    /// payload without waiting, so the caller must skip it too.
    pub fn consume_line(&mut self) -> Result<Option<usize>, Error> {
        let mut tail = Vec::new();
        loop {
            let ch = self.consume()?;
            if tail.len() >= MAX_LITERAL_ANNOUNCEMENT {
                tail.remove(0);
            }
            tail.push(ch);

            if b'\n' == ch {
                return Ok(LITERAL_AT_EOL.captures(&tail).and_then(|c| {
                    str::from_utf8(&c[1]).ok()?.parse::<usize>().ok()
                }));
            }
        }
    }
}
