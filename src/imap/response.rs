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

//! The model of everything the server sends, and its wire encoding.
//!
//! Command handlers build `Response` values; the server loop wraps them in a
//! `ResponseLine` (adding the tag, or `*` for untagged responses) and writes
//! them through a `LexWriter`. `write_to` never writes the terminating CRLF.

use std::borrow::Cow;
use std::io::{self, Write};

use chrono::prelude::*;

use super::lex::LexWriter;
use crate::store::model::{Flag, MailboxAttribute};
use crate::support::mailbox_paths::DELIMITER;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseLine<'a> {
    pub tag: Option<Cow<'a, str>>,
    pub response: Response<'a>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response<'a> {
    Cond(CondResponse<'a>),
    Capability(Vec<Cow<'a, str>>),
    List(MailboxList<'a>),
    Flags(Vec<Flag>),
    Exists(u32),
    Recent(u32),
    Expunge(u32),
    Fetch(FetchResponse<'a>),
    Search(Vec<u32>),
    Status(StatusResponse<'a>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RespCondType {
    Ok,
    No,
    Bad,
    Bye,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CondResponse<'a> {
    pub cond: RespCondType,
    pub code: Option<RespTextCode<'a>>,
    pub quip: Option<Cow<'a, str>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RespTextCode<'a> {
    Alert,
    BadCharset,
    Capability(Vec<Cow<'a, str>>),
    Parse,
    PermanentFlags(Vec<Flag>),
    ReadOnly,
    ReadWrite,
    TryCreate,
    UidNext(u32),
    UidValidity(u32),
    Unseen(u32),
    /// RFC 4315 `APPENDUID uidvalidity uid`
    AppendUid(u32, u32),
    /// RFC 4315 `COPYUID uidvalidity source-uids dest-uids`. The UID sets
    /// are in their wire form.
    CopyUid(u32, String, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailboxList<'a> {
    pub attributes: Vec<MailboxAttribute>,
    pub name: Cow<'a, str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusResponse<'a> {
    pub mailbox: Cow<'a, str>,
    pub atts: Vec<StatusAtt>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusAtt {
    Messages(u32),
    Recent(u32),
    UidNext(u32),
    UidValidity(u32),
    Unseen(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse<'a> {
    pub seqnum: u32,
    pub atts: Vec<MsgAtt<'a>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodySection {
    /// `RFC822`
    Rfc822,
    /// `RFC822.HEADER`
    Rfc822Header,
    /// `RFC822.TEXT`
    Rfc822Text,
    /// `BODY[]`
    Full,
    /// `BODY[HEADER]`
    Header,
    /// `BODY[TEXT]`
    Text,
}

impl BodySection {
    /// The name of the section as it appears in a `FETCH` response.
    pub fn name(self) -> &'static str {
        match self {
            BodySection::Rfc822 => "RFC822",
            BodySection::Rfc822Header => "RFC822.HEADER",
            BodySection::Rfc822Text => "RFC822.TEXT",
            BodySection::Full => "BODY[]",
            BodySection::Header => "BODY[HEADER]",
            BodySection::Text => "BODY[TEXT]",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MsgAtt<'a> {
    /// The flags, plus whether `\Recent` should be reported.
    Flags(Vec<Flag>, bool),
    Uid(u32),
    Rfc822Size(u32),
    InternalDate(DateTime<FixedOffset>),
    Body(BodySection, Cow<'a, [u8]>),
}

impl ResponseLine<'_> {
    pub fn write_to(&self, lex: &mut LexWriter<impl Write>) -> io::Result<()> {
        match self.tag {
            Some(ref tag) => lex.verbatim(tag)?,
            None => lex.verbatim("*")?,
        }
        lex.verbatim(" ")?;
        self.response.write_to(lex)
    }
}

impl Response<'_> {
    pub fn write_to(&self, lex: &mut LexWriter<impl Write>) -> io::Result<()> {
        match *self {
            Response::Cond(ref cr) => cr.write_to(lex),
            Response::Capability(ref caps) => {
                lex.verbatim("CAPABILITY")?;
                for cap in caps {
                    lex.verbatim(" ")?;
                    lex.verbatim(cap)?;
                }
                Ok(())
            }
            Response::List(ref list) => list.write_to(lex),
            Response::Flags(ref flags) => {
                lex.verbatim("FLAGS ")?;
                write_flags(lex, flags, false)
            }
            Response::Exists(n) => {
                lex.num_u32(n)?;
                lex.verbatim(" EXISTS")
            }
            Response::Recent(n) => {
                lex.num_u32(n)?;
                lex.verbatim(" RECENT")
            }
            Response::Expunge(n) => {
                lex.num_u32(n)?;
                lex.verbatim(" EXPUNGE")
            }
            Response::Fetch(ref fr) => fr.write_to(lex),
            Response::Search(ref hits) => {
                lex.verbatim("SEARCH")?;
                for &hit in hits {
                    lex.verbatim(" ")?;
                    lex.num_u32(hit)?;
                }
                Ok(())
            }
            Response::Status(ref sr) => sr.write_to(lex),
        }
    }
}

impl RespCondType {
    fn name(self) -> &'static str {
        match self {
            RespCondType::Ok => "OK",
            RespCondType::No => "NO",
            RespCondType::Bad => "BAD",
            RespCondType::Bye => "BYE",
        }
    }
}

impl CondResponse<'_> {
    fn write_to(&self, lex: &mut LexWriter<impl Write>) -> io::Result<()> {
        lex.verbatim(self.cond.name())?;
        if let Some(ref code) = self.code {
            lex.verbatim(" [")?;
            code.write_to(lex)?;
            lex.verbatim("]")?;
        }
        if let Some(ref quip) = self.quip {
            lex.verbatim(" ")?;
            // resp-text may not contain line breaks
            lex.verbatim(
                &quip
                    .replace("\r\n", " ")
                    .replace(|c| '\r' == c || '\n' == c, " "),
            )?;
        }
        Ok(())
    }
}

impl RespTextCode<'_> {
    fn write_to(&self, lex: &mut LexWriter<impl Write>) -> io::Result<()> {
        match *self {
            RespTextCode::Alert => lex.verbatim("ALERT"),
            RespTextCode::BadCharset => lex.verbatim("BADCHARSET"),
            RespTextCode::Capability(ref caps) => {
                lex.verbatim("CAPABILITY")?;
                for cap in caps {
                    lex.verbatim(" ")?;
                    lex.verbatim(cap)?;
                }
                Ok(())
            }
            RespTextCode::Parse => lex.verbatim("PARSE"),
            RespTextCode::PermanentFlags(ref flags) => {
                lex.verbatim("PERMANENTFLAGS ")?;
                write_flags(lex, flags, false)
            }
            RespTextCode::ReadOnly => lex.verbatim("READ-ONLY"),
            RespTextCode::ReadWrite => lex.verbatim("READ-WRITE"),
            RespTextCode::TryCreate => lex.verbatim("TRYCREATE"),
            RespTextCode::UidNext(n) => {
                lex.verbatim("UIDNEXT ")?;
                lex.num_u32(n)
            }
            RespTextCode::UidValidity(n) => {
                lex.verbatim("UIDVALIDITY ")?;
                lex.num_u32(n)
            }
            RespTextCode::Unseen(n) => {
                lex.verbatim("UNSEEN ")?;
                lex.num_u32(n)
            }
            RespTextCode::AppendUid(validity, uid) => {
                lex.verbatim("APPENDUID ")?;
                lex.num_u32(validity)?;
                lex.verbatim(" ")?;
                lex.num_u32(uid)
            }
            RespTextCode::CopyUid(validity, ref src, ref dst) => {
                lex.verbatim("COPYUID ")?;
                lex.num_u32(validity)?;
                lex.verbatim(" ")?;
                lex.verbatim(src)?;
                lex.verbatim(" ")?;
                lex.verbatim(dst)
            }
        }
    }
}

impl MailboxList<'_> {
    fn write_to(&self, lex: &mut LexWriter<impl Write>) -> io::Result<()> {
        lex.verbatim("LIST (")?;
        for (ix, attr) in self.attributes.iter().enumerate() {
            if ix > 0 {
                lex.verbatim(" ")?;
            }
            lex.verbatim(attr.name())?;
        }
        lex.verbatim(") ")?;
        lex.string(&DELIMITER.to_string())?;
        lex.verbatim(" ")?;
        lex.mailbox(&self.name)
    }
}

impl StatusResponse<'_> {
    fn write_to(&self, lex: &mut LexWriter<impl Write>) -> io::Result<()> {
        lex.verbatim("STATUS ")?;
        lex.mailbox(&self.mailbox)?;
        lex.verbatim(" (")?;
        for (ix, att) in self.atts.iter().enumerate() {
            if ix > 0 {
                lex.verbatim(" ")?;
            }

            let (name, value) = match *att {
                StatusAtt::Messages(n) => ("MESSAGES ", n),
                StatusAtt::Recent(n) => ("RECENT ", n),
                StatusAtt::UidNext(n) => ("UIDNEXT ", n),
                StatusAtt::UidValidity(n) => ("UIDVALIDITY ", n),
                StatusAtt::Unseen(n) => ("UNSEEN ", n),
            };
            lex.verbatim(name)?;
            lex.num_u32(value)?;
        }
        lex.verbatim(")")
    }
}

impl FetchResponse<'_> {
    fn write_to(&self, lex: &mut LexWriter<impl Write>) -> io::Result<()> {
        lex.num_u32(self.seqnum)?;
        lex.verbatim(" FETCH (")?;
        for (ix, att) in self.atts.iter().enumerate() {
            if ix > 0 {
                lex.verbatim(" ")?;
            }

            match *att {
                MsgAtt::Flags(ref flags, recent) => {
                    lex.verbatim("FLAGS ")?;
                    write_flags(lex, flags, recent)?;
                }
                MsgAtt::Uid(uid) => {
                    lex.verbatim("UID ")?;
                    lex.num_u32(uid)?;
                }
                MsgAtt::Rfc822Size(size) => {
                    lex.verbatim("RFC822.SIZE ")?;
                    lex.num_u32(size)?;
                }
                MsgAtt::InternalDate(ref date) => {
                    lex.verbatim("INTERNALDATE ")?;
                    lex.datetime(date)?;
                }
                MsgAtt::Body(section, ref data) => {
                    lex.verbatim(section.name())?;
                    lex.verbatim(" ")?;
                    lex.literal(data)?;
                }
            }
        }
        lex.verbatim(")")
    }
}

fn write_flags(
    lex: &mut LexWriter<impl Write>,
    flags: &[Flag],
    recent: bool,
) -> io::Result<()> {
    lex.verbatim("(")?;
    for (ix, flag) in flags.iter().enumerate() {
        if ix > 0 {
            lex.verbatim(" ")?;
        }
        lex.flag(flag)?;
    }
    if recent {
        if !flags.is_empty() {
            lex.verbatim(" ")?;
        }
        lex.verbatim("\\Recent")?;
    }
    lex.verbatim(")")
}
