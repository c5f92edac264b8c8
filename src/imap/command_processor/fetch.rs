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

use std::borrow::Cow;

use super::defs::*;
use super::mailboxes::saturate;
use crate::imap::request_reader::RequestReader;
use crate::store::model::*;
use crate::support::error::{bad_syntax, Error};

/// One data item a `FETCH` can ask for, after macros have been expanded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FetchItem {
    Flags,
    Uid,
    Rfc822Size,
    InternalDate,
    /// A body section. Unless `peek`, fetching it implicitly sets `\Seen`.
    Body { section: s::BodySection, peek: bool },
}

impl CommandProcessor {
    pub(super) fn handle_fetch(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let ids = r.sequence_set()?;
        let items = parse_fetch_items(r)?;
        r.end_of_line()?;
        Ok(self.cmd_fetch(&ids, items, false, sender))
    }

    pub(super) fn handle_uid_fetch(
        &mut self,
        r: &mut RequestReader,
        sender: SendResponse<'_>,
    ) -> Result<CmdResult, Error> {
        let ids = r.sequence_set()?;
        let items = parse_fetch_items(r)?;
        r.end_of_line()?;
        Ok(self.cmd_fetch(&ids, items, true, sender))
    }

    pub(super) fn cmd_fetch(
        &mut self,
        ids: &SequenceSet,
        mut items: Vec<FetchItem>,
        uid: bool,
        sender: SendResponse<'_>,
    ) -> CmdResult {
        // RFC 3501 6.4.8: UID FETCH always includes the UID
        if uid && !items.contains(&FetchItem::Uid) {
            items.push(FetchItem::Uid);
        }

        let selected = selected!(self)?;
        let mut messages = selected.messages(ids, uid).map_err(map_error! {
            self,
            SeqnumOutOfRange => (Bad, None),
        })?;

        let sets_seen = items.iter().any(|item| match *item {
            FetchItem::Body { peek, .. } => !peek,
            _ => false,
        });
        if sets_seen && !selected.read_only() {
            let uids: Vec<Uid> =
                messages.iter().map(|m| m.message.uid).collect();
            selected.mark_seen(&uids);
            for m in &mut messages {
                if !m.message.has_flag(&Flag::Seen) {
                    m.message.flags.push(Flag::Seen);
                }
            }
        }

        for m in &messages {
            let message = &m.message;
            let atts = items
                .iter()
                .map(|item| match *item {
                    FetchItem::Flags => {
                        s::MsgAtt::Flags(message.flags.clone(), message.recent)
                    }
                    FetchItem::Uid => s::MsgAtt::Uid(message.uid.0.get()),
                    FetchItem::Rfc822Size => {
                        s::MsgAtt::Rfc822Size(saturate(message.size()))
                    }
                    FetchItem::InternalDate => {
                        s::MsgAtt::InternalDate(message.internal_date)
                    }
                    FetchItem::Body { section, .. } => {
                        let data = match section {
                            s::BodySection::Rfc822 | s::BodySection::Full => {
                                message.raw()
                            }
                            s::BodySection::Rfc822Header
                            | s::BodySection::Header => message.header_block(),
                            s::BodySection::Rfc822Text
                            | s::BodySection::Text => message.body(),
                        };
                        s::MsgAtt::Body(section, Cow::Borrowed(data))
                    }
                })
                .collect();

            sender(s::Response::Fetch(s::FetchResponse {
                seqnum: m.seqnum,
                atts,
            }));
        }

        success()
    }
}

/// Parse the fetch attribute argument: a single item, a macro, or a
/// parenthesised list of items.
pub(super) fn parse_fetch_items(
    r: &mut RequestReader,
) -> Result<Vec<FetchItem>, Error> {
    let mut items = Vec::new();
    if b'(' != r.next_word_char()? {
        parse_fetch_item(r, &mut items, true)?;
        return Ok(items);
    }
    r.consume()?;

    loop {
        if b')' == r.next_word_char()? {
            r.consume()?;
            break;
        }

        parse_fetch_item(r, &mut items, false)?;
    }

    if items.is_empty() {
        return Err(bad_syntax("Empty fetch attribute list"));
    }

    Ok(items)
}

fn parse_fetch_item(
    r: &mut RequestReader,
    items: &mut Vec<FetchItem>,
    allow_macro: bool,
) -> Result<(), Error> {
    let mut add = |item: FetchItem| {
        if !items.contains(&item) {
            items.push(item);
        }
    };

    let name = r.atom()?.to_ascii_uppercase();
    let (section_prefix, peek) = if name.starts_with("BODY.PEEK[") {
        (Some(&name["BODY.PEEK[".len()..]), true)
    } else if name.starts_with("BODY[") {
        (Some(&name["BODY[".len()..]), false)
    } else {
        (None, false)
    };

    if let Some(section) = section_prefix {
        if b']' != r.consume()? {
            return Err(bad_syntax("Expected ']'"));
        }
        if b'<' == r.next_char()? {
            return Err(bad_syntax("Partial fetch is not supported"));
        }

        let section = match section {
            "" => s::BodySection::Full,
            "HEADER" => s::BodySection::Header,
            "TEXT" => s::BodySection::Text,
            _ => {
                return Err(bad_syntax(format!(
                    "Unsupported body section [{}]",
                    section
                )))
            }
        };
        add(FetchItem::Body { section, peek });
        return Ok(());
    }

    match name.as_str() {
        "ALL" | "FAST" if allow_macro => {
            add(FetchItem::Flags);
            add(FetchItem::InternalDate);
            add(FetchItem::Rfc822Size);
        }
        "FLAGS" => add(FetchItem::Flags),
        "UID" => add(FetchItem::Uid),
        "RFC822.SIZE" => add(FetchItem::Rfc822Size),
        "INTERNALDATE" => add(FetchItem::InternalDate),
        "RFC822" => add(FetchItem::Body {
            section: s::BodySection::Rfc822,
            peek: false,
        }),
        "RFC822.HEADER" => add(FetchItem::Body {
            section: s::BodySection::Rfc822Header,
            peek: true,
        }),
        "RFC822.TEXT" => add(FetchItem::Body {
            section: s::BodySection::Rfc822Text,
            peek: false,
        }),
        _ => {
            return Err(bad_syntax(format!(
                "Unsupported fetch attribute {}",
                name
            )))
        }
    }

    Ok(())
}
