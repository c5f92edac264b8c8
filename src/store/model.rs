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

use std::collections::BTreeMap;
use std::convert::{TryFrom, TryInto};
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroU32;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::str::FromStr;

use nom::{
    branch, character, combinator, multi, sequence, IResult,
};

use crate::support::error::{bad_syntax, Error};

/// Uniquely identifies a message within a single mailbox.
///
/// UIDs start at 1 and increase monotonically as messages are added to the
/// mailbox. UIDs are never reused within one UID validity epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uid({})", self.0.get())
    }
}

impl Uid {
    // Unsafe because new() isn't const for some reason
    pub const MIN: Self = unsafe { Uid(NonZeroU32::new_unchecked(1)) };
    pub const MAX: Self = unsafe { Uid(NonZeroU32::new_unchecked(u32::MAX)) };

    pub fn of(uid: u32) -> Option<Self> {
        NonZeroU32::new(uid).map(Uid)
    }

    pub fn next(self) -> Option<Self> {
        self.0.get().checked_add(1).and_then(Uid::of)
    }

    #[cfg(test)]
    pub fn u(uid: u32) -> Self {
        Uid::of(uid).unwrap()
    }
}

impl TryFrom<u32> for Uid {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Self::of(v).ok_or(())
    }
}

impl Into<u32> for Uid {
    fn into(self) -> u32 {
        self.0.get()
    }
}

/// A message sequence number.
///
/// The sequence number of a message is one plus the number of messages before
/// it which the *client* still believes to exist. Since each session learns of
/// expunges at a different time, the same message can have different sequence
/// numbers in different sessions, and the mailbox's own "canonical" numbering
/// can differ from all of them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seqnum(pub NonZeroU32);

impl Seqnum {
    // Unsafe because new() isn't const for some reason
    pub const MIN: Self = unsafe { Seqnum(NonZeroU32::new_unchecked(1)) };

    pub fn of(seqnum: u32) -> Option<Self> {
        NonZeroU32::new(seqnum).map(Seqnum)
    }

    #[cfg(test)]
    pub fn u(seqnum: u32) -> Self {
        Seqnum::of(seqnum).unwrap()
    }

    pub fn to_index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// Return the sequence number of the message at index `ix`.
    ///
    /// ## Panics
    ///
    /// Panics if `ix + 1` does not fit in a `u32`.
    pub fn from_index(ix: usize) -> Self {
        let raw: u32 = (ix + 1).try_into().expect("Seqnum overflow");
        Seqnum(NonZeroU32::new(raw).expect("ix + 1 is zero?"))
    }
}

impl TryFrom<u32> for Seqnum {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Self::of(v).ok_or(())
    }
}

impl Into<u32> for Seqnum {
    fn into(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for Seqnum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Seqnum({})", self.0.get())
    }
}

/// A "sequence set range" of sequence numbers or UIDs.
///
/// Internally, this is maintained as a minimal sorted set of inclusive ranges.
/// It does not maintain information on the original fragmentation, ordering,
/// or duplication.
///
/// The `Display` format puts this into minimal IMAP wire format.
#[derive(Clone, PartialEq, Eq)]
pub struct SeqRange<T> {
    parts: BTreeMap<u32, u32>,
    _t: PhantomData<T>,
}

impl<T> SeqRange<T> {
    /// Create a new, empty range.
    pub fn new() -> Self {
        SeqRange {
            parts: BTreeMap::new(),
            _t: PhantomData,
        }
    }

    /// Return whether this range is empty (invalid for IMAP wire format).
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl<T: TryFrom<u32> + Into<u32> + PartialOrd> SeqRange<T> {
    /// Create a range containing just the given item.
    pub fn just(item: T) -> Self {
        let item: u32 = item.into();
        let mut this = SeqRange::new();
        this.insert(item, item);
        this
    }

    /// Insert the given inclusive range into this sequence set.
    pub fn insert(&mut self, start_incl: u32, mut end_incl: u32) {
        // If this range overlaps any later ranges, fuse them.
        loop {
            let following = self
                .parts
                .range((Excluded(start_incl), Unbounded))
                .next()
                .map(|(&start, &end)| (start, end));

            if let Some((following_start, following_end)) = following {
                if following_start - 1 <= end_incl {
                    end_incl = end_incl.max(following_end);
                    self.parts.remove(&following_start);
                    continue;
                }
            }

            break;
        }

        let preceding = self
            .parts
            .range((Unbounded, Included(end_incl)))
            .next_back()
            .map(|(&start, &end)| (start, end));
        if let Some((preceding_start, preceding_end)) = preceding {
            if preceding_end.saturating_add(1) >= start_incl {
                if start_incl < preceding_start {
                    self.parts.remove(&preceding_start);
                    self.parts.insert(start_incl, end_incl.max(preceding_end));
                } else {
                    self.parts
                        .insert(preceding_start, end_incl.max(preceding_end));
                }
                return;
            }
        }

        self.parts.insert(start_incl, end_incl);
    }

    /// Return whether the given item is present in this set.
    pub fn contains(&self, v: T) -> bool {
        let v: u32 = v.into();
        self.parts
            .range(..=v)
            .next_back()
            .filter(|&(_, &end)| end >= v)
            .is_some()
    }

    /// Return an iterator to the items in this set.
    ///
    /// Items greater than `max` are silently excluded. Items are delivered in
    /// strictly ascending order.
    pub fn items<'a>(
        &'a self,
        max: impl Into<u32>,
    ) -> impl Iterator<Item = T> + 'a {
        let max: u32 = max.into();
        self.parts
            .iter()
            .map(|(&start, &end)| (start, end))
            .filter(move |&(start, _)| start <= max)
            .flat_map(move |(start, end)| start..=end.min(max))
            .filter_map(|v| T::try_from(v).ok())
    }

    /// Return the maximum value in this sequence set, raw.
    pub fn max(&self) -> Option<u32> {
        self.parts.values().rev().copied().next()
    }
}

impl<T> fmt::Display for SeqRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (ix, (&start, &end)) in self.parts.iter().enumerate() {
            let delim = if 0 == ix { "" } else { "," };

            if start == end {
                write!(f, "{}{}", delim, start)?;
            } else {
                write!(f, "{}{}:{}", delim, start, end)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for SeqRange<Seqnum> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Seqnum {}]", self)
    }
}

impl fmt::Debug for SeqRange<Uid> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[Uid {}]", self)
    }
}

impl<T> Default for SeqRange<T> {
    fn default() -> Self {
        SeqRange::new()
    }
}

/// One endpoint of a sequence set element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqBound {
    Num(u32),
    /// `*`, the largest number currently in use.
    Star,
}

impl SeqBound {
    fn resolve(self, max: u32) -> u32 {
        match self {
            SeqBound::Num(n) => n,
            SeqBound::Star => max,
        }
    }
}

/// A sequence set exactly as the client sent it.
///
/// Unlike `SeqRange`, this retains `*` unresolved, since what `*` means
/// depends on the mailbox state at the time the set is applied, not when it
/// was parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceSet(Vec<(SeqBound, SeqBound)>);

impl SequenceSet {
    pub fn parse(raw: &str) -> Option<Self> {
        combinator::all_consuming(multi::separated_nonempty_list(
            character::complete::char(','),
            seq_range,
        ))(raw)
        .ok()
        .map(|(_, parts)| SequenceSet(parts))
    }

    /// Resolve this set against a mailbox whose largest number is `max`.
    pub fn resolve<T: TryFrom<u32> + Into<u32> + PartialOrd>(
        &self,
        max: u32,
    ) -> SeqRange<T> {
        let mut range = SeqRange::new();
        for &(start, end) in &self.0 {
            let start = start.resolve(max);
            let end = end.resolve(max);
            range.insert(start.min(end), start.max(end));
        }
        range
    }

    /// Return whether `v` is in this set, given `max` as the value of `*`.
    pub fn contains(&self, v: u32, max: u32) -> bool {
        self.0.iter().any(|&(start, end)| {
            let start = start.resolve(max);
            let end = end.resolve(max);
            v >= start.min(end) && v <= start.max(end)
        })
    }

    /// Return the largest number written literally in the set, ignoring `*`.
    pub fn max_explicit(&self) -> Option<u32> {
        self.0
            .iter()
            .flat_map(|&(a, b)| vec![a, b])
            .filter_map(|bound| match bound {
                SeqBound::Num(n) => Some(n),
                SeqBound::Star => None,
            })
            .max()
    }
}

fn seq_number(i: &str) -> IResult<&str, SeqBound> {
    branch::alt((
        combinator::map(character::complete::char('*'), |_| SeqBound::Star),
        combinator::map_opt(character::complete::digit1, |s: &str| {
            s.parse::<u32>().ok().filter(|&n| n > 0).map(SeqBound::Num)
        }),
    ))(i)
}

fn seq_range(i: &str) -> IResult<&str, (SeqBound, SeqBound)> {
    combinator::map(
        sequence::pair(
            seq_number,
            combinator::opt(sequence::preceded(
                character::complete::char(':'),
                seq_number,
            )),
        ),
        |(start, end)| (start, end.unwrap_or(start)),
    )(i)
}

/// A message flag.
///
/// System flags are represented as top-level enum values. Keywords are in the
/// `Keyword` case.
///
/// The `Display` format of this type is the exact string value that would be
/// sent over the wire. `FromStr` does the reverse conversion, and also
/// understands non-standard casing of the system flags.
///
/// `\Recent` is not represented by this enum since it isn't _really_ a flag;
/// it lives on `StoredMessage` directly.
#[derive(Clone)]
pub enum Flag {
    Answered,
    Deleted,
    Draft,
    Flagged,
    Seen,
    Keyword(String),
}

impl Flag {
    /// The flags every mailbox permits clients to set.
    pub fn system_flags() -> Vec<Flag> {
        vec![
            Flag::Answered,
            Flag::Deleted,
            Flag::Draft,
            Flag::Flagged,
            Flag::Seen,
        ]
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Keyword(ref kw) => write!(f, "{}", kw),
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Flag as fmt::Display>::fmt(self, f)
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.eq_ignore_ascii_case("\\answered") {
            Ok(Flag::Answered)
        } else if s.eq_ignore_ascii_case("\\deleted") {
            Ok(Flag::Deleted)
        } else if s.eq_ignore_ascii_case("\\draft") {
            Ok(Flag::Draft)
        } else if s.eq_ignore_ascii_case("\\flagged") {
            Ok(Flag::Flagged)
        } else if s.eq_ignore_ascii_case("\\seen") {
            Ok(Flag::Seen)
        } else if s.starts_with('\\') {
            Err(bad_syntax(format!("Unknown system flag {}", s)))
        } else if !s.is_empty() && s.bytes().all(is_atom_char) {
            Ok(Flag::Keyword(s.to_owned()))
        } else {
            Err(bad_syntax("Illegal keyword"))
        }
    }
}

fn is_atom_char(ch: u8) -> bool {
    match ch {
        0..=b' ' => false,
        127..=255 => false,
        b'(' | b')' | b'{' | b'*' | b'%' | b'\\' | b'"' | b']' => false,
        _ => true,
    }
}

impl PartialEq for Flag {
    fn eq(&self, other: &Flag) -> bool {
        match (self, other) {
            (&Flag::Answered, &Flag::Answered) => true,
            (&Flag::Deleted, &Flag::Deleted) => true,
            (&Flag::Draft, &Flag::Draft) => true,
            (&Flag::Flagged, &Flag::Flagged) => true,
            (&Flag::Seen, &Flag::Seen) => true,
            // Keywords are matched ASCII case-insensitively, as most clients
            // expect.
            (&Flag::Keyword(ref a), &Flag::Keyword(ref b)) => {
                a.eq_ignore_ascii_case(b)
            }
            _ => false,
        }
    }
}

impl Eq for Flag {}

/// Attributes reported for mailboxes in `LIST` responses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MailboxAttribute {
    Noselect,
    HasChildren,
    HasNoChildren,
}

impl MailboxAttribute {
    pub fn name(&self) -> &'static str {
        match *self {
            MailboxAttribute::Noselect => "\\Noselect",
            MailboxAttribute::HasChildren => "\\HasChildren",
            MailboxAttribute::HasNoChildren => "\\HasNoChildren",
        }
    }
}

impl fmt::Display for MailboxAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for MailboxAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <MailboxAttribute as fmt::Display>::fmt(self, f)
    }
}

/// How `STORE` combines the given flags with the existing ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreMode {
    Replace,
    Add,
    Remove,
}

/// The counts a session needs to answer `SELECT`/`EXAMINE`, all taken at the
/// same instant the session's view was attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectResponse {
    pub exists: usize,
    pub recent: usize,
    /// The corrected sequence number of the first unseen message, if any.
    pub unseen: Option<Seqnum>,
    pub uidvalidity: u32,
    pub uidnext: Uid,
    pub flags: Vec<Flag>,
    pub permanent_flags: Vec<Flag>,
    pub read_only: bool,
}

/// The fields `STATUS` can report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub messages: usize,
    pub recent: usize,
    pub uidnext: u32,
    pub uidvalidity: u32,
    pub unseen: usize,
}
