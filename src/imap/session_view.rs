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

//! The per-session view of a selected mailbox.
//!
//! A `SessionMailboxView` listens to the shared `Mailbox` and buffers what it
//! hears until the session's next unsolicited-response cycle. Until the
//! client has been told about an expunge, it still believes the expunged
//! message exists, so every sequence number that crosses the wire has to be
//! translated between the mailbox's current ("canonical") numbering and the
//! client's.
//!
//! ## Expunge bookkeeping
//!
//! Pending expunges are kept in the form they will be reported in: a
//! non-decreasing list `E` such that sending `* e EXPUNGE` for each element in
//! order leaves the client in step with the mailbox. Writing `p_k = e_k + k`
//! for the client's own sequence number of the `k`th pending message, the two
//! numberings relate as follows.
//!
//! - Canonical `u` is client `u + |{e in E : e <= u}|`.
//! - Client `c` is expunged if `c` is some `p_k`, and is otherwise canonical
//!   `c - |{k : p_k < c}|`.
//! - The client's largest sequence number is the canonical count plus `|E|`.
//!
//! The mailbox reports each expunge relative to its numbering at that
//! instant; `record_expunge` rewrites it into the client's terms before
//! inserting it, which is what keeps `E` sorted even when expunges arrive out
//! of order.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use log::warn;

use crate::store::mailbox::{
    ListenerId, Mailbox, MailboxListener, MailboxState,
};
use crate::store::message::StoredMessage;
use crate::store::model::*;
use crate::store::search::{Candidate, SearchTerm};
use crate::support::error::Error;

/// Called with the mailbox name when the selected mailbox is deleted out from
/// under the session.
pub type Terminator = Arc<dyn Fn(&str) + Send + Sync>;

/// A flag change which has not yet been reported to the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagUpdate {
    /// The client's sequence number for the message.
    pub seqnum: u32,
    pub uid: Uid,
    pub flags: Vec<Flag>,
}

/// Everything one unsolicited-response cycle needs to send, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollResponse {
    pub exists: Option<usize>,
    pub recent: Option<usize>,
    pub flag_updates: Vec<FlagUpdate>,
    pub expunged: Vec<u32>,
}

/// A message picked out by a sequence set, with the client's number for it.
#[derive(Clone, Debug)]
pub struct SelectedMessage {
    pub seqnum: u32,
    pub message: StoredMessage,
}

#[derive(Default)]
struct ViewBuffers {
    expunged: Vec<u32>,
    flag_updates: BTreeMap<u32, (Uid, Vec<Flag>)>,
    size_changed: bool,
}

struct ViewListener {
    mailbox_name: String,
    buffers: Mutex<ViewBuffers>,
    terminator: Option<Terminator>,
}

impl MailboxListener for ViewListener {
    fn on_appended(&self) {
        self.buffers.lock().unwrap().size_changed = true;
    }

    fn on_expunged(&self, seqnum: Seqnum) {
        let mut buffers = self.buffers.lock().unwrap();
        record_expunge(&mut buffers.expunged, seqnum.0.get());
    }

    fn on_flags_changed(&self, seqnum: Seqnum, uid: Uid, flags: &[Flag]) {
        let mut buffers = self.buffers.lock().unwrap();
        let client = to_client(&buffers.expunged, seqnum.0.get());
        buffers.flag_updates.insert(client, (uid, flags.to_vec()));
    }

    fn on_mailbox_deleted(&self) {
        warn!("Selected mailbox {} was deleted", self.mailbox_name);
        if let Some(ref terminator) = self.terminator {
            terminator(&self.mailbox_name);
        }
    }
}

/// Insert an expunge of canonical `seqnum` into the pending list `expunged`.
fn record_expunge(expunged: &mut Vec<u32>, seqnum: u32) {
    // Find the client's number for the message and its place in the list.
    let mut client = seqnum;
    let mut ix = 0;
    for (k, &e) in expunged.iter().enumerate() {
        if e + k as u32 > client {
            break;
        }
        client += 1;
        ix += 1;
    }

    for e in &mut expunged[ix..] {
        *e -= 1;
    }
    expunged.insert(ix, client - ix as u32);
}

/// Map canonical sequence number `seqnum` to the client's numbering.
fn to_client(expunged: &[u32], seqnum: u32) -> u32 {
    seqnum + expunged.iter().take_while(|&&e| e <= seqnum).count() as u32
}

/// Map the client's sequence number `client` to the canonical numbering, or
/// `None` if it refers to a message whose expunge is still pending.
fn to_canonical(expunged: &[u32], client: u32) -> Option<u32> {
    let mut before = 0;
    for (k, &e) in expunged.iter().enumerate() {
        let position = e + k as u32;
        if position == client {
            return None;
        } else if position > client {
            break;
        }
        before += 1;
    }

    Some(client - before)
}

/// Correct the mailbox's first-unseen position `raw` for the expunges in
/// `expunged` which the client has not yet been told about.
pub fn corrected_first_unseen(raw: Seqnum, expunged: &[u32]) -> Seqnum {
    Seqnum::of(to_client(expunged, raw.0.get())).unwrap_or(raw)
}

/// The client's numbering as of one instant, for use with the mailbox lock
/// held.
struct Numbering {
    expunged: Vec<u32>,
    canonical_count: u32,
}

impl Numbering {
    fn max_client(&self) -> u32 {
        self.canonical_count + self.expunged.len() as u32
    }

    fn to_client(&self, ix: usize) -> u32 {
        to_client(&self.expunged, Seqnum::from_index(ix).0.get())
    }

    fn to_index(&self, client: u32) -> Option<usize> {
        to_canonical(&self.expunged, client)
            .and_then(Seqnum::of)
            .map(Seqnum::to_index)
    }
}

pub struct SessionMailboxView {
    mailbox: Arc<Mailbox>,
    listener: Arc<ViewListener>,
    listener_id: ListenerId,
    read_only: bool,
}

impl SessionMailboxView {
    /// Start watching `mailbox`.
    ///
    /// The counts in the returned `SelectResponse` are taken under the same
    /// lock as the listener registration, so the view's buffers start
    /// exactly where the response leaves off. Unless `read_only`, `\Recent`
    /// is cleared from every message in the mailbox.
    pub fn attach(
        mailbox: Arc<Mailbox>,
        read_only: bool,
        terminator: Option<Terminator>,
    ) -> Result<(Self, SelectResponse), Error> {
        let listener = Arc::new(ViewListener {
            mailbox_name: mailbox.name().to_owned(),
            buffers: Mutex::new(ViewBuffers::default()),
            terminator,
        });

        let (listener_id, response) = {
            let mut state = mailbox.lock();
            if state.is_deleted() {
                return Err(Error::NxMailbox);
            }
            if !state.is_selectable() {
                return Err(Error::MailboxUnselectable);
            }

            let weak: Weak<ViewListener> = Arc::downgrade(&listener);
            let weak: Weak<dyn MailboxListener> = weak;
            let listener_id = state.subscribe(weak);

            let mut flags = Flag::system_flags();
            for message in state.messages() {
                for flag in &message.flags {
                    if !flags.contains(flag) {
                        flags.push(flag.clone());
                    }
                }
            }

            let response = SelectResponse {
                exists: state.message_count(),
                recent: state.recent_count(!read_only),
                unseen: state
                    .first_unseen()
                    .map(|raw| corrected_first_unseen(raw, &[])),
                uidvalidity: state.uid_validity(),
                uidnext: state.uid_next(),
                flags,
                permanent_flags: Flag::system_flags(),
                read_only,
            };
            (listener_id, response)
        };

        Ok((
            SessionMailboxView {
                mailbox,
                listener,
                listener_id,
                read_only,
            },
            response,
        ))
    }

    /// Stop watching the mailbox, discarding anything still buffered.
    pub fn deselect(self) {
        // Unregistration happens in `Drop`
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn listener_id(&self) -> ListenerId {
        self.listener_id
    }

    pub fn mailbox_name(&self) -> &str {
        self.mailbox.name()
    }

    pub fn uid_validity(&self) -> u32 {
        self.mailbox.lock().uid_validity()
    }

    /// Return the pending expunges in reporting order, clearing them.
    ///
    /// # Panics
    ///
    /// Panics if flag updates or a size change are still pending. Those
    /// refer to the client's current numbering, which reporting the
    /// expunges would change.
    pub fn drain_expunged(&self) -> Vec<u32> {
        drain_expunged(&mut self.listener.buffers.lock().unwrap())
    }

    /// Return the pending flag updates, one per message, clearing them.
    pub fn drain_flag_updates(&self) -> Vec<FlagUpdate> {
        drain_flag_updates(&mut self.listener.buffers.lock().unwrap())
    }

    /// Return whether the mailbox has grown since last asked, clearing the
    /// indication.
    pub fn take_size_changed(&self) -> bool {
        let mut buffers = self.listener.buffers.lock().unwrap();
        std::mem::replace(&mut buffers.size_changed, false)
    }

    /// Run one unsolicited-response cycle.
    ///
    /// Expunges are left buffered unless `allow_expunge`.
    pub fn poll(&self, allow_expunge: bool) -> PollResponse {
        let mut state = self.mailbox.lock();
        let mut buffers = self.listener.buffers.lock().unwrap();
        let mut response = PollResponse::default();

        if std::mem::replace(&mut buffers.size_changed, false) {
            response.exists =
                Some(state.message_count() + buffers.expunged.len());
            response.recent = Some(state.recent_count(!self.read_only));
        }

        response.flag_updates = drain_flag_updates(&mut buffers);
        if allow_expunge {
            response.expunged = drain_expunged(&mut buffers);
        }

        response
    }

    /// Run `f` with the mailbox locked and a snapshot of the client's
    /// numbering.
    ///
    /// The view's own buffers are not locked while `f` runs, so `f` is free
    /// to mutate the mailbox.
    fn with_state<R>(
        &self,
        f: impl FnOnce(&mut MailboxState, &Numbering) -> R,
    ) -> R {
        let mut state = self.mailbox.lock();
        let numbering = Numbering {
            expunged: self.listener.buffers.lock().unwrap().expunged.clone(),
            canonical_count: state.message_count() as u32,
        };
        f(&mut state, &numbering)
    }

    /// Return the client's largest sequence number.
    pub fn max_seqnum(&self) -> u32 {
        self.with_state(|_, numbering| numbering.max_client())
    }

    /// Return the messages `ids` refers to, in ascending order.
    ///
    /// With `uid`, `ids` is a UID set and `*` is the greatest UID in the
    /// mailbox. Otherwise it is a set of the client's sequence numbers; a
    /// number beyond the client's largest is an error, while a number whose
    /// message has been expunged is silently skipped.
    pub fn messages(
        &self,
        ids: &SequenceSet,
        uid: bool,
    ) -> Result<Vec<SelectedMessage>, Error> {
        self.with_state(|state, numbering| {
            Ok(resolve(state, numbering, ids, uid)?
                .into_iter()
                .map(|(seqnum, ix)| SelectedMessage {
                    seqnum,
                    message: state.messages()[ix].clone(),
                })
                .collect())
        })
    }

    /// Evaluate `criteria` against every message, returning the matching
    /// client sequence numbers (or UIDs, if `uid`) in ascending order.
    pub fn search(&self, criteria: &SearchTerm, uid: bool) -> Vec<u32> {
        self.with_state(|state, numbering| {
            let max_uid = state.messages().last().map_or(0, |m| m.uid.0.get());
            state
                .messages()
                .iter()
                .enumerate()
                .filter(|&(ix, message)| {
                    criteria.matches(&Candidate {
                        message,
                        seqnum: numbering.to_client(ix),
                        max_seqnum: numbering.max_client(),
                        max_uid,
                    })
                })
                .map(|(ix, message)| {
                    if uid {
                        message.uid.0.get()
                    } else {
                        numbering.to_client(ix)
                    }
                })
                .collect()
        })
    }

    /// Change the flags of the messages `ids` refers to.
    ///
    /// With `silent`, this session is not notified of the resulting flags.
    pub fn store(
        &self,
        ids: &SequenceSet,
        uid: bool,
        mode: StoreMode,
        flags: &[Flag],
        silent: bool,
    ) -> Result<(), Error> {
        if self.read_only {
            return Err(Error::ReadOnlyMailbox);
        }

        let silent = if silent { Some(self.listener_id) } else { None };
        self.with_state(|state, numbering| {
            let uids: Vec<Uid> = resolve(state, numbering, ids, uid)?
                .into_iter()
                .map(|(_, ix)| state.messages()[ix].uid)
                .collect();
            state.store(&uids, mode, flags, silent);
            Ok(())
        })
    }

    /// Add `\Seen` to the given messages, as a side effect of fetching their
    /// content. Does nothing on a read-only view.
    pub fn mark_seen(&self, uids: &[Uid]) {
        if self.read_only || uids.is_empty() {
            return;
        }

        let mut state = self.mailbox.lock();
        let unseen: Vec<Uid> = uids
            .iter()
            .copied()
            .filter(|&uid| {
                state.seqnum_of(uid).map_or(false, |s| {
                    !state.messages()[s.to_index()].has_flag(&Flag::Seen)
                })
            })
            .collect();
        state.store(&unseen, StoreMode::Add, &[Flag::Seen], None);
    }

    /// Expunge messages with `\Deleted`, restricted to `uids` if given.
    pub fn expunge(
        &self,
        uids: Option<&SequenceSet>,
    ) -> Result<Vec<Uid>, Error> {
        if self.read_only {
            return Err(Error::ReadOnlyMailbox);
        }

        let mut state = self.mailbox.lock();
        let range = uids.map(|set| {
            let max_uid = state.messages().last().map_or(0, |m| m.uid.0.get());
            set.resolve::<Uid>(max_uid)
        });
        Ok(state.expunge(range.as_ref()))
    }
}

impl Drop for SessionMailboxView {
    fn drop(&mut self) {
        self.mailbox.lock().unsubscribe(self.listener_id);
    }
}

fn drain_expunged(buffers: &mut ViewBuffers) -> Vec<u32> {
    assert!(
        buffers.flag_updates.is_empty() && !buffers.size_changed,
        "drain_expunged() with flag updates or size change pending"
    );
    std::mem::replace(&mut buffers.expunged, Vec::new())
}

fn drain_flag_updates(buffers: &mut ViewBuffers) -> Vec<FlagUpdate> {
    std::mem::replace(&mut buffers.flag_updates, BTreeMap::new())
        .into_iter()
        .map(|(seqnum, (uid, flags))| FlagUpdate { seqnum, uid, flags })
        .collect()
}

/// Resolve `ids` to `(client seqnum, canonical index)` pairs.
fn resolve(
    state: &MailboxState,
    numbering: &Numbering,
    ids: &SequenceSet,
    uid: bool,
) -> Result<Vec<(u32, usize)>, Error> {
    if uid {
        let max_uid = state.messages().last().map_or(0, |m| m.uid.0.get());
        let range = ids.resolve::<Uid>(max_uid);
        return Ok(state
            .messages()
            .iter()
            .enumerate()
            .filter(|&(_, m)| range.contains(m.uid))
            .map(|(ix, _)| (numbering.to_client(ix), ix))
            .collect());
    }

    let max = numbering.max_client();
    if ids.max_explicit().unwrap_or(0) > max {
        return Err(Error::SeqnumOutOfRange);
    }

    let range = ids.resolve::<Seqnum>(max);
    Ok(range
        .items(max)
        .filter_map(|seqnum| {
            let client = seqnum.0.get();
            numbering.to_index(client).map(|ix| (client, ix))
        })
        .collect())
}
