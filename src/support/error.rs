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

use std::io;

use thiserror::Error;

/// Every error the IMAP engine and its collaborators can produce.
///
/// Errors fall into three tiers, which determine how the server reacts:
///
/// - Syntax errors (`is_syntax()`) result in a tagged `BAD` and the
///   connection stays open.
/// - Fatal errors (`is_fatal()`) tear down the connection without any
///   further response.
/// - Everything else is an application error and results in a tagged `NO`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadSyntax(String),
    #[error("Unknown command")]
    UnknownCommand,
    #[error("Command not valid in this state")]
    InvalidState,
    #[error("No such mailbox")]
    NxMailbox,
    #[error("Mailbox already exists")]
    MailboxExists,
    #[error("Nonselectable mailbox")]
    MailboxUnselectable,
    #[error("Mailbox has inferiors")]
    MailboxHasInferiors,
    #[error("Operation not allowed on INBOX")]
    BadOperationOnInbox,
    #[error("Message sequence number out of range")]
    SeqnumOutOfRange,
    #[error("Mailbox is read-only")]
    ReadOnlyMailbox,
    #[error("Mailbox has been deleted")]
    MailboxDeleted,
    #[error("Unsafe mailbox name")]
    UnsafeName,
    #[error("No such user")]
    NxUser,
    #[error("User already exists")]
    UserExists,
    #[error("Bad user name or password")]
    BadCredentials,
    #[error("Unsupported charset")]
    UnsupportedCharset,
    #[error("Unexpected end of stream")]
    UnexpectedEof,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error indicates the client sent something the grammar
    /// does not allow.
    pub fn is_syntax(&self) -> bool {
        matches!(
            *self,
            Error::BadSyntax(..) | Error::UnknownCommand | Error::InvalidState
        )
    }

    /// Whether this error means the connection can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(*self, Error::UnexpectedEof | Error::Io(..))
    }
}

/// Shorthand for building an `Error::BadSyntax`.
pub(crate) fn bad_syntax(message: impl Into<String>) -> Error {
    Error::BadSyntax(message.into())
}
