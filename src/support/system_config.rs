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

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// The system-wide configuration for Mockimap.
///
/// This is stored in a TOML file, conventionally named `mockimap.toml`. Every
/// section has usable defaults, so an empty file is a valid configuration.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SystemConfig {
    /// Options for the IMAP listener and sessions.
    #[serde(default)]
    pub imap: ImapConfig,

    /// Users to provision when the server starts.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ImapConfig {
    /// The address to listen on.
    pub listen: String,

    /// If true, `LOGIN` with an unknown user name creates that user with the
    /// given password instead of failing.
    ///
    /// This mirrors the usual setup of a throwaway test server, where the
    /// test harness does not want to provision users ahead of time.
    pub auto_create_users: bool,

    /// The largest literal, in bytes, a client may send.
    pub max_literal: u32,
}

impl Default for ImapConfig {
    fn default() -> Self {
        ImapConfig {
            listen: "127.0.0.1:3143".to_owned(),
            auto_create_users: false,
            max_literal: 64 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserConfig {
    pub name: String,
    pub password: String,
    /// Extra mailboxes to create besides `INBOX`.
    #[serde(default)]
    pub mailboxes: Vec<String>,
}

impl SystemConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
