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

//! The integration tests are near "full-stack" tests which run the actual
//! server code, without test-specific modifications and with as little
//! "reaching under the covers" as possible.
//!
//! Each "connection" spawns a dedicated server thread, which talks to the
//! test over a TCP connection on the loopback interface, just as a real
//! client would. Every test sets up its own in-memory store, so tests never
//! see each other's mailboxes.
//!
//! Responses are checked as text. Tests that involve more than one session
//! drive the sessions in lock-step from the test thread, so the interleaving
//! of notifications is deterministic.


mod rfc3501;
mod rfc4315;
mod rfc7888;
