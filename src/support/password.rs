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

use rand::Rng;

/// Characters used in generated passwords.
///
/// Glyphs that are easily confused with each other (`l`, `I`, `O`, `0`, `1`)
/// are left out, so passwords can be read off a terminal and typed back in.
const ALPHABET: &[u8] =
    b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPRSTUVWXYZ23456789";

const MIN_LEN: usize = 5;
const MAX_LEN: usize = 7;

/// Generate a random password using `rng`.
///
/// If `len` is `None`, the length is chosen uniformly between 5 and 7
/// characters.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, len: Option<usize>) -> String {
    let len = len.unwrap_or_else(|| rng.gen_range(MIN_LEN, MAX_LEN + 1));
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0, ALPHABET.len())]))
        .collect()
}
