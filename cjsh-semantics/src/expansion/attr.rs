// This file is part of cjsh, a POSIX-compatible interactive shell.
// Copyright (C) 2025 Caden Finley
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Attributed characters, the intermediate expansion currency

/// How a character came to be in the intermediate result
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Origin {
    /// Written literally in the source word
    Literal,
    /// Produced by parameter, command, or arithmetic expansion;
    /// subject to field splitting when unquoted
    SoftExpansion,
    /// Produced by tilde or process substitution; never split, and
    /// matched literally during globbing
    HardExpansion,
}

/// Character with expansion attributes
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AttrChar {
    /// The character itself
    pub value: char,
    /// Where it came from
    pub origin: Origin,
    /// Whether it was inside quotes (or escaped)
    pub is_quoted: bool,
}

impl AttrChar {
    /// Plain unquoted literal character.
    #[must_use]
    pub fn literal(value: char) -> AttrChar {
        AttrChar {
            value,
            origin: Origin::Literal,
            is_quoted: false,
        }
    }
}

/// Collects the character values, dropping attributes.
#[must_use]
pub fn to_string(chars: &[AttrChar]) -> String {
    chars.iter().map(|c| c.value).collect()
}
