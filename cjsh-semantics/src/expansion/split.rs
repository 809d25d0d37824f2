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

//! Field splitting
//!
//! Only unquoted characters born from expansion
//! ([`Origin::SoftExpansion`]) are subject to splitting. Per POSIX, a
//! delimiter is either a run of IFS whitespace or a single
//! non-whitespace separator with optional adjacent IFS whitespace;
//! consecutive non-whitespace separators produce empty fields, and a
//! single trailing one does not.

pub mod ifs;

use self::ifs::{Class, Ifs};
use super::attr::{AttrChar, Origin};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Nothing consumed yet (leading whitespace ignored)
    Start,
    /// Inside a field
    Field,
    /// A field was closed by whitespace; a following non-whitespace
    /// separator joins the same delimiter
    AfterWhitespace,
    /// The current delimiter already contains a non-whitespace
    /// separator; another one opens an empty field
    AfterSeparator,
}

/// Splits one attributed field on the given separators.
///
/// An input with no characters is passed through unchanged: it can only
/// reach this point for a quoted empty word, which must survive.
#[must_use]
pub fn split_field(chars: Vec<AttrChar>, ifs: &Ifs) -> Vec<Vec<AttrChar>> {
    if ifs.is_empty() || chars.is_empty() {
        return vec![chars];
    }

    let mut fields = Vec::new();
    let mut current: Vec<AttrChar> = Vec::new();
    let mut state = State::Start;

    for c in chars {
        let class = if c.origin == Origin::SoftExpansion && !c.is_quoted {
            ifs.classify(c.value)
        } else {
            Class::NonIfs
        };
        state = match (state, class) {
            (_, Class::NonIfs) => {
                current.push(c);
                State::Field
            }
            (State::Start, Class::IfsWhitespace) => State::Start,
            (State::Start, Class::IfsNonWhitespace) => {
                fields.push(Vec::new());
                State::AfterSeparator
            }
            (State::Field, Class::IfsWhitespace) => {
                fields.push(std::mem::take(&mut current));
                State::AfterWhitespace
            }
            (State::Field, Class::IfsNonWhitespace) => {
                fields.push(std::mem::take(&mut current));
                State::AfterSeparator
            }
            (State::AfterWhitespace, Class::IfsWhitespace) => State::AfterWhitespace,
            // Whitespace plus one separator is a single delimiter.
            (State::AfterWhitespace, Class::IfsNonWhitespace) => State::AfterSeparator,
            (State::AfterSeparator, Class::IfsWhitespace) => State::AfterSeparator,
            (State::AfterSeparator, Class::IfsNonWhitespace) => {
                fields.push(Vec::new());
                State::AfterSeparator
            }
        };
    }
    if state == State::Field {
        fields.push(current);
    }
    fields
}
