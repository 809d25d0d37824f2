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

//! Quote removal and attribute stripping
//!
//! The earlier phases keep quoting as character attributes rather than
//! as characters, so the final step only drops the attributes and
//! produces a plain [`Field`].

use super::attr::AttrChar;
use cjsh_env::semantics::Field;
use cjsh_syntax::source::Location;

/// Strips attributes, producing the final field value.
#[must_use]
pub fn to_field(chars: &[AttrChar], origin: &Location) -> Field {
    Field {
        value: chars.iter().map(|c| c.value).collect(),
        origin: origin.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::attr::Origin;
    use super::*;

    #[test]
    fn attributes_are_dropped() {
        let chars = [
            AttrChar::literal('a'),
            AttrChar {
                value: 'b',
                origin: Origin::SoftExpansion,
                is_quoted: true,
            },
        ];
        let field = to_field(&chars, &Location::dummy("ab"));
        assert_eq!(field.value, "ab");
    }
}
