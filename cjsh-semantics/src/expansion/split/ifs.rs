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

//! IFS separator classification

/// The IFS value used when the variable is unset
pub const DEFAULT: &str = " \t\n";

/// How a character relates to the current IFS
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Class {
    /// Not a separator
    NonIfs,
    /// Whitespace separator (collapses, never makes empty fields)
    IfsWhitespace,
    /// Non-whitespace separator (each one delimits)
    IfsNonWhitespace,
}

/// A parsed IFS value
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ifs {
    separators: String,
}

impl Ifs {
    /// Creates an IFS from the variable's value.
    #[must_use]
    pub fn new(separators: &str) -> Ifs {
        Ifs {
            separators: separators.to_string(),
        }
    }

    /// Whether the IFS contains no separators, disabling splitting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.separators.is_empty()
    }

    /// Classifies one character.
    #[must_use]
    pub fn classify(&self, c: char) -> Class {
        if !self.separators.contains(c) {
            Class::NonIfs
        } else if c.is_whitespace() {
            Class::IfsWhitespace
        } else {
            Class::IfsNonWhitespace
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ifs_is_whitespace() {
        let ifs = Ifs::new(DEFAULT);
        assert_eq!(ifs.classify(' '), Class::IfsWhitespace);
        assert_eq!(ifs.classify('\t'), Class::IfsWhitespace);
        assert_eq!(ifs.classify('\n'), Class::IfsWhitespace);
        assert_eq!(ifs.classify('a'), Class::NonIfs);
        assert_eq!(ifs.classify(':'), Class::NonIfs);
    }

    #[test]
    fn non_whitespace_separators() {
        let ifs = Ifs::new(": ");
        assert_eq!(ifs.classify(':'), Class::IfsNonWhitespace);
        assert_eq!(ifs.classify(' '), Class::IfsWhitespace);
    }

    #[test]
    fn empty_ifs() {
        let ifs = Ifs::new("");
        assert!(ifs.is_empty());
        assert_eq!(ifs.classify(' '), Class::NonIfs);
    }
}
