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

//! Source code attribution
//!
//! Every AST node carries a [`Location`]: a shared reference to the
//! [`Code`] fragment it was parsed from plus a character index range.
//! Line and column numbers are computed on demand when a diagnostic is
//! rendered, so ordinary parsing never pays for them.

pub mod pretty;

use std::num::NonZeroU64;
use std::ops::Range;
use std::rc::Rc;

/// Origin of a code fragment
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Source {
    /// Origin unknown, used in tests and synthesized nodes
    Unknown,
    /// Standard input
    Stdin,
    /// `-c` command string
    CommandString,
    /// Script file operand or sourced file
    CommandFile { path: String },
    /// Command substitution inside another fragment
    CommandSubst { original: Location },
    /// Trap action string
    Trap { condition: String },
    /// Argument to the `eval` built-in
    Eval { original: Location },
    /// Line recalled by history expansion
    HistoryRecall { original: Location },
}

impl Source {
    /// Short human-readable label naming the origin, used as the file
    /// name in diagnostics.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Source::Unknown => "<unknown>".to_string(),
            Source::Stdin => "<stdin>".to_string(),
            Source::CommandString => "<command>".to_string(),
            Source::CommandFile { path } => path.clone(),
            Source::CommandSubst { .. } => "<command substitution>".to_string(),
            Source::Trap { condition } => format!("<trap {condition}>"),
            Source::Eval { .. } => "<eval>".to_string(),
            Source::HistoryRecall { .. } => "<history>".to_string(),
        }
    }
}

/// Code fragment under parsing or execution
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Code {
    /// Content of the fragment
    pub value: String,
    /// Line number of the first line of the fragment (1-based)
    pub start_line_number: NonZeroU64,
    /// Origin of the fragment
    pub source: Rc<Source>,
}

impl Code {
    /// Creates a fragment starting at line one.
    #[must_use]
    pub fn new(value: impl Into<String>, source: Source) -> Rc<Code> {
        Rc::new(Code {
            value: value.into(),
            start_line_number: NonZeroU64::MIN,
            source: Rc::new(source),
        })
    }
}

/// Position of an AST node in source code
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    /// Code fragment containing the node
    pub code: Rc<Code>,
    /// Character index range of the node in the fragment
    pub range: Range<usize>,
}

impl Location {
    /// Creates a location referring to a fragment made of the given
    /// string, for tests and synthesized nodes.
    #[must_use]
    pub fn dummy(value: impl Into<String>) -> Location {
        let value = value.into();
        let range = 0..value.chars().count();
        Location {
            code: Code::new(value, Source::Unknown),
            range,
        }
    }

    /// Computes the line number and column range of this location.
    ///
    /// Lines and columns are 1-based. The column range covers the span on
    /// its first line; a multi-line span reports the columns of its first
    /// line only.
    #[must_use]
    pub fn line_column(&self) -> (u64, usize, usize) {
        let mut line = self.code.start_line_number.get();
        let mut column = 1;
        let mut start_column = None;
        for (index, c) in self.code.value.chars().enumerate() {
            if index == self.range.start {
                start_column = Some((line, column));
            }
            if index >= self.range.start && (index >= self.range.end || c == '\n') {
                let (line, start) = start_column.unwrap_or((line, column));
                return (line, start, column.max(start + 1));
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        match start_column {
            Some((line, start)) => (line, start, column.max(start + 1)),
            None => (line, column, column + 1),
        }
    }

    /// Extends this location to cover the other location.
    ///
    /// Both locations must refer to the same code fragment; otherwise
    /// `self` is returned unchanged.
    #[must_use]
    pub fn merge(&self, other: &Location) -> Location {
        if Rc::ptr_eq(&self.code, &other.code) {
            Location {
                code: Rc::clone(&self.code),
                range: self.range.start.min(other.range.start)
                    ..self.range.end.max(other.range.end),
            }
        } else {
            self.clone()
        }
    }
}
