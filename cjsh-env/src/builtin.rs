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

//! Type of built-in commands
//!
//! The built-in table lives in [`Env`](crate::Env) so that the executor
//! can dispatch without depending on the crate the bodies are defined
//! in. Plugin commands are added to and removed from the same table
//! when plugins are enabled and disabled.

use crate::semantics::{Divert, ExitStatus, Field};
use crate::Env;

/// Result of a built-in invocation
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Result {
    /// Exit status of the built-in
    pub exit_status: ExitStatus,
    /// Control-flow divert the built-in requests, if any
    pub divert: Option<Divert>,
}

impl Result {
    /// Result with the given exit status and no divert.
    #[must_use]
    pub fn new(exit_status: ExitStatus) -> Result {
        Result {
            exit_status,
            divert: None,
        }
    }

    /// Result carrying a control-flow divert.
    #[must_use]
    pub fn with_divert(exit_status: ExitStatus, divert: Divert) -> Result {
        Result {
            exit_status,
            divert: Some(divert),
        }
    }
}

impl From<ExitStatus> for Result {
    fn from(exit_status: ExitStatus) -> Result {
        Result::new(exit_status)
    }
}

/// Classification of built-ins, deciding command-search order
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Found before PATH search and even without a PATH hit (e.g. `cd`,
    /// `set`, `exit`)
    Special,
    /// Ordinary built-in, found before external commands
    Regular,
    /// Command provided by a plugin
    Plugin,
}

/// A built-in command
#[derive(Clone, Copy, Debug)]
pub struct Builtin {
    /// Classification
    pub kind: Kind,
    /// Implementation; receives the already expanded fields, without
    /// the command name
    pub execute: fn(&mut Env, Vec<Field>) -> Result,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_conversions() {
        let r: Result = ExitStatus::FAILURE.into();
        assert_eq!(r.exit_status, ExitStatus::FAILURE);
        assert_eq!(r.divert, None);

        let r = Result::with_divert(ExitStatus::SUCCESS, Divert::Break { count: 0 });
        assert_eq!(r.divert, Some(Divert::Break { count: 0 }));
    }
}
