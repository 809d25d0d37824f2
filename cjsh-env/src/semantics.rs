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

//! Types describing the result of command execution

use cjsh_syntax::source::Location;
use std::ffi::c_int;
use std::ops::ControlFlow;
use std::process::{ExitCode, Termination};

/// Resultant string of word expansion
///
/// A field is a string together with the location of the word it came
/// from, kept for error reporting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    /// String value of the field
    pub value: String,
    /// Location of the originating word
    pub origin: Location,
}

impl Field {
    /// Creates a field with a dummy origin, mostly for tests.
    #[must_use]
    pub fn dummy(value: impl Into<String>) -> Field {
        let value = value.into();
        let origin = Location::dummy(value.clone());
        Field { value, origin }
    }

    /// Creates fields with dummy origins.
    #[must_use]
    pub fn dummies<I>(values: I) -> Vec<Field>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        values.into_iter().map(Field::dummy).collect()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// Exit status of a command
///
/// `$?` expands to the value of the most recently completed foreground
/// command.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExitStatus(pub c_int);

impl ExitStatus {
    /// Exit status 0: success
    pub const SUCCESS: ExitStatus = ExitStatus(0);
    /// Exit status 1: failure
    pub const FAILURE: ExitStatus = ExitStatus(1);
    /// Exit status 2: usage or syntax error
    pub const ERROR: ExitStatus = ExitStatus(2);
    /// Exit status 125: error setting up command execution
    pub const EXEC_ERROR: ExitStatus = ExitStatus(125);
    /// Exit status 126: command found but not executable
    pub const NOT_EXECUTABLE: ExitStatus = ExitStatus(126);
    /// Exit status 127: command not found
    pub const NOT_FOUND: ExitStatus = ExitStatus(127);

    /// Whether the status is zero.
    #[must_use]
    pub const fn is_successful(self) -> bool {
        self.0 == 0
    }

    /// Exit status reporting termination by the given signal (128+n).
    #[must_use]
    pub fn from_signal(signal: nix::sys::signal::Signal) -> ExitStatus {
        ExitStatus(0x80 + signal as c_int)
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<c_int> for ExitStatus {
    fn from(value: c_int) -> ExitStatus {
        ExitStatus(value)
    }
}

impl From<ExitStatus> for c_int {
    fn from(status: ExitStatus) -> c_int {
        status.0
    }
}

/// Only the lowest 8 bits survive the conversion.
impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self.0 as u8)
    }
}

/// Reason for interrupting ordinary command sequencing
///
/// Control-flow built-ins and fatal conditions divert execution by
/// returning `Break(Divert::…)` through [`Result`]. Compound commands
/// pass diverts outward; the construct responsible (a loop, a function
/// call, the main loop) consumes them. No magic exit codes are involved,
/// so user scripts never observe internal 254/255 values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Divert {
    /// Continue the innermost (or `count`-th outer) loop
    Continue {
        /// 0 for the innermost loop, 1 for one level outer, and so on
        count: usize,
    },
    /// Break out of `count + 1` enclosing loops
    Break {
        /// 0 for the innermost loop, 1 for one level outer, and so on
        count: usize,
    },
    /// Return from the current function or sourced script
    Return(Option<ExitStatus>),
    /// Abort the current command line; in an interactive shell the next
    /// prompt follows, otherwise the shell exits
    Interrupt(Option<ExitStatus>),
    /// Exit the shell after running the EXIT trap
    Exit(Option<ExitStatus>),
}

impl Divert {
    /// Exit status carried by the divert, if any.
    #[must_use]
    pub fn exit_status(self) -> Option<ExitStatus> {
        match self {
            Divert::Continue { .. } | Divert::Break { .. } => None,
            Divert::Return(status) | Divert::Interrupt(status) | Divert::Exit(status) => status,
        }
    }
}

/// Result of command execution
///
/// `Continue(value)` is normal completion; `Break(divert)` unwinds to
/// the construct that handles the divert.
pub type Result<T = ()> = ControlFlow<Divert, T>;

/// Shorthand for `Result::Continue(())`.
pub const CONTINUE: Result = ControlFlow::Continue(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_constants() {
        assert!(ExitStatus::SUCCESS.is_successful());
        assert!(!ExitStatus::FAILURE.is_successful());
        assert_eq!(ExitStatus::NOT_FOUND.0, 127);
        assert_eq!(ExitStatus::NOT_EXECUTABLE.0, 126);
        assert_eq!(ExitStatus::EXEC_ERROR.0, 125);
    }

    #[test]
    fn signal_exit_statuses_are_128_plus_signo() {
        use nix::sys::signal::Signal;
        assert_eq!(ExitStatus::from_signal(Signal::SIGINT).0, 130);
        assert_eq!(ExitStatus::from_signal(Signal::SIGTERM).0, 143);
    }

    #[test]
    fn divert_exit_statuses() {
        assert_eq!(Divert::Break { count: 0 }.exit_status(), None);
        assert_eq!(
            Divert::Exit(Some(ExitStatus(3))).exit_status(),
            Some(ExitStatus(3))
        );
    }
}
