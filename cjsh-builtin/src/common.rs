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

//! Shared helpers for built-in implementations

use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};

/// Reports a usage error: message to stderr, exit status 2.
#[must_use]
pub fn usage_error(builtin: &str, message: impl std::fmt::Display) -> Result {
    eprintln!("cjsh: {builtin}: {message}");
    ExitStatus::ERROR.into()
}

/// Reports a runtime failure: message to stderr, exit status 1.
#[must_use]
pub fn failure(builtin: &str, message: impl std::fmt::Display) -> Result {
    eprintln!("cjsh: {builtin}: {message}");
    ExitStatus::FAILURE.into()
}

/// Parses an operand as a non-negative decimal integer.
pub fn parse_count(builtin: &str, field: &Field) -> std::result::Result<usize, Result> {
    field
        .value
        .parse()
        .map_err(|_| usage_error(builtin, format_args!("{}: numeric argument required", field.value)))
}

/// Parses an operand as an exit status value.
pub fn parse_status(builtin: &str, field: &Field) -> std::result::Result<ExitStatus, Result> {
    field
        .value
        .parse::<i32>()
        .map(ExitStatus)
        .map_err(|_| usage_error(builtin, format_args!("{}: numeric argument required", field.value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_accepts_digits_only() {
        assert_eq!(parse_count("break", &Field::dummy("3")), Ok(3));
        assert!(parse_count("break", &Field::dummy("x")).is_err());
        assert!(parse_count("break", &Field::dummy("-1")).is_err());
    }

    #[test]
    fn parse_status_accepts_negatives() {
        assert_eq!(parse_status("exit", &Field::dummy("0")), Ok(ExitStatus(0)));
        assert_eq!(
            parse_status("exit", &Field::dummy("255")),
            Ok(ExitStatus(255))
        );
        assert!(parse_status("exit", &Field::dummy("abc")).is_err());
    }
}
