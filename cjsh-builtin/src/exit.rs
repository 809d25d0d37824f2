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

//! The `exit` built-in
//!
//! `exit [n]` unwinds to the top level; the main loop runs the EXIT
//! trap and terminates the process. Without an operand the current `$?`
//! becomes the exit status.

use crate::common::usage_error;
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{Divert, ExitStatus, Field};
use cjsh_env::Env;

/// Entry point of the `exit` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.len() > 1 {
        return usage_error("exit", "too many arguments");
    }
    let status = match args.first() {
        Some(field) => match field.value.parse::<i32>() {
            Ok(code) => Some(ExitStatus(code)),
            // An unusable operand still exits, with status 2.
            Err(_) => {
                eprintln!("cjsh: exit: {}: numeric argument required", field.value);
                Some(ExitStatus::ERROR)
            }
        },
        None => None,
    };
    Result::with_divert(
        status.unwrap_or(env.exit_status),
        Divert::Exit(status),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_with_status() {
        let mut env = Env::new();
        let result = main(&mut env, Field::dummies(["3"]));
        assert_eq!(result.divert, Some(Divert::Exit(Some(ExitStatus(3)))));
    }

    #[test]
    fn exit_without_operand_uses_current_status() {
        let mut env = Env::new();
        env.exit_status = ExitStatus(9);
        let result = main(&mut env, Vec::new());
        assert_eq!(result.divert, Some(Divert::Exit(None)));
        assert_eq!(result.exit_status, ExitStatus(9));
    }

    #[test]
    fn bad_operand_still_exits() {
        let mut env = Env::new();
        let result = main(&mut env, Field::dummies(["many"]));
        assert_eq!(result.divert, Some(Divert::Exit(Some(ExitStatus::ERROR))));
    }
}
