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

//! The `return` built-in
//!
//! `return [n]` unwinds to the end of the enclosing function or sourced
//! script. Without an operand, `$?` is left as it is. Outside those
//! contexts, `return` is an error and does not unwind.

use crate::common::{parse_status, usage_error};
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{Divert, Field};
use cjsh_env::Env;

/// Entry point of the `return` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.len() > 1 {
        return usage_error("return", "too many arguments");
    }
    if env.call_depth == 0 {
        return usage_error("return", "can only be used in a function or sourced script");
    }
    let status = match args.first() {
        Some(field) => match parse_status("return", field) {
            Ok(status) => Some(status),
            Err(error) => return error,
        },
        None => None,
    };
    Result::with_divert(
        status.unwrap_or(env.exit_status),
        Divert::Return(status),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::semantics::ExitStatus;

    #[test]
    fn return_with_status() {
        let mut env = Env::new();
        env.call_depth = 1;
        let result = main(&mut env, Field::dummies(["5"]));
        assert_eq!(result.divert, Some(Divert::Return(Some(ExitStatus(5)))));
    }

    #[test]
    fn return_without_status_keeps_current() {
        let mut env = Env::new();
        env.call_depth = 1;
        env.exit_status = ExitStatus(7);
        let result = main(&mut env, Vec::new());
        assert_eq!(result.divert, Some(Divert::Return(None)));
        assert_eq!(result.exit_status, ExitStatus(7));
    }

    #[test]
    fn outside_function_is_an_error_without_unwinding() {
        let mut env = Env::new();
        let result = main(&mut env, Vec::new());
        assert_eq!(result.divert, None);
        assert_eq!(result.exit_status, ExitStatus::ERROR);
    }
}
