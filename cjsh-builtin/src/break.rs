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

//! The `break` built-in
//!
//! `break [n]` quits the execution of the n-th innermost enclosing
//! loop. With `n` exceeding the loop depth, the outermost loop is
//! exited. Outside any loop, `break` is an error and nothing unwinds.

use crate::common::{parse_count, usage_error};
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{Divert, ExitStatus, Field};
use cjsh_env::Env;

/// Validates the operands shared by `break` and `continue`.
///
/// Returns the zero-based count of loops to unwind.
pub(crate) fn parse_level(builtin: &str, env: &Env, args: &[Field]) -> std::result::Result<usize, Result> {
    if args.len() > 1 {
        return Err(usage_error(builtin, "too many arguments"));
    }
    let count = match args.first() {
        Some(field) => parse_count(builtin, field)?,
        None => 1,
    };
    if count == 0 {
        return Err(usage_error(builtin, "loop count must be positive"));
    }
    if env.loop_depth == 0 {
        return Err(usage_error(builtin, "only meaningful in a loop"));
    }
    Ok(count.min(env.loop_depth) - 1)
}

/// Entry point of the `break` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    match parse_level("break", env, &args) {
        Ok(count) => Result::with_divert(ExitStatus::SUCCESS, Divert::Break { count }),
        Err(error) => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_inside_loop_diverts() {
        let mut env = Env::new();
        env.loop_depth = 1;
        let result = main(&mut env, Vec::new());
        assert_eq!(result.divert, Some(Divert::Break { count: 0 }));
        assert_eq!(result.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn count_selects_outer_loops() {
        let mut env = Env::new();
        env.loop_depth = 3;
        let result = main(&mut env, Field::dummies(["2"]));
        assert_eq!(result.divert, Some(Divert::Break { count: 1 }));
    }

    #[test]
    fn excessive_count_clamps_to_outermost() {
        let mut env = Env::new();
        env.loop_depth = 1;
        let result = main(&mut env, Field::dummies(["5"]));
        assert_eq!(result.divert, Some(Divert::Break { count: 0 }));
    }

    #[test]
    fn outside_loop_is_an_error() {
        let mut env = Env::new();
        let result = main(&mut env, Vec::new());
        assert_eq!(result.divert, None);
        assert_eq!(result.exit_status, ExitStatus::ERROR);
    }

    #[test]
    fn invalid_operands() {
        let mut env = Env::new();
        env.loop_depth = 1;
        assert_eq!(main(&mut env, Field::dummies(["0"])).exit_status, ExitStatus::ERROR);
        assert_eq!(main(&mut env, Field::dummies(["x"])).exit_status, ExitStatus::ERROR);
        assert_eq!(
            main(&mut env, Field::dummies(["1", "2"])).exit_status,
            ExitStatus::ERROR
        );
    }
}
