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

//! The `continue` built-in
//!
//! `continue [n]` resumes the next iteration of the n-th innermost
//! enclosing loop. Operand validation is shared with `break`.

use crate::r#break::parse_level;
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{Divert, ExitStatus, Field};
use cjsh_env::Env;

/// Entry point of the `continue` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    match parse_level("continue", env, &args) {
        Ok(count) => Result::with_divert(ExitStatus::SUCCESS, Divert::Continue { count }),
        Err(error) => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continue_diverts() {
        let mut env = Env::new();
        env.loop_depth = 2;
        let result = main(&mut env, Field::dummies(["2"]));
        assert_eq!(result.divert, Some(Divert::Continue { count: 1 }));
    }

    #[test]
    fn outside_loop_is_an_error() {
        let mut env = Env::new();
        assert_eq!(main(&mut env, Vec::new()).exit_status, ExitStatus::ERROR);
    }
}
