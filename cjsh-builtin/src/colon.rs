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

//! The `:`, `true`, and `false` built-ins
//!
//! `:` and `true` do nothing, successfully. Their arguments are still
//! expanded by the caller, which scripts exploit for side effects like
//! `: ${VAR:=default}`.

use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::Env;

/// `:` and `true`
pub fn main(_env: &mut Env, _args: Vec<Field>) -> Result {
    ExitStatus::SUCCESS.into()
}

/// `false`
pub fn false_main(_env: &mut Env, _args: Vec<Field>) -> Result {
    ExitStatus::FAILURE.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        let mut env = Env::new();
        assert_eq!(main(&mut env, Vec::new()).exit_status, ExitStatus::SUCCESS);
        assert_eq!(
            false_main(&mut env, Field::dummies(["ignored"])).exit_status,
            ExitStatus::FAILURE
        );
    }
}
