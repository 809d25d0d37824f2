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

//! The `shift` built-in

use crate::common::{failure, parse_count, usage_error};
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::Env;

/// Entry point of the `shift` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.len() > 1 {
        return usage_error("shift", "too many arguments");
    }
    let count = match args.first() {
        Some(field) => match parse_count("shift", field) {
            Ok(count) => count,
            Err(error) => return error,
        },
        None => 1,
    };
    if env.variables.shift_positional_params(count) {
        ExitStatus::SUCCESS.into()
    } else {
        failure("shift", "shift count out of range")
    }
}
