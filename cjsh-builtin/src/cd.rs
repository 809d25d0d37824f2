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

//! The `cd` built-in
//!
//! `cd [dir]` changes the working directory and maintains `PWD` and
//! `OLDPWD`. Without an operand it goes to `$HOME`; `cd -` swaps with
//! `OLDPWD` and prints the new directory. The directory stack is a
//! separate feature and deliberately does not interact with `cd -`.

use crate::common::{failure, usage_error};
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::variable::Scope;
use cjsh_env::Env;

/// Entry point of the `cd` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.len() > 1 {
        return usage_error("cd", "too many arguments");
    }

    let mut print_target = false;
    let target = match args.first().map(|f| f.value.as_str()) {
        None => match env.variables.value_of("HOME") {
            Some(home) => home.to_string(),
            None => return failure("cd", "HOME not set"),
        },
        Some("-") => {
            print_target = true;
            match env.variables.value_of("OLDPWD") {
                Some(oldpwd) => oldpwd.to_string(),
                None => return failure("cd", "OLDPWD not set"),
            }
        }
        Some(dir) => dir.to_string(),
    };

    let old = std::env::current_dir().ok();
    if let Err(error) = std::env::set_current_dir(&target) {
        return failure("cd", format_args!("{target}: {error}"));
    }
    let new = std::env::current_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or(target);

    if let Some(old) = old {
        let _ = env.variables.assign(
            Scope::Export,
            "OLDPWD",
            old.to_string_lossy().into_owned(),
        );
    }
    let _ = env.variables.assign(Scope::Export, "PWD", new.clone());
    if print_target {
        println!("{new}");
    }
    ExitStatus::SUCCESS.into()
}
