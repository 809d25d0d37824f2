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

//! The `readonly` built-in
//!
//! `readonly name[=value]…` marks variables readonly, optionally
//! assigning first. The attribute survives until the process exits.
//! Without operands (or with `-p`), prints the readonly variables.

use crate::common::failure;
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::variable::Scope;
use cjsh_env::Env;

fn print_readonly(env: &Env) {
    for (name, variable) in env.variables.iter_visible() {
        if variable.read_only {
            match &variable.value {
                Some(value) => println!("readonly {name}={value}"),
                None => println!("readonly {name}"),
            }
        }
    }
}

/// Entry point of the `readonly` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let operands: Vec<&Field> = args.iter().filter(|f| f.value != "-p").collect();
    if operands.is_empty() {
        print_readonly(env);
        return ExitStatus::SUCCESS.into();
    }
    for operand in operands {
        let (name, value) = match operand.value.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (operand.value.as_str(), None),
        };
        if let Some(value) = value {
            if let Err(error) = env.variables.assign(Scope::Shell, name, value) {
                return failure("readonly", error);
            }
        }
        env.variables.mark_readonly(name);
    }
    ExitStatus::SUCCESS.into()
}
