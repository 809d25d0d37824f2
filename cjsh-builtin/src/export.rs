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

//! The `export` built-in

use crate::common::failure;
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::variable::Scope;
use cjsh_env::Env;

fn print_exported(env: &Env) {
    for (name, variable) in env.variables.iter_visible() {
        if variable.exported {
            match &variable.value {
                Some(value) => println!("export {name}={value}"),
                None => println!("export {name}"),
            }
        }
    }
}

/// Entry point of the `export` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let operands: Vec<&Field> = args.iter().filter(|f| f.value != "-p").collect();
    if operands.is_empty() {
        print_exported(env);
        return ExitStatus::SUCCESS.into();
    }
    for operand in operands {
        match operand.value.split_once('=') {
            Some((name, value)) => {
                if let Err(error) = env.variables.assign(Scope::Export, name, value) {
                    return failure("export", error);
                }
            }
            None => env.variables.export(&operand.value),
        }
    }
    ExitStatus::SUCCESS.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_existing_variable() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "v", "x").unwrap();
        main(&mut env, Field::dummies(["v"]));
        assert!(env.variables.get("v").unwrap().exported);
    }

    #[test]
    fn assigns_and_exports() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["v=1"]));
        let variable = env.variables.get("v").unwrap();
        assert!(variable.exported);
        assert_eq!(variable.value.as_deref(), Some("1"));
    }

    #[test]
    fn readonly_violation_fails() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "r", "x").unwrap();
        env.variables.mark_readonly("r");
        assert_eq!(
            main(&mut env, Field::dummies(["r=2"])).exit_status,
            ExitStatus::FAILURE
        );
    }
}
