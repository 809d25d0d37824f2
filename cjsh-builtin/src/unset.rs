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

//! The `unset` built-in
//!
//! `unset [-v|-f] name…` removes variables (default) or functions. A
//! readonly variable cannot be unset; the failure is reported and the
//! remaining operands are still processed.

use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::Env;

/// Entry point of the `unset` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let mut functions = false;
    let mut status = ExitStatus::SUCCESS;
    for operand in &args {
        match operand.value.as_str() {
            "-f" => functions = true,
            "-v" => functions = false,
            name => {
                if functions {
                    env.functions.unset(name);
                } else if let Err(error) = env.variables.unset(name) {
                    eprintln!("cjsh: unset: {error}");
                    status = ExitStatus::FAILURE;
                }
            }
        }
    }
    status.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::variable::Scope;

    #[test]
    fn unsets_variables() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "v", "x").unwrap();
        main(&mut env, Field::dummies(["v"]));
        assert!(!env.variables.is_set("v"));
    }

    #[test]
    fn readonly_cannot_be_unset() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "r", "x").unwrap();
        env.variables.mark_readonly("r");
        let result = main(&mut env, Field::dummies(["r"]));
        assert_eq!(result.exit_status, ExitStatus::FAILURE);
        assert_eq!(env.variables.value_of("r"), Some("x"));
    }

    #[test]
    fn unset_missing_name_is_fine() {
        let mut env = Env::new();
        assert_eq!(
            main(&mut env, Field::dummies(["ghost"])).exit_status,
            ExitStatus::SUCCESS
        );
    }

    #[test]
    fn dash_f_targets_functions() {
        let mut env = Env::new();
        use std::str::FromStr;
        let list = cjsh_syntax::syntax::List::from_str("f() { :; }").unwrap();
        let cjsh_syntax::syntax::Command::Function(def) = &*list.0[0].and_or.first.commands[0]
        else {
            unreachable!();
        };
        env.functions.define(cjsh_env::function::Function {
            name: "f".to_string(),
            body: std::rc::Rc::clone(&def.body),
            origin: cjsh_syntax::source::Location::dummy("f"),
        });
        main(&mut env, Field::dummies(["-f", "f"]));
        assert!(env.functions.get("f").is_none());
    }
}
