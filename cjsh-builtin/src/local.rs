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

//! The `local` built-in
//!
//! `local name[=value]…` declares variables in the current function's
//! scope; they disappear when the function returns, revealing any outer
//! binding again. Only valid inside a function.

use crate::common::{failure, usage_error};
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::variable::Scope;
use cjsh_env::Env;

/// Entry point of the `local` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if env.variables.context_count() == 0 {
        return usage_error("local", "can only be used in a function");
    }
    for operand in &args {
        let (name, value) = match operand.value.split_once('=') {
            Some((name, value)) => (name, value),
            None => (operand.value.as_str(), ""),
        };
        if let Err(error) = env.variables.assign(Scope::Local, name, value) {
            return failure("local", error);
        }
    }
    ExitStatus::SUCCESS.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_function_is_an_error() {
        let mut env = Env::new();
        assert_eq!(
            main(&mut env, Field::dummies(["x=1"])).exit_status,
            ExitStatus::ERROR
        );
    }

    #[test]
    fn declares_in_innermost_context() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "x", "outer").unwrap();
        env.variables.push_context(Vec::new());
        main(&mut env, Field::dummies(["x=inner"]));
        assert_eq!(env.variables.value_of("x"), Some("inner"));
        env.variables.pop_context();
        assert_eq!(env.variables.value_of("x"), Some("outer"));
    }

    #[test]
    fn bare_name_declares_empty() {
        let mut env = Env::new();
        env.variables.push_context(Vec::new());
        main(&mut env, Field::dummies(["fresh"]));
        assert_eq!(env.variables.value_of("fresh"), Some(""));
    }
}
