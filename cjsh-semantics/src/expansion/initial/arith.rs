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

//! Arithmetic expansion
//!
//! The expression text first undergoes parameter and command
//! substitution, then evaluates through `cjsh-arith` with the shell
//! variable table as the arithmetic environment: bare identifiers read
//! shell variables (unset reads as zero) and assignment operators write
//! them back through the ordinary scoping rules.

use super::super::{Error, ErrorCause, Result};
use cjsh_env::variable::{ReadOnlyError, Scope, VariableSet};
use cjsh_env::Env;
use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::Text;

/// Adapter exposing shell variables to the arithmetic evaluator
struct VarEnv<'a> {
    variables: &'a mut VariableSet,
}

impl cjsh_arith::Env for VarEnv<'_> {
    type Error = ReadOnlyError;

    fn get_variable(&self, name: &str) -> std::result::Result<Option<&str>, ReadOnlyError> {
        Ok(self.variables.value_of(name))
    }

    fn assign_variable(&mut self, name: &str, value: String) -> std::result::Result<(), ReadOnlyError> {
        self.variables.assign(Scope::Shell, name, value).map(drop)
    }
}

/// Evaluates an already expanded expression string.
pub fn eval_raw(env: &mut Env, expression: &str, location: &Location) -> Result<i64> {
    let mut var_env = VarEnv {
        variables: &mut env.variables,
    };
    cjsh_arith::eval(expression, &mut var_env).map_err(|error| match error.cause {
        cjsh_arith::ErrorCause::EnvError(readonly) => Error {
            cause: ErrorCause::AssignReadOnly(readonly),
            location: location.clone(),
        },
        cause => Error {
            cause: ErrorCause::Arith {
                message: cause.to_string(),
            },
            location: location.clone(),
        },
    })
}

/// Expands `$(( … ))`: inner expansions first, then evaluation.
pub fn expand(env: &mut Env, content: &Text, location: &Location) -> Result<String> {
    let expression = super::super::expand_text(env, content, location)?;
    let value = eval_raw(env, &expression, location)?;
    Ok(value.to_string())
}

/// Evaluates a `(( … ))` command or C-style `for` part.
///
/// Returns `None` for an expression of only blanks, letting the caller
/// decide: a blank `for (( ; ; ))` condition counts as true, while a
/// blank `(( ))` command counts as zero.
pub fn eval_text(env: &mut Env, content: &Text, location: &Location) -> Result<Option<i64>> {
    let expression = super::super::expand_text(env, content, location)?;
    if expression.trim().is_empty() {
        return Ok(None);
    }
    eval_raw(env, &expression, location).map(Some)
}
