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

//! Command execution
//!
//! [`Execute`] is implemented for every AST level. Executing a node
//! runs it in the current environment, leaves its exit status in
//! `env.exit_status`, and propagates control-flow diverts through the
//! returned [`Result`].

pub mod compound_command;
pub mod cond;
pub mod list;
pub mod pipeline;
pub mod simple_command;

use cjsh_env::function::Function;
use cjsh_env::semantics::{ExitStatus, Result, CONTINUE};
use cjsh_env::Env;
use cjsh_syntax::source::pretty::Report;
use cjsh_syntax::syntax::{Command, FunctionDefinition};

/// Things that can be executed in a shell environment
pub trait Execute {
    /// Executes this node, leaving its status in `env.exit_status`.
    fn execute(&self, env: &mut Env) -> Result;
}

impl Execute for Command {
    fn execute(&self, env: &mut Env) -> Result {
        match self {
            Command::Simple(command) => command.execute(env),
            Command::Compound(command) => command.execute(env),
            Command::Function(definition) => definition.execute(env),
        }
    }
}

/// Defining a function stores its body; nothing runs.
impl Execute for FunctionDefinition {
    fn execute(&self, env: &mut Env) -> Result {
        let name = match self.name.to_string_if_literal() {
            Some(name) => name,
            // A non-literal name is expanded first.
            None => match crate::expansion::expand_word(env, &self.name) {
                Ok(field) => field.value,
                Err(error) => {
                    report_error(env, &error.to_report(), ExitStatus::FAILURE);
                    return CONTINUE;
                }
            },
        };
        env.functions.define(Function {
            name,
            body: std::rc::Rc::clone(&self.body),
            origin: self.location.clone(),
        });
        env.exit_status = ExitStatus::SUCCESS;
        CONTINUE
    }
}

/// Prints a diagnostic to stderr and records the exit status.
pub(crate) fn report_error(env: &mut Env, report: &Report, status: ExitStatus) {
    eprintln!("{}", report.render());
    env.exit_status = status;
}

/// Runs a closure with the condition context entered, so `errexit`
/// stays quiet inside.
pub(crate) fn run_in_condition<F>(env: &mut Env, f: F) -> Result
where
    F: FnOnce(&mut Env) -> Result,
{
    env.condition_depth += 1;
    let result = f(env);
    env.condition_depth -= 1;
    result
}

/// Runs a closure with the compound-body depth raised, which the
/// `errexit` severity policy consults.
pub(crate) fn run_in_compound_body<F>(env: &mut Env, f: F) -> Result
where
    F: FnOnce(&mut Env) -> Result,
{
    env.compound_depth += 1;
    let result = f(env);
    env.compound_depth -= 1;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn function_definition_registers_function() {
        let mut env = Env::new();
        let list = cjsh_syntax::syntax::List::from_str("greet() { :; }").unwrap();
        list.execute(&mut env).continue_value().unwrap();
        assert!(env.functions.get("greet").is_some());
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn condition_context_is_balanced() {
        let mut env = Env::new();
        let result = run_in_condition(&mut env, |env| {
            assert_eq!(env.condition_depth, 1);
            CONTINUE
        });
        assert_eq!(result, CONTINUE);
        assert_eq!(env.condition_depth, 0);
    }
}
