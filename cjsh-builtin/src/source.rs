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

//! The `.` / `source` built-in
//!
//! Reads a file and executes it in the current shell environment, so
//! it can define variables, functions, and traps. A `return` in the
//! file ends it. A name without a slash is searched on `PATH` first,
//! falling back to the working directory.

use crate::common::{failure, usage_error};
use cjsh_env::builtin::Result;
use cjsh_env::semantics::{Divert, ExitStatus, Field};
use cjsh_env::Env;
use cjsh_semantics::{command_search, runner, trap};
use cjsh_syntax::source::Source;
use std::ops::ControlFlow;
use std::path::PathBuf;

fn resolve(env: &Env, name: &str) -> PathBuf {
    if !name.contains('/') {
        if let Some(path) = command_search::search_path(env, name) {
            return path;
        }
    }
    PathBuf::from(name)
}

/// Entry point of the `.` / `source` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let Some(operand) = args.first() else {
        return usage_error(".", "filename operand is missing");
    };
    let path = resolve(env, &operand.value);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(error) => return failure(".", format_args!("{}: {error}", path.display())),
    };

    // Extra operands become the positional parameters of the script.
    let params: Vec<String> = args.iter().skip(1).map(|f| f.value.clone()).collect();
    let replaced_params = !params.is_empty();
    if replaced_params {
        env.variables.push_context(params);
    }
    env.call_depth += 1;

    let source = Source::CommandFile {
        path: path.to_string_lossy().into_owned(),
    };
    let result = runner::run_string(env, &text, source);

    env.call_depth -= 1;
    if replaced_params {
        env.variables.pop_context();
    }

    let result = match result {
        ControlFlow::Break(Divert::Return(status)) => {
            if let Some(status) = status {
                env.exit_status = status;
            }
            ControlFlow::Continue(())
        }
        other => other,
    };
    match result {
        ControlFlow::Continue(()) => match trap::run_return_trap(env) {
            ControlFlow::Continue(()) => env.exit_status.into(),
            ControlFlow::Break(divert) => Result::with_divert(env.exit_status, divert),
        },
        ControlFlow::Break(divert) => Result::with_divert(env.exit_status, divert),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn script(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn sourced_file_mutates_current_shell() {
        let mut env = Env::new();
        let file = script("sourced_var=yes\n");
        let arg = Field::dummy(file.path().to_string_lossy());
        let result = main(&mut env, vec![arg]);
        assert_eq!(result.exit_status, ExitStatus::SUCCESS);
        assert_eq!(env.variables.value_of("sourced_var"), Some("yes"));
    }

    #[test]
    fn missing_file_fails() {
        let mut env = Env::new();
        let result = main(&mut env, Field::dummies(["/no/such/file.sh"]));
        assert_eq!(result.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn missing_operand_is_usage_error() {
        let mut env = Env::new();
        assert_eq!(main(&mut env, Vec::new()).exit_status, ExitStatus::ERROR);
    }

    #[test]
    fn return_ends_the_file() {
        let mut env = Env::new();
        crate::test_support::install(&mut env);
        let file = script("before=1\nreturn 4\nafter=1\n");
        let arg = Field::dummy(file.path().to_string_lossy());
        let result = main(&mut env, vec![arg]);
        assert_eq!(result.exit_status, ExitStatus(4));
        assert_eq!(result.divert, None);
        assert_eq!(env.variables.value_of("before"), Some("1"));
        assert_eq!(env.variables.value_of("after"), None);
    }

    #[test]
    fn extra_operands_become_positional_params() {
        let mut env = Env::new();
        let file = script("seen=$1\n");
        let arg = Field::dummy(file.path().to_string_lossy());
        main(&mut env, vec![arg, Field::dummy("first")]);
        assert_eq!(env.variables.value_of("seen"), Some("first"));
        assert_eq!(env.variables.positional_params().len(), 0);
    }
}
