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

//! Parse-and-run entry points
//!
//! Shared by the interactive loop, `-c` strings, script files, `eval`,
//! `.`/`source`, trap actions, and command substitution subshells. A
//! syntax error aborts the unit: the diagnostic is printed and `$?`
//! becomes 2, but the calling shell keeps running.

use crate::command::Execute;
use cjsh_env::semantics::{ExitStatus, Result, CONTINUE};
use cjsh_env::Env;
use cjsh_syntax::parser::lex::Lexer;
use cjsh_syntax::parser::Parser;
use cjsh_syntax::source::Source;
use std::ops::ControlFlow;

/// Parses and executes a whole source string in the current
/// environment.
pub fn run_string(env: &mut Env, text: &str, source: Source) -> Result {
    let mut lexer = Lexer::from_memory(text, source);
    let mut parser = Parser::new(&mut lexer);
    loop {
        match parser.command_line() {
            Ok(Some(list)) => list.execute(env)?,
            Ok(None) => return CONTINUE,
            Err(error) => {
                eprintln!("{}", error.to_report().render());
                env.exit_status = ExitStatus::ERROR;
                return CONTINUE;
            }
        }
    }
}

/// Runs source text in a forked child, turning diverts into a final
/// exit status.
///
/// Used by command substitution and process substitution helpers; the
/// caller passes the result to `_exit`.
#[must_use]
pub fn run_string_in_subshell(env: &mut Env, text: &str, source: Source) -> ExitStatus {
    match run_string(env, text, source) {
        ControlFlow::Continue(()) => env.exit_status,
        ControlFlow::Break(divert) => divert.exit_status().unwrap_or(env.exit_status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::semantics::Divert;

    #[test]
    fn runs_commands_line_by_line() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run_string(
            &mut env,
            "setvar a 1\nsetvar b 2\nexitcode 5\n",
            Source::Unknown,
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("a"), Some("1"));
        assert_eq!(env.variables.value_of("b"), Some("2"));
        assert_eq!(env.exit_status, ExitStatus(5));
    }

    #[test]
    fn syntax_error_sets_status_2() {
        let mut env = Env::new();
        run_string(&mut env, "if then fi", Source::Unknown)
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::ERROR);
    }

    #[test]
    fn diverts_propagate() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        env.builtins.insert(
            "quit",
            cjsh_env::builtin::Builtin {
                kind: cjsh_env::builtin::Kind::Special,
                execute: |_, _| cjsh_env::builtin::Result::with_divert(
                    ExitStatus(9),
                    Divert::Exit(Some(ExitStatus(9))),
                ),
            },
        );
        let status = run_string_in_subshell(&mut env, "quit\nsetvar after x\n", Source::Unknown);
        assert_eq!(status, ExitStatus(9));
        assert_eq!(env.variables.value_of("after"), None);
    }
}
