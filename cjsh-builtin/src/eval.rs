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

//! The `eval` built-in
//!
//! Joins its operands with spaces and runs the result as shell source
//! in the current environment.

use cjsh_env::builtin::Result;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::Env;
use cjsh_semantics::runner;
use cjsh_syntax::source::Source;
use std::ops::ControlFlow;

/// Entry point of the `eval` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.is_empty() {
        return ExitStatus::SUCCESS.into();
    }
    let text = args
        .iter()
        .map(|field| field.value.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let source = Source::Eval {
        original: args[0].origin.clone(),
    };
    match runner::run_string(env, &text, source) {
        ControlFlow::Continue(()) => env.exit_status.into(),
        ControlFlow::Break(divert) => Result::with_divert(env.exit_status, divert),
    }
}
