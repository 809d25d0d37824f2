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

//! Shell command language semantics
//!
//! This crate turns parsed commands into behavior: the [`expansion`]
//! module performs the word expansions in POSIX order, and the
//! [`command`] module implements the [`Execute`] trait over every AST
//! level, from whole lists down to simple commands. Process plumbing
//! (forks, pipes, process groups, the foreground wait loop) lives in
//! [`exec`]; redirections in [`redir`]; command lookup in
//! [`command_search`]; trap dispatch in [`trap`]; the shared
//! parse-and-run loop in [`runner`].
//!
//! Execution functions take the whole [`Env`](cjsh_env::Env) mutably
//! and return [`cjsh_env::semantics::Result`], whose `Break` variant
//! carries a [`Divert`](cjsh_env::semantics::Divert) for `break`,
//! `continue`, `return`, and shell exit. The exit status of the
//! executed command lands in `env.exit_status`.

pub mod command;
pub mod command_search;
pub mod exec;
pub mod expansion;
pub mod redir;
pub mod runner;
pub mod trap;
pub mod xtrace;

pub use command::Execute;

use cjsh_env::option::{ErrexitSeverity, Option::ErrExit};
use cjsh_env::semantics::{Divert, Result, CONTINUE};
use cjsh_env::Env;

/// Applies the `errexit` option after a completed pipeline.
///
/// The check is skipped in condition contexts. The `errexit_severity`
/// knob decides whether statuses arising inside compound-command bodies
/// count: `strict` checks everywhere, `default` only outside compound
/// bodies, and `relaxed` additionally requires the failing command to
/// have been a lone simple command.
pub(crate) fn apply_errexit(env: &mut Env, was_simple: bool) -> Result {
    if env.exit_status.is_successful()
        || !env.options.is_on(ErrExit)
        || env.condition_depth > 0
    {
        return CONTINUE;
    }
    let eligible = match env.options.errexit_severity {
        ErrexitSeverity::Strict => true,
        ErrexitSeverity::Default => env.compound_depth == 0,
        ErrexitSeverity::Relaxed => env.compound_depth == 0 && was_simple,
    };
    if eligible {
        std::ops::ControlFlow::Break(Divert::Exit(Some(env.exit_status)))
    } else {
        CONTINUE
    }
}
