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

//! Trap dispatch
//!
//! Signal handlers only set flags; this module drains them at safe
//! points and runs the corresponding trap actions. Trap commands are
//! re-parsed from their stored text each time they fire, and `$?` is
//! preserved around them.

use crate::{exec, runner};
use cjsh_env::option::Option::Interactive;
use cjsh_env::semantics::{Divert, ExitStatus, Result, CONTINUE};
use cjsh_env::trap::{Action, Condition};
use cjsh_env::{signal, Env};
use cjsh_syntax::source::Source;
use nix::sys::signal::Signal;
use std::ops::ControlFlow;

/// Drains pending signals and runs their traps.
///
/// Called at safe spots: between list items, between loop iterations,
/// and around waits. Signals arrive in precedence order (TERM, HUP,
/// INT, CHLD, rest). An untrapped SIGINT interrupts the current command
/// line; untrapped SIGTERM and SIGHUP exit a non-interactive shell with
/// 128 plus the signal number.
pub fn drain_signals(env: &mut Env) -> Result {
    for signal in signal::take_pending() {
        if signal == Signal::SIGCHLD {
            exec::reap_children(env);
        }
        if let Some(text) = env.traps.command(Condition::Signal(signal)) {
            run_trap_command(env, Condition::Signal(signal), &text)?;
            continue;
        }
        if env.traps.is_ignored(signal) {
            continue;
        }
        match signal {
            Signal::SIGINT => {
                return ControlFlow::Break(Divert::Interrupt(Some(ExitStatus::from_signal(
                    signal,
                ))));
            }
            Signal::SIGTERM | Signal::SIGHUP if !env.options.is_on(Interactive) => {
                return ControlFlow::Break(Divert::Exit(Some(ExitStatus::from_signal(signal))));
            }
            _ => {}
        }
    }
    CONTINUE
}

/// Runs one trap action, preserving `$?` around it.
pub fn run_trap_command(env: &mut Env, condition: Condition, text: &str) -> Result {
    let saved_status = env.exit_status;
    let source = Source::Trap {
        condition: condition.to_string(),
    };
    let result = runner::run_string(env, text, source);
    env.exit_status = saved_status;
    result
}

/// Runs the EXIT trap once.
///
/// The trap is cleared first so that an `exit` inside the trap cannot
/// re-enter it.
pub fn run_exit_trap(env: &mut Env) {
    let Some(text) = env.traps.command(Condition::Exit) else {
        return;
    };
    env.traps.set(Condition::Exit, Action::Default);
    let _ = run_trap_command(env, Condition::Exit, &text);
}

/// Runs the ERR trap if the last command failed.
pub fn run_err_trap(env: &mut Env) -> Result {
    if env.exit_status.is_successful() || env.condition_depth > 0 {
        return CONTINUE;
    }
    match env.traps.command(Condition::Err) {
        Some(text) => run_trap_command(env, Condition::Err, &text),
        None => CONTINUE,
    }
}

/// Runs the DEBUG trap before a simple command.
pub fn run_debug_trap(env: &mut Env) -> Result {
    match env.traps.command(Condition::Debug) {
        Some(text) => run_trap_command(env, Condition::Debug, &text),
        None => CONTINUE,
    }
}

/// Runs the RETURN trap when a function or sourced script returns.
pub fn run_return_trap(env: &mut Env) -> Result {
    match env.traps.command(Condition::Return) {
        Some(text) => run_trap_command(env, Condition::Return, &text),
        None => CONTINUE,
    }
}
