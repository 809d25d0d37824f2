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

//! The `wait` built-in
//!
//! `wait [pid|%job]…` blocks until the targets (or, with no operands,
//! every job) complete. A signal arriving during the wait interrupts it
//! and the status becomes 128 plus the signal number.

use crate::common::failure;
use cjsh_env::builtin::Result;
use cjsh_env::job::{Job, JobId, Pid};
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::system::{self, Errno, WaitPidFlag};
use cjsh_env::{signal, Env};
use cjsh_semantics::exec;

enum TargetState {
    Finished(ExitStatus),
    Waiting,
    Unknown,
}

fn target_state(env: &Env, index: Option<usize>) -> TargetState {
    match index {
        None => TargetState::Unknown,
        Some(index) => match env.jobs.get(index) {
            None => TargetState::Unknown,
            Some(job) if job.is_finished() => TargetState::Finished(job.exit_status()),
            Some(_) => TargetState::Waiting,
        },
    }
}

/// Blocks until the given job finishes or a signal arrives.
///
/// Returns `Err(status)` with 128+signo when interrupted.
fn wait_one(env: &mut Env, index: usize) -> std::result::Result<ExitStatus, ExitStatus> {
    loop {
        match target_state(env, Some(index)) {
            TargetState::Finished(status) => {
                env.jobs.remove(index);
                return Ok(status);
            }
            TargetState::Unknown => return Ok(ExitStatus::SUCCESS),
            TargetState::Waiting => {}
        }
        let pending = signal::take_pending();
        if !pending.is_empty() {
            let mut interrupt = None;
            for signal in pending {
                if signal == nix::sys::signal::Signal::SIGCHLD {
                    exec::reap_children(env);
                } else if interrupt.is_none() {
                    interrupt = Some(signal);
                } else {
                    // Keep the rest for the next safe point.
                    signal::repost(signal);
                }
            }
            if let Some(signal) = interrupt {
                return Err(ExitStatus::from_signal(signal));
            }
            continue;
        }
        match system::waitpid(Some(Pid::from_raw(-1)), WaitPidFlag::WUNTRACED) {
            Ok(report) => {
                if let Some((pid, state)) = exec::process_state(report) {
                    env.jobs.update_process(pid, state);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(ExitStatus::SUCCESS),
            Err(errno) => {
                eprintln!("cjsh: wait: {errno}");
                return Ok(ExitStatus::FAILURE);
            }
        }
    }
}

/// Entry point of the `wait` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    exec::reap_children(env);

    if args.is_empty() {
        loop {
            let Some((index, _)) = env.jobs.iter().next() else {
                return ExitStatus::SUCCESS.into();
            };
            match wait_one(env, index) {
                Ok(_) => {}
                Err(status) => return status.into(),
            }
        }
    }

    let mut status = ExitStatus::SUCCESS;
    for operand in &args {
        let index = if operand.value.starts_with('%') {
            match JobId::parse(&operand.value).and_then(|id| id.resolve(&env.jobs)) {
                Ok(index) => Some(index),
                Err(_) => {
                    status = ExitStatus::NOT_FOUND;
                    continue;
                }
            }
        } else {
            match operand.value.parse::<i32>() {
                Ok(pid) => env.jobs.find_by_pid(Pid::from_raw(pid)),
                Err(_) => return failure("wait", format_args!("{}: not a pid", operand.value)),
            }
        };
        match index {
            Some(index) => match wait_one(env, index) {
                Ok(job_status) => status = job_status,
                Err(status) => return status.into(),
            },
            // An unknown pid has either been reaped already or never
            // was a child; POSIX says report 127.
            None => status = ExitStatus::NOT_FOUND,
        }
    }
    status.into()
}
