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

//! The `bg` built-in
//!
//! Resumes a stopped job in the background: SIGCONT to its process
//! group, no terminal handover.

use crate::common::failure;
use crate::fg::resolve_job;
use cjsh_env::builtin::Result;
use cjsh_env::job::ProcessState;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::system;
use cjsh_env::Env;
use nix::sys::signal::Signal;

/// Entry point of the `bg` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if !env.job_control_active() {
        return failure("bg", "no job control");
    }
    let index = match resolve_job("bg", env, &args) {
        Ok(index) => index,
        Err(error) => return error,
    };
    let Some(job) = env.jobs.get_mut(index) else {
        return failure("bg", "no such job");
    };
    job.is_background = true;
    let pgid = job.pgid;
    if let Err(errno) = system::killpg(pgid, Some(Signal::SIGCONT)) {
        return failure("bg", errno);
    }
    let job = env.jobs.get_mut(index).unwrap();
    for process in &mut job.processes {
        if matches!(process.state, ProcessState::Stopped(_)) {
            process.state = ProcessState::Running;
        }
    }
    println!("[{}] {} &", index + 1, job.name);
    ExitStatus::SUCCESS.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_job_control_fails() {
        let mut env = Env::new();
        let result = main(&mut env, Vec::new());
        assert_eq!(result.exit_status, ExitStatus::FAILURE);
    }
}
