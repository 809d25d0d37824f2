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

//! The `fg` built-in
//!
//! Brings a job to the foreground: gives it the terminal, continues it
//! if stopped, and waits for it as for any foreground pipeline.

use crate::common::failure;
use cjsh_env::builtin::Result;
use cjsh_env::job::{Job, JobId, JobState};
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::system;
use cjsh_env::Env;
use cjsh_semantics::exec;
use nix::sys::signal::Signal;

pub(crate) fn resolve_job(
    builtin: &str,
    env: &Env,
    args: &[Field],
) -> std::result::Result<usize, Result> {
    if args.len() > 1 {
        return Err(failure(builtin, "too many arguments"));
    }
    let id = match args.first() {
        Some(field) => {
            JobId::parse(&field.value).map_err(|error| failure(builtin, error))?
        }
        None => JobId::Current,
    };
    id.resolve(&env.jobs).map_err(|error| failure(builtin, error))
}

/// Entry point of the `fg` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if !env.job_control_active() {
        return failure("fg", "no job control");
    }
    let index = match resolve_job("fg", env, &args) {
        Ok(index) => index,
        Err(error) => return error,
    };
    let Some(job) = env.jobs.get_mut(index) else {
        return failure("fg", "no such job");
    };
    println!("{}", job.name);
    job.is_background = false;
    let pgid = job.pgid;
    let stopped = job.state() == JobState::Stopped;
    if stopped {
        if let Err(errno) = system::killpg(pgid, Some(Signal::SIGCONT)) {
            return failure("fg", errno);
        }
        for process in &mut env.jobs.get_mut(index).unwrap().processes {
            if matches!(process.state, cjsh_env::job::ProcessState::Stopped(_)) {
                process.state = cjsh_env::job::ProcessState::Running;
            }
        }
    }

    let status = exec::wait_for_foreground(env, index);
    if env.jobs.get(index).is_some_and(Job::is_finished) {
        env.jobs.remove(index);
    }
    status.into()
}
