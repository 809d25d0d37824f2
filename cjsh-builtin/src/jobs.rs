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

//! The `jobs` built-in
//!
//! Lists the job table with current (`+`) and previous (`-`) markers.
//! Jobs whose final state has now been reported are removed afterwards.

use cjsh_env::builtin::Result;
use cjsh_env::job::fmt::format_job;
use cjsh_env::job::JobId;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::Env;
use cjsh_semantics::exec;

/// Entry point of the `jobs` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    exec::reap_children(env);

    let selected: std::result::Result<Vec<usize>, _> = if args.is_empty() {
        Ok(env.jobs.iter().map(|(index, _)| index).collect())
    } else {
        args.iter()
            .map(|field| JobId::parse(&field.value).and_then(|id| id.resolve(&env.jobs)))
            .collect()
    };
    let selected = match selected {
        Ok(selected) => selected,
        Err(error) => {
            eprintln!("cjsh: jobs: {error}");
            return ExitStatus::FAILURE.into();
        }
    };

    for &index in &selected {
        if let Some(job) = env.jobs.get(index) {
            println!("{}", format_job(index, job, &env.jobs));
        }
    }
    for &index in &selected {
        if let Some(job) = env.jobs.get_mut(index) {
            if job.is_finished() {
                job.notified = true;
            }
        }
    }
    env.jobs.remove_finished_notified();
    ExitStatus::SUCCESS.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::job::{Job, Pid, ProcessState};

    fn job(pid: i32, name: &str) -> Job {
        let mut job = Job::new(Pid::from_raw(pid), name.to_string());
        job.push_process(Pid::from_raw(pid));
        job.is_background = true;
        job
    }

    #[test]
    fn finished_jobs_are_swept_after_listing() {
        let mut env = Env::new();
        let index = env.jobs.add(job(99991, "sleep 1"));
        env.jobs
            .update_process(Pid::from_raw(99991), ProcessState::Exited(ExitStatus(0)));
        main(&mut env, Vec::new());
        assert!(env.jobs.get(index).is_none());
    }

    #[test]
    fn running_jobs_stay() {
        let mut env = Env::new();
        let index = env.jobs.add(job(99992, "sleep 100"));
        main(&mut env, Vec::new());
        assert!(env.jobs.get(index).is_some());
    }

    #[test]
    fn unknown_job_id_fails() {
        let mut env = Env::new();
        let result = main(&mut env, Field::dummies(["%7"]));
        assert_eq!(result.exit_status, ExitStatus::FAILURE);
    }
}
