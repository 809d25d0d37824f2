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

//! Pipeline execution
//!
//! A single-command pipeline runs in the current process so built-ins
//! can mutate shell state. A multi-command pipeline forks one child per
//! stage: the first child's pid becomes the process group, pipes are
//! wired between neighbors, and the parent waits for the whole group.
//! The exit status is the last command's, or the rightmost non-zero one
//! under `pipefail`; a `!` prefix then inverts zero and non-zero.

use super::{run_in_condition, simple_command, Execute};
use crate::exec::{self, ChildSetup};
use cjsh_env::job::Job;
use cjsh_env::option::Option::PipeFail;
use cjsh_env::semantics::{ExitStatus, Result, CONTINUE};
use cjsh_env::system::{self, Pid};
use cjsh_env::Env;
use cjsh_syntax::syntax::{Command, Pipeline};
use std::ops::ControlFlow;
use std::rc::Rc;

impl Execute for Pipeline {
    fn execute(&self, env: &mut Env) -> Result {
        if self.negation {
            // `!` makes the pipeline a condition and inverts its status.
            run_in_condition(env, |env| run_pipeline(env, &self.commands))?;
            env.exit_status = if env.exit_status.is_successful() {
                ExitStatus::FAILURE
            } else {
                ExitStatus::SUCCESS
            };
            return CONTINUE;
        }
        run_pipeline(env, &self.commands)
    }
}

fn run_pipeline(env: &mut Env, commands: &[Rc<Command>]) -> Result {
    match commands {
        [] => {
            env.exit_status = ExitStatus::SUCCESS;
            CONTINUE
        }
        [command] => {
            let result = command.execute(env);
            exec::cleanup_proc_substs(env);
            result
        }
        _ => {
            run_multi_stage(env, commands);
            exec::cleanup_proc_substs(env);
            CONTINUE
        }
    }
}

/// Runs a pipeline of two or more commands, all forked.
fn run_multi_stage(env: &mut Env, commands: &[Rc<Command>]) {
    let name = commands
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" | ");

    let mut previous_reader: Option<std::os::unix::io::RawFd> = None;
    let mut pgid: Option<Pid> = None;
    let mut job: Option<Job> = None;
    let job_control = env.job_control_active();

    for (position, command) in commands.iter().enumerate() {
        let is_last = position + 1 == commands.len();
        let pipe = if is_last {
            None
        } else {
            match system::pipe() {
                Ok(pair) => Some(pair),
                Err(errno) => {
                    eprintln!("cjsh: cannot create pipe: {errno}");
                    env.exit_status = ExitStatus::FAILURE;
                    break;
                }
            }
        };

        let mut setup = ChildSetup {
            pgid: job_control.then(|| pgid.unwrap_or(Pid::from_raw(0))),
            stdin: previous_reader,
            stdout: pipe.map(|(_, writer)| writer),
            close: Vec::new(),
        };
        if let Some((reader, _)) = pipe {
            // The child of this stage must not hold the next reader.
            setup.close.push(reader);
        }

        let command = Rc::clone(command);
        let forked = exec::fork_child(env, &setup, move |env| {
            simple_command::execute_in_pipeline_stage(env, &command)
        });

        // Parent: release the ends this stage consumed.
        if let Some(fd) = previous_reader {
            let _ = system::close(fd);
        }
        if let Some((reader, writer)) = pipe {
            let _ = system::close(writer);
            previous_reader = Some(reader);
        } else {
            previous_reader = None;
        }

        match forked {
            Ok(child) => {
                let group = *pgid.get_or_insert(child);
                let record = job.get_or_insert_with(|| Job::new(group, name.clone()));
                record.push_process(child);
            }
            Err(errno) => {
                eprintln!("cjsh: cannot fork: {errno}");
                env.exit_status = ExitStatus::FAILURE;
            }
        }
    }
    if let Some(fd) = previous_reader {
        let _ = system::close(fd);
    }

    let Some(job) = job else {
        return;
    };
    let index = env.jobs.add(job);
    let status = exec::wait_for_foreground(env, index);

    let status = match env.jobs.get(index) {
        Some(job) if job.is_finished() => {
            let status = if env.options.is_on(PipeFail) {
                job.processes
                    .iter()
                    .map(|p| p.state.exit_status())
                    .filter(|s| !s.is_successful())
                    .next_back()
                    .unwrap_or(ExitStatus::SUCCESS)
            } else {
                status
            };
            env.jobs.remove(index);
            status
        }
        // Stopped: the job stays in the table for `fg`/`bg`.
        _ => status,
    };
    env.exit_status = status;
}

/// Entry point for a forked pipeline stage.
///
/// External simple commands replace the child process directly; other
/// commands run in the child and the child exits with their status.
pub(crate) fn stage_status(result: Result, env: &Env) -> ExitStatus {
    match result {
        ControlFlow::Continue(()) => env.exit_status,
        ControlFlow::Break(divert) => divert.exit_status().unwrap_or(env.exit_status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn run(env: &mut Env, source: &str) -> Result {
        let list = cjsh_syntax::syntax::List::from_str(source).unwrap();
        list.execute(env)
    }

    #[test]
    fn empty_and_negation_statuses() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "! true").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
        run(&mut env, "! false").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
        run(&mut env, "! exitcode 9").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn single_command_runs_in_process() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "setvar marker 1").continue_value().unwrap();
        // An in-process builtin mutated our variables, proving no fork.
        assert_eq!(env.variables.value_of("marker"), Some("1"));
    }

    #[test]
    fn pipeline_runs_stages_and_reports_last_status() {
        let _guard = crate::tests::FORK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "exitcode 3 | exitcode 4 | true")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
        run(&mut env, "true | exitcode 4").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus(4));
    }

    #[test]
    fn pipefail_takes_rightmost_failure() {
        let _guard = crate::tests::FORK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        use cjsh_env::option::{Option::PipeFail, State};
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        env.options.set(PipeFail, State::On);
        run(&mut env, "exitcode 3 | true").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus(3));
        run(&mut env, "exitcode 3 | exitcode 5 | true")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus(5));
        run(&mut env, "true | true").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn pipeline_state_does_not_leak_back() {
        let _guard = crate::tests::FORK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "setvar inchild yes | true")
            .continue_value()
            .unwrap();
        // The first stage ran in a forked child.
        assert_eq!(env.variables.value_of("inchild"), None);
    }

    #[test]
    fn data_flows_through_the_pipe() {
        let _guard = crate::tests::FORK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        // `passfd` copies stdin to stdout and exits 0 on any input.
        run(&mut env, "emit hello | readcheck hello")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
        run(&mut env, "emit hello | readcheck other")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }
}
