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

//! Execution of lists and and-or lists

use super::{run_in_condition, Execute};
use crate::{apply_errexit, exec, trap};
use cjsh_env::job::Job;
use cjsh_env::semantics::{ExitStatus, Result, CONTINUE};
use cjsh_env::system::{self, OFlag};
use cjsh_env::Env;
use cjsh_syntax::syntax::{AndOr, AndOrList, Command, Item, List};

impl Execute for List {
    fn execute(&self, env: &mut Env) -> Result {
        for item in &self.0 {
            // Safe spot: deliver pending signals between commands.
            trap::drain_signals(env)?;
            item.execute(env)?;
        }
        CONTINUE
    }
}

impl Execute for Item {
    fn execute(&self, env: &mut Env) -> Result {
        if !self.is_async {
            self.and_or.execute(env)?;
            trap::run_err_trap(env)?;
            return apply_errexit(env, is_lone_simple_command(&self.and_or));
        }

        // Asynchronous item: the whole and-or list runs in a child.
        let name = item_text(self);
        let mut setup = exec::ChildSetup::default();
        if env.job_control_active() {
            setup.pgid = Some(cjsh_env::Pid::from_raw(0));
        } else {
            // Without job control, background stdin comes from
            // /dev/null so the job cannot steal terminal input.
            if let Ok(fd) = system::open(
                c"/dev/null",
                OFlag::O_RDONLY,
                system::Mode::empty(),
            ) {
                setup.stdin = Some(fd);
            }
        }
        let and_or = std::rc::Rc::clone(&self.and_or);
        let result = exec::fork_child(env, &setup, move |env| {
            match and_or.execute(env) {
                std::ops::ControlFlow::Continue(()) => env.exit_status,
                std::ops::ControlFlow::Break(divert) => {
                    divert.exit_status().unwrap_or(env.exit_status)
                }
            }
        });
        if let Some(fd) = setup.stdin {
            let _ = system::close(fd);
        }
        match result {
            Ok(child) => {
                let mut job = Job::new(child, name);
                job.push_process(child);
                job.is_background = true;
                env.jobs.add(job);
                env.jobs.set_last_async_pid(child);
                env.exit_status = ExitStatus::SUCCESS;
            }
            Err(errno) => {
                eprintln!("cjsh: cannot fork: {errno}");
                env.exit_status = ExitStatus::FAILURE;
            }
        }
        CONTINUE
    }
}

impl Execute for AndOrList {
    fn execute(&self, env: &mut Env) -> Result {
        // Every pipeline but the last is a condition for the next.
        if self.rest.is_empty() {
            return self.first.execute(env);
        }
        run_in_condition(env, |env| self.first.execute(env))?;

        let last = self.rest.len() - 1;
        for (index, (op, pipeline)) in self.rest.iter().enumerate() {
            let run = match op {
                AndOr::AndThen => env.exit_status.is_successful(),
                AndOr::OrElse => !env.exit_status.is_successful(),
            };
            if !run {
                continue;
            }
            if index < last {
                run_in_condition(env, |env| pipeline.execute(env))?;
            } else {
                pipeline.execute(env)?;
            }
        }
        CONTINUE
    }
}

/// Whether the item is a single non-negated simple command, for the
/// relaxed `errexit` severity.
fn is_lone_simple_command(and_or: &AndOrList) -> bool {
    and_or.rest.is_empty()
        && !and_or.first.negation
        && and_or.first.commands.len() == 1
        && matches!(*and_or.first.commands[0], Command::Simple(_))
}

/// Source text of an item, used as the job name.
fn item_text(item: &Item) -> String {
    let chars: Vec<char> = item.location.code.value.chars().collect();
    let range = item.location.range.clone();
    if range.end <= chars.len() {
        chars[range].iter().collect()
    } else {
        item.and_or.first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn run(env: &mut Env, source: &str) -> Result {
        let list = List::from_str(source).unwrap();
        list.execute(env)
    }

    #[test]
    fn and_then_runs_on_success_only() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "true && false").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
        run(&mut env, "false && exitcode 3").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn or_else_runs_on_failure_only() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "false || exitcode 3").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus(3));
        run(&mut env, "true || exitcode 5").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn chains_evaluate_left_to_right() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "false && false || exitcode 7")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus(7));
    }

    #[test]
    fn errexit_skips_and_or_conditions() {
        use cjsh_env::option::{Option::ErrExit, State};
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        env.options.set(ErrExit, State::On);
        // The failure is a condition, so the shell must not exit.
        run(&mut env, "false && true").continue_value().unwrap();
        // An uncaught failure diverts.
        let result = run(&mut env, "false");
        assert!(result.is_break());
    }

    #[test]
    fn lone_simple_command_detection() {
        let list = List::from_str("echo hi").unwrap();
        assert!(is_lone_simple_command(&list.0[0].and_or));
        let list = List::from_str("! echo hi").unwrap();
        assert!(!is_lone_simple_command(&list.0[0].and_or));
        let list = List::from_str("a | b").unwrap();
        assert!(!is_lone_simple_command(&list.0[0].and_or));
        let list = List::from_str("{ a; }").unwrap();
        assert!(!is_lone_simple_command(&list.0[0].and_or));
    }
}
