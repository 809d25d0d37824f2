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

//! Simple command execution
//!
//! After expansion, the first field selects a function, a built-in, or
//! an external command. Built-ins and functions run in the shell
//! process with their redirections applied through a [`RedirGuard`];
//! external commands fork (or replace a pipeline-stage child directly).
//! Preceding assignments are exported for the duration of the call and
//! restored afterwards, except for assignment-only commands, where they
//! persist.

use super::{pipeline, report_error, Execute};
use crate::command_search::{self, Target};
use crate::redir::{apply_in_child, RedirGuard};
use crate::{exec, expansion, trap, xtrace};
use cjsh_env::builtin::Builtin;
use cjsh_env::function::Function;
use cjsh_env::job::Job;
use cjsh_env::option::Option::AllExport;
use cjsh_env::semantics::{Divert, ExitStatus, Field, Result, CONTINUE};
use cjsh_env::system::{self, Errno};
use cjsh_env::variable::Scope;
use cjsh_env::Env;
use cjsh_syntax::syntax::{Command, SimpleCommand};
use std::ffi::CString;
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;

impl Execute for SimpleCommand {
    fn execute(&self, env: &mut Env) -> Result {
        execute_simple(env, self, false)
    }
}

/// Runs the command of a forked pipeline stage and returns the status
/// the child should exit with.
///
/// An external simple command replaces the child process in place, as
/// no shell state must survive it.
pub(crate) fn execute_in_pipeline_stage(env: &mut Env, command: &Command) -> ExitStatus {
    let result = match command {
        Command::Simple(simple) => execute_simple(env, simple, true),
        other => other.execute(env),
    };
    pipeline::stage_status(result, env)
}

fn execute_simple(env: &mut Env, command: &SimpleCommand, exec_in_place: bool) -> Result {
    trap::run_debug_trap(env)?;

    // Substitutions run during expansion update `$?`; start from a
    // clean slate so an assignment-only command reports them.
    let entry_status = env.exit_status;
    env.exit_status = ExitStatus::SUCCESS;
    let fields = match expansion::expand_words(env, &command.words) {
        Ok(fields) => fields,
        Err(error) => {
            report_error(env, &error.to_report(), ExitStatus::FAILURE);
            return CONTINUE;
        }
    };

    if fields.is_empty() {
        return execute_assignments_only(env, command);
    }
    env.exit_status = entry_status;

    let name = fields[0].value.clone();
    match command_search::search(env, &name) {
        Target::Builtin(builtin) => execute_builtin(env, builtin, &name, fields, command),
        Target::Function(function) => execute_function(env, &function, fields, command),
        Target::External { path } => {
            execute_external(env, &path, fields, command, exec_in_place)
        }
        Target::NotFound => {
            eprintln!("cjsh: {name}: command not found");
            env.exit_status = ExitStatus::NOT_FOUND;
            CONTINUE
        }
    }
}

/// `a=b` with no command word: assignments persist; redirections are
/// applied and undone.
fn execute_assignments_only(env: &mut Env, command: &SimpleCommand) -> Result {
    let mut guard = RedirGuard::new(env);
    if let Err(error) = guard.perform_redirs(&command.redirs) {
        drop(guard);
        report_error(env, &error.to_report(), ExitStatus::FAILURE);
        return CONTINUE;
    }

    let scope = if guard.options.is_on(AllExport) {
        Scope::Export
    } else {
        Scope::Shell
    };
    let mut traced = Vec::new();
    for assign in &command.assigns {
        let value = match expansion::expand_word(guard.env(), &assign.value) {
            Ok(field) => field.value,
            Err(error) => {
                drop(guard);
                report_error(env, &error.to_report(), ExitStatus::FAILURE);
                return CONTINUE;
            }
        };
        if let Err(error) = guard.variables.assign(scope, assign.name.clone(), value.clone()) {
            drop(guard);
            eprintln!("cjsh: {error}");
            env.exit_status = ExitStatus::FAILURE;
            return CONTINUE;
        }
        traced.push((assign.name.clone(), value));
    }
    drop(guard);
    xtrace::trace(env, &traced, &[]);
    // `$?` is the last substitution's status, or success.
    CONTINUE
}

/// Temporarily applied command-prefix assignments
struct TempAssigns {
    saved: Vec<(String, Option<String>, bool)>,
}

impl TempAssigns {
    /// Expands and applies assignments, exported for the duration.
    fn apply(
        env: &mut Env,
        command: &SimpleCommand,
    ) -> std::result::Result<(TempAssigns, Vec<(String, String)>), ()> {
        let mut saved = Vec::new();
        let mut traced = Vec::new();
        for assign in &command.assigns {
            let value = match expansion::expand_word(env, &assign.value) {
                Ok(field) => field.value,
                Err(error) => {
                    report_error(env, &error.to_report(), ExitStatus::FAILURE);
                    TempAssigns { saved }.restore(env);
                    return Err(());
                }
            };
            let old = env.variables.get(&assign.name).cloned();
            saved.push((
                assign.name.clone(),
                old.as_ref().and_then(|v| v.value.clone()),
                old.is_some_and(|v| v.exported),
            ));
            if let Err(error) = env
                .variables
                .assign(Scope::Export, assign.name.clone(), value.clone())
            {
                eprintln!("cjsh: {error}");
                env.exit_status = ExitStatus::FAILURE;
                saved.pop();
                TempAssigns { saved }.restore(env);
                return Err(());
            }
            traced.push((assign.name.clone(), value));
        }
        Ok((TempAssigns { saved }, traced))
    }

    /// Puts the previous values back.
    fn restore(self, env: &mut Env) {
        for (name, old_value, was_exported) in self.saved.into_iter().rev() {
            match old_value {
                Some(value) => {
                    let _ = env.variables.assign(Scope::Shell, name.clone(), value);
                    env.variables.set_exported(&name, was_exported);
                }
                None => {
                    let _ = env.variables.unset(&name);
                }
            }
        }
    }
}

fn execute_builtin(
    env: &mut Env,
    builtin: Builtin,
    name: &str,
    fields: Vec<Field>,
    command: &SimpleCommand,
) -> Result {
    let Ok((temp, traced)) = TempAssigns::apply(env, command) else {
        return CONTINUE;
    };
    let mut guard = RedirGuard::new(env);
    if let Err(error) = guard.perform_redirs(&command.redirs) {
        drop(guard);
        temp.restore(env);
        report_error(env, &error.to_report(), ExitStatus::FAILURE);
        return CONTINUE;
    }
    xtrace::trace(guard.env(), &traced, &fields);

    let args = fields.into_iter().skip(1).collect();
    let result = (builtin.execute)(guard.env(), args);

    // `exec` with no operands makes its redirections permanent.
    if name == "exec" && result.divert.is_none() && result.exit_status.is_successful() {
        guard.preserve_redirs();
    }
    drop(guard);
    temp.restore(env);

    env.exit_status = result.exit_status;
    match result.divert {
        Some(divert) => ControlFlow::Break(divert),
        None => CONTINUE,
    }
}

fn execute_function(
    env: &mut Env,
    function: &Rc<Function>,
    fields: Vec<Field>,
    command: &SimpleCommand,
) -> Result {
    let Ok((temp, traced)) = TempAssigns::apply(env, command) else {
        return CONTINUE;
    };
    let mut guard = RedirGuard::new(env);
    if let Err(error) = guard.perform_redirs(&command.redirs) {
        drop(guard);
        temp.restore(env);
        report_error(env, &error.to_report(), ExitStatus::FAILURE);
        return CONTINUE;
    }
    xtrace::trace(guard.env(), &traced, &fields);

    let args: Vec<String> = fields.into_iter().skip(1).map(|f| f.value).collect();
    guard.variables.push_context(args);
    guard.call_depth += 1;
    let saved_loop_depth = guard.loop_depth;
    guard.loop_depth = 0;

    let result = function.body.execute(guard.env());

    guard.loop_depth = saved_loop_depth;
    guard.call_depth -= 1;
    guard.variables.pop_context();

    let result = match result {
        ControlFlow::Break(Divert::Return(status)) => {
            if let Some(status) = status {
                guard.exit_status = status;
            }
            trap::run_return_trap(guard.env())
        }
        ControlFlow::Continue(()) => trap::run_return_trap(guard.env()),
        other => other,
    };
    drop(guard);
    temp.restore(env);
    result
}

fn execute_external(
    env: &mut Env,
    path: &Path,
    fields: Vec<Field>,
    command: &SimpleCommand,
    exec_in_place: bool,
) -> Result {
    if exec_in_place {
        // Forked pipeline stage: no shell state outlives this process.
        let Ok((_temp, traced)) = TempAssigns::apply(env, command) else {
            return CONTINUE;
        };
        if let Err(error) = apply_in_child(env, &command.redirs) {
            report_error(env, &error.to_report(), ExitStatus::FAILURE);
            return CONTINUE;
        }
        xtrace::trace(env, &traced, &fields);
        env.exit_status = exec_image(env, path, &fields);
        return CONTINUE;
    }

    let name = fields
        .iter()
        .map(|f| f.value.clone())
        .collect::<Vec<_>>()
        .join(" ");
    let setup = exec::ChildSetup {
        pgid: env
            .job_control_active()
            .then(|| cjsh_env::Pid::from_raw(0)),
        ..exec::ChildSetup::default()
    };
    let command_clone = command.clone();
    let fields_clone = fields.clone();
    let path_clone = path.to_path_buf();
    let forked = exec::fork_child(env, &setup, move |env| {
        if TempAssigns::apply(env, &command_clone).is_err() {
            return ExitStatus::FAILURE;
        }
        if let Err(error) = apply_in_child(env, &command_clone.redirs) {
            report_error(env, &error.to_report(), ExitStatus::FAILURE);
            return ExitStatus::FAILURE;
        }
        exec_image(env, &path_clone, &fields_clone)
    });

    match forked {
        Ok(child) => {
            xtrace::trace(env, &[], &fields);
            let mut job = Job::new(child, name);
            job.push_process(child);
            let index = env.jobs.add(job);
            let status = exec::wait_for_foreground(env, index);
            if env.jobs.get(index).is_some_and(Job::is_finished) {
                env.jobs.remove(index);
            }
            env.exit_status = status;
        }
        Err(errno) => {
            eprintln!("cjsh: cannot fork: {errno}");
            env.exit_status = ExitStatus::FAILURE;
        }
    }
    CONTINUE
}

/// Replaces the process image; returns the failure status if exec
/// fails.
fn exec_image(env: &mut Env, path: &Path, fields: &[Field]) -> ExitStatus {
    use std::os::unix::ffi::OsStrExt;
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        eprintln!("cjsh: {}: invalid path", path.display());
        return ExitStatus::EXEC_ERROR;
    };
    let args: Vec<CString> = match fields
        .iter()
        .map(|f| CString::new(f.value.as_bytes()))
        .collect()
    {
        Ok(args) => args,
        Err(_) => {
            eprintln!("cjsh: argument contains NUL byte");
            return ExitStatus::EXEC_ERROR;
        }
    };
    let environ = env.variables.environ();
    let errno = system::execve(&c_path, &args, &environ);
    let status = match errno {
        Errno::ENOENT | Errno::ENOTDIR => ExitStatus::NOT_FOUND,
        Errno::EACCES | Errno::ENOEXEC => ExitStatus::NOT_EXECUTABLE,
        _ => ExitStatus::EXEC_ERROR,
    };
    let message = match status {
        ExitStatus::NOT_FOUND => "command not found".to_string(),
        ExitStatus::NOT_EXECUTABLE => "cannot execute".to_string(),
        _ => errno.to_string(),
    };
    eprintln!("cjsh: {}: {message}", path.display());
    status
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
    fn assignment_only_commands_persist() {
        let mut env = Env::new();
        run(&mut env, "X=hello").continue_value().unwrap();
        assert_eq!(env.variables.value_of("X"), Some("hello"));
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn assignment_values_are_expanded() {
        let mut env = Env::new();
        run(&mut env, "A=1 B=${A}2").continue_value().unwrap();
        assert_eq!(env.variables.value_of("B"), Some("12"));
    }

    #[test]
    fn readonly_assignment_fails_without_divert() {
        let mut env = Env::new();
        run(&mut env, "R=1").continue_value().unwrap();
        env.variables.mark_readonly("R");
        run(&mut env, "R=2").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
        assert_eq!(env.variables.value_of("R"), Some("1"));
    }

    #[test]
    fn temporary_assignments_are_restored_after_builtins() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "V=outer").continue_value().unwrap();
        run(&mut env, "V=inner true").continue_value().unwrap();
        assert_eq!(env.variables.value_of("V"), Some("outer"));
        assert!(!env.variables.get("V").unwrap().exported);
        run(&mut env, "W=only-here true").continue_value().unwrap();
        assert_eq!(env.variables.value_of("W"), None);
    }

    #[test]
    fn command_not_found_is_127() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "PATH", "/nonexistent-dir-for-test")
            .unwrap();
        run(&mut env, "definitely-no-such-command")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::NOT_FOUND);
    }

    #[test]
    fn function_call_binds_positional_params() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "f() { setvar first $1; setvar count $#; }")
            .continue_value()
            .unwrap();
        run(&mut env, "f alpha beta").continue_value().unwrap();
        assert_eq!(env.variables.value_of("first"), Some("alpha"));
        assert_eq!(env.variables.value_of("count"), Some("2"));
        // The caller's positional parameters are untouched.
        assert_eq!(env.variables.positional_params().len(), 0);
    }

    #[test]
    fn function_locals_do_not_leak() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        // Plain assignment in a function writes the base table.
        run(&mut env, "f() { setvar x inner; }; x=outer; f")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("x"), Some("inner"));
        assert_eq!(env.variables.context_count(), 0);
    }

    #[test]
    fn builtin_divert_propagates() {
        let mut env = Env::new();
        env.builtins.insert(
            "ret",
            Builtin {
                kind: cjsh_env::builtin::Kind::Special,
                execute: |_, _| cjsh_env::builtin::Result::with_divert(
                    ExitStatus(4),
                    Divert::Return(Some(ExitStatus(4))),
                ),
            },
        );
        let result = run(&mut env, "ret");
        assert_eq!(
            result,
            ControlFlow::Break(Divert::Return(Some(ExitStatus(4))))
        );
    }

    #[test]
    fn function_consumes_return_divert() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        env.builtins.insert(
            "ret4",
            Builtin {
                kind: cjsh_env::builtin::Kind::Special,
                execute: |_, _| cjsh_env::builtin::Result::with_divert(
                    ExitStatus(4),
                    Divert::Return(Some(ExitStatus(4))),
                ),
            },
        );
        run(&mut env, "f() { ret4; setvar not reached; }; f")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus(4));
        assert_eq!(env.variables.value_of("not"), None);
    }

    #[test]
    fn expansion_error_fails_the_command() {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        run(&mut env, "true ${x:?boom}").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
    }
}
