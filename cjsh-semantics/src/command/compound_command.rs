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

//! Compound command execution

use super::{cond, report_error, run_in_compound_body, run_in_condition, Execute};
use crate::expansion::initial::arith;
use crate::redir::RedirGuard;
use crate::{exec, expansion, trap};
use cjsh_env::job::Job;
use cjsh_env::semantics::{Divert, ExitStatus, Field, Result, CONTINUE};
use cjsh_env::variable::Scope;
use cjsh_env::Env;
use cjsh_fnmatch::{Config, Pattern};
use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::{
    ArithForControl, CaseItem, CompoundCommand, ElifThen, FullCompoundCommand, List, Word,
};
use std::ops::ControlFlow;

impl Execute for FullCompoundCommand {
    fn execute(&self, env: &mut Env) -> Result {
        if self.redirs.is_empty() {
            return self.command.execute(env);
        }
        let mut guard = RedirGuard::new(env);
        if let Err(error) = guard.perform_redirs(&self.redirs) {
            drop(guard);
            report_error(env, &error.to_report(), ExitStatus::FAILURE);
            return CONTINUE;
        }
        self.command.execute(guard.env())
    }
}

impl Execute for CompoundCommand {
    fn execute(&self, env: &mut Env) -> Result {
        use CompoundCommand::*;
        match self {
            Grouping(body) => run_in_compound_body(env, |env| body.execute(env)),
            Subshell(body) => execute_subshell(env, body, self.to_string()),
            For { name, values, body } => execute_for(env, name, values.as_deref(), body),
            Select { name, values, body } => execute_select(env, name, values.as_deref(), body),
            ArithFor { control, body } => execute_arith_for(env, control, body),
            While { condition, body } => execute_loop(env, condition, body, true),
            Until { condition, body } => execute_loop(env, condition, body, false),
            If { branches, r#else } => execute_if(env, branches, r#else.as_ref()),
            Case { subject, items } => execute_case(env, subject, items),
            DoubleBracket(expr) => match cond::eval(env, expr) {
                Ok(true) => {
                    env.exit_status = ExitStatus::SUCCESS;
                    CONTINUE
                }
                Ok(false) => {
                    env.exit_status = ExitStatus::FAILURE;
                    CONTINUE
                }
                Err(error) => {
                    report_error(env, &error.to_report(), ExitStatus::ERROR);
                    CONTINUE
                }
            },
            Arith { expr } => {
                match arith::eval_text(env, expr, &Location::dummy(expr.to_string())) {
                    Ok(Some(value)) => {
                        env.exit_status = if value != 0 {
                            ExitStatus::SUCCESS
                        } else {
                            ExitStatus::FAILURE
                        };
                    }
                    Ok(None) => env.exit_status = ExitStatus::FAILURE,
                    Err(error) => {
                        report_error(env, &error.to_report(), ExitStatus::FAILURE);
                    }
                }
                CONTINUE
            }
        }
    }
}

/// Outcome of one loop body run
enum AfterBody {
    Normal,
    BreakLoop,
    ContinueLoop,
}

/// Runs a loop body, translating `break`/`continue` diverts addressed
/// at this loop and passing outer-addressed ones through.
fn run_body(env: &mut Env, body: &List) -> ControlFlow<Divert, AfterBody> {
    match run_in_compound_body(env, |env| body.execute(env)) {
        ControlFlow::Continue(()) => ControlFlow::Continue(AfterBody::Normal),
        ControlFlow::Break(Divert::Break { count: 0 }) => {
            ControlFlow::Continue(AfterBody::BreakLoop)
        }
        ControlFlow::Break(Divert::Break { count }) => {
            ControlFlow::Break(Divert::Break { count: count - 1 })
        }
        ControlFlow::Break(Divert::Continue { count: 0 }) => {
            ControlFlow::Continue(AfterBody::ContinueLoop)
        }
        ControlFlow::Break(Divert::Continue { count }) => {
            ControlFlow::Break(Divert::Continue { count: count - 1 })
        }
        ControlFlow::Break(divert) => ControlFlow::Break(divert),
    }
}

fn execute_subshell(env: &mut Env, body: &List, name: String) -> Result {
    let setup = exec::ChildSetup {
        pgid: env
            .job_control_active()
            .then(|| cjsh_env::Pid::from_raw(0)),
        ..exec::ChildSetup::default()
    };
    let body = body.clone();
    let forked = exec::fork_child(env, &setup, move |env| {
        match body.execute(env) {
            ControlFlow::Continue(()) => env.exit_status,
            ControlFlow::Break(divert) => divert.exit_status().unwrap_or(env.exit_status),
        }
    });
    match forked {
        Ok(child) => {
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

fn execute_for(
    env: &mut Env,
    name: &Word,
    values: Option<&[Word]>,
    body: &List,
) -> Result {
    let Some(var_name) = name.to_string_if_literal() else {
        eprintln!("cjsh: invalid for-loop variable name");
        env.exit_status = ExitStatus::ERROR;
        return CONTINUE;
    };
    let fields: Vec<Field> = match values {
        Some(words) => match expansion::expand_words(env, words) {
            Ok(fields) => fields,
            Err(error) => {
                report_error(env, &error.to_report(), ExitStatus::FAILURE);
                return CONTINUE;
            }
        },
        // `for x; do …` iterates over "$@".
        None => env
            .variables
            .positional_params()
            .to_vec()
            .into_iter()
            .map(Field::dummy)
            .collect(),
    };

    env.exit_status = ExitStatus::SUCCESS;
    env.loop_depth += 1;
    let result = for_iterations(env, &var_name, fields, body);
    env.loop_depth -= 1;
    result
}

fn for_iterations(
    env: &mut Env,
    var_name: &str,
    fields: Vec<Field>,
    body: &List,
) -> Result {
    for field in fields {
        trap::drain_signals(env)?;
        if let Err(error) = env
            .variables
            .assign(Scope::Shell, var_name, field.value)
        {
            eprintln!("cjsh: {error}");
            env.exit_status = ExitStatus::FAILURE;
            return CONTINUE;
        }
        match run_body(env, body)? {
            AfterBody::Normal | AfterBody::ContinueLoop => {}
            AfterBody::BreakLoop => break,
        }
    }
    CONTINUE
}

/// `select`: print a numbered menu on stderr, read a choice, set the
/// loop variable, and run the body until end of input or `break`.
fn execute_select(
    env: &mut Env,
    name: &Word,
    values: Option<&[Word]>,
    body: &List,
) -> Result {
    let Some(var_name) = name.to_string_if_literal() else {
        eprintln!("cjsh: invalid select variable name");
        env.exit_status = ExitStatus::ERROR;
        return CONTINUE;
    };
    let fields: Vec<Field> = match values {
        Some(words) => match expansion::expand_words(env, words) {
            Ok(fields) => fields,
            Err(error) => {
                report_error(env, &error.to_report(), ExitStatus::FAILURE);
                return CONTINUE;
            }
        },
        None => env
            .variables
            .positional_params()
            .to_vec()
            .into_iter()
            .map(Field::dummy)
            .collect(),
    };
    if fields.is_empty() {
        env.exit_status = ExitStatus::SUCCESS;
        return CONTINUE;
    }

    env.exit_status = ExitStatus::SUCCESS;
    env.loop_depth += 1;
    let result = select_iterations(env, &var_name, &fields, body);
    env.loop_depth -= 1;
    result
}

fn select_iterations(
    env: &mut Env,
    var_name: &str,
    fields: &[Field],
    body: &List,
) -> Result {
    use std::io::BufRead as _;
    let stdin = std::io::stdin();
    let mut need_menu = true;
    loop {
        trap::drain_signals(env)?;
        if need_menu {
            for (index, field) in fields.iter().enumerate() {
                eprintln!("{}) {}", index + 1, field.value);
            }
            need_menu = false;
        }
        let prompt = env
            .variables
            .value_of("PS3")
            .unwrap_or("#? ")
            .to_string();
        eprint!("{prompt}");
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let reply = line.trim();
        if reply.is_empty() {
            need_menu = true;
            continue;
        }
        let _ = env
            .variables
            .assign(Scope::Shell, "REPLY", reply.to_string());
        let chosen = reply
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| fields.get(i))
            .map_or(String::new(), |field| field.value.clone());
        if let Err(error) = env.variables.assign(Scope::Shell, var_name, chosen) {
            eprintln!("cjsh: {error}");
            env.exit_status = ExitStatus::FAILURE;
            return CONTINUE;
        }
        match run_body(env, body)? {
            AfterBody::Normal | AfterBody::ContinueLoop => {}
            AfterBody::BreakLoop => break,
        }
    }
    CONTINUE
}

fn execute_arith_for(env: &mut Env, control: &ArithForControl, body: &List) -> Result {
    let location = Location::dummy("((…))");
    if let Err(error) = arith::eval_text(env, &control.init, &location) {
        report_error(env, &error.to_report(), ExitStatus::FAILURE);
        return CONTINUE;
    }
    env.exit_status = ExitStatus::SUCCESS;
    env.loop_depth += 1;
    let result = arith_for_iterations(env, control, body, &location);
    env.loop_depth -= 1;
    result
}

fn arith_for_iterations(
    env: &mut Env,
    control: &ArithForControl,
    body: &List,
    location: &Location,
) -> Result {
    loop {
        trap::drain_signals(env)?;
        // A blank condition is true.
        match arith::eval_text(env, &control.condition, location) {
            Ok(Some(0)) => break,
            Ok(_) => {}
            Err(error) => {
                report_error(env, &error.to_report(), ExitStatus::FAILURE);
                return CONTINUE;
            }
        }
        match run_body(env, body)? {
            AfterBody::Normal | AfterBody::ContinueLoop => {}
            AfterBody::BreakLoop => break,
        }
        if let Err(error) = arith::eval_text(env, &control.step, location) {
            report_error(env, &error.to_report(), ExitStatus::FAILURE);
            return CONTINUE;
        }
    }
    CONTINUE
}

fn execute_loop(env: &mut Env, condition: &List, body: &List, is_while: bool) -> Result {
    let mut last_body_status = ExitStatus::SUCCESS;
    env.loop_depth += 1;
    let result = (|| {
        loop {
            trap::drain_signals(env)?;
            run_in_condition(env, |env| condition.execute(env))?;
            if env.exit_status.is_successful() != is_while {
                break;
            }
            match run_body(env, body)? {
                AfterBody::Normal | AfterBody::ContinueLoop => {
                    last_body_status = env.exit_status;
                }
                AfterBody::BreakLoop => {
                    last_body_status = env.exit_status;
                    break;
                }
            }
        }
        CONTINUE
    })();
    env.loop_depth -= 1;
    env.exit_status = last_body_status;
    result
}

fn execute_if(env: &mut Env, branches: &[ElifThen], r#else: Option<&List>) -> Result {
    for branch in branches {
        run_in_condition(env, |env| branch.condition.execute(env))?;
        if env.exit_status.is_successful() {
            return run_in_compound_body(env, |env| branch.body.execute(env));
        }
    }
    match r#else {
        Some(body) => run_in_compound_body(env, |env| body.execute(env)),
        None => {
            env.exit_status = ExitStatus::SUCCESS;
            CONTINUE
        }
    }
}

fn execute_case(env: &mut Env, subject: &Word, items: &[CaseItem]) -> Result {
    let subject = match expansion::expand_word(env, subject) {
        Ok(field) => field.value,
        Err(error) => {
            report_error(env, &error.to_report(), ExitStatus::FAILURE);
            return CONTINUE;
        }
    };

    env.exit_status = ExitStatus::SUCCESS;
    let mut fall_through = false;
    let mut index = 0;
    while index < items.len() {
        let item = &items[index];
        let selected = fall_through || {
            match item_matches(env, item, &subject) {
                Ok(matched) => matched,
                Err(error) => {
                    report_error(env, &error.to_report(), ExitStatus::FAILURE);
                    return CONTINUE;
                }
            }
        };
        if !selected {
            index += 1;
            continue;
        }
        run_in_compound_body(env, |env| item.body.execute(env))?;
        match item.continuation {
            cjsh_syntax::syntax::CaseContinuation::Break => break,
            cjsh_syntax::syntax::CaseContinuation::FallThrough => {
                fall_through = true;
                index += 1;
            }
            cjsh_syntax::syntax::CaseContinuation::Continue => {
                fall_through = false;
                index += 1;
            }
        }
    }
    CONTINUE
}

fn item_matches(
    env: &mut Env,
    item: &CaseItem,
    subject: &str,
) -> std::result::Result<bool, expansion::Error> {
    for pattern_word in &item.patterns {
        let chars = expansion::expand_pattern_chars(env, pattern_word)?;
        let pattern = match Pattern::parse(chars, &Config::default()) {
            Ok(pattern) => pattern,
            Err(error) => {
                return Err(expansion::Error {
                    cause: expansion::ErrorCause::Pattern {
                        message: error.to_string(),
                    },
                    location: pattern_word.location.clone(),
                })
            }
        };
        if pattern.is_match(subject) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn run(env: &mut Env, source: &str) -> Result {
        let list = List::from_str(source).unwrap();
        list.execute(env)
    }

    fn test_env() -> Env {
        let mut env = Env::new();
        crate::tests::install_test_builtins(&mut env);
        env
    }

    #[test]
    fn grouping_runs_in_current_environment() {
        let mut env = test_env();
        run(&mut env, "{ setvar g 1; }").continue_value().unwrap();
        assert_eq!(env.variables.value_of("g"), Some("1"));
    }

    #[test]
    fn if_branches() {
        let mut env = test_env();
        run(&mut env, "if true; then setvar b then; else setvar b else; fi")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("b"), Some("then"));
        run(&mut env, "if false; then setvar c then; else setvar c else; fi")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("c"), Some("else"));
        // No else and no match: status 0.
        env.exit_status = ExitStatus(9);
        run(&mut env, "if false; then setvar d x; fi")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn elif_chain() {
        let mut env = test_env();
        run(
            &mut env,
            "if false; then setvar e 1; elif true; then setvar e 2; else setvar e 3; fi",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("e"), Some("2"));
    }

    #[test]
    fn for_loop_iterates_and_leaves_status() {
        let mut env = test_env();
        run(&mut env, "for i in a b c; do setvar last $i; done")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("last"), Some("c"));
        assert_eq!(env.variables.value_of("i"), Some("c"));
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn for_loop_over_empty_list_is_success() {
        let mut env = test_env();
        env.exit_status = ExitStatus(7);
        run(&mut env, "for i in; do exitcode 9; done")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn for_loop_defaults_to_positional_params() {
        let mut env = test_env();
        env.variables
            .set_positional_params(vec!["p1".to_string(), "p2".to_string()]);
        run(&mut env, "for arg; do setvar seen $arg; done")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("seen"), Some("p2"));
    }

    #[test]
    fn while_loop_with_arithmetic() {
        let mut env = test_env();
        run(
            &mut env,
            "n=0; s=0; while ((n < 5)); do s=$((s+n)); n=$((n+1)); done",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("s"), Some("10"));
    }

    #[test]
    fn until_loop() {
        let mut env = test_env();
        run(&mut env, "n=0; until ((n >= 3)); do n=$((n+1)); done")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("n"), Some("3"));
    }

    #[test]
    fn loop_with_false_condition_has_status_zero() {
        let mut env = test_env();
        env.exit_status = ExitStatus(4);
        run(&mut env, "while false; do exitcode 9; done")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn break_and_continue_diverts() {
        let mut env = test_env();
        env.builtins.insert(
            "brk",
            cjsh_env::builtin::Builtin {
                kind: cjsh_env::builtin::Kind::Special,
                execute: |_, _| cjsh_env::builtin::Result::with_divert(
                    ExitStatus::SUCCESS,
                    Divert::Break { count: 0 },
                ),
            },
        );
        run(&mut env, "for i in 1 2 3; do setvar seen $i; brk; done")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("seen"), Some("1"));
    }

    #[test]
    fn break_of_outer_loop_unwinds_both() {
        let mut env = test_env();
        env.builtins.insert(
            "brk2",
            cjsh_env::builtin::Builtin {
                kind: cjsh_env::builtin::Kind::Special,
                execute: |_, _| cjsh_env::builtin::Result::with_divert(
                    ExitStatus::SUCCESS,
                    Divert::Break { count: 1 },
                ),
            },
        );
        run(
            &mut env,
            "for o in a b; do for i in 1 2; do brk2; done; setvar inner ran; done",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("inner"), None);
        assert_eq!(env.variables.value_of("o"), Some("a"));
    }

    #[test]
    fn c_style_for() {
        let mut env = test_env();
        run(
            &mut env,
            "s=0; for ((i = 1; i <= 5; i++)); do s=$((s+i)); done",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("s"), Some("15"));
        assert_eq!(env.variables.value_of("i"), Some("6"));
    }

    #[test]
    fn case_matches_first_pattern() {
        let mut env = test_env();
        run(
            &mut env,
            "case abc in x) setvar m x;; a*) setvar m glob;; *) setvar m any;; esac",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("m"), Some("glob"));
    }

    #[test]
    fn case_without_match_is_success() {
        let mut env = test_env();
        env.exit_status = ExitStatus(3);
        run(&mut env, "case x in a) exitcode 9;; esac")
            .continue_value()
            .unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn case_fall_through_and_retest() {
        let mut env = test_env();
        // `;&` falls into the next body; `;;&` retests patterns.
        run(
            &mut env,
            "case abc in a*) setvar one yes;;& *c) setvar two yes;; *) setvar three yes;; esac",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("one"), Some("yes"));
        assert_eq!(env.variables.value_of("two"), Some("yes"));
        assert_eq!(env.variables.value_of("three"), None);

        let mut env = test_env();
        run(
            &mut env,
            "case a in a) setvar one yes;& b) setvar two yes;; c) setvar three yes;; esac",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("one"), Some("yes"));
        assert_eq!(env.variables.value_of("two"), Some("yes"));
        assert_eq!(env.variables.value_of("three"), None);
    }

    #[test]
    fn case_quoted_pattern_is_literal() {
        let mut env = test_env();
        run(&mut env, "case '*' in '*') setvar lit yes;; esac")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("lit"), Some("yes"));
        let mut env = test_env();
        run(&mut env, "case x in '*') setvar lit yes;; esac")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("lit"), None);
    }

    #[test]
    fn arith_command_status() {
        let mut env = test_env();
        run(&mut env, "((1))").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::SUCCESS);
        run(&mut env, "((0))").continue_value().unwrap();
        assert_eq!(env.exit_status, ExitStatus::FAILURE);
        run(&mut env, "((x = 42))").continue_value().unwrap();
        assert_eq!(env.variables.value_of("x"), Some("42"));
    }

    #[test]
    fn for_loop_over_brace_range_sums() {
        let mut env = test_env();
        run(&mut env, "s=0; for i in {1..5}; do s=$((s+i)); done")
            .continue_value()
            .unwrap();
        assert_eq!(env.variables.value_of("s"), Some("15"));
    }

    #[test]
    fn function_with_local_shadows_then_restores() {
        let mut env = test_env();
        env.builtins.insert(
            "local",
            cjsh_env::builtin::Builtin {
                kind: cjsh_env::builtin::Kind::Special,
                execute: |env, args: Vec<Field>| {
                    for arg in &args {
                        let (name, value) =
                            arg.value.split_once('=').unwrap_or((arg.value.as_str(), ""));
                        let _ = env.variables.assign(Scope::Local, name, value);
                    }
                    cjsh_env::semantics::ExitStatus::SUCCESS.into()
                },
            },
        );
        run(
            &mut env,
            "f() { local x=1; x=$((x+1)); setvar seen $x; }; x=outer; f",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("seen"), Some("2"));
        assert_eq!(env.variables.value_of("x"), Some("outer"));
    }

    #[test]
    fn nested_loops_with_depths() {
        let mut env = test_env();
        run(
            &mut env,
            "for a in 1 2; do for b in 1 2; do setvar pair $a$b; done; done",
        )
        .continue_value()
        .unwrap();
        assert_eq!(env.variables.value_of("pair"), Some("22"));
        assert_eq!(env.loop_depth, 0);
    }
}
