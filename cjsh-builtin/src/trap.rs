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

//! The `trap` built-in
//!
//! ```sh
//! trap                     # list non-default traps
//! trap 'cleanup' EXIT INT  # bind an action
//! trap '' TERM             # ignore
//! trap - INT               # reset to default
//! ```
//!
//! Setting a signal trap also adjusts the process disposition so that
//! the flag-setting handler is installed exactly when needed.

use crate::common::usage_error;
use cjsh_env::builtin::Result;
use cjsh_env::option::Option::Interactive;
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::trap::{Action, Condition};
use cjsh_env::{signal, Env};
use nix::sys::signal::Signal;

/// Signals an interactive shell keeps routed into the pending bitmap
/// regardless of traps.
const INTERACTIVE_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGTERM,
    Signal::SIGHUP,
    Signal::SIGCHLD,
    Signal::SIGWINCH,
];

fn apply_disposition(env: &Env, signal: Signal, action: &Action) {
    // SIGKILL and SIGSTOP cannot be caught; the table entry is enough.
    if matches!(signal, Signal::SIGKILL | Signal::SIGSTOP) {
        return;
    }
    let result = match action {
        Action::Command(_) => signal::catch(signal),
        Action::Ignore => signal::ignore(signal),
        Action::Default => {
            if env.options.is_on(Interactive) && INTERACTIVE_SIGNALS.contains(&signal) {
                signal::catch(signal)
            } else if signal::JOB_CONTROL_SIGNALS.contains(&signal)
                && env.options.is_on(Interactive)
            {
                signal::ignore(signal)
            } else {
                signal::default(signal)
            }
        }
    };
    if let Err(errno) = result {
        eprintln!("cjsh: trap: cannot set disposition: {errno}");
    }
}

fn list_traps(env: &Env) {
    for (condition, action) in env.traps.iter() {
        match action {
            Action::Ignore => println!("trap -- '' {condition}"),
            Action::Command(text) => println!("trap -- '{text}' {condition}"),
            Action::Default => {}
        }
    }
}

/// Entry point of the `trap` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.is_empty() {
        list_traps(env);
        return ExitStatus::SUCCESS.into();
    }

    // `trap - SIGS…` and `trap SIGS…` (all condition names) reset.
    let (action_text, conditions): (Option<&str>, &[Field]) = if args[0].value == "-" {
        (None, &args[1..])
    } else if args
        .iter()
        .all(|f| Condition::parse(&f.value).is_some())
    {
        (None, &args[..])
    } else {
        (Some(args[0].value.as_str()), &args[1..])
    };

    if conditions.is_empty() {
        return usage_error("trap", "condition operand is missing");
    }

    let action = match action_text {
        None => Action::Default,
        Some("") => Action::Ignore,
        Some(text) => Action::Command(text.into()),
    };

    for condition in conditions {
        let Some(condition) = Condition::parse(&condition.value) else {
            return usage_error(
                "trap",
                format_args!("{}: no such signal or event", condition.value),
            );
        };
        env.traps.set(condition, action.clone());
        if let Condition::Signal(signal) = condition {
            apply_disposition(env, signal, &action);
        }
    }
    ExitStatus::SUCCESS.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_and_lists_actions() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["echo bye", "EXIT"]));
        assert_eq!(
            env.traps.command(Condition::Exit).as_deref(),
            Some("echo bye")
        );
    }

    #[test]
    fn empty_action_ignores() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["", "TERM"]));
        assert!(env.traps.is_ignored(Signal::SIGTERM));
    }

    #[test]
    fn dash_resets() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["x", "INT"]));
        main(&mut env, Field::dummies(["-", "INT"]));
        assert_eq!(
            *env.traps.get(Condition::Signal(Signal::SIGINT)),
            Action::Default
        );
    }

    #[test]
    fn bare_condition_names_reset() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["x", "INT", "TERM"]));
        main(&mut env, Field::dummies(["INT", "TERM"]));
        assert_eq!(
            *env.traps.get(Condition::Signal(Signal::SIGINT)),
            Action::Default
        );
        assert_eq!(
            *env.traps.get(Condition::Signal(Signal::SIGTERM)),
            Action::Default
        );
    }

    #[test]
    fn multiple_conditions_one_action() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["c", "EXIT", "HUP"]));
        assert!(env.traps.command(Condition::Exit).is_some());
        assert!(env
            .traps
            .command(Condition::Signal(Signal::SIGHUP))
            .is_some());
    }

    #[test]
    fn unknown_condition_is_usage_error() {
        let mut env = Env::new();
        assert_eq!(
            main(&mut env, Field::dummies(["x", "WOMBAT"])).exit_status,
            ExitStatus::ERROR
        );
    }

    #[test]
    fn missing_condition_is_usage_error() {
        let mut env = Env::new();
        assert_eq!(
            main(&mut env, Field::dummies(["action-only"])).exit_status,
            ExitStatus::ERROR
        );
    }
}
