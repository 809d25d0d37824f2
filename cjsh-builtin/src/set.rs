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

//! The `set` built-in
//!
//! Toggles shell options and replaces the positional parameters.
//!
//! ```sh
//! set -e -o pipefail
//! set +x
//! set -o              # print option states
//! set --errexit-severity=strict
//! set -- a b c        # replace positional parameters
//! set                 # print variables
//! ```

use crate::common::usage_error;
use cjsh_env::builtin::Result;
use cjsh_env::option::{ErrexitSeverity, Option as ShellOption, State};
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::Env;

fn print_variables(env: &Env) {
    for (name, variable) in env.variables.iter_visible() {
        if let Some(value) = &variable.value {
            println!("{name}={value}");
        }
    }
}

fn print_options(env: &Env) {
    for (option, state) in env.options.iter() {
        let state = match state {
            State::On => "on",
            State::Off => "off",
        };
        println!("{:<16}{state}", option.long_name());
    }
    println!("{:<16}{}", "errexit-severity", env.options.errexit_severity);
}

fn set_option(env: &mut Env, option: ShellOption, state: State) -> std::result::Result<(), Result> {
    if !option.is_modifiable() {
        return Err(usage_error(
            "set",
            format_args!("{}: option cannot be changed", option.long_name()),
        ));
    }
    env.options.set(option, state);
    Ok(())
}

/// Extracts the value of a `--errexit-severity=LEVEL` argument.
fn errexit_severity_value(text: &str) -> Option<&str> {
    let rest = text
        .strip_prefix("--errexit-severity")
        .or_else(|| text.strip_prefix("--errexit_severity"))?;
    rest.strip_prefix('=')
}

/// Entry point of the `set` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    if args.is_empty() {
        print_variables(env);
        return ExitStatus::SUCCESS.into();
    }

    let mut iter = args.iter().peekable();
    while let Some(field) = iter.peek() {
        let text = field.value.as_str();
        match text {
            "--" => {
                iter.next();
                break;
            }
            "-o" | "+o" => {
                let enable = text == "-o";
                iter.next();
                let Some(name) = iter.next() else {
                    print_options(env);
                    return ExitStatus::SUCCESS.into();
                };
                // `-o errexit-severity=LEVEL` rides along here.
                if let Some((key, value)) = name.value.split_once('=') {
                    if key.replace('-', "_") == "errexit_severity" {
                        return set_severity(env, value);
                    }
                }
                let Some((option, state)) = ShellOption::from_long(&name.value) else {
                    return usage_error("set", format_args!("{}: no such option", name.value));
                };
                let state = if enable { state } else { !state };
                if let Err(error) = set_option(env, option, state) {
                    return error;
                }
            }
            _ if errexit_severity_value(text).is_some() => {
                let value = errexit_severity_value(text).unwrap();
                iter.next();
                return set_severity(env, value);
            }
            _ if text.len() > 1 && (text.starts_with('-') || text.starts_with('+')) => {
                let enable = text.starts_with('-');
                for letter in text.chars().skip(1) {
                    let Some((option, state)) = ShellOption::from_short(letter) else {
                        return usage_error("set", format_args!("-{letter}: no such option"));
                    };
                    let state = if enable { state } else { !state };
                    if let Err(error) = set_option(env, option, state) {
                        return error;
                    }
                }
                iter.next();
            }
            // A lone `-` also ends option processing.
            "-" => {
                iter.next();
                break;
            }
            _ => break,
        }
    }

    let rest: Vec<Field> = iter.cloned().collect();
    if !rest.is_empty() || args.last().is_some_and(|f| f.value == "--") {
        env.variables
            .set_positional_params(rest.into_iter().map(|f| f.value).collect());
    }
    ExitStatus::SUCCESS.into()
}

fn set_severity(env: &mut Env, value: &str) -> Result {
    match value.parse::<ErrexitSeverity>() {
        Ok(severity) => {
            env.options.errexit_severity = severity;
            ExitStatus::SUCCESS.into()
        }
        Err(()) => usage_error(
            "set",
            format_args!("{value}: invalid errexit severity (strict, default, relaxed)"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::option::Option::{Clobber, ErrExit, PipeFail, XTrace};

    #[test]
    fn short_options_toggle() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["-e", "-x"]));
        assert!(env.options.is_on(ErrExit));
        assert!(env.options.is_on(XTrace));
        main(&mut env, Field::dummies(["+e"]));
        assert!(!env.options.is_on(ErrExit));
    }

    #[test]
    fn negative_polarity_short_options() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["-C"]));
        assert!(!env.options.is_on(Clobber));
        main(&mut env, Field::dummies(["+C"]));
        assert!(env.options.is_on(Clobber));
    }

    #[test]
    fn grouped_short_options() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["-ex"]));
        assert!(env.options.is_on(ErrExit));
        assert!(env.options.is_on(XTrace));
    }

    #[test]
    fn long_options() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["-o", "pipefail"]));
        assert!(env.options.is_on(PipeFail));
        main(&mut env, Field::dummies(["+o", "pipefail"]));
        assert!(!env.options.is_on(PipeFail));
        main(&mut env, Field::dummies(["-o", "noclobber"]));
        assert!(!env.options.is_on(Clobber));
    }

    #[test]
    fn errexit_severity_spellings() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["--errexit-severity=strict"]));
        assert_eq!(env.options.errexit_severity, ErrexitSeverity::Strict);
        main(&mut env, Field::dummies(["-o", "errexit-severity=relaxed"]));
        assert_eq!(env.options.errexit_severity, ErrexitSeverity::Relaxed);
        let result = main(&mut env, Field::dummies(["--errexit-severity=bogus"]));
        assert_eq!(result.exit_status, ExitStatus::ERROR);
    }

    #[test]
    fn double_dash_replaces_positional_params() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["--", "a", "b"]));
        assert_eq!(env.variables.positional_params(), ["a", "b"]);
        main(&mut env, Field::dummies(["--"]));
        assert_eq!(env.variables.positional_params().len(), 0);
    }

    #[test]
    fn operands_without_dashes_replace_params() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["first", "second"]));
        assert_eq!(env.variables.positional_params(), ["first", "second"]);
    }

    #[test]
    fn options_then_operands() {
        let mut env = Env::new();
        main(&mut env, Field::dummies(["-e", "x", "y"]));
        assert!(env.options.is_on(ErrExit));
        assert_eq!(env.variables.positional_params(), ["x", "y"]);
    }

    #[test]
    fn unknown_option_is_usage_error() {
        let mut env = Env::new();
        assert_eq!(
            main(&mut env, Field::dummies(["-Z"])).exit_status,
            ExitStatus::ERROR
        );
        assert_eq!(
            main(&mut env, Field::dummies(["-o", "wombat"])).exit_status,
            ExitStatus::ERROR
        );
    }

    #[test]
    fn unmodifiable_option_is_rejected() {
        let mut env = Env::new();
        assert_eq!(
            main(&mut env, Field::dummies(["-o", "cmdline"])).exit_status,
            ExitStatus::ERROR
        );
    }
}
