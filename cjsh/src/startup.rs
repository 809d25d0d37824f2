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

//! Shell startup
//!
//! Builds the environment, takes the terminal for job control when
//! interactive, and sources the profile (login shells) and rc file
//! (interactive shells) unless `--no-source` was given.

pub mod args;

use self::args::Settings;
use cjsh_env::option::{Option as ShellOption, State};
use cjsh_env::{signal, system, Env};
use cjsh_semantics::runner;
use cjsh_syntax::source::Source;
use std::path::PathBuf;

/// Name of the login profile, relative to `$HOME`
const PROFILE_FILE: &str = ".cjsh_profile";
/// Name of the interactive rc file, relative to `$HOME`
const RC_FILE: &str = ".cjshrc";
/// Name of the history file, relative to `$HOME`
pub const HISTORY_FILE: &str = ".cjsh_history";
/// Name of the bookmark database, relative to `$HOME`
pub const BOOKMARKS_FILE: &str = ".cjsh_bookmarks";

/// Creates the environment for this invocation.
#[must_use]
pub fn build_env(settings: &Settings, arg0: String) -> Env {
    let mut env = Env::new();
    env.variables.import_environ();
    env.arg0 = arg0;
    for (name, builtin) in cjsh_builtin::builtins() {
        env.builtins.insert(name, builtin);
    }
    if settings.login {
        env.options.set(ShellOption::Login, State::On);
    }
    if settings.interactive {
        env.options.set(ShellOption::Interactive, State::On);
    }
    env
}

/// Switches the shell into interactive mode: own process group,
/// terminal ownership, and signal intake.
pub fn prepare_interactive(env: &mut Env) {
    env.options.set(ShellOption::Interactive, State::On);
    env.options.set(ShellOption::Monitor, State::On);

    let tty = 0;
    if system::isatty(tty) {
        let pid = nix::unistd::getpid();
        if nix::unistd::getpgrp() != pid {
            let _ = system::setpgid(pid, pid);
        }
        env.shell_pgid = pid;
        let _ = system::tcsetpgrp(tty, pid);
        env.tty_fd = Some(tty);
    }
    if let Err(errno) = signal::install_interactive_handlers() {
        eprintln!("cjsh: cannot install signal handlers: {errno}");
    }
}

fn home_file(env: &Env, name: &str) -> Option<PathBuf> {
    env.variables
        .value_of("HOME")
        .map(|home| PathBuf::from(home).join(name))
}

/// Path of the history file, honoring `$HOME`.
#[must_use]
pub fn history_path(env: &Env) -> Option<PathBuf> {
    home_file(env, HISTORY_FILE)
}

/// Path of the bookmark database, honoring `$HOME`.
#[must_use]
pub fn bookmarks_path(env: &Env) -> Option<PathBuf> {
    home_file(env, BOOKMARKS_FILE)
}

/// Sources one init file if it exists; errors are reported and
/// swallowed.
fn source_file(env: &mut Env, path: PathBuf) {
    let Ok(text) = std::fs::read_to_string(&path) else {
        return;
    };
    let source = Source::CommandFile {
        path: path.to_string_lossy().into_owned(),
    };
    // An `exit` in an init file leaves its status in the environment;
    // the divert itself stops at this boundary.
    let _ = runner::run_string(env, &text, source);
}

/// Sources the profile and rc file as appropriate for this invocation.
pub fn source_init_files(env: &mut Env, settings: &Settings) {
    if settings.no_source {
        return;
    }
    if settings.login {
        if let Some(path) = home_file(env, PROFILE_FILE) {
            source_file(env, path);
        }
    }
    if env.options.is_on(ShellOption::Interactive) {
        if let Some(path) = home_file(env, RC_FILE) {
            source_file(env, path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::variable::Scope;

    #[test]
    fn build_env_installs_builtins_and_arg0() {
        let settings = Settings::default();
        let env = build_env(&settings, "cjsh".to_string());
        assert!(env.builtins.contains_key("cd"));
        assert!(env.builtins.contains_key("exit"));
        assert_eq!(env.arg0, "cjsh");
        assert!(!env.options.is_on(ShellOption::Login));
    }

    #[test]
    fn login_flag_sets_the_option() {
        let settings = Settings {
            login: true,
            ..Settings::default()
        };
        let env = build_env(&settings, "-cjsh".to_string());
        assert!(env.options.is_on(ShellOption::Login));
    }

    #[test]
    fn init_files_honor_no_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(RC_FILE), "rc_ran=yes\n").unwrap();
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "HOME", dir.path().to_string_lossy())
            .unwrap();
        env.options.set(ShellOption::Interactive, State::On);

        let mut settings = Settings {
            no_source: true,
            ..Settings::default()
        };
        source_init_files(&mut env, &settings);
        assert_eq!(env.variables.value_of("rc_ran"), None);

        settings.no_source = false;
        source_init_files(&mut env, &settings);
        assert_eq!(env.variables.value_of("rc_ran"), Some("yes"));
    }

    #[test]
    fn login_shell_sources_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROFILE_FILE), "profile_ran=yes\n").unwrap();
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "HOME", dir.path().to_string_lossy())
            .unwrap();
        let settings = Settings {
            login: true,
            ..Settings::default()
        };
        source_init_files(&mut env, &settings);
        assert_eq!(env.variables.value_of("profile_ran"), Some("yes"));
    }
}
