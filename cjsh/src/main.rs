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

//! cjsh, a POSIX-compatible interactive shell

mod bookmarks;
mod history;
mod interactive;
mod plugin_host;
mod startup;

use cjsh_env::job::JobState;
use cjsh_env::option::Option as ShellOption;
use cjsh_env::semantics::{Divert, ExitStatus};
use cjsh_env::{system, Env};
use cjsh_plugin::events;
use cjsh_semantics::{runner, trap};
use cjsh_syntax::source::Source;
use plugin_host::PluginHost;
use startup::args::{self, Work};
use std::ops::ControlFlow;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut argv = std::env::args();
    let arg0 = argv.next().unwrap_or_else(|| "cjsh".to_string());

    let invocation = match args::parse(argv) {
        Ok(invocation) => invocation,
        Err(error) => {
            eprintln!("cjsh: {error}");
            return ExitCode::from(ExitStatus::ERROR.0 as u8);
        }
    };
    let mut settings = invocation.settings.clone();
    // A leading dash in argv[0] marks a login shell, as does -l.
    settings.login |= arg0.starts_with('-');

    if invocation.work == Work::Version {
        println!("cjsh {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let interactive = settings.interactive
        || (matches!(invocation.work, Work::Stdin) && system::isatty(0));

    let mut env = startup::build_env(&settings, arg0);
    if interactive {
        startup::prepare_interactive(&mut env);
    }

    let plugins = if settings.no_plugins || settings.minimal {
        PluginHost::default()
    } else {
        match env.variables.value_of("HOME") {
            Some(home) => {
                PluginHost::load_dir(&std::path::Path::new(home).join(plugin_host::PLUGIN_DIR))
            }
            None => PluginHost::default(),
        }
    };
    plugins.emit(events::MAIN_PROCESS_PRE_RUN, None);

    let startup_clock = std::time::Instant::now();
    startup::source_init_files(&mut env, &settings);
    if settings.show_startup_time {
        eprintln!("cjsh: started in {:?}", startup_clock.elapsed());
    }
    if settings.startup_test {
        return finish(&mut env, &plugins, ExitStatus::SUCCESS);
    }

    let status = match invocation.work {
        Work::Version => unreachable!("handled above"),
        Work::Command {
            command,
            arg0,
            params,
        } => {
            env.options.set(ShellOption::CmdLine, cjsh_env::option::State::On);
            if let Some(arg0) = arg0 {
                env.arg0 = arg0;
            }
            env.variables.set_positional_params(params);
            run_source(&mut env, &command, Source::CommandString)
        }
        Work::Script { path, params } => match std::fs::read_to_string(&path) {
            Ok(text) => {
                env.arg0 = path.clone();
                env.variables.set_positional_params(params);
                run_source(&mut env, &text, Source::CommandFile { path })
            }
            Err(error) => {
                eprintln!("cjsh: {path}: {error}");
                ExitStatus::NOT_FOUND
            }
        },
        Work::Stdin => {
            if interactive {
                let mut history = match startup::history_path(&env) {
                    Some(path) => history::History::load(path),
                    None => history::History::in_memory(),
                };
                let bookmarks_path = (!settings.no_smart_cd && !settings.minimal)
                    .then(|| startup::bookmarks_path(&env))
                    .flatten();
                let mut bookmarks = bookmarks_path
                    .as_deref()
                    .map(bookmarks::BookmarkDatabase::load);
                let status = interactive::main_loop(
                    &mut env,
                    &mut history,
                    &plugins,
                    bookmarks.as_mut(),
                );
                if let (Some(bookmarks), Some(path)) = (&bookmarks, &bookmarks_path) {
                    if let Err(error) = bookmarks.save(path) {
                        eprintln!("cjsh: cannot save bookmarks: {error}");
                    }
                }
                status
            } else {
                env.options.set(ShellOption::Stdin, cjsh_env::option::State::On);
                let mut text = String::new();
                use std::io::Read as _;
                match std::io::stdin().read_to_string(&mut text) {
                    Ok(_) => run_source(&mut env, &text, Source::Stdin),
                    Err(error) => {
                        eprintln!("cjsh: cannot read standard input: {error}");
                        ExitStatus::FAILURE
                    }
                }
            }
        }
    };
    finish(&mut env, &plugins, status)
}

/// Runs a whole source text, resolving diverts to a final status.
fn run_source(env: &mut Env, text: &str, source: Source) -> ExitStatus {
    match runner::run_string(env, text, source) {
        ControlFlow::Continue(()) => env.exit_status,
        ControlFlow::Break(divert) => match divert {
            Divert::Exit(status) | Divert::Interrupt(status) | Divert::Return(status) => {
                status.unwrap_or(env.exit_status)
            }
            Divert::Break { .. } | Divert::Continue { .. } => env.exit_status,
        },
    }
}

/// Common shutdown: EXIT trap, `huponexit`, plugin notification.
fn finish(env: &mut Env, plugins: &PluginHost, status: ExitStatus) -> ExitCode {
    env.exit_status = status;
    trap::run_exit_trap(env);
    plugins.emit(events::MAIN_PROCESS_EXIT, None);

    if env.options.is_on(ShellOption::HupOnExit) {
        let jobs: Vec<(cjsh_env::Pid, JobState)> = env
            .jobs
            .iter()
            .map(|(_, job)| (job.pgid, job.state()))
            .collect();
        for (pgid, state) in jobs {
            let _ = system::killpg(pgid, Some(nix::sys::signal::Signal::SIGHUP));
            if state == JobState::Stopped {
                let _ = system::killpg(pgid, Some(nix::sys::signal::Signal::SIGCONT));
            }
        }
    }
    ExitCode::from(env.exit_status.0 as u8)
}
