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

//! The interactive read-eval loop
//!
//! Reads logical lines (requesting continuation lines while the parser
//! reports incomplete input), applies history expansion, records
//! history, and executes. Before each prompt, pending signals are
//! drained and finished background jobs are reported and swept.

use crate::bookmarks::BookmarkDatabase;
use crate::history::History;
use crate::plugin_host::PluginHost;
use cjsh_env::job::fmt::format_job;
use cjsh_env::semantics::{Divert, ExitStatus};
use cjsh_env::{signal, Env};
use cjsh_plugin::events;
use cjsh_semantics::command::Execute;
use cjsh_semantics::{exec, trap};
use cjsh_syntax::history::expand as expand_history;
use cjsh_syntax::parser::lex::Lexer;
use cjsh_syntax::parser::Parser;
use cjsh_syntax::source::Source;
use cjsh_syntax::syntax::List;
use std::io::{BufRead, Write};
use std::ops::ControlFlow;

/// Prompt for a fresh command line
const PRIMARY_PROMPT: &str = "cjsh$ ";
/// Prompt for a continuation line
const SECONDARY_PROMPT: &str = "> ";

/// Runs the interactive loop until end of input or `exit`.
pub fn main_loop(
    env: &mut Env,
    history: &mut History,
    plugins: &PluginHost,
    bookmarks: Option<&mut BookmarkDatabase>,
) -> ExitStatus {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut bookmarks = bookmarks;
    let mut last_pwd = current_pwd(env);

    loop {
        plugins.emit(events::MAIN_PROCESS_START, None);
        between_commands(env);
        if let Some(bookmarks) = bookmarks.as_deref_mut() {
            track_directory(env, bookmarks, &mut last_pwd);
        }

        let Some(line) = prompt_and_read(&mut input, PRIMARY_PROMPT) else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        // History expansion is a textual pre-pass on the raw line; the
        // expanded line is echoed, executed, and recorded.
        let line = match expand_history(&line, history.entries()) {
            Ok(None) => line,
            Ok(Some(expanded)) => {
                println!("{expanded}");
                expanded
            }
            Err(error) => {
                eprintln!("cjsh: {error}");
                env.exit_status = ExitStatus::FAILURE;
                continue;
            }
        };

        plugins.emit(events::MAIN_PROCESS_COMMAND_PROCESS, Some(line.trim_end()));

        let Some(list) = read_complete_command(&mut input, line.clone()) else {
            env.exit_status = ExitStatus::ERROR;
            continue;
        };
        history.push(&line);

        match list.execute(env) {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(Divert::Interrupt(status)) => {
                if let Some(status) = status {
                    env.exit_status = status;
                }
            }
            ControlFlow::Break(Divert::Exit(status)) => {
                return status.unwrap_or(env.exit_status);
            }
            ControlFlow::Break(divert) => {
                // Stray break/continue/return at the top level.
                if let Some(status) = divert.exit_status() {
                    env.exit_status = status;
                }
            }
        }
        plugins.emit(events::MAIN_PROCESS_END, None);
    }
    env.exit_status
}

fn current_pwd(env: &Env) -> Option<String> {
    env.variables.value_of("PWD").map(str::to_string)
}

/// Keeps the bookmark access counters in sync with directory changes,
/// the accounting behind smart-cd suggestions.
fn track_directory(env: &Env, bookmarks: &mut BookmarkDatabase, last_pwd: &mut Option<String>) {
    let pwd = current_pwd(env);
    if pwd == *last_pwd {
        return;
    }
    if let Some(pwd) = &pwd {
        let path = std::path::PathBuf::from(pwd);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| pwd.clone());
        if bookmarks.get(&name).is_none() {
            bookmarks.add(&name, path);
        }
        bookmarks.touch(&name);
    }
    *last_pwd = pwd;
}

/// Drains signals, reaps children, and reports job state changes; the
/// safe spot before each prompt.
fn between_commands(env: &mut Env) {
    if trap::drain_signals(env).is_break() {
        // An interrupt at the prompt just starts a fresh line.
        signal::clear_pending();
    }
    exec::reap_children(env);
    notify_jobs(env);
}

/// Prints one line per job whose state changed, then drops the jobs
/// that are finished and reported.
pub fn notify_jobs(env: &mut Env) {
    let lines: Vec<(usize, String)> = env
        .jobs
        .iter()
        .filter(|(_, job)| !job.notified && job.is_background)
        .map(|(index, job)| (index, format_job(index, job, &env.jobs)))
        .collect();
    for (index, line) in lines {
        eprintln!("{line}");
        if let Some(job) = env.jobs.get_mut(index) {
            job.notified = true;
        }
    }
    env.jobs.remove_finished_notified();
}

fn prompt_and_read(input: &mut impl BufRead, prompt: &str) -> Option<String> {
    eprint!("{prompt}");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

/// Parses the accumulated input, reading continuation lines while the
/// parser reports the input ended inside an open construct.
///
/// Returns `None` after reporting a (non-incomplete) syntax error.
fn read_complete_command(input: &mut impl BufRead, mut buffer: String) -> Option<List> {
    loop {
        let mut lexer = Lexer::from_memory(buffer.as_str(), Source::Stdin);
        let mut parser = Parser::new(&mut lexer);
        match parser.program() {
            Ok(list) => return Some(list),
            Err(error) if error.is_incomplete() => {
                drop(lexer);
                match prompt_and_read(input, SECONDARY_PROMPT) {
                    Some(more) => buffer.push_str(&more),
                    None => {
                        eprintln!("{}", error.to_report().render());
                        return None;
                    }
                }
            }
            Err(error) => {
                eprintln!("{}", error.to_report().render());
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn complete_command_parses_immediately() {
        let mut input = Cursor::new("");
        let list = read_complete_command(&mut input, "echo done\n".to_string()).unwrap();
        assert_eq!(list.to_string(), "echo done");
    }

    #[test]
    fn continuation_lines_are_requested() {
        let mut input = Cursor::new("world\nEOF\n");
        let list = read_complete_command(&mut input, "cat <<EOF\n".to_string()).unwrap();
        assert_eq!(list.to_string(), "cat <<EOF");
    }

    #[test]
    fn open_quote_requests_continuation() {
        let mut input = Cursor::new("end'\n");
        let list = read_complete_command(&mut input, "echo 'start\n".to_string()).unwrap();
        assert_eq!(list.to_string(), "echo 'start\nend'");
    }

    #[test]
    fn open_loop_requests_continuation() {
        let mut input = Cursor::new("do echo x\ndone\n");
        let list =
            read_complete_command(&mut input, "for i in 1 2\n".to_string()).unwrap();
        assert!(list.to_string().starts_with("for i in 1 2;"));
    }

    #[test]
    fn hard_syntax_error_reports_and_gives_up() {
        let mut input = Cursor::new("");
        assert!(read_complete_command(&mut input, "fi\n".to_string()).is_none());
    }

    #[test]
    fn eof_inside_construct_reports() {
        let mut input = Cursor::new("");
        assert!(read_complete_command(&mut input, "while true\n".to_string()).is_none());
    }

    #[test]
    fn notify_reports_finished_jobs_once() {
        use cjsh_env::job::{Job, Pid, ProcessState};
        let mut env = Env::new();
        let mut job = Job::new(Pid::from_raw(4242), "sleep 1".to_string());
        job.push_process(Pid::from_raw(4242));
        job.is_background = true;
        let index = env.jobs.add(job);
        env.jobs
            .update_process(Pid::from_raw(4242), ProcessState::Exited(ExitStatus(0)));
        notify_jobs(&mut env);
        assert!(env.jobs.get(index).is_none());
    }
}
