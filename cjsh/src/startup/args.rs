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

//! Command-line argument parsing

use std::fmt;

/// Feature toggles from the command line
///
/// The `--no-*` family disables optional surfaces; the core honors the
/// ones it owns and records the rest for the subsystems concerned.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Settings {
    pub login: bool,
    pub interactive: bool,
    pub debug: bool,
    pub minimal: bool,
    pub no_plugins: bool,
    pub no_themes: bool,
    pub no_ai: bool,
    pub no_colors: bool,
    pub no_titleline: bool,
    pub show_startup_time: bool,
    pub no_source: bool,
    pub no_completions: bool,
    pub no_syntax_highlighting: bool,
    pub no_smart_cd: bool,
    pub disable_custom_ls: bool,
    pub startup_test: bool,
    pub read_stdin: bool,
}

/// What the shell should run
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Work {
    /// `-c` string, with `$0` and positional parameters
    Command {
        command: String,
        arg0: Option<String>,
        params: Vec<String>,
    },
    /// Script file operand with positional parameters
    Script { path: String, params: Vec<String> },
    /// Interactive session or standard input
    Stdin,
    /// `--version`
    Version,
}

/// Parsed invocation
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub settings: Settings,
    pub work: Work,
}

/// Argument parsing failure; the shell exits with status 2.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArgsError {
    pub message: String,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for ArgsError {}

fn error<T>(message: impl Into<String>) -> Result<T, ArgsError> {
    Err(ArgsError {
        message: message.into(),
    })
}

/// Parses the command line, excluding `argv[0]`.
pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Invocation, ArgsError> {
    let mut settings = Settings::default();
    let mut command: Option<String> = None;
    let mut iter = args.into_iter().peekable();

    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--login" | "-l" => settings.login = true,
            "--interactive" | "-i" => settings.interactive = true,
            "--debug" => settings.debug = true,
            "--minimal" => settings.minimal = true,
            "--no-plugins" => settings.no_plugins = true,
            "--no-themes" => settings.no_themes = true,
            "--no-ai" => settings.no_ai = true,
            "--no-colors" => settings.no_colors = true,
            "--no-titleline" => settings.no_titleline = true,
            "--show-startup-time" => settings.show_startup_time = true,
            "--no-source" => settings.no_source = true,
            "--no-completions" => settings.no_completions = true,
            "--no-syntax-highlighting" => settings.no_syntax_highlighting = true,
            "--no-smart-cd" => settings.no_smart_cd = true,
            "--disable-custom-ls" => settings.disable_custom_ls = true,
            "--startup-test" => settings.startup_test = true,
            "-s" => settings.read_stdin = true,
            "--version" => {
                return Ok(Invocation {
                    settings,
                    work: Work::Version,
                })
            }
            "-c" => {
                iter.next();
                match iter.next() {
                    Some(text) => command = Some(text),
                    None => return error("-c: option requires an argument"),
                }
                continue;
            }
            "--" => {
                iter.next();
                break;
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return error(format!("{other}: unknown option"));
            }
            _ => break,
        }
        iter.next();
    }

    let mut operands: Vec<String> = iter.collect();

    let work = if let Some(command) = command {
        let arg0 = if operands.is_empty() {
            None
        } else {
            Some(operands.remove(0))
        };
        Work::Command {
            command,
            arg0,
            params: operands,
        }
    } else if settings.read_stdin || operands.is_empty() {
        if !operands.is_empty() {
            // With -s, operands become positional parameters; keeping
            // them is the script-less stdin mode.
            return error("operands are not allowed with -s");
        }
        Work::Stdin
    } else {
        let path = operands.remove(0);
        Work::Script {
            path,
            params: operands,
        }
    };

    Ok(Invocation { settings, work })
}
