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

//! The `exec` built-in
//!
//! Without operands, `exec` makes its redirections permanent (the
//! executor keeps them in place when this built-in succeeds). With
//! operands it replaces the shell with the named command; the EXIT trap
//! does not run. A failed exec terminates a non-interactive shell but
//! only reports in an interactive one.

use cjsh_env::builtin::Result;
use cjsh_env::option::Option::Interactive;
use cjsh_env::semantics::{Divert, ExitStatus, Field};
use cjsh_env::system::{self, Errno};
use cjsh_env::Env;
use cjsh_semantics::command_search::{self, Target};
use std::ffi::CString;

/// Entry point of the `exec` built-in
pub fn main(env: &mut Env, args: Vec<Field>) -> Result {
    let Some(command) = args.first() else {
        // Redirections applied for this command persist.
        return ExitStatus::SUCCESS.into();
    };

    let path = match command_search::search(env, &command.value) {
        Target::External { path } => path,
        Target::Builtin(_) | Target::Function(_) | Target::NotFound => {
            match command_search::search_path(env, &command.value) {
                Some(path) => path,
                None => {
                    eprintln!("cjsh: exec: {}: command not found", command.value);
                    return finish(env, ExitStatus::NOT_FOUND);
                }
            }
        }
    };

    use std::os::unix::ffi::OsStrExt;
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return finish(env, ExitStatus::EXEC_ERROR);
    };
    let argv: Vec<CString> = match args
        .iter()
        .map(|f| CString::new(f.value.as_bytes()))
        .collect()
    {
        Ok(argv) => argv,
        Err(_) => return finish(env, ExitStatus::EXEC_ERROR),
    };
    let environ = env.variables.environ();
    let errno = system::execve(&c_path, &argv, &environ);
    let status = match errno {
        Errno::ENOENT | Errno::ENOTDIR => ExitStatus::NOT_FOUND,
        Errno::EACCES | Errno::ENOEXEC => ExitStatus::NOT_EXECUTABLE,
        _ => ExitStatus::EXEC_ERROR,
    };
    eprintln!("cjsh: exec: {}: {errno}", command.value);
    finish(env, status)
}

/// A failed exec exits the shell unless it is interactive.
fn finish(env: &Env, status: ExitStatus) -> Result {
    if env.options.is_on(Interactive) {
        status.into()
    } else {
        Result::with_divert(status, Divert::Exit(Some(status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::option::State;
    use cjsh_env::variable::Scope;

    #[test]
    fn no_operands_succeeds() {
        let mut env = Env::new();
        assert_eq!(main(&mut env, Vec::new()).exit_status, ExitStatus::SUCCESS);
    }

    #[test]
    fn missing_command_not_found() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "PATH", "/missing-dir")
            .unwrap();
        env.options.set(Interactive, State::On);
        let result = main(&mut env, Field::dummies(["no-such-cmd"]));
        assert_eq!(result.exit_status, ExitStatus::NOT_FOUND);
        assert_eq!(result.divert, None);
    }

    #[test]
    fn non_interactive_failure_exits_the_shell() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "PATH", "/missing-dir")
            .unwrap();
        let result = main(&mut env, Field::dummies(["no-such-cmd"]));
        assert_eq!(
            result.divert,
            Some(Divert::Exit(Some(ExitStatus::NOT_FOUND)))
        );
    }
}
