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

//! Command search
//!
//! The first field of a simple command resolves in this order: special
//! built-ins, functions, other built-ins, then executables found on
//! `PATH`. A name containing a slash skips the search entirely and
//! names an external file.

use cjsh_env::builtin::{Builtin, Kind};
use cjsh_env::function::Function;
use cjsh_env::Env;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Result of resolving a command name
#[derive(Clone, Debug)]
pub enum Target {
    /// A built-in from the environment's table
    Builtin(Builtin),
    /// A defined function
    Function(Rc<Function>),
    /// An external command
    External { path: PathBuf },
    /// Nothing matched
    NotFound,
}

/// Resolves a command name.
#[must_use]
pub fn search(env: &Env, name: &str) -> Target {
    if name.contains('/') {
        return Target::External {
            path: PathBuf::from(name),
        };
    }

    if let Some(builtin) = env.builtins.get(name) {
        if builtin.kind == Kind::Special {
            return Target::Builtin(*builtin);
        }
    }
    if let Some(function) = env.functions.get(name) {
        return Target::Function(Rc::clone(function));
    }
    if let Some(builtin) = env.builtins.get(name) {
        return Target::Builtin(*builtin);
    }
    match search_path(env, name) {
        Some(path) => Target::External { path },
        None => Target::NotFound,
    }
}

/// Looks for an executable regular file on `PATH`.
#[must_use]
pub fn search_path(env: &Env, name: &str) -> Option<PathBuf> {
    let path = env.variables.value_of("PATH").unwrap_or("");
    path.split(':')
        .map(|dir| {
            if dir.is_empty() {
                Path::new(".").join(name)
            } else {
                Path::new(dir).join(name)
            }
        })
        .find(|candidate| is_executable_file(candidate))
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(metadata) => {
            metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::semantics::ExitStatus;
    use cjsh_env::variable::Scope;
    use std::str::FromStr;

    fn dummy_builtin(kind: Kind) -> Builtin {
        fn run(_: &mut Env, _: Vec<cjsh_env::semantics::Field>) -> cjsh_env::builtin::Result {
            ExitStatus::SUCCESS.into()
        }
        Builtin { kind, execute: run }
    }

    fn define_function(env: &mut Env, name: &str) {
        let list = cjsh_syntax::syntax::List::from_str(&format!("{name}() {{ :; }}")).unwrap();
        let cjsh_syntax::syntax::Command::Function(def) = &*list.0[0].and_or.first.commands[0]
        else {
            unreachable!();
        };
        env.functions.define(Function {
            name: name.to_string(),
            body: Rc::clone(&def.body),
            origin: cjsh_syntax::source::Location::dummy(name),
        });
    }

    #[test]
    fn slash_bypasses_search() {
        let env = Env::new();
        assert_matches::assert_matches!(
            search(&env, "/bin/nonexistent-hopefully"),
            Target::External { path } => assert_eq!(path, PathBuf::from("/bin/nonexistent-hopefully"))
        );
    }

    #[test]
    fn special_builtin_beats_function() {
        let mut env = Env::new();
        env.builtins.insert("exit", dummy_builtin(Kind::Special));
        define_function(&mut env, "exit");
        assert_matches::assert_matches!(search(&env, "exit"), Target::Builtin(b) => {
            assert_eq!(b.kind, Kind::Special);
        });
    }

    #[test]
    fn function_beats_regular_builtin() {
        let mut env = Env::new();
        env.builtins.insert("true", dummy_builtin(Kind::Regular));
        define_function(&mut env, "true");
        assert_matches::assert_matches!(search(&env, "true"), Target::Function(_));
    }

    #[test]
    fn path_search_finds_sh() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "PATH", "/bin:/usr/bin")
            .unwrap();
        assert_matches::assert_matches!(search(&env, "sh"), Target::External { .. });
    }

    #[test]
    fn missing_command_is_not_found() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "PATH", "/definitely-missing-dir")
            .unwrap();
        assert_matches::assert_matches!(
            search(&env, "no-such-command-here"),
            Target::NotFound
        );
    }
}
