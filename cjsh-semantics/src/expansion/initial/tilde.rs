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

//! Tilde expansion
//!
//! A bare `~` expands to `$HOME`, falling back to the password database
//! when `HOME` is unset. `~name` looks the user up in the password
//! database; an unknown name is an expansion error.

use super::super::{Error, ErrorCause, Result};
use cjsh_env::Env;
use cjsh_syntax::source::Location;

/// Expands the name of a tilde prefix to a directory.
pub fn expand(env: &Env, name: &str, location: &Location) -> Result<String> {
    if name.is_empty() {
        if let Some(home) = env.variables.value_of("HOME") {
            return Ok(home.to_string());
        }
        return own_home().ok_or_else(|| Error {
            cause: ErrorCause::TildeUserNotFound {
                name: String::new(),
            },
            location: location.clone(),
        });
    }
    match nix::unistd::User::from_name(name) {
        Ok(Some(user)) => Ok(user.dir.to_string_lossy().into_owned()),
        Ok(None) | Err(_) => Err(Error {
            cause: ErrorCause::TildeUserNotFound {
                name: name.to_string(),
            },
            location: location.clone(),
        }),
    }
}

fn own_home() -> Option<String> {
    let user = nix::unistd::User::from_uid(nix::unistd::getuid()).ok()??;
    Some(user.dir.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::variable::Scope;

    #[test]
    fn bare_tilde_uses_home_variable() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "HOME", "/home/test")
            .unwrap();
        let result = expand(&env, "", &Location::dummy("~")).unwrap();
        assert_eq!(result, "/home/test");
    }

    #[test]
    fn unknown_user_is_an_error() {
        let env = Env::new();
        let error = expand(&env, "no_such_user_here", &Location::dummy("~x")).unwrap_err();
        assert_matches::assert_matches!(
            error.cause,
            ErrorCause::TildeUserNotFound { name } => assert_eq!(name, "no_such_user_here")
        );
    }

    #[test]
    fn root_user_resolves() {
        let env = Env::new();
        let result = expand(&env, "root", &Location::dummy("~root")).unwrap();
        assert!(result.starts_with('/'), "{result}");
    }
}
