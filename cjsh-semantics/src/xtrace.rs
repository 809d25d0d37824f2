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

//! Execution tracing (`set -x`)

use cjsh_env::option::Option::XTrace;
use cjsh_env::semantics::Field;
use cjsh_env::Env;

/// Builds the trace line for an expanded command.
#[must_use]
pub fn format(assigns: &[(String, String)], fields: &[Field]) -> String {
    let mut line = String::from("+");
    for (name, value) in assigns {
        line.push(' ');
        line.push_str(name);
        line.push('=');
        line.push_str(value);
    }
    for field in fields {
        line.push(' ');
        line.push_str(&field.value);
    }
    line
}

/// Prints the trace line to stderr when `xtrace` is on.
pub fn trace(env: &Env, assigns: &[(String, String)], fields: &[Field]) {
    if env.options.is_on(XTrace) {
        eprintln!("{}", format(assigns, fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_assignments_and_fields() {
        let assigns = [("A".to_string(), "1".to_string())];
        let fields = Field::dummies(["echo", "hi"]);
        assert_eq!(format(&assigns, &fields), "+ A=1 echo hi");
    }

    #[test]
    fn empty_command_is_a_lone_plus() {
        assert_eq!(format(&[], &[]), "+");
    }
}
