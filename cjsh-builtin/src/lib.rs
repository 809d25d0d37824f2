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

//! Built-in commands
//!
//! Each module implements one built-in with the uniform signature
//! `fn main(&mut Env, Vec<Field>) -> Result`. Control-flow built-ins
//! (`break`, `continue`, `return`, `exit`) communicate through the
//! result's [`Divert`](cjsh_env::semantics::Divert) rather than magic
//! exit codes. [`builtins`] yields the full table for the startup code
//! to install into the environment.

pub mod bg;
pub mod r#break;
pub mod cd;
pub mod colon;
pub mod common;
pub mod r#continue;
pub mod eval;
pub mod exec;
pub mod exit;
pub mod export;
pub mod fg;
pub mod jobs;
pub mod kill;
pub mod local;
pub mod readonly;
pub mod r#return;
pub mod set;
pub mod shift;
pub mod source;
pub mod trap;
pub mod unset;
pub mod wait;

use cjsh_env::builtin::{Builtin, Kind};

/// The built-in table, ready to install into an environment.
#[must_use]
pub fn builtins() -> Vec<(&'static str, Builtin)> {
    fn special(execute: fn(&mut cjsh_env::Env, Vec<cjsh_env::semantics::Field>) -> cjsh_env::builtin::Result) -> Builtin {
        Builtin {
            kind: Kind::Special,
            execute,
        }
    }
    fn regular(execute: fn(&mut cjsh_env::Env, Vec<cjsh_env::semantics::Field>) -> cjsh_env::builtin::Result) -> Builtin {
        Builtin {
            kind: Kind::Regular,
            execute,
        }
    }

    vec![
        (":", special(colon::main)),
        ("true", regular(colon::main)),
        ("false", regular(colon::false_main)),
        ("break", special(r#break::main)),
        ("continue", special(r#continue::main)),
        ("return", special(r#return::main)),
        ("exit", special(exit::main)),
        ("eval", special(eval::main)),
        (".", special(source::main)),
        ("source", special(source::main)),
        ("exec", special(exec::main)),
        ("set", special(set::main)),
        ("shift", special(shift::main)),
        ("trap", special(trap::main)),
        ("readonly", special(readonly::main)),
        ("export", special(export::main)),
        ("local", special(local::main)),
        ("unset", special(unset::main)),
        ("cd", regular(cd::main)),
        ("test", regular(test::main)),
        ("[", regular(test::bracket_main)),
        ("jobs", regular(jobs::main)),
        ("fg", regular(fg::main)),
        ("bg", regular(bg::main)),
        ("wait", regular(wait::main)),
        ("kill", regular(kill::main)),
    ]
}
