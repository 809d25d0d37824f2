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

//! Shell command language syntax for cjsh
//!
//! This crate turns source code into abstract syntax trees. The [`source`]
//! module locates characters in their originating code fragments and
//! renders diagnostics; the [`syntax`] module defines the AST; the
//! [`parser`] module contains the lexer and the recursive-descent parser;
//! the [`history`] module implements `!`-style history expansion, a
//! purely textual pre-pass that runs before lexing.
//!
//! Most AST types implement [`FromStr`](std::str::FromStr), so a quick
//! parse is a `parse` call away:
//!
//! ```
//! use cjsh_syntax::syntax::List;
//! let list: List = "echo ok && exit".parse().unwrap();
//! assert_eq!(list.to_string(), "echo ok && exit");
//! ```
//!
//! Parsing with real source attribution goes through
//! [`parser::Parser`] instead.

pub mod history;
pub mod parser;
pub mod source;
pub mod syntax;
