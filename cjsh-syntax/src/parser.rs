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

//! Lexer and recursive-descent parser
//!
//! The [`lex::Lexer`] turns a code fragment into [`lex::Token`]s; the
//! [`Parser`] consumes them one at a time and builds the AST defined in
//! [`crate::syntax`]. A parse error whose cause
//! [`is_incomplete`](Error::is_incomplete) signals that the input ended
//! inside an open construct, which the interactive loop uses to read
//! continuation lines instead of reporting the error.

pub mod lex;

mod compound_command;
mod cond;
mod core;
mod error;
mod from_str;
mod list;
mod redir;
mod simple_command;

pub use self::core::Parser;
pub use self::error::{Error, Result, SyntaxError};
