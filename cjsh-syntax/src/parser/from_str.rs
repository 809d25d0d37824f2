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

//! `FromStr` implementations for AST types
//!
//! These parse from anonymous in-memory code fragments, so locations in
//! the result refer to [`Source::Unknown`](crate::source::Source).

use super::core::Parser;
use super::error::Error;
use super::lex::Lexer;
use crate::source::Source;
use crate::syntax::{List, Word};
use std::str::FromStr;

impl FromStr for List {
    type Err = Error;

    fn from_str(s: &str) -> Result<List, Error> {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        Parser::new(&mut lexer).program()
    }
}

impl FromStr for Word {
    type Err = Error;

    fn from_str(s: &str) -> Result<Word, Error> {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        lexer.word(&|_| false)
    }
}
