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

//! Lexical analysis
//!
//! The [`Lexer`] reads a whole code fragment and hands out [`Token`]s on
//! demand. Words are parsed into their structural units here, so the
//! parser proper never looks at characters. The lexer's position can be
//! saved and rewound, which the parser uses for the few places that need
//! speculation (`((`, function definitions).

mod core;
mod dollar;
mod heredoc;
mod keyword;
mod op;
mod word;

pub use self::core::{Lexer, Token, TokenId};
pub use self::keyword::Keyword;
pub use self::op::Operator;
