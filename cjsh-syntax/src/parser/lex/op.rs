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

//! Operator tokens

use std::fmt;

/// Operator token
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `\n`
    Newline,
    /// `;`
    Semicolon,
    /// `;;`
    SemicolonSemicolon,
    /// `;&`
    SemicolonAnd,
    /// `;;&`
    SemicolonSemicolonAnd,
    /// `&`
    And,
    /// `&&`
    AndAnd,
    /// `&>`
    AndGreater,
    /// `|`
    Bar,
    /// `||`
    BarBar,
    /// `|&`
    BarAnd,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `<`
    Less,
    /// `<<`
    LessLess,
    /// `<<-`
    LessLessDash,
    /// `<<<`
    LessLessLess,
    /// `<&`
    LessAnd,
    /// `<>`
    LessGreater,
    /// `>`
    Greater,
    /// `>>`
    GreaterGreater,
    /// `>&`
    GreaterAnd,
    /// `>|`
    GreaterBar,
}

impl Operator {
    /// Source spelling of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        use Operator::*;
        match self {
            Newline => "\n",
            Semicolon => ";",
            SemicolonSemicolon => ";;",
            SemicolonAnd => ";&",
            SemicolonSemicolonAnd => ";;&",
            And => "&",
            AndAnd => "&&",
            AndGreater => "&>",
            Bar => "|",
            BarBar => "||",
            BarAnd => "|&",
            OpenParen => "(",
            CloseParen => ")",
            Less => "<",
            LessLess => "<<",
            LessLessDash => "<<-",
            LessLessLess => "<<<",
            LessAnd => "<&",
            LessGreater => "<>",
            Greater => ">",
            GreaterGreater => ">>",
            GreaterAnd => ">&",
            GreaterBar => ">|",
        }
    }

    /// Whether this operator separates or terminates commands.
    #[must_use]
    pub fn is_separator(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Newline
                | Semicolon
                | SemicolonSemicolon
                | SemicolonAnd
                | SemicolonSemicolonAnd
                | And
                | AndAnd
                | Bar
                | BarBar
                | BarAnd
                | CloseParen
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a character can begin an operator.
#[must_use]
pub fn is_operator_char(c: char) -> bool {
    matches!(c, '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

/// Recognizes the longest operator at the head of `chars`.
///
/// Returns the operator and the number of characters it spans.
#[must_use]
pub fn recognize(chars: &[char]) -> Option<(Operator, usize)> {
    use Operator::*;
    let op = match chars.first()? {
        '\n' => (Newline, 1),
        ';' => match chars.get(1) {
            Some(';') => match chars.get(2) {
                Some('&') => (SemicolonSemicolonAnd, 3),
                _ => (SemicolonSemicolon, 2),
            },
            Some('&') => (SemicolonAnd, 2),
            _ => (Semicolon, 1),
        },
        '&' => match chars.get(1) {
            Some('&') => (AndAnd, 2),
            Some('>') => (AndGreater, 2),
            _ => (And, 1),
        },
        '|' => match chars.get(1) {
            Some('|') => (BarBar, 2),
            Some('&') => (BarAnd, 2),
            _ => (Bar, 1),
        },
        '(' => (OpenParen, 1),
        ')' => (CloseParen, 1),
        '<' => match chars.get(1) {
            Some('<') => match chars.get(2) {
                Some('-') => (LessLessDash, 3),
                Some('<') => (LessLessLess, 3),
                _ => (LessLess, 2),
            },
            Some('&') => (LessAnd, 2),
            Some('>') => (LessGreater, 2),
            _ => (Less, 1),
        },
        '>' => match chars.get(1) {
            Some('>') => (GreaterGreater, 2),
            Some('&') => (GreaterAnd, 2),
            Some('|') => (GreaterBar, 2),
            _ => (Greater, 1),
        },
        _ => return None,
    };
    Some(op)
}
