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

//! Tokenization of arithmetic expressions

use std::ops::Range;
use thiserror::Error;

/// Operator token
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `||`
    BarBar,
    /// `&&`
    AndAnd,
    /// `|`
    Bar,
    /// `^`
    Caret,
    /// `&`
    And,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<<`
    LessLess,
    /// `>>`
    GreaterGreater,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Asterisk,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `**`
    AsteriskAsterisk,
    /// `=`
    Equal,
    /// `+=`
    PlusEqual,
    /// `-=`
    MinusEqual,
    /// `*=`
    AsteriskEqual,
    /// `/=`
    SlashEqual,
    /// `%=`
    PercentEqual,
    /// `<<=`
    LessLessEqual,
    /// `>>=`
    GreaterGreaterEqual,
    /// `&=`
    AndEqual,
    /// `^=`
    CaretEqual,
    /// `|=`
    BarEqual,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

impl Operator {
    /// Binding strength of this operator used as a binary operator.
    ///
    /// Higher values bind tighter. Zero means the operator is not binary.
    #[must_use]
    pub fn precedence(self) -> u8 {
        use Operator::*;
        match self {
            OpenParen | CloseParen | Bang | Tilde | PlusPlus | MinusMinus | Colon => 0,
            Equal | PlusEqual | MinusEqual | AsteriskEqual | SlashEqual | PercentEqual
            | LessLessEqual | GreaterGreaterEqual | AndEqual | CaretEqual | BarEqual => 1,
            Question => 2,
            BarBar => 3,
            AndAnd => 4,
            Bar => 5,
            Caret => 6,
            And => 7,
            EqualEqual | BangEqual => 8,
            Less | LessEqual | Greater | GreaterEqual => 9,
            LessLess | GreaterGreater => 10,
            Plus | Minus => 11,
            Asterisk | Slash | Percent => 12,
            AsteriskAsterisk => 13,
        }
    }

    /// Whether this binary operator groups right-to-left.
    #[must_use]
    pub fn is_right_associative(self) -> bool {
        use Operator::*;
        matches!(
            self,
            AsteriskAsterisk
                | Question
                | Equal
                | PlusEqual
                | MinusEqual
                | AsteriskEqual
                | SlashEqual
                | PercentEqual
                | LessLessEqual
                | GreaterGreaterEqual
                | AndEqual
                | CaretEqual
                | BarEqual
        )
    }

    /// For a compound assignment, the operator that computes the new value.
    #[must_use]
    pub fn assignment_op(self) -> Option<Operator> {
        use Operator::*;
        match self {
            PlusEqual => Some(Plus),
            MinusEqual => Some(Minus),
            AsteriskEqual => Some(Asterisk),
            SlashEqual => Some(Slash),
            PercentEqual => Some(Percent),
            LessLessEqual => Some(LessLess),
            GreaterGreaterEqual => Some(GreaterGreater),
            AndEqual => Some(And),
            CaretEqual => Some(Caret),
            BarEqual => Some(Bar),
            _ => None,
        }
    }
}

/// Content of a token
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenValue<'a> {
    /// Integer constant
    Number(i64),
    /// Variable name
    Variable(&'a str),
    /// Operator
    Operator(Operator),
}

/// Token with its position in the source expression
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Token<'a> {
    /// Content of the token
    pub value: TokenValue<'a>,
    /// Byte range in the expression string
    pub location: Range<usize>,
}

/// Cause of a tokenization error
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum TokenError {
    /// Integer constant with a digit invalid for its radix
    #[error("invalid integer constant")]
    InvalidNumber,
    /// Character that cannot start any token
    #[error("invalid character")]
    InvalidCharacter,
}

/// Tokenization error with its position
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    /// Cause of the error
    pub cause: TokenError,
    /// Byte range in the expression string
    pub location: Range<usize>,
}

/// Iterator yielding tokens of an expression
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    source: &'a str,
    index: usize,
}

impl<'a> Tokens<'a> {
    /// Creates a tokenizer for the given expression.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Tokens { source, index: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.index = self.source.len() - trimmed.len();
    }

    fn operator(&mut self, op: Operator, len: usize) -> Token<'a> {
        let start = self.index;
        self.index += len;
        Token {
            value: TokenValue::Operator(op),
            location: start..self.index,
        }
    }

    fn number(&mut self) -> Result<Token<'a>, Error> {
        let start = self.index;
        let text: &str = self
            .rest()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .next()
            .unwrap_or_default();
        self.index += text.len();
        let location = start..self.index;

        let parse = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16)
        } else if text.len() > 1 && text.starts_with('0') {
            i64::from_str_radix(&text[1..], 8)
        } else {
            text.parse()
        };
        match parse {
            Ok(number) => Ok(Token {
                value: TokenValue::Number(number),
                location,
            }),
            Err(_) => Err(Error {
                cause: TokenError::InvalidNumber,
                location,
            }),
        }
    }

    fn variable(&mut self) -> Token<'a> {
        let start = self.index;
        let name: &str = self
            .rest()
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default();
        self.index += name.len();
        Token {
            value: TokenValue::Variable(name),
            location: start..self.index,
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Result<Token<'a>, Error>> {
        self.skip_whitespace();
        let rest = self.rest();
        let first = rest.chars().next()?;

        use Operator::*;
        let token = match first {
            '0'..='9' => return Some(self.number()),
            c if c.is_ascii_alphabetic() || c == '_' => self.variable(),
            '?' => self.operator(Question, 1),
            ':' => self.operator(Colon, 1),
            '(' => self.operator(OpenParen, 1),
            ')' => self.operator(CloseParen, 1),
            '~' => self.operator(Tilde, 1),
            '|' => match rest.as_bytes().get(1) {
                Some(b'|') => self.operator(BarBar, 2),
                Some(b'=') => self.operator(BarEqual, 2),
                _ => self.operator(Bar, 1),
            },
            '&' => match rest.as_bytes().get(1) {
                Some(b'&') => self.operator(AndAnd, 2),
                Some(b'=') => self.operator(AndEqual, 2),
                _ => self.operator(And, 1),
            },
            '^' => match rest.as_bytes().get(1) {
                Some(b'=') => self.operator(CaretEqual, 2),
                _ => self.operator(Caret, 1),
            },
            '=' => match rest.as_bytes().get(1) {
                Some(b'=') => self.operator(EqualEqual, 2),
                _ => self.operator(Equal, 1),
            },
            '!' => match rest.as_bytes().get(1) {
                Some(b'=') => self.operator(BangEqual, 2),
                _ => self.operator(Bang, 1),
            },
            '<' => match (rest.as_bytes().get(1), rest.as_bytes().get(2)) {
                (Some(b'<'), Some(b'=')) => self.operator(LessLessEqual, 3),
                (Some(b'<'), _) => self.operator(LessLess, 2),
                (Some(b'='), _) => self.operator(LessEqual, 2),
                _ => self.operator(Less, 1),
            },
            '>' => match (rest.as_bytes().get(1), rest.as_bytes().get(2)) {
                (Some(b'>'), Some(b'=')) => self.operator(GreaterGreaterEqual, 3),
                (Some(b'>'), _) => self.operator(GreaterGreater, 2),
                (Some(b'='), _) => self.operator(GreaterEqual, 2),
                _ => self.operator(Greater, 1),
            },
            '+' => match rest.as_bytes().get(1) {
                Some(b'+') => self.operator(PlusPlus, 2),
                Some(b'=') => self.operator(PlusEqual, 2),
                _ => self.operator(Plus, 1),
            },
            '-' => match rest.as_bytes().get(1) {
                Some(b'-') => self.operator(MinusMinus, 2),
                Some(b'=') => self.operator(MinusEqual, 2),
                _ => self.operator(Minus, 1),
            },
            '*' => match (rest.as_bytes().get(1), rest.as_bytes().get(2)) {
                (Some(b'*'), _) => self.operator(AsteriskAsterisk, 2),
                (Some(b'='), _) => self.operator(AsteriskEqual, 2),
                _ => self.operator(Asterisk, 1),
            },
            '/' => match rest.as_bytes().get(1) {
                Some(b'=') => self.operator(SlashEqual, 2),
                _ => self.operator(Slash, 1),
            },
            '%' => match rest.as_bytes().get(1) {
                Some(b'=') => self.operator(PercentEqual, 2),
                _ => self.operator(Percent, 1),
            },
            _ => {
                return Some(Err(Error {
                    cause: TokenError::InvalidCharacter,
                    location: self.index..self.index + first.len_utf8(),
                }))
            }
        };
        Some(Ok(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<TokenValue<'_>> {
        Tokens::new(source)
            .map(|t| t.unwrap().value)
            .collect()
    }

    #[test]
    fn decimal_constant() {
        assert_eq!(values("42"), [TokenValue::Number(42)]);
    }

    #[test]
    fn octal_constant() {
        assert_eq!(values("0755"), [TokenValue::Number(0o755)]);
    }

    #[test]
    fn hexadecimal_constant() {
        assert_eq!(values("0xFF 0X10"), [TokenValue::Number(255), TokenValue::Number(16)]);
    }

    #[test]
    fn lone_zero_is_decimal() {
        assert_eq!(values("0"), [TokenValue::Number(0)]);
    }

    #[test]
    fn invalid_octal_digit() {
        let err = Tokens::new("08").next().unwrap().unwrap_err();
        assert_eq!(err.cause, TokenError::InvalidNumber);
        assert_eq!(err.location, 0..2);
    }

    #[test]
    fn variable_names() {
        assert_eq!(
            values("foo _bar x1"),
            [
                TokenValue::Variable("foo"),
                TokenValue::Variable("_bar"),
                TokenValue::Variable("x1"),
            ]
        );
    }

    #[test]
    fn maximal_munch_of_operators() {
        use Operator::*;
        assert_eq!(
            values("a<<=b>>c**d"),
            [
                TokenValue::Variable("a"),
                TokenValue::Operator(LessLessEqual),
                TokenValue::Variable("b"),
                TokenValue::Operator(GreaterGreater),
                TokenValue::Variable("c"),
                TokenValue::Operator(AsteriskAsterisk),
                TokenValue::Variable("d"),
            ]
        );
    }

    #[test]
    fn increment_and_decrement() {
        use Operator::*;
        assert_eq!(
            values("++i--"),
            [
                TokenValue::Operator(PlusPlus),
                TokenValue::Variable("i"),
                TokenValue::Operator(MinusMinus),
            ]
        );
    }

    #[test]
    fn whitespace_is_skipped() {
        assert_eq!(
            values("  1\t+\n2 "),
            [
                TokenValue::Number(1),
                TokenValue::Operator(Operator::Plus),
                TokenValue::Number(2),
            ]
        );
    }

    #[test]
    fn invalid_character() {
        let err = Tokens::new("1 @ 2").nth(1).unwrap().unwrap_err();
        assert_eq!(err.cause, TokenError::InvalidCharacter);
        assert_eq!(err.location, 2..3);
    }

    #[test]
    fn token_locations() {
        let mut tokens = Tokens::new("ab + 7");
        assert_eq!(tokens.next().unwrap().unwrap().location, 0..2);
        assert_eq!(tokens.next().unwrap().unwrap().location, 3..4);
        assert_eq!(tokens.next().unwrap().unwrap().location, 5..6);
    }
}
