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

//! Parsing of `[[ … ]]` conditional expressions
//!
//! The expression grammar, loosest first:
//!
//! ```text
//! or      := and ('||' and)*
//! and     := primary ('&&' primary)*
//! primary := '!' primary
//!          | '(' or ')'
//!          | unary-op word
//!          | word binary-op word
//!          | word
//! ```
//!
//! Operands are ordinary words; they are expanded at execution time
//! without field splitting or pathname expansion.

use super::core::Parser;
use super::error::{Result, SyntaxError};
use super::lex::{Keyword, Operator, TokenId};
use crate::source::Location;
use crate::syntax::{CondBinaryOp, CondExpr, CondUnaryOp, Word};

impl Parser<'_> {
    /// Parses the expression and the closing `]]` of a conditional
    /// command, after its `[[` token.
    pub(super) fn cond_expression(&mut self, opening: &Location) -> Result<CondExpr> {
        let expr = self.cond_or(opening)?;
        let token = self.peek_token()?;
        match token.id {
            TokenId::Token(Some(Keyword::CloseBracketBracket)) => {
                self.take_token()?;
                Ok(expr)
            }
            TokenId::EndOfInput => {
                let location = token.word.location.clone();
                self.error_at(
                    SyntaxError::UnclosedCond {
                        opening_location: opening.clone(),
                    },
                    location,
                )
            }
            _ => {
                let location = token.word.location.clone();
                self.error_at(SyntaxError::InvalidCondToken, location)
            }
        }
    }

    fn cond_or(&mut self, opening: &Location) -> Result<CondExpr> {
        let mut expr = self.cond_and(opening)?;
        loop {
            self.cond_linebreak()?;
            if self.peek_token()?.id != TokenId::Operator(Operator::BarBar) {
                return Ok(expr);
            }
            self.take_token()?;
            let rhs = self.cond_and(opening)?;
            expr = CondExpr::Or(Box::new(expr), Box::new(rhs));
        }
    }

    fn cond_and(&mut self, opening: &Location) -> Result<CondExpr> {
        let mut expr = self.cond_primary(opening)?;
        loop {
            self.cond_linebreak()?;
            if self.peek_token()?.id != TokenId::Operator(Operator::AndAnd) {
                return Ok(expr);
            }
            self.take_token()?;
            let rhs = self.cond_primary(opening)?;
            expr = CondExpr::And(Box::new(expr), Box::new(rhs));
        }
    }

    fn cond_primary(&mut self, opening: &Location) -> Result<CondExpr> {
        self.cond_linebreak()?;
        let token = self.peek_token()?;
        match token.id {
            TokenId::Token(Some(Keyword::Bang)) => {
                self.take_token()?;
                let operand = self.cond_primary(opening)?;
                Ok(CondExpr::Not(Box::new(operand)))
            }
            TokenId::Operator(Operator::OpenParen) => {
                self.take_token()?;
                let inner = self.cond_or(opening)?;
                self.cond_linebreak()?;
                let close = self.peek_token()?;
                if close.id != TokenId::Operator(Operator::CloseParen) {
                    let location = close.word.location.clone();
                    return self.error_at(SyntaxError::InvalidCondToken, location);
                }
                self.take_token()?;
                Ok(inner)
            }
            TokenId::Token(_) => {
                let word = self.cond_word(opening)?;
                // `-f x` and friends
                if let Some(op) = word
                    .to_string_if_literal()
                    .as_deref()
                    .and_then(CondUnaryOp::parse)
                {
                    if self.cond_operand_follows()? {
                        let operand = self.cond_word(opening)?;
                        return Ok(CondExpr::Unary { op, operand });
                    }
                }
                // `x op y`?
                if let Some(op) = self.cond_binary_op()? {
                    let rhs = self.cond_word(opening)?;
                    return Ok(CondExpr::Binary { op, lhs: word, rhs });
                }
                Ok(CondExpr::Word(word))
            }
            TokenId::EndOfInput => {
                let location = token.word.location.clone();
                self.error_at(
                    SyntaxError::UnclosedCond {
                        opening_location: opening.clone(),
                    },
                    location,
                )
            }
            _ => {
                let location = token.word.location.clone();
                self.error_at(SyntaxError::InvalidCondToken, location)
            }
        }
    }

    /// Takes an operand word, rejecting anything else.
    fn cond_word(&mut self, opening: &Location) -> Result<Word> {
        let token = self.peek_token()?;
        match token.id {
            TokenId::Token(Some(Keyword::CloseBracketBracket)) | TokenId::EndOfInput => {
                let location = token.word.location.clone();
                self.error_at(
                    SyntaxError::UnclosedCond {
                        opening_location: opening.clone(),
                    },
                    location,
                )
            }
            TokenId::Token(_) => {
                let mut word = self.take_token()?.word;
                word.parse_tilde_front();
                Ok(word)
            }
            _ => {
                let location = token.word.location.clone();
                self.error_at(SyntaxError::InvalidCondToken, location)
            }
        }
    }

    /// Whether the next token can be a unary operator's operand.
    fn cond_operand_follows(&mut self) -> Result<bool> {
        Ok(matches!(
            self.peek_token()?.id,
            TokenId::Token(keyword) if keyword != Some(Keyword::CloseBracketBracket)
        ))
    }

    /// Recognizes a binary operator at the cursor, if present.
    fn cond_binary_op(&mut self) -> Result<Option<CondBinaryOp>> {
        let token = self.peek_token()?;
        let op = match token.id {
            TokenId::Operator(Operator::Less) => Some(CondBinaryOp::StrBefore),
            TokenId::Operator(Operator::Greater) => Some(CondBinaryOp::StrAfter),
            TokenId::Token(None) => token
                .word
                .to_string_if_literal()
                .as_deref()
                .and_then(CondBinaryOp::parse),
            _ => None,
        };
        if op.is_some() {
            self.take_token()?;
        }
        Ok(op)
    }

    /// Newlines are mere whitespace inside `[[ ]]`.
    fn cond_linebreak(&mut self) -> Result<()> {
        self.linebreak()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lex::Lexer;
    use crate::source::Source;
    use crate::syntax::{Command, CompoundCommand, List};
    use assert_matches::assert_matches;

    fn cond(s: &str) -> CondExpr {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        let list: List = Parser::new(&mut lexer).program().unwrap();
        assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Compound(full) => assert_matches!(
                &full.command,
                CompoundCommand::DoubleBracket(expr) => expr.clone()
            )
        )
    }

    fn cond_err(s: &str) -> SyntaxError {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        Parser::new(&mut lexer).program().unwrap_err().cause
    }

    #[test]
    fn unary_file_test() {
        assert_matches!(cond("[[ -f /etc/passwd ]]\n"), CondExpr::Unary { op, operand } => {
            assert_eq!(op, CondUnaryOp::IsFile);
            assert_eq!(operand.to_string(), "/etc/passwd");
        });
    }

    #[test]
    fn string_comparisons() {
        assert_matches!(cond("[[ a == b ]]\n"), CondExpr::Binary { op: CondBinaryOp::Match, .. });
        assert_matches!(cond("[[ a = b ]]\n"), CondExpr::Binary { op: CondBinaryOp::Match, .. });
        assert_matches!(cond("[[ a != b ]]\n"), CondExpr::Binary { op: CondBinaryOp::NoMatch, .. });
        assert_matches!(cond("[[ a < b ]]\n"), CondExpr::Binary { op: CondBinaryOp::StrBefore, .. });
        assert_matches!(cond("[[ a > b ]]\n"), CondExpr::Binary { op: CondBinaryOp::StrAfter, .. });
    }

    #[test]
    fn regex_match() {
        assert_matches!(cond("[[ $x =~ ^[0-9]+$ ]]\n"), CondExpr::Binary { op, rhs, .. } => {
            assert_eq!(op, CondBinaryOp::RegexMatch);
            assert_eq!(rhs.to_string(), "^[0-9]+$");
        });
    }

    #[test]
    fn integer_comparisons() {
        assert_matches!(cond("[[ 1 -lt 2 ]]\n"), CondExpr::Binary { op: CondBinaryOp::IntLt, .. });
        assert_matches!(cond("[[ $n -ge 0 ]]\n"), CondExpr::Binary { op: CondBinaryOp::IntGe, .. });
    }

    #[test]
    fn file_age_comparisons() {
        assert_matches!(cond("[[ a -nt b ]]\n"), CondExpr::Binary { op: CondBinaryOp::NewerThan, .. });
        assert_matches!(cond("[[ a -ef b ]]\n"), CondExpr::Binary { op: CondBinaryOp::SameFile, .. });
    }

    #[test]
    fn negation_and_grouping() {
        assert_matches!(cond("[[ ! -e x ]]\n"), CondExpr::Not(inner) => {
            assert_matches!(&*inner, CondExpr::Unary { op: CondUnaryOp::Exists, .. });
        });
        assert_matches!(cond("[[ ( a || b ) && c ]]\n"), CondExpr::And(lhs, _) => {
            assert_matches!(&*lhs, CondExpr::Or(..));
        });
    }

    #[test]
    fn logical_precedence_and_over_or() {
        // a || b && c parses as a || (b && c)
        assert_matches!(cond("[[ a || b && c ]]\n"), CondExpr::Or(_, rhs) => {
            assert_matches!(&*rhs, CondExpr::And(..));
        });
    }

    #[test]
    fn bare_word_tests_non_emptiness() {
        assert_matches!(cond("[[ $x ]]\n"), CondExpr::Word(word) => {
            assert_eq!(word.to_string(), "$x");
        });
    }

    #[test]
    fn unary_op_without_operand_is_a_word() {
        // `[[ -f ]]` tests that the string `-f` is non-empty.
        assert_matches!(cond("[[ -f ]]\n"), CondExpr::Word(word) => {
            assert_eq!(word.to_string(), "-f");
        });
    }

    #[test]
    fn missing_close_is_incomplete() {
        let e = cond_err("[[ a == b\n");
        assert_matches!(e, SyntaxError::UnclosedCond { .. });
        assert!(e.is_incomplete());
    }

    #[test]
    fn stray_operator_is_an_error() {
        assert_eq!(cond_err("[[ a ; b ]]\n"), SyntaxError::InvalidCondToken);
    }

    #[test]
    fn double_bracket_not_at_command_position_is_a_word() {
        let mut lexer = Lexer::from_memory("echo [[ x ]]\n", Source::Unknown);
        let list = Parser::new(&mut lexer).program().unwrap();
        assert_matches!(&*list.0[0].and_or.first.commands[0], Command::Simple(simple) => {
            assert_eq!(simple.words.len(), 4);
        });
    }
}
