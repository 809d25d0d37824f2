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

//! Parsing of lists, and-or lists, pipelines, and command dispatch

use super::core::Parser;
use super::error::{Result, SyntaxError};
use super::lex::{Keyword, Operator, TokenId};
use crate::syntax::{
    AndOr, AndOrList, Command, Fd, Item, List, Pipeline, Redir, RedirBody, RedirOp, TextUnit,
    Word, WordUnit,
};
use std::rc::Rc;

impl Parser<'_> {
    /// Parses a list on a single line, stopping at a newline, closing
    /// token, or the end of input.
    pub(super) fn list(&mut self) -> Result<List> {
        self.list_impl(false)
    }

    /// Parses a list inside a compound command, where newlines separate
    /// items like `;`.
    pub(super) fn compound_list(&mut self) -> Result<List> {
        self.list_impl(true)
    }

    fn list_impl(&mut self, cross_newlines: bool) -> Result<List> {
        let mut items = Vec::new();
        loop {
            if cross_newlines {
                self.linebreak()?;
            }
            let start = self.peek_token()?.index;
            let Some(and_or) = self.and_or_list()? else {
                break;
            };
            let location = self.location_from(start);
            let mut is_async = false;
            let mut more = false;
            match self.peek_token()?.id {
                TokenId::Operator(Operator::And) => {
                    self.take_token()?;
                    is_async = true;
                    more = true;
                }
                TokenId::Operator(Operator::Semicolon) => {
                    self.take_token()?;
                    more = true;
                }
                TokenId::Operator(Operator::Newline) if cross_newlines => {
                    self.take_token()?;
                    more = true;
                }
                _ => {}
            }
            items.push(Item {
                and_or: Rc::new(and_or),
                is_async,
                location,
            });
            if !more {
                break;
            }
        }
        Ok(List(items))
    }

    /// Parses pipelines connected by `&&` and `||`.
    ///
    /// Returns `None` if no command starts here.
    pub(super) fn and_or_list(&mut self) -> Result<Option<AndOrList>> {
        let Some(first) = self.pipeline()? else {
            return Ok(None);
        };
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_token()?.id {
                TokenId::Operator(Operator::AndAnd) => AndOr::AndThen,
                TokenId::Operator(Operator::BarBar) => AndOr::OrElse,
                _ => break,
            };
            let op_token = self.take_token()?;
            self.linebreak()?;
            let Some(next) = self.pipeline()? else {
                return self
                    .error_at(SyntaxError::MissingCommandAfterAndOr, op_token.word.location);
            };
            rest.push((op, next));
        }
        Ok(Some(AndOrList { first, rest }))
    }

    /// Parses a possibly negated pipeline.
    pub(super) fn pipeline(&mut self) -> Result<Option<Pipeline>> {
        let mut negation = false;
        if self.peek_token()?.id == TokenId::Token(Some(Keyword::Bang)) {
            self.take_token()?;
            if self.peek_token()?.id == TokenId::Token(Some(Keyword::Bang)) {
                let second = self.take_token()?;
                return self.error_at(SyntaxError::DoubleNegation, second.word.location);
            }
            negation = true;
        }

        let Some(first) = self.command()? else {
            if negation {
                let token = self.peek_token()?;
                let location = token.word.location.clone();
                return self.error_at(SyntaxError::MissingCommandAfterBang, location);
            }
            return Ok(None);
        };

        let mut commands = vec![first];
        loop {
            let merge_stderr = match self.peek_token()?.id {
                TokenId::Operator(Operator::Bar) => false,
                TokenId::Operator(Operator::BarAnd) => true,
                _ => break,
            };
            let op_token = self.take_token()?;
            if merge_stderr {
                // `a |& b` is sugar for `a 2>&1 | b`.
                let last = commands.last_mut().unwrap();
                push_stderr_merge(last, &op_token.word.location);
            }
            self.linebreak()?;
            let Some(next) = self.command()? else {
                return self.error_at(SyntaxError::MissingCommandAfterBar, op_token.word.location);
            };
            commands.push(next);
        }

        let commands = commands.into_iter().map(Rc::new).collect();
        Ok(Some(Pipeline { commands, negation }))
    }

    /// Parses one command, dispatching on the leading token.
    ///
    /// Returns `None` when the leading token cannot start a command
    /// (a closing keyword, separator, or the end of input).
    pub(super) fn command(&mut self) -> Result<Option<Command>> {
        let token = self.peek_token()?;
        match token.id {
            TokenId::EndOfInput => Ok(None),
            TokenId::Operator(Operator::OpenParen) => {
                Ok(self.full_compound_command()?.map(Command::Compound))
            }
            TokenId::Operator(op) if op.is_separator() => Ok(None),
            TokenId::Operator(_) | TokenId::IoNumber(_) => {
                // A redirection can begin a simple command.
                self.simple_command().map(Some)
            }
            TokenId::Token(Some(keyword)) => match keyword {
                Keyword::OpenBrace
                | Keyword::If
                | Keyword::While
                | Keyword::Until
                | Keyword::For
                | Keyword::Case
                | Keyword::OpenBracketBracket => {
                    Ok(self.full_compound_command()?.map(Command::Compound))
                }
                Keyword::Function => self.function_keyword_definition().map(Some),
                Keyword::Bang => {
                    let location = token.word.location.clone();
                    self.error_at(SyntaxError::InvalidCommandToken, location)
                }
                _ if keyword.is_clause_delimiter() => Ok(None),
                // `in` outside its clause, etc.
                _ => {
                    let location = token.word.location.clone();
                    self.error_at(SyntaxError::InvalidCommandToken, location)
                }
            },
            TokenId::Token(None) => self.simple_command().map(Some),
        }
    }
}

/// Appends the `2>&1` implied by `|&` to a command.
fn push_stderr_merge(command: &mut Command, location: &crate::source::Location) {
    let operand = Word {
        units: vec![WordUnit::Unquoted(TextUnit::Literal('1'))],
        location: location.clone(),
    };
    let redir = Redir {
        fd: Some(Fd::STDERR),
        body: RedirBody::Normal {
            operator: RedirOp::FdOut,
            operand,
        },
        location: location.clone(),
    };
    match command {
        Command::Simple(simple) => simple.redirs.push(redir),
        Command::Compound(compound) => compound.redirs.push(redir),
        // A function definition produces no output; nothing to merge.
        Command::Function(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lex::Lexer;
    use crate::source::Source;
    use assert_matches::assert_matches;

    fn parse(s: &str) -> List {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        Parser::new(&mut lexer).command_line().unwrap().unwrap()
    }

    fn parse_err(s: &str) -> SyntaxError {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        Parser::new(&mut lexer).command_line().unwrap_err().cause
    }

    #[test]
    fn sequential_and_async_items() {
        let list = parse("a; b& c\n");
        assert_eq!(list.0.len(), 3);
        assert!(!list.0[0].is_async);
        assert!(list.0[1].is_async);
        assert!(!list.0[2].is_async);
    }

    #[test]
    fn item_location_covers_its_text() {
        let list = parse("echo one& two\n");
        let location = &list.0[0].location;
        let text: String = location.code.value.chars().collect::<Vec<_>>()
            [location.range.clone()]
        .iter()
        .collect();
        assert_eq!(text, "echo one");
    }

    #[test]
    fn and_or_chains() {
        let list = parse("a && b || c\n");
        let and_or = &list.0[0].and_or;
        assert_eq!(and_or.rest.len(), 2);
        assert_eq!(and_or.rest[0].0, AndOr::AndThen);
        assert_eq!(and_or.rest[1].0, AndOr::OrElse);
    }

    #[test]
    fn and_or_allows_newline_after_operator() {
        let list = parse("a &&\n\nb\n");
        assert_eq!(list.0[0].and_or.rest.len(), 1);
    }

    #[test]
    fn pipeline_with_negation() {
        let list = parse("! a | b\n");
        let pipeline = &list.0[0].and_or.first;
        assert!(pipeline.negation);
        assert_eq!(pipeline.commands.len(), 2);
    }

    #[test]
    fn double_negation_is_an_error() {
        assert_eq!(parse_err("! ! a\n"), SyntaxError::DoubleNegation);
    }

    #[test]
    fn missing_command_after_operators() {
        assert_eq!(parse_err("a |\n"), SyntaxError::MissingCommandAfterBar);
        assert_eq!(parse_err("a &&\n"), SyntaxError::MissingCommandAfterAndOr);
    }

    #[test]
    fn bar_and_desugars_to_stderr_merge() {
        let list = parse("a |& b\n");
        let pipeline = &list.0[0].and_or.first;
        assert_matches!(&*pipeline.commands[0], Command::Simple(simple) => {
            assert_eq!(simple.redirs.len(), 1);
            assert_eq!(simple.redirs[0].fd, Some(Fd::STDERR));
        });
    }

    #[test]
    fn misplaced_keyword_is_an_error() {
        assert_eq!(parse_err("in x\n"), SyntaxError::InvalidCommandToken);
    }

    #[test]
    fn pipeline_allows_newline_after_bar() {
        let list = parse("a |\nb\n");
        assert_eq!(list.0[0].and_or.first.commands.len(), 2);
    }
}
