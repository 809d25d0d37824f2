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

//! Parser state and entry points

use super::error::{Error, Result, SyntaxError};
use super::lex::{Lexer, Operator, Token, TokenId};
use crate::source::Location;
use crate::syntax::{HereDoc, List};
use std::rc::Rc;

/// Recursive-descent parser over a token stream
///
/// The parser keeps one token of lookahead and a queue of here-document
/// operators whose contents are read when the newline ending their line
/// is consumed.
pub struct Parser<'l> {
    lexer: &'l mut Lexer,
    token: Option<Token>,
    here_docs: Vec<(Rc<HereDoc>, usize)>,
    /// End index of the most recently taken token
    last_end: usize,
}

impl<'l> Parser<'l> {
    /// Creates a parser reading tokens from the given lexer.
    pub fn new(lexer: &'l mut Lexer) -> Parser<'l> {
        Parser {
            lexer,
            token: None,
            here_docs: Vec::new(),
            last_end: 0,
        }
    }

    /// Peeks the next token without consuming it.
    pub(super) fn peek_token(&mut self) -> Result<&Token> {
        if self.token.is_none() {
            self.token = Some(self.lexer.next_token()?);
        }
        Ok(self.token.as_ref().unwrap())
    }

    /// Consumes and returns the next token.
    ///
    /// Taking a newline token also reads the contents of any pending
    /// here-documents, which start just after that newline.
    pub(super) fn take_token(&mut self) -> Result<Token> {
        let token = match self.token.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        self.last_end = token.word.location.range.end;
        if token.id == TokenId::Operator(Operator::Newline) {
            self.read_pending_here_docs()?;
        }
        Ok(token)
    }

    /// Direct access to the underlying lexer, for the constructs that
    /// must look at raw characters following the buffered token (`((`).
    pub(super) fn lexer(&mut self) -> &mut Lexer {
        self.lexer
    }

    /// Builds a location spanning from `start` to the last taken token.
    pub(super) fn location_from(&self, start: usize) -> Location {
        let end = self.last_end.max(start);
        self.lexer.location_for(start..end)
    }

    pub(super) fn error_at<T>(&self, cause: SyntaxError, location: Location) -> Result<T> {
        Err(Error { cause, location })
    }

    /// Registers a here-document whose content follows the next newline.
    pub(super) fn register_here_doc(&mut self, here_doc: Rc<HereDoc>, op_index: usize) {
        self.here_docs.push((here_doc, op_index));
    }

    fn read_pending_here_docs(&mut self) -> Result<()> {
        for (here_doc, op_index) in std::mem::take(&mut self.here_docs) {
            self.lexer.here_doc_content(&here_doc, op_index)?;
        }
        Ok(())
    }

    /// Consumes consecutive newline tokens.
    pub(super) fn linebreak(&mut self) -> Result<()> {
        while self.peek_token()?.id == TokenId::Operator(Operator::Newline) {
            self.take_token()?;
        }
        Ok(())
    }

    /// Parses one logical line: a list terminated by a newline or the
    /// end of input.
    ///
    /// Returns `None` when the input has ended. The terminating newline
    /// (and any pending here-document contents) is consumed.
    pub fn command_line(&mut self) -> Result<Option<List>> {
        if self.peek_token()?.id == TokenId::EndOfInput {
            return Ok(None);
        }
        let list = self.list()?;
        match self.peek_token()?.id {
            TokenId::Operator(Operator::Newline) => {
                self.take_token()?;
            }
            TokenId::EndOfInput => {
                // Here-docs registered on the last line read their
                // content from what remains.
                self.read_pending_here_docs()?;
            }
            _ => {
                let token = self.take_token()?;
                return self.error_at(SyntaxError::MissingSeparator, token.word.location);
            }
        }
        Ok(Some(list))
    }

    /// Parses the whole input as a program.
    pub fn program(&mut self) -> Result<List> {
        let mut items = Vec::new();
        while let Some(list) = self.command_line()? {
            items.extend(list.0);
        }
        Ok(List(items))
    }
}

impl Lexer {
    /// Location helper used by the parser.
    pub(super) fn location_for(&self, range: std::ops::Range<usize>) -> Location {
        Location {
            code: Rc::clone(self.code()),
            range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    fn parse_line(s: &str) -> Option<List> {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        Parser::new(&mut lexer).command_line().unwrap()
    }

    #[test]
    fn empty_input_is_none() {
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn blank_line_is_an_empty_list() {
        let list = parse_line("\n").unwrap();
        assert_eq!(list.0, []);
    }

    #[test]
    fn comment_only_line() {
        let list = parse_line("# nothing here\n").unwrap();
        assert_eq!(list.0, []);
    }

    #[test]
    fn trailing_token_is_an_error() {
        let mut lexer = Lexer::from_memory("echo hi )", Source::Unknown);
        let e = Parser::new(&mut lexer).command_line().unwrap_err();
        assert_eq!(e.cause, SyntaxError::MissingSeparator);
    }

    #[test]
    fn program_concatenates_lines() {
        let mut lexer = Lexer::from_memory("a\nb\nc\n", Source::Unknown);
        let list = Parser::new(&mut lexer).program().unwrap();
        assert_eq!(list.0.len(), 3);
    }

    #[test]
    fn here_doc_content_read_at_newline() {
        let mut lexer = Lexer::from_memory("cat <<EOF\nhello\nEOF\necho done\n", Source::Unknown);
        let mut parser = Parser::new(&mut lexer);
        let first = parser.command_line().unwrap().unwrap();
        assert_eq!(first.to_string(), "cat <<EOF");
        let second = parser.command_line().unwrap().unwrap();
        assert_eq!(second.to_string(), "echo done");
    }

    #[test]
    fn here_doc_at_end_of_input_without_newline_after_body() {
        let mut lexer = Lexer::from_memory("cat <<EOF\nbody\nEOF", Source::Unknown);
        let mut parser = Parser::new(&mut lexer);
        let list = parser.command_line().unwrap().unwrap();
        assert_eq!(list.to_string(), "cat <<EOF");
    }
}
