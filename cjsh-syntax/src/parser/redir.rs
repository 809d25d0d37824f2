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

//! Parsing of redirections

use super::core::Parser;
use super::error::{Result, SyntaxError};
use super::lex::{Operator, TokenId};
use crate::syntax::{Fd, HereDoc, Redir, RedirBody, RedirOp};
use std::cell::OnceCell;
use std::rc::Rc;

fn redir_op(operator: Operator) -> Option<RedirOp> {
    use Operator::*;
    match operator {
        Less => Some(RedirOp::FileIn),
        Greater => Some(RedirOp::FileOut),
        GreaterGreater => Some(RedirOp::FileAppend),
        LessGreater => Some(RedirOp::FileInOut),
        GreaterBar => Some(RedirOp::FileClobber),
        LessAnd => Some(RedirOp::FdIn),
        GreaterAnd => Some(RedirOp::FdOut),
        LessLessLess => Some(RedirOp::HereString),
        AndGreater => Some(RedirOp::OutErr),
        _ => None,
    }
}

impl Parser<'_> {
    /// Parses one redirection if the next tokens form one.
    pub(super) fn maybe_redirection(&mut self) -> Result<Option<Redir>> {
        let fd = match self.peek_token()?.id {
            TokenId::IoNumber(fd) => {
                self.take_token()?;
                Some(Fd(fd))
            }
            _ => None,
        };

        let operator = match self.peek_token()?.id {
            TokenId::Operator(op) => op,
            // An IO_NUMBER adjoins its operator, but `2<(…)` lexes the
            // process substitution as a word.
            _ if fd.is_some() => {
                let token = self.take_token()?;
                return self.error_at(SyntaxError::MissingRedirOperand, token.word.location);
            }
            _ => return Ok(None),
        };

        let here_doc = matches!(operator, Operator::LessLess | Operator::LessLessDash);
        let normal = redir_op(operator);
        if !here_doc && normal.is_none() {
            return Ok(None);
        }

        let op_token = self.take_token()?;
        let op_location = op_token.word.location;
        let op_index = op_token.index;

        let operand = self.take_token()?;
        if !matches!(operand.id, TokenId::Token(_)) {
            let cause = if here_doc {
                SyntaxError::MissingHereDocDelimiter
            } else {
                SyntaxError::MissingRedirOperand
            };
            return self.error_at(cause, op_location);
        }

        let body = if here_doc {
            let here_doc = Rc::new(HereDoc {
                delimiter: operand.word,
                remove_tabs: operator == Operator::LessLessDash,
                content: OnceCell::new(),
            });
            self.register_here_doc(Rc::clone(&here_doc), op_index);
            RedirBody::HereDoc(here_doc)
        } else {
            let mut operand_word = operand.word;
            operand_word.parse_tilde_front();
            RedirBody::Normal {
                operator: normal.unwrap(),
                operand: operand_word,
            }
        };

        Ok(Some(Redir {
            fd,
            body,
            location: op_location,
        }))
    }

    /// Parses zero or more redirections.
    pub(super) fn redirections(&mut self) -> Result<Vec<Redir>> {
        let mut redirs = Vec::new();
        while let Some(redir) = self.maybe_redirection()? {
            redirs.push(redir);
        }
        Ok(redirs)
    }
}
