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

//! Parsing of compound commands and function definitions

use super::core::Parser;
use super::error::{Result, SyntaxError};
use super::lex::{Keyword, Operator, TokenId};
use crate::source::Location;
use crate::syntax::{
    ArithForControl, CaseContinuation, CaseItem, Command, CompoundCommand, ElifThen,
    FullCompoundCommand, FunctionDefinition, List, Text, Word,
};
use std::rc::Rc;

impl Parser<'_> {
    /// Parses a compound command with its trailing redirections.
    pub(super) fn full_compound_command(&mut self) -> Result<Option<FullCompoundCommand>> {
        let Some(command) = self.compound_command()? else {
            return Ok(None);
        };
        let redirs = self.redirections()?;
        Ok(Some(FullCompoundCommand { command, redirs }))
    }

    fn compound_command(&mut self) -> Result<Option<CompoundCommand>> {
        match self.peek_token()?.id {
            TokenId::Operator(Operator::OpenParen) => self.subshell_or_arith().map(Some),
            TokenId::Token(Some(Keyword::OpenBrace)) => self.grouping().map(Some),
            TokenId::Token(Some(Keyword::If)) => self.if_command().map(Some),
            TokenId::Token(Some(Keyword::While)) => self.loop_command(true).map(Some),
            TokenId::Token(Some(Keyword::Until)) => self.loop_command(false).map(Some),
            TokenId::Token(Some(Keyword::For)) => self.for_command().map(Some),
            TokenId::Token(Some(Keyword::Select)) => self.select_command().map(Some),
            TokenId::Token(Some(Keyword::Case)) => self.case_command().map(Some),
            TokenId::Token(Some(Keyword::OpenBracketBracket)) => {
                self.double_bracket().map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Consumes the expected closing keyword of a compound command.
    ///
    /// Reports `IncompleteCompound` at the end of input and
    /// `MissingKeyword` (with a suggestion) on any other token.
    fn expect_keyword(&mut self, keyword: Keyword, opening: &Location) -> Result<()> {
        let token = self.peek_token()?;
        if token.id == TokenId::Token(Some(keyword)) {
            self.take_token()?;
            return Ok(());
        }
        let location = token.word.location.clone();
        let cause = if token.id == TokenId::EndOfInput {
            SyntaxError::IncompleteCompound {
                expected: keyword.as_str(),
                opening_location: opening.clone(),
            }
        } else {
            SyntaxError::MissingKeyword {
                keyword: keyword.as_str(),
                opening_location: opening.clone(),
            }
        };
        self.error_at(cause, location)
    }

    /// Parses `{ list; }`.
    fn grouping(&mut self) -> Result<CompoundCommand> {
        let open = self.take_token()?;
        let opening = open.word.location;
        let body = self.compound_list()?;
        if body.0.is_empty() {
            let location = self.peek_token()?.word.location.clone();
            return self.error_at(SyntaxError::EmptyGrouping, location);
        }
        self.expect_keyword(Keyword::CloseBrace, &opening)?;
        Ok(CompoundCommand::Grouping(body))
    }

    /// Parses `( list )` or `(( expression ))`.
    fn subshell_or_arith(&mut self) -> Result<CompoundCommand> {
        // Look at the raw character after the buffered `(` token: an
        // adjacent second `(` starts an arithmetic command unless the
        // content turns out to be a subshell in a subshell.
        let open = self.peek_token()?.clone();
        if self.lexer().peek_char() == Some('(') {
            self.take_token()?;
            let paren_index = open.index;
            if let Some(expr) = self.lexer().arith_tail(paren_index, 2)? {
                return Ok(CompoundCommand::Arith { expr });
            }
            return self.finish_subshell(open.word.location);
        }
        self.take_token()?;
        self.finish_subshell(open.word.location)
    }

    fn finish_subshell(&mut self, opening: Location) -> Result<CompoundCommand> {
        let body = self.compound_list()?;
        if body.0.is_empty() {
            let location = self.peek_token()?.word.location.clone();
            return self.error_at(SyntaxError::EmptySubshell, location);
        }
        let close = self.peek_token()?;
        if close.id == TokenId::Operator(Operator::CloseParen) {
            self.take_token()?;
            return Ok(CompoundCommand::Subshell(body));
        }
        let location = close.word.location.clone();
        let cause = if close.id == TokenId::EndOfInput {
            SyntaxError::IncompleteCompound {
                expected: ")",
                opening_location: opening,
            }
        } else {
            SyntaxError::MissingKeyword {
                keyword: ")",
                opening_location: opening,
            }
        };
        self.error_at(cause, location)
    }

    /// Parses a clause body, requiring at least one command.
    fn clause(&mut self, keyword: &'static str) -> Result<List> {
        let body = self.compound_list()?;
        if body.0.is_empty() {
            let location = self.peek_token()?.word.location.clone();
            return self.error_at(SyntaxError::EmptyClause { keyword }, location);
        }
        Ok(body)
    }

    /// Parses `if … then …; [elif …;] [else …;] fi`.
    fn if_command(&mut self) -> Result<CompoundCommand> {
        let open = self.take_token()?;
        let opening = open.word.location;
        let mut branches = Vec::new();
        let condition = self.clause("if")?;
        self.expect_keyword(Keyword::Then, &opening)?;
        let body = self.clause("then")?;
        branches.push(ElifThen { condition, body });

        let mut r#else = None;
        loop {
            match self.peek_token()?.id {
                TokenId::Token(Some(Keyword::Elif)) => {
                    self.take_token()?;
                    let condition = self.clause("elif")?;
                    self.expect_keyword(Keyword::Then, &opening)?;
                    let body = self.clause("then")?;
                    branches.push(ElifThen { condition, body });
                }
                TokenId::Token(Some(Keyword::Else)) => {
                    self.take_token()?;
                    r#else = Some(self.clause("else")?);
                    break;
                }
                _ => break,
            }
        }
        self.expect_keyword(Keyword::Fi, &opening)?;
        Ok(CompoundCommand::If { branches, r#else })
    }

    /// Parses a `while` or `until` loop.
    fn loop_command(&mut self, is_while: bool) -> Result<CompoundCommand> {
        let open = self.take_token()?;
        let opening = open.word.location;
        let condition = self.clause(if is_while { "while" } else { "until" })?;
        self.expect_keyword(Keyword::Do, &opening)?;
        let body = self.clause("do")?;
        self.expect_keyword(Keyword::Done, &opening)?;
        Ok(if is_while {
            CompoundCommand::While { condition, body }
        } else {
            CompoundCommand::Until { condition, body }
        })
    }

    /// Parses `for name [in words]; do …; done` or the C-style
    /// `for ((init; cond; step)); do …; done`.
    fn for_command(&mut self) -> Result<CompoundCommand> {
        let open = self.take_token()?;
        let opening = open.word.location;

        if self.peek_token()?.id == TokenId::Operator(Operator::OpenParen)
            && self.lexer().peek_char() == Some('(')
        {
            let paren = self.take_token()?;
            let Some(control) = self.arith_for_control(paren.index)? else {
                return self.error_at(SyntaxError::InvalidForName, paren.word.location);
            };
            // An optional `;` may follow the control clause.
            if self.peek_token()?.id == TokenId::Operator(Operator::Semicolon) {
                self.take_token()?;
            }
            self.linebreak()?;
            self.expect_keyword(Keyword::Do, &opening)?;
            let body = self.clause("do")?;
            self.expect_keyword(Keyword::Done, &opening)?;
            return Ok(CompoundCommand::ArithFor { control, body });
        }

        let (name, values) = self.loop_name_and_values()?;
        self.linebreak()?;
        self.expect_keyword(Keyword::Do, &opening)?;
        let body = self.clause("do")?;
        self.expect_keyword(Keyword::Done, &opening)?;
        Ok(CompoundCommand::For { name, values, body })
    }

    /// Parses `select name [in words]; do ...; done`.
    fn select_command(&mut self) -> Result<CompoundCommand> {
        let open = self.take_token()?;
        let opening = open.word.location;
        let (name, values) = self.loop_name_and_values()?;
        self.linebreak()?;
        self.expect_keyword(Keyword::Do, &opening)?;
        let body = self.clause("do")?;
        self.expect_keyword(Keyword::Done, &opening)?;
        Ok(CompoundCommand::Select { name, values, body })
    }

    /// Parses the `name [in words] [;|newline]` head shared by `for`
    /// and `select`.
    fn loop_name_and_values(&mut self) -> Result<(Word, Option<Vec<Word>>)> {
        let name_token = self.peek_token()?;
        let name = match name_token.id {
            TokenId::Token(_) => {
                let token = self.take_token()?;
                if token.word.to_string_if_literal().is_none() {
                    return self.error_at(SyntaxError::InvalidForName, token.word.location);
                }
                token.word
            }
            _ => {
                let location = name_token.word.location.clone();
                return self.error_at(SyntaxError::MissingForName, location);
            }
        };

        let mut values = None;
        match self.peek_token()?.id {
            TokenId::Token(Some(Keyword::In)) => {
                self.take_token()?;
                let mut words = Vec::new();
                while let TokenId::Token(_) = self.peek_token()?.id {
                    let mut word = self.take_token()?.word;
                    word.parse_tilde_front();
                    words.push(word);
                }
                values = Some(words);
                // The word list must be terminated before `do`.
                match self.peek_token()?.id {
                    TokenId::Operator(Operator::Semicolon)
                    | TokenId::Operator(Operator::Newline) => {
                        self.take_token()?;
                    }
                    _ => {}
                }
            }
            TokenId::Operator(Operator::Semicolon) | TokenId::Operator(Operator::Newline) => {
                self.take_token()?;
            }
            _ => {}
        }
        Ok((name, values))
    }

    /// Reads the `((init; cond; step))` control of a C-style `for`, with
    /// the cursor on the second `(`.
    fn arith_for_control(&mut self, paren_index: usize) -> Result<Option<ArithForControl>> {
        let Some(content) = self.lexer().arith_tail(paren_index, 2)? else {
            return Ok(None);
        };
        let mut parts = split_arith_parts(content);
        if parts.len() != 3 {
            return Ok(None);
        }
        let step = parts.pop().unwrap();
        let condition = parts.pop().unwrap();
        let init = parts.pop().unwrap();
        Ok(Some(ArithForControl {
            init,
            condition,
            step,
        }))
    }

    /// Parses `case subject in items… esac`.
    fn case_command(&mut self) -> Result<CompoundCommand> {
        let open = self.take_token()?;
        let opening = open.word.location;

        let subject_token = self.peek_token()?;
        if !matches!(subject_token.id, TokenId::Token(_)) {
            let location = subject_token.word.location.clone();
            return self.error_at(SyntaxError::MissingCaseSubject, location);
        }
        let mut subject = self.take_token()?.word;
        subject.parse_tilde_front();

        self.linebreak()?;
        self.expect_keyword(Keyword::In, &opening)?;

        let mut items = Vec::new();
        loop {
            self.linebreak()?;
            if self.peek_token()?.id == TokenId::Token(Some(Keyword::Esac)) {
                self.take_token()?;
                break;
            }
            if self.peek_token()?.id == TokenId::EndOfInput {
                let location = self.peek_token()?.word.location.clone();
                return self.error_at(
                    SyntaxError::IncompleteCompound {
                        expected: "esac",
                        opening_location: opening,
                    },
                    location,
                );
            }
            items.push(self.case_item()?);
        }
        Ok(CompoundCommand::Case { subject, items })
    }

    fn case_item(&mut self) -> Result<CaseItem> {
        // The pattern list may be parenthesized.
        if self.peek_token()?.id == TokenId::Operator(Operator::OpenParen) {
            self.take_token()?;
        }

        let mut patterns = Vec::new();
        loop {
            let token = self.peek_token()?;
            if !matches!(token.id, TokenId::Token(_)) {
                let location = token.word.location.clone();
                let cause = if patterns.is_empty() {
                    SyntaxError::MissingPattern
                } else {
                    SyntaxError::InvalidPattern
                };
                return self.error_at(cause, location);
            }
            patterns.push(self.take_token()?.word);
            if self.peek_token()?.id == TokenId::Operator(Operator::Bar) {
                self.take_token()?;
                continue;
            }
            break;
        }

        let close = self.peek_token()?;
        if close.id != TokenId::Operator(Operator::CloseParen) {
            let location = close.word.location.clone();
            return self.error_at(SyntaxError::InvalidPattern, location);
        }
        self.take_token()?;

        let body = self.compound_list()?;

        let continuation = match self.peek_token()?.id {
            TokenId::Operator(Operator::SemicolonSemicolon) => {
                self.take_token()?;
                CaseContinuation::Break
            }
            TokenId::Operator(Operator::SemicolonAnd) => {
                self.take_token()?;
                CaseContinuation::FallThrough
            }
            TokenId::Operator(Operator::SemicolonSemicolonAnd) => {
                self.take_token()?;
                CaseContinuation::Continue
            }
            // The last item may omit its terminator before `esac`.
            _ => CaseContinuation::Break,
        };
        Ok(CaseItem {
            patterns,
            body,
            continuation,
        })
    }

    /// Parses `[[ expression ]]`.
    fn double_bracket(&mut self) -> Result<CompoundCommand> {
        let open = self.take_token()?;
        let opening = open.word.location;
        let expr = self.cond_expression(&opening)?;
        Ok(CompoundCommand::DoubleBracket(expr))
    }

    /// Parses a function definition introduced by the `function` keyword.
    pub(super) fn function_keyword_definition(&mut self) -> Result<Command> {
        let keyword = self.take_token()?;
        let start_location = keyword.word.location;

        let name_token = self.peek_token()?;
        if !matches!(name_token.id, TokenId::Token(_)) {
            let location = name_token.word.location.clone();
            return self.error_at(SyntaxError::MissingFunctionBody, location);
        }
        let name = self.take_token()?.word;

        // Optional `()` after the name.
        if self.peek_token()?.id == TokenId::Operator(Operator::OpenParen) {
            self.take_token()?;
            let close = self.take_token()?;
            if close.id != TokenId::Operator(Operator::CloseParen) {
                return self.error_at(SyntaxError::InvalidFunctionBody, close.word.location);
            }
        }

        let command = self.finish_function_definition(name)?;
        // Extend the reported span to include the keyword.
        match command {
            Command::Function(mut definition) => {
                definition.location = start_location.merge(&definition.location);
                Ok(Command::Function(definition))
            }
            other => Ok(other),
        }
    }

    /// Parses the body of a function definition, after the name and any
    /// `()`.
    pub(super) fn finish_function_definition(&mut self, name: Word) -> Result<Command> {
        self.linebreak()?;
        let Some(body) = self.full_compound_command()? else {
            let location = self.peek_token()?.word.location.clone();
            return self.error_at(SyntaxError::MissingFunctionBody, location);
        };
        let location = name.location.clone();
        Ok(Command::Function(FunctionDefinition {
            name,
            body: Rc::new(body),
            location,
        }))
    }
}

/// Splits arithmetic-for content on top-level `;` into its three parts.
fn split_arith_parts(content: Text) -> Vec<Text> {
    use crate::syntax::TextUnit;
    let mut parts = vec![Text(Vec::new())];
    let mut depth = 0usize;
    for unit in content.0 {
        match unit {
            TextUnit::Literal('(') => {
                depth += 1;
                parts.last_mut().unwrap().0.push(unit);
            }
            TextUnit::Literal(')') if depth > 0 => {
                depth -= 1;
                parts.last_mut().unwrap().0.push(unit);
            }
            TextUnit::Literal(';') if depth == 0 => parts.push(Text(Vec::new())),
            _ => parts.last_mut().unwrap().0.push(unit),
        }
    }
    parts
}
