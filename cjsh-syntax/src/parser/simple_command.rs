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

//! Parsing of simple commands and `name()` function definitions

use super::core::Parser;
use super::error::{Result, SyntaxError};
use super::lex::{Operator, TokenId};
use crate::syntax::{
    Assign, Command, SimpleCommand, TextUnit, Word, WordUnit,
};

/// Whether a string is a valid variable (or function) name.
#[must_use]
pub(super) fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Splits a word at its first unquoted `=` if the prefix is a valid
/// variable name.
///
/// On failure, the original word is handed back.
fn into_assign(mut word: Word) -> std::result::Result<Assign, Word> {
    let Some(eq) = word.units.iter().position(|unit| {
        *unit == WordUnit::Unquoted(TextUnit::Literal('='))
    }) else {
        return Err(word);
    };
    if eq == 0 {
        return Err(word);
    }
    let name: Option<String> = word.units[..eq]
        .iter()
        .map(|unit| match unit {
            WordUnit::Unquoted(TextUnit::Literal(c)) => Some(*c),
            _ => None,
        })
        .collect();
    let Some(name) = name.filter(|name| is_name(name)) else {
        return Err(word);
    };

    let location = word.location.clone();
    let value_units = word.units.split_off(eq + 1);
    let value_start = location.range.start + eq + 1;
    let mut value = Word {
        units: value_units,
        location: crate::source::Location {
            code: std::rc::Rc::clone(&location.code),
            range: value_start..location.range.end,
        },
    };
    value.parse_tilde_everywhere();
    Ok(Assign {
        name,
        value,
        location,
    })
}

impl Parser<'_> {
    /// Parses a simple command, or a function definition if the first
    /// word is immediately followed by `()`.
    ///
    /// The caller has already determined that the leading token starts a
    /// simple command.
    pub(super) fn simple_command(&mut self) -> Result<Command> {
        let mut command = SimpleCommand::default();
        let mut assignments_possible = true;

        loop {
            if let Some(redir) = self.maybe_redirection()? {
                command.redirs.push(redir);
                continue;
            }
            let token = self.peek_token()?;
            if !matches!(token.id, TokenId::Token(_)) {
                break;
            }
            let token = self.take_token()?;

            // `name()` starts a function definition, but only where the
            // name is the sole word so far.
            if command.assigns.is_empty()
                && command.words.is_empty()
                && command.redirs.is_empty()
                && self.peek_token()?.id == TokenId::Operator(Operator::OpenParen)
                && token.word.to_string_if_literal().is_some()
            {
                return self.function_body_after_name(token.word);
            }

            if assignments_possible {
                match into_assign(token.word) {
                    Ok(assign) => {
                        command.assigns.push(assign);
                        continue;
                    }
                    Err(word) => {
                        assignments_possible = false;
                        let mut word = word;
                        word.parse_tilde_front();
                        command.words.push(word);
                        continue;
                    }
                }
            }
            let mut word = token.word;
            word.parse_tilde_front();
            command.words.push(word);
        }

        Ok(Command::Simple(command))
    }

    /// Parses the rest of a function definition after its name, with the
    /// cursor on the `(`.
    fn function_body_after_name(&mut self, name: Word) -> Result<Command> {
        let open = self.take_token()?;
        debug_assert_eq!(open.id, TokenId::Operator(Operator::OpenParen));
        let close = self.take_token()?;
        if close.id != TokenId::Operator(Operator::CloseParen) {
            return self.error_at(SyntaxError::InvalidFunctionBody, close.word.location);
        }
        self.finish_function_definition(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lex::Lexer;
    use crate::source::Source;
    use crate::syntax::List;
    use assert_matches::assert_matches;

    fn simple(s: &str) -> SimpleCommand {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        let list: List = Parser::new(&mut lexer).command_line().unwrap().unwrap();
        assert_matches!(
            &*list.0[0].and_or.first.commands[0],
            Command::Simple(simple) => simple.clone()
        )
    }

    #[test]
    fn words_only() {
        let command = simple("echo a b\n");
        assert_eq!(command.words.len(), 3);
        assert!(command.assigns.is_empty());
    }

    #[test]
    fn leading_assignments() {
        let command = simple("A=1 B=two cmd C=3\n");
        assert_eq!(command.assigns.len(), 2);
        assert_eq!(command.assigns[0].name, "A");
        assert_eq!(command.assigns[0].value.to_string(), "1");
        assert_eq!(command.assigns[1].name, "B");
        // After the first non-assignment word, `C=3` is an argument.
        assert_eq!(command.words.len(), 2);
        assert_eq!(command.words[1].to_string(), "C=3");
    }

    #[test]
    fn assignment_only_command() {
        let command = simple("X=y\n");
        assert_eq!(command.assigns.len(), 1);
        assert!(command.words.is_empty());
    }

    #[test]
    fn quoted_equals_is_not_an_assignment() {
        let command = simple("'A'=1\n");
        assert!(command.assigns.is_empty());
        assert_eq!(command.words.len(), 1);
    }

    #[test]
    fn invalid_name_is_not_an_assignment() {
        let command = simple("1x=2 =3\n");
        assert!(command.assigns.is_empty());
        assert_eq!(command.words.len(), 2);
    }

    #[test]
    fn assignment_value_keeps_expansions() {
        let command = simple("PATH=$HOME/bin:$PATH\n");
        assert_eq!(command.assigns.len(), 1);
        assert_eq!(command.assigns[0].value.to_string(), "$HOME/bin:$PATH");
    }

    #[test]
    fn assignment_value_recognizes_tilde_after_colon() {
        let command = simple("P=~/a:~b\n");
        let value = &command.assigns[0].value;
        assert!(matches!(&value.units[0], WordUnit::Tilde(name) if name.is_empty()));
        assert!(value
            .units
            .iter()
            .any(|unit| matches!(unit, WordUnit::Tilde(name) if name == "b")));
    }

    #[test]
    fn redirections_between_words() {
        let command = simple("a >x b <y\n");
        assert_eq!(command.words.len(), 2);
        assert_eq!(command.redirs.len(), 2);
    }

    #[test]
    fn redirection_before_assignment() {
        let command = simple(">f A=1 cmd\n");
        assert_eq!(command.redirs.len(), 1);
        assert_eq!(command.assigns.len(), 1);
        assert_eq!(command.words.len(), 1);
    }

    #[test]
    fn keyword_as_argument_is_a_word() {
        let command = simple("echo if then\n");
        assert_eq!(command.words.len(), 3);
    }

    #[test]
    fn tilde_expansion_on_command_words() {
        let command = simple("ls ~/src\n");
        assert!(matches!(&command.words[1].units[0], WordUnit::Tilde(_)));
    }

    #[test]
    fn function_definition_via_parens() {
        let mut lexer = Lexer::from_memory("f() { echo hi; }\n", Source::Unknown);
        let list = Parser::new(&mut lexer).command_line().unwrap().unwrap();
        assert_matches!(&*list.0[0].and_or.first.commands[0], Command::Function(def) => {
            assert_eq!(def.name.to_string(), "f");
            assert_eq!(def.body.to_string(), "{ echo hi; }");
        });
    }

    #[test]
    fn function_body_must_follow() {
        let mut lexer = Lexer::from_memory("f()\n", Source::Unknown);
        let e = Parser::new(&mut lexer).command_line().unwrap_err();
        assert_eq!(e.cause, SyntaxError::MissingFunctionBody);
    }
}
