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

//! Fundamental building blocks of the lexer

use super::keyword::Keyword;
use super::op::{self, Operator};
use crate::parser::error::{Error, Result, SyntaxError};
use crate::source::{Code, Location, Source};
use crate::syntax::{ProcSubstKind, TextUnit, Word, WordUnit};
use std::fmt;
use std::rc::Rc;

#[cfg(unix)]
use std::os::unix::io::RawFd;
#[cfg(not(unix))]
type RawFd = i32;

/// Classification of a token
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenId {
    /// Ordinary word, possibly looking like a reserved word
    ///
    /// Whether the keyword value takes effect depends on the token's
    /// position; the parser decides.
    Token(Option<Keyword>),
    /// Operator
    Operator(Operator),
    /// Digits immediately preceding a redirection operator
    IoNumber(RawFd),
    /// End of input
    EndOfInput,
}

/// Result of lexical analysis
#[derive(Clone, Debug)]
pub struct Token {
    /// Content of the token
    pub word: Word,
    /// Classification
    pub id: TokenId,
    /// Character index of the first character
    pub index: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.word.fmt(f)
    }
}

/// Returns true if the character is a blank (non-newline whitespace).
#[must_use]
pub fn is_blank(c: char) -> bool {
    c != '\n' && c.is_whitespace()
}

/// Lexical analyzer
///
/// The lexer owns the characters of one code fragment and a cursor. All
/// lexing functions advance the cursor; [`rewind`](Lexer::rewind) moves
/// it back for speculative parses.
pub struct Lexer {
    code: Rc<Code>,
    chars: Vec<char>,
    pub(super) index: usize,
}

impl Lexer {
    /// Creates a lexer for the given code fragment.
    #[must_use]
    pub fn new(code: Rc<Code>) -> Lexer {
        let chars = code.value.chars().collect();
        Lexer {
            code,
            chars,
            index: 0,
        }
    }

    /// Creates a lexer reading from an in-memory string.
    #[must_use]
    pub fn from_memory(value: impl Into<String>, source: Source) -> Lexer {
        Lexer::new(Code::new(value, source))
    }

    /// Code fragment this lexer reads.
    #[must_use]
    pub fn code(&self) -> &Rc<Code> {
        &self.code
    }

    /// Current cursor position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves the cursor back to a previously saved position.
    pub fn rewind(&mut self, index: usize) {
        debug_assert!(index <= self.chars.len());
        self.index = index;
    }

    /// Whether the cursor is at the end of input.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.index >= self.chars.len()
    }

    pub(crate) fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Characters in the given range as a string.
    pub(crate) fn substring(&self, range: std::ops::Range<usize>) -> String {
        self.chars[range].iter().collect()
    }

    pub(crate) fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    pub(crate) fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.index += 1;
        Some(c)
    }

    /// Consumes the next character if it equals `expected`.
    pub(crate) fn skip_char_if(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Location covering the given character range.
    #[must_use]
    pub(crate) fn location(&self, range: std::ops::Range<usize>) -> Location {
        Location {
            code: Rc::clone(&self.code),
            range,
        }
    }

    /// Empty location at the cursor.
    #[must_use]
    pub(crate) fn here(&self) -> Location {
        self.location(self.index..self.index)
    }

    pub(crate) fn error<T>(&self, cause: SyntaxError, range: std::ops::Range<usize>) -> Result<T> {
        Err(Error {
            cause,
            location: self.location(range),
        })
    }

    /// Skips blanks, comments, and line continuations.
    ///
    /// A `#` here always starts a comment because this function is only
    /// called at token boundaries. The comment's newline is not consumed.
    pub fn skip_blanks_and_comment(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if is_blank(c) => {
                    self.index += 1;
                }
                Some('\\') if self.peek_char_at(1) == Some('\n') => {
                    self.index += 2;
                }
                Some('#') => {
                    while !matches!(self.peek_char(), None | Some('\n')) {
                        self.index += 1;
                    }
                }
                _ => return,
            }
        }
    }

    /// Builds an empty word at the cursor.
    pub(crate) fn empty_word(&self) -> Word {
        Word {
            units: Vec::new(),
            location: self.here(),
        }
    }

    /// Parses the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_blanks_and_comment();
        let start = self.index;

        if self.at_end() {
            return Ok(Token {
                word: self.empty_word(),
                id: TokenId::EndOfInput,
                index: start,
            });
        }

        // IO_NUMBER: digits glued to a redirection operator
        if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            let mut digits = 0;
            while self
                .peek_char_at(digits)
                .is_some_and(|c| c.is_ascii_digit())
            {
                digits += 1;
            }
            if matches!(self.peek_char_at(digits), Some('<' | '>')) {
                let text: String = self.chars[start..start + digits].iter().collect();
                self.index += digits;
                let Ok(fd) = text.parse::<RawFd>() else {
                    return self.error(SyntaxError::FdOutOfRange, start..self.index);
                };
                let word = Word {
                    units: text
                        .chars()
                        .map(|c| WordUnit::Unquoted(TextUnit::Literal(c)))
                        .collect(),
                    location: self.location(start..self.index),
                };
                return Ok(Token {
                    word,
                    id: TokenId::IoNumber(fd),
                    index: start,
                });
            }
        }

        // Process substitution forms a word even though it starts with an
        // operator character.
        if matches!(self.peek_char(), Some('<' | '>')) && self.peek_char_at(1) == Some('(') {
            let word = self.proc_subst_word()?;
            return Ok(Token {
                word,
                id: TokenId::Token(None),
                index: start,
            });
        }

        if let Some((operator, len)) = op::recognize(&self.chars[self.index..]) {
            self.index += len;
            let word = Word {
                units: self.chars[start..self.index]
                    .iter()
                    .map(|&c| WordUnit::Unquoted(TextUnit::Literal(c)))
                    .collect(),
                location: self.location(start..self.index),
            };
            return Ok(Token {
                word,
                id: TokenId::Operator(operator),
                index: start,
            });
        }

        let word = self.word(&|c| is_blank(c) || op::is_operator_char(c))?;
        let keyword = word
            .to_string_if_literal()
            .and_then(|s| s.parse::<Keyword>().ok());
        Ok(Token {
            word,
            id: TokenId::Token(keyword),
            index: start,
        })
    }

    /// Parses a word starting with `<(` or `>(`.
    fn proc_subst_word(&mut self) -> Result<Word> {
        let start = self.index;
        let kind = match self.next_char() {
            Some('<') => ProcSubstKind::In,
            _ => ProcSubstKind::Out,
        };
        self.index += 1; // the '('
        let content = self.raw_paren_content(start)?;
        let location = self.location(start..self.index);
        let mut units = vec![WordUnit::ProcSubst {
            kind,
            content,
            location: location.clone(),
        }];
        // Allow a suffix glued to the substitution, as in `<(cmd)x`.
        let rest = self.word(&|c| is_blank(c) || op::is_operator_char(c))?;
        units.extend(rest.units);
        Ok(Word {
            units,
            location: self.location(start..self.index),
        })
    }

    /// Reads raw characters up to the `)` matching an already consumed
    /// `(`, honoring nesting and quoting. The closing parenthesis is
    /// consumed but not included in the result.
    pub(crate) fn raw_paren_content(&mut self, opening_index: usize) -> Result<Rc<str>> {
        let start = self.index;
        let mut depth = 0usize;
        loop {
            match self.next_char() {
                None => {
                    return self.error(
                        SyntaxError::UnclosedProcSubst {
                            opening_location: self.location(opening_index..opening_index + 2),
                        },
                        self.index..self.index,
                    )
                }
                Some('(') => depth += 1,
                Some(')') => {
                    if depth == 0 {
                        let content: String = self.chars[start..self.index - 1].iter().collect();
                        return Ok(content.into());
                    }
                    depth -= 1;
                }
                Some('\\') => {
                    self.next_char();
                }
                Some('\'') => {
                    while !matches!(self.next_char(), None | Some('\'')) {}
                }
                Some('"') => loop {
                    match self.next_char() {
                        None | Some('"') => break,
                        Some('\\') => {
                            self.next_char();
                        }
                        Some(_) => {}
                    }
                },
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer(s: &str) -> Lexer {
        Lexer::from_memory(s, Source::Unknown)
    }

    fn tokens(s: &str) -> Vec<Token> {
        let mut lexer = lexer(s);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token.id == TokenId::EndOfInput {
                return tokens;
            }
            tokens.push(token);
        }
    }

    #[test]
    fn blank_separated_words() {
        let tokens = tokens("echo  hello");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].to_string(), "echo");
        assert_eq!(tokens[1].to_string(), "hello");
        assert_eq!(tokens[1].index, 6);
    }

    #[test]
    fn operators_split_words() {
        let tokens = tokens("a|b&&c;");
        let texts: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        assert_eq!(texts, ["a", "|", "b", "&&", "c", ";"]);
        assert_eq!(tokens[1].id, TokenId::Operator(Operator::Bar));
        assert_eq!(tokens[3].id, TokenId::Operator(Operator::AndAnd));
    }

    #[test]
    fn io_number_requires_adjacency() {
        let tokens = tokens("2>x 3 >y");
        assert_eq!(tokens[0].id, TokenId::IoNumber(2));
        assert_eq!(tokens[2].to_string(), "3");
        assert!(matches!(tokens[2].id, TokenId::Token(None)));
    }

    #[test]
    fn digits_not_followed_by_redirection_are_a_word() {
        let tokens = tokens("123");
        assert!(matches!(tokens[0].id, TokenId::Token(None)));
    }

    #[test]
    fn keywords_are_tagged() {
        let tokens = tokens("if x");
        assert_eq!(tokens[0].id, TokenId::Token(Some(Keyword::If)));
        assert_eq!(tokens[1].id, TokenId::Token(None));
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let tokens = tokens("a # b c\nd");
        let texts: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        assert_eq!(texts, ["a", "\n", "d"]);
    }

    #[test]
    fn hash_inside_word_is_not_a_comment() {
        let tokens = tokens("a#b");
        assert_eq!(tokens[0].to_string(), "a#b");
    }

    #[test]
    fn line_continuation_joins_tokens() {
        let tokens = tokens("ec\\\nho");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].word.to_string_if_literal().unwrap(), "echo");
    }

    #[test]
    fn newline_is_an_operator_token() {
        let tokens = tokens("a\nb");
        assert_eq!(tokens[1].id, TokenId::Operator(Operator::Newline));
    }

    #[test]
    fn process_substitution_token() {
        let tokens = tokens("diff <(a b) x");
        assert_eq!(tokens.len(), 3);
        assert!(matches!(
            &tokens[1].word.units[0],
            WordUnit::ProcSubst { kind: ProcSubstKind::In, content, .. } if &**content == "a b"
        ));
    }

    #[test]
    fn process_substitution_nests_parens_and_quotes() {
        let tokens = tokens(">(a (b) ')' c)");
        assert!(matches!(
            &tokens[0].word.units[0],
            WordUnit::ProcSubst { kind: ProcSubstKind::Out, content, .. }
                if &**content == "a (b) ')' c"
        ));
    }

    #[test]
    fn fd_out_of_range_is_an_error() {
        let mut lexer = lexer("99999999999999999999>x");
        let e = lexer.next_token().unwrap_err();
        assert_eq!(e.cause, SyntaxError::FdOutOfRange);
    }
}
