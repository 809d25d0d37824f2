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

//! Word and quotation lexing

use super::core::Lexer;
use crate::parser::error::{Result, SyntaxError};
use crate::syntax::{BackquoteUnit, Text, TextUnit, Word, WordUnit};

impl Lexer {
    /// Parses a word, reading units until an unquoted delimiter.
    ///
    /// The delimiter character itself is not consumed. The result may be
    /// empty if the cursor starts on a delimiter.
    pub(crate) fn word(&mut self, is_delimiter: &dyn Fn(char) -> bool) -> Result<Word> {
        let start = self.index;
        let mut units = Vec::new();
        while let Some(c) = self.peek_char() {
            if is_delimiter(c) {
                break;
            }
            match c {
                '\\' => {
                    self.next_char();
                    match self.peek_char() {
                        // Line continuation vanishes entirely.
                        Some('\n') => {
                            self.next_char();
                        }
                        Some(c) => {
                            self.next_char();
                            units.push(WordUnit::Unquoted(TextUnit::Backslashed(c)));
                        }
                        None => units.push(WordUnit::Unquoted(TextUnit::Literal('\\'))),
                    }
                }
                '\'' => units.push(self.single_quote()?),
                '"' => units.push(self.double_quote()?),
                '$' => {
                    self.next_char();
                    match self.dollar_unit()? {
                        Some(unit) => units.push(WordUnit::Unquoted(unit)),
                        None => units.push(WordUnit::Unquoted(TextUnit::Literal('$'))),
                    }
                }
                '`' => {
                    let unit = self.backquote()?;
                    units.push(WordUnit::Unquoted(unit));
                }
                _ => {
                    self.next_char();
                    units.push(WordUnit::Unquoted(TextUnit::Literal(c)));
                }
            }
        }
        Ok(Word {
            units,
            location: self.location(start..self.index),
        })
    }

    /// Parses a single-quoted string, cursor on the opening quote.
    fn single_quote(&mut self) -> Result<WordUnit> {
        let opening = self.index;
        self.next_char();
        let start = self.index;
        loop {
            match self.next_char() {
                Some('\'') => {
                    let content = self.substring(start..self.index - 1);
                    return Ok(WordUnit::SingleQuote(content));
                }
                Some(_) => {}
                None => {
                    return self.error(
                        SyntaxError::UnclosedSingleQuote {
                            opening_location: self.location(opening..opening + 1),
                        },
                        self.index..self.index,
                    )
                }
            }
        }
    }

    /// Parses a double-quoted string, cursor on the opening quote.
    pub(crate) fn double_quote(&mut self) -> Result<WordUnit> {
        let opening = self.index;
        self.next_char();
        let mut units = Vec::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.next_char();
                    return Ok(WordUnit::DoubleQuote(Text(units)));
                }
                Some('\\') => {
                    self.next_char();
                    match self.peek_char() {
                        // Backslash is special only before these.
                        Some(c @ ('$' | '`' | '"' | '\\')) => {
                            self.next_char();
                            units.push(TextUnit::Backslashed(c));
                        }
                        Some('\n') => {
                            self.next_char();
                        }
                        _ => units.push(TextUnit::Literal('\\')),
                    }
                }
                Some('$') => {
                    self.next_char();
                    match self.dollar_unit()? {
                        Some(unit) => units.push(unit),
                        None => units.push(TextUnit::Literal('$')),
                    }
                }
                Some('`') => units.push(self.backquote()?),
                Some(c) => {
                    self.next_char();
                    units.push(TextUnit::Literal(c));
                }
                None => {
                    return self.error(
                        SyntaxError::UnclosedDoubleQuote {
                            opening_location: self.location(opening..opening + 1),
                        },
                        self.index..self.index,
                    )
                }
            }
        }
    }

    /// Parses a backquoted command substitution, cursor on the opening
    /// backquote.
    pub(crate) fn backquote(&mut self) -> Result<TextUnit> {
        let opening = self.index;
        self.next_char();
        let mut content = Vec::new();
        loop {
            match self.next_char() {
                Some('`') => {
                    return Ok(TextUnit::Backquote {
                        content,
                        location: self.location(opening..self.index),
                    })
                }
                Some('\\') => match self.next_char() {
                    Some(c @ ('$' | '`' | '\\')) => content.push(BackquoteUnit::Backslashed(c)),
                    Some(c) => {
                        content.push(BackquoteUnit::Literal('\\'));
                        content.push(BackquoteUnit::Literal(c));
                    }
                    None => content.push(BackquoteUnit::Literal('\\')),
                },
                Some(c) => content.push(BackquoteUnit::Literal(c)),
                None => {
                    return self.error(
                        SyntaxError::UnclosedBackquote {
                            opening_location: self.location(opening..opening + 1),
                        },
                        self.index..self.index,
                    )
                }
            }
        }
    }

    /// Parses plain text with expansions until (not including) the given
    /// index, used for arithmetic expansion contents.
    pub(crate) fn text_until(&mut self, end: usize) -> Result<Text> {
        let mut units = Vec::new();
        while self.index < end {
            match self.peek_char() {
                Some('\\') if self.index + 1 < end => {
                    self.next_char();
                    let c = self.next_char().unwrap();
                    if c != '\n' {
                        units.push(TextUnit::Backslashed(c));
                    }
                }
                Some('$') => {
                    self.next_char();
                    match self.dollar_unit()? {
                        Some(unit) => units.push(unit),
                        None => units.push(TextUnit::Literal('$')),
                    }
                }
                Some('`') => units.push(self.backquote()?),
                Some(c) => {
                    self.next_char();
                    units.push(TextUnit::Literal(c));
                }
                None => break,
            }
        }
        Ok(Text(units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lex::Lexer;
    use crate::source::Source;
    use crate::syntax::Param;

    fn word_of(s: &str) -> Word {
        let mut lexer = Lexer::from_memory(s, Source::Unknown);
        lexer
            .word(&|c| super::super::core::is_blank(c) || super::super::op::is_operator_char(c))
            .unwrap()
    }

    #[test]
    fn plain_word() {
        let word = word_of("hello");
        assert_eq!(word.to_string_if_literal().unwrap(), "hello");
        assert_eq!(word.location.range, 0..5);
    }

    #[test]
    fn single_quotes_are_verbatim() {
        let word = word_of(r#"'a $b \n'"#);
        assert_eq!(word.units, [WordUnit::SingleQuote(r"a $b \n".to_string())]);
    }

    #[test]
    fn double_quotes_keep_expansions() {
        let word = word_of(r#""a$b""#);
        assert_eq!(word.units.len(), 1);
        let WordUnit::DoubleQuote(Text(units)) = &word.units[0] else {
            panic!("not a double quote: {:?}", word.units[0]);
        };
        assert_eq!(units[0], TextUnit::Literal('a'));
        assert!(
            matches!(&units[1], TextUnit::RawParam { param: Param::Variable(name), .. } if name == "b")
        );
    }

    #[test]
    fn double_quote_backslash_rules() {
        let word = word_of(r#""\$x \a""#);
        let WordUnit::DoubleQuote(Text(units)) = &word.units[0] else {
            panic!();
        };
        assert_eq!(units[0], TextUnit::Backslashed('$'));
        assert_eq!(units[3], TextUnit::Literal('\\'));
        assert_eq!(units[4], TextUnit::Literal('a'));
    }

    #[test]
    fn backslash_escapes_next_character() {
        let word = word_of(r"a\ b");
        assert_eq!(
            word.units,
            [
                WordUnit::Unquoted(TextUnit::Literal('a')),
                WordUnit::Unquoted(TextUnit::Backslashed(' ')),
                WordUnit::Unquoted(TextUnit::Literal('b')),
            ]
        );
    }

    #[test]
    fn unclosed_single_quote_is_incomplete() {
        let mut lexer = Lexer::from_memory("'abc", Source::Unknown);
        let e = lexer.next_token().unwrap_err();
        assert!(e.is_incomplete());
        assert!(matches!(e.cause, SyntaxError::UnclosedSingleQuote { .. }));
    }

    #[test]
    fn unclosed_double_quote_is_incomplete() {
        let mut lexer = Lexer::from_memory("\"abc", Source::Unknown);
        let e = lexer.next_token().unwrap_err();
        assert!(matches!(e.cause, SyntaxError::UnclosedDoubleQuote { .. }));
    }

    #[test]
    fn backquote_with_escapes() {
        let word = word_of(r"`a\`b`");
        let WordUnit::Unquoted(TextUnit::Backquote { content, .. }) = &word.units[0] else {
            panic!();
        };
        assert_eq!(
            content,
            &[
                BackquoteUnit::Literal('a'),
                BackquoteUnit::Backslashed('`'),
                BackquoteUnit::Literal('b'),
            ]
        );
    }
}
