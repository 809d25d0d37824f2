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

//! Here-document content lexing

use super::core::Lexer;
use crate::parser::error::{Result, SyntaxError};
use crate::syntax::{HereDoc, Text, TextUnit, Word, WordUnit};

/// Computes the effective delimiter string of a here-document and
/// whether any part of it was quoted.
///
/// A quoted delimiter disables expansion in the content.
#[must_use]
pub fn delimiter_string(delimiter: &Word) -> (String, bool) {
    let mut value = String::new();
    let mut quoted = false;
    for unit in &delimiter.units {
        match unit {
            WordUnit::Unquoted(TextUnit::Literal(c)) => value.push(*c),
            WordUnit::Unquoted(TextUnit::Backslashed(c)) => {
                value.push(*c);
                quoted = true;
            }
            WordUnit::SingleQuote(s) => {
                value.push_str(s);
                quoted = true;
            }
            WordUnit::DoubleQuote(text) => {
                if let Some(s) = text.to_string_if_literal() {
                    value.push_str(&s);
                }
                quoted = true;
            }
            WordUnit::Tilde(name) => {
                value.push('~');
                value.push_str(name);
            }
            _ => {}
        }
    }
    (value, quoted)
}

impl Lexer {
    /// Reads the content of a here-document.
    ///
    /// The cursor must be at the start of a line, just after the newline
    /// token that terminated the line containing the operator. Content
    /// lines are consumed up to and including the delimiter line.
    pub fn here_doc_content(&mut self, here_doc: &HereDoc, op_index: usize) -> Result<()> {
        let (delimiter, quoted) = delimiter_string(&here_doc.delimiter);
        let mut units = Vec::new();

        loop {
            if self.at_end() {
                return self.error(
                    SyntaxError::UnclosedHereDocContent {
                        redir_op_location: self.location(op_index..op_index + 2),
                    },
                    self.index..self.index,
                );
            }

            // Check whether this line is the delimiter.
            let line_start = self.index;
            let mut probe = self.index;
            if here_doc.remove_tabs {
                while self.peek_char_at(probe - self.index) == Some('\t') {
                    probe += 1;
                }
            }
            let mut line_end = probe;
            while !matches!(self.peek_char_at(line_end - self.index), None | Some('\n')) {
                line_end += 1;
            }
            if self.substring(probe..line_end) == delimiter {
                self.index = line_end;
                self.skip_char_if('\n');
                break;
            }

            // Not the delimiter: consume the line as content.
            self.index = if here_doc.remove_tabs { probe } else { line_start };
            if quoted {
                while let Some(c) = self.next_char() {
                    units.push(TextUnit::Literal(c));
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                self.content_line(&mut units)?;
            }
        }

        // Content is set exactly once per here-document.
        here_doc.content.set(Text(units)).ok();
        Ok(())
    }

    /// Consumes one content line with expansions recognized.
    fn content_line(&mut self, units: &mut Vec<TextUnit>) -> Result<()> {
        loop {
            match self.peek_char() {
                None => return Ok(()),
                Some('\n') => {
                    self.next_char();
                    units.push(TextUnit::Literal('\n'));
                    return Ok(());
                }
                Some('\\') => {
                    self.next_char();
                    match self.peek_char() {
                        // Escaped newline joins the next physical line.
                        Some('\n') => {
                            self.next_char();
                        }
                        Some(c @ ('$' | '`' | '\\')) => {
                            self.next_char();
                            units.push(TextUnit::Backslashed(c));
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
                Some('`') => {
                    let unit = self.backquote()?;
                    units.push(unit);
                }
                Some(c) => {
                    self.next_char();
                    units.push(TextUnit::Literal(c));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lex::Lexer;
    use crate::source::{Location, Source};
    use crate::syntax::Param;
    use assert_matches::assert_matches;
    use std::cell::OnceCell;

    fn literal_delimiter(s: &str) -> Word {
        Word {
            units: s
                .chars()
                .map(|c| WordUnit::Unquoted(TextUnit::Literal(c)))
                .collect(),
            location: Location::dummy(s),
        }
    }

    fn quoted_delimiter(s: &str) -> Word {
        Word {
            units: vec![WordUnit::SingleQuote(s.to_string())],
            location: Location::dummy(s),
        }
    }

    fn read(content: &str, delimiter: Word, remove_tabs: bool) -> Text {
        let here_doc = HereDoc {
            delimiter,
            remove_tabs,
            content: OnceCell::new(),
        };
        let mut lexer = Lexer::from_memory(content, Source::Unknown);
        lexer.here_doc_content(&here_doc, 0).unwrap();
        here_doc.content.into_inner().unwrap()
    }

    #[test]
    fn plain_content_up_to_delimiter() {
        let text = read("hello\nworld\nEOF\nrest", literal_delimiter("EOF"), false);
        assert_eq!(text.to_string(), "hello\nworld\n");
    }

    #[test]
    fn expansions_recognized_when_unquoted() {
        let text = read("hi $v\nEOF\n", literal_delimiter("EOF"), false);
        assert_matches!(
            &text.0[3],
            TextUnit::RawParam { param: Param::Variable(name), .. } if name == "v"
        );
    }

    #[test]
    fn quoted_delimiter_disables_expansion() {
        let text = read("hi $v\nEOF\n", quoted_delimiter("EOF"), false);
        assert!(text
            .0
            .iter()
            .all(|unit| matches!(unit, TextUnit::Literal(_))));
        assert_eq!(text.to_string(), "hi $v\n");
    }

    #[test]
    fn remove_tabs_strips_content_and_delimiter() {
        let text = read("\t\tindented\n\tEOF\n", literal_delimiter("EOF"), true);
        assert_eq!(text.to_string(), "indented\n");
    }

    #[test]
    fn backslash_rules_in_content() {
        let text = read("a\\$b \\n\nEOF\n", literal_delimiter("EOF"), false);
        assert_eq!(text.0[1], TextUnit::Backslashed('$'));
        // Backslash before an ordinary character stays literal.
        assert!(text.0.contains(&TextUnit::Literal('\\')));
    }

    #[test]
    fn missing_delimiter_is_incomplete() {
        let here_doc = HereDoc {
            delimiter: literal_delimiter("EOF"),
            remove_tabs: false,
            content: OnceCell::new(),
        };
        let mut lexer = Lexer::from_memory("no end\n", Source::Unknown);
        let e = lexer.here_doc_content(&here_doc, 0).unwrap_err();
        assert_matches!(e.cause, SyntaxError::UnclosedHereDocContent { .. });
        assert!(e.is_incomplete());
    }

    #[test]
    fn delimiter_string_detects_quoting() {
        assert_eq!(delimiter_string(&literal_delimiter("EOF")), ("EOF".to_string(), false));
        assert_eq!(delimiter_string(&quoted_delimiter("EOF")), ("EOF".to_string(), true));
    }
}
