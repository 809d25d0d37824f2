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

//! Lexing of `$`-initiated expansions

use super::core::Lexer;
use crate::parser::error::{Result, SyntaxError};
use crate::syntax::{
    BracedParam, Modifier, Param, SpecialParam, Subst, Switch, SwitchAction, SwitchCondition,
    TextUnit, TrimLength, TrimSide, Trim,
};

/// Whether a character can start a variable name.
fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

/// Whether a character can continue a variable name.
fn is_name_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

impl Lexer {
    /// Parses the expansion after an already consumed `$`.
    ///
    /// Returns `None` if the `$` turns out to be an ordinary character,
    /// in which case nothing is consumed.
    pub(crate) fn dollar_unit(&mut self) -> Result<Option<TextUnit>> {
        let dollar = self.index - 1;
        match self.peek_char() {
            Some('{') => self.braced_param(dollar).map(Some),
            Some('(') => {
                self.next_char();
                if self.peek_char() == Some('(') {
                    if let Some(unit) = self.arithmetic(dollar)? {
                        return Ok(Some(unit));
                    }
                }
                let content = self.raw_paren_content_for_subst(dollar)?;
                let location = self.location(dollar..self.index);
                Ok(Some(TextUnit::CommandSubst { content, location }))
            }
            Some(c) if is_name_start(c) => {
                let start = self.index;
                while self.peek_char().is_some_and(is_name_char) {
                    self.next_char();
                }
                let name = self.substring(start..self.index);
                Ok(Some(TextUnit::RawParam {
                    param: Param::Variable(name),
                    location: self.location(dollar..self.index),
                }))
            }
            Some(c @ '1'..='9') => {
                self.next_char();
                Ok(Some(TextUnit::RawParam {
                    param: Param::Positional(c as usize - '0' as usize),
                    location: self.location(dollar..self.index),
                }))
            }
            Some(c) => match SpecialParam::from_char(c) {
                Some(special) => {
                    self.next_char();
                    Ok(Some(TextUnit::RawParam {
                        param: Param::Special(special),
                        location: self.location(dollar..self.index),
                    }))
                }
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Reads the raw content of a `$(…)`, cursor just after the `(`.
    fn raw_paren_content_for_subst(&mut self, dollar: usize) -> Result<std::rc::Rc<str>> {
        match self.raw_paren_content(dollar) {
            Ok(content) => Ok(content),
            Err(mut error) => {
                if let SyntaxError::UnclosedProcSubst { opening_location } = error.cause {
                    error.cause = SyntaxError::UnclosedCommandSubstitution { opening_location };
                }
                Err(error)
            }
        }
    }

    /// Attempts to parse `$((…))`, cursor on the second `(`.
    ///
    /// Returns `None` (with the cursor unchanged) when the construct
    /// does not end in `))` and must be re-read as a command
    /// substitution holding a subshell.
    fn arithmetic(&mut self, dollar: usize) -> Result<Option<TextUnit>> {
        let start = self.index;
        match self.arith_tail(dollar, 3)? {
            Some(content) => {
                let location = self.location(dollar..self.index);
                Ok(Some(TextUnit::Arith { content, location }))
            }
            None => {
                debug_assert_eq!(self.index, start);
                Ok(None)
            }
        }
    }

    /// Attempts to read the `…))` tail of an arithmetic construct, with
    /// the cursor on its second `(`.
    ///
    /// `opening_index..opening_index + opening_len` spans the opening
    /// (`$((` or `((`) for error reporting. On success the cursor ends
    /// just past the closing `))`; on `None` it is unchanged.
    pub(crate) fn arith_tail(
        &mut self,
        opening_index: usize,
        opening_len: usize,
    ) -> Result<Option<crate::syntax::Text>> {
        let second_paren = self.index;
        self.next_char();
        let content_start = self.index;

        // Find the matching `))`, skipping quotes and nested parentheses.
        let mut depth = 0usize;
        let content_end;
        loop {
            match self.peek_char() {
                None => {
                    return self.error(
                        SyntaxError::UnclosedArith {
                            opening_location: self
                                .location(opening_index..opening_index + opening_len),
                        },
                        self.index..self.index,
                    )
                }
                Some('(') => {
                    depth += 1;
                    self.next_char();
                }
                Some(')') if depth > 0 => {
                    depth -= 1;
                    self.next_char();
                }
                Some(')') => {
                    if self.peek_char_at(1) == Some(')') {
                        content_end = self.index;
                        break;
                    }
                    // A lone `)` means this is really `$( (subshell) … )`.
                    self.rewind(second_paren);
                    return Ok(None);
                }
                Some('\\') => {
                    self.next_char();
                    self.next_char();
                }
                Some('\'') => {
                    self.next_char();
                    while !matches!(self.next_char(), None | Some('\'')) {}
                }
                Some(_) => {
                    self.next_char();
                }
            }
        }

        // Re-read the content with expansions recognized.
        self.rewind(content_start);
        let content = self.text_until(content_end)?;
        self.next_char(); // ')'
        self.next_char(); // ')'
        Ok(Some(content))
    }

    /// Parses `${…}`, cursor on the `{`.
    fn braced_param(&mut self, dollar: usize) -> Result<TextUnit> {
        let opening = self.index;
        self.next_char();

        // `${#…}`: either the special parameter `#` or the length
        // modifier, depending on what follows.
        let mut modifier_is_length = false;
        if self.peek_char() == Some('#') && !matches!(self.peek_char_at(1), Some('}') | None) {
            self.next_char();
            modifier_is_length = true;
        }

        let param = self.param_name(opening)?;

        let modifier = if modifier_is_length {
            if self.peek_char() != Some('}') {
                return self.error(SyntaxError::InvalidModifier, self.index..self.index + 1);
            }
            Modifier::Length
        } else {
            self.param_modifier()?
        };

        if !self.skip_char_if('}') {
            return self.error(
                SyntaxError::UnclosedParam {
                    opening_location: self.location(dollar..opening + 1),
                },
                self.index..self.index,
            );
        }
        let location = self.location(dollar..self.index);
        Ok(TextUnit::BracedParam(BracedParam {
            param,
            modifier,
            location,
        }))
    }

    /// Parses the parameter name inside `${…}`.
    fn param_name(&mut self, opening: usize) -> Result<Param> {
        match self.peek_char() {
            Some(c) if is_name_start(c) => {
                let start = self.index;
                while self.peek_char().is_some_and(is_name_char) {
                    self.next_char();
                }
                Ok(Param::Variable(self.substring(start..self.index)))
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.index;
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.next_char();
                }
                let digits = self.substring(start..self.index);
                match digits.parse::<usize>() {
                    Ok(0) => Ok(Param::Special(SpecialParam::Zero)),
                    Ok(index) => Ok(Param::Positional(index)),
                    Err(_) => self.error(SyntaxError::InvalidParam, start..self.index),
                }
            }
            Some(c) => match SpecialParam::from_char(c) {
                Some(special) => {
                    self.next_char();
                    Ok(Param::Special(special))
                }
                None => {
                    if c == '}' {
                        self.error(SyntaxError::EmptyParam, opening..self.index + 1)
                    } else {
                        self.error(SyntaxError::InvalidParam, self.index..self.index + 1)
                    }
                }
            },
            None => self.error(SyntaxError::EmptyParam, opening..self.index),
        }
    }

    /// Parses the modifier after the parameter name inside `${…}`.
    fn param_modifier(&mut self) -> Result<Modifier> {
        let modifier = match self.peek_char() {
            Some('}') | None => return Ok(Modifier::None),
            Some(':') => match self.peek_char_at(1) {
                Some(action @ ('-' | '=' | '?' | '+')) => {
                    self.next_char();
                    self.next_char();
                    let word = self.word(&|c| c == '}')?;
                    Modifier::Switch(Switch {
                        action: switch_action(action),
                        condition: SwitchCondition::UnsetOrEmpty,
                        word,
                    })
                }
                _ => {
                    self.next_char();
                    return self.slice_modifier();
                }
            },
            Some(action @ ('-' | '=' | '?' | '+')) => {
                self.next_char();
                let word = self.word(&|c| c == '}')?;
                Modifier::Switch(Switch {
                    action: switch_action(action),
                    condition: SwitchCondition::Unset,
                    word,
                })
            }
            Some(side @ ('#' | '%')) => {
                self.next_char();
                let length = if self.peek_char() == Some(side) {
                    self.next_char();
                    TrimLength::Longest
                } else {
                    TrimLength::Shortest
                };
                let pattern = self.word(&|c| c == '}')?;
                Modifier::Trim(Trim {
                    side: if side == '#' {
                        TrimSide::Prefix
                    } else {
                        TrimSide::Suffix
                    },
                    length,
                    pattern,
                })
            }
            Some('/') => {
                self.next_char();
                let all = self.skip_char_if('/');
                let pattern = self.word(&|c| c == '/' || c == '}')?;
                let replacement = if self.skip_char_if('/') {
                    self.word(&|c| c == '}')?
                } else {
                    self.empty_word()
                };
                Modifier::Subst(Subst {
                    pattern,
                    replacement,
                    all,
                })
            }
            Some(_) => {
                return self.error(SyntaxError::InvalidModifier, self.index..self.index + 1)
            }
        };
        Ok(modifier)
    }

    /// Parses a `${name:offset[:length]}` slice, cursor after the `:`.
    fn slice_modifier(&mut self) -> Result<Modifier> {
        let offset = self.arith_field(&[':', '}'])?;
        let length = if self.skip_char_if(':') {
            Some(self.arith_field(&['}'])?)
        } else {
            None
        };
        Ok(Modifier::Slice { offset, length })
    }

    /// Reads a raw arithmetic field up to one of the given delimiters at
    /// parenthesis depth zero. The delimiter is not consumed.
    fn arith_field(&mut self, delimiters: &[char]) -> Result<String> {
        let start = self.index;
        let mut depth = 0usize;
        loop {
            match self.peek_char() {
                None => return Ok(self.substring(start..self.index)),
                Some('(') => {
                    depth += 1;
                    self.next_char();
                }
                Some(')') if depth > 0 => {
                    depth -= 1;
                    self.next_char();
                }
                Some(c) if depth == 0 && delimiters.contains(&c) => {
                    return Ok(self.substring(start..self.index));
                }
                Some(_) => {
                    self.next_char();
                }
            }
        }
    }
}

fn switch_action(c: char) -> SwitchAction {
    match c {
        '-' => SwitchAction::Default,
        '=' => SwitchAction::Assign,
        '?' => SwitchAction::Error,
        _ => SwitchAction::Alternative,
    }
}
