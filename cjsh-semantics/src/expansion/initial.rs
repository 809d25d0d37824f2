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

//! Initial expansion: tilde, parameter, command, arithmetic, and
//! process substitution
//!
//! The result of expanding one word is a [`Phrase`]: one or more
//! attributed fields. Multiple fields arise only from `$@`/`$*`; later
//! field splitting may add more. The `force_field` flag records whether
//! the word insists on producing a field even when empty (any quoting
//! does); `"$@"` with no positional parameters is the classic case that
//! does not.

pub mod arith;
pub mod command_subst;
pub mod param;
pub mod tilde;

use super::attr::{AttrChar, Origin};
use super::Result;
use cjsh_env::Env;
use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::{BackquoteUnit, Text, TextUnit, Word, WordUnit};

/// Result of initially expanding one word
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Phrase {
    /// Attributed fields; never empty
    pub fields: Vec<Vec<AttrChar>>,
    /// Whether an empty result still yields one empty field
    pub force_field: bool,
}

impl Phrase {
    fn new() -> Phrase {
        Phrase {
            fields: vec![Vec::new()],
            force_field: false,
        }
    }

    /// Resolves the phrase, dropping the single empty field of a word
    /// that produced nothing and did not insist on a field.
    fn finish(mut self) -> Phrase {
        if !self.force_field && self.fields.len() == 1 && self.fields[0].is_empty() {
            self.fields.clear();
        }
        self
    }
}

/// Expansion sink for one word
struct Expander<'e> {
    env: &'e mut Env,
    phrase: Phrase,
}

impl<'e> Expander<'e> {
    fn new(env: &'e mut Env) -> Expander<'e> {
        Expander {
            env,
            phrase: Phrase::new(),
        }
    }

    fn push(&mut self, value: char, origin: Origin, is_quoted: bool) {
        self.phrase.fields.last_mut().unwrap().push(AttrChar {
            value,
            origin,
            is_quoted,
        });
        if origin != Origin::SoftExpansion || is_quoted {
            self.phrase.force_field = true;
        }
    }

    fn push_str(&mut self, s: &str, origin: Origin, is_quoted: bool) {
        for c in s.chars() {
            self.push(c, origin, is_quoted);
        }
    }

    /// Starts a new field, as between two positional parameters of
    /// `"$@"`.
    fn begin_field(&mut self) {
        self.phrase.fields.push(Vec::new());
        self.phrase.force_field = true;
    }

    /// Notes quoting that yields a field even with no characters.
    fn force_field(&mut self) {
        self.phrase.force_field = true;
    }
}

/// Performs the initial expansion of a word.
pub fn expand_word(env: &mut Env, word: &Word) -> Result<Phrase> {
    let mut expander = Expander::new(env);
    for unit in &word.units {
        expand_word_unit(&mut expander, unit, &word.location)?;
    }
    Ok(expander.phrase.finish())
}

/// Performs the initial expansion of a text.
pub fn expand_text(env: &mut Env, text: &Text, location: &Location) -> Result<Phrase> {
    let _ = location;
    let mut expander = Expander::new(env);
    for unit in &text.0 {
        expand_text_unit(&mut expander, unit, false)?;
    }
    Ok(expander.phrase.finish())
}

fn expand_word_unit(
    expander: &mut Expander,
    unit: &WordUnit,
    location: &Location,
) -> Result<()> {
    match unit {
        WordUnit::Unquoted(text_unit) => expand_text_unit(expander, text_unit, false),
        WordUnit::SingleQuote(value) => {
            expander.force_field();
            for c in value.chars() {
                expander.push(c, Origin::Literal, true);
            }
            Ok(())
        }
        WordUnit::DoubleQuote(text) => expand_double_quote(expander, text),
        WordUnit::Tilde(name) => {
            let home = tilde::expand(expander.env, name, location)?;
            expander.push_str(&home, Origin::HardExpansion, false);
            Ok(())
        }
        WordUnit::ProcSubst {
            kind,
            content,
            location: subst_location,
        } => {
            let path =
                command_subst::process_substitution(expander.env, *kind, content, subst_location)?;
            expander.push_str(&path, Origin::HardExpansion, false);
            Ok(())
        }
    }
}

/// Expands a double-quoted text.
///
/// The quotes force a field unless the text is nothing but `$@`/`$*`
/// that expanded to zero fields.
fn expand_double_quote(expander: &mut Expander, text: &Text) -> Result<()> {
    let sole_positional_list = matches!(
        text.0.as_slice(),
        [TextUnit::RawParam { param, .. }] if param::is_positional_list(param)
    ) || matches!(
        text.0.as_slice(),
        [TextUnit::BracedParam(bp)] if param::is_positional_list(&bp.param)
    );
    if !(sole_positional_list && expander.env.variables.positional_params().is_empty()) {
        expander.force_field();
    }
    for unit in &text.0 {
        expand_text_unit(expander, unit, true)?;
    }
    Ok(())
}

fn expand_text_unit(expander: &mut Expander, unit: &TextUnit, quoted: bool) -> Result<()> {
    match unit {
        TextUnit::Literal(c) => {
            expander.push(*c, Origin::Literal, quoted);
            Ok(())
        }
        TextUnit::Backslashed(c) => {
            expander.push(*c, Origin::Literal, true);
            Ok(())
        }
        TextUnit::RawParam { param, location } => {
            param::expand(expander, param, &cjsh_syntax::syntax::Modifier::None, quoted, location)
        }
        TextUnit::BracedParam(braced) => param::expand(
            expander,
            &braced.param,
            &braced.modifier,
            quoted,
            &braced.location,
        ),
        TextUnit::CommandSubst {
            content,
            location: subst_location,
        } => {
            let output = command_subst::expand(expander.env, content, subst_location)?;
            expander.push_str(&output, Origin::SoftExpansion, quoted);
            Ok(())
        }
        TextUnit::Backquote {
            content,
            location: subst_location,
        } => {
            let text = decode_backquotes(content);
            let output = command_subst::expand(expander.env, &text, subst_location)?;
            expander.push_str(&output, Origin::SoftExpansion, quoted);
            Ok(())
        }
        TextUnit::Arith {
            content,
            location: arith_location,
        } => {
            let value = arith::expand(expander.env, content, arith_location)?;
            expander.push_str(&value, Origin::SoftExpansion, quoted);
            Ok(())
        }
    }
}

fn decode_backquotes(units: &[BackquoteUnit]) -> String {
    units
        .iter()
        .map(|unit| match unit {
            BackquoteUnit::Literal(c) | BackquoteUnit::Backslashed(c) => *c,
        })
        .collect()
}
