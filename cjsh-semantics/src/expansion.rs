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

//! Word expansion
//!
//! Expansion runs in the POSIX order: brace expansion, tilde expansion,
//! then parameter/command/arithmetic expansion in one pass ([`initial`]),
//! then field [`split`]ting, pathname expansion ([`glob`]), and quote
//! removal. Intermediate results are strings of [`AttrChar`]s carrying
//! each character's origin and quoting, which the later phases consult:
//! only unquoted characters born from expansion are split, and only
//! unquoted characters act as pattern characters during globbing.
//!
//! [`expand_words`] is the full pipeline used for command words;
//! [`expand_word`] produces exactly one field (no splitting or
//! globbing) for contexts like `case` subjects and conditional-command
//! operands; [`expand_text`] expands a [`Text`] (here-document bodies,
//! arithmetic contents) to a plain string.

pub mod attr;
pub mod brace;
pub mod glob;
pub mod initial;
pub mod quote_removal;
pub mod split;

pub use attr::{AttrChar, Origin};

use cjsh_env::semantics::Field;
use cjsh_env::Env;
use cjsh_syntax::source::pretty::{Annotation, Category, Report, Severity};
use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::{Text, Word};
use thiserror::Error;

/// Cause of an expansion error
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum ErrorCause {
    /// Unset variable under `set -u`
    #[error("{name}: unbound variable")]
    UnsetVariable { name: String },
    /// `${name:?message}` with the condition unmet
    #[error("{name}: {message}")]
    EmptyExpansion { name: String, message: String },
    /// `${name=…}` applied to a parameter that cannot be assigned
    #[error("{name}: cannot assign to this parameter")]
    NonassignableParam { name: String },
    /// Readonly violation from `${name=…}` or arithmetic assignment
    #[error(transparent)]
    AssignReadOnly(cjsh_env::variable::ReadOnlyError),
    /// Arithmetic evaluation failure
    #[error("arithmetic: {message}")]
    Arith { message: String },
    /// Malformed pattern in a trim or substitution modifier
    #[error("invalid pattern: {message}")]
    Pattern { message: String },
    /// Command or process substitution could not be set up
    #[error("cannot substitute command output: {errno}")]
    CommandSubst { errno: cjsh_env::system::Errno },
    /// `~user` for an unknown user
    #[error("~{name}: no such user")]
    TildeUserNotFound { name: String },
    /// `${var:offset:length}` with an unusable range
    #[error("substring expression out of range")]
    BadSlice,
}

impl ErrorCause {
    /// Stable diagnostic code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        use ErrorCause::*;
        match self {
            UnsetVariable { .. } => "EXP001",
            EmptyExpansion { .. } => "EXP002",
            NonassignableParam { .. } => "EXP003",
            AssignReadOnly(_) => "EXP004",
            Arith { .. } => "EXP005",
            Pattern { .. } => "EXP006",
            CommandSubst { .. } => "EXP007",
            TildeUserNotFound { .. } => "EXP008",
            BadSlice => "EXP009",
        }
    }
}

/// Expansion error with its location
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{cause}")]
pub struct Error {
    pub cause: ErrorCause,
    pub location: Location,
}

impl Error {
    /// Converts this error to a renderable diagnostic.
    #[must_use]
    pub fn to_report(&self) -> Report {
        Report {
            severity: Severity::Error,
            category: Category::Expansion,
            code: self.cause.code(),
            title: self.cause.to_string(),
            annotation: Annotation {
                label: self.cause.to_string(),
                location: self.location.clone(),
            },
            related: Vec::new(),
            suggestion: None,
        }
    }
}

/// Result of expansion
pub type Result<T> = std::result::Result<T, Error>;

/// Fully expands command words to fields.
///
/// Runs every phase: brace expansion, initial expansion, field
/// splitting, pathname expansion, quote removal.
pub fn expand_words(env: &mut Env, words: &[Word]) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    for word in words {
        for braced in brace::expand(word) {
            let phrase = initial::expand_word(env, &braced)?;
            let ifs = env
                .variables
                .value_of("IFS")
                .map(str::to_owned)
                .unwrap_or_else(|| split::ifs::DEFAULT.to_string());
            let ifs = split::ifs::Ifs::new(&ifs);
            for field in phrase
                .fields
                .into_iter()
                .flat_map(|chars| split::split_field(chars, &ifs))
            {
                fields.extend(glob::expand(env, field, &braced.location));
            }
        }
    }
    Ok(fields)
}

/// Expands a word to exactly one field.
///
/// No brace expansion, field splitting, or pathname expansion; multiple
/// fields arising from `"$@"` are joined with spaces.
pub fn expand_word(env: &mut Env, word: &Word) -> Result<Field> {
    let phrase = initial::expand_word(env, word)?;
    let value = phrase
        .fields
        .iter()
        .map(|chars| chars.iter().map(|c| c.value).collect::<String>())
        .collect::<Vec<String>>()
        .join(" ");
    Ok(Field {
        value,
        origin: word.location.clone(),
    })
}

/// Expands a text to a plain string, as for here-document contents.
pub fn expand_text(env: &mut Env, text: &Text, location: &Location) -> Result<String> {
    let phrase = initial::expand_text(env, text, location)?;
    Ok(phrase
        .fields
        .iter()
        .flat_map(|chars| chars.iter().map(|c| c.value))
        .collect())
}

/// Expands a word into a pattern-character sequence for matching.
///
/// Quoted characters become literal pattern characters, so `case $x in
/// "$y") …` compares verbatim while unquoted `*` stays a wildcard.
pub fn expand_pattern_chars(
    env: &mut Env,
    word: &Word,
) -> Result<Vec<cjsh_fnmatch::PatternChar>> {
    let phrase = initial::expand_word(env, word)?;
    Ok(phrase
        .fields
        .iter()
        .flat_map(|chars| chars.iter())
        .map(|c| {
            if c.is_quoted || c.origin == Origin::HardExpansion {
                cjsh_fnmatch::PatternChar::Literal(c.value)
            } else {
                cjsh_fnmatch::PatternChar::Normal(c.value)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::variable::Scope;
    use std::str::FromStr;

    fn word(s: &str) -> Word {
        let mut word = Word::from_str(s).unwrap();
        word.parse_tilde_front();
        word
    }

    fn fields(env: &mut Env, s: &str) -> Vec<String> {
        expand_words(env, &[word(s)])
            .unwrap()
            .into_iter()
            .map(|f| f.value)
            .collect()
    }

    #[test]
    fn literal_word_is_one_field() {
        let mut env = Env::new();
        assert_eq!(fields(&mut env, "hello"), ["hello"]);
    }

    #[test]
    fn unquoted_expansion_splits() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "v", "one two  three")
            .unwrap();
        assert_eq!(fields(&mut env, "$v"), ["one", "two", "three"]);
    }

    #[test]
    fn quoted_expansion_does_not_split() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "v", "a b").unwrap();
        assert_eq!(fields(&mut env, "\"$v\""), ["a b"]);
    }

    #[test]
    fn empty_unquoted_expansion_vanishes() {
        let mut env = Env::new();
        assert_eq!(fields(&mut env, "$unset_v"), Vec::<String>::new());
        assert_eq!(fields(&mut env, "\"\""), [""]);
    }

    #[test]
    fn brace_then_variable() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "x", "X").unwrap();
        assert_eq!(fields(&mut env, "{a,b}$x"), ["aX", "bX"]);
    }

    #[test]
    fn expand_word_joins_at_fields() {
        let mut env = Env::new();
        env.variables
            .assign(Scope::Shell, "v", "a b")
            .unwrap();
        let field = expand_word(&mut env, &word("$v")).unwrap();
        assert_eq!(field.value, "a b");
    }

    #[test]
    fn arithmetic_in_words() {
        let mut env = Env::new();
        assert_eq!(fields(&mut env, "$((2+3))"), ["5"]);
    }

    #[test]
    fn pattern_chars_honor_quoting() {
        let mut env = Env::new();
        let chars = expand_pattern_chars(&mut env, &word("a'*'?")).unwrap();
        assert_eq!(chars[0], cjsh_fnmatch::PatternChar::Normal('a'));
        assert_eq!(chars[1], cjsh_fnmatch::PatternChar::Literal('*'));
        assert_eq!(chars[2], cjsh_fnmatch::PatternChar::Normal('?'));
    }
}
