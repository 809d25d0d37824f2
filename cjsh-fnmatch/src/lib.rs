// This file is part of cjsh, a POSIX-compatible interactive shell.
// Copyright (C) 2025 Caden Finley

//! Globbing pattern matching for the shell.
//!
//! This crate compiles shell patterns into regular expressions and matches
//! candidate strings against them. It backs `case` pattern lists, the `==`
//! and `!=` operators of the conditional command, `${var#pattern}`-style
//! trimming, and pathname expansion.
//!
//! Supported pattern syntax:
//!
//! - `?` matching any single character
//! - `*` matching any (possibly empty) character sequence
//! - Bracket expressions (`[...]`) with character literals, ranges
//!   (`a-z`), complement (`[!...]`), and character classes (`[:alpha:]`)
//!
//! Locale-specific collation is not supported; character classes match
//! ASCII only.
//!
//! A pattern is parsed from an iterator of [`PatternChar`]s rather than a
//! plain `&str` so that the caller can decide which characters had been
//! quoted in the shell source. A quoted `*` must match a literal asterisk,
//! which [`with_escape`] and [`PatternChar::Literal`] express.
//!
//! ```
//! use cjsh_fnmatch::{Config, Pattern, without_escape};
//! let p = Pattern::parse(without_escape("*.rs"), &Config::default()).unwrap();
//! assert!(p.is_match("lib.rs"));
//! assert!(!p.is_match("lib.c"));
//! ```

mod ast;
mod regex;

use std::str::Chars;
use thiserror::Error;

pub use self::ast::{Ast, Atom, Bracket, BracketAtom, BracketItem};

/// Character appearing in a pattern
///
/// `Normal` characters keep their special meaning (`?`, `*`, `[`, `]`);
/// `Literal` characters always match themselves. Quoting in the shell
/// source produces `Literal` characters.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PatternChar {
    /// Character with its special meaning retained
    Normal(char),
    /// Character stripped of any special meaning
    Literal(char),
}

impl PatternChar {
    /// Returns the contained character value.
    #[inline]
    #[must_use]
    pub const fn char_value(self) -> char {
        match self {
            PatternChar::Normal(c) | PatternChar::Literal(c) => c,
        }
    }
}

/// Iterator returned by [`with_escape`]
#[derive(Clone, Debug)]
pub struct WithEscape<'a> {
    chars: Chars<'a>,
}

impl Iterator for WithEscape<'_> {
    type Item = PatternChar;
    fn next(&mut self) -> Option<PatternChar> {
        match self.chars.next()? {
            '\\' => self.chars.next().map(PatternChar::Literal),
            c => Some(PatternChar::Normal(c)),
        }
    }
}

/// Adapts a string in which backslashes escape the following character.
#[must_use]
pub fn with_escape(pattern: &str) -> WithEscape<'_> {
    WithEscape {
        chars: pattern.chars(),
    }
}

/// Iterator returned by [`without_escape`]
#[derive(Clone, Debug)]
pub struct WithoutEscape<'a> {
    chars: Chars<'a>,
}

impl Iterator for WithoutEscape<'_> {
    type Item = PatternChar;
    fn next(&mut self) -> Option<PatternChar> {
        self.chars.next().map(PatternChar::Normal)
    }
}

/// Adapts a string in which backslashes have no special meaning.
#[must_use]
pub fn without_escape(pattern: &str) -> WithoutEscape<'_> {
    WithoutEscape {
        chars: pattern.chars(),
    }
}

/// Configuration for pattern compilation
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct Config {
    /// Whether the pattern may match only part of the subject
    ///
    /// By default a pattern must match the whole subject string, which is
    /// what `case` and pathname expansion need. Trimming expansions
    /// (`${var#pattern}`) instead search for a matching prefix or suffix
    /// and set this flag.
    pub allow_partial_match: bool,

    /// Whether an initial period must be matched by a literal period
    ///
    /// Pathname expansion sets this so that `*` does not match dotfiles.
    pub literal_initial_period: bool,

    /// Whether matching ignores case
    pub case_insensitive: bool,
}

/// Error in pattern parsing or compilation
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A bracket expression contains an unknown character class.
    #[error("unknown character class [:{0}:]")]
    UnknownCharClass(String),
    /// The compiled regular expression was rejected.
    #[error("invalid pattern: {0}")]
    Regex(String),
}

/// Compiled globbing pattern
#[derive(Clone, Debug)]
pub struct Pattern {
    body: Body,
}

#[derive(Clone, Debug)]
enum Body {
    /// Pattern with no special characters, compared by string equality
    Literal(String),
    /// Pattern compiled to a regular expression
    Regex {
        regex: ::regex::Regex,
        partial: bool,
    },
}

impl Pattern {
    /// Parses and compiles a pattern.
    pub fn parse<I>(pattern: I, config: &Config) -> Result<Self, Error>
    where
        I: IntoIterator<Item = PatternChar>,
    {
        let ast = Ast::parse(pattern);
        if !config.allow_partial_match && !config.case_insensitive {
            if let Some(literal) = ast.as_literal() {
                return Ok(Pattern {
                    body: Body::Literal(literal),
                });
            }
        }
        let source = regex::to_regex(&ast, config)?;
        let regex = ::regex::RegexBuilder::new(&source)
            .case_insensitive(config.case_insensitive)
            .build()
            .map_err(|error| Error::Regex(error.to_string()))?;
        Ok(Pattern {
            body: Body::Regex {
                regex,
                partial: config.allow_partial_match,
            },
        })
    }

    /// Tests whether this pattern matches the given subject.
    #[must_use]
    pub fn is_match(&self, subject: &str) -> bool {
        match &self.body {
            Body::Literal(s) => s == subject,
            Body::Regex { regex, .. } => regex.is_match(subject),
        }
    }

    /// Returns the byte range of the leftmost-longest match, if any.
    ///
    /// With [`Config::allow_partial_match`] off, the range covers the whole
    /// subject or the result is `None`.
    #[must_use]
    pub fn find(&self, subject: &str) -> Option<std::ops::Range<usize>> {
        match &self.body {
            Body::Literal(s) => (s == subject).then(|| 0..subject.len()),
            Body::Regex { regex, .. } => regex.find(subject).map(|m| m.range()),
        }
    }

    /// Returns the pattern as a plain string if it contains no special
    /// characters.
    ///
    /// Such a pattern matches only its own text, which lets pathname
    /// expansion skip the directory scan entirely.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match &self.body {
            Body::Literal(s) => Some(s),
            Body::Regex { .. } => None,
        }
    }

    /// Whether this pattern was compiled for partial matching.
    #[must_use]
    pub fn allows_partial_match(&self) -> bool {
        match &self.body {
            Body::Literal(_) => false,
            Body::Regex { partial, .. } => *partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(pattern: &str) -> Pattern {
        Pattern::parse(without_escape(pattern), &Config::default()).unwrap()
    }

    #[test]
    fn literal_pattern_matches_itself_only() {
        let p = full("foo.txt");
        assert_eq!(p.as_literal(), Some("foo.txt"));
        assert!(p.is_match("foo.txt"));
        assert!(!p.is_match("afoo.txt"));
        assert!(!p.is_match("foo.txtb"));
    }

    #[test]
    fn question_mark_matches_single_character() {
        let p = full("a?c");
        assert!(p.is_match("abc"));
        assert!(p.is_match("axc"));
        assert!(!p.is_match("ac"));
        assert!(!p.is_match("abbc"));
    }

    #[test]
    fn asterisk_matches_any_sequence() {
        let p = full("a*c");
        assert!(p.is_match("ac"));
        assert!(p.is_match("abc"));
        assert!(p.is_match("a//long//c"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn bracket_expression_literals_and_ranges() {
        let p = full("[abx-z]");
        assert!(p.is_match("a"));
        assert!(p.is_match("y"));
        assert!(!p.is_match("c"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn bracket_complement() {
        let p = full("[!0-9]");
        assert!(p.is_match("a"));
        assert!(!p.is_match("5"));
    }

    #[test]
    fn bracket_char_class() {
        let p = full("[[:digit:]][[:alpha:]]");
        assert!(p.is_match("7k"));
        assert!(!p.is_match("kk"));
    }

    #[test]
    fn unknown_char_class_is_an_error() {
        let e = Pattern::parse(without_escape("[[:wombat:]]"), &Config::default());
        assert_eq!(e.unwrap_err(), Error::UnknownCharClass("wombat".to_string()));
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        let p = full("a[b");
        assert!(p.is_match("a[b"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn quoted_special_characters_match_literally() {
        let p = Pattern::parse(with_escape(r"\*\?"), &Config::default()).unwrap();
        assert!(p.is_match("*?"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn regex_metacharacters_are_inert() {
        let p = full("a.c+{d}");
        assert!(p.is_match("a.c+{d}"));
        assert!(!p.is_match("abc+{d}"));
    }

    #[test]
    fn case_insensitive_matching() {
        let config = Config {
            case_insensitive: true,
            ..Config::default()
        };
        let p = Pattern::parse(without_escape("R[e]adme*"), &config).unwrap();
        assert!(p.is_match("README.md"));
    }

    #[test]
    fn partial_match_finds_prefix() {
        let config = Config {
            allow_partial_match: true,
            ..Config::default()
        };
        let p = Pattern::parse(without_escape("ab*"), &config).unwrap();
        assert_eq!(p.find("xabcd"), Some(1..5));
    }

    #[test]
    fn literal_initial_period_excludes_dotfiles() {
        let config = Config {
            literal_initial_period: true,
            ..Config::default()
        };
        let p = Pattern::parse(without_escape("*"), &config).unwrap();
        assert!(p.is_match("visible"));
        assert!(!p.is_match(".hidden"));
        let q = Pattern::parse(without_escape(".*"), &config).unwrap();
        assert!(q.is_match(".hidden"));
    }
}
