// This file is part of cjsh, a POSIX-compatible interactive shell.
// Copyright (C) 2025 Caden Finley

//! Conversion of pattern ASTs to regular expressions

use crate::ast::{Ast, Atom, Bracket, BracketAtom, BracketItem};
use crate::{Config, Error};
use regex_syntax::ast::ClassAsciiKind;
use std::fmt::Write;

/// Characters that must be escaped outside bracket expressions
const SPECIAL_CHARS: &str = r".*+?()|[]{}^$\#&-~";

/// Characters that must be escaped inside bracket expressions
const BRACKET_SPECIAL_CHARS: &str = r"[]^&~\-";

fn push_literal(c: char, out: &mut String) {
    if SPECIAL_CHARS.contains(c) {
        out.push('\\');
    }
    out.push(c);
}

fn push_bracket_char(c: char, out: &mut String) {
    if BRACKET_SPECIAL_CHARS.contains(c) {
        out.push('\\');
    }
    out.push(c);
}

fn class_name(kind: &ClassAsciiKind) -> &'static str {
    use ClassAsciiKind::*;
    match kind {
        Alnum => "alnum",
        Alpha => "alpha",
        Ascii => "ascii",
        Blank => "blank",
        Cntrl => "cntrl",
        Digit => "digit",
        Graph => "graph",
        Lower => "lower",
        Print => "print",
        Punct => "punct",
        Space => "space",
        Upper => "upper",
        Word => "word",
        Xdigit => "xdigit",
    }
}

fn fmt_bracket(bracket: &Bracket, exclude_period: bool, out: &mut String) -> Result<(), Error> {
    out.push('[');
    if bracket.complement {
        out.push('^');
        if exclude_period {
            out.push('.');
        }
    }
    for item in &bracket.items {
        match item {
            BracketItem::Atom(BracketAtom::Char(c)) => push_bracket_char(*c, out),
            BracketItem::Atom(BracketAtom::CharClass(name)) => {
                let kind = ClassAsciiKind::from_name(name)
                    .ok_or_else(|| Error::UnknownCharClass(name.clone()))?;
                write!(out, "[:{}:]", class_name(&kind)).unwrap();
            }
            BracketItem::Range(range) => {
                push_bracket_char(*range.start(), out);
                out.push('-');
                push_bracket_char(*range.end(), out);
            }
        }
    }
    out.push(']');
    Ok(())
}

fn fmt_atom(atom: &Atom, is_first: bool, config: &Config, out: &mut String) -> Result<(), Error> {
    let guard_period = is_first && config.literal_initial_period;
    match atom {
        Atom::Char(c) => push_literal(*c, out),
        Atom::AnyChar => {
            if guard_period {
                out.push_str("[^.]");
            } else {
                out.push('.');
            }
        }
        Atom::AnyString => {
            if guard_period {
                out.push_str("(?:[^.].*)?");
            } else {
                out.push_str(".*");
            }
        }
        Atom::Bracket(bracket) => {
            // Only a complement set can be made period-safe without
            // look-around; an explicit positive set containing `.` is
            // taken as intentional.
            fmt_bracket(bracket, guard_period && bracket.complement, out)?;
        }
    }
    Ok(())
}

/// Converts a pattern AST to a regular expression string.
///
/// The result matches the whole subject unless
/// [`allow_partial_match`](Config::allow_partial_match) is set. The `s` flag
/// is enabled so that `*` and `?` match newlines like any other character.
pub fn to_regex(ast: &Ast, config: &Config) -> Result<String, Error> {
    let mut out = String::new();
    out.push_str("(?s:");
    if !config.allow_partial_match {
        out.push_str(r"\A");
    }
    let mut is_first = true;
    for atom in &ast.atoms {
        fmt_atom(atom, is_first, config, &mut out)?;
        is_first = false;
    }
    if !config.allow_partial_match {
        out.push_str(r"\z");
    }
    out.push(')');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::without_escape;

    fn regex_for(pattern: &str, config: &Config) -> String {
        to_regex(&Ast::parse(without_escape(pattern)), config).unwrap()
    }

    #[test]
    fn escapes_regex_metacharacters() {
        assert_eq!(regex_for("a.b", &Config::default()), r"(?s:\Aa\.b\z)");
    }

    #[test]
    fn wildcards_become_dot_forms() {
        assert_eq!(regex_for("?*", &Config::default()), r"(?s:\A..*\z)");
    }

    #[test]
    fn partial_match_drops_anchors() {
        let config = Config {
            allow_partial_match: true,
            ..Config::default()
        };
        assert_eq!(regex_for("a?", &config), "(?s:a.)");
    }

    #[test]
    fn bracket_expression_with_class() {
        assert_eq!(
            regex_for("[[:digit:]x]", &Config::default()),
            r"(?s:\A[[:digit:]x]\z)"
        );
    }

    #[test]
    fn complement_excludes_period_when_guarded() {
        let config = Config {
            literal_initial_period: true,
            ..Config::default()
        };
        assert_eq!(regex_for("[!a]b", &config), r"(?s:\A[^.a]b\z)");
    }

    #[test]
    fn unknown_class_is_rejected() {
        let err = to_regex(
            &Ast::parse(without_escape("[[:wombat:]]")),
            &Config::default(),
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownCharClass("wombat".to_string()));
    }
}
