// This file is part of cjsh, a POSIX-compatible interactive shell.
// Copyright (C) 2025 Caden Finley

//! Abstract syntax tree for globbing patterns

use crate::PatternChar;
use std::ops::RangeInclusive;

/// Single item of a bracket expression
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketAtom {
    /// Literal character
    Char(char),
    /// Character class (`[:digit:]`), name kept for validation at
    /// compile time
    CharClass(String),
}

/// Bracket expression component
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketItem {
    /// Single atom
    Atom(BracketAtom),
    /// Character range (`a-z`)
    Range(RangeInclusive<char>),
}

/// Bracket expression
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bracket {
    /// Whether the expression starts with `!` (or `^`), inverting the set
    pub complement: bool,
    /// Items of the expression
    pub items: Vec<BracketItem>,
}

/// Pattern component
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Atom {
    /// Literal character
    Char(char),
    /// `?`
    AnyChar,
    /// `*`
    AnyString,
    /// Bracket expression
    Bracket(Bracket),
}

/// Parsed pattern
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ast {
    /// Components of the pattern
    pub atoms: Vec<Atom>,
}

impl Ast {
    /// Parses a pattern.
    ///
    /// Parsing never fails: an unclosed bracket expression degrades to the
    /// literal characters it is made of, as POSIX requires.
    pub fn parse<I>(pattern: I) -> Self
    where
        I: IntoIterator<Item = PatternChar>,
    {
        let chars: Vec<PatternChar> = pattern.into_iter().collect();
        let mut atoms = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                PatternChar::Literal(c) => {
                    atoms.push(Atom::Char(c));
                    i += 1;
                }
                PatternChar::Normal('?') => {
                    atoms.push(Atom::AnyChar);
                    i += 1;
                }
                PatternChar::Normal('*') => {
                    // Consecutive asterisks are redundant.
                    if atoms.last() != Some(&Atom::AnyString) {
                        atoms.push(Atom::AnyString);
                    }
                    i += 1;
                }
                PatternChar::Normal('[') => match parse_bracket(&chars, i + 1) {
                    Some((bracket, next)) => {
                        atoms.push(Atom::Bracket(bracket));
                        i = next;
                    }
                    None => {
                        atoms.push(Atom::Char('['));
                        i += 1;
                    }
                },
                PatternChar::Normal(c) => {
                    atoms.push(Atom::Char(c));
                    i += 1;
                }
            }
        }
        Ast { atoms }
    }

    /// Returns the pattern text if it consists of literal characters only.
    #[must_use]
    pub fn as_literal(&self) -> Option<String> {
        self.atoms
            .iter()
            .map(|atom| match atom {
                Atom::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

/// Parses a bracket expression starting just after the opening `[`.
///
/// Returns the expression and the index just past the closing `]`, or
/// `None` if the expression is not terminated.
fn parse_bracket(chars: &[PatternChar], start: usize) -> Option<(Bracket, usize)> {
    let mut i = start;
    let complement = matches!(
        chars.get(i),
        Some(PatternChar::Normal('!' | '^'))
    );
    if complement {
        i += 1;
    }

    let mut items = Vec::new();
    let mut first = true;
    loop {
        let pc = *chars.get(i)?;
        match pc {
            // A `]` that is not the first item closes the expression.
            PatternChar::Normal(']') if !first => return Some((Bracket { complement, items }, i + 1)),
            PatternChar::Normal('[')
                if matches!(chars.get(i + 1), Some(PatternChar::Normal(':'))) =>
            {
                let (class, next) = parse_char_class(chars, i + 2)?;
                items.push(BracketItem::Atom(class));
                i = next;
            }
            PatternChar::Normal(c) | PatternChar::Literal(c) => {
                // `a-z` is a range unless the `-` is first or last.
                if matches!(chars.get(i + 1), Some(PatternChar::Normal('-')))
                    && !matches!(chars.get(i + 2), Some(PatternChar::Normal(']')) | None)
                {
                    let end = chars[i + 2].char_value();
                    items.push(BracketItem::Range(c..=end));
                    i += 3;
                } else {
                    items.push(BracketItem::Atom(BracketAtom::Char(c)));
                    i += 1;
                }
            }
        }
        first = false;
    }
}

/// Parses a `[:class:]` atom starting just after the `[:`.
fn parse_char_class(chars: &[PatternChar], start: usize) -> Option<(BracketAtom, usize)> {
    let mut name = String::new();
    let mut i = start;
    loop {
        match *chars.get(i)? {
            PatternChar::Normal(':')
                if matches!(chars.get(i + 1), Some(PatternChar::Normal(']'))) =>
            {
                // The name is not validated here so that compilation can
                // report an unknown class rather than silently degrading.
                return Some((BracketAtom::CharClass(name), i + 2));
            }
            PatternChar::Normal(c) | PatternChar::Literal(c) => {
                name.push(c);
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::without_escape;

    #[test]
    fn literal_characters() {
        let ast = Ast::parse(without_escape("ab"));
        assert_eq!(ast.atoms, [Atom::Char('a'), Atom::Char('b')]);
    }

    #[test]
    fn wildcards() {
        let ast = Ast::parse(without_escape("?*"));
        assert_eq!(ast.atoms, [Atom::AnyChar, Atom::AnyString]);
    }

    #[test]
    fn consecutive_asterisks_collapse() {
        let ast = Ast::parse(without_escape("a***b"));
        assert_eq!(ast.atoms, [Atom::Char('a'), Atom::AnyString, Atom::Char('b')]);
    }

    #[test]
    fn bracket_with_range_and_literal() {
        let ast = Ast::parse(without_escape("[a-cx]"));
        assert_eq!(
            ast.atoms,
            [Atom::Bracket(Bracket {
                complement: false,
                items: vec![
                    BracketItem::Range('a'..='c'),
                    BracketItem::Atom(BracketAtom::Char('x')),
                ],
            })]
        );
    }

    #[test]
    fn bracket_complement_marker() {
        let ast = Ast::parse(without_escape("[!a]"));
        assert_eq!(
            ast.atoms,
            [Atom::Bracket(Bracket {
                complement: true,
                items: vec![BracketItem::Atom(BracketAtom::Char('a'))],
            })]
        );
    }

    #[test]
    fn leading_close_bracket_is_literal_member() {
        let ast = Ast::parse(without_escape("[]a]"));
        assert_eq!(
            ast.atoms,
            [Atom::Bracket(Bracket {
                complement: false,
                items: vec![
                    BracketItem::Atom(BracketAtom::Char(']')),
                    BracketItem::Atom(BracketAtom::Char('a')),
                ],
            })]
        );
    }

    #[test]
    fn unclosed_bracket_degrades_to_literals() {
        let ast = Ast::parse(without_escape("[ab"));
        assert_eq!(
            ast.atoms,
            [Atom::Char('['), Atom::Char('a'), Atom::Char('b')]
        );
    }

    #[test]
    fn trailing_hyphen_is_literal() {
        let ast = Ast::parse(without_escape("[a-]"));
        assert_eq!(
            ast.atoms,
            [Atom::Bracket(Bracket {
                complement: false,
                items: vec![
                    BracketItem::Atom(BracketAtom::Char('a')),
                    BracketItem::Atom(BracketAtom::Char('-')),
                ],
            })]
        );
    }

    #[test]
    fn quoted_bracket_is_literal() {
        let ast = Ast::parse(crate::with_escape(r"\[a]"));
        assert_eq!(
            ast.atoms,
            [Atom::Char('['), Atom::Char('a'), Atom::Char(']')]
        );
    }

    #[test]
    fn as_literal_on_plain_text() {
        assert_eq!(Ast::parse(without_escape("abc")).as_literal().as_deref(), Some("abc"));
        assert_eq!(Ast::parse(without_escape("a*c")).as_literal(), None);
    }
}
