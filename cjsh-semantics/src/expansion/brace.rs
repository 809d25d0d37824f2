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

//! Brace expansion
//!
//! Runs before every other expansion and is purely textual: only
//! unquoted literal braces count, and deferred expansions inside the
//! alternatives are preserved for the later phases. Supported forms are
//! `{a,b}` alternation (nesting allowed), `{1..5}` and `{1..10..2}`
//! integer ranges with optional zero padding, and `{a..e}` character
//! ranges. A brace group with no comma and no valid range stays
//! literal.

use cjsh_syntax::syntax::{TextUnit, Word, WordUnit};

fn literal(unit: &WordUnit) -> Option<char> {
    match unit {
        WordUnit::Unquoted(TextUnit::Literal(c)) => Some(*c),
        _ => None,
    }
}

/// Expands braces in a word, producing at least one word.
#[must_use]
pub fn expand(word: &Word) -> Vec<Word> {
    for (open, unit) in word.units.iter().enumerate() {
        if literal(unit) != Some('{') {
            continue;
        }
        let Some((close, commas)) = find_matching(&word.units, open) else {
            continue;
        };
        if commas.is_empty() {
            if let Some(values) = range_values(&word.units[open + 1..close]) {
                return substitute(word, open, close, values.iter().map(String::as_str));
            }
            continue;
        }
        let mut alternatives = Vec::new();
        let mut start = open + 1;
        for &comma in &commas {
            alternatives.push(&word.units[start..comma]);
            start = comma + 1;
        }
        alternatives.push(&word.units[start..close]);

        let mut results = Vec::new();
        for alternative in alternatives {
            let mut units = word.units[..open].to_vec();
            units.extend_from_slice(alternative);
            units.extend_from_slice(&word.units[close + 1..]);
            let replacement = Word {
                units,
                location: word.location.clone(),
            };
            results.extend(expand(&replacement));
        }
        return results;
    }
    vec![word.clone()]
}

/// Finds the `}` matching the `{` at `open`, with the positions of
/// top-level commas between them.
fn find_matching(units: &[WordUnit], open: usize) -> Option<(usize, Vec<usize>)> {
    let mut depth = 0usize;
    let mut commas = Vec::new();
    for (index, unit) in units.iter().enumerate().skip(open + 1) {
        match literal(unit) {
            Some('{') => depth += 1,
            Some('}') => {
                if depth == 0 {
                    return Some((index, commas));
                }
                depth -= 1;
            }
            Some(',') if depth == 0 => commas.push(index),
            _ => {}
        }
    }
    None
}

/// Interprets the units between braces as a `..` range, if they form
/// one.
fn range_values(units: &[WordUnit]) -> Option<Vec<String>> {
    let content: String = units.iter().map(literal).collect::<Option<String>>()?;
    let mut parts = content.split("..");
    let first = parts.next()?;
    let second = parts.next()?;
    let step = parts.next();
    if parts.next().is_some() {
        return None;
    }

    if let (Ok(from), Ok(to)) = (first.parse::<i64>(), second.parse::<i64>()) {
        let step = match step {
            None => None,
            Some(s) => Some(s.parse::<i64>().ok()?),
        };
        return numeric_range(first, from, second, to, step);
    }

    // Character range: single alphabetic endpoints, no step.
    if step.is_some() {
        return None;
    }
    let (from, to) = (single_alpha(first)?, single_alpha(second)?);
    let (from, to) = (from as u32, to as u32);
    let values: Vec<String> = if from <= to {
        (from..=to).filter_map(char::from_u32).map(String::from).collect()
    } else {
        (to..=from)
            .rev()
            .filter_map(char::from_u32)
            .map(String::from)
            .collect()
    };
    Some(values)
}

fn single_alpha(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_none() && c.is_ascii_alphabetic() {
        Some(c)
    } else {
        None
    }
}

fn numeric_range(
    first_text: &str,
    from: i64,
    second_text: &str,
    to: i64,
    step: Option<i64>,
) -> Option<Vec<String>> {
    let step = match step {
        Some(0) => return None,
        Some(s) => s.abs(),
        None => 1,
    };
    // Zero-padded endpoints pad the whole sequence.
    let width = if has_leading_zero(first_text) || has_leading_zero(second_text) {
        first_text
            .trim_start_matches('-')
            .len()
            .max(second_text.trim_start_matches('-').len())
    } else {
        0
    };
    let mut values = Vec::new();
    let mut current = from;
    if from <= to {
        while current <= to {
            values.push(pad(current, width));
            current += step;
        }
    } else {
        while current >= to {
            values.push(pad(current, width));
            current -= step;
        }
    }
    Some(values)
}

fn has_leading_zero(s: &str) -> bool {
    let digits = s.trim_start_matches('-');
    digits.len() > 1 && digits.starts_with('0')
}

fn pad(value: i64, width: usize) -> String {
    if width == 0 {
        value.to_string()
    } else if value < 0 {
        format!("-{:0width$}", -value, width = width.saturating_sub(1))
    } else {
        format!("{value:0width$}")
    }
}

/// Rebuilds the word once per substituted value.
fn substitute<'a>(
    word: &Word,
    open: usize,
    close: usize,
    values: impl Iterator<Item = &'a str>,
) -> Vec<Word> {
    let mut results = Vec::new();
    for value in values {
        let mut units = word.units[..open].to_vec();
        units.extend(
            value
                .chars()
                .map(|c| WordUnit::Unquoted(TextUnit::Literal(c))),
        );
        units.extend_from_slice(&word.units[close + 1..]);
        let replacement = Word {
            units,
            location: word.location.clone(),
        };
        results.extend(expand(&replacement));
    }
    results
}
