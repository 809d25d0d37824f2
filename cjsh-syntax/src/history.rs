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

//! `!`-style history expansion
//!
//! This is a purely textual pre-pass over an interactive input line. It
//! runs once, before lexing, and never re-runs on its own output.
//! Supported forms:
//!
//! - `!!`, `!n`, `!-n`, `!prefix`, `!?substring[?]`
//! - quick substitution `^old^new[^]` at the start of a line
//! - word designators after `:`: `0`, `n`, `^`, `$`, `*`, `n-m`, `n-`,
//!   `n*`, `-m`, plus the shorthand `!$`, `!^`, `!*`
//!
//! Single quotes suppress expansion; a backslash escapes the following
//! `!`. A `!` followed by whitespace, `=`, or `(` is taken literally.

use thiserror::Error;

/// History expansion failure
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum HistoryError {
    /// The referenced event does not exist.
    #[error("{0}: event not found")]
    EventNotFound(String),
    /// A word designator selects words the event does not have.
    #[error("{0}: bad word specifier")]
    BadWordDesignator(String),
    /// `^old^new` did not match the previous command.
    #[error("{0}: substitution failed")]
    SubstitutionFailed(String),
}

/// Applies history expansion to an input line.
///
/// `history` holds previous commands, oldest first. Returns
/// `Ok(Some(line))` when an expansion happened, `Ok(None)` when the
/// line is unchanged.
pub fn expand(line: &str, history: &[String]) -> Result<Option<String>, HistoryError> {
    // Quick substitution applies to the line as a whole.
    if let Some(rest) = line.strip_prefix('^') {
        return quick_substitution(rest, history).map(Some);
    }

    let chars: Vec<char> = line.chars().collect();
    let mut out = String::new();
    let mut changed = false;
    let mut in_single_quotes = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' => {
                in_single_quotes = !in_single_quotes;
                out.push(c);
                i += 1;
            }
            '\\' if !in_single_quotes => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            '!' if !in_single_quotes => match chars.get(i + 1) {
                None | Some(' ' | '\t' | '\n' | '=' | '(' | '\'' | '"') => {
                    out.push(c);
                    i += 1;
                }
                Some(_) => {
                    let (text, next) = event(&chars, i, history)?;
                    out.push_str(&text);
                    changed = true;
                    i = next;
                }
            },
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(changed.then_some(out))
}

/// Expands one `!…` event reference starting at `start` (on the `!`).
///
/// Returns the replacement text and the index just past the reference.
fn event(
    chars: &[char],
    start: usize,
    history: &[String],
) -> Result<(String, usize), HistoryError> {
    let mut i = start + 1;
    let designator_start;

    let entry: &str = match chars.get(i) {
        Some('!') => {
            i += 1;
            designator_start = i;
            last_entry(history, &spelling(chars, start, i))?
        }
        Some('-') => {
            let digits_at = i + 1;
            let mut end = digits_at;
            while chars.get(end).is_some_and(|c| c.is_ascii_digit()) {
                end += 1;
            }
            let n: usize = collect(chars, digits_at, end).parse().unwrap_or(0);
            i = end;
            designator_start = i;
            let reference = spelling(chars, start, i);
            if n == 0 || n > history.len() {
                return Err(HistoryError::EventNotFound(reference));
            }
            &history[history.len() - n]
        }
        Some(c) if c.is_ascii_digit() => {
            let mut end = i;
            while chars.get(end).is_some_and(|c| c.is_ascii_digit()) {
                end += 1;
            }
            let n: usize = collect(chars, i, end).parse().unwrap_or(0);
            i = end;
            designator_start = i;
            let reference = spelling(chars, start, i);
            if n == 0 || n > history.len() {
                return Err(HistoryError::EventNotFound(reference));
            }
            &history[n - 1]
        }
        Some('?') => {
            let mut end = i + 1;
            while !matches!(chars.get(end), None | Some('?' | '\n')) {
                end += 1;
            }
            let needle = collect(chars, i + 1, end);
            if chars.get(end) == Some(&'?') {
                end += 1;
            }
            i = end;
            designator_start = i;
            let reference = spelling(chars, start, i);
            history
                .iter()
                .rev()
                .find(|entry| entry.contains(&needle))
                .ok_or(HistoryError::EventNotFound(reference))?
        }
        _ => {
            let mut end = i;
            while chars.get(end).is_some_and(|&c| {
                !c.is_whitespace() && !matches!(c, ':' | '^' | '$' | '*' | '?' | '"' | '\'')
            }) {
                end += 1;
            }
            let prefix = collect(chars, i, end);
            i = end;
            designator_start = i;
            let reference = spelling(chars, start, i);
            history
                .iter()
                .rev()
                .find(|entry| entry.starts_with(&prefix))
                .ok_or(HistoryError::EventNotFound(reference))?
        }
    };

    // Word designators, with or without the leading colon.
    let (selection, end) = designator(chars, designator_start)?;
    match selection {
        None => Ok((entry.to_string(), end)),
        Some(range) => {
            let words: Vec<&str> = entry.split_whitespace().collect();
            let reference = spelling(chars, start, end);
            select_words(&words, range, &reference).map(|text| (text, end))
        }
    }
}

/// Inclusive word range selected by a designator; `usize::MAX` means the
/// last word.
type WordRange = (usize, usize);

/// Parses a word designator at `i`, returning the selected range and the
/// index just past it.
fn designator(
    chars: &[char],
    i: usize,
) -> Result<(Option<WordRange>, usize), HistoryError> {
    // Shorthand without a colon
    match chars.get(i) {
        Some('^') => return Ok((Some((1, 1)), i + 1)),
        Some('$') => return Ok((Some((usize::MAX, usize::MAX)), i + 1)),
        Some('*') => return Ok((Some((1, usize::MAX)), i + 1)),
        Some(':') => {}
        _ => return Ok((None, i)),
    }
    let mut j = i + 1;
    match chars.get(j) {
        Some('^') => Ok((Some((1, 1)), j + 1)),
        Some('$') => Ok((Some((usize::MAX, usize::MAX)), j + 1)),
        Some('*') => Ok((Some((1, usize::MAX)), j + 1)),
        Some('-') => {
            // `:-m` is `0-m`
            let (m, end) = number(chars, j + 1);
            Ok((Some((0, m.unwrap_or(usize::MAX))), end))
        }
        Some(c) if c.is_ascii_digit() => {
            let (n, end) = number(chars, j);
            let n = n.unwrap_or(0);
            j = end;
            match chars.get(j) {
                Some('*') => Ok((Some((n, usize::MAX)), j + 1)),
                Some('-') => {
                    let (m, end) = number(chars, j + 1);
                    match m {
                        Some(m) => Ok((Some((n, m)), end)),
                        // `n-` drops the last word
                        None => Ok((Some((n, usize::MAX - 1)), end)),
                    }
                }
                _ => Ok((Some((n, n)), j)),
            }
        }
        _ => {
            // A colon not followed by a designator is ordinary text.
            Ok((None, i))
        }
    }
}

fn number(chars: &[char], i: usize) -> (Option<usize>, usize) {
    let mut end = i;
    while chars.get(end).is_some_and(|c| c.is_ascii_digit()) {
        end += 1;
    }
    if end == i {
        (None, i)
    } else {
        (collect(chars, i, end).parse().ok(), end)
    }
}

fn select_words(
    words: &[&str],
    (from, to): WordRange,
    reference: &str,
) -> Result<String, HistoryError> {
    if words.is_empty() {
        return Err(HistoryError::BadWordDesignator(reference.to_string()));
    }
    let last = words.len() - 1;
    let from = if from == usize::MAX { last } else { from };
    let to = if to == usize::MAX {
        last
    } else if to == usize::MAX - 1 {
        // `n-`: all but the last word
        last.saturating_sub(1)
    } else {
        to
    };
    if from > to || to > last {
        return Err(HistoryError::BadWordDesignator(reference.to_string()));
    }
    Ok(words[from..=to].join(" "))
}

fn last_entry<'h>(history: &'h [String], reference: &str) -> Result<&'h str, HistoryError> {
    history
        .last()
        .map(String::as_str)
        .ok_or(HistoryError::EventNotFound(reference.to_string()))
}

fn quick_substitution(rest: &str, history: &[String]) -> Result<String, HistoryError> {
    let reference = format!("^{rest}");
    let mut parts = rest.splitn(3, '^');
    let old = parts.next().unwrap_or_default();
    let Some(new) = parts.next() else {
        return Err(HistoryError::SubstitutionFailed(reference));
    };
    let previous = last_entry(history, &reference)?;
    if old.is_empty() || !previous.contains(old) {
        return Err(HistoryError::SubstitutionFailed(reference));
    }
    let mut result = previous.replacen(old, new, 1);
    // Anything after the closing `^` is appended.
    if let Some(tail) = parts.next() {
        result.push_str(tail);
    }
    Ok(result)
}

fn collect(chars: &[char], from: usize, to: usize) -> String {
    chars[from..to].iter().collect()
}

fn spelling(chars: &[char], from: usize, to: usize) -> String {
    collect(chars, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_expansion_returns_none() {
        let history = hist(&["echo a"]);
        assert_eq!(expand("plain command", &history), Ok(None));
        assert_eq!(expand("a ! b", &history), Ok(None));
        assert_eq!(expand("x=y!", &history), Ok(None));
    }

    #[test]
    fn bang_bang_recalls_previous() {
        let history = hist(&["echo one", "echo two"]);
        assert_eq!(
            expand("!!", &history),
            Ok(Some("echo two".to_string()))
        );
        assert_eq!(
            expand("sudo !!", &history),
            Ok(Some("sudo echo two".to_string()))
        );
    }

    #[test]
    fn absolute_and_relative_numbers() {
        let history = hist(&["first", "second", "third"]);
        assert_eq!(expand("!1", &history), Ok(Some("first".to_string())));
        assert_eq!(expand("!3", &history), Ok(Some("third".to_string())));
        assert_eq!(expand("!-1", &history), Ok(Some("third".to_string())));
        assert_eq!(expand("!-3", &history), Ok(Some("first".to_string())));
    }

    #[test]
    fn out_of_range_event_fails() {
        let history = hist(&["only"]);
        assert_eq!(
            expand("!5", &history),
            Err(HistoryError::EventNotFound("!5".to_string()))
        );
        assert_eq!(
            expand("!-2", &history),
            Err(HistoryError::EventNotFound("!-2".to_string()))
        );
    }

    #[test]
    fn prefix_search() {
        let history = hist(&["git status", "ls -l", "git push"]);
        assert_eq!(expand("!git", &history), Ok(Some("git push".to_string())));
        assert_eq!(expand("!ls", &history), Ok(Some("ls -l".to_string())));
        assert_eq!(
            expand("!rm", &history),
            Err(HistoryError::EventNotFound("!rm".to_string()))
        );
    }

    #[test]
    fn substring_search() {
        let history = hist(&["make test", "cargo build"]);
        assert_eq!(
            expand("!?build?", &history),
            Ok(Some("cargo build".to_string()))
        );
        assert_eq!(
            expand("!?test", &history),
            Ok(Some("make test".to_string()))
        );
    }

    #[test]
    fn word_designators() {
        let history = hist(&["cp src/a.txt dest/b.txt extra"]);
        assert_eq!(expand("!!:0", &history), Ok(Some("cp".to_string())));
        assert_eq!(expand("!!:1", &history), Ok(Some("src/a.txt".to_string())));
        assert_eq!(expand("echo !!:$", &history), Ok(Some("echo extra".to_string())));
        assert_eq!(
            expand("!!:*", &history),
            Ok(Some("src/a.txt dest/b.txt extra".to_string()))
        );
        assert_eq!(
            expand("!!:1-2", &history),
            Ok(Some("src/a.txt dest/b.txt".to_string()))
        );
        assert_eq!(
            expand("!!:1-", &history),
            Ok(Some("src/a.txt dest/b.txt".to_string()))
        );
    }

    #[test]
    fn shorthand_designators() {
        let history = hist(&["mv old new"]);
        assert_eq!(expand("ls !$", &history), Ok(Some("ls new".to_string())));
        assert_eq!(expand("ls !^", &history), Ok(Some("ls old".to_string())));
        assert_eq!(expand("ls !*", &history), Ok(Some("ls old new".to_string())));
    }

    #[test]
    fn bad_designator_fails() {
        let history = hist(&["solo"]);
        assert_eq!(
            expand("!!:3", &history),
            Err(HistoryError::BadWordDesignator("!!:3".to_string()))
        );
    }

    #[test]
    fn quick_substitution_replaces_first() {
        let history = hist(&["echo foo foo"]);
        assert_eq!(
            expand("^foo^bar^", &history),
            Ok(Some("echo bar foo".to_string()))
        );
        assert_eq!(
            expand("^foo^bar", &history),
            Ok(Some("echo bar foo".to_string()))
        );
    }

    #[test]
    fn quick_substitution_failure() {
        let history = hist(&["echo x"]);
        assert_eq!(
            expand("^nope^y^", &history),
            Err(HistoryError::SubstitutionFailed("^nope^y^".to_string()))
        );
    }

    #[test]
    fn single_quotes_suppress_expansion() {
        let history = hist(&["previous"]);
        assert_eq!(expand("echo '!!'", &history), Ok(None));
        assert_eq!(
            expand("echo '!' !!", &history),
            Ok(Some("echo '!' previous".to_string()))
        );
    }

    #[test]
    fn backslash_suppresses_expansion() {
        let history = hist(&["previous"]);
        assert_eq!(expand(r"echo \!\!", &history), Ok(None));
    }

    #[test]
    fn expansion_inside_double_quotes() {
        let history = hist(&["date"]);
        assert_eq!(
            expand("echo \"!!\"", &history),
            Ok(Some("echo \"date\"".to_string()))
        );
    }
}
