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

//! Parameter expansion
//!
//! Covers `$name`, the positional and special parameters, and the full
//! `${…}` modifier family: switches, trims, pattern substitution,
//! length, and slicing.

use super::super::attr::Origin;
use super::super::{Error, ErrorCause, Result};
use super::{arith, Expander};
use cjsh_env::variable::Scope;
use cjsh_env::Env;
use cjsh_fnmatch::{Config, Pattern};
use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::{
    Modifier, Param, SpecialParam, Switch, SwitchAction, SwitchCondition, Trim, TrimLength,
    TrimSide, Word,
};

/// Whether the parameter is `$@` or `$*`.
#[must_use]
pub fn is_positional_list(param: &Param) -> bool {
    matches!(
        param,
        Param::Special(SpecialParam::At | SpecialParam::Asterisk)
    )
}

/// Intermediate value of a parameter
#[derive(Clone, Debug, Eq, PartialEq)]
enum Value {
    Unset,
    Scalar(String),
    /// `$@`/`$*`: the positional parameters
    Array(Vec<String>),
}

impl Value {
    fn is_unset(&self) -> bool {
        *self == Value::Unset
    }

    fn is_unset_or_empty(&self) -> bool {
        match self {
            Value::Unset => true,
            Value::Scalar(s) => s.is_empty(),
            Value::Array(values) => values.iter().all(String::is_empty),
        }
    }

    fn into_strings(self) -> Vec<String> {
        match self {
            Value::Unset => Vec::new(),
            Value::Scalar(s) => vec![s],
            Value::Array(values) => values,
        }
    }
}

fn lookup(env: &Env, param: &Param) -> Value {
    match param {
        Param::Variable(name) => match env.variables.value_of(name) {
            Some(value) => Value::Scalar(value.to_string()),
            None => Value::Unset,
        },
        Param::Positional(index) => {
            match env.variables.positional_params().get(index - 1) {
                Some(value) => Value::Scalar(value.clone()),
                None => Value::Unset,
            }
        }
        Param::Special(special) => match special {
            SpecialParam::At | SpecialParam::Asterisk => {
                Value::Array(env.variables.positional_params().to_vec())
            }
            SpecialParam::Number => {
                Value::Scalar(env.variables.positional_params().len().to_string())
            }
            SpecialParam::Question => Value::Scalar(env.exit_status.to_string()),
            SpecialParam::Dollar => Value::Scalar(env.main_pid.to_string()),
            SpecialParam::Exclamation => {
                let pid = env.jobs.last_async_pid();
                if pid.as_raw() == 0 {
                    Value::Unset
                } else {
                    Value::Scalar(pid.to_string())
                }
            }
            SpecialParam::Hyphen => Value::Scalar(env.options.flags_string()),
            SpecialParam::Zero => Value::Scalar(env.arg0.clone()),
        },
    }
}

fn param_name(param: &Param) -> String {
    param.to_string()
}

/// Expands one parameter into the expander's phrase.
pub(super) fn expand(
    expander: &mut Expander,
    param: &Param,
    modifier: &Modifier,
    quoted: bool,
    location: &Location,
) -> Result<()> {
    let value = lookup(expander.env, param);

    let value = match modifier {
        Modifier::None => value,
        Modifier::Length => length_of(value),
        Modifier::Switch(switch) => {
            match apply_switch(expander.env, param, switch, value, location)? {
                SwitchResult::Value(value) => value,
                SwitchResult::Substitute(word) => {
                    return substitute_word(expander, &word, quoted);
                }
            }
        }
        Modifier::Trim(trim) => apply_trim(expander.env, trim, value, location)?,
        Modifier::Subst(subst) => apply_subst(expander.env, subst, value, location)?,
        Modifier::Slice { offset, length } => {
            apply_slice(expander.env, value, offset, length.as_deref(), location)?
        }
    };

    if value.is_unset() {
        // Unset expands to nothing unless `nounset` forbids it.
        if !expander.env.options.is_on(cjsh_env::option::Option::Unset) {
            return Err(Error {
                cause: ErrorCause::UnsetVariable {
                    name: param_name(param),
                },
                location: location.clone(),
            });
        }
        return Ok(());
    }

    emit(expander, param, value, quoted);
    Ok(())
}

/// Emits a final value into the phrase.
fn emit(expander: &mut Expander, param: &Param, value: Value, quoted: bool) {
    match value {
        Value::Unset => {}
        Value::Scalar(s) => expander.push_str(&s, Origin::SoftExpansion, quoted),
        Value::Array(values) => {
            let join = quoted && matches!(param, Param::Special(SpecialParam::Asterisk));
            if join {
                let separator = first_ifs_char(expander.env);
                let mut first = true;
                for value in values {
                    if !first {
                        if let Some(sep) = separator {
                            expander.push(sep, Origin::SoftExpansion, true);
                        }
                    }
                    first = false;
                    expander.push_str(&value, Origin::SoftExpansion, true);
                }
            } else {
                let mut first = true;
                for value in values {
                    if !first {
                        expander.begin_field();
                    }
                    first = false;
                    expander.push_str(&value, Origin::SoftExpansion, quoted);
                }
            }
        }
    }
}

fn first_ifs_char(env: &Env) -> Option<char> {
    match env.variables.value_of("IFS") {
        Some(ifs) => ifs.chars().next(),
        None => Some(' '),
    }
}

fn length_of(value: Value) -> Value {
    match value {
        Value::Unset => Value::Scalar("0".to_string()),
        Value::Scalar(s) => Value::Scalar(s.chars().count().to_string()),
        Value::Array(values) => Value::Scalar(values.len().to_string()),
    }
}

enum SwitchResult {
    Value(Value),
    Substitute(Word),
}

fn apply_switch(
    env: &mut Env,
    param: &Param,
    switch: &Switch,
    value: Value,
    location: &Location,
) -> Result<SwitchResult> {
    let met = match switch.condition {
        SwitchCondition::Unset => value.is_unset(),
        SwitchCondition::UnsetOrEmpty => value.is_unset_or_empty(),
    };
    match switch.action {
        SwitchAction::Default => Ok(if met {
            SwitchResult::Substitute(switch.word.clone())
        } else {
            SwitchResult::Value(value)
        }),
        SwitchAction::Alternative => Ok(if met {
            SwitchResult::Value(Value::Unset)
        } else {
            SwitchResult::Substitute(switch.word.clone())
        }),
        SwitchAction::Assign => {
            if !met {
                return Ok(SwitchResult::Value(value));
            }
            let Param::Variable(name) = param else {
                return Err(Error {
                    cause: ErrorCause::NonassignableParam {
                        name: param_name(param),
                    },
                    location: location.clone(),
                });
            };
            let substituted = super::super::expand_word(env, &switch.word)?.value;
            env.variables
                .assign(Scope::Shell, name.clone(), substituted.clone())
                .map_err(|e| Error {
                    cause: ErrorCause::AssignReadOnly(e),
                    location: location.clone(),
                })?;
            Ok(SwitchResult::Value(Value::Scalar(substituted)))
        }
        SwitchAction::Error => {
            if met {
                let message = if switch.word.is_empty() {
                    "parameter null or not set".to_string()
                } else {
                    super::super::expand_word(env, &switch.word)?.value
                };
                Err(Error {
                    cause: ErrorCause::EmptyExpansion {
                        name: param_name(param),
                        message,
                    },
                    location: location.clone(),
                })
            } else {
                Ok(SwitchResult::Value(value))
            }
        }
    }
}

/// Expands a switch word in place, preserving its quoting attributes.
fn substitute_word(expander: &mut Expander, word: &Word, quoted: bool) -> Result<()> {
    let phrase = super::expand_word(expander.env, word)?;
    if phrase.force_field {
        expander.force_field();
    }
    let mut first = true;
    for field in phrase.fields {
        if !first {
            expander.begin_field();
        }
        first = false;
        for c in field {
            expander.push(c.value, c.origin, c.is_quoted || quoted);
        }
    }
    Ok(())
}

fn pattern_for(
    env: &mut Env,
    word: &Word,
    config: &Config,
    location: &Location,
) -> Result<Pattern> {
    let chars = super::super::expand_pattern_chars(env, word)?;
    Pattern::parse(chars, config).map_err(|e| Error {
        cause: ErrorCause::Pattern {
            message: e.to_string(),
        },
        location: location.clone(),
    })
}

fn apply_trim(env: &mut Env, trim: &Trim, value: Value, location: &Location) -> Result<Value> {
    if value.is_unset() {
        return Ok(value);
    }
    let pattern = pattern_for(env, &trim.pattern, &Config::default(), location)?;
    let values = value.into_strings();
    let trimmed: Vec<String> = values
        .into_iter()
        .map(|s| trim_one(&s, trim, &pattern))
        .collect();
    Ok(if trimmed.len() == 1 {
        Value::Scalar(trimmed.into_iter().next().unwrap())
    } else {
        Value::Array(trimmed)
    })
}

fn trim_one(subject: &str, trim: &Trim, pattern: &Pattern) -> String {
    let indices: Vec<usize> = subject
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(subject.len()))
        .collect();
    match (trim.side, trim.length) {
        (TrimSide::Prefix, TrimLength::Shortest) => {
            for &i in &indices {
                if pattern.is_match(&subject[..i]) {
                    return subject[i..].to_string();
                }
            }
            subject.to_string()
        }
        (TrimSide::Prefix, TrimLength::Longest) => {
            for &i in indices.iter().rev() {
                if pattern.is_match(&subject[..i]) {
                    return subject[i..].to_string();
                }
            }
            subject.to_string()
        }
        (TrimSide::Suffix, TrimLength::Shortest) => {
            for &i in indices.iter().rev() {
                if pattern.is_match(&subject[i..]) {
                    return subject[..i].to_string();
                }
            }
            subject.to_string()
        }
        (TrimSide::Suffix, TrimLength::Longest) => {
            for &i in &indices {
                if pattern.is_match(&subject[i..]) {
                    return subject[..i].to_string();
                }
            }
            subject.to_string()
        }
    }
}

fn apply_subst(
    env: &mut Env,
    subst: &cjsh_syntax::syntax::Subst,
    value: Value,
    location: &Location,
) -> Result<Value> {
    if value.is_unset() {
        return Ok(value);
    }
    let mut config = Config::default();
    config.allow_partial_match = true;
    let pattern = pattern_for(env, &subst.pattern, &config, location)?;
    let replacement = super::super::expand_word(env, &subst.replacement)?.value;

    let values = value.into_strings();
    let replaced: Vec<String> = values
        .into_iter()
        .map(|s| substitute_matches(&s, &pattern, &replacement, subst.all))
        .collect();
    Ok(if replaced.len() == 1 {
        Value::Scalar(replaced.into_iter().next().unwrap())
    } else {
        Value::Array(replaced)
    })
}

fn substitute_matches(subject: &str, pattern: &Pattern, replacement: &str, all: bool) -> String {
    let mut result = String::new();
    let mut rest = subject;
    loop {
        let Some(found) = pattern.find(rest) else {
            result.push_str(rest);
            return result;
        };
        result.push_str(&rest[..found.start]);
        result.push_str(replacement);
        if found.end == found.start {
            // Empty match: emit one character to guarantee progress.
            match rest[found.end..].chars().next() {
                Some(c) => {
                    result.push(c);
                    rest = &rest[found.end + c.len_utf8()..];
                }
                None => return result,
            }
        } else {
            rest = &rest[found.end..];
        }
        if !all {
            result.push_str(rest);
            return result;
        }
    }
}

fn apply_slice(
    env: &mut Env,
    value: Value,
    offset: &str,
    length: Option<&str>,
    location: &Location,
) -> Result<Value> {
    let offset = arith::eval_raw(env, offset, location)?;
    let length = match length {
        Some(text) => Some(arith::eval_raw(env, text, location)?),
        None => None,
    };

    match value {
        Value::Unset => Ok(Value::Unset),
        Value::Scalar(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (from, to) = slice_bounds(chars.len(), offset, length, location)?;
            Ok(Value::Scalar(chars[from..to].iter().collect()))
        }
        Value::Array(values) => {
            let (from, to) = slice_bounds(values.len(), offset, length, location)?;
            Ok(Value::Array(values[from..to].to_vec()))
        }
    }
}

/// Computes `[from, to)` for a slice, with negative offsets counting
/// from the end.
fn slice_bounds(
    len: usize,
    offset: i64,
    length: Option<i64>,
    location: &Location,
) -> Result<(usize, usize)> {
    let from = if offset < 0 {
        len.saturating_sub(offset.unsigned_abs() as usize)
    } else {
        (offset as usize).min(len)
    };
    let to = match length {
        None => len,
        Some(length) if length < 0 => {
            return Err(Error {
                cause: ErrorCause::BadSlice,
                location: location.clone(),
            })
        }
        Some(length) => (from + length as usize).min(len),
    };
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::super::expand_word as initial_expand_word;
    use super::super::Phrase;
    use super::*;
    use cjsh_env::semantics::ExitStatus;
    use std::str::FromStr;

    fn phrase_of(env: &mut Env, source: &str) -> Phrase {
        let word = Word::from_str(source).unwrap();
        initial_expand_word(env, &word).unwrap()
    }

    fn one_value(env: &mut Env, source: &str) -> String {
        let phrase = phrase_of(env, source);
        assert_eq!(phrase.fields.len(), 1, "{phrase:?}");
        super::super::super::attr::to_string(&phrase.fields[0])
    }

    fn error_of(env: &mut Env, source: &str) -> ErrorCause {
        let word = Word::from_str(source).unwrap();
        initial_expand_word(env, &word).unwrap_err().cause
    }

    fn env_with(vars: &[(&str, &str)]) -> Env {
        let mut env = Env::new();
        for (name, value) in vars {
            env.variables.assign(Scope::Shell, *name, *value).unwrap();
        }
        env
    }

    #[test]
    fn plain_and_braced_variables() {
        let mut env = env_with(&[("v", "value")]);
        assert_eq!(one_value(&mut env, "$v"), "value");
        assert_eq!(one_value(&mut env, "${v}"), "value");
    }

    #[test]
    fn special_parameters() {
        let mut env = env_with(&[]);
        env.exit_status = ExitStatus(3);
        env.arg0 = "cjsh".to_string();
        env.variables
            .set_positional_params(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(one_value(&mut env, "$?"), "3");
        assert_eq!(one_value(&mut env, "$#"), "2");
        assert_eq!(one_value(&mut env, "$0"), "cjsh");
        assert_eq!(one_value(&mut env, "$1"), "a");
        let pid = one_value(&mut env, "$$");
        assert_eq!(pid, env.main_pid.to_string());
    }

    #[test]
    fn switch_default() {
        let mut env = env_with(&[("set", "x")]);
        assert_eq!(one_value(&mut env, "${unset_v:-fallback}"), "fallback");
        assert_eq!(one_value(&mut env, "${set:-fallback}"), "x");
    }

    #[test]
    fn switch_colon_distinguishes_empty() {
        let mut env = env_with(&[("empty", "")]);
        assert_eq!(one_value(&mut env, "${empty:-d}"), "d");
        // Without the colon, an empty-but-set variable is not defaulted;
        // the empty expansion produces no field at all.
        let phrase = phrase_of(&mut env, "${empty-d}");
        assert_eq!(phrase.fields.len(), 0);
    }

    #[test]
    fn switch_assign() {
        let mut env = env_with(&[]);
        assert_eq!(one_value(&mut env, "${x:=default}"), "default");
        assert_eq!(env.variables.value_of("x"), Some("default"));
    }

    #[test]
    fn switch_assign_to_positional_fails() {
        let mut env = env_with(&[]);
        assert_matches::assert_matches!(
            error_of(&mut env, "${1:=x}"),
            ErrorCause::NonassignableParam { .. }
        );
    }

    #[test]
    fn switch_error() {
        let mut env = env_with(&[]);
        assert_matches::assert_matches!(
            error_of(&mut env, "${miss:?custom message}"),
            ErrorCause::EmptyExpansion { name, message } => {
                assert_eq!(name, "miss");
                assert_eq!(message, "custom message");
            }
        );
    }

    #[test]
    fn switch_alternative() {
        let mut env = env_with(&[("v", "x")]);
        assert_eq!(one_value(&mut env, "${v:+yes}"), "yes");
        let phrase = phrase_of(&mut env, "${unset_v:+yes}");
        assert_eq!(phrase.fields.len(), 0);
    }

    #[test]
    fn length_modifier() {
        let mut env = env_with(&[("v", "hello")]);
        assert_eq!(one_value(&mut env, "${#v}"), "5");
        env.variables
            .set_positional_params(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(one_value(&mut env, "${#@}"), "3");
    }

    #[test]
    fn trim_modifiers() {
        let mut env = env_with(&[("path", "a/b/c.txt")]);
        assert_eq!(one_value(&mut env, "${path#*/}"), "b/c.txt");
        assert_eq!(one_value(&mut env, "${path##*/}"), "c.txt");
        assert_eq!(one_value(&mut env, "${path%.txt}"), "a/b/c");
        assert_eq!(one_value(&mut env, "${path%/*}"), "a/b");
        assert_eq!(one_value(&mut env, "${path%%/*}"), "a");
    }

    #[test]
    fn trim_without_match_is_identity() {
        let mut env = env_with(&[("v", "abc")]);
        assert_eq!(one_value(&mut env, "${v#z}"), "abc");
    }

    #[test]
    fn substitution_modifier() {
        let mut env = env_with(&[("v", "banana")]);
        assert_eq!(one_value(&mut env, "${v/an/AN}"), "bANana");
        assert_eq!(one_value(&mut env, "${v//an/AN}"), "bANANa");
        assert_eq!(one_value(&mut env, "${v/x/y}"), "banana");
        assert_eq!(one_value(&mut env, "${v//an/}"), "ba");
    }

    #[test]
    fn slice_modifier() {
        let mut env = env_with(&[("v", "abcdef")]);
        assert_eq!(one_value(&mut env, "${v:1:3}"), "bcd");
        assert_eq!(one_value(&mut env, "${v:4}"), "ef");
        assert_eq!(one_value(&mut env, "${v:9}"), "");
        assert_eq!(one_value(&mut env, "${v:1+1:2*1}"), "cd");
    }

    #[test]
    fn nounset_errors_on_unset() {
        let mut env = env_with(&[]);
        env.options
            .set(cjsh_env::option::Option::Unset, cjsh_env::option::State::Off);
        assert_matches::assert_matches!(
            error_of(&mut env, "$missing"),
            ErrorCause::UnsetVariable { name } => assert_eq!(name, "missing")
        );
        // A switch rescues the expansion.
        assert_eq!(one_value(&mut env, "${missing:-ok}"), "ok");
        // $@ with no parameters is fine even under nounset.
        let phrase = phrase_of(&mut env, "\"$@\"");
        assert_eq!(phrase.fields.len(), 0);
    }

    #[test]
    fn quoted_star_joins_with_first_ifs_char() {
        let mut env = env_with(&[]);
        env.variables
            .set_positional_params(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(one_value(&mut env, "\"$*\""), "a b");
        env.variables.assign(Scope::Shell, "IFS", ":x").unwrap();
        assert_eq!(one_value(&mut env, "\"$*\""), "a:b");
    }

    #[test]
    fn switch_word_quoting_survives() {
        let mut env = env_with(&[]);
        let phrase = phrase_of(&mut env, "${u:-'a b'}");
        assert_eq!(phrase.fields.len(), 1);
        assert!(phrase.fields[0].iter().all(|c| c.is_quoted));
    }
}
