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

//! Conditional command evaluation
//!
//! `[[ … ]]` operands expand without field splitting or pathname
//! expansion. `==`/`!=` are pattern matches with the same engine as
//! `case`; `=~` is an extended-regex search. The file-test primitives
//! are shared with the `test`/`[` built-in.

use crate::expansion::{self, Error, ErrorCause};
use cjsh_env::Env;
use cjsh_fnmatch::{Config, Pattern};
use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::{CondBinaryOp, CondExpr, CondUnaryOp, Word};
use std::fs::Metadata;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

/// Result of conditional evaluation
pub type Result<T> = std::result::Result<T, Error>;

/// Evaluates a conditional expression.
pub fn eval(env: &mut Env, expr: &CondExpr) -> Result<bool> {
    match expr {
        CondExpr::Not(inner) => Ok(!eval(env, inner)?),
        CondExpr::And(lhs, rhs) => Ok(eval(env, lhs)? && eval(env, rhs)?),
        CondExpr::Or(lhs, rhs) => Ok(eval(env, lhs)? || eval(env, rhs)?),
        CondExpr::Word(word) => {
            let value = expand(env, word)?;
            Ok(!value.is_empty())
        }
        CondExpr::Unary { op, operand } => {
            let value = expand(env, operand)?;
            Ok(unary_test(env, *op, &value))
        }
        CondExpr::Binary { op, lhs, rhs } => binary_test(env, *op, lhs, rhs),
    }
}

fn expand(env: &mut Env, word: &Word) -> Result<String> {
    expansion::expand_word(env, word).map(|field| field.value)
}

/// Applies a unary test to an already expanded operand.
///
/// Shared with the `test`/`[` built-in.
#[must_use]
pub fn unary_test(env: &Env, op: CondUnaryOp, operand: &str) -> bool {
    use CondUnaryOp::*;
    match op {
        IsEmptyString => operand.is_empty(),
        IsNonEmptyString => !operand.is_empty(),
        IsTerminalFd => operand
            .parse()
            .is_ok_and(cjsh_env::system::isatty),
        _ => file_test(env, op, Path::new(operand)),
    }
}

fn metadata(path: &Path) -> Option<Metadata> {
    path.metadata().ok()
}

/// File-type and permission tests.
#[must_use]
pub fn file_test(env: &Env, op: CondUnaryOp, path: &Path) -> bool {
    use CondUnaryOp::*;
    let _ = env;
    match op {
        Exists => path.exists(),
        IsFile => metadata(path).is_some_and(|m| m.is_file()),
        IsDir => metadata(path).is_some_and(|m| m.is_dir()),
        IsSymlink => path
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink()),
        IsFifo => metadata(path).is_some_and(|m| m.file_type().is_fifo()),
        IsBlock => metadata(path).is_some_and(|m| m.file_type().is_block_device()),
        IsChar => metadata(path).is_some_and(|m| m.file_type().is_char_device()),
        IsSocket => metadata(path).is_some_and(|m| m.file_type().is_socket()),
        NonEmptyFile => metadata(path).is_some_and(|m| m.len() > 0),
        Readable => nix::unistd::access(path, nix::unistd::AccessFlags::R_OK).is_ok(),
        Writable => nix::unistd::access(path, nix::unistd::AccessFlags::W_OK).is_ok(),
        Executable => nix::unistd::access(path, nix::unistd::AccessFlags::X_OK).is_ok(),
        OwnedByEuid => {
            metadata(path).is_some_and(|m| m.uid() == nix::unistd::geteuid().as_raw())
        }
        OwnedByEgid => {
            metadata(path).is_some_and(|m| m.gid() == nix::unistd::getegid().as_raw())
        }
        ModifiedSinceRead => metadata(path).is_some_and(|m| m.mtime() > m.atime()),
        IsEmptyString | IsNonEmptyString | IsTerminalFd => false,
    }
}

fn binary_test(
    env: &mut Env,
    op: CondBinaryOp,
    lhs_word: &Word,
    rhs_word: &Word,
) -> Result<bool> {
    use CondBinaryOp::*;
    let lhs = expand(env, lhs_word)?;
    match op {
        Match | NoMatch => {
            // The right side is a pattern; quoting makes it literal.
            let chars = expansion::expand_pattern_chars(env, rhs_word)?;
            let pattern =
                Pattern::parse(chars, &Config::default()).map_err(|error| Error {
                    cause: ErrorCause::Pattern {
                        message: error.to_string(),
                    },
                    location: rhs_word.location.clone(),
                })?;
            let matched = pattern.is_match(&lhs);
            Ok(if op == Match { matched } else { !matched })
        }
        RegexMatch => {
            let rhs = expand(env, rhs_word)?;
            let regex = regex::Regex::new(&rhs).map_err(|error| Error {
                cause: ErrorCause::Pattern {
                    message: error.to_string(),
                },
                location: rhs_word.location.clone(),
            })?;
            Ok(regex.is_match(&lhs))
        }
        StrBefore => Ok(lhs < expand(env, rhs_word)?),
        StrAfter => Ok(lhs > expand(env, rhs_word)?),
        IntEq | IntNe | IntLt | IntLe | IntGt | IntGe => {
            let rhs = expand(env, rhs_word)?;
            let left = parse_int(&lhs, &lhs_word.location)?;
            let right = parse_int(&rhs, &rhs_word.location)?;
            Ok(match op {
                IntEq => left == right,
                IntNe => left != right,
                IntLt => left < right,
                IntLe => left <= right,
                IntGt => left > right,
                IntGe => left >= right,
                _ => unreachable!(),
            })
        }
        NewerThan | OlderThan | SameFile => {
            let rhs = expand(env, rhs_word)?;
            Ok(file_compare(op, Path::new(&lhs), Path::new(&rhs)))
        }
    }
}

fn parse_int(text: &str, location: &Location) -> Result<i64> {
    text.trim().parse().map_err(|_| Error {
        cause: ErrorCause::Arith {
            message: format!("integer expression expected: {text:?}"),
        },
        location: location.clone(),
    })
}

/// `-nt`, `-ot`, and `-ef` comparisons, shared with `test`.
#[must_use]
pub fn file_compare(op: CondBinaryOp, lhs: &Path, rhs: &Path) -> bool {
    let left = metadata(lhs);
    let right = metadata(rhs);
    match op {
        CondBinaryOp::NewerThan => match (left, right) {
            (Some(l), Some(r)) => l.mtime() > r.mtime(),
            (Some(_), None) => true,
            _ => false,
        },
        CondBinaryOp::OlderThan => match (left, right) {
            (Some(l), Some(r)) => l.mtime() < r.mtime(),
            (None, Some(_)) => true,
            _ => false,
        },
        CondBinaryOp::SameFile => match (left, right) {
            (Some(l), Some(r)) => l.dev() == r.dev() && l.ino() == r.ino(),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cjsh_env::variable::Scope;
    use std::str::FromStr;

    fn eval_expr(env: &mut Env, source: &str) -> Result<bool> {
        let list = cjsh_syntax::syntax::List::from_str(&format!("[[ {source} ]]")).unwrap();
        let cjsh_syntax::syntax::Command::Compound(full) = &*list.0[0].and_or.first.commands[0]
        else {
            unreachable!();
        };
        let cjsh_syntax::syntax::CompoundCommand::DoubleBracket(expr) = &full.command else {
            unreachable!();
        };
        eval(env, expr)
    }

    #[test]
    fn string_tests() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "v", "text").unwrap();
        assert_eq!(eval_expr(&mut env, "-n $v"), Ok(true));
        assert_eq!(eval_expr(&mut env, "-z $v"), Ok(false));
        assert_eq!(eval_expr(&mut env, "-z $unset"), Ok(true));
        assert_eq!(eval_expr(&mut env, "$v"), Ok(true));
        assert_eq!(eval_expr(&mut env, "$unset"), Ok(false));
    }

    #[test]
    fn pattern_match_and_literal_quotes() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "f", "file.rs").unwrap();
        assert_eq!(eval_expr(&mut env, "$f == *.rs"), Ok(true));
        assert_eq!(eval_expr(&mut env, "$f == '*.rs'"), Ok(false));
        assert_eq!(eval_expr(&mut env, "$f != *.c"), Ok(true));
        assert_eq!(eval_expr(&mut env, "$f = *.rs"), Ok(true));
    }

    #[test]
    fn regex_match() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "n", "1234").unwrap();
        assert_eq!(eval_expr(&mut env, "$n =~ ^[0-9]+$"), Ok(true));
        assert_eq!(eval_expr(&mut env, "$n =~ ^[a-z]+$"), Ok(false));
        assert!(eval_expr(&mut env, "x =~ [").is_err());
    }

    #[test]
    fn integer_comparisons() {
        let mut env = Env::new();
        assert_eq!(eval_expr(&mut env, "3 -lt 5"), Ok(true));
        assert_eq!(eval_expr(&mut env, "5 -le 5"), Ok(true));
        assert_eq!(eval_expr(&mut env, "5 -gt 5"), Ok(false));
        assert_eq!(eval_expr(&mut env, "5 -eq 5"), Ok(true));
        assert_eq!(eval_expr(&mut env, "5 -ne 4"), Ok(true));
        assert!(eval_expr(&mut env, "x -eq 3").is_err());
    }

    #[test]
    fn string_ordering() {
        let mut env = Env::new();
        assert_eq!(eval_expr(&mut env, "abc < abd"), Ok(true));
        assert_eq!(eval_expr(&mut env, "abd > abc"), Ok(true));
    }

    #[test]
    fn logical_connectives() {
        let mut env = Env::new();
        assert_eq!(eval_expr(&mut env, "a == a && b == b"), Ok(true));
        assert_eq!(eval_expr(&mut env, "a == b || b == b"), Ok(true));
        assert_eq!(eval_expr(&mut env, "! a == b"), Ok(true));
        assert_eq!(eval_expr(&mut env, "( a == b || c == c ) && d == d"), Ok(true));
    }

    #[test]
    fn file_tests_on_real_paths() {
        let mut env = Env::new();
        assert_eq!(eval_expr(&mut env, "-e /"), Ok(true));
        assert_eq!(eval_expr(&mut env, "-d /"), Ok(true));
        assert_eq!(eval_expr(&mut env, "-f /"), Ok(false));
        assert_eq!(eval_expr(&mut env, "-e /no/such/path/at/all"), Ok(false));
        assert_eq!(eval_expr(&mut env, "-d /etc/passwd"), Ok(false));
    }

    #[test]
    fn same_file_comparison() {
        let mut env = Env::new();
        assert_eq!(eval_expr(&mut env, "/ -ef /"), Ok(true));
        assert_eq!(eval_expr(&mut env, "/ -ef /etc"), Ok(false));
    }

    #[test]
    fn no_field_splitting_of_operands() {
        let mut env = Env::new();
        env.variables.assign(Scope::Shell, "s", "two words").unwrap();
        // The unquoted variable is still a single operand.
        assert_eq!(eval_expr(&mut env, "$s == 'two words'"), Ok(true));
    }
}
