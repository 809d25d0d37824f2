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

//! Arithmetic evaluation for `$(( … ))`, `(( … ))`, and the C-style `for`.
//!
//! Expressions are evaluated over signed 64-bit integers with C operator
//! precedence. Identifiers resolve through the caller-provided [`Env`]
//! trait: an unset variable reads as zero, and assignment operators write
//! the result back. The evaluator parses and evaluates in a single pass,
//! so the untaken branch of `?:`, `&&`, and `||` is parsed but its side
//! effects (assignments, increments) are suppressed.
//!
//! ```
//! use std::collections::HashMap;
//! let mut env: HashMap<String, String> = HashMap::new();
//! assert_eq!(cjsh_arith::eval("x = 2 + 3 * 4", &mut env).unwrap(), 14);
//! assert_eq!(env["x"], "14");
//! ```

mod env;
mod eval;
mod token;

use std::fmt::Display;
use std::ops::Range;
use thiserror::Error;

pub use env::Env;
pub use token::TokenError;

/// Cause of an arithmetic evaluation error
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum ErrorCause<E> {
    /// Error in tokenization
    #[error(transparent)]
    TokenError(TokenError),
    /// Operator or operand in a position where it cannot appear
    #[error("invalid expression syntax")]
    InvalidSyntax,
    /// `(` without a matching `)`
    #[error("unmatched parenthesis")]
    UnmatchedParenthesis,
    /// `?` without a matching `:`
    #[error("`?` without matching `:`")]
    IncompleteConditional,
    /// Assignment or increment target that is not a variable
    #[error("assignment target is not a variable")]
    NotAVariable,
    /// Variable value that does not parse as an integer
    #[error("variable value {0:?} cannot be parsed as a number")]
    InvalidVariableValue(String),
    /// Result or intermediate value out of the `i64` range
    #[error("arithmetic overflow")]
    Overflow,
    /// Division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,
    /// Error reported by the variable environment
    #[error("{0}")]
    EnvError(E),
}

impl<E> From<TokenError> for ErrorCause<E> {
    fn from(e: TokenError) -> Self {
        ErrorCause::TokenError(e)
    }
}

/// Arithmetic evaluation error with its position
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Error<E> {
    /// Cause of the error
    pub cause: ErrorCause<E>,
    /// Byte range in the expression string where the error occurred
    pub location: Range<usize>,
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.cause.fmt(f)
    }
}

impl<E: std::fmt::Debug + Display> std::error::Error for Error<E> {}

impl<E> From<token::Error> for Error<E> {
    fn from(e: token::Error) -> Self {
        Error {
            cause: e.cause.into(),
            location: e.location,
        }
    }
}

/// Evaluates an arithmetic expression.
///
/// This is the only entry point of the crate. See the [crate
/// documentation](self) for the semantics.
pub fn eval<E: Env>(expression: &str, env: &mut E) -> Result<i64, Error<E::Error>> {
    eval::eval(expression, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn ok(expression: &str) -> i64 {
        let mut env: HashMap<String, String> = HashMap::new();
        eval(expression, &mut env).unwrap()
    }

    fn err(expression: &str) -> ErrorCause<std::convert::Infallible> {
        let mut env: HashMap<String, String> = HashMap::new();
        eval(expression, &mut env).unwrap_err().cause
    }

    #[test]
    fn constants_and_radixes() {
        assert_eq!(ok("42"), 42);
        assert_eq!(ok("0x10"), 16);
        assert_eq!(ok("010"), 8);
    }

    #[test]
    fn additive_and_multiplicative_precedence() {
        assert_eq!(ok("2 + 3 * 4"), 14);
        assert_eq!(ok("(2 + 3) * 4"), 20);
        assert_eq!(ok("10 - 4 - 3"), 3);
        assert_eq!(ok("7 / 2"), 3);
        assert_eq!(ok("7 % 3"), 1);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(ok("2 ** 10"), 1024);
        assert_eq!(ok("2 ** 3 ** 2"), 512);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(ok("-5 + 3"), -2);
        assert_eq!(ok("+7"), 7);
        assert_eq!(ok("!0"), 1);
        assert_eq!(ok("!3"), 0);
        assert_eq!(ok("~0"), -1);
        assert_eq!(ok("- - 1"), 1);
    }

    #[test]
    fn comparisons_and_equality() {
        assert_eq!(ok("1 < 2"), 1);
        assert_eq!(ok("2 <= 1"), 0);
        assert_eq!(ok("3 > 2"), 1);
        assert_eq!(ok("3 >= 4"), 0);
        assert_eq!(ok("5 == 5"), 1);
        assert_eq!(ok("5 != 5"), 0);
    }

    #[test]
    fn shifts_and_bitwise() {
        assert_eq!(ok("1 << 4"), 16);
        assert_eq!(ok("256 >> 4"), 16);
        assert_eq!(ok("6 & 3"), 2);
        assert_eq!(ok("6 | 3"), 7);
        assert_eq!(ok("6 ^ 3"), 5);
    }

    #[test]
    fn logical_operators_short_circuit() {
        let mut env: HashMap<String, String> = HashMap::new();
        assert_eq!(eval("0 && (x = 9)", &mut env).unwrap(), 0);
        assert_eq!(env.get("x"), None);
        assert_eq!(eval("1 || (x = 9)", &mut env).unwrap(), 1);
        assert_eq!(env.get("x"), None);
        assert_eq!(eval("1 && (x = 9)", &mut env).unwrap(), 1);
        assert_eq!(env["x"], "9");
    }

    #[test]
    fn conditional_operator() {
        assert_eq!(ok("1 ? 2 : 3"), 2);
        assert_eq!(ok("0 ? 2 : 3"), 3);
        // Right-associative chaining
        assert_eq!(ok("0 ? 1 : 0 ? 2 : 3"), 3);
    }

    #[test]
    fn conditional_skips_untaken_branch() {
        let mut env: HashMap<String, String> = HashMap::new();
        assert_eq!(eval("1 ? 5 : (x = 9)", &mut env).unwrap(), 5);
        assert_eq!(env.get("x"), None);
        // Division by zero in the untaken branch is not an error
        assert_eq!(eval("1 ? 5 : 1 / 0", &mut env).unwrap(), 5);
    }

    #[test]
    fn unset_variable_reads_as_zero() {
        assert_eq!(ok("unset_name + 1"), 1);
    }

    #[test]
    fn variables_resolve_and_assign() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("a".to_string(), "6".to_string());
        assert_eq!(eval("a * 7", &mut env).unwrap(), 42);
        assert_eq!(eval("b = a + 1", &mut env).unwrap(), 7);
        assert_eq!(env["b"], "7");
    }

    #[test]
    fn assignment_is_right_associative() {
        let mut env: HashMap<String, String> = HashMap::new();
        assert_eq!(eval("a = b = 3", &mut env).unwrap(), 3);
        assert_eq!(env["a"], "3");
        assert_eq!(env["b"], "3");
    }

    #[test]
    fn compound_assignments() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("n".to_string(), "10".to_string());
        assert_eq!(eval("n += 5", &mut env).unwrap(), 15);
        assert_eq!(eval("n -= 3", &mut env).unwrap(), 12);
        assert_eq!(eval("n *= 2", &mut env).unwrap(), 24);
        assert_eq!(eval("n /= 5", &mut env).unwrap(), 4);
        assert_eq!(eval("n <<= 2", &mut env).unwrap(), 16);
        assert_eq!(eval("n >>= 1", &mut env).unwrap(), 8);
        assert_eq!(eval("n |= 1", &mut env).unwrap(), 9);
        assert_eq!(eval("n &= 12", &mut env).unwrap(), 8);
        assert_eq!(eval("n ^= 15", &mut env).unwrap(), 7);
        assert_eq!(eval("n %= 4", &mut env).unwrap(), 3);
        assert_eq!(env["n"], "3");
    }

    #[test]
    fn increment_and_decrement() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("i".to_string(), "5".to_string());
        assert_eq!(eval("i++", &mut env).unwrap(), 5);
        assert_eq!(env["i"], "6");
        assert_eq!(eval("++i", &mut env).unwrap(), 7);
        assert_eq!(env["i"], "7");
        assert_eq!(eval("i--", &mut env).unwrap(), 7);
        assert_eq!(env["i"], "6");
        assert_eq!(eval("--i", &mut env).unwrap(), 5);
        assert_eq!(env["i"], "5");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(err("1 / 0"), ErrorCause::DivisionByZero);
        assert_eq!(err("1 % 0"), ErrorCause::DivisionByZero);
    }

    #[test]
    fn overflow_is_an_error() {
        assert_eq!(err("9223372036854775807 + 1"), ErrorCause::Overflow);
        assert_eq!(err("-9223372036854775807 - 2"), ErrorCause::Overflow);
        assert_eq!(err("2 ** 64"), ErrorCause::Overflow);
    }

    #[test]
    fn invalid_variable_value_is_an_error() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("v".to_string(), "hello".to_string());
        assert_matches!(
            eval("v + 1", &mut env).unwrap_err().cause,
            ErrorCause::InvalidVariableValue(value) => assert_eq!(value, "hello")
        );
    }

    #[test]
    fn empty_variable_value_reads_as_zero() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("v".to_string(), "".to_string());
        assert_eq!(eval("v + 1", &mut env).unwrap(), 1);
    }

    #[test]
    fn assignment_to_non_variable_is_an_error() {
        assert_eq!(err("1 = 2"), ErrorCause::NotAVariable);
        assert_eq!(err("7++"), ErrorCause::NotAVariable);
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(err("1 +"), ErrorCause::InvalidSyntax);
        assert_eq!(err("(1"), ErrorCause::UnmatchedParenthesis);
        assert_eq!(err("1 ? 2"), ErrorCause::IncompleteConditional);
        assert_eq!(err(""), ErrorCause::InvalidSyntax);
        assert_eq!(err("1 2"), ErrorCause::InvalidSyntax);
    }

    #[test]
    fn error_location_points_at_the_operator() {
        let mut env: HashMap<String, String> = HashMap::new();
        let error = eval("10 / 0", &mut env).unwrap_err();
        assert_eq!(error.location, 3..4);
    }
}
