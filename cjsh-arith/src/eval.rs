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

//! Single-pass parser-evaluator

use crate::env::Env;
use crate::token::{Operator, Token, TokenValue, Tokens};
use crate::{Error, ErrorCause};
use std::iter::Peekable;
use std::ops::Range;

/// Whether a subexpression is evaluated or only parsed
///
/// The untaken operand of `?:`, `&&`, and `||` must still be syntactically
/// consumed, but its side effects and errors are suppressed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    Eval,
    Skip,
}

/// Partially evaluated operand
///
/// A bare variable is kept unresolved so that it can serve as an
/// assignment target; it is read only when its value is demanded.
#[derive(Clone, Debug)]
enum Term<'a> {
    Value(i64),
    Variable { name: &'a str, location: Range<usize> },
}

struct Parser<'s> {
    source: &'s str,
    tokens: Peekable<Tokens<'s>>,
}

fn overflow_if_none<T, E>(result: Option<T>, location: Range<usize>) -> Result<T, Error<E>> {
    result.ok_or(Error {
        cause: ErrorCause::Overflow,
        location,
    })
}

/// Applies a binary operator to two evaluated operands.
fn apply_binary<E>(
    op: Operator,
    lhs: i64,
    rhs: i64,
    location: Range<usize>,
) -> Result<i64, Error<E>> {
    use Operator::*;
    Ok(match op {
        BarBar => (lhs != 0 || rhs != 0) as i64,
        AndAnd => (lhs != 0 && rhs != 0) as i64,
        Bar => lhs | rhs,
        Caret => lhs ^ rhs,
        And => lhs & rhs,
        EqualEqual => (lhs == rhs) as i64,
        BangEqual => (lhs != rhs) as i64,
        Less => (lhs < rhs) as i64,
        LessEqual => (lhs <= rhs) as i64,
        Greater => (lhs > rhs) as i64,
        GreaterEqual => (lhs >= rhs) as i64,
        LessLess => {
            let shift = overflow_if_none(u32::try_from(rhs).ok(), location.clone())?;
            let result = overflow_if_none(lhs.checked_shl(shift), location.clone())?;
            // checked_shl only rejects shift >= 64; reject lost bits too
            if result >> shift != lhs {
                return Err(Error {
                    cause: ErrorCause::Overflow,
                    location,
                });
            }
            result
        }
        GreaterGreater => overflow_if_none(
            u32::try_from(rhs).ok().and_then(|s| lhs.checked_shr(s)),
            location,
        )?,
        Plus => overflow_if_none(lhs.checked_add(rhs), location)?,
        Minus => overflow_if_none(lhs.checked_sub(rhs), location)?,
        Asterisk => overflow_if_none(lhs.checked_mul(rhs), location)?,
        Slash | Percent => {
            if rhs == 0 {
                return Err(Error {
                    cause: ErrorCause::DivisionByZero,
                    location,
                });
            }
            let result = if op == Slash {
                lhs.checked_div(rhs)
            } else {
                lhs.checked_rem(rhs)
            };
            overflow_if_none(result, location)?
        }
        AsteriskAsterisk => {
            let exponent = overflow_if_none(u32::try_from(rhs).ok(), location.clone())?;
            overflow_if_none(lhs.checked_pow(exponent), location)?
        }
        _ => panic!("not a binary operator: {op:?}"),
    })
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Parser {
            source,
            tokens: Tokens::new(source).peekable(),
        }
    }

    fn end_location(&self) -> Range<usize> {
        self.source.len()..self.source.len()
    }

    /// Peeks the next token if it is an operator.
    fn peek_operator<E>(&mut self) -> Result<Option<(Operator, Range<usize>)>, Error<E>> {
        match self.tokens.peek() {
            Some(Ok(Token {
                value: TokenValue::Operator(op),
                location,
            })) => Ok(Some((*op, location.clone()))),
            Some(Ok(_)) | None => Ok(None),
            Some(Err(e)) => Err(e.clone().into()),
        }
    }

    /// Resolves a term to its numeric value.
    fn value_of<E: Env>(
        &self,
        term: Term<'s>,
        mode: Mode,
        env: &E,
    ) -> Result<i64, Error<E::Error>> {
        if mode == Mode::Skip {
            return Ok(0);
        }
        match term {
            Term::Value(value) => Ok(value),
            Term::Variable { name, location } => {
                let value = env.get_variable(name).map_err(|e| Error {
                    cause: ErrorCause::EnvError(e),
                    location: location.clone(),
                })?;
                match value {
                    None => Ok(0),
                    Some(text) if text.trim().is_empty() => Ok(0),
                    Some(text) => text.trim().parse().map_err(|_| Error {
                        cause: ErrorCause::InvalidVariableValue(text.to_string()),
                        location,
                    }),
                }
            }
        }
    }

    fn assign<E: Env>(
        &self,
        name: &str,
        value: i64,
        location: Range<usize>,
        mode: Mode,
        env: &mut E,
    ) -> Result<(), Error<E::Error>> {
        if mode == Mode::Eval {
            env.assign_variable(name, value.to_string())
                .map_err(|e| Error {
                    cause: ErrorCause::EnvError(e),
                    location,
                })?;
        }
        Ok(())
    }

    /// Applies a prefix or postfix `++`/`--` to a term.
    fn step_variable<E: Env>(
        &self,
        term: Term<'s>,
        op: Operator,
        op_location: Range<usize>,
        prefix: bool,
        mode: Mode,
        env: &mut E,
    ) -> Result<Term<'s>, Error<E::Error>> {
        let Term::Variable { name, .. } = &term else {
            return Err(Error {
                cause: ErrorCause::NotAVariable,
                location: op_location,
            });
        };
        let name = *name;
        let old = self.value_of(term, mode, env)?;
        let delta = if op == Operator::PlusPlus { 1 } else { -1 };
        let new = if mode == Mode::Eval {
            overflow_if_none(old.checked_add(delta), op_location.clone())?
        } else {
            0
        };
        self.assign(name, new, op_location, mode, env)?;
        Ok(Term::Value(if prefix { new } else { old }))
    }

    /// Parses a constant, variable, parenthesized expression, or
    /// unary-operated leaf.
    fn parse_leaf<E: Env>(&mut self, mode: Mode, env: &mut E) -> Result<Term<'s>, Error<E::Error>> {
        use Operator::*;
        let token = match self.tokens.next() {
            None => {
                return Err(Error {
                    cause: ErrorCause::InvalidSyntax,
                    location: self.end_location(),
                })
            }
            Some(result) => result?,
        };
        match token.value {
            TokenValue::Number(number) => Ok(Term::Value(number)),
            TokenValue::Variable(name) => Ok(Term::Variable {
                name,
                location: token.location,
            }),
            TokenValue::Operator(OpenParen) => {
                let inner = self.parse_binary(1, mode, env)?;
                let value = self.value_of(inner, mode, env)?;
                match self.tokens.next() {
                    Some(Ok(Token {
                        value: TokenValue::Operator(CloseParen),
                        ..
                    })) => Ok(Term::Value(value)),
                    Some(Err(e)) => Err(e.into()),
                    _ => Err(Error {
                        cause: ErrorCause::UnmatchedParenthesis,
                        location: token.location,
                    }),
                }
            }
            TokenValue::Operator(Plus) => {
                let operand = self.parse_leaf(mode, env)?;
                Ok(Term::Value(self.value_of(operand, mode, env)?))
            }
            TokenValue::Operator(Minus) => {
                let operand = self.parse_leaf(mode, env)?;
                let value = self.value_of(operand, mode, env)?;
                Ok(Term::Value(overflow_if_none(
                    value.checked_neg(),
                    token.location,
                )?))
            }
            TokenValue::Operator(Bang) => {
                let operand = self.parse_leaf(mode, env)?;
                Ok(Term::Value((self.value_of(operand, mode, env)? == 0) as i64))
            }
            TokenValue::Operator(Tilde) => {
                let operand = self.parse_leaf(mode, env)?;
                Ok(Term::Value(!self.value_of(operand, mode, env)?))
            }
            TokenValue::Operator(op @ (PlusPlus | MinusMinus)) => {
                let operand = self.parse_leaf(mode, env)?;
                self.step_variable(operand, op, token.location, true, mode, env)
            }
            TokenValue::Operator(_) => Err(Error {
                cause: ErrorCause::InvalidSyntax,
                location: token.location,
            }),
        }
    }

    /// Parses an expression, consuming binary operators of at least the
    /// given precedence.
    fn parse_binary<E: Env>(
        &mut self,
        min_precedence: u8,
        mode: Mode,
        env: &mut E,
    ) -> Result<Term<'s>, Error<E::Error>> {
        use Operator::*;
        let mut term = self.parse_leaf(mode, env)?;

        // Postfix increment and decrement bind tightest.
        while let Some((op @ (PlusPlus | MinusMinus), location)) = self.peek_operator()? {
            self.tokens.next();
            term = self.step_variable(term, op, location, false, mode, env)?;
        }

        loop {
            let Some((operator, location)) = self.peek_operator()? else {
                break;
            };
            let precedence = operator.precedence();
            if precedence == 0 || precedence < min_precedence {
                break;
            }
            self.tokens.next();

            match operator {
                Equal => {
                    let Term::Variable { name, .. } = term else {
                        return Err(Error {
                            cause: ErrorCause::NotAVariable,
                            location,
                        });
                    };
                    let rhs = self.parse_binary(precedence, mode, env)?;
                    let value = self.value_of(rhs, mode, env)?;
                    self.assign(name, value, location, mode, env)?;
                    term = Term::Value(value);
                }

                _ if operator.assignment_op().is_some() => {
                    let Term::Variable { name, location: name_location } = term else {
                        return Err(Error {
                            cause: ErrorCause::NotAVariable,
                            location,
                        });
                    };
                    let old = self.value_of(
                        Term::Variable {
                            name,
                            location: name_location,
                        },
                        mode,
                        env,
                    )?;
                    let rhs = self.parse_binary(precedence, mode, env)?;
                    let rhs = self.value_of(rhs, mode, env)?;
                    let value = if mode == Mode::Eval {
                        apply_binary(
                            operator.assignment_op().unwrap(),
                            old,
                            rhs,
                            location.clone(),
                        )?
                    } else {
                        0
                    };
                    self.assign(name, value, location, mode, env)?;
                    term = Term::Value(value);
                }

                BarBar | AndAnd => {
                    let lhs = self.value_of(term, mode, env)?;
                    let skip_rhs = match operator {
                        BarBar => lhs != 0,
                        _ => lhs == 0,
                    };
                    let rhs_mode = if skip_rhs { Mode::Skip } else { mode };
                    let rhs = self.parse_binary(precedence + 1, rhs_mode, env)?;
                    let rhs = self.value_of(rhs, rhs_mode, env)?;
                    term = Term::Value(match operator {
                        BarBar => (lhs != 0 || rhs != 0) as i64,
                        _ => (lhs != 0 && rhs != 0) as i64,
                    });
                }

                Question => {
                    let condition = self.value_of(term, mode, env)?;
                    let (then_mode, else_mode) = if mode == Mode::Skip {
                        (Mode::Skip, Mode::Skip)
                    } else if condition != 0 {
                        (Mode::Eval, Mode::Skip)
                    } else {
                        (Mode::Skip, Mode::Eval)
                    };
                    let then_term = self.parse_binary(1, then_mode, env)?;
                    let then_value = self.value_of(then_term, then_mode, env)?;
                    match self.tokens.next() {
                        Some(Ok(Token {
                            value: TokenValue::Operator(Colon),
                            ..
                        })) => {}
                        Some(Err(e)) => return Err(e.into()),
                        _ => {
                            return Err(Error {
                                cause: ErrorCause::IncompleteConditional,
                                location,
                            })
                        }
                    }
                    let else_term = self.parse_binary(precedence, else_mode, env)?;
                    let else_value = self.value_of(else_term, else_mode, env)?;
                    term = Term::Value(if condition != 0 { then_value } else { else_value });
                }

                _ => {
                    let lhs = self.value_of(term, mode, env)?;
                    let next_min = if operator.is_right_associative() {
                        precedence
                    } else {
                        precedence + 1
                    };
                    let rhs = self.parse_binary(next_min, mode, env)?;
                    let rhs = self.value_of(rhs, mode, env)?;
                    term = Term::Value(if mode == Mode::Eval {
                        apply_binary(operator, lhs, rhs, location)?
                    } else {
                        0
                    });
                }
            }
        }
        Ok(term)
    }
}

/// Evaluates a whole expression. See [`crate::eval`].
pub fn eval<E: Env>(source: &str, env: &mut E) -> Result<i64, Error<E::Error>> {
    let mut parser = Parser::new(source);
    let term = parser.parse_binary(1, Mode::Eval, env)?;
    let value = parser.value_of(term, Mode::Eval, env)?;
    match parser.tokens.next() {
        None => Ok(value),
        Some(Err(e)) => Err(e.into()),
        Some(Ok(token)) => Err(Error {
            cause: ErrorCause::InvalidSyntax,
            location: token.location,
        }),
    }
}
