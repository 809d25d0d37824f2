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

//! Parse errors

use crate::source::pretty::{Annotation, Category, Report, Severity};
use crate::source::Location;
use thiserror::Error;

/// Types of syntax errors
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{}", self.message())]
#[non_exhaustive]
pub enum SyntaxError {
    /// A single quotation lacks a closing `'`.
    UnclosedSingleQuote { opening_location: Location },
    /// A double quotation lacks a closing `"`.
    UnclosedDoubleQuote { opening_location: Location },
    /// A parameter expansion lacks a closing `}`.
    UnclosedParam { opening_location: Location },
    /// A parameter expansion lacks a name.
    EmptyParam,
    /// A parameter expansion has an invalid name.
    InvalidParam,
    /// A parameter expansion modifier has an invalid form.
    InvalidModifier,
    /// A `$(` lacks a closing `)`.
    UnclosedCommandSubstitution { opening_location: Location },
    /// A `` ` `` lacks a closing `` ` ``.
    UnclosedBackquote { opening_location: Location },
    /// A `$((` lacks a closing `))`.
    UnclosedArith { opening_location: Location },
    /// A `<(` or `>(` lacks a closing `)`.
    UnclosedProcSubst { opening_location: Location },

    /// A command begins with an inappropriate keyword or operator.
    InvalidCommandToken,
    /// A token remains where a command separator is required.
    MissingSeparator,
    /// The file descriptor prefixed to a redirection is out of range.
    FdOutOfRange,
    /// A redirection operator is missing its operand.
    MissingRedirOperand,
    /// A here-document operator is missing its delimiter token.
    MissingHereDocDelimiter,
    /// A here-document content is missing its delimiter line.
    UnclosedHereDocContent { redir_op_location: Location },
    /// A grouping contains no commands.
    EmptyGrouping,
    /// A subshell contains no commands.
    EmptySubshell,
    /// A compound-command clause contains no commands.
    EmptyClause { keyword: &'static str },
    /// The variable name is missing in a `for` loop.
    MissingForName,
    /// The variable name of a `for` loop is not a literal word.
    InvalidForName,
    /// The subject word is missing in a `case` command.
    MissingCaseSubject,
    /// A `case` item has no pattern before `)`.
    MissingPattern,
    /// A `case` pattern position holds a non-word token.
    InvalidPattern,
    /// A function definition is missing its body.
    MissingFunctionBody,
    /// A function body is not a compound command.
    InvalidFunctionBody,
    /// `!` is not followed by a command.
    MissingCommandAfterBang,
    /// `|` is not followed by a command.
    MissingCommandAfterBar,
    /// `&&` or `||` is not followed by a command.
    MissingCommandAfterAndOr,
    /// `!` appears twice in a row.
    DoubleNegation,
    /// A `[[ … ]]` expression holds an unexpected token.
    InvalidCondToken,
    /// A `[[` lacks its closing `]]` at the end of input.
    UnclosedCond { opening_location: Location },

    /// The input ended inside an open compound command.
    IncompleteCompound {
        expected: &'static str,
        opening_location: Location,
    },
    /// A compound command's closing keyword is missing where required.
    MissingKeyword {
        keyword: &'static str,
        opening_location: Location,
    },
}

impl SyntaxError {
    /// Stable diagnostic code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        use SyntaxError::*;
        match self {
            UnclosedSingleQuote { .. } => "LEX001",
            UnclosedDoubleQuote { .. } => "LEX002",
            UnclosedParam { .. } => "LEX003",
            EmptyParam => "LEX004",
            InvalidParam => "LEX005",
            InvalidModifier => "LEX006",
            UnclosedCommandSubstitution { .. } => "LEX007",
            UnclosedBackquote { .. } => "LEX008",
            UnclosedArith { .. } => "LEX009",
            UnclosedProcSubst { .. } => "LEX010",
            InvalidCommandToken => "SYN001",
            MissingSeparator => "SYN002",
            FdOutOfRange => "SYN003",
            MissingRedirOperand => "SYN004",
            MissingHereDocDelimiter => "SYN005",
            UnclosedHereDocContent { .. } => "SYN006",
            EmptyGrouping => "SYN007",
            EmptySubshell => "SYN008",
            EmptyClause { .. } => "SYN009",
            MissingForName => "SYN010",
            InvalidForName => "SYN011",
            MissingCaseSubject => "SYN012",
            MissingPattern => "SYN013",
            InvalidPattern => "SYN014",
            MissingFunctionBody => "SYN015",
            InvalidFunctionBody => "SYN016",
            MissingCommandAfterBang => "SYN017",
            MissingCommandAfterBar => "SYN018",
            MissingCommandAfterAndOr => "SYN019",
            DoubleNegation => "SYN020",
            InvalidCondToken => "SYN021",
            UnclosedCond { .. } => "SYN022",
            IncompleteCompound { .. } => "SYN023",
            MissingKeyword { .. } => "SYN024",
        }
    }

    /// Whether this error comes from the lexical stage.
    #[must_use]
    pub fn is_lexical(&self) -> bool {
        self.code().starts_with("LEX")
    }

    /// Whether the error means the input ended inside an open construct.
    ///
    /// An interactive reader should request a continuation line instead
    /// of reporting the error.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        use SyntaxError::*;
        matches!(
            self,
            UnclosedSingleQuote { .. }
                | UnclosedDoubleQuote { .. }
                | UnclosedParam { .. }
                | UnclosedCommandSubstitution { .. }
                | UnclosedBackquote { .. }
                | UnclosedArith { .. }
                | UnclosedProcSubst { .. }
                | UnclosedHereDocContent { .. }
                | UnclosedCond { .. }
                | IncompleteCompound { .. }
        )
    }

    /// Human-readable description of the error.
    #[must_use]
    pub fn message(&self) -> String {
        use SyntaxError::*;
        match self {
            UnclosedSingleQuote { .. } => "unterminated quoted string".to_string(),
            UnclosedDoubleQuote { .. } => "unterminated quoted string".to_string(),
            UnclosedParam { .. } => "unterminated ${...}".to_string(),
            EmptyParam => "parameter name is missing".to_string(),
            InvalidParam => "invalid parameter name".to_string(),
            InvalidModifier => "invalid parameter expansion modifier".to_string(),
            UnclosedCommandSubstitution { .. } => "unterminated $(...)".to_string(),
            UnclosedBackquote { .. } => "unterminated backquoted substitution".to_string(),
            UnclosedArith { .. } => "unterminated $((...))".to_string(),
            UnclosedProcSubst { .. } => "unterminated process substitution".to_string(),
            InvalidCommandToken => "unexpected token".to_string(),
            MissingSeparator => "unexpected token after the command".to_string(),
            FdOutOfRange => "file descriptor number too large".to_string(),
            MissingRedirOperand => "redirection target is missing".to_string(),
            MissingHereDocDelimiter => "here-document delimiter is missing".to_string(),
            UnclosedHereDocContent { .. } => "here-document is missing its delimiter".to_string(),
            EmptyGrouping => "commands are missing between `{` and `}`".to_string(),
            EmptySubshell => "commands are missing between `(` and `)`".to_string(),
            EmptyClause { keyword } => format!("commands are missing after `{keyword}`"),
            MissingForName => "variable name is missing in the for loop".to_string(),
            InvalidForName => "invalid variable name in the for loop".to_string(),
            MissingCaseSubject => "subject word is missing after `case`".to_string(),
            MissingPattern => "pattern is missing in the case item".to_string(),
            InvalidPattern => "invalid pattern in the case item".to_string(),
            MissingFunctionBody => "function body is missing".to_string(),
            InvalidFunctionBody => "function body must be a compound command".to_string(),
            MissingCommandAfterBang => "command is missing after `!`".to_string(),
            MissingCommandAfterBar => "command is missing after `|`".to_string(),
            MissingCommandAfterAndOr => "command is missing after the operator".to_string(),
            DoubleNegation => "`!` cannot be repeated".to_string(),
            InvalidCondToken => "unexpected token in the conditional expression".to_string(),
            UnclosedCond { .. } => "`[[` is missing its closing `]]`".to_string(),
            IncompleteCompound { expected, .. } => {
                format!("input ended before `{expected}`")
            }
            MissingKeyword { keyword, .. } => format!("`{keyword}` is missing"),
        }
    }

    /// Suggestion text for the classic mistakes, if any.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        use SyntaxError::*;
        match self {
            MissingKeyword { keyword, .. } => Some(format!("did you mean `{keyword}`?")),
            IncompleteCompound { expected, .. } => {
                Some(format!("add `{expected}` to close the command"))
            }
            UnclosedCond { .. } => Some("did you mean `]]`?".to_string()),
            _ => None,
        }
    }

    /// Location of the matching opening construct, if the error has one.
    #[must_use]
    pub fn opening_location(&self) -> Option<&Location> {
        use SyntaxError::*;
        match self {
            UnclosedSingleQuote { opening_location }
            | UnclosedDoubleQuote { opening_location }
            | UnclosedParam { opening_location }
            | UnclosedCommandSubstitution { opening_location }
            | UnclosedBackquote { opening_location }
            | UnclosedArith { opening_location }
            | UnclosedProcSubst { opening_location }
            | UnclosedCond { opening_location }
            | IncompleteCompound {
                opening_location, ..
            }
            | MissingKeyword {
                opening_location, ..
            } => Some(opening_location),
            UnclosedHereDocContent { redir_op_location } => Some(redir_op_location),
            _ => None,
        }
    }
}

/// Parse error: a cause and the location where it happened
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{cause}")]
pub struct Error {
    pub cause: SyntaxError,
    pub location: Location,
}

impl Error {
    /// See [`SyntaxError::is_incomplete`].
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.cause.is_incomplete()
    }

    /// Converts this error to a renderable diagnostic.
    #[must_use]
    pub fn to_report(&self) -> Report {
        let category = if self.cause.is_lexical() {
            Category::Lexical
        } else {
            Category::Syntax
        };
        let related = self
            .cause
            .opening_location()
            .map(|location| Annotation {
                label: "construct started here".to_string(),
                location: location.clone(),
            })
            .into_iter()
            .collect();
        Report {
            severity: Severity::Error,
            category,
            code: self.cause.code(),
            title: self.cause.message(),
            annotation: Annotation {
                label: self.cause.message(),
                location: self.location.clone(),
            },
            related,
            suggestion: self.cause.suggestion(),
        }
    }
}

/// Result of parser functions
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_errors_are_flagged() {
        let location = Location::dummy("'abc");
        let error = Error {
            cause: SyntaxError::UnclosedSingleQuote {
                opening_location: location.clone(),
            },
            location,
        };
        assert!(error.is_incomplete());

        let location = Location::dummy(")");
        let error = Error {
            cause: SyntaxError::MissingSeparator,
            location,
        };
        assert!(!error.is_incomplete());
    }

    #[test]
    fn missing_keyword_suggests_the_keyword() {
        let opening_location = Location::dummy("while");
        let cause = SyntaxError::MissingKeyword {
            keyword: "done",
            opening_location,
        };
        assert_eq!(cause.suggestion().as_deref(), Some("did you mean `done`?"));
    }

    #[test]
    fn codes_distinguish_lexical_and_syntactic() {
        let lexical = SyntaxError::EmptyParam;
        assert!(lexical.is_lexical());
        let syntactic = SyntaxError::MissingSeparator;
        assert!(!syntactic.is_lexical());
    }
}
