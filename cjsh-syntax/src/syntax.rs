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

//! Shell command language abstract syntax trees
//!
//! The type representing a whole script is [`List`], a sequence of
//! [`Item`]s: possibly asynchronous [`AndOrList`]s of [`Pipeline`]s of
//! [`Command`]s. Words are sequences of [`WordUnit`]s which encode
//! quoting structurally; deferred expansions (parameters, command
//! substitutions, arithmetic) appear as [`TextUnit`]s inside words and
//! are resolved by the expansion phase just before a command runs.
//!
//! All types implement `Display`, producing single-line source text with
//! here-document contents omitted, and most implement `FromStr` through
//! the parser.

mod impl_display;

use crate::source::Location;
use std::cell::OnceCell;
use std::rc::Rc;

#[cfg(unix)]
use std::os::unix::io::RawFd;
#[cfg(not(unix))]
type RawFd = i32;

/// Special parameter identifier
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SpecialParam {
    /// `@` (all positional parameters, separate fields)
    At,
    /// `*` (all positional parameters, joined)
    Asterisk,
    /// `#` (number of positional parameters)
    Number,
    /// `?` (exit status of the last command)
    Question,
    /// `-` (currently active shell options)
    Hyphen,
    /// `$` (process ID of the shell)
    Dollar,
    /// `!` (process ID of the last asynchronous command)
    Exclamation,
    /// `0` (name of the shell or script)
    Zero,
}

impl SpecialParam {
    /// Returns the special parameter for the given character, if any.
    #[must_use]
    pub fn from_char(c: char) -> Option<SpecialParam> {
        use SpecialParam::*;
        match c {
            '@' => Some(At),
            '*' => Some(Asterisk),
            '#' => Some(Number),
            '?' => Some(Question),
            '-' => Some(Hyphen),
            '$' => Some(Dollar),
            '!' => Some(Exclamation),
            '0' => Some(Zero),
            _ => None,
        }
    }
}

/// Parameter name
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Param {
    /// Named variable
    Variable(String),
    /// Special single-character parameter
    Special(SpecialParam),
    /// Positional parameter (1-based; `0` is [`SpecialParam::Zero`])
    Positional(usize),
}

/// Operation selector of a `${name[:]op word}` switch
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SwitchAction {
    /// `-`: substitute the word if the condition holds
    Default,
    /// `=`: like `Default`, also assigning the word to the parameter
    Assign,
    /// `?`: fail with the word as the message if the condition holds
    Error,
    /// `+`: substitute the word if the condition does *not* hold
    Alternative,
}

/// Condition tested by a switch
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SwitchCondition {
    /// Without colon: the parameter is unset
    Unset,
    /// With colon: the parameter is unset or empty
    UnsetOrEmpty,
}

/// `${name:-word}`-style modifier
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Switch {
    pub action: SwitchAction,
    pub condition: SwitchCondition,
    pub word: Word,
}

/// Which end `${name#pattern}`-style trimming removes from
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TrimSide {
    /// `#`: remove a prefix
    Prefix,
    /// `%`: remove a suffix
    Suffix,
}

/// How much a trim removes
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TrimLength {
    /// Single `#`/`%`: shortest match
    Shortest,
    /// Double `##`/`%%`: longest match
    Longest,
}

/// `${name#pattern}`-style modifier
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Trim {
    pub side: TrimSide,
    pub length: TrimLength,
    pub pattern: Word,
}

/// `${name/pattern/replacement}`-style modifier
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subst {
    pub pattern: Word,
    pub replacement: Word,
    /// Whether the pattern was doubled (`//`), replacing all matches
    pub all: bool,
}

/// Modifier in a braced parameter expansion
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Modifier {
    /// No modifier: `${name}`
    None,
    /// `${#name}`
    Length,
    /// `${name[:]-word}` and friends
    Switch(Switch),
    /// `${name#pattern}` and friends
    Trim(Trim),
    /// `${name/pattern/replacement}`
    Subst(Subst),
    /// `${name:offset[:length]}`; both fields are arithmetic expressions
    Slice {
        offset: String,
        length: Option<String>,
    },
}

/// Braced parameter expansion
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BracedParam {
    pub param: Param,
    pub modifier: Modifier,
    /// Span of the whole `${…}`
    pub location: Location,
}

/// Element of a backquoted command substitution
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum BackquoteUnit {
    Literal(char),
    Backslashed(char),
}

/// Element of a [`Text`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextUnit {
    /// Ordinary character
    Literal(char),
    /// Character escaped with a backslash
    Backslashed(char),
    /// Parameter expansion without braces (`$name`)
    RawParam { param: Param, location: Location },
    /// Parameter expansion with braces (`${…}`)
    BracedParam(BracedParam),
    /// `$(…)`; the content is re-parsed when the substitution runs
    CommandSubst { content: Rc<str>, location: Location },
    /// `` `…` ``
    Backquote {
        content: Vec<BackquoteUnit>,
        location: Location,
    },
    /// `$((…))`
    Arith { content: Text, location: Location },
}

/// String fragment possibly containing expansions
///
/// A `Text` occurs inside double quotes and in here-document contents,
/// where single quotes and tildes have no special meaning.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Text(pub Vec<TextUnit>);

impl Text {
    /// Returns the text as a plain string if it has no expansions or
    /// escapes.
    #[must_use]
    pub fn to_string_if_literal(&self) -> Option<String> {
        self.0
            .iter()
            .map(|unit| match unit {
                TextUnit::Literal(c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

/// Direction of a process substitution
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProcSubstKind {
    /// `<(…)`: the command's output is readable at the substituted path
    In,
    /// `>(…)`: the substituted path feeds the command's input
    Out,
}

/// Element of a [`Word`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WordUnit {
    /// Unquoted unit
    Unquoted(TextUnit),
    /// `'…'`
    SingleQuote(String),
    /// `"…"`
    DoubleQuote(Text),
    /// `~` or `~name`, recognized at eligible positions only
    Tilde(String),
    /// `<(…)` / `>(…)`; the content is re-parsed when the command runs
    ProcSubst {
        kind: ProcSubstKind,
        content: Rc<str>,
        location: Location,
    },
}

/// Token subject to expansion
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Word {
    /// Units composing the word
    pub units: Vec<WordUnit>,
    /// Span of the word in source code
    pub location: Location,
}

impl Word {
    /// Returns the word as a plain string if it consists of unquoted
    /// literal characters only.
    #[must_use]
    pub fn to_string_if_literal(&self) -> Option<String> {
        self.units
            .iter()
            .map(|unit| match unit {
                WordUnit::Unquoted(TextUnit::Literal(c)) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Whether the word contains no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Converts a leading unquoted `~name` run into a
    /// [`Tilde`](WordUnit::Tilde) unit.
    ///
    /// The name extends to the first `/` or the end of the word and must
    /// be made of literal characters; any quoting cancels the
    /// recognition.
    pub fn parse_tilde_front(&mut self) {
        if self.units.first() != Some(&WordUnit::Unquoted(TextUnit::Literal('~'))) {
            return;
        }
        let mut name = String::new();
        let mut end = 1;
        for unit in &self.units[1..] {
            match unit {
                WordUnit::Unquoted(TextUnit::Literal('/')) => break,
                // A quoted or expanded unit makes the tilde literal.
                WordUnit::Unquoted(TextUnit::Literal(':')) => break,
                WordUnit::Unquoted(TextUnit::Literal(c)) => {
                    name.push(*c);
                    end += 1;
                }
                _ => return,
            }
        }
        self.units.splice(0..end, [WordUnit::Tilde(name)]);
    }

    /// Converts `~name` runs after every unquoted `:` (and at the front)
    /// into [`Tilde`](WordUnit::Tilde) units, as POSIX requires for
    /// assignment values.
    pub fn parse_tilde_everywhere(&mut self) {
        self.parse_tilde_front();
        let mut i = 0;
        while i < self.units.len() {
            if self.units[i] != WordUnit::Unquoted(TextUnit::Literal(':')) {
                i += 1;
                continue;
            }
            let start = i + 1;
            if self.units.get(start) != Some(&WordUnit::Unquoted(TextUnit::Literal('~'))) {
                i += 1;
                continue;
            }
            let mut name = String::new();
            let mut end = start + 1;
            let mut cancelled = false;
            for unit in &self.units[start + 1..] {
                match unit {
                    WordUnit::Unquoted(TextUnit::Literal('/' | ':')) => break,
                    WordUnit::Unquoted(TextUnit::Literal(c)) => {
                        name.push(*c);
                        end += 1;
                    }
                    _ => {
                        cancelled = true;
                        break;
                    }
                }
            }
            if cancelled {
                i = end + 1;
                continue;
            }
            self.units.splice(start..end, [WordUnit::Tilde(name)]);
            i = start + 1;
        }
    }
}

/// Variable assignment prefixing a simple command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assign {
    /// Variable name
    pub name: String,
    /// Assigned value
    pub value: Word,
    /// Span of the whole `name=value`
    pub location: Location,
}

/// File descriptor number
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Fd(pub RawFd);

impl Fd {
    /// Standard input
    pub const STDIN: Fd = Fd(0);
    /// Standard output
    pub const STDOUT: Fd = Fd(1);
    /// Standard error
    pub const STDERR: Fd = Fd(2);
}

impl From<RawFd> for Fd {
    fn from(fd: RawFd) -> Fd {
        Fd(fd)
    }
}

/// Redirection operator other than here-documents
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RedirOp {
    /// `<`
    FileIn,
    /// `>`
    FileOut,
    /// `>>`
    FileAppend,
    /// `<>`
    FileInOut,
    /// `>|`
    FileClobber,
    /// `<&`
    FdIn,
    /// `>&`
    FdOut,
    /// `<<<`
    HereString,
    /// `&>`: redirect both stdout and stderr
    OutErr,
}

impl RedirOp {
    /// File descriptor the operator redirects when none is specified.
    #[must_use]
    pub fn default_fd(self) -> Fd {
        use RedirOp::*;
        match self {
            FileIn | FileInOut | FdIn | HereString => Fd::STDIN,
            FileOut | FileAppend | FileClobber | FdOut | OutErr => Fd::STDOUT,
        }
    }
}

/// Here-document
///
/// The content cell is filled when the remainder of the line containing
/// the operator has been parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HereDoc {
    /// Delimiter word following the operator
    pub delimiter: Word,
    /// Whether the operator was `<<-`, stripping leading tabs
    pub remove_tabs: bool,
    /// Content lines up to (not including) the delimiter
    pub content: OnceCell<Text>,
}

/// Redirection target
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RedirBody {
    /// Redirection taking a word operand
    Normal { operator: RedirOp, operand: Word },
    /// Here-document
    HereDoc(Rc<HereDoc>),
}

/// Redirection
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Redir {
    /// Explicit file descriptor prefix, if any
    pub fd: Option<Fd>,
    /// Operator and target
    pub body: RedirBody,
    /// Span of the operator
    pub location: Location,
}

impl Redir {
    /// File descriptor this redirection affects.
    #[must_use]
    pub fn fd_or_default(&self) -> Fd {
        self.fd.unwrap_or_else(|| match &self.body {
            RedirBody::Normal { operator, .. } => operator.default_fd(),
            RedirBody::HereDoc(_) => Fd::STDIN,
        })
    }
}

/// Command consisting of assignments, words, and redirections
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SimpleCommand {
    pub assigns: Vec<Assign>,
    pub words: Vec<Word>,
    pub redirs: Vec<Redir>,
}

impl SimpleCommand {
    /// Whether the command has any word.
    #[must_use]
    pub fn is_empty_command(&self) -> bool {
        self.words.is_empty()
    }
}

/// Condition-body pair of an `if`/`elif` branch
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElifThen {
    pub condition: List,
    pub body: List,
}

/// Terminator of a `case` item
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CaseContinuation {
    /// `;;`: stop after the body
    #[default]
    Break,
    /// `;&`: also run the next item's body, unconditionally
    FallThrough,
    /// `;;&`: keep testing the remaining patterns
    Continue,
}

/// Branch of a `case` command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseItem {
    /// Patterns matched against the subject, separated by `|` in source
    pub patterns: Vec<Word>,
    /// Commands run when a pattern matches
    pub body: List,
    /// Terminator controlling fall-through
    pub continuation: CaseContinuation,
}

/// Unary operator of the conditional command
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CondUnaryOp {
    /// `-e`: exists
    Exists,
    /// `-f`: regular file
    IsFile,
    /// `-d`: directory
    IsDir,
    /// `-r`: readable
    Readable,
    /// `-w`: writable
    Writable,
    /// `-x`: executable
    Executable,
    /// `-s`: size greater than zero
    NonEmptyFile,
    /// `-L` / `-h`: symbolic link
    IsSymlink,
    /// `-p`: FIFO
    IsFifo,
    /// `-b`: block device
    IsBlock,
    /// `-c`: character device
    IsChar,
    /// `-S`: socket
    IsSocket,
    /// `-O`: owned by the effective user
    OwnedByEuid,
    /// `-G`: owned by the effective group
    OwnedByEgid,
    /// `-N`: modified since last read
    ModifiedSinceRead,
    /// `-t`: file descriptor refers to a terminal
    IsTerminalFd,
    /// `-z`: string is empty
    IsEmptyString,
    /// `-n`: string is non-empty
    IsNonEmptyString,
}

impl CondUnaryOp {
    /// Parses a `-x`-style operator.
    #[must_use]
    pub fn parse(s: &str) -> Option<CondUnaryOp> {
        use CondUnaryOp::*;
        match s {
            "-e" | "-a" => Some(Exists),
            "-f" => Some(IsFile),
            "-d" => Some(IsDir),
            "-r" => Some(Readable),
            "-w" => Some(Writable),
            "-x" => Some(Executable),
            "-s" => Some(NonEmptyFile),
            "-L" | "-h" => Some(IsSymlink),
            "-p" => Some(IsFifo),
            "-b" => Some(IsBlock),
            "-c" => Some(IsChar),
            "-S" => Some(IsSocket),
            "-O" => Some(OwnedByEuid),
            "-G" => Some(OwnedByEgid),
            "-N" => Some(ModifiedSinceRead),
            "-t" => Some(IsTerminalFd),
            "-z" => Some(IsEmptyString),
            "-n" => Some(IsNonEmptyString),
            _ => None,
        }
    }

    /// Source spelling of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        use CondUnaryOp::*;
        match self {
            Exists => "-e",
            IsFile => "-f",
            IsDir => "-d",
            Readable => "-r",
            Writable => "-w",
            Executable => "-x",
            NonEmptyFile => "-s",
            IsSymlink => "-L",
            IsFifo => "-p",
            IsBlock => "-b",
            IsChar => "-c",
            IsSocket => "-S",
            OwnedByEuid => "-O",
            OwnedByEgid => "-G",
            ModifiedSinceRead => "-N",
            IsTerminalFd => "-t",
            IsEmptyString => "-z",
            IsNonEmptyString => "-n",
        }
    }
}

/// Binary operator of the conditional command
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CondBinaryOp {
    /// `=` / `==`: pattern match
    Match,
    /// `!=`: negated pattern match
    NoMatch,
    /// `=~`: extended regular expression match
    RegexMatch,
    /// `<`: lexicographically before
    StrBefore,
    /// `>`: lexicographically after
    StrAfter,
    /// `-eq`
    IntEq,
    /// `-ne`
    IntNe,
    /// `-lt`
    IntLt,
    /// `-le`
    IntLe,
    /// `-gt`
    IntGt,
    /// `-ge`
    IntGe,
    /// `-nt`: newer than
    NewerThan,
    /// `-ot`: older than
    OlderThan,
    /// `-ef`: same file
    SameFile,
}

impl CondBinaryOp {
    /// Parses a binary operator spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<CondBinaryOp> {
        use CondBinaryOp::*;
        match s {
            "=" | "==" => Some(Match),
            "!=" => Some(NoMatch),
            "=~" => Some(RegexMatch),
            "<" => Some(StrBefore),
            ">" => Some(StrAfter),
            "-eq" => Some(IntEq),
            "-ne" => Some(IntNe),
            "-lt" => Some(IntLt),
            "-le" => Some(IntLe),
            "-gt" => Some(IntGt),
            "-ge" => Some(IntGe),
            "-nt" => Some(NewerThan),
            "-ot" => Some(OlderThan),
            "-ef" => Some(SameFile),
            _ => None,
        }
    }

    /// Source spelling of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        use CondBinaryOp::*;
        match self {
            Match => "==",
            NoMatch => "!=",
            RegexMatch => "=~",
            StrBefore => "<",
            StrAfter => ">",
            IntEq => "-eq",
            IntNe => "-ne",
            IntLt => "-lt",
            IntLe => "-le",
            IntGt => "-gt",
            IntGe => "-ge",
            NewerThan => "-nt",
            OlderThan => "-ot",
            SameFile => "-ef",
        }
    }
}

/// Expression of the `[[ … ]]` conditional command
///
/// Operands are words expanded without field splitting or pathname
/// expansion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CondExpr {
    /// `! expr`
    Not(Box<CondExpr>),
    /// `expr && expr`
    And(Box<CondExpr>, Box<CondExpr>),
    /// `expr || expr`
    Or(Box<CondExpr>, Box<CondExpr>),
    /// `-x word`
    Unary { op: CondUnaryOp, operand: Word },
    /// `word op word`
    Binary {
        op: CondBinaryOp,
        lhs: Word,
        rhs: Word,
    },
    /// Bare word: true if it expands to a non-empty string
    Word(Word),
}

/// C-style `for (( init; condition; step ))` control
///
/// The three parts are arithmetic expression texts; an empty condition
/// counts as true.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArithForControl {
    pub init: Text,
    pub condition: Text,
    pub step: Text,
}

/// Compound command
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompoundCommand {
    /// `{ … }`, run in the current shell environment
    Grouping(List),
    /// `( … )`, run in a forked subshell
    Subshell(List),
    /// `for name [in words…]; do …; done`
    For {
        name: Word,
        /// `None` means the default `in "$@"`
        values: Option<Vec<Word>>,
        body: List,
    },
    /// `select name [in words…]; do …; done`
    Select {
        name: Word,
        /// `None` means the default `in "$@"`
        values: Option<Vec<Word>>,
        body: List,
    },
    /// `for (( init; cond; step )); do …; done`
    ArithFor {
        control: ArithForControl,
        body: List,
    },
    /// `while cond; do …; done`
    While { condition: List, body: List },
    /// `until cond; do …; done`
    Until { condition: List, body: List },
    /// `if …; then …; [elif …;] [else …;] fi`
    If {
        branches: Vec<ElifThen>,
        r#else: Option<List>,
    },
    /// `case subject in items… esac`
    Case { subject: Word, items: Vec<CaseItem> },
    /// `[[ expression ]]`
    DoubleBracket(CondExpr),
    /// `(( expression ))`
    Arith { expr: Text },
}

/// Compound command with attached redirections
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FullCompoundCommand {
    pub command: CompoundCommand,
    pub redirs: Vec<Redir>,
}

/// Function definition command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionDefinition {
    /// Function name
    pub name: Word,
    /// Function body, shared with the function table after execution
    pub body: Rc<FullCompoundCommand>,
    /// Span of the definition
    pub location: Location,
}

/// Element of a pipeline
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Simple(SimpleCommand),
    Compound(FullCompoundCommand),
    Function(FunctionDefinition),
}

/// Commands connected by `|`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pipeline {
    /// Commands, in input order; never empty
    pub commands: Vec<Rc<Command>>,
    /// Whether the pipeline was prefixed by `!`
    pub negation: bool,
}

/// `&&` or `||`
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AndOr {
    /// `&&`
    AndThen,
    /// `||`
    OrElse,
}

/// Pipelines connected by `&&` and `||`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AndOrList {
    pub first: Pipeline,
    pub rest: Vec<(AndOr, Pipeline)>,
}

/// And-or list with an execution mode
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// Content of the item
    pub and_or: Rc<AndOrList>,
    /// Whether the item ends with `&`
    pub is_async: bool,
    /// Span of the item, used as the job name for asynchronous items
    pub location: Location,
}

/// Whole script or line: sequence of items
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct List(pub Vec<Item>);
