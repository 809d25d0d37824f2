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

//! `Display` implementations for the AST
//!
//! The output is single-line source text. Here-document contents are
//! omitted; only the operator and delimiter are printed.

use super::*;
use itertools::Itertools;
use std::fmt;
use std::fmt::Display;
use std::fmt::Write as _;

impl Display for SpecialParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SpecialParam::*;
        let c = match self {
            At => '@',
            Asterisk => '*',
            Number => '#',
            Question => '?',
            Hyphen => '-',
            Dollar => '$',
            Exclamation => '!',
            Zero => '0',
        };
        f.write_char(c)
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Variable(name) => f.write_str(name),
            Param::Special(special) => special.fmt(f),
            Param::Positional(index) => index.fmt(f),
        }
    }
}

impl Display for SwitchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SwitchAction::*;
        let c = match self {
            Default => '-',
            Assign => '=',
            Error => '?',
            Alternative => '+',
        };
        f.write_char(c)
    }
}

impl Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.condition == SwitchCondition::UnsetOrEmpty {
            f.write_char(':')?;
        }
        write!(f, "{}{}", self.action, self.word)
    }
}

impl Display for Trim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self.side {
            TrimSide::Prefix => '#',
            TrimSide::Suffix => '%',
        };
        f.write_char(c)?;
        if self.length == TrimLength::Longest {
            f.write_char(c)?;
        }
        self.pattern.fmt(f)
    }
}

impl Display for BracedParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("${")?;
        match &self.modifier {
            Modifier::None => write!(f, "{}", self.param)?,
            Modifier::Length => write!(f, "#{}", self.param)?,
            Modifier::Switch(switch) => write!(f, "{}{}", self.param, switch)?,
            Modifier::Trim(trim) => write!(f, "{}{}", self.param, trim)?,
            Modifier::Subst(subst) => {
                write!(f, "{}/", self.param)?;
                if subst.all {
                    f.write_char('/')?;
                }
                write!(f, "{}/{}", subst.pattern, subst.replacement)?;
            }
            Modifier::Slice { offset, length } => {
                write!(f, "{}:{}", self.param, offset)?;
                if let Some(length) = length {
                    write!(f, ":{length}")?;
                }
            }
        }
        f.write_char('}')
    }
}

impl Display for BackquoteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackquoteUnit::Literal(c) => f.write_char(*c),
            BackquoteUnit::Backslashed(c) => write!(f, "\\{c}"),
        }
    }
}

impl Display for TextUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextUnit::Literal(c) => f.write_char(*c),
            TextUnit::Backslashed(c) => write!(f, "\\{c}"),
            TextUnit::RawParam { param, .. } => write!(f, "${param}"),
            TextUnit::BracedParam(param) => param.fmt(f),
            TextUnit::CommandSubst { content, .. } => write!(f, "$({content})"),
            TextUnit::Backquote { content, .. } => {
                f.write_char('`')?;
                content.iter().try_for_each(|unit| unit.fmt(f))?;
                f.write_char('`')
            }
            TextUnit::Arith { content, .. } => write!(f, "$(({content}))"),
        }
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|unit| unit.fmt(f))
    }
}

impl Display for WordUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordUnit::Unquoted(unit) => unit.fmt(f),
            WordUnit::SingleQuote(s) => write!(f, "'{s}'"),
            WordUnit::DoubleQuote(text) => write!(f, "\"{text}\""),
            WordUnit::Tilde(name) => write!(f, "~{name}"),
            WordUnit::ProcSubst { kind, content, .. } => {
                let c = match kind {
                    ProcSubstKind::In => '<',
                    ProcSubstKind::Out => '>',
                };
                write!(f, "{c}({content})")
            }
        }
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.units.iter().try_for_each(|unit| unit.fmt(f))
    }
}

impl Display for Assign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Display for RedirOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RedirOp::*;
        f.write_str(match self {
            FileIn => "<",
            FileOut => ">",
            FileAppend => ">>",
            FileInOut => "<>",
            FileClobber => ">|",
            FdIn => "<&",
            FdOut => ">&",
            HereString => "<<<",
            OutErr => "&>",
        })
    }
}

impl Display for Redir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(fd) = self.fd {
            fd.fmt(f)?;
        }
        match &self.body {
            RedirBody::Normal { operator, operand } => write!(f, "{operator}{operand}"),
            RedirBody::HereDoc(here_doc) => {
                let op = if here_doc.remove_tabs { "<<-" } else { "<<" };
                write!(f, "{op}{}", here_doc.delimiter)
            }
        }
    }
}

impl Display for SimpleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .assigns
            .iter()
            .map(ToString::to_string)
            .chain(self.words.iter().map(ToString::to_string))
            .chain(self.redirs.iter().map(ToString::to_string));
        f.write_str(&parts.format(" ").to_string())
    }
}

impl Display for CaseContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CaseContinuation::*;
        f.write_str(match self {
            Break => ";;",
            FallThrough => ";&",
            Continue => ";;&",
        })
    }
}

impl Display for CaseItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {}{}",
            self.patterns.iter().format(" | "),
            self.body,
            self.continuation,
        )
    }
}

impl Display for CondExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CondExpr::Not(expr) => write!(f, "! {expr}"),
            CondExpr::And(lhs, rhs) => write!(f, "{lhs} && {rhs}"),
            CondExpr::Or(lhs, rhs) => write!(f, "{lhs} || {rhs}"),
            CondExpr::Unary { op, operand } => write!(f, "{} {operand}", op.as_str()),
            CondExpr::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.as_str()),
            CondExpr::Word(word) => word.fmt(f),
        }
    }
}

impl Display for CompoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CompoundCommand::*;
        match self {
            Grouping(list) => write!(f, "{{ {list}; }}"),
            Subshell(list) => write!(f, "({list})"),
            For { name, values, body } | Select { name, values, body } => {
                let keyword = if matches!(self, For { .. }) {
                    "for"
                } else {
                    "select"
                };
                write!(f, "{keyword} {name}")?;
                if let Some(values) = values {
                    f.write_str(" in")?;
                    for value in values {
                        write!(f, " {value}")?;
                    }
                    f.write_char(';')?;
                }
                write!(f, " do {body}; done")
            }
            ArithFor { control, body } => write!(
                f,
                "for (({}; {}; {})); do {body}; done",
                control.init, control.condition, control.step,
            ),
            While { condition, body } => write!(f, "while {condition}; do {body}; done"),
            Until { condition, body } => write!(f, "until {condition}; do {body}; done"),
            If { branches, r#else } => {
                for (i, branch) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { " elif" };
                    write!(f, "{keyword} {}; then {};", branch.condition, branch.body)?;
                }
                if let Some(else_body) = r#else {
                    write!(f, " else {else_body};")?;
                }
                f.write_str(" fi")
            }
            Case { subject, items } => {
                write!(f, "case {subject} in")?;
                for item in items {
                    write!(f, " {item}")?;
                }
                f.write_str(" esac")
            }
            DoubleBracket(expr) => write!(f, "[[ {expr} ]]"),
            Arith { expr } => write!(f, "(({expr}))"),
        }
    }
}

impl Display for FullCompoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.command.fmt(f)?;
        self.redirs.iter().try_for_each(|redir| write!(f, " {redir}"))
    }
}

impl Display for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}() {}", self.name, self.body)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Simple(command) => command.fmt(f),
            Command::Compound(command) => command.fmt(f),
            Command::Function(definition) => definition.fmt(f),
        }
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negation {
            f.write_str("! ")?;
        }
        f.write_str(&self.commands.iter().format(" | ").to_string())
    }
}

impl Display for AndOr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AndOr::AndThen => "&&",
            AndOr::OrElse => "||",
        })
    }
}

impl Display for AndOrList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.first.fmt(f)?;
        self.rest
            .iter()
            .try_for_each(|(op, pipeline)| write!(f, " {op} {pipeline}"))
    }
}

impl Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            item.and_or.fmt(f)?;
            if item.is_async {
                f.write_char('&')?;
            } else if i + 1 < self.0.len() {
                f.write_char(';')?;
            }
        }
        Ok(())
    }
}
