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

//! The trap table
//!
//! A trap binds a signal or a pseudo-event (`EXIT`, `ERR`, `DEBUG`,
//! `RETURN`) to an action. Command actions are stored as source text
//! and re-parsed when the trap fires, as POSIX requires.

use crate::signal;
use nix::sys::signal::Signal;
use std::collections::HashMap;
use std::rc::Rc;

/// What a trap is bound to
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Condition {
    /// A real signal
    Signal(Signal),
    /// Shell exit
    Exit,
    /// A command returning a non-zero status
    Err,
    /// Before every simple command
    Debug,
    /// Return from a function or sourced script
    Return,
}

impl Condition {
    /// Parses a condition name or signal number.
    ///
    /// Signal names are accepted with or without the `SIG` prefix, in
    /// any case; `0` is `EXIT`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Condition> {
        match s.to_ascii_uppercase().as_str() {
            "EXIT" | "0" => return Some(Condition::Exit),
            "ERR" => return Some(Condition::Err),
            "DEBUG" => return Some(Condition::Debug),
            "RETURN" => return Some(Condition::Return),
            _ => {}
        }
        signal::parse_signal(s).map(Condition::Signal)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Signal(signal) => f.write_str(&signal.as_str()[3..]),
            Condition::Exit => f.write_str("EXIT"),
            Condition::Err => f.write_str("ERR"),
            Condition::Debug => f.write_str("DEBUG"),
            Condition::Return => f.write_str("RETURN"),
        }
    }
}

/// Action bound to a condition
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// Default disposition
    Default,
    /// Ignore the signal (`trap '' SIG`)
    Ignore,
    /// Run the given command text
    Command(Rc<str>),
}

/// The trap table
#[derive(Clone, Debug, Default)]
pub struct TrapSet {
    actions: HashMap<Condition, Action>,
}

impl TrapSet {
    /// Action currently bound to a condition.
    #[must_use]
    pub fn get(&self, condition: Condition) -> &Action {
        self.actions.get(&condition).unwrap_or(&Action::Default)
    }

    /// Command text bound to a condition, if any.
    #[must_use]
    pub fn command(&self, condition: Condition) -> Option<Rc<str>> {
        match self.get(condition) {
            Action::Command(text) => Some(Rc::clone(text)),
            _ => None,
        }
    }

    /// Binds an action to a condition.
    pub fn set(&mut self, condition: Condition, action: Action) {
        if action == Action::Default {
            self.actions.remove(&condition);
        } else {
            self.actions.insert(condition, action);
        }
    }

    /// Whether a signal is explicitly ignored.
    #[must_use]
    pub fn is_ignored(&self, signal: Signal) -> bool {
        *self.get(Condition::Signal(signal)) == Action::Ignore
    }

    /// Iterates over non-default entries, for `trap` output.
    pub fn iter(&self) -> impl Iterator<Item = (Condition, &Action)> {
        let mut entries: Vec<(Condition, &Action)> =
            self.actions.iter().map(|(c, a)| (*c, a)).collect();
        entries.sort_by_key(|(c, _)| format!("{c}"));
        entries.into_iter()
    }

    /// Resets command traps on entering a subshell.
    ///
    /// POSIX: traps set to a command are reset to the default in a
    /// subshell; ignored signals stay ignored.
    pub fn enter_subshell(&mut self) {
        self.actions
            .retain(|_, action| *action == Action::Ignore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_conditions() {
        assert_eq!(Condition::parse("EXIT"), Some(Condition::Exit));
        assert_eq!(Condition::parse("0"), Some(Condition::Exit));
        assert_eq!(Condition::parse("err"), Some(Condition::Err));
        assert_eq!(Condition::parse("DEBUG"), Some(Condition::Debug));
        assert_eq!(Condition::parse("RETURN"), Some(Condition::Return));
        assert_eq!(
            Condition::parse("INT"),
            Some(Condition::Signal(Signal::SIGINT))
        );
        assert_eq!(
            Condition::parse("SIGTERM"),
            Some(Condition::Signal(Signal::SIGTERM))
        );
        assert_eq!(
            Condition::parse("15"),
            Some(Condition::Signal(Signal::SIGTERM))
        );
        assert_eq!(Condition::parse("NOPE"), None);
    }

    #[test]
    fn set_get_and_reset() {
        let mut traps = TrapSet::default();
        assert_eq!(*traps.get(Condition::Exit), Action::Default);
        traps.set(Condition::Exit, Action::Command("echo bye".into()));
        assert_eq!(traps.command(Condition::Exit).as_deref(), Some("echo bye"));
        traps.set(Condition::Exit, Action::Default);
        assert_eq!(*traps.get(Condition::Exit), Action::Default);
    }

    #[test]
    fn subshell_keeps_only_ignores() {
        let mut traps = TrapSet::default();
        traps.set(Condition::Signal(Signal::SIGINT), Action::Ignore);
        traps.set(
            Condition::Signal(Signal::SIGTERM),
            Action::Command("cleanup".into()),
        );
        traps.set(Condition::Exit, Action::Command("bye".into()));
        traps.enter_subshell();
        assert!(traps.is_ignored(Signal::SIGINT));
        assert_eq!(
            *traps.get(Condition::Signal(Signal::SIGTERM)),
            Action::Default
        );
        assert_eq!(*traps.get(Condition::Exit), Action::Default);
    }

    #[test]
    fn display_names() {
        assert_eq!(Condition::Signal(Signal::SIGHUP).to_string(), "HUP");
        assert_eq!(Condition::Exit.to_string(), "EXIT");
    }
}
