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

//! Shell options
//!
//! Options are spelled positively here (`Clobber`, `Glob`, `Unset`), so
//! the classic negative names map to turning an option off: `set -C`
//! (noclobber) clears `Clobber`, `set -u` (nounset) clears `Unset`, and
//! `set -f` (noglob) clears `Glob`.

use enumset::{EnumSet, EnumSetType};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// State of an option
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum State {
    #[default]
    On,
    Off,
}

impl std::ops::Not for State {
    type Output = State;
    fn not(self) -> State {
        match self {
            State::On => State::Off,
            State::Off => State::On,
        }
    }
}

/// Shell option
#[derive(EnumSetType, Debug, Hash)]
pub enum Option {
    /// Exports every assigned variable (`-a`)
    AllExport,
    /// Allows `>` to overwrite existing files; off is `noclobber` (`-C`)
    Clobber,
    /// The shell was invoked with `-c command`
    CmdLine,
    /// Aborts on uncaught non-zero statuses (`-e`)
    ErrExit,
    /// Executes commands; off (`-n`) only parses
    Exec,
    /// Performs pathname expansion; off is `noglob` (`-f`)
    Glob,
    /// Makes `**` match across directories
    GlobStar,
    /// Sends SIGHUP to jobs when the shell exits
    HupOnExit,
    /// Enables interactive behavior (`-i`)
    Interactive,
    /// The shell is a login shell (`-l`)
    Login,
    /// Enables job control (`-m`)
    Monitor,
    /// Reports finished background jobs immediately (`-b`)
    Notify,
    /// Removes globs that match nothing instead of keeping them literal
    NullGlob,
    /// Makes a pipeline's status the rightmost non-zero one
    PipeFail,
    /// Reads commands from standard input (`-s`)
    Stdin,
    /// Expands unset variables to empty; off is `nounset` (`-u`)
    Unset,
    /// Echoes input lines as they are read (`-v`)
    Verbose,
    /// Prints expanded commands before running them (`-x`)
    XTrace,
}

pub use self::Option::*;

impl Option {
    /// Canonical long name, as used with `set -o`.
    #[must_use]
    pub fn long_name(self) -> &'static str {
        match self {
            AllExport => "allexport",
            Clobber => "clobber",
            CmdLine => "cmdline",
            ErrExit => "errexit",
            Exec => "exec",
            Glob => "glob",
            GlobStar => "globstar",
            HupOnExit => "huponexit",
            Interactive => "interactive",
            Login => "login",
            Monitor => "monitor",
            Notify => "notify",
            NullGlob => "nullglob",
            PipeFail => "pipefail",
            Stdin => "stdin",
            Unset => "unset",
            Verbose => "verbose",
            XTrace => "xtrace",
        }
    }

    /// Whether the `set` built-in may change this option.
    #[must_use]
    pub fn is_modifiable(self) -> bool {
        !matches!(self, CmdLine | Interactive | Login | Stdin)
    }

    /// Short option letter and the state it selects, if the option has
    /// a single-letter spelling.
    #[must_use]
    pub fn short_spelling(self) -> std::option::Option<(char, State)> {
        match self {
            AllExport => Some(('a', State::On)),
            Clobber => Some(('C', State::Off)),
            CmdLine => Some(('c', State::On)),
            ErrExit => Some(('e', State::On)),
            Exec => Some(('n', State::Off)),
            Glob => Some(('f', State::Off)),
            Interactive => Some(('i', State::On)),
            Login => Some(('l', State::On)),
            Monitor => Some(('m', State::On)),
            Notify => Some(('b', State::On)),
            Stdin => Some(('s', State::On)),
            Unset => Some(('u', State::Off)),
            Verbose => Some(('v', State::On)),
            XTrace => Some(('x', State::On)),
            GlobStar | HupOnExit | NullGlob | PipeFail => None,
        }
    }

    /// Resolves a short option letter to the option and the state that
    /// `-letter` selects (`+letter` selects the opposite).
    #[must_use]
    pub fn from_short(letter: char) -> std::option::Option<(Option, State)> {
        EnumSet::<Option>::all()
            .iter()
            .find_map(|option| match option.short_spelling() {
                Some((c, state)) if c == letter => Some((option, state)),
                _ => None,
            })
    }

    /// Resolves a long option name, accepting the `no` prefix for the
    /// negated spelling (`noclobber`, `nounset`, `noglob`, …).
    #[must_use]
    pub fn from_long(name: &str) -> std::option::Option<(Option, State)> {
        let canonical: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let find = |name: &str| {
            EnumSet::<Option>::all()
                .iter()
                .find(|option| option.long_name() == name)
        };
        if let Some(option) = find(&canonical) {
            return Some((option, State::On));
        }
        if let Some(rest) = canonical.strip_prefix("no") {
            if let Some(option) = find(rest) {
                return Some((option, State::Off));
            }
        }
        None
    }
}

impl Display for Option {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.long_name().fmt(f)
    }
}

/// Sensitivity of `errexit` inside compound constructs
///
/// The exact threshold is a documented tunable rather than an inferred
/// behavior: `strict` propagates any non-zero status out of compound
/// constructs, `default` matches plain POSIX `errexit`, and `relaxed`
/// only lets top-level simple commands trigger the exit.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ErrexitSeverity {
    Strict,
    #[default]
    Default,
    Relaxed,
}

impl ErrexitSeverity {
    /// Canonical spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrexitSeverity::Strict => "strict",
            ErrexitSeverity::Default => "default",
            ErrexitSeverity::Relaxed => "relaxed",
        }
    }
}

impl FromStr for ErrexitSeverity {
    type Err = ();
    fn from_str(s: &str) -> Result<ErrexitSeverity, ()> {
        match s.to_ascii_lowercase().as_str() {
            "strict" | "high" => Ok(ErrexitSeverity::Strict),
            "default" | "medium" | "normal" => Ok(ErrexitSeverity::Default),
            "relaxed" | "low" => Ok(ErrexitSeverity::Relaxed),
            _ => Err(()),
        }
    }
}

impl Display for ErrexitSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// Set of enabled options plus the errexit sensitivity knob
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptionSet {
    enabled: EnumSet<Option>,
    /// Threshold for `errexit` inside compound constructs
    pub errexit_severity: ErrexitSeverity,
}

impl Default for OptionSet {
    /// The default set: clobbering, globbing, execution, and
    /// unset-variable expansion are allowed; everything else is off.
    fn default() -> OptionSet {
        OptionSet {
            enabled: Clobber | Glob | Exec | Unset,
            errexit_severity: ErrexitSeverity::Default,
        }
    }
}

impl OptionSet {
    /// Whether an option is on.
    #[must_use]
    pub fn is_on(&self, option: Option) -> bool {
        self.enabled.contains(option)
    }

    /// Sets an option's state.
    pub fn set(&mut self, option: Option, state: State) {
        match state {
            State::On => {
                self.enabled.insert(option);
            }
            State::Off => {
                self.enabled.remove(option);
            }
        }
    }

    /// The value of the special parameter `$-`: the short letters of
    /// every option in its non-default-selected state.
    #[must_use]
    pub fn flags_string(&self) -> String {
        EnumSet::<Option>::all()
            .iter()
            .filter_map(|option| {
                let (letter, selected) = option.short_spelling()?;
                let state = if self.is_on(option) {
                    State::On
                } else {
                    State::Off
                };
                (state == selected).then_some(letter)
            })
            .collect()
    }

    /// Iterates over every option with its current state, for
    /// `set -o` output.
    pub fn iter(&self) -> impl Iterator<Item = (Option, State)> + '_ {
        EnumSet::<Option>::all().iter().map(|option| {
            let state = if self.is_on(option) {
                State::On
            } else {
                State::Off
            };
            (option, state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let set = OptionSet::default();
        assert!(set.is_on(Clobber));
        assert!(set.is_on(Glob));
        assert!(set.is_on(Unset));
        assert!(!set.is_on(ErrExit));
        assert!(!set.is_on(PipeFail));
    }

    #[test]
    fn short_spellings_resolve() {
        assert_eq!(Option::from_short('e'), Some((ErrExit, State::On)));
        assert_eq!(Option::from_short('C'), Some((Clobber, State::Off)));
        assert_eq!(Option::from_short('u'), Some((Unset, State::Off)));
        assert_eq!(Option::from_short('f'), Some((Glob, State::Off)));
        assert_eq!(Option::from_short('Z'), None);
    }

    #[test]
    fn long_names_resolve_with_negation() {
        assert_eq!(Option::from_long("errexit"), Some((ErrExit, State::On)));
        assert_eq!(Option::from_long("noclobber"), Some((Clobber, State::Off)));
        assert_eq!(Option::from_long("nounset"), Some((Unset, State::Off)));
        assert_eq!(Option::from_long("noglob"), Some((Glob, State::Off)));
        assert_eq!(Option::from_long("pipefail"), Some((PipeFail, State::On)));
        assert_eq!(Option::from_long("pipe-fail"), Some((PipeFail, State::On)));
        assert_eq!(Option::from_long("bogus"), None);
    }

    #[test]
    fn notify_is_not_confused_with_its_negation() {
        // `notify` starts with `no` but names an option itself.
        assert_eq!(Option::from_long("notify"), Some((Notify, State::On)));
    }

    #[test]
    fn flags_string_reflects_non_defaults() {
        let mut set = OptionSet::default();
        assert_eq!(set.flags_string(), "");
        set.set(ErrExit, State::On);
        set.set(Clobber, State::Off);
        set.set(XTrace, State::On);
        let flags = set.flags_string();
        assert!(flags.contains('e'));
        assert!(flags.contains('C'));
        assert!(flags.contains('x'));
        assert!(!flags.contains('a'));
    }

    #[test]
    fn unmodifiable_options() {
        assert!(!CmdLine.is_modifiable());
        assert!(!Interactive.is_modifiable());
        assert!(ErrExit.is_modifiable());
    }

    #[test]
    fn errexit_severity_parsing() {
        assert_eq!("strict".parse(), Ok(ErrexitSeverity::Strict));
        assert_eq!("RELAXED".parse(), Ok(ErrexitSeverity::Relaxed));
        assert_eq!("default".parse(), Ok(ErrexitSeverity::Default));
        assert_eq!("bogus".parse::<ErrexitSeverity>(), Err(()));
    }
}
