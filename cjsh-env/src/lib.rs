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

//! Shell execution environment
//!
//! The [`Env`] struct aggregates everything a running shell mutates:
//! variables and their scopes, defined functions, the job table, shell
//! options, traps, and the result of the last command. One `Env` lives
//! in the shell process; forked children keep working on their copied
//! instance and never write back.
//!
//! The modules are usable on their own: [`variable`] implements the
//! scope stack, [`job`] the job table, [`trap`] the trap table,
//! [`signal`] the async-signal-safe pending-signal intake, and
//! [`system`] the thin syscall layer everything process-related goes
//! through.

pub mod builtin;
pub mod function;
pub mod job;
pub mod option;
pub mod semantics;
pub mod signal;
pub mod system;
pub mod trap;
pub mod variable;

use self::builtin::Builtin;
use self::function::FunctionSet;
use self::job::JobList;
use self::option::OptionSet;
use self::semantics::ExitStatus;
use self::trap::TrapSet;
use self::variable::VariableSet;
use std::collections::HashMap;

#[doc(no_inline)]
pub use nix::unistd::Pid;

/// Whole state of the shell
#[derive(Clone, Debug)]
pub struct Env {
    /// Shell variables, scopes, and positional parameters
    pub variables: VariableSet,
    /// Defined functions
    pub functions: FunctionSet,
    /// Job table
    pub jobs: JobList,
    /// Shell options
    pub options: OptionSet,
    /// Trap table
    pub traps: TrapSet,
    /// Built-in command table, filled at startup
    pub builtins: HashMap<&'static str, Builtin>,
    /// Exit status of the last completed command (`$?`)
    pub exit_status: ExitStatus,
    /// Process ID of the main shell process (`$$`)
    ///
    /// Unlike `getpid`, this does not change in subshells.
    pub main_pid: Pid,
    /// Process group the shell itself belongs to
    pub shell_pgid: Pid,
    /// File descriptor of the controlling terminal, when job control is
    /// active
    pub tty_fd: Option<std::os::unix::io::RawFd>,
    /// Name the shell was invoked as, or the script name (`$0`)
    pub arg0: String,
    /// Depth of enclosing loops, for `break`/`continue` validation
    pub loop_depth: usize,
    /// Depth of function calls and sourced scripts, for `return`
    pub call_depth: usize,
    /// Depth of condition contexts (`if`/`while` conditions, `&&`/`||`
    /// operands, `!` pipelines), where `errexit` is suspended
    pub condition_depth: usize,
    /// Depth of enclosing compound-command bodies, consulted by the
    /// `errexit` severity policy
    pub compound_depth: usize,
    /// Process substitutions opened while setting up the current
    /// command: (helper pid, kept pipe end)
    pub open_proc_substs: Vec<(Pid, std::os::unix::io::RawFd)>,
    /// Temporary FIFO paths backing process substitutions on systems
    /// without `/dev/fd`, unlinked when the command completes
    pub proc_subst_paths: Vec<std::path::PathBuf>,
    /// Whether this process is a forked subshell of the main shell
    pub is_subshell: bool,
}

impl Env {
    /// Creates an environment with empty tables.
    ///
    /// The caller initializes variables from the process environment and
    /// fills the built-in table.
    #[must_use]
    pub fn new() -> Env {
        Env {
            variables: VariableSet::default(),
            functions: FunctionSet::default(),
            jobs: JobList::default(),
            options: OptionSet::default(),
            traps: TrapSet::default(),
            builtins: HashMap::new(),
            exit_status: ExitStatus::SUCCESS,
            main_pid: nix::unistd::getpid(),
            shell_pgid: nix::unistd::getpgrp(),
            tty_fd: None,
            arg0: String::new(),
            loop_depth: 0,
            call_depth: 0,
            condition_depth: 0,
            compound_depth: 0,
            open_proc_substs: Vec::new(),
            proc_subst_paths: Vec::new(),
            is_subshell: false,
        }
    }

    /// Marks this environment as a forked subshell.
    ///
    /// Subshells abandon job control bookkeeping: the job table is
    /// cleared and non-inherited traps are reset, as POSIX requires.
    pub fn enter_subshell(&mut self) {
        self.is_subshell = true;
        self.jobs = JobList::default();
        self.traps.enter_subshell();
        self.tty_fd = None;
    }

    /// Whether the shell is interactive with job control enabled.
    #[must_use]
    pub fn job_control_active(&self) -> bool {
        self.options.is_on(option::Option::Monitor) && self.tty_fd.is_some() && !self.is_subshell
    }
}

impl Default for Env {
    fn default() -> Env {
        Env::new()
    }
}
