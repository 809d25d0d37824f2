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

//! Process plumbing
//!
//! Forking pipeline stages, placing them into process groups, handing
//! the terminal over and back, waiting for foreground jobs, and reaping
//! asynchronous children. The terminal handoff in
//! [`wait_for_foreground`] is paired on every path out of the loop, so
//! the shell always reclaims the terminal.

use cjsh_env::job::{JobState, ProcessState};
use cjsh_env::semantics::ExitStatus;
use cjsh_env::system::{self, Errno, ForkResult, Pid, WaitPidFlag, WaitStatus};
use cjsh_env::{signal, Env};
use std::os::unix::io::RawFd;

/// Wiring for one forked child
#[derive(Clone, Debug, Default)]
pub struct ChildSetup {
    /// Process group to join; `Some(0)` creates a group from the
    /// child's own pid
    pub pgid: Option<Pid>,
    /// Descriptor to install as stdin
    pub stdin: Option<RawFd>,
    /// Descriptor to install as stdout
    pub stdout: Option<RawFd>,
    /// Descriptors to close in the child (unused pipe ends)
    pub close: Vec<RawFd>,
}

/// Forks a child that runs `body` and exits with its status.
///
/// The child resets signal dispositions, joins its process group, and
/// installs the pipe ends before running. The parent mirrors the
/// `setpgid` call so the group exists before either side proceeds.
pub fn fork_child<F>(env: &mut Env, setup: &ChildSetup, body: F) -> Result<Pid, Errno>
where
    F: FnOnce(&mut Env) -> ExitStatus,
{
    match unsafe { system::fork() }? {
        ForkResult::Child => {
            signal::prepare_child();
            if let Some(pgid) = setup.pgid {
                let _ = system::setpgid(Pid::from_raw(0), pgid);
            }
            if let Some(fd) = setup.stdin {
                let _ = system::dup2(fd, 0);
            }
            if let Some(fd) = setup.stdout {
                let _ = system::dup2(fd, 1);
            }
            for &fd in &setup.close {
                let _ = system::close(fd);
            }
            if let Some(fd) = setup.stdin {
                if fd != 0 {
                    let _ = system::close(fd);
                }
            }
            if let Some(fd) = setup.stdout {
                if fd != 1 && setup.stdin != Some(fd) {
                    let _ = system::close(fd);
                }
            }
            env.enter_subshell();
            let status = body(env);
            system::exit_process(status.0);
        }
        ForkResult::Parent { child } => {
            if let Some(pgid) = setup.pgid {
                let group = if pgid.as_raw() == 0 { child } else { pgid };
                let _ = system::setpgid(child, group);
            }
            Ok(child)
        }
    }
}

/// Converts a `waitpid` report to a process state.
#[must_use]
pub fn process_state(status: WaitStatus) -> Option<(Pid, ProcessState)> {
    match status {
        WaitStatus::Exited(pid, code) => Some((pid, ProcessState::Exited(ExitStatus(code)))),
        WaitStatus::Signaled(pid, signal, core_dumped) => Some((
            pid,
            ProcessState::Signaled {
                signal,
                core_dumped,
            },
        )),
        WaitStatus::Stopped(pid, signal) => Some((pid, ProcessState::Stopped(signal))),
        #[cfg(any(target_os = "linux", target_os = "android"))]
        WaitStatus::PtraceEvent(pid, signal, _) => Some((pid, ProcessState::Stopped(signal))),
        WaitStatus::Continued(pid) => Some((pid, ProcessState::Running)),
        _ => None,
    }
}

/// Reaps every child that has changed state, without blocking.
///
/// Called from the SIGCHLD drain and before prompts.
pub fn reap_children(env: &mut Env) {
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
    loop {
        match system::waitpid(Some(Pid::from_raw(-1)), flags) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => return,
            Ok(status) => {
                if let Some((pid, state)) = process_state(status) {
                    env.jobs.update_process(pid, state);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(_) => return,
        }
    }
}

/// Gives the terminal to the job's process group, if job control is on.
fn give_terminal(env: &Env, pgid: Pid) {
    if let Some(tty) = env.tty_fd {
        if env.job_control_active() {
            let _ = system::tcsetpgrp(tty, pgid);
        }
    }
}

/// Takes the terminal back for the shell.
fn reclaim_terminal(env: &Env) {
    if let Some(tty) = env.tty_fd {
        if env.job_control_active() {
            let _ = system::tcsetpgrp(tty, env.shell_pgid);
        }
    }
}

/// Waits until the foreground job finishes or stops.
///
/// Returns the job's exit status (stopped jobs report 128 plus the
/// stopping signal). A finished job is left in the table for the caller
/// to inspect (for `pipefail`) and remove; a stopped job stays and is
/// marked for reporting.
pub fn wait_for_foreground(env: &mut Env, job_index: usize) -> ExitStatus {
    let Some(job) = env.jobs.get(job_index) else {
        return ExitStatus::FAILURE;
    };
    let pgid = job.pgid;
    give_terminal(env, pgid);

    let status = loop {
        // Wait for any child: the job's members may share the shell's
        // process group when job control is off, and state changes of
        // other children are worth recording anyway.
        let target = Some(Pid::from_raw(-1));
        match system::waitpid(target, WaitPidFlag::WUNTRACED) {
            Ok(report) => {
                if let Some((pid, state)) = process_state(report) {
                    env.jobs.update_process(pid, state);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(_) => break ExitStatus::FAILURE,
        }
        let Some(job) = env.jobs.get(job_index) else {
            break ExitStatus::FAILURE;
        };
        match job.state() {
            JobState::Running => continue,
            JobState::Stopped => {
                break stop_status(job_index, env);
            }
            JobState::Done(status) => break status,
            JobState::Terminated(signal) => break ExitStatus::from_signal(signal),
        }
    };

    reclaim_terminal(env);
    status
}

fn stop_status(job_index: usize, env: &mut Env) -> ExitStatus {
    let job = env.jobs.get_mut(job_index).unwrap();
    job.is_background = true;
    let stop_signal = job
        .processes
        .iter()
        .find_map(|p| match p.state {
            ProcessState::Stopped(signal) => Some(signal),
            _ => None,
        })
        .unwrap_or(nix::sys::signal::Signal::SIGTSTP);
    ExitStatus::from_signal(stop_signal)
}

/// Releases process-substitution resources opened for a command.
pub fn cleanup_proc_substs(env: &mut Env) {
    for (pid, fd) in std::mem::take(&mut env.open_proc_substs) {
        if fd >= 0 {
            let _ = system::close(fd);
        }
        // The helper usually dies of EOF or SIGPIPE once the command is
        // done; collect it if it already has, otherwise the SIGCHLD
        // drain will.
        let _ = system::waitpid(Some(pid), WaitPidFlag::WNOHANG);
    }
    for path in std::mem::take(&mut env.proc_subst_paths) {
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_state_conversion() {
        use nix::sys::signal::Signal;
        let pid = Pid::from_raw(5);
        assert_eq!(
            process_state(WaitStatus::Exited(pid, 3)),
            Some((pid, ProcessState::Exited(ExitStatus(3))))
        );
        assert_eq!(
            process_state(WaitStatus::Signaled(pid, Signal::SIGKILL, false)),
            Some((
                pid,
                ProcessState::Signaled {
                    signal: Signal::SIGKILL,
                    core_dumped: false
                }
            ))
        );
        assert_eq!(
            process_state(WaitStatus::Stopped(pid, Signal::SIGTSTP)),
            Some((pid, ProcessState::Stopped(Signal::SIGTSTP)))
        );
        assert_eq!(process_state(WaitStatus::StillAlive), None);
    }
}
