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

//! Command and process substitution
//!
//! `$(…)` forks a subshell with its stdout on a pipe, reads the pipe to
//! the end, and strips trailing newlines. `<(…)`/`>(…)` fork an
//! asynchronous helper wired to a pipe and substitute a `/dev/fd/N`
//! path (a temporary FIFO where `/dev/fd` does not exist); the helper
//! and the kept descriptor are registered in the environment and
//! released when the containing command completes.

use super::super::{Error, ErrorCause, Result};
use cjsh_env::system::{self, Errno, ForkResult};
use cjsh_env::{signal, Env};
use cjsh_syntax::source::{Location, Source};
use cjsh_syntax::syntax::ProcSubstKind;

fn subst_error(errno: Errno, location: &Location) -> Error {
    Error {
        cause: ErrorCause::CommandSubst { errno },
        location: location.clone(),
    }
}

/// Expands `$(…)` or backquotes to the captured output.
pub fn expand(env: &mut Env, content: &str, location: &Location) -> Result<String> {
    let (reader, writer) = system::pipe().map_err(|e| subst_error(e, location))?;

    match unsafe { system::fork() }.map_err(|e| subst_error(e, location))? {
        ForkResult::Child => {
            let _ = system::close(reader);
            let _ = system::dup2(writer, 1);
            let _ = system::close(writer);
            signal::prepare_child();
            env.enter_subshell();
            let source = Source::CommandSubst {
                original: location.clone(),
            };
            let status = crate::runner::run_string_in_subshell(env, content, source);
            system::exit_process(status.0);
        }
        ForkResult::Parent { child } => {
            let _ = system::close(writer);
            let mut output = Vec::new();
            let mut buffer = [0u8; 4096];
            loop {
                match system::read(reader, &mut buffer) {
                    Ok(0) => break,
                    Ok(n) => output.extend_from_slice(&buffer[..n]),
                    Err(e) => {
                        let _ = system::close(reader);
                        return Err(subst_error(e, location));
                    }
                }
            }
            let _ = system::close(reader);

            let status = loop {
                use cjsh_env::system::WaitStatus;
                match system::waitpid(Some(child), system::WaitPidFlag::empty()) {
                    Ok(WaitStatus::Exited(_, code)) => break code.into(),
                    Ok(WaitStatus::Signaled(_, sig, _)) => {
                        break cjsh_env::semantics::ExitStatus::from_signal(sig)
                    }
                    Ok(_) => continue,
                    Err(Errno::EINTR) => continue,
                    Err(_) => break cjsh_env::semantics::ExitStatus::FAILURE,
                }
            };
            // The substitution's status becomes `$?` for commands that
            // consist of assignments only.
            env.exit_status = status;

            let mut text = String::from_utf8_lossy(&output).into_owned();
            while text.ends_with('\n') {
                text.pop();
            }
            Ok(text)
        }
    }
}

/// Expands `<(…)` or `>(…)` to a readable or writable path.
pub fn process_substitution(
    env: &mut Env,
    kind: ProcSubstKind,
    content: &str,
    location: &Location,
) -> Result<String> {
    if system::dev_fd_supported() {
        process_substitution_pipe(env, kind, content, location)
    } else {
        process_substitution_fifo(env, kind, content, location)
    }
}

fn spawn_helper(
    env: &mut Env,
    kind: ProcSubstKind,
    content: &str,
    location: &Location,
    child_fd: std::os::unix::io::RawFd,
    close_in_child: std::os::unix::io::RawFd,
) -> Result<system::Pid> {
    match unsafe { system::fork() }.map_err(|e| subst_error(e, location))? {
        ForkResult::Child => {
            if close_in_child >= 0 {
                let _ = system::close(close_in_child);
            }
            let target = match kind {
                ProcSubstKind::In => 1,
                ProcSubstKind::Out => 0,
            };
            let _ = system::dup2(child_fd, target);
            let _ = system::close(child_fd);
            signal::prepare_child();
            env.enter_subshell();
            let source = Source::CommandSubst {
                original: location.clone(),
            };
            let status = crate::runner::run_string_in_subshell(env, content, source);
            system::exit_process(status.0);
        }
        ForkResult::Parent { child } => Ok(child),
    }
}

fn process_substitution_pipe(
    env: &mut Env,
    kind: ProcSubstKind,
    content: &str,
    location: &Location,
) -> Result<String> {
    let (reader, writer) = system::pipe().map_err(|e| subst_error(e, location))?;
    let (child_fd, kept_fd) = match kind {
        ProcSubstKind::In => (writer, reader),
        ProcSubstKind::Out => (reader, writer),
    };
    let child = spawn_helper(env, kind, content, location, child_fd, kept_fd)?;
    let _ = system::close(child_fd);
    // The command to be executed must inherit the kept end.
    system::set_cloexec(kept_fd, false).map_err(|e| subst_error(e, location))?;
    env.open_proc_substs.push((child, kept_fd));
    Ok(system::dev_fd_path(kept_fd))
}

fn process_substitution_fifo(
    env: &mut Env,
    kind: ProcSubstKind,
    content: &str,
    location: &Location,
) -> Result<String> {
    let dir = std::env::temp_dir();
    let path = dir.join(format!(
        "cjsh-subst-{}-{}",
        env.main_pid,
        env.proc_subst_paths.len(),
    ));
    nix::unistd::mkfifo(&path, system::Mode::from_bits_truncate(0o600))
        .map_err(|e| subst_error(e, location))?;

    match unsafe { system::fork() }.map_err(|e| subst_error(e, location))? {
        ForkResult::Child => {
            signal::prepare_child();
            env.enter_subshell();
            // Opening the FIFO blocks until the command opens the other
            // end.
            let flags = match kind {
                ProcSubstKind::In => system::OFlag::O_WRONLY,
                ProcSubstKind::Out => system::OFlag::O_RDONLY,
            };
            let c_path =
                std::ffi::CString::new(path.as_os_str().to_string_lossy().as_bytes()).unwrap();
            let status = match system::open(&c_path, flags, system::Mode::empty()) {
                Ok(fd) => {
                    let target = match kind {
                        ProcSubstKind::In => 1,
                        ProcSubstKind::Out => 0,
                    };
                    let _ = system::dup2(fd, target);
                    let _ = system::close(fd);
                    let source = Source::CommandSubst {
                        original: location.clone(),
                    };
                    crate::runner::run_string_in_subshell(env, content, source)
                }
                Err(_) => cjsh_env::semantics::ExitStatus::FAILURE,
            };
            system::exit_process(status.0);
        }
        ForkResult::Parent { child } => {
            env.open_proc_substs.push((child, -1));
            env.proc_subst_paths.push(path.clone());
            Ok(path.to_string_lossy().into_owned())
        }
    }
}
