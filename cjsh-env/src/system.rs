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

//! Thin syscall layer
//!
//! Everything process- and fd-related goes through these wrappers.
//! `nix` is used where its interface fits; the few calls where it gets
//! in the way (`open`, `dup2`, terminal group control) go straight to
//! `libc` with an explicit errno check.

use std::ffi::{c_int, CStr, CString};
use std::os::unix::io::RawFd;

#[doc(no_inline)]
pub use nix::errno::Errno;
#[doc(no_inline)]
pub use nix::fcntl::OFlag;
#[doc(no_inline)]
pub use nix::sys::stat::Mode;
#[doc(no_inline)]
pub use nix::sys::wait::{WaitPidFlag, WaitStatus};
#[doc(no_inline)]
pub use nix::unistd::{ForkResult, Pid};

/// Result of system calls
pub type Result<T> = std::result::Result<T, Errno>;

fn check(ret: c_int) -> Result<c_int> {
    if ret == -1 {
        Err(Errno::last())
    } else {
        Ok(ret)
    }
}

/// Creates a pipe with both ends close-on-exec.
pub fn pipe() -> Result<(RawFd, RawFd)> {
    let mut fds = [0 as c_int; 2];
    check(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) })?;
    Ok((fds[0], fds[1]))
}

/// Opens a file.
pub fn open(path: &CStr, flags: OFlag, mode: Mode) -> Result<RawFd> {
    check(unsafe { libc::open(path.as_ptr(), flags.bits(), libc::c_uint::from(mode.bits())) })
}

/// Duplicates `from` onto `to`, clearing close-on-exec on the copy.
pub fn dup2(from: RawFd, to: RawFd) -> Result<RawFd> {
    check(unsafe { libc::dup2(from, to) })
}

/// Duplicates `fd` to the lowest free descriptor at or above `min`,
/// with close-on-exec set. Used to stash descriptors out of the user
/// fd range while redirections are active.
pub fn dup_cloexec_above(fd: RawFd, min: RawFd) -> Result<RawFd> {
    check(unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, min) })
}

/// Closes a file descriptor, ignoring `EINTR`.
pub fn close(fd: RawFd) -> Result<()> {
    match check(unsafe { libc::close(fd) }) {
        Err(Errno::EINTR) | Ok(_) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Sets or clears the close-on-exec flag.
pub fn set_cloexec(fd: RawFd, on: bool) -> Result<()> {
    let flags = check(unsafe { libc::fcntl(fd, libc::F_GETFD) })?;
    let flags = if on {
        flags | libc::FD_CLOEXEC
    } else {
        flags & !libc::FD_CLOEXEC
    };
    check(unsafe { libc::fcntl(fd, libc::F_SETFD, flags) })?;
    Ok(())
}

/// Reads from a file descriptor.
pub fn read(fd: RawFd, buffer: &mut [u8]) -> Result<usize> {
    loop {
        let n = unsafe { libc::read(fd, buffer.as_mut_ptr().cast(), buffer.len()) };
        if n >= 0 {
            return Ok(n as usize);
        }
        let errno = Errno::last();
        if errno != Errno::EINTR {
            return Err(errno);
        }
    }
}

/// Writes the whole buffer to a file descriptor.
pub fn write_all(fd: RawFd, mut buffer: &[u8]) -> Result<()> {
    while !buffer.is_empty() {
        let n = unsafe { libc::write(fd, buffer.as_ptr().cast(), buffer.len()) };
        if n >= 0 {
            buffer = &buffer[n as usize..];
        } else {
            let errno = Errno::last();
            if errno != Errno::EINTR {
                return Err(errno);
            }
        }
    }
    Ok(())
}

/// Forks the process.
///
/// # Safety
///
/// In the child, only async-signal-safe operations may run until exec
/// or `_exit`; the caller upholds this.
pub unsafe fn fork() -> Result<ForkResult> {
    nix::unistd::fork()
}

/// Replaces the process image, returning only on failure.
pub fn execve(path: &CStr, args: &[CString], environ: &[CString]) -> Errno {
    match nix::unistd::execve(path, args, environ) {
        Ok(infallible) => match infallible {},
        Err(errno) => errno,
    }
}

/// Terminates the process immediately, without running atexit handlers
/// or flushing stdio. The only safe way out of a forked child.
pub fn exit_process(status: c_int) -> ! {
    unsafe { libc::_exit(status) }
}

/// Waits for a child process.
pub fn waitpid(target: Option<Pid>, flags: WaitPidFlag) -> Result<WaitStatus> {
    nix::sys::wait::waitpid(target, Some(flags))
}

/// Sends a signal to a process.
pub fn kill(pid: Pid, signal: Option<nix::sys::signal::Signal>) -> Result<()> {
    nix::sys::signal::kill(pid, signal)
}

/// Sends a signal to a process group.
pub fn killpg(pgid: Pid, signal: Option<nix::sys::signal::Signal>) -> Result<()> {
    kill(Pid::from_raw(-pgid.as_raw()), signal)
}

/// Moves a process into a process group.
pub fn setpgid(pid: Pid, pgid: Pid) -> Result<()> {
    nix::unistd::setpgid(pid, pgid)
}

/// Process group currently owning the terminal.
pub fn tcgetpgrp(fd: RawFd) -> Result<Pid> {
    let pgid = unsafe { libc::tcgetpgrp(fd) };
    if pgid == -1 {
        Err(Errno::last())
    } else {
        Ok(Pid::from_raw(pgid))
    }
}

/// Gives the terminal to a process group.
pub fn tcsetpgrp(fd: RawFd, pgid: Pid) -> Result<()> {
    check(unsafe { libc::tcsetpgrp(fd, pgid.as_raw()) })?;
    Ok(())
}

/// Whether the descriptor refers to a terminal.
#[must_use]
pub fn isatty(fd: RawFd) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

/// `/dev/fd/N` path for handing a descriptor to a child by name.
#[must_use]
pub fn dev_fd_path(fd: RawFd) -> String {
    format!("/dev/fd/{fd}")
}

/// Whether the platform exposes `/dev/fd`.
#[must_use]
pub fn dev_fd_supported() -> bool {
    std::path::Path::new("/dev/fd").exists()
}
