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

//! Redirections
//!
//! Redirections are applied strictly left to right, so `>file 2>&1` and
//! `2>&1 >file` differ as POSIX demands. Children apply them directly
//! with [`apply_in_child`]; for built-ins running in the shell process,
//! a [`RedirGuard`] stashes each affected descriptor above the user fd
//! range and restores it when dropped, on every exit path.

use crate::expansion;
use cjsh_env::option::Option::Clobber;
use cjsh_env::semantics::Field;
use cjsh_env::system::{self, Errno, Mode, OFlag};
use cjsh_env::Env;
use cjsh_syntax::source::pretty::{Annotation, Category, Report, Severity};
use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::{HereDoc, Redir, RedirBody, RedirOp};
use std::ffi::CString;
use std::os::unix::io::RawFd;
use thiserror::Error as ThisError;

/// Lowest descriptor used for stashed copies
const SAVE_FD_MIN: RawFd = 10;

/// Here-document bodies up to this size go through a pipe; larger ones
/// through an unlinked temporary file, so the writer cannot block.
const PIPE_CONTENT_MAX: usize = 4096;

/// Cause of a redirection error
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[non_exhaustive]
pub enum Cause {
    #[error("cannot open {path}: {errno}")]
    OpenFailed { path: String, errno: Errno },
    #[error("{path}: cannot overwrite existing file")]
    Clobber { path: String },
    #[error("{operand}: not a valid file descriptor")]
    BadFdOperand { operand: String },
    #[error("cannot prepare here-document: {errno}")]
    HereDoc { errno: Errno },
    #[error("cannot duplicate file descriptor: {errno}")]
    Dup { errno: Errno },
    #[error(transparent)]
    Expansion(expansion::Error),
}

impl Cause {
    /// Stable diagnostic code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Cause::OpenFailed { .. } => "RED001",
            Cause::Clobber { .. } => "RED002",
            Cause::BadFdOperand { .. } => "RED003",
            Cause::HereDoc { .. } => "RED004",
            Cause::Dup { .. } => "RED005",
            Cause::Expansion(_) => "RED006",
        }
    }
}

/// Redirection error with its location
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{cause}")]
pub struct Error {
    pub cause: Cause,
    pub location: Location,
}

impl From<expansion::Error> for Error {
    fn from(error: expansion::Error) -> Error {
        let location = error.location.clone();
        Error {
            cause: Cause::Expansion(error),
            location,
        }
    }
}

impl Error {
    /// Converts this error to a renderable diagnostic.
    #[must_use]
    pub fn to_report(&self) -> Report {
        if let Cause::Expansion(inner) = &self.cause {
            return inner.to_report();
        }
        Report {
            severity: Severity::Error,
            category: Category::Redirection,
            code: self.cause.code(),
            title: self.cause.to_string(),
            annotation: Annotation {
                label: self.cause.to_string(),
                location: self.location.clone(),
            },
            related: Vec::new(),
            suggestion: None,
        }
    }
}

/// Result of redirection processing
pub type Result<T> = std::result::Result<T, Error>;

/// Open flags for a file redirection operator.
///
/// `clobber_allowed` reflects the `noclobber` option; `>|` passes true
/// unconditionally.
#[must_use]
pub fn open_flags(op: RedirOp, clobber_allowed: bool) -> OFlag {
    use RedirOp::*;
    match op {
        FileIn => OFlag::O_RDONLY,
        FileOut | OutErr if clobber_allowed => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
        FileOut | OutErr => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_EXCL,
        FileClobber => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
        FileAppend => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        FileInOut => OFlag::O_RDWR | OFlag::O_CREAT,
        FdIn | FdOut | HereString => OFlag::empty(),
    }
}

/// What to do to the target descriptor
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FdAction {
    /// `dup2(source, target)`, closing the source afterwards if owned
    Install { source: RawFd, close_source: bool },
    /// Close the target (`n>&-`)
    Close,
}

/// One resolved redirection, ready to apply
#[derive(Clone, Copy, Debug)]
struct Prepared {
    target: RawFd,
    action: FdAction,
    /// `&>`: also install onto stderr
    also_stderr: bool,
}

/// Resolves a redirection's operand and opens its source.
fn prepare(env: &mut Env, redir: &Redir) -> Result<Prepared> {
    let target = redir.fd_or_default().0;
    match &redir.body {
        RedirBody::HereDoc(here_doc) => {
            let fd = here_doc_fd(env, here_doc, &redir.location)?;
            Ok(Prepared {
                target,
                action: FdAction::Install {
                    source: fd,
                    close_source: true,
                },
                also_stderr: false,
            })
        }
        RedirBody::Normal { operator, operand } => {
            let field = expansion::expand_word(env, operand)?;
            match operator {
                RedirOp::FdIn | RedirOp::FdOut => fd_dup_action(target, &field, &redir.location),
                RedirOp::HereString => {
                    let mut body = field.value.into_bytes();
                    body.push(b'\n');
                    let fd = content_fd(&body).map_err(|errno| Error {
                        cause: Cause::HereDoc { errno },
                        location: redir.location.clone(),
                    })?;
                    Ok(Prepared {
                        target,
                        action: FdAction::Install {
                            source: fd,
                            close_source: true,
                        },
                        also_stderr: false,
                    })
                }
                op => {
                    let clobber_allowed =
                        env.options.is_on(Clobber) || *op == RedirOp::FileClobber;
                    let flags = open_flags(*op, clobber_allowed);
                    let path = CString::new(field.value.as_bytes()).map_err(|_| Error {
                        cause: Cause::OpenFailed {
                            path: field.value.clone(),
                            errno: Errno::EINVAL,
                        },
                        location: redir.location.clone(),
                    })?;
                    let fd = system::open(&path, flags, Mode::from_bits_truncate(0o666))
                        .map_err(|errno| match errno {
                            Errno::EEXIST if matches!(op, RedirOp::FileOut | RedirOp::OutErr) => Error {
                                cause: Cause::Clobber {
                                    path: field.value.clone(),
                                },
                                location: redir.location.clone(),
                            },
                            errno => Error {
                                cause: Cause::OpenFailed {
                                    path: field.value.clone(),
                                    errno,
                                },
                                location: redir.location.clone(),
                            },
                        })?;
                    Ok(Prepared {
                        target,
                        action: FdAction::Install {
                            source: fd,
                            close_source: true,
                        },
                        also_stderr: *op == RedirOp::OutErr,
                    })
                }
            }
        }
    }
}

fn fd_dup_action(target: RawFd, operand: &Field, location: &Location) -> Result<Prepared> {
    if operand.value == "-" {
        return Ok(Prepared {
            target,
            action: FdAction::Close,
            also_stderr: false,
        });
    }
    match operand.value.parse::<RawFd>() {
        Ok(source) if source >= 0 => Ok(Prepared {
            target,
            action: FdAction::Install {
                source,
                close_source: false,
            },
            also_stderr: false,
        }),
        _ => Err(Error {
            cause: Cause::BadFdOperand {
                operand: operand.value.clone(),
            },
            location: location.clone(),
        }),
    }
}

/// Materializes a here-document body into a readable descriptor.
fn here_doc_fd(env: &mut Env, here_doc: &HereDoc, location: &Location) -> Result<RawFd> {
    // A quoted delimiter made the lexer store the body as literal
    // characters, so unconditional expansion is correct for both
    // flavors.
    let content = here_doc.content.get().cloned().unwrap_or_default();
    let body = expansion::expand_text(env, &content, location)?;
    content_fd(body.as_bytes()).map_err(|errno| Error {
        cause: Cause::HereDoc { errno },
        location: location.clone(),
    })
}

/// Puts bytes behind a readable descriptor: a pipe for small contents,
/// an unlinked temporary file otherwise.
fn content_fd(content: &[u8]) -> std::result::Result<RawFd, Errno> {
    if content.len() <= PIPE_CONTENT_MAX {
        let (reader, writer) = system::pipe()?;
        let result = system::write_all(writer, content);
        let _ = system::close(writer);
        result?;
        Ok(reader)
    } else {
        use std::io::{Seek, Write};
        use std::os::unix::io::IntoRawFd;
        let mut file = tempfile::tempfile().map_err(|_| Errno::EIO)?;
        file.write_all(content).map_err(|_| Errno::EIO)?;
        file.rewind().map_err(|_| Errno::EIO)?;
        Ok(file.into_raw_fd())
    }
}

fn install(prepared: Prepared, location: &Location) -> Result<()> {
    let dup_error = |errno| Error {
        cause: Cause::Dup { errno },
        location: location.clone(),
    };
    match prepared.action {
        FdAction::Close => {
            let _ = system::close(prepared.target);
        }
        FdAction::Install {
            source,
            close_source,
        } => {
            if source != prepared.target {
                system::dup2(source, prepared.target).map_err(dup_error)?;
            } else {
                // Same fd: just make sure it survives exec.
                system::set_cloexec(source, false).map_err(dup_error)?;
            }
            if prepared.also_stderr {
                system::dup2(prepared.target, 2).map_err(dup_error)?;
            }
            if close_source && source != prepared.target {
                let _ = system::close(source);
            }
        }
    }
    Ok(())
}

/// Applies redirections in a forked child, left to right.
pub fn apply_in_child(env: &mut Env, redirs: &[Redir]) -> Result<()> {
    for redir in redirs {
        let prepared = prepare(env, redir)?;
        install(prepared, &redir.location)?;
    }
    Ok(())
}

/// Applies redirections in the shell process, undoing them on drop
///
/// Used for built-ins, functions, and assignment-only commands, whose
/// I/O must be redirected without forking.
#[must_use = "redirections are undone when the guard drops"]
pub struct RedirGuard<'e> {
    env: &'e mut Env,
    /// Affected descriptors with their stashed copies, oldest first
    saved: Vec<(RawFd, Option<RawFd>)>,
}

impl<'e> RedirGuard<'e> {
    pub fn new(env: &'e mut Env) -> RedirGuard<'e> {
        RedirGuard {
            env,
            saved: Vec::new(),
        }
    }

    /// Applies one redirection, stashing the old descriptor.
    pub fn perform_redir(&mut self, redir: &Redir) -> Result<()> {
        let prepared = prepare(self.env, redir)?;
        let stashed = match system::dup_cloexec_above(prepared.target, SAVE_FD_MIN) {
            Ok(copy) => Some(copy),
            Err(Errno::EBADF) => None,
            Err(errno) => {
                return Err(Error {
                    cause: Cause::Dup { errno },
                    location: redir.location.clone(),
                })
            }
        };
        self.saved.push((prepared.target, stashed));
        if prepared.also_stderr {
            match system::dup_cloexec_above(2, SAVE_FD_MIN) {
                Ok(copy) => self.saved.push((2, Some(copy))),
                Err(_) => self.saved.push((2, None)),
            }
        }
        install(prepared, &redir.location)
    }

    /// Applies a whole redirection list, left to right.
    pub fn perform_redirs(&mut self, redirs: &[Redir]) -> Result<()> {
        for redir in redirs {
            self.perform_redir(redir)?;
        }
        Ok(())
    }

    /// Restores every affected descriptor now.
    pub fn undo_redirs(&mut self) {
        while let Some((target, stashed)) = self.saved.pop() {
            match stashed {
                Some(copy) => {
                    let _ = system::dup2(copy, target);
                    let _ = system::close(copy);
                }
                None => {
                    let _ = system::close(target);
                }
            }
        }
    }

    /// Keeps the redirections in place permanently (`exec 3<file`).
    pub fn preserve_redirs(&mut self) {
        for (_, stashed) in self.saved.drain(..) {
            if let Some(copy) = stashed {
                let _ = system::close(copy);
            }
        }
    }

    /// The wrapped environment.
    pub fn env(&mut self) -> &mut Env {
        self.env
    }
}

impl Drop for RedirGuard<'_> {
    fn drop(&mut self) {
        self.undo_redirs();
    }
}

impl std::ops::Deref for RedirGuard<'_> {
    type Target = Env;
    fn deref(&self) -> &Env {
        self.env
    }
}

impl std::ops::DerefMut for RedirGuard<'_> {
    fn deref_mut(&mut self) -> &mut Env {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_flags_match_posix() {
        assert_eq!(open_flags(RedirOp::FileIn, true), OFlag::O_RDONLY);
        assert_eq!(
            open_flags(RedirOp::FileOut, true),
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC
        );
        assert_eq!(
            open_flags(RedirOp::FileOut, false),
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_EXCL
        );
        assert_eq!(
            open_flags(RedirOp::FileClobber, false),
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC
        );
        assert_eq!(
            open_flags(RedirOp::FileAppend, true),
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND
        );
        assert_eq!(
            open_flags(RedirOp::FileInOut, true),
            OFlag::O_RDWR | OFlag::O_CREAT
        );
    }

    #[test]
    fn content_fd_round_trips_small_content() {
        let fd = content_fd(b"hello\n").unwrap();
        let mut buffer = [0u8; 16];
        let n = system::read(fd, &mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"hello\n");
        system::close(fd).unwrap();
    }

    #[test]
    fn content_fd_round_trips_large_content() {
        let body = vec![b'x'; PIPE_CONTENT_MAX + 1];
        let fd = content_fd(&body).unwrap();
        let mut collected = Vec::new();
        let mut buffer = [0u8; 4096];
        loop {
            let n = system::read(fd, &mut buffer).unwrap();
            if n == 0 {
                break;
            }
            collected.extend_from_slice(&buffer[..n]);
        }
        assert_eq!(collected, body);
        system::close(fd).unwrap();
    }

    #[test]
    fn fd_dup_operand_parsing() {
        let location = Location::dummy("2>&1");
        let ok = fd_dup_action(2, &Field::dummy("1"), &location).unwrap();
        assert_eq!(
            ok.action,
            FdAction::Install {
                source: 1,
                close_source: false
            }
        );
        let close = fd_dup_action(2, &Field::dummy("-"), &location).unwrap();
        assert_eq!(close.action, FdAction::Close);
        let err = fd_dup_action(2, &Field::dummy("x"), &location).unwrap_err();
        assert_matches::assert_matches!(err.cause, Cause::BadFdOperand { operand } => {
            assert_eq!(operand, "x");
        });
    }

    #[test]
    fn guard_restores_descriptors() {
        // Redirect a high fd to a pipe, then check it is restored.
        let (reader, writer) = system::pipe().unwrap();
        let mut env = Env::new();
        let redir: cjsh_syntax::syntax::Redir = {
            use cjsh_syntax::syntax::*;
            use std::str::FromStr;
            Redir {
                fd: Some(Fd(writer)),
                body: RedirBody::Normal {
                    operator: RedirOp::FdOut,
                    operand: Word::from_str("1").unwrap(),
                },
                location: Location::dummy(">&1"),
            }
        };
        let original = system::dup_cloexec_above(writer, 10).unwrap();
        {
            let mut guard = RedirGuard::new(&mut env);
            guard.perform_redir(&redir).unwrap();
            // Inside the guard, `writer` now aliases fd 1.
        }
        // After the guard, writing to `writer` reaches the pipe again.
        system::write_all(writer, b"ok").unwrap();
        let mut buffer = [0u8; 4];
        let n = system::read(reader, &mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"ok");
        system::close(original).unwrap();
        system::close(reader).unwrap();
        system::close(writer).unwrap();
    }
}
