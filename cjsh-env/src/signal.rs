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

//! Pending-signal intake
//!
//! Signal handlers must not allocate or take locks, so the handler
//! installed here only sets a bit in a process-global atomic bitmap.
//! Cooperative code drains the bitmap at safe points (between commands,
//! between loop iterations, around `waitpid`) with [`take_pending`],
//! which yields the caught signals in the agreed precedence order:
//! SIGTERM before SIGHUP before SIGINT before SIGCHLD before the rest.

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::ffi::c_int;
use std::sync::atomic::{AtomicU64, Ordering};

/// One bit per signal number (1–63)
static PENDING: AtomicU64 = AtomicU64::new(0);

extern "C" fn catch_signal(signo: c_int) {
    // Async-signal-safe: a single atomic RMW, nothing else.
    if (1..64).contains(&signo) {
        PENDING.fetch_or(1 << signo, Ordering::Relaxed);
    }
}

/// Installs the flag-setting handler for a signal.
pub fn catch(signal: Signal) -> Result<(), nix::errno::Errno> {
    let action = SigAction::new(
        SigHandler::Handler(catch_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { nix::sys::signal::sigaction(signal, &action) }.map(drop)
}

/// Sets a signal's disposition to ignore.
pub fn ignore(signal: Signal) -> Result<(), nix::errno::Errno> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe { nix::sys::signal::sigaction(signal, &action) }.map(drop)
}

/// Restores a signal's default disposition.
pub fn default(signal: Signal) -> Result<(), nix::errno::Errno> {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    unsafe { nix::sys::signal::sigaction(signal, &action) }.map(drop)
}

/// Signals an interactive shell must not be killed or stopped by.
pub const JOB_CONTROL_SIGNALS: [Signal; 3] =
    [Signal::SIGTTIN, Signal::SIGTTOU, Signal::SIGTSTP];

/// Signals whose dispositions a forked child resets to the default
/// before exec.
pub const CHILD_RESET_SIGNALS: [Signal; 6] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
    Signal::SIGCHLD,
];

/// Interactive-shell startup: route the interesting signals into the
/// pending bitmap and ignore the job-control stoppers.
pub fn install_interactive_handlers() -> Result<(), nix::errno::Errno> {
    for signal in [
        Signal::SIGINT,
        Signal::SIGTERM,
        Signal::SIGHUP,
        Signal::SIGCHLD,
        Signal::SIGWINCH,
    ] {
        catch(signal)?;
    }
    for signal in JOB_CONTROL_SIGNALS {
        ignore(signal)?;
    }
    Ok(())
}

/// Resets dispositions in a forked child, before exec.
pub fn prepare_child() {
    for signal in CHILD_RESET_SIGNALS {
        let _ = default(signal);
    }
}

/// Atomically takes all pending signals, most urgent first.
///
/// The precedence is SIGTERM, SIGHUP, SIGINT, SIGCHLD, then ascending
/// signal number.
#[must_use]
pub fn take_pending() -> Vec<Signal> {
    let bits = PENDING.swap(0, Ordering::Relaxed);
    decode(bits)
}

/// Whether any signal is pending, without consuming it.
#[must_use]
pub fn any_pending() -> bool {
    PENDING.load(Ordering::Relaxed) != 0
}

/// Discards all pending signals.
pub fn clear_pending() {
    PENDING.store(0, Ordering::Relaxed);
}

/// Re-flags a signal, e.g. when a drained signal cannot be handled yet.
pub fn repost(signal: Signal) {
    PENDING.fetch_or(1 << signal as c_int, Ordering::Relaxed);
}

fn decode(bits: u64) -> Vec<Signal> {
    const PRECEDENCE: [Signal; 4] = [
        Signal::SIGTERM,
        Signal::SIGHUP,
        Signal::SIGINT,
        Signal::SIGCHLD,
    ];
    let mut result = Vec::new();
    let mut bits = bits;
    for signal in PRECEDENCE {
        let bit = 1 << signal as c_int;
        if bits & bit != 0 {
            bits &= !bit;
            result.push(signal);
        }
    }
    for signo in 1..64 {
        if bits & (1 << signo) != 0 {
            if let Ok(signal) = Signal::try_from(signo as c_int) {
                result.push(signal);
            }
        }
    }
    result
}

/// Parses a signal by name (with or without `SIG`, any case) or number.
#[must_use]
pub fn parse_signal(s: &str) -> Option<Signal> {
    if let Ok(number) = s.parse::<c_int>() {
        return Signal::try_from(number).ok();
    }
    let upper = s.to_ascii_uppercase();
    let name = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    name.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_orders_by_precedence() {
        let bits = (1u64 << Signal::SIGINT as c_int)
            | (1 << Signal::SIGTERM as c_int)
            | (1 << Signal::SIGCHLD as c_int)
            | (1 << Signal::SIGHUP as c_int)
            | (1 << Signal::SIGWINCH as c_int);
        let order = decode(bits);
        assert_eq!(
            order[..4],
            [
                Signal::SIGTERM,
                Signal::SIGHUP,
                Signal::SIGINT,
                Signal::SIGCHLD
            ]
        );
        assert!(order.contains(&Signal::SIGWINCH));
    }

    // One test for the global bitmap: parallel tests must not share it.
    #[test]
    fn pending_bitmap_lifecycle() {
        clear_pending();
        catch_signal(Signal::SIGCHLD as c_int);
        assert!(any_pending());
        assert_eq!(take_pending(), [Signal::SIGCHLD]);
        assert!(!any_pending());
        assert_eq!(take_pending(), []);

        repost(Signal::SIGINT);
        assert_eq!(take_pending(), [Signal::SIGINT]);
    }

    #[test]
    fn parse_signal_forms() {
        assert_eq!(parse_signal("TERM"), Some(Signal::SIGTERM));
        assert_eq!(parse_signal("sigterm"), Some(Signal::SIGTERM));
        assert_eq!(parse_signal("9"), Some(Signal::SIGKILL));
        assert_eq!(parse_signal("INT"), Some(Signal::SIGINT));
        assert_eq!(parse_signal("WOMBAT"), None);
        assert_eq!(parse_signal("0"), None);
    }
}
