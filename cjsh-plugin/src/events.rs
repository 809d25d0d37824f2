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

//! Event names the shell emits to subscribed plugins

/// Before the main loop starts processing
pub const MAIN_PROCESS_PRE_RUN: &str = "main_process_pre_run";
/// At the top of each main-loop iteration
pub const MAIN_PROCESS_START: &str = "main_process_start";
/// A command line is about to be processed; the payload is the raw text
pub const MAIN_PROCESS_COMMAND_PROCESS: &str = "main_process_command_process";
/// At the bottom of each main-loop iteration
pub const MAIN_PROCESS_END: &str = "main_process_end";
/// The shell is exiting
pub const MAIN_PROCESS_EXIT: &str = "main_process_exit";
/// A plugin was enabled
pub const PLUGIN_ENABLED: &str = "plugin_enabled";
/// A plugin was disabled
pub const PLUGIN_DISABLED: &str = "plugin_disabled";

/// All event names, for subscription validation.
pub const ALL: [&str; 7] = [
    MAIN_PROCESS_PRE_RUN,
    MAIN_PROCESS_START,
    MAIN_PROCESS_COMMAND_PROCESS,
    MAIN_PROCESS_END,
    MAIN_PROCESS_EXIT,
    PLUGIN_ENABLED,
    PLUGIN_DISABLED,
];

/// Whether a name is a known event.
#[must_use]
pub fn is_known(name: &str) -> bool {
    ALL.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_events() {
        assert!(is_known("main_process_exit"));
        assert!(is_known("plugin_enabled"));
        assert!(!is_known("wombat_event"));
    }
}
