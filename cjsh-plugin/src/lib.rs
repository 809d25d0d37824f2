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

//! Native plugin ABI boundary
//!
//! Plugins are shared libraries loaded with `dlopen`, speaking a stable
//! C ABI at interface version [`INTERFACE_VERSION`]. This crate defines
//! the `#[repr(C)]` mirror of that ABI ([`abi`]), the loader with its
//! validation rules ([`loader`]), and the event names the shell emits
//! to subscribed plugins ([`events`]).
//!
//! A plugin is rejected when its `interface_version` differs from the
//! shell's, when its machine architecture does not match the host
//! (x86_64 under Rosetta on arm64 macOS being the one exception), or
//! when a required symbol is missing. Every allocation a plugin hands
//! to the shell is released by calling the plugin's own
//! `plugin_free_memory`, so both sides always use the same allocator.

pub mod abi;
pub mod events;
pub mod loader;

/// The plugin interface version this shell speaks.
///
/// Loading rejects any plugin whose reported version differs, exactly.
pub const INTERFACE_VERSION: i32 = 3;

/// Symbols every plugin must export.
pub const REQUIRED_SYMBOLS: [&str; 9] = [
    "plugin_get_info",
    "plugin_initialize",
    "plugin_shutdown",
    "plugin_handle_command",
    "plugin_get_commands",
    "plugin_get_subscribed_events",
    "plugin_get_default_settings",
    "plugin_update_setting",
    "plugin_free_memory",
];

/// Optional symbols probed but not required.
pub const OPTIONAL_SYMBOLS: [&str; 1] = ["plugin_validate"];
