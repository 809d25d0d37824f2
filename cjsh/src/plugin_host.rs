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

//! Plugin hosting in the shell binary
//!
//! Loads the native plugins from the plugin directory at startup and
//! delivers the shell lifecycle events to subscribed plugins. The
//! command-table side of plugins belongs to the full plugin manager,
//! which is outside the shell core; this host covers the ABI boundary:
//! discovery, validation, initialization, events, and shutdown.

use cjsh_plugin::loader::Plugin;
use std::path::{Path, PathBuf};

/// Plugin directory, relative to `$HOME`
pub const PLUGIN_DIR: &str = ".cjsh/plugins";

struct Loaded {
    plugin: Plugin,
    events: Vec<String>,
}

/// The set of loaded plugins
#[derive(Default)]
pub struct PluginHost {
    plugins: Vec<Loaded>,
}

impl PluginHost {
    /// Loads every shared library in the plugin directory.
    ///
    /// Rejected plugins are reported to stderr and skipped; the shell
    /// starts regardless.
    #[must_use]
    pub fn load_dir(dir: &Path) -> PluginHost {
        let mut host = PluginHost::default();
        let Ok(entries) = std::fs::read_dir(dir) else {
            return host;
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("so" | "dylib")
                )
            })
            .collect();
        paths.sort();
        for path in paths {
            host.load_one(&path);
        }
        host
    }

    fn load_one(&mut self, path: &Path) {
        match Plugin::load(path) {
            Ok(mut plugin) => match plugin.initialize() {
                Ok(()) => {
                    let events = plugin.subscribed_events();
                    self.plugins.push(Loaded { plugin, events });
                }
                Err(error) => {
                    eprintln!("cjsh: plugin {}: {error}", path.display());
                }
            },
            Err(error) => {
                eprintln!("cjsh: plugin {}: {error}", path.display());
            }
        }
    }

    /// Number of loaded plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Delivers an event to every subscribed plugin.
    ///
    /// The payload (the raw command line for
    /// `main_process_command_process`) is passed as a second argument.
    pub fn emit(&self, event: &str, payload: Option<&str>) {
        for loaded in &self.plugins {
            if !loaded.events.iter().any(|e| e == event) {
                continue;
            }
            let mut args = vec![event.to_string()];
            if let Some(payload) = payload {
                args.push(payload.to_string());
            }
            let _ = loaded.plugin.handle_command(&args);
        }
    }
}
