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

//! Command history storage
//!
//! One command per line. Lines starting with `#` are skipped on read,
//! writes append, and concurrent appends from other shells are
//! harmless: the file is only ever read once at startup and appended
//! afterwards.

use std::io::Write as _;
use std::path::PathBuf;

/// In-memory history backed by an append-only file
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    path: Option<PathBuf>,
}

impl History {
    /// Loads history from a file; a missing file is an empty history.
    #[must_use]
    pub fn load(path: PathBuf) -> History {
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        };
        History {
            entries,
            path: Some(path),
        }
    }

    /// Creates a history that never touches a file.
    #[must_use]
    pub fn in_memory() -> History {
        History::default()
    }

    /// Previous commands, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Records a command, appending to the file if one is configured.
    pub fn push(&mut self, line: &str) {
        let line = line.trim_end_matches('\n');
        if line.trim().is_empty() {
            return;
        }
        // Skip consecutive duplicates.
        if self.entries.last().is_some_and(|last| last == line) {
            return;
        }
        self.entries.push(line.to_string());
        if let Some(path) = &self.path {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path);
            if let Ok(mut file) = file {
                // A failed write loses one history line, nothing more.
                let _ = writeln!(file, "{line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_skips_comments_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        std::fs::write(&path, "# comment\necho one\n\necho two\n").unwrap();
        let history = History::load(path);
        assert_eq!(history.entries(), ["echo one", "echo two"]);
    }

    #[test]
    fn missing_file_is_empty() {
        let history = History::load(PathBuf::from("/no/such/history"));
        assert!(history.entries().is_empty());
    }

    #[test]
    fn push_appends_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let mut history = History::load(path.clone());
        history.push("first command");
        history.push("second command\n");
        drop(history);
        let reloaded = History::load(path);
        assert_eq!(reloaded.entries(), ["first command", "second command"]);
    }

    #[test]
    fn consecutive_duplicates_are_skipped() {
        let mut history = History::in_memory();
        history.push("same");
        history.push("same");
        history.push("different");
        history.push("same");
        assert_eq!(history.entries(), ["same", "different", "same"]);
    }

    #[test]
    fn blank_lines_are_not_recorded() {
        let mut history = History::in_memory();
        history.push("   ");
        history.push("");
        assert!(history.entries().is_empty());
    }

    #[test]
    fn tolerates_concurrent_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        let mut ours = History::load(path.clone());
        ours.push("from us");
        // Another shell appends behind our back.
        {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .unwrap();
            writeln!(file, "from them").unwrap();
        }
        ours.push("more from us");
        let reloaded = History::load(path);
        assert_eq!(
            reloaded.entries(),
            ["from us", "from them", "more from us"]
        );
    }
}
