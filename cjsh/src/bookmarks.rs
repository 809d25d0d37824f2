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

//! Directory bookmarks
//!
//! Stored as pipe-delimited text, one bookmark per line:
//!
//! ```text
//! name|path|access_count|added_iso8601|last_accessed_iso8601
//! ```
//!
//! Blank lines and `#` comments are ignored; malformed lines are
//! skipped rather than refused. Saving rewrites the file atomically
//! through a temporary file in the same directory.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// One bookmarked directory
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bookmark {
    pub name: String,
    pub path: PathBuf,
    pub access_count: u64,
    pub added: String,
    pub last_accessed: String,
}

/// The bookmark collection
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BookmarkDatabase {
    entries: Vec<Bookmark>,
}

impl BookmarkDatabase {
    /// Parses the pipe-delimited text format.
    #[must_use]
    pub fn parse(text: &str) -> BookmarkDatabase {
        let entries = text
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
            .filter_map(|line| {
                let mut parts = line.splitn(5, '|');
                let name = parts.next()?.to_string();
                let path = PathBuf::from(parts.next()?);
                let access_count = parts.next()?.parse().ok()?;
                let added = parts.next()?.to_string();
                let last_accessed = parts.next()?.to_string();
                if name.is_empty() {
                    return None;
                }
                Some(Bookmark {
                    name,
                    path,
                    access_count,
                    added,
                    last_accessed,
                })
            })
            .collect();
        BookmarkDatabase { entries }
    }

    /// Serializes back to the file format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::from("# cjsh bookmarks\n");
        for bookmark in &self.entries {
            text.push_str(&format!(
                "{}|{}|{}|{}|{}\n",
                bookmark.name,
                bookmark.path.display(),
                bookmark.access_count,
                bookmark.added,
                bookmark.last_accessed,
            ));
        }
        text
    }

    /// Loads from a file; a missing file is an empty database.
    #[must_use]
    pub fn load(path: &Path) -> BookmarkDatabase {
        match std::fs::read_to_string(path) {
            Ok(text) => BookmarkDatabase::parse(&text),
            Err(_) => BookmarkDatabase::default(),
        }
    }

    /// Saves atomically: write a temporary file, then rename over.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        use std::io::Write as _;
        file.write_all(self.to_text().as_bytes())?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Looks a bookmark up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Bookmark> {
        self.entries.iter().find(|b| b.name == name)
    }

    /// Adds or replaces a bookmark.
    pub fn add(&mut self, name: &str, path: PathBuf) {
        let now = iso8601_now();
        self.entries.retain(|b| b.name != name);
        self.entries.push(Bookmark {
            name: name.to_string(),
            path,
            access_count: 0,
            added: now.clone(),
            last_accessed: now,
        });
    }

    /// Removes a bookmark; returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|b| b.name != name);
        self.entries.len() != before
    }

    /// Records an access: bumps the counter and the timestamp.
    pub fn touch(&mut self, name: &str) -> Option<&Bookmark> {
        let bookmark = self.entries.iter_mut().find(|b| b.name == name)?;
        bookmark.access_count += 1;
        bookmark.last_accessed = iso8601_now();
        Some(bookmark)
    }

    /// All bookmarks, in file order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Bookmark> {
        self.entries.iter()
    }
}

/// The current time as `YYYY-MM-DDTHH:MM:SSZ`.
#[must_use]
pub fn iso8601_now() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    iso8601_from_epoch(seconds)
}

/// Formats seconds since the epoch as UTC ISO 8601.
#[must_use]
pub fn iso8601_from_epoch(seconds: u64) -> String {
    let days = seconds / 86_400;
    let remainder = seconds % 86_400;
    let (year, month, day) = civil_from_days(days as i64);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        remainder / 3600,
        remainder % 3600 / 60,
        remainder % 60,
    )
}

/// Gregorian date from days since 1970-01-01 (Howard Hinnant's civil
/// calendar algorithm).
fn civil_from_days(days: i64) -> (i64, u64, u64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}
