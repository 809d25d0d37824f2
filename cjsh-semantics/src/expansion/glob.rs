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

//! Pathname expansion
//!
//! A field containing unquoted `*`, `?`, or `[` is matched against the
//! filesystem, one slash-separated component at a time. A field with no
//! match stays literal unless `nullglob` is on, in which case it
//! vanishes. `**` crosses directory boundaries when `globstar` is on.
//! Quoted characters match themselves and an initial period must be
//! matched literally.

use super::attr::AttrChar;
use super::quote_removal;
use cjsh_env::option::Option::{Glob, GlobStar, NullGlob};
use cjsh_env::semantics::Field;
use cjsh_env::Env;
use cjsh_fnmatch::{Config, Pattern, PatternChar};
use cjsh_syntax::source::Location;
use std::path::{Path, PathBuf};

/// Whether the character acts as a pattern character here.
fn is_pattern_char(c: &AttrChar) -> bool {
    !c.is_quoted
        && c.origin != super::attr::Origin::HardExpansion
        && matches!(c.value, '*' | '?' | '[')
}

fn to_pattern_char(c: &AttrChar) -> PatternChar {
    if c.is_quoted || c.origin == super::attr::Origin::HardExpansion {
        PatternChar::Literal(c.value)
    } else {
        PatternChar::Normal(c.value)
    }
}

/// Expands one field, returning its pathname matches or the field
/// itself.
#[must_use]
pub fn expand(env: &Env, chars: Vec<AttrChar>, origin: &Location) -> Vec<Field> {
    if !env.options.is_on(Glob) || !chars.iter().any(is_pattern_char) {
        return vec![quote_removal::to_field(&chars, origin)];
    }

    let globstar = env.options.is_on(GlobStar);
    let absolute = chars.first().is_some_and(|c| c.value == '/');
    let components: Vec<&[AttrChar]> = chars.split(|c| c.value == '/').collect();

    let start: PathBuf = if absolute {
        PathBuf::from("/")
    } else {
        PathBuf::from(".")
    };
    let mut results = Vec::new();
    let components: Vec<&[AttrChar]> = components
        .into_iter()
        .skip_while(|c| c.is_empty())
        .collect();
    walk(&start, &components, absolute, globstar, &mut results);

    if results.is_empty() {
        if env.options.is_on(NullGlob) {
            Vec::new()
        } else {
            vec![quote_removal::to_field(&chars, origin)]
        }
    } else {
        let mut values: Vec<String> = results
            .into_iter()
            .map(|path| finish_path(&path, absolute))
            .collect();
        values.sort();
        values
            .into_iter()
            .map(|value| Field {
                value,
                origin: origin.clone(),
            })
            .collect()
    }
}

fn finish_path(path: &Path, absolute: bool) -> String {
    let text = path.to_string_lossy();
    if absolute {
        text.into_owned()
    } else {
        // Strip the synthetic leading `./`.
        text.strip_prefix("./").unwrap_or(&text).to_string()
    }
}

/// Matches the remaining components under `dir`.
fn walk(
    dir: &Path,
    components: &[&[AttrChar]],
    absolute: bool,
    globstar: bool,
    results: &mut Vec<PathBuf>,
) {
    let Some((component, rest)) = components.split_first() else {
        results.push(dir.to_path_buf());
        return;
    };

    // Trailing slash: the prefix must be a directory.
    if component.is_empty() && rest.is_empty() {
        if dir.is_dir() {
            let mut path = dir.to_path_buf();
            path.push("");
            results.push(path);
        }
        return;
    }
    if component.is_empty() {
        walk(dir, rest, absolute, globstar, results);
        return;
    }

    // `**` with globstar matches zero or more directories.
    if globstar && is_globstar(component) {
        walk(dir, rest, absolute, globstar, results);
        for entry in read_entries(dir) {
            let path = dir.join(&entry);
            if path.is_dir() && !entry.starts_with('.') {
                walk(&path, components, absolute, globstar, results);
            }
        }
        return;
    }

    if !component.iter().any(is_pattern_char) {
        // Literal component: no directory scan, but it must exist when
        // it is the last one.
        let name: String = component.iter().map(|c| c.value).collect();
        let path = dir.join(&name);
        if rest.is_empty() {
            if path.symlink_metadata().is_ok() {
                results.push(path);
            }
        } else {
            walk(&path, rest, absolute, globstar, results);
        }
        return;
    }

    let mut config = Config::default();
    config.literal_initial_period = true;
    let Ok(pattern) = Pattern::parse(component.iter().map(to_pattern_char), &config) else {
        return;
    };
    for entry in read_entries(dir) {
        if !pattern.is_match(&entry) {
            continue;
        }
        let path = dir.join(&entry);
        if rest.is_empty() {
            results.push(path);
        } else if path.is_dir() {
            walk(&path, rest, absolute, globstar, results);
        }
    }
}

fn is_globstar(component: &[AttrChar]) -> bool {
    component.len() == 2
        && component
            .iter()
            .all(|c| c.value == '*' && !c.is_quoted)
}

fn read_entries(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::attr::Origin;
    use super::*;
    use cjsh_env::option::State;
    use std::fs;

    fn unquoted(s: &str) -> Vec<AttrChar> {
        s.chars().map(AttrChar::literal).collect()
    }

    // The working directory is process-global; serialize the tests
    // that change it.
    static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn in_tempdir<F: FnOnce(&mut Env)>(files: &[&str], f: F) {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let old = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        for file in files {
            if let Some(parent) = Path::new(file).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).unwrap();
                }
            }
            fs::write(file, "").unwrap();
        }
        let mut env = Env::new();
        f(&mut env);
        std::env::set_current_dir(old).unwrap();
    }

    fn glob_values(env: &Env, s: &str) -> Vec<String> {
        expand(env, unquoted(s), &Location::dummy(s))
            .into_iter()
            .map(|f| f.value)
            .collect()
    }

    #[test]
    fn plain_field_passes_through() {
        let env = Env::new();
        assert_eq!(glob_values(&env, "nofile*never/matches?"), ["nofile*never/matches?"]);
    }

    #[test]
    fn star_matches_files() {
        in_tempdir(&["a.rs", "b.rs", "c.txt"], |env| {
            assert_eq!(glob_values(env, "*.rs"), ["a.rs", "b.rs"]);
        });
    }

    #[test]
    fn question_and_brackets() {
        in_tempdir(&["a1", "a2", "b1"], |env| {
            assert_eq!(glob_values(env, "a?"), ["a1", "a2"]);
            assert_eq!(glob_values(env, "[ab]1"), ["a1", "b1"]);
        });
    }

    #[test]
    fn dotfiles_need_explicit_period() {
        in_tempdir(&[".hidden", "shown"], |env| {
            assert_eq!(glob_values(env, "*"), ["shown"]);
            assert_eq!(glob_values(env, ".h*"), [".hidden"]);
        });
    }

    #[test]
    fn directories_in_patterns() {
        in_tempdir(&["src/a.rs", "src/b.c", "doc/a.rs"], |env| {
            assert_eq!(glob_values(env, "*/a.rs"), ["doc/a.rs", "src/a.rs"]);
            assert_eq!(glob_values(env, "src/*.rs"), ["src/a.rs"]);
        });
    }

    #[test]
    fn no_match_keeps_literal_unless_nullglob() {
        in_tempdir(&["only"], |env| {
            assert_eq!(glob_values(env, "*.xyz"), ["*.xyz"]);
            env.options.set(NullGlob, State::On);
            assert_eq!(glob_values(env, "*.xyz"), Vec::<String>::new());
        });
    }

    #[test]
    fn noglob_suppresses_expansion() {
        in_tempdir(&["file"], |env| {
            env.options.set(Glob, State::Off);
            assert_eq!(glob_values(env, "*"), ["*"]);
        });
    }

    #[test]
    fn quoted_star_is_literal() {
        in_tempdir(&["x"], |env| {
            let chars = vec![AttrChar {
                value: '*',
                origin: Origin::Literal,
                is_quoted: true,
            }];
            let fields = expand(env, chars, &Location::dummy("'*'"));
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].value, "*");
        });
    }

    #[test]
    fn globstar_crosses_directories() {
        in_tempdir(&["a.rs", "src/b.rs", "src/deep/c.rs"], |env| {
            env.options.set(GlobStar, State::On);
            let mut values = glob_values(env, "**/*.rs");
            values.sort();
            assert_eq!(values, ["a.rs", "src/b.rs", "src/deep/c.rs"]);
        });
    }
}
