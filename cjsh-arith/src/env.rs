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

//! Variable environment interface

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

/// Interface for variable access during evaluation
///
/// The crate stores no variables of its own; the caller supplies the
/// storage. The shell implements this on its variable manager so that
/// arithmetic reads and writes go through the ordinary scoping rules
/// (a readonly violation surfaces as `Self::Error`).
pub trait Env {
    /// Error returned by variable access
    type Error;

    /// Returns the value of the named variable, or `None` if unset.
    fn get_variable(&self, name: &str) -> Result<Option<&str>, Self::Error>;

    /// Assigns a new value to the named variable.
    fn assign_variable(&mut self, name: &str, value: String) -> Result<(), Self::Error>;
}

impl Env for HashMap<String, String> {
    type Error = Infallible;

    fn get_variable(&self, name: &str) -> Result<Option<&str>, Infallible> {
        Ok(self.get(name).map(String::as_str))
    }

    fn assign_variable(&mut self, name: &str, value: String) -> Result<(), Infallible> {
        self.insert(name.to_owned(), value);
        Ok(())
    }
}

impl Env for BTreeMap<String, String> {
    type Error = Infallible;

    fn get_variable(&self, name: &str) -> Result<Option<&str>, Infallible> {
        Ok(self.get(name).map(String::as_str))
    }

    fn assign_variable(&mut self, name: &str, value: String) -> Result<(), Infallible> {
        self.insert(name.to_owned(), value);
        Ok(())
    }
}
