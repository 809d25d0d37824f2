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

//! Function definitions
//!
//! Functions live in one process-wide table. A definition executed in a
//! forked subshell mutates only the subshell's copied table, so nothing
//! leaks back to the parent.

use cjsh_syntax::source::Location;
use cjsh_syntax::syntax::FullCompoundCommand;
use std::collections::HashMap;
use std::rc::Rc;

/// A defined function
#[derive(Clone, Debug)]
pub struct Function {
    /// Name the function is called by
    pub name: String,
    /// Body, shared with the AST it was defined by
    pub body: Rc<FullCompoundCommand>,
    /// Where the function was defined, for diagnostics
    pub origin: Location,
}

/// Collection of defined functions
#[derive(Clone, Debug, Default)]
pub struct FunctionSet {
    functions: HashMap<String, Rc<Function>>,
}

impl FunctionSet {
    /// Looks up a function by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<Function>> {
        self.functions.get(name)
    }

    /// Defines or replaces a function.
    pub fn define(&mut self, function: Function) {
        self.functions
            .insert(function.name.clone(), Rc::new(function));
    }

    /// Removes a function definition.
    ///
    /// Returns whether the function existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    /// Number of defined functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no function is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Iterates over definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Function>> {
        let mut entries: Vec<&Rc<Function>> = self.functions.values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.into_iter()
    }
}
