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

//! Shell variables and scopes
//!
//! Variables live in a base table plus a stack of local contexts, one
//! per active function call. Reads walk from the innermost context
//! outward; writes go to the innermost context that already holds the
//! name locally, or to the base table. Each context also owns the
//! positional parameters of its function call.
//!
//! The process environment is imported once at startup; the exported
//! subset of the table is converted back to an `environ` array whenever
//! a child is executed, so no `setenv` bookkeeping is needed when
//! contexts pop.

use std::collections::HashMap;
use std::ffi::CString;
use thiserror::Error;

/// Attempt to write or unset a readonly variable
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("readonly variable `{name}` cannot be modified")]
pub struct ReadOnlyError {
    /// Name of the variable
    pub name: String,
}

/// Where an assignment puts the variable
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Scope {
    /// The innermost context holding the name, or the base table
    Shell,
    /// The innermost context, creating a local variable
    ///
    /// Requires an active context; assignment falls back to the base
    /// table at the top level, matching `local` outside a function being
    /// rejected earlier by the built-in.
    Local,
    /// Like `Shell`, additionally marking the variable exported
    Export,
}

/// A shell variable
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Variable {
    /// Value; `None` for a variable that has attributes but no value
    /// (e.g. `readonly x` before any assignment)
    pub value: Option<String>,
    /// Whether the variable is passed to child processes
    pub exported: bool,
    /// Whether writes and unsets are rejected
    pub read_only: bool,
}

impl Variable {
    /// Creates a plain variable with the given value.
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Variable {
        Variable {
            value: Some(value.into()),
            exported: false,
            read_only: false,
        }
    }

    /// Creates an exported variable with the given value.
    #[must_use]
    pub fn exported(value: impl Into<String>) -> Variable {
        Variable {
            value: Some(value.into()),
            exported: true,
            read_only: false,
        }
    }
}

/// Local variable context of one function call
#[derive(Clone, Debug, Default)]
struct Context {
    locals: HashMap<String, Variable>,
    positional: Vec<String>,
}

/// The variable table
#[derive(Clone, Debug, Default)]
pub struct VariableSet {
    base: HashMap<String, Variable>,
    contexts: Vec<Context>,
    base_positional: Vec<String>,
}

impl VariableSet {
    /// Imports the process environment into the base table.
    ///
    /// Every imported variable is marked exported.
    pub fn import_environ(&mut self) {
        for (name, value) in std::env::vars() {
            self.base.insert(name, Variable::exported(value));
        }
    }

    /// Finds a variable, innermost context first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.contexts
            .iter()
            .rev()
            .find_map(|context| context.locals.get(name))
            .or_else(|| self.base.get(name))
    }

    /// Value of a variable, if set.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|var| var.value.as_deref())
    }

    /// Whether the variable exists (even without a value).
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|var| var.value.is_some())
    }

    /// Assigns a value, honoring scope and readonly attributes.
    ///
    /// Returns the previous value, if any.
    pub fn assign(
        &mut self,
        scope: Scope,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, ReadOnlyError> {
        let name = name.into();
        let value = value.into();
        if self.get(&name).is_some_and(|var| var.read_only) {
            return Err(ReadOnlyError { name });
        }

        let export = scope == Scope::Export;
        let context_index = match scope {
            Scope::Local => self.contexts.len().checked_sub(1),
            Scope::Shell | Scope::Export => self
                .contexts
                .iter()
                .rposition(|context| context.locals.contains_key(&name)),
        };
        let Some(index) = context_index else {
            return self.assign_base(name, value, export);
        };
        let slot = self.contexts[index].locals.entry(name).or_default();
        let old = slot.value.replace(value);
        slot.exported |= export;
        Ok(old)
    }

    fn assign_base(
        &mut self,
        name: String,
        value: String,
        export: bool,
    ) -> Result<Option<String>, ReadOnlyError> {
        let slot = self.base.entry(name).or_default();
        let old = slot.value.replace(value);
        slot.exported |= export;
        Ok(old)
    }

    /// Sets or clears a variable's exported flag, if it exists.
    pub fn set_exported(&mut self, name: &str, exported: bool) {
        if let Some(var) = self
            .contexts
            .iter_mut()
            .rev()
            .find_map(|context| context.locals.get_mut(name))
        {
            var.exported = exported;
            return;
        }
        if let Some(var) = self.base.get_mut(name) {
            var.exported = exported;
        }
    }

    /// Marks a variable exported, creating it valueless if absent.
    pub fn export(&mut self, name: &str) {
        if let Some(var) = self
            .contexts
            .iter_mut()
            .rev()
            .find_map(|context| context.locals.get_mut(name))
        {
            var.exported = true;
            return;
        }
        self.base.entry(name.to_string()).or_default().exported = true;
    }

    /// Marks a variable readonly, creating it valueless if absent.
    ///
    /// The attribute survives until the process exits.
    pub fn mark_readonly(&mut self, name: &str) {
        if let Some(var) = self
            .contexts
            .iter_mut()
            .rev()
            .find_map(|context| context.locals.get_mut(name))
        {
            var.read_only = true;
            return;
        }
        self.base.entry(name.to_string()).or_default().read_only = true;
    }

    /// Removes a variable from the innermost scope containing it.
    pub fn unset(&mut self, name: &str) -> Result<(), ReadOnlyError> {
        if self.get(name).is_some_and(|var| var.read_only) {
            return Err(ReadOnlyError {
                name: name.to_string(),
            });
        }
        for context in self.contexts.iter_mut().rev() {
            if context.locals.remove(name).is_some() {
                return Ok(());
            }
        }
        self.base.remove(name);
        Ok(())
    }

    /// Pushes a local context owning the given positional parameters.
    pub fn push_context(&mut self, positional: Vec<String>) {
        self.contexts.push(Context {
            locals: HashMap::new(),
            positional,
        });
    }

    /// Pops the most recent context.
    ///
    /// Locals disappear; any base binding they shadowed becomes visible
    /// again, including its exported state.
    pub fn pop_context(&mut self) {
        let popped = self.contexts.pop();
        debug_assert!(popped.is_some(), "unbalanced pop_context");
    }

    /// Number of active local contexts.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Positional parameters of the innermost context, or the shell's.
    #[must_use]
    pub fn positional_params(&self) -> &[String] {
        self.contexts
            .last()
            .map_or(&self.base_positional, |context| &context.positional)
    }

    /// Replaces the positional parameters (`set -- …`).
    pub fn set_positional_params(&mut self, params: Vec<String>) {
        match self.contexts.last_mut() {
            Some(context) => context.positional = params,
            None => self.base_positional = params,
        }
    }

    /// Drops the first `count` positional parameters (`shift`).
    ///
    /// Returns false (leaving the parameters alone) if there are fewer
    /// than `count` of them.
    pub fn shift_positional_params(&mut self, count: usize) -> bool {
        let params = match self.contexts.last_mut() {
            Some(context) => &mut context.positional,
            None => &mut self.base_positional,
        };
        if count > params.len() {
            return false;
        }
        params.drain(..count);
        true
    }

    /// Builds the `environ` array for a child process from the exported
    /// variables currently visible.
    #[must_use]
    pub fn environ(&self) -> Vec<CString> {
        let mut seen: HashMap<&str, &Variable> = HashMap::new();
        for context in &self.contexts {
            for (name, var) in &context.locals {
                seen.insert(name, var);
            }
        }
        for (name, var) in &self.base {
            seen.entry(name).or_insert(var);
        }
        let mut environ: Vec<CString> = seen
            .into_iter()
            .filter(|(_, var)| var.exported)
            .filter_map(|(name, var)| {
                let value = var.value.as_deref()?;
                CString::new(format!("{name}={value}")).ok()
            })
            .collect();
        environ.sort();
        environ
    }

    /// Iterates over all visible variables, innermost binding first.
    pub fn iter_visible(&self) -> impl Iterator<Item = (&str, &Variable)> {
        let mut seen: HashMap<&str, &Variable> = HashMap::new();
        for context in &self.contexts {
            for (name, var) in &context.locals {
                seen.insert(name, var);
            }
        }
        for (name, var) in &self.base {
            seen.entry(name).or_insert(var);
        }
        let mut entries: Vec<(&str, &Variable)> = seen.into_iter().collect();
        entries.sort_by_key(|&(name, _)| name);
        entries.into_iter()
    }
}
