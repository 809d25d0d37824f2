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

//! `#[repr(C)]` mirror of the plugin ABI, interface version 3
//!
//! Layouts must match the C header shipped to plugin authors exactly.
//! All strings crossing the boundary are heap-allocated by the side
//! that produces them; anything the plugin returns to the shell is
//! released through the plugin's `plugin_free_memory`.

use std::ffi::{c_char, c_int, c_void, CStr};

/// Error codes returned by plugin functions
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PluginError {
    Success = 0,
    General = -1,
    InvalidArgs = -2,
    NotImplemented = -3,
    OutOfMemory = -4,
    NullPointer = -5,
}

/// Heap-allocated string buffer
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PluginString {
    /// NUL-terminated data, heap-allocated by the producer
    pub data: *mut c_char,
    /// Length excluding the NUL terminator
    pub length: c_int,
    /// Allocated capacity, reserved for future extensions
    pub capacity: c_int,
}

/// Key-value pair for plugin settings
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PluginSetting {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Arguments passed to `plugin_handle_command`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PluginArgs {
    /// NULL-terminated array of argument strings
    pub args: *mut *mut c_char,
    /// Number of arguments in the array
    pub count: c_int,
    /// Current processing position, 0 at entry
    pub position: c_int,
}

/// Identification returned by `plugin_get_info`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PluginInfo {
    pub name: *mut c_char,
    pub version: *mut c_char,
    pub description: *mut c_char,
    pub author: *mut c_char,
    /// Must equal [`crate::INTERFACE_VERSION`] exactly
    pub interface_version: c_int,
}

/// Result of the optional `plugin_validate`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PluginValidation {
    pub status: PluginError,
    /// Optional heap-allocated message
    pub error_message: *mut c_char,
}

/// `plugin_get_info`
pub type GetInfoFn = unsafe extern "C" fn() -> *mut PluginInfo;
/// `plugin_initialize`
pub type InitializeFn = unsafe extern "C" fn() -> c_int;
/// `plugin_shutdown`
pub type ShutdownFn = unsafe extern "C" fn();
/// `plugin_handle_command`
pub type HandleCommandFn = unsafe extern "C" fn(*mut PluginArgs) -> c_int;
/// `plugin_get_commands` / `plugin_get_subscribed_events`
pub type GetStringListFn = unsafe extern "C" fn(*mut c_int) -> *mut *mut c_char;
/// `plugin_get_default_settings`
pub type GetSettingsFn = unsafe extern "C" fn(*mut c_int) -> *mut PluginSetting;
/// `plugin_update_setting`
pub type UpdateSettingFn = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
/// `plugin_free_memory`
pub type FreeMemoryFn = unsafe extern "C" fn(*mut c_void);
/// `plugin_validate`
pub type ValidateFn = unsafe extern "C" fn() -> PluginValidation;

/// Copies a C string from the plugin side into owned Rust data.
///
/// # Safety
///
/// `ptr` must be NUL-terminated and valid for reads, or null.
#[must_use]
pub unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    // The layouts below are a wire contract with C plugins; these
    // assertions pin them on the build host.

    #[test]
    fn plugin_setting_is_two_pointers() {
        assert_eq!(size_of::<PluginSetting>(), 2 * size_of::<*mut c_char>());
    }

    #[test]
    fn plugin_error_is_c_int_sized() {
        assert_eq!(size_of::<PluginError>(), size_of::<c_int>());
    }

    #[test]
    fn plugin_info_layout() {
        assert_eq!(align_of::<PluginInfo>(), align_of::<*mut c_char>());
        // Four pointers plus a trailing int, padded to pointer alignment.
        #[cfg(target_pointer_width = "64")]
        assert_eq!(size_of::<PluginInfo>(), 40);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(size_of::<PluginInfo>(), 20);
    }

    #[test]
    fn owned_string_copies() {
        let source = std::ffi::CString::new("hello").unwrap();
        let copied = unsafe { owned_string(source.as_ptr()) };
        assert_eq!(copied.as_deref(), Some("hello"));
        assert_eq!(unsafe { owned_string(std::ptr::null()) }, None);
    }
}
