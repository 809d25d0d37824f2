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

//! Plugin loading and validation
//!
//! Loading checks, in order: the library's machine architecture against
//! the host, `dlopen` itself, the required symbol set, the exact
//! interface version, and the plugin's optional self-validation. A
//! plugin failing any check is unloaded again and never initialized.

use crate::abi::{self, owned_string};
use crate::{INTERFACE_VERSION, REQUIRED_SYMBOLS};
use std::ffi::{c_char, c_int, c_void, CString};
use std::path::Path;
use thiserror::Error;

/// Why a plugin was rejected
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum LoadError {
    #[error("cannot read plugin: {0}")]
    Unreadable(String),
    #[error("architecture mismatch (plugin: {plugin}, system: {host})")]
    ArchitectureMismatch { plugin: String, host: String },
    #[error("cannot load plugin: {0}")]
    DlOpen(String),
    #[error("plugin lacks required symbol `{0}`")]
    MissingSymbol(&'static str),
    #[error("plugin_get_info returned nothing")]
    InfoUnavailable,
    #[error("interface version {found} does not match required version {expected}")]
    VersionMismatch { found: i32, expected: i32 },
    #[error("plugin failed self-validation: {0}")]
    Validation(String),
    #[error("plugin_initialize failed with code {0}")]
    InitializeFailed(i32),
}

/// Copied-out plugin identification
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Info {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub interface_version: i32,
}

#[derive(Debug)]
struct Symbols {
    initialize: abi::InitializeFn,
    shutdown: abi::ShutdownFn,
    handle_command: abi::HandleCommandFn,
    get_commands: abi::GetStringListFn,
    get_subscribed_events: abi::GetStringListFn,
    get_default_settings: abi::GetSettingsFn,
    update_setting: abi::UpdateSettingFn,
    free_memory: abi::FreeMemoryFn,
}

/// A loaded, validated plugin
#[derive(Debug)]
pub struct Plugin {
    handle: *mut c_void,
    symbols: Symbols,
    /// Identification copied out of the plugin
    pub info: Info,
    initialized: bool,
}

fn dlerror_message() -> String {
    let message = unsafe { libc::dlerror() };
    unsafe { owned_string(message) }.unwrap_or_else(|| "unknown dlopen error".to_string())
}

unsafe fn symbol<T: Copy>(
    handle: *mut c_void,
    name: &'static str,
) -> Result<T, LoadError> {
    let c_name = CString::new(name).unwrap_or_default();
    let address = libc::dlsym(handle, c_name.as_ptr());
    if address.is_null() {
        return Err(LoadError::MissingSymbol(name));
    }
    debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*mut c_void>());
    Ok(std::mem::transmute_copy(&address))
}

impl Plugin {
    /// Loads and validates a plugin, without initializing it.
    pub fn load(path: &Path) -> Result<Plugin, LoadError> {
        check_architecture(path)?;

        let c_path = CString::new(path.as_os_str().as_encoded_bytes().to_vec())
            .map_err(|_| LoadError::Unreadable("path contains NUL".to_string()))?;
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(LoadError::DlOpen(dlerror_message()));
        }

        let plugin = unsafe { Plugin::resolve(handle) };
        match plugin {
            Ok(plugin) => Ok(plugin),
            Err(error) => {
                unsafe { libc::dlclose(handle) };
                Err(error)
            }
        }
    }

    unsafe fn resolve(handle: *mut c_void) -> Result<Plugin, LoadError> {
        // Probe every required symbol before calling any of them, so
        // the rejection message names the first gap.
        let get_info: abi::GetInfoFn = symbol(handle, REQUIRED_SYMBOLS[0])?;
        let symbols = Symbols {
            initialize: symbol(handle, "plugin_initialize")?,
            shutdown: symbol(handle, "plugin_shutdown")?,
            handle_command: symbol(handle, "plugin_handle_command")?,
            get_commands: symbol(handle, "plugin_get_commands")?,
            get_subscribed_events: symbol(handle, "plugin_get_subscribed_events")?,
            get_default_settings: symbol(handle, "plugin_get_default_settings")?,
            update_setting: symbol(handle, "plugin_update_setting")?,
            free_memory: symbol(handle, "plugin_free_memory")?,
        };

        let raw_info = get_info();
        if raw_info.is_null() {
            return Err(LoadError::InfoUnavailable);
        }
        let raw_info = &*raw_info;
        if raw_info.interface_version != INTERFACE_VERSION {
            return Err(LoadError::VersionMismatch {
                found: raw_info.interface_version,
                expected: INTERFACE_VERSION,
            });
        }
        // The info struct stays owned by the plugin; only copy it.
        let info = Info {
            name: owned_string(raw_info.name).unwrap_or_default(),
            version: owned_string(raw_info.version).unwrap_or_default(),
            description: owned_string(raw_info.description).unwrap_or_default(),
            author: owned_string(raw_info.author).unwrap_or_default(),
            interface_version: raw_info.interface_version,
        };

        // Optional self-validation.
        let validate: Result<abi::ValidateFn, _> = symbol(handle, "plugin_validate");
        if let Ok(validate) = validate {
            let validation = validate();
            if validation.status != abi::PluginError::Success {
                let message = owned_string(validation.error_message)
                    .unwrap_or_else(|| "no details".to_string());
                if !validation.error_message.is_null() {
                    (symbols.free_memory)(validation.error_message.cast());
                }
                return Err(LoadError::Validation(message));
            }
        }

        Ok(Plugin {
            handle,
            symbols,
            info,
            initialized: false,
        })
    }

    /// Runs `plugin_initialize`.
    pub fn initialize(&mut self) -> Result<(), LoadError> {
        let code = unsafe { (self.symbols.initialize)() };
        if code != 0 {
            return Err(LoadError::InitializeFailed(code));
        }
        self.initialized = true;
        Ok(())
    }

    /// Copies out a plugin-allocated string list and frees it through
    /// the plugin's allocator.
    unsafe fn string_list(&self, get: abi::GetStringListFn) -> Vec<String> {
        let mut count: c_int = 0;
        let list = get(&mut count);
        if list.is_null() || count <= 0 {
            return Vec::new();
        }
        let mut result = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let item = *list.add(i);
            if let Some(value) = owned_string(item) {
                result.push(value);
            }
            (self.symbols.free_memory)(item.cast());
        }
        (self.symbols.free_memory)(list.cast());
        result
    }

    /// Commands the plugin provides.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        unsafe { self.string_list(self.symbols.get_commands) }
    }

    /// Events the plugin wants to receive.
    #[must_use]
    pub fn subscribed_events(&self) -> Vec<String> {
        unsafe { self.string_list(self.symbols.get_subscribed_events) }
    }

    /// The plugin's default settings.
    #[must_use]
    pub fn default_settings(&self) -> Vec<(String, String)> {
        unsafe {
            let mut count: c_int = 0;
            let settings = (self.symbols.get_default_settings)(&mut count);
            if settings.is_null() || count <= 0 {
                return Vec::new();
            }
            let mut result = Vec::with_capacity(count as usize);
            for i in 0..count as usize {
                let setting = *settings.add(i);
                let key = owned_string(setting.key).unwrap_or_default();
                let value = owned_string(setting.value).unwrap_or_default();
                (self.symbols.free_memory)(setting.key.cast());
                (self.symbols.free_memory)(setting.value.cast());
                result.push((key, value));
            }
            (self.symbols.free_memory)(settings.cast());
            result
        }
    }

    /// Pushes a setting change into the plugin.
    pub fn update_setting(&self, key: &str, value: &str) -> i32 {
        let (Ok(key), Ok(value)) = (CString::new(key), CString::new(value)) else {
            return abi::PluginError::InvalidArgs as i32;
        };
        unsafe { (self.symbols.update_setting)(key.as_ptr(), value.as_ptr()) }
    }

    /// Runs one of the plugin's commands.
    pub fn handle_command(&self, args: &[String]) -> i32 {
        let storage: Vec<CString> = args
            .iter()
            .map(|a| CString::new(a.as_str()).unwrap_or_default())
            .collect();
        let mut pointers: Vec<*mut c_char> = storage
            .iter()
            .map(|s| s.as_ptr().cast_mut())
            .collect();
        pointers.push(std::ptr::null_mut());
        let mut abi_args = abi::PluginArgs {
            args: pointers.as_mut_ptr(),
            count: args.len() as c_int,
            position: 0,
        };
        unsafe { (self.symbols.handle_command)(&mut abi_args) }
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        unsafe {
            if self.initialized {
                (self.symbols.shutdown)();
            }
            libc::dlclose(self.handle);
        }
    }
}

/// Machine architecture of the running shell, normalized.
#[must_use]
pub fn host_architecture() -> String {
    let mut info: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut info) } != 0 {
        return "unknown".to_string();
    }
    let machine = unsafe { owned_string(info.machine.as_ptr()) }.unwrap_or_default();
    normalize_architecture(&machine)
}

/// Collapses equivalent machine names.
#[must_use]
pub fn normalize_architecture(machine: &str) -> String {
    match machine {
        "x86_64" | "amd64" => "x86_64".to_string(),
        "arm64" | "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// Whether a plugin built for `plugin` may load on `host`.
///
/// Exact matches load; on macOS an x86_64 plugin also loads on an
/// arm64 host through Rosetta.
#[must_use]
pub fn architecture_compatible(plugin: &str, host: &str) -> bool {
    if plugin == host || plugin == "unknown" || host == "unknown" {
        return true;
    }
    cfg!(target_os = "macos") && plugin == "x86_64" && host == "arm64"
}

/// Reads the plugin file's machine architecture.
fn check_architecture(path: &Path) -> Result<(), LoadError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => return Err(LoadError::Unreadable(error.to_string())),
    };
    let Some(plugin_arch) = file_architecture(&bytes) else {
        // Unknown container: let dlopen produce its own diagnosis.
        return Ok(());
    };
    let host = host_architecture();
    if architecture_compatible(&plugin_arch, &host) {
        Ok(())
    } else {
        Err(LoadError::ArchitectureMismatch {
            plugin: plugin_arch,
            host,
        })
    }
}

/// Machine architecture recorded in an ELF or Mach-O header.
#[must_use]
pub fn file_architecture(bytes: &[u8]) -> Option<String> {
    // ELF: magic then e_machine at offset 18, little-endian.
    if bytes.len() >= 20 && bytes.starts_with(&[0x7f, b'E', b'L', b'F']) {
        let machine = u16::from_le_bytes([bytes[18], bytes[19]]);
        return Some(match machine {
            62 => "x86_64".to_string(),
            183 => "arm64".to_string(),
            other => format!("elf-machine-{other}"),
        });
    }
    // Mach-O 64-bit: magic 0xfeedfacf, cputype at offset 4.
    if bytes.len() >= 8 && bytes[..4] == 0xfeed_facfu32.to_le_bytes() {
        let cputype = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        return Some(match cputype {
            0x0100_0007 => "x86_64".to_string(),
            0x0100_000c => "arm64".to_string(),
            other => format!("macho-cputype-{other:#x}"),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture_normalization() {
        assert_eq!(normalize_architecture("amd64"), "x86_64");
        assert_eq!(normalize_architecture("aarch64"), "arm64");
        assert_eq!(normalize_architecture("riscv64"), "riscv64");
    }

    #[test]
    fn compatibility_requires_exact_match() {
        assert!(architecture_compatible("x86_64", "x86_64"));
        assert!(architecture_compatible("arm64", "arm64"));
        assert!(!architecture_compatible("arm64", "x86_64"));
        #[cfg(not(target_os = "macos"))]
        assert!(!architecture_compatible("x86_64", "arm64"));
        #[cfg(target_os = "macos")]
        assert!(architecture_compatible("x86_64", "arm64"));
    }

    #[test]
    fn elf_header_parsing() {
        let mut header = vec![0u8; 20];
        header[..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
        header[18] = 62;
        assert_eq!(file_architecture(&header).as_deref(), Some("x86_64"));
        header[18] = 183;
        assert_eq!(file_architecture(&header).as_deref(), Some("arm64"));
        assert_eq!(file_architecture(b"not an object"), None);
    }

    #[test]
    fn macho_header_parsing() {
        let mut header = vec![0u8; 8];
        header[..4].copy_from_slice(&0xfeed_facfu32.to_le_bytes());
        header[4..8].copy_from_slice(&0x0100_000cu32.to_le_bytes());
        assert_eq!(file_architecture(&header).as_deref(), Some("arm64"));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let error = Plugin::load(Path::new("/no/such/plugin.so")).unwrap_err();
        assert_matches::assert_matches!(error, LoadError::Unreadable(_));
    }

    #[test]
    fn non_library_file_fails_dlopen() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"just text, not a library").unwrap();
        let error = Plugin::load(file.path()).unwrap_err();
        assert_matches::assert_matches!(error, LoadError::DlOpen(_));
    }

    #[test]
    fn host_architecture_is_normalized() {
        let host = host_architecture();
        assert_eq!(host, normalize_architecture(&host));
    }
}
