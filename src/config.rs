//! Server configuration.
//!
//! The configuration record is created once at startup (from initialization
//! options or defaults) and treated as immutable for the lifetime of the
//! document store.

use serde::Deserialize;
use std::path::PathBuf;

/// Options recognized by the document store.
///
/// All paths are absolute. Unset options degrade the corresponding feature:
/// without `zig_exe_path` no build-file discovery is attempted, without
/// `zig_lib_path` the `"std"` import is unresolved.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute path to the `zig` executable.
    pub zig_exe_path: Option<PathBuf>,
    /// Absolute path to the build-runner source handed to `zig run`.
    pub build_runner_path: Option<PathBuf>,
    /// Cache directory passed to the build runner via `--cache-dir`.
    pub global_cache_path: Option<PathBuf>,
    /// Root of the standard library, used to resolve `@import("std")`.
    pub zig_lib_path: Option<PathBuf>,
    /// Fallback path for `@import("builtin")` when no build file overrides it.
    pub builtin_path: Option<PathBuf>,
}

impl Config {
    /// Whether build-file discovery should run at all.
    pub fn build_discovery_enabled(&self) -> bool {
        self.zig_exe_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disables_discovery() {
        let config = Config::default();
        assert!(!config.build_discovery_enabled());
        assert!(config.zig_lib_path.is_none());
    }

    #[test]
    fn test_config_from_json() {
        let config: Config = serde_json::from_str(
            r#"{"zig_exe_path": "/usr/bin/zig", "zig_lib_path": "/usr/lib/zig"}"#,
        )
        .unwrap();
        assert!(config.build_discovery_enabled());
        assert_eq!(config.zig_lib_path.unwrap(), PathBuf::from("/usr/lib/zig"));
        assert!(config.builtin_path.is_none());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let config: Config = serde_json::from_str(r#"{"enable_snippets": true}"#).unwrap();
        assert!(!config.build_discovery_enabled());
    }
}
