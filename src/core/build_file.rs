//! Build descriptor loading.
//!
//! A build file (`build.zig`) describes package layout and include
//! directories. Executing it directly is not an option, so the store runs an
//! external build-runner program through the `zig` toolchain and reads the
//! descriptor off its stdout as JSON. An optional `zls.build.json` next to
//! the build file can override the builtin path and add build options.

use crate::config::Config;
use lsp_types::Uri;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Name of the optional side-config living next to a build file.
pub const SIDE_CONFIG_NAME: &str = "zls.build.json";

/// A package exported by a build file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Package {
    pub name: String,
    pub path: PathBuf,
}

/// The descriptor extracted from one build-runner invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub include_dirs: Vec<String>,
}

/// Optional adjunct configuration from `zls.build.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildAssociatedConfig {
    /// Builtin path relative to the build file's directory.
    #[serde(default)]
    pub relative_builtin_path: Option<String>,
    /// Extra arguments appended to the build-runner invocation.
    #[serde(default)]
    pub build_options: Option<Vec<String>>,
}

/// A build file known to the store.
#[derive(Debug)]
pub struct BuildFile {
    pub uri: Uri,
    pub config: BuildConfig,
    /// Override for `@import("builtin")`, resolved from the side-config.
    pub builtin_uri: Option<Uri>,
    pub associated_config: Option<BuildAssociatedConfig>,
}

impl BuildFile {
    /// A record with no build context. The document still exists; queries
    /// against it simply see no packages and no include dirs.
    pub fn empty(uri: Uri) -> Self {
        Self {
            uri,
            config: BuildConfig::default(),
            builtin_uri: None,
            associated_config: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildRunnerError {
    #[error("zig_exe_path, build_runner_path and global_cache_path must all be set")]
    NotConfigured,
    #[error("failed to spawn build runner: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("build runner exited with {status}: {stderr}")]
    Failed { status: i32, stderr: String },
    #[error("failed to parse build runner output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

/// Best-effort load of the side-config next to a build file. A missing file
/// is silent; read errors and malformed JSON are logged and ignored.
pub fn load_side_config(build_dir: &Path) -> Option<BuildAssociatedConfig> {
    let path = build_dir.join(SIDE_CONFIG_NAME);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "could not read side config");
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "malformed side config");
            None
        }
    }
}

/// Run the build runner for `build_file_path` and parse its descriptor.
///
/// Package paths in the returned config are rewritten to absolute paths
/// rooted at the build file's directory.
pub fn load_build_config(
    config: &Config,
    build_file_path: &Path,
    build_options: &[String],
) -> Result<BuildConfig, BuildRunnerError> {
    let zig_exe = config
        .zig_exe_path
        .as_ref()
        .ok_or(BuildRunnerError::NotConfigured)?;
    let runner = config
        .build_runner_path
        .as_ref()
        .ok_or(BuildRunnerError::NotConfigured)?;
    let cache_dir = config
        .global_cache_path
        .as_ref()
        .ok_or(BuildRunnerError::NotConfigured)?;
    let build_dir = build_file_path.parent().unwrap_or_else(|| Path::new("/"));

    let mut cmd = Command::new(zig_exe);
    cmd.arg("run")
        .arg(runner)
        .arg("--cache-dir")
        .arg(cache_dir)
        .arg("--pkg-begin")
        .arg("@build@")
        .arg(build_file_path)
        .arg("--pkg-end")
        .arg("--")
        .arg(zig_exe)
        .arg(build_dir)
        .arg("zig-cache")
        .arg("ZLS_DONT_CARE");
    for option in build_options {
        cmd.arg(option);
    }

    let output = cmd.output()?;
    if !output.status.success() {
        return Err(BuildRunnerError::Failed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let mut parsed: BuildConfig = serde_json::from_slice(&output.stdout)?;
    for package in &mut parsed.packages {
        if package.path.is_relative() {
            package.path = build_dir.join(&package.path);
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_parses_runner_payload() {
        let config: BuildConfig = serde_json::from_str(
            r#"{"packages": [{"name": "mylib", "path": "src/main.zig"}], "include_dirs": ["/usr/include"]}"#,
        )
        .unwrap();
        assert_eq!(config.packages.len(), 1);
        assert_eq!(config.packages[0].name, "mylib");
        assert_eq!(config.include_dirs, vec!["/usr/include".to_string()]);
    }

    #[test]
    fn test_build_config_missing_fields_default_empty() {
        let config: BuildConfig = serde_json::from_str("{}").unwrap();
        assert!(config.packages.is_empty());
        assert!(config.include_dirs.is_empty());
    }

    #[test]
    fn test_side_config_parses() {
        let config: BuildAssociatedConfig = serde_json::from_str(
            r#"{"relative_builtin_path": "src/special_builtin.zig", "build_options": ["-Dtarget=native"]}"#,
        )
        .unwrap();
        assert_eq!(
            config.relative_builtin_path.as_deref(),
            Some("src/special_builtin.zig")
        );
        assert_eq!(config.build_options.unwrap().len(), 1);
    }

    #[test]
    fn test_load_side_config_missing_is_none() {
        assert!(load_side_config(Path::new("/definitely/not/a/real/dir")).is_none());
    }

    #[test]
    fn test_load_build_config_requires_configuration() {
        let err = load_build_config(&Config::default(), Path::new("/p/build.zig"), &[]);
        assert!(matches!(err, Err(BuildRunnerError::NotConfigured)));
    }
}
