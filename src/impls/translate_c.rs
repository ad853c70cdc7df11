//! Sub-process backed C translation.

use crate::config::Config;
use crate::core::hash::ContentHash;
use crate::traits::{CTranslator, Translation};
use crate::uri;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, warn};

/// Translates rendered C source by shelling out to `zig translate-c`.
///
/// The C source is staged under the global cache directory, translated, and
/// the resulting Zig file is left in place so the store can read it back as
/// an ordinary document. Blocking: the store contract allows sub-process
/// calls to take as long as they take.
#[derive(Debug)]
pub struct ZigTranslator {
    config: Arc<Config>,
}

impl ZigTranslator {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl CTranslator for ZigTranslator {
    fn translate(&self, c_source: &str, include_dirs: &[PathBuf]) -> Option<Translation> {
        let zig_exe = self.config.zig_exe_path.as_ref()?;
        let cache_dir = self.config.global_cache_path.as_ref()?;

        let staging = cache_dir.join("cimport");
        if let Err(err) = std::fs::create_dir_all(&staging) {
            debug!(error = %err, "could not create cimport staging directory");
            return None;
        }

        let hash = ContentHash::of(c_source.as_bytes()).to_hex();
        let c_path = staging.join(format!("{hash}.c"));
        let out_path = staging.join(format!("{hash}.zig"));
        if let Err(err) = std::fs::write(&c_path, c_source) {
            debug!(error = %err, "could not stage C source");
            return None;
        }

        let mut cmd = Command::new(zig_exe);
        cmd.arg("translate-c").arg(&c_path);
        for dir in include_dirs {
            cmd.arg("-I").arg(dir);
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(err) => {
                debug!(error = %err, "failed to spawn zig translate-c");
                return None;
            }
        };
        if !output.status.success() {
            warn!(
                status = output.status.code().unwrap_or(-1),
                "translate-c rejected the source"
            );
            return Some(Translation::Failure);
        }

        if let Err(err) = std::fs::write(&out_path, &output.stdout) {
            debug!(error = %err, "could not write translated source");
            return None;
        }
        uri::from_path(&out_path).map(Translation::Success)
    }
}
