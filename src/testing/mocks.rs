//! Mock implementations for testing without the Zig toolchain.
//!
//! These provide fast, deterministic stand-ins for the sub-process backed
//! collaborators so store behavior can be exercised hermetically.

use crate::core::hash::ContentHash;
use crate::traits::{CTranslator, Translation};
use crate::uri;
use lsp_types::Uri;
use std::path::PathBuf;
use std::str::FromStr;

/// Deterministic translator driven by the C source contents:
///
/// - sources mentioning `fail.h` translate to [`Translation::Failure`]
/// - sources mentioning `flaky.h` return `None` (transient error)
/// - everything else succeeds, keyed by the source's content hash
///
/// With an output directory configured, successful translations are written
/// to disk so the store can materialize a handle for the output; without
/// one, success URIs point at files that do not exist and the store's
/// best-effort load is exercised instead.
#[derive(Debug, Default)]
pub struct MockTranslator {
    output_dir: Option<PathBuf>,
}

impl MockTranslator {
    pub fn writing_into(dir: PathBuf) -> Self {
        Self {
            output_dir: Some(dir),
        }
    }
}

/// Contents written for successful translations: carries an error set so
/// aggregation through cimport edges is observable in tests.
pub const TRANSLATED_CONTENTS: &str = "pub const c_errors = error{ CHeaderError };\n";

impl CTranslator for MockTranslator {
    fn translate(&self, c_source: &str, _include_dirs: &[PathBuf]) -> Option<Translation> {
        if c_source.contains("flaky.h") {
            return None;
        }
        if c_source.contains("fail.h") {
            return Some(Translation::Failure);
        }

        let name = format!("cimport_{}.zig", ContentHash::of(c_source.as_bytes()).to_hex());
        match &self.output_dir {
            Some(dir) => {
                let path = dir.join(&name);
                if std::fs::metadata(&path).is_err() {
                    std::fs::write(&path, TRANSLATED_CONTENTS).ok()?;
                }
                Some(Translation::Success(uri::from_path(&path)?))
            }
            None => {
                let synthetic = format!("file:///translated/{name}");
                Some(Translation::Success(Uri::from_str(&synthetic).ok()?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_translator_failure_source() {
        let translator = MockTranslator::default();
        assert_eq!(
            translator.translate("#include <fail.h>\n", &[]),
            Some(Translation::Failure)
        );
    }

    #[test]
    fn test_mock_translator_transient_source() {
        let translator = MockTranslator::default();
        assert_eq!(translator.translate("#include <flaky.h>\n", &[]), None);
    }

    #[test]
    fn test_mock_translator_success_is_deterministic() {
        let translator = MockTranslator::default();
        let first = translator.translate("#include <a.h>\n", &[]);
        let second = translator.translate("#include <a.h>\n", &[]);
        assert_eq!(first, second);
        assert!(matches!(first, Some(Translation::Success(_))));
    }

    #[test]
    fn test_mock_translator_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let translator = MockTranslator::writing_into(dir.path().to_path_buf());
        let Some(Translation::Success(uri)) = translator.translate("#include <a.h>\n", &[])
        else {
            panic!("expected success");
        };
        let path = crate::uri::to_file_path(&uri).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), TRANSLATED_CONTENTS);
    }
}
