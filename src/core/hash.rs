//! Content hashing for the cimport cache.

use std::fmt;

/// Domain-separation key for cimport content hashing. Changing it invalidates
/// every cached translation, which is safe: the cache is in-memory only.
const CIMPORT_HASH_KEY: &[u8; 32] = b"zig-lsp.cimport.content.hash.v1\0";

/// 128-bit keyed content hash.
///
/// Keys the cimport cache: two `@cImport` blocks that render to the same C
/// source share one translation. The hash is keyed so that values are not
/// confusable with any other blake3 use of the same input bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        let digest = blake3::keyed_hash(CIMPORT_HASH_KEY, bytes);
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest.as_bytes()[..16]);
        Self(out)
    }

    /// Lowercase hex rendering, usable as a file-name component.
    pub fn to_hex(self) -> String {
        let mut out = String::with_capacity(32);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_input_same_hash() {
        assert_eq!(ContentHash::of(b"#include <a.h>"), ContentHash::of(b"#include <a.h>"));
    }

    #[test]
    fn test_different_input_different_hash() {
        assert_ne!(ContentHash::of(b"#include <a.h>"), ContentHash::of(b"#include <b.h>"));
    }

    #[test]
    fn test_empty_input_hashes() {
        let hash = ContentHash::of(b"");
        assert_eq!(hash, ContentHash::of(b""));
        let debug = format!("{hash:?}");
        assert!(debug.starts_with("ContentHash("));
    }
}
