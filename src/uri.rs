//! `file://` URI handling.
//!
//! The store treats URIs as opaque byte sequences for identity but parses
//! them for path resolution. Only the `file` scheme is supported.

use lsp_types::Uri;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FILE_SCHEME_PREFIX: &str = "file://";

/// Percent-encode a single path segment. `/` is kept as a separator by the
/// callers and never passed in.
fn encode_segment(out: &mut String, segment: &str) {
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'+' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
}

fn decode(escaped: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(escaped.len());
    let mut iter = escaped.bytes();
    while let Some(byte) = iter.next() {
        if byte == b'%' {
            let hi = iter.next()?;
            let lo = iter.next()?;
            let hex = [hi, lo];
            let hex = std::str::from_utf8(&hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
        } else {
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).ok()
}

/// Build a `file://` URI from an absolute filesystem path.
pub fn from_path(path: &Path) -> Option<Uri> {
    let mut out = String::with_capacity(FILE_SCHEME_PREFIX.len() + path.as_os_str().len());
    out.push_str(FILE_SCHEME_PREFIX);
    let raw = path.to_str()?;
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        encode_segment(&mut out, segment);
    }
    if out.len() == FILE_SCHEME_PREFIX.len() {
        out.push('/');
    }
    Uri::from_str(&out).ok()
}

/// Extract the filesystem path from a `file://` URI, percent-decoded.
pub fn to_file_path(uri: &Uri) -> Option<PathBuf> {
    let raw = uri.as_str().strip_prefix(FILE_SCHEME_PREFIX)?;
    // Strip an authority component if present ("file://localhost/x").
    let path_start = raw.find('/').unwrap_or(0);
    decode(&raw[path_start..]).map(PathBuf::from)
}

/// Whether the URI's final path segment equals `name`.
pub fn file_name_is(uri: &Uri, name: &str) -> bool {
    let raw = uri.as_str();
    raw.rsplit('/').next() == Some(name)
}

/// Whether any directory segment of the URI equals `name`.
pub fn has_path_segment(uri: &Uri, name: &str) -> bool {
    uri.as_str()
        .strip_prefix(FILE_SCHEME_PREFIX)
        .map(|raw| raw.split('/').any(|segment| segment == name))
        .unwrap_or(false)
}

/// Resolve `relative` against the document `base`, URI-path semantics:
/// the base is trimmed back to its last `/`, then `.` and `..` segments of
/// the relative path are applied.
pub fn resolve_relative(base: &Uri, relative: &str) -> Option<Uri> {
    let base_str = base.as_str();
    let dir_end = base_str.rfind('/')?;
    if dir_end < FILE_SCHEME_PREFIX.len() {
        return None;
    }
    let mut segments: Vec<&str> = base_str[FILE_SCHEME_PREFIX.len()..dir_end]
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let mut tail: Vec<String> = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if tail.pop().is_none() {
                    segments.pop()?;
                }
            }
            other => {
                let mut enc = String::new();
                encode_segment(&mut enc, other);
                tail.push(enc);
            }
        }
    }

    let mut out = String::from(FILE_SCHEME_PREFIX);
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    for segment in &tail {
        out.push('/');
        out.push_str(segment);
    }
    Uri::from_str(&out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        Uri::from_str(s).unwrap()
    }

    #[test]
    fn test_from_path_round_trip() {
        let path = Path::new("/home/user/project/src/main.zig");
        let uri = from_path(path).unwrap();
        assert_eq!(uri.as_str(), "file:///home/user/project/src/main.zig");
        assert_eq!(to_file_path(&uri).unwrap(), path);
    }

    #[test]
    fn test_from_path_encodes_spaces() {
        let uri = from_path(Path::new("/tmp/my project/a.zig")).unwrap();
        assert_eq!(uri.as_str(), "file:///tmp/my%20project/a.zig");
        assert_eq!(
            to_file_path(&uri).unwrap(),
            PathBuf::from("/tmp/my project/a.zig")
        );
    }

    #[test]
    fn test_file_name_is() {
        assert!(file_name_is(&uri("file:///p/build.zig"), "build.zig"));
        assert!(!file_name_is(&uri("file:///p/main.zig"), "build.zig"));
    }

    #[test]
    fn test_has_path_segment() {
        assert!(has_path_segment(&uri("file:///lib/std/fs.zig"), "std"));
        assert!(!has_path_segment(&uri("file:///lib/stdlib/fs.zig"), "std"));
        // The file name itself counts as a segment only on exact match
        assert!(!has_path_segment(&uri("file:///lib/io.zig"), "std"));
    }

    #[test]
    fn test_resolve_relative_sibling() {
        let base = uri("file:///p/src/main.zig");
        let resolved = resolve_relative(&base, "util.zig").unwrap();
        assert_eq!(resolved.as_str(), "file:///p/src/util.zig");
    }

    #[test]
    fn test_resolve_relative_subdir_and_parent() {
        let base = uri("file:///p/src/main.zig");
        assert_eq!(
            resolve_relative(&base, "sub/mod.zig").unwrap().as_str(),
            "file:///p/src/sub/mod.zig"
        );
        assert_eq!(
            resolve_relative(&base, "../other.zig").unwrap().as_str(),
            "file:///p/other.zig"
        );
        assert_eq!(
            resolve_relative(&base, "./util.zig").unwrap().as_str(),
            "file:///p/src/util.zig"
        );
    }

    #[test]
    fn test_resolve_relative_escaping_root_fails() {
        let base = uri("file:///a.zig");
        assert!(resolve_relative(&base, "../../b.zig").is_none());
    }
}
