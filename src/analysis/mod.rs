//! Source analysis: directive scanning, document scopes, and rendering of
//! `@cImport` blocks into C source.

pub mod scanner;
pub mod scope;

pub use scanner::{parse, Node, NodeIndex, NodeKind, ParseError, Tree};
pub use scope::DocumentScope;

use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CIncludeError {
    /// The node is not a `@cImport` block.
    #[error("node is not a cImport block")]
    NotACImport,
    /// The block contains something other than `@cInclude`/`@cDefine`/`@cUndef`.
    #[error("unsupported construct in cImport block")]
    Unsupported,
}

/// Render the `@cImport` block at `node` into C source.
///
/// Only the three preprocessor builtins are translatable; a block containing
/// any other construct (a comptime expression, a nested call) yields
/// [`CIncludeError::Unsupported`] and the directive is dropped by the caller.
pub fn convert_c_include(tree: &Tree, text: &str, node: NodeIndex) -> Result<String, CIncludeError> {
    let Some(node) = tree.node(node) else {
        return Err(CIncludeError::NotACImport);
    };
    let NodeKind::CImport {
        body_start,
        body_end,
    } = node.kind
    else {
        return Err(CIncludeError::NotACImport);
    };

    let body = &text[body_start..body_end];
    let mut cursor = Cursor { bytes: body.as_bytes(), pos: 0 };
    let mut out = String::new();

    while let Some(byte) = cursor.peek() {
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' | b'{' | b'}' | b';' => cursor.bump(),
            b'/' if cursor.peek_at(1) == Some(b'/') => cursor.skip_line(),
            b'@' => render_builtin(&mut cursor, &mut out)?,
            _ => return Err(CIncludeError::Unsupported),
        }
    }

    Ok(out)
}

fn render_builtin(cursor: &mut Cursor<'_>, out: &mut String) -> Result<(), CIncludeError> {
    cursor.bump();
    let name = cursor.read_ident();
    match name {
        "cInclude" => {
            let header = cursor.read_single_string_arg()?;
            let _ = writeln!(out, "#include <{header}>");
        }
        "cDefine" => {
            cursor.expect(b'(')?;
            cursor.skip_whitespace();
            let name = cursor.read_string().ok_or(CIncludeError::Unsupported)?;
            cursor.skip_whitespace();
            cursor.expect(b',')?;
            cursor.skip_whitespace();
            match cursor.peek() {
                Some(b'"') => {
                    let value = cursor.read_string().ok_or(CIncludeError::Unsupported)?;
                    cursor.skip_whitespace();
                    cursor.expect(b')')?;
                    let _ = writeln!(out, "#define {name} {value}");
                }
                // Void value: @cDefine("NAME", {})
                Some(b'{') => {
                    cursor.bump();
                    cursor.skip_whitespace();
                    cursor.expect(b'}')?;
                    cursor.skip_whitespace();
                    cursor.expect(b')')?;
                    let _ = writeln!(out, "#define {name}");
                }
                _ => return Err(CIncludeError::Unsupported),
            }
        }
        "cUndef" => {
            let name = cursor.read_single_string_arg()?;
            let _ = writeln!(out, "#undef {name}");
        }
        _ => return Err(CIncludeError::Unsupported),
    }
    Ok(())
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_line(&mut self) {
        while let Some(byte) = self.peek() {
            self.bump();
            if byte == b'\n' {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.bump();
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), CIncludeError> {
        if self.peek() == Some(byte) {
            self.bump();
            Ok(())
        } else {
            Err(CIncludeError::Unsupported)
        }
    }

    fn read_ident(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .map(|b| b.is_ascii_alphanumeric() || b == b'_')
            .unwrap_or(false)
        {
            self.bump();
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("")
    }

    fn read_string(&mut self) -> Option<String> {
        if self.peek() != Some(b'"') {
            return None;
        }
        self.bump();
        let mut out = Vec::new();
        while let Some(byte) = self.peek() {
            match byte {
                b'\\' => {
                    self.bump();
                    if let Some(escaped) = self.peek() {
                        out.push(escaped);
                        self.bump();
                    }
                }
                b'"' => {
                    self.bump();
                    return String::from_utf8(out).ok();
                }
                _ => {
                    out.push(byte);
                    self.bump();
                }
            }
        }
        None
    }

    fn read_single_string_arg(&mut self) -> Result<String, CIncludeError> {
        self.expect(b'(')?;
        self.skip_whitespace();
        let value = self.read_string().ok_or(CIncludeError::Unsupported)?;
        self.skip_whitespace();
        self.expect(b')')?;
        Ok(value)
    }
}
