//! Directive scanner for Zig source.
//!
//! Produces a flat tree of the constructs the document store cares about:
//! `@import` directives, `@cImport` blocks, error sets and enum declarations.
//! The scanner is tolerant of everything else in the source; only literals
//! left unterminated make it fail.

use thiserror::Error;

/// Index of a node within its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `@import("name")`
    Import { name: String },
    /// `@cImport(...)`; the span covers the bytes inside the parentheses.
    CImport { body_start: usize, body_end: usize },
    /// `error{A, B}`
    ErrorSet { tags: Vec<String> },
    /// `enum { a, b }` / `enum(u8) { a, b }`
    EnumDecl { tags: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Byte offset of the construct's first character.
    pub start: usize,
}

/// Flat syntax tree over one source buffer. Nodes appear in source order.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0 as usize)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i as u32), node))
    }

    /// Raw import strings in source order.
    pub fn import_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Import { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Indices of every `@cImport` block, in source order.
    pub fn cimport_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes().filter_map(|(index, node)| match node.kind {
            NodeKind::CImport { .. } => Some(index),
            _ => None,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated string literal at byte {0}")]
    UnterminatedString(usize),
    #[error("unterminated builtin call at byte {0}")]
    UnterminatedBuiltin(usize),
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

/// Scan `text` into a [`Tree`].
pub fn parse(text: &str) -> Result<Tree, ParseError> {
    let mut scanner = Scanner {
        bytes: text.as_bytes(),
        pos: 0,
    };
    let mut nodes = Vec::new();

    while let Some(byte) = scanner.peek() {
        match byte {
            b'/' if scanner.peek_at(1) == Some(b'/') => scanner.skip_line(),
            b'\\' if scanner.peek_at(1) == Some(b'\\') => scanner.skip_line(),
            b'"' => scanner.skip_quoted(b'"')?,
            b'\'' => scanner.skip_quoted(b'\'')?,
            b'@' => {
                if let Some(node) = scanner.scan_builtin()? {
                    nodes.push(node);
                }
            }
            b'e' => {
                if let Some(node) = scanner.scan_keyword()? {
                    nodes.push(node);
                }
            }
            _ => scanner.bump(),
        }
    }

    Ok(Tree { nodes })
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

impl<'a> Scanner<'a> {
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

    /// Skip a string or char literal. Neither may span a line in Zig, so a
    /// newline before the closing quote is an unterminated literal.
    fn skip_quoted(&mut self, quote: u8) -> Result<(), ParseError> {
        let start = self.pos;
        self.bump();
        while let Some(byte) = self.peek() {
            match byte {
                b'\\' => {
                    self.bump();
                    self.bump();
                }
                b'\n' => return Err(ParseError::UnterminatedString(start)),
                _ if byte == quote => {
                    self.bump();
                    return Ok(());
                }
                _ => self.bump(),
            }
        }
        Err(ParseError::UnterminatedString(start))
    }

    /// Read the string literal at the current position, returning its contents.
    fn read_string(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek() != Some(b'"') {
            return Ok(None);
        }
        let start = self.pos;
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
                b'\n' => return Err(ParseError::UnterminatedString(start)),
                b'"' => {
                    self.bump();
                    return Ok(String::from_utf8(out).ok());
                }
                _ => {
                    out.push(byte);
                    self.bump();
                }
            }
        }
        Err(ParseError::UnterminatedString(start))
    }

    fn read_ident(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().map(is_ident_byte).unwrap_or(false) {
            self.bump();
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("")
    }

    /// Skip balanced parentheses starting at the current `(`, honoring
    /// literals and comments. Returns the span between the outer parens.
    fn skip_balanced_parens(&mut self) -> Result<(usize, usize), ParseError> {
        let open = self.pos;
        self.bump();
        let body_start = self.pos;
        let mut depth = 1usize;
        while let Some(byte) = self.peek() {
            match byte {
                b'(' => {
                    depth += 1;
                    self.bump();
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        let body_end = self.pos;
                        self.bump();
                        return Ok((body_start, body_end));
                    }
                    self.bump();
                }
                b'"' => self.skip_quoted(b'"')?,
                b'\'' => self.skip_quoted(b'\'')?,
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line(),
                b'\\' if self.peek_at(1) == Some(b'\\') => self.skip_line(),
                _ => self.bump(),
            }
        }
        Err(ParseError::UnterminatedBuiltin(open))
    }

    fn scan_builtin(&mut self) -> Result<Option<Node>, ParseError> {
        let start = self.pos;
        self.bump();
        let name = self.read_ident();
        match name {
            "import" => {
                self.skip_whitespace();
                if self.peek() != Some(b'(') {
                    return Ok(None);
                }
                self.bump();
                self.skip_whitespace();
                let Some(import_name) = self.read_string()? else {
                    return Ok(None);
                };
                Ok(Some(Node {
                    kind: NodeKind::Import { name: import_name },
                    start,
                }))
            }
            "cImport" => {
                self.skip_whitespace();
                if self.peek() != Some(b'(') {
                    return Ok(None);
                }
                let (body_start, body_end) = self.skip_balanced_parens()?;
                Ok(Some(Node {
                    kind: NodeKind::CImport {
                        body_start,
                        body_end,
                    },
                    start,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Dispatch on `error{...}` and `enum {...}` keywords.
    fn scan_keyword(&mut self) -> Result<Option<Node>, ParseError> {
        if self.pos > 0 && is_ident_byte(self.bytes[self.pos - 1]) {
            self.bump();
            return Ok(None);
        }
        let start = self.pos;
        let word = self.read_ident();
        match word {
            "error" => {
                self.skip_whitespace();
                if self.peek() != Some(b'{') {
                    return Ok(None);
                }
                let tags = self.read_tag_list()?;
                Ok(Some(Node {
                    kind: NodeKind::ErrorSet { tags },
                    start,
                }))
            }
            "enum" => {
                self.skip_whitespace();
                // Optional backing-integer clause: enum(u8) { ... }
                if self.peek() == Some(b'(') {
                    self.skip_balanced_parens()?;
                    self.skip_whitespace();
                }
                if self.peek() != Some(b'{') {
                    return Ok(None);
                }
                let tags = self.read_tag_list()?;
                Ok(Some(Node {
                    kind: NodeKind::EnumDecl { tags },
                    start,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Read comma-separated identifiers between braces. Value clauses
    /// (`= expr`) are skipped. Collection stops at the first nested brace;
    /// the rest of the container (methods, nested declarations) is skipped
    /// to the matching close.
    fn read_tag_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.bump();
        let mut tags = Vec::new();
        let mut expect_member = true;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(tags),
                Some(b'}') => {
                    self.bump();
                    return Ok(tags);
                }
                Some(b',') => {
                    self.bump();
                    expect_member = true;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => self.skip_line(),
                Some(b'{') => {
                    // Nested declaration: stop collecting, skip to the end
                    // of the container.
                    self.skip_to_matching_brace()?;
                    return Ok(tags);
                }
                Some(b'=') => {
                    self.bump();
                    self.skip_value_clause()?;
                }
                Some(byte) if is_ident_byte(byte) => {
                    let ident = self.read_ident().to_owned();
                    if expect_member && !ident.is_empty() {
                        match ident.as_str() {
                            // A declaration keyword means members are over.
                            "pub" | "fn" | "const" | "var" | "comptime" | "usingnamespace" => {
                                self.skip_to_matching_brace()?;
                                return Ok(tags);
                            }
                            _ => tags.push(ident),
                        }
                        expect_member = false;
                    }
                }
                Some(b'"') => self.skip_quoted(b'"')?,
                Some(_) => self.bump(),
            }
        }
    }

    /// Skip a member value expression up to the next `,` or `}` at depth 0.
    fn skip_value_clause(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(byte) = self.peek() {
            match byte {
                b',' | b'}' if depth == 0 => return Ok(()),
                b'(' | b'{' | b'[' => {
                    depth += 1;
                    self.bump();
                }
                b')' | b']' => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                b'}' => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                b'"' => self.skip_quoted(b'"')?,
                b'\'' => self.skip_quoted(b'\'')?,
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line(),
                _ => self.bump(),
            }
        }
        Ok(())
    }

    /// Skip to the `}` closing the brace block we are inside of (the opening
    /// brace has already been consumed by `read_tag_list`).
    fn skip_to_matching_brace(&mut self) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while let Some(byte) = self.peek() {
            match byte {
                b'{' => {
                    depth += 1;
                    self.bump();
                }
                b'}' => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'"' => self.skip_quoted(b'"')?,
                b'\'' => self.skip_quoted(b'\'')?,
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line(),
                b'\\' if self.peek_at(1) == Some(b'\\') => self.skip_line(),
                _ => self.bump(),
            }
        }
        Ok(())
    }
}
