//! Source file storage
//!
//! The `SourceMap` owns the text of every file in a compilation (or editor
//! session) and hands out stable `FileId` handles. Line/character positions
//! for user-visible output are computed here.

use crate::span::{LineIndex, Position, Span};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A stable handle to a file in the source map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// One source file: its path (relative to the source root), normalized
/// text, and a line index for position lookups.
#[derive(Debug)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub text: String,
    line_index: LineIndex,
}

impl SourceFile {
    pub fn position(&self, offset: usize) -> Position {
        self.line_index.position(&self.text, offset)
    }
}

/// Owns file contents for the lifetime of a compilation or session.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, normalizing CRLF line endings to LF.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: &str) -> FileId {
        let id = FileId(self.files.len() as u32);
        let text = text.replace("\r\n", "\n");
        let line_index = LineIndex::new(&text);
        self.files.push(SourceFile {
            id,
            path: path.into(),
            text,
            line_index,
        });
        id
    }

    /// Replace a file's contents in place. The per-file caches held by
    /// downstream passes (tokens, AST, definitions, diagnostics) must be
    /// invalidated by the caller in the same step.
    pub fn replace(&mut self, id: FileId, text: &str) {
        let file = &mut self.files[id.0 as usize];
        file.text = text.replace("\r\n", "\n");
        file.line_index = LineIndex::new(&file.text);
    }

    pub fn get(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn path(&self, id: FileId) -> &Path {
        &self.files[id.0 as usize].path
    }

    pub fn text(&self, id: FileId) -> &str {
        &self.files[id.0 as usize].text
    }

    /// Start position of a span, for display
    pub fn position(&self, id: FileId, span: Span) -> Position {
        self.get(id).position(span.start)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_normalized() {
        let mut map = SourceMap::new();
        let id = map.insert("a.eproto", "package p;\r\nmessage M {}\r\n");
        assert_eq!(map.text(id), "package p;\nmessage M {}\n");
    }

    #[test]
    fn test_position_lookup() {
        let mut map = SourceMap::new();
        let id = map.insert("a.eproto", "package p;\nenum E {}\n");
        let pos = map.position(id, Span::new(11, 15));
        assert_eq!(pos, Position::new(1, 0));
    }

    #[test]
    fn test_replace_rebuilds_index() {
        let mut map = SourceMap::new();
        let id = map.insert("a.eproto", "package p;");
        map.replace(id, "package q;\npackage r;");
        assert_eq!(map.position(id, Span::new(11, 18)).line, 1);
    }
}
