//! Source code location tracking
//!
//! Spans are byte ranges into a single source file. They are attached to
//! tokens, AST nodes and diagnostics, and converted to line/character
//! positions only when shown to a user.

use serde::Serialize;
use std::fmt;

/// A position in the source code. Line and character are 0-indexed
/// internally; `Display` presents them 1-indexed. The character counts
/// UTF-16 code units, so a supplementary-plane code point advances the
/// column by 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A span representing a byte range in one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Span {
    /// Start position (byte offset)
    pub start: usize,
    /// End position (byte offset, exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty span at a single offset
    pub fn at(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Get the source text for this span
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Cached line-start offsets for converting byte offsets to positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a position within `text` (the text the
    /// index was built from).
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        let line_start = self.line_starts[line];
        let character: usize = text[line_start..offset]
            .chars()
            .map(|c| c.len_utf16())
            .sum();
        Position::new(line as u32, character as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 5);
        let b = Span::new(3, 10);
        let merged = a.merge(b);
        assert_eq!(merged.start, 0);
        assert_eq!(merged.end, 10);
    }

    #[test]
    fn test_span_text() {
        let source = "package demo;";
        let span = Span::new(0, 7);
        assert_eq!(span.text(source), "package");
    }

    #[test]
    fn test_position_display_is_one_indexed() {
        assert_eq!(Position::new(0, 0).to_string(), "1:1");
        assert_eq!(Position::new(2, 4).to_string(), "3:5");
    }

    #[test]
    fn test_line_index() {
        let text = "package p;\nmessage M {\n}";
        let index = LineIndex::new(text);
        assert_eq!(index.position(text, 0), Position::new(0, 0));
        assert_eq!(index.position(text, 8), Position::new(0, 8));
        assert_eq!(index.position(text, 11), Position::new(1, 0));
        assert_eq!(index.position(text, 23), Position::new(2, 0));
    }

    #[test]
    fn test_line_index_counts_utf16_units() {
        // '𝕄' is a supplementary-plane code point: 4 bytes, 2 UTF-16 units.
        let text = "𝕄 x";
        let index = LineIndex::new(text);
        assert_eq!(index.position(text, 5), Position::new(0, 3));
    }
}
