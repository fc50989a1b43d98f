//! Document state management.
//!
//! An owned UTF-8 buffer plus a cached array of line-start offsets. The
//! index is rebuilt on every mutation so offset/position conversions are
//! always consistent with the current text. Columns count bytes within
//! the line; Smithy sources are ASCII-dominated and every conversion is
//! clamped rather than panicking.

use lsp_types::{Position, Range};

use crate::span::Span;

/// An owned text buffer with a cached line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    line_starts: Vec<usize>,
}

/// The maximal shape-id token under a cursor, as copied out of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId {
    pub text: String,
    pub range: Range,
    pub span: Span,
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#' | '$')
}

impl Document {
    /// Take ownership of `text` and compute the line index in one pass.
    pub fn of(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self { text, line_starts }
    }

    pub fn borrow_text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset for an LSP position, clamped to the document. A line
    /// past the end maps to `len()`; a column past the line end maps to
    /// the line's terminator.
    pub fn index_of(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return self.text.len();
        }
        let start = self.line_starts[line];
        let end = self.line_end(line as u32);
        (start + position.character as usize).min(end)
    }

    /// LSP position for a byte offset. Offsets past the end clamp to the
    /// last line's last column.
    pub fn position_of(&self, index: usize) -> Position {
        let index = index.min(self.text.len());
        let line = match self.line_starts.binary_search(&index) {
            Ok(line) => line,
            Err(insert) => insert - 1,
        };
        Position {
            line: line as u32,
            character: (index - self.line_starts[line]) as u32,
        }
    }

    /// Byte offset of the terminator of `line`: the `\n` (or the `\r` of
    /// a `\r\n` pair), or `len()` for the last line. Out of range is 0.
    pub fn line_end(&self, line: u32) -> usize {
        let line = line as usize;
        if line >= self.line_starts.len() {
            return 0;
        }
        if line + 1 < self.line_starts.len() {
            let next = self.line_starts[line + 1];
            // step back over the newline, and a preceding '\r' if present
            let mut end = next - 1;
            if end > 0 && self.text.as_bytes()[end - 1] == b'\r' {
                end -= 1;
            }
            end
        } else {
            self.text.len()
        }
    }

    /// LSP range between two byte offsets, or `None` when `start > end`
    /// or either offset lies outside the document.
    pub fn range_between(&self, start: usize, end: usize) -> Option<Range> {
        if start > end || end > self.text.len() {
            return None;
        }
        Some(Range {
            start: self.position_of(start),
            end: self.position_of(end),
        })
    }

    /// LSP range covering `span`, when the span is valid for this text.
    pub fn range_of(&self, span: Span) -> Option<Range> {
        self.range_between(span.start, span.end)
    }

    /// Replace `range` with `text`, or the whole document when `range`
    /// is `None`, then rebuild the line index.
    pub fn apply_edit(&mut self, range: Option<Range>, text: &str) {
        match range {
            None => {
                self.text = text.to_string();
            }
            Some(range) => {
                let start = self.index_of(range.start);
                let end = self.index_of(range.end).max(start);
                self.text.replace_range(start..end, text);
            }
        }
        self.line_starts = compute_line_starts(&self.text);
    }

    /// Copy the maximal shape-id token under the cursor: namespace
    /// segments, `#`, name, `$`, and member are all part of the token.
    pub fn copy_document_id(&self, position: Position) -> Option<DocumentId> {
        let idx = self.index_of(position).min(self.text.len());
        let bytes = self.text.as_bytes();

        let mut start = idx;
        while start > 0 && is_id_char(bytes[start - 1] as char) {
            start -= 1;
        }
        let mut end = idx;
        while end < bytes.len() && is_id_char(bytes[end] as char) {
            end += 1;
        }
        if start == end {
            return None;
        }
        let span = Span::new(start, end);
        Some(DocumentId {
            text: self.text[start..end].to_string(),
            range: self.range_between(start, end)?,
            span,
        })
    }

    /// The text covered by `span`, clamped to the document.
    pub fn slice(&self, span: Span) -> &str {
        let start = span.start.min(self.text.len());
        let end = span.end.min(self.text.len()).max(start);
        &self.text[start..end]
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(line: u32, character: u32) -> Position {
        Position { line, character }
    }

    #[test]
    fn index_and_position_round_trip() {
        let doc = Document::of("abc\ndef\n\nghi");
        for (line, character) in [(0, 0), (0, 3), (1, 2), (2, 0), (3, 3)] {
            let p = pos(line, character);
            assert_eq!(doc.position_of(doc.index_of(p)), p);
        }
    }

    #[test]
    fn out_of_range_positions_clamp() {
        let doc = Document::of("abc\ndef");
        assert_eq!(doc.index_of(pos(9, 0)), 7);
        assert_eq!(doc.index_of(pos(0, 99)), 3);
        assert_eq!(doc.position_of(999), pos(1, 3));
    }

    #[test]
    fn line_end_points_at_terminator() {
        let doc = Document::of("ab\ncd\r\nef");
        assert_eq!(doc.line_end(0), 2);
        assert_eq!(doc.line_end(1), 5);
        assert_eq!(doc.line_end(2), 9);
        assert_eq!(doc.line_end(7), 0);
    }

    #[test]
    fn range_between_rejects_inverted_ranges() {
        let doc = Document::of("abc");
        assert!(doc.range_between(2, 1).is_none());
        assert!(doc.range_between(0, 9).is_none());
        let range = doc.range_between(1, 3).unwrap();
        assert_eq!(range.start, pos(0, 1));
        assert_eq!(range.end, pos(0, 3));
    }

    #[test]
    fn apply_edit_rebuilds_line_index() {
        let mut doc = Document::of("abc\ndef");
        doc.apply_edit(
            Some(Range {
                start: pos(0, 3),
                end: pos(1, 0),
            }),
            "\nxx\n",
        );
        assert_eq!(doc.borrow_text(), "abc\nxx\ndef");
        assert_eq!(doc.index_of(pos(2, 1)), 8);
        assert_eq!(doc.position_of(8), pos(2, 1));
    }

    #[test]
    fn full_document_edit_replaces_text() {
        let mut doc = Document::of("old");
        doc.apply_edit(None, "brand\nnew");
        assert_eq!(doc.borrow_text(), "brand\nnew");
        assert_eq!(doc.line_count(), 2);
    }

    #[test]
    fn copy_document_id_returns_maximal_token() {
        let doc = Document::of("use com.example#Shape$member\n");
        let id = doc.copy_document_id(pos(0, 10)).unwrap();
        assert_eq!(id.text, "com.example#Shape$member");
        assert_eq!(id.span, Span::new(4, 28));
    }

    #[test]
    fn copy_document_id_after_token_end() {
        let doc = Document::of("@doc");
        let id = doc.copy_document_id(pos(0, 4)).unwrap();
        assert_eq!(id.text, "doc");
    }

    #[test]
    fn copy_document_id_misses_whitespace() {
        let doc = Document::of("a  b");
        assert!(doc.copy_document_id(pos(0, 2)).is_none());
    }
}
