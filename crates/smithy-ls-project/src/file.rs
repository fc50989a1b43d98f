//! A tracked Smithy source file.

use std::sync::Arc;

use lsp_types::Range;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use smithy_ls_syntax::document::Document;
use smithy_ls_syntax::parse::parse_idl;
use smithy_ls_syntax::statement::ParseResult;

/// An IDL file owned by a project. The document is mutated only by the
/// dispatcher thread; the parse result is replaced in place under a
/// file-local lock, so a concurrent reader always sees a coherent
/// snapshot (either the old or the new result, never a mix).
pub struct SmithyFile {
    path: String,
    document: RwLock<Document>,
    parsed: Mutex<Arc<ParseResult>>,
    /// Whether the file came out of a jar dependency; jar files never
    /// produce diagnostics and cannot be edited.
    from_jar: bool,
}

impl std::fmt::Debug for SmithyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmithyFile")
            .field("path", &self.path)
            .field("from_jar", &self.from_jar)
            .finish()
    }
}

impl SmithyFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let document = Document::of(text.into());
        let parsed = Arc::new(parse_idl(&document));
        Self {
            path: path.into(),
            document: RwLock::new(document),
            parsed: Mutex::new(parsed),
            from_jar: false,
        }
    }

    pub fn from_jar(path: impl Into<String>, text: impl Into<String>) -> Self {
        let mut file = Self::new(path, text);
        file.from_jar = true;
        file
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_from_jar(&self) -> bool {
        self.from_jar
    }

    /// Read access to the document for the duration of a request.
    pub fn document(&self) -> RwLockReadGuard<'_, Document> {
        self.document.read()
    }

    /// The current parse result. Cheap: clones an `Arc` under the lock
    /// and releases it immediately.
    pub fn parsed(&self) -> Arc<ParseResult> {
        self.parsed.lock().clone()
    }

    /// Apply an incremental edit and reparse.
    pub fn apply_edit(&self, range: Option<Range>, text: &str) {
        let mut document = self.document.write();
        document.apply_edit(range, text);
        let reparsed = Arc::new(parse_idl(&document));
        *self.parsed.lock() = reparsed;
    }

    /// Replace the whole document text and reparse.
    pub fn replace_text(&self, text: &str) {
        self.apply_edit(None, text);
    }

    /// Current text, cloned out of the lock.
    pub fn text_snapshot(&self) -> String {
        self.document.read().borrow_text().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;

    #[test]
    fn edits_reparse_in_place() {
        let file = SmithyFile::new("a.smithy", "$version: \"2\"\nnamespace com.a\n");
        assert_eq!(file.parsed().namespace_name(), "com.a");
        file.apply_edit(
            Some(Range {
                start: Position { line: 1, character: 10 },
                end: Position { line: 1, character: 15 },
            }),
            "com.b",
        );
        assert_eq!(file.parsed().namespace_name(), "com.b");
    }

    #[test]
    fn readers_hold_a_stable_snapshot() {
        let file = SmithyFile::new("a.smithy", "namespace com.a\n");
        let snapshot = file.parsed();
        file.replace_text("namespace com.c\n");
        assert_eq!(snapshot.namespace_name(), "com.a");
        assert_eq!(file.parsed().namespace_name(), "com.c");
    }
}
