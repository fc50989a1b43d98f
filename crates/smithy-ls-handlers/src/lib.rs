//! Feature handlers.
//!
//! Each module answers one editor request as a synchronous function of
//! `(project, file, position)`. The shared query engine lives in
//! [`search`]: shape resolution from classified cursor positions, node
//! traversal with dynamic member targets, and the candidate machinery
//! completion renders from. Handlers poll the [`CancelToken`] before
//! acquiring shared state and before expensive sub-steps, returning
//! empty results when cancelled.

pub mod cancel;
pub mod completion;
pub mod diagnostics;
pub mod error;
pub mod folding;
pub mod hover;
pub mod inlay;
pub mod references;
pub mod rename;
pub mod search;
pub mod symbols;

pub use cancel::CancelToken;
pub use error::{RpcError, RpcResult};

use smithy_ls_syntax::document::Document;
use smithy_ls_syntax::statement::ParseResult;

/// A request's read-only view of one file.
#[derive(Clone, Copy)]
pub struct FileView<'a> {
    pub path: &'a str,
    pub document: &'a Document,
    pub parsed: &'a ParseResult,
}

impl<'a> FileView<'a> {
    pub fn new(path: &'a str, document: &'a Document, parsed: &'a ParseResult) -> Self {
        Self {
            path,
            document,
            parsed,
        }
    }

    pub fn source(&self) -> &'a str {
        self.document.borrow_text()
    }
}
