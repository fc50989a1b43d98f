//! Syntactic layer for the Smithy IDL.
//!
//! This crate owns everything between raw text and classified cursor
//! positions: the [`Document`] buffer with its line index, the tokenizer,
//! the tolerant IDL and JSON-with-comments parsers, the flat
//! [`Statement`] list with byte-precise ranges, the [`Node`] tree shared
//! by trait values and build files, and the cursor utilities
//! ([`NodeCursor`], [`StatementView`], [`IdlPosition`]) that the feature
//! handlers consume.
//!
//! The parsers never fail fatally. Unexpected input becomes `Err` nodes
//! or `Incomplete` statements plus a parse-time diagnostic, and parsing
//! resumes at the next statement boundary.

pub mod document;
pub mod node;
pub mod parse;
pub mod position;
pub mod span;
pub mod statement;
pub mod token;
pub mod view;

pub use document::Document;
pub use node::{ArrNode, Edge, Kvp, Node, NodeCursor, ObjNode, StrNode};
pub use parse::{parse_idl, parse_json_with_comments};
pub use position::IdlPosition;
pub use span::Span;
pub use statement::{ParseError, ParseResult, Severity, Statement};
pub use view::StatementView;
