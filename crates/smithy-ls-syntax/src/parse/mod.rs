//! Tolerant parsers for the IDL and for JSON-with-comments build files.

mod idl;
mod node;

use crate::document::Document;
use crate::node::Node;
use crate::span::Span;
use crate::statement::ParseResult;
use crate::token::{self, Token, TokenKind};

pub use idl::parse_idl_text;

/// Every keyword that can start a statement, for keyword completion.
pub fn idl_statement_keywords() -> Vec<String> {
    let mut keywords = vec![
        "metadata".to_string(),
        "namespace".to_string(),
        "use".to_string(),
        "apply".to_string(),
    ];
    keywords.extend(idl::SHAPE_TYPES.iter().map(|kw| kw.to_string()));
    keywords
}

/// Parse an IDL document into its statement list. Never fails; malformed
/// input surfaces as `Incomplete` statements, `Err` nodes, and entries in
/// [`ParseResult::errors`].
pub fn parse_idl(document: &Document) -> ParseResult {
    parse_idl_text(document.borrow_text())
}

/// Parse a JSON-with-comments document into the shared node AST. Objects,
/// arrays, strings, numbers, and bare identifiers (`true`, `false`,
/// `null`) are recognized; malformed constructs become `Err` nodes.
pub fn parse_json_with_comments(document: &Document) -> Node {
    let mut cursor = TokenCursor::new(document.borrow_text());
    let mut errors = Vec::new();
    node::parse_node(&mut cursor, &mut errors)
}

/// A cursor over the token stream that skips comment trivia, keeping doc
/// comments aside for whoever defines the next shape or member.
pub(crate) struct TokenCursor<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    pending_docs: Vec<String>,
}

impl<'a> TokenCursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: token::tokenize(source),
            pos: 0,
            pending_docs: Vec::new(),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                TokenKind::Comment => self.pos += 1,
                TokenKind::DocComment => {
                    let text = token.text(self.source);
                    let text = text.strip_prefix("///").unwrap_or(text);
                    self.pending_docs
                        .push(text.strip_prefix(' ').unwrap_or(text).to_string());
                    self.pos += 1;
                }
                _ => break,
            }
        }
    }

    pub fn peek(&mut self) -> Token {
        self.skip_trivia();
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// The first significant token after the next one.
    pub fn peek2(&mut self) -> Token {
        self.skip_trivia();
        let mut idx = self.pos + 1;
        while let Some(token) = self.tokens.get(idx) {
            if matches!(token.kind, TokenKind::Comment | TokenKind::DocComment) {
                idx += 1;
            } else {
                break;
            }
        }
        self.tokens[idx.min(self.tokens.len() - 1)]
    }

    pub fn bump(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub fn at(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    /// Take the doc comments accumulated since the last call, joined
    /// with newlines. Empty result maps to `None`.
    pub fn take_docs(&mut self) -> Option<String> {
        if self.pending_docs.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending_docs).join("\n"))
    }

    pub fn clear_docs(&mut self) {
        self.pending_docs.clear();
    }

    /// Byte offset where the current (unconsumed) token starts.
    pub fn offset(&mut self) -> usize {
        self.peek().span.start
    }

    /// End of the most recently consumed significant token.
    pub fn prev_end(&self) -> usize {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| !matches!(t.kind, TokenKind::Comment | TokenKind::DocComment))
            .map_or(0, |t| t.span.end)
    }

    pub fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map_or(Span::empty(0), |t| Span::empty(t.span.start))
    }
}
