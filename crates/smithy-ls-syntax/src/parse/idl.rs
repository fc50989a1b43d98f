//! The tolerant IDL parser.
//!
//! One linear pass over the token stream. Unexpected tokens are recorded
//! as parse errors and skipped; a lone identifier in statement position
//! becomes an `Incomplete` statement so the position classifier can still
//! offer keyword completions. Every statement keeps the byte spans of the
//! tokens it captured.

use crate::span::Span;
use crate::statement::{
    ApplyStmt, BlockStmt, ControlStmt, ElidedMemberDefStmt, EnumMemberDefStmt, ForResourceStmt,
    Ident, Imports, InlineMemberDefStmt, MemberDefStmt, MetadataStmt, MixinsStmt, NamespaceDecl,
    NamespaceStmt, NodeMemberDefStmt, ParseError, ParseResult, Severity, ShapeDefStmt, Statement,
    TraitApplicationStmt, UseStmt, VersionDecl,
};
use crate::token::{string_value, Token, TokenKind};

use super::node::{parse_node, parse_trait_value};
use super::TokenCursor;

/// Shape-type keywords that open a shape definition statement.
pub(crate) const SHAPE_TYPES: &[&str] = &[
    "blob",
    "boolean",
    "string",
    "byte",
    "short",
    "integer",
    "long",
    "float",
    "double",
    "bigInteger",
    "bigDecimal",
    "timestamp",
    "document",
    "enum",
    "intEnum",
    "list",
    "set",
    "map",
    "structure",
    "union",
    "service",
    "resource",
    "operation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    /// `name: Target` members (structure, union, list, map).
    Structure,
    /// Bare `NAME` members, optionally `= value`.
    Enum,
    /// `name: <node>` members (service, resource).
    NodeMembers,
    /// Mixed `input := {...}` / `input: Target` / `errors: [...]`.
    Operation,
}

fn body_kind(shape_type: &str) -> BodyKind {
    match shape_type {
        "enum" | "intEnum" => BodyKind::Enum,
        "service" | "resource" => BodyKind::NodeMembers,
        "operation" => BodyKind::Operation,
        _ => BodyKind::Structure,
    }
}

pub fn parse_idl_text(source: &str) -> ParseResult {
    let mut parser = IdlParser {
        cursor: TokenCursor::new(source),
        source,
        statements: Vec::new(),
        errors: Vec::new(),
        version: None,
        namespace: None,
        imports: Imports::default(),
    };
    parser.run();
    ParseResult {
        version: parser.version,
        namespace: parser.namespace,
        imports: parser.imports,
        statements: parser.statements,
        errors: parser.errors,
    }
}

struct IdlParser<'a> {
    cursor: TokenCursor<'a>,
    source: &'a str,
    statements: Vec<Statement>,
    errors: Vec<ParseError>,
    version: Option<VersionDecl>,
    namespace: Option<NamespaceDecl>,
    imports: Imports,
}

impl<'a> IdlParser<'a> {
    fn run(&mut self) {
        loop {
            let token = self.cursor.peek();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Dollar => self.control(),
                TokenKind::At => self.trait_application(),
                TokenKind::Ident => {
                    let text = self.cursor.text(token);
                    match text {
                        "metadata" => self.metadata(),
                        "namespace" => self.namespace_stmt(),
                        "use" => self.use_stmt(),
                        "apply" => self.apply(),
                        _ if SHAPE_TYPES.contains(&text) => self.shape_def(),
                        _ => {
                            self.cursor.bump();
                            self.statements
                                .push(Statement::Incomplete(self.ident(token)));
                        }
                    }
                }
                _ => {
                    self.cursor.bump();
                    self.error("unexpected token", token.span);
                }
            }
        }
    }

    fn ident(&self, token: Token) -> Ident {
        Ident::new(self.cursor.text(token), token.span)
    }

    fn error(&mut self, message: &str, span: Span) {
        self.errors.push(ParseError {
            message: message.to_string(),
            span,
            severity: Severity::Error,
        });
    }

    /// Whether the next significant token sits on the same line as the
    /// last consumed one. Used to stop a dangling `:` from swallowing
    /// the next statement's keyword.
    fn next_on_same_line(&mut self) -> bool {
        let from = self.cursor.prev_end();
        let to = self.cursor.peek().span.start;
        !self.source[from.min(to)..to].contains('\n')
    }

    /// Whether a value may follow here: brace- and bracket-opened values
    /// continue across lines, anything else must start on the same line.
    fn value_continues(&mut self) -> bool {
        matches!(
            self.cursor.peek().kind,
            TokenKind::LBrace | TokenKind::LBracket
        ) || self.next_on_same_line()
    }

    fn same_line_ident(&mut self) -> Option<Ident> {
        if self.cursor.at(TokenKind::Ident) && self.next_on_same_line() {
            let token = self.cursor.bump();
            Some(self.ident(token))
        } else {
            None
        }
    }

    fn missing_ident(&mut self) -> Ident {
        Ident::new("", Span::empty(self.cursor.prev_end()))
    }

    fn control(&mut self) {
        let dollar = self.cursor.bump();
        self.cursor.clear_docs();
        let key = self
            .same_line_ident()
            .unwrap_or_else(|| self.missing_ident());
        let mut end = key.span.end.max(dollar.span.end);
        let value = if self.cursor.eat(TokenKind::Colon).is_some() {
            if self.next_on_same_line() {
                let node = parse_node(&mut self.cursor, &mut self.errors);
                end = node.span().end;
                Some(node)
            } else {
                self.error("expected control value", Span::empty(self.cursor.prev_end()));
                end = self.cursor.prev_end();
                None
            }
        } else {
            None
        };
        let span = Span::new(dollar.span.start, end);
        if key.text == "version" {
            if let Some(value) = value.as_ref().and_then(|n| n.as_text()) {
                self.version = Some(VersionDecl {
                    value: value.to_string(),
                    span,
                });
            }
        }
        self.statements
            .push(Statement::Control(ControlStmt { key, value, span }));
    }

    fn metadata(&mut self) {
        let kw = self.cursor.bump();
        self.cursor.clear_docs();
        let key = match self.cursor.peek().kind {
            TokenKind::Ident if self.next_on_same_line() => {
                let token = self.cursor.bump();
                self.ident(token)
            }
            TokenKind::Str if self.next_on_same_line() => {
                let token = self.cursor.bump();
                Ident::new(string_value(self.cursor.text(token)), token.span)
            }
            _ => {
                self.error("expected metadata key", Span::empty(kw.span.end));
                self.missing_ident()
            }
        };
        let mut end = key.span.end.max(kw.span.end);
        let value = if self.cursor.eat(TokenKind::Equals).is_some() {
            let node = parse_node(&mut self.cursor, &mut self.errors);
            end = node.span().end;
            Some(node)
        } else {
            if !key.text.is_empty() {
                self.error("expected '=' after metadata key", Span::empty(key.span.end));
            }
            None
        };
        self.statements.push(Statement::Metadata(MetadataStmt {
            key,
            value,
            span: Span::new(kw.span.start, end),
        }));
    }

    fn namespace_stmt(&mut self) {
        let kw = self.cursor.bump();
        self.cursor.clear_docs();
        let name = match self.same_line_ident() {
            Some(name) => name,
            None => {
                self.error("expected namespace name", Span::empty(kw.span.end));
                self.missing_ident()
            }
        };
        let span = Span::new(kw.span.start, name.span.end.max(kw.span.end));
        if self.namespace.is_none() && !name.text.is_empty() {
            self.namespace = Some(NamespaceDecl {
                name: name.text.clone(),
                statement_span: span,
                value_span: name.span,
            });
        }
        self.statements
            .push(Statement::Namespace(NamespaceStmt { name, span }));
    }

    fn use_stmt(&mut self) {
        let kw = self.cursor.bump();
        self.cursor.clear_docs();
        let target = match self.same_line_ident() {
            Some(target) => target,
            None => {
                self.error("expected shape id after 'use'", Span::empty(kw.span.end));
                self.missing_ident()
            }
        };
        let span = Span::new(kw.span.start, target.span.end.max(kw.span.end));
        if !target.text.is_empty() {
            self.imports.ids.insert(target.text.clone());
            self.imports.span = Some(match self.imports.span {
                Some(existing) => existing.union(span),
                None => span,
            });
        }
        self.statements.push(Statement::Use(UseStmt { target, span }));
    }

    fn apply(&mut self) {
        let kw = self.cursor.bump();
        self.cursor.clear_docs();
        let target = match self.same_line_ident() {
            Some(target) => target,
            None => {
                self.error("expected shape id after 'apply'", Span::empty(kw.span.end));
                self.missing_ident()
            }
        };
        let span = Span::new(kw.span.start, target.span.end.max(kw.span.end));
        self.statements
            .push(Statement::Apply(ApplyStmt { target, span }));

        // block form: apply Target { @a @b }
        if self.cursor.at(TokenKind::LBrace) {
            self.trait_block();
        }
    }

    fn trait_block(&mut self) {
        let open = self.cursor.bump();
        let block_index = self.statements.len();
        self.statements.push(Statement::Block(BlockStmt {
            span: open.span,
            enclosed: None,
        }));
        let end;
        loop {
            let token = self.cursor.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.cursor.bump();
                    end = token.span.end;
                    break;
                }
                TokenKind::Eof => {
                    self.error("unclosed block", Span::empty(token.span.start));
                    end = token.span.start;
                    break;
                }
                TokenKind::At => self.trait_application(),
                _ => {
                    self.cursor.bump();
                    self.error("expected trait application", token.span);
                }
            }
        }
        self.close_block(block_index, end);
    }

    fn trait_application(&mut self) {
        let at = self.cursor.bump();
        let id = self
            .same_line_ident()
            .unwrap_or_else(|| self.missing_ident());
        let (value, end) = if self.cursor.at(TokenKind::LParen) {
            parse_trait_value(&mut self.cursor, &mut self.errors)
        } else {
            (None, id.span.end.max(at.span.end))
        };
        self.statements
            .push(Statement::TraitApplication(TraitApplicationStmt {
                id,
                span: Span::new(at.span.start, end),
                value,
            }));
    }

    fn shape_def(&mut self) {
        let kw = self.cursor.bump();
        let shape_type = self.ident(kw);
        let docs = self.cursor.take_docs();
        let name = self
            .same_line_ident()
            .unwrap_or_else(|| self.missing_ident());
        if name.text.is_empty() {
            self.error("expected shape name", Span::empty(kw.span.end));
        }
        let span = Span::new(kw.span.start, name.span.end.max(kw.span.end));
        let kind = body_kind(&shape_type.text);
        self.statements.push(Statement::ShapeDef(ShapeDefStmt {
            shape_type,
            name,
            docs,
            span,
        }));

        self.resource_and_mixins();

        if self.cursor.at(TokenKind::LBrace) {
            self.block(kind);
        }
    }

    /// Optional `for Resource` and `with [A, B]` clauses, in either order.
    fn resource_and_mixins(&mut self) {
        loop {
            let token = self.cursor.peek();
            if token.kind != TokenKind::Ident {
                return;
            }
            match self.cursor.text(token) {
                "for" => {
                    let kw = self.cursor.bump();
                    let resource = match self.same_line_ident() {
                        Some(resource) => resource,
                        None => {
                            self.error("expected resource id after 'for'", Span::empty(kw.span.end));
                            self.missing_ident()
                        }
                    };
                    let span = Span::new(kw.span.start, resource.span.end.max(kw.span.end));
                    self.statements
                        .push(Statement::ForResource(ForResourceStmt { resource, span }));
                }
                "with" => {
                    let kw = self.cursor.bump();
                    let mut names = Vec::new();
                    let mut end = kw.span.end;
                    if self.cursor.eat(TokenKind::LBracket).is_some() {
                        loop {
                            while self.cursor.eat(TokenKind::Comma).is_some() {}
                            let token = self.cursor.peek();
                            match token.kind {
                                TokenKind::RBracket => {
                                    self.cursor.bump();
                                    end = token.span.end;
                                    break;
                                }
                                TokenKind::Ident => {
                                    self.cursor.bump();
                                    names.push(self.ident(token));
                                    end = token.span.end;
                                }
                                _ => {
                                    self.error("expected mixin id", Span::empty(token.span.start));
                                    end = token.span.start;
                                    break;
                                }
                            }
                        }
                    } else {
                        self.error("expected '[' after 'with'", Span::empty(kw.span.end));
                    }
                    self.statements.push(Statement::Mixins(MixinsStmt {
                        names,
                        span: Span::new(kw.span.start, end),
                    }));
                }
                _ => return,
            }
        }
    }

    fn block(&mut self, kind: BodyKind) {
        let open = self.cursor.bump();
        let block_index = self.statements.len();
        self.statements.push(Statement::Block(BlockStmt {
            span: open.span,
            enclosed: None,
        }));
        let end;
        loop {
            let token = self.cursor.peek();
            match token.kind {
                TokenKind::RBrace => {
                    self.cursor.bump();
                    end = token.span.end;
                    break;
                }
                TokenKind::Eof => {
                    self.error("unclosed block", Span::empty(token.span.start));
                    end = token.span.start;
                    break;
                }
                TokenKind::At => self.trait_application(),
                TokenKind::Dollar => {
                    let dollar = self.cursor.bump();
                    self.cursor.clear_docs();
                    let name = self
                        .same_line_ident()
                        .unwrap_or_else(|| self.missing_ident());
                    self.statements
                        .push(Statement::ElidedMemberDef(ElidedMemberDefStmt {
                            span: Span::new(dollar.span.start, name.span.end.max(dollar.span.end)),
                            name,
                        }));
                }
                TokenKind::Ident => self.member(kind),
                TokenKind::Comma => {
                    self.cursor.bump();
                }
                _ => {
                    self.cursor.bump();
                    self.error("unexpected token in block", token.span);
                }
            }
        }
        self.close_block(block_index, end);
    }

    fn close_block(&mut self, block_index: usize, end: usize) {
        let last = self.statements.len() - 1;
        let enclosed = (last > block_index).then_some((block_index + 1, last));
        if let Statement::Block(block) = &mut self.statements[block_index] {
            block.span.end = end;
            block.enclosed = enclosed;
        }
    }

    fn member(&mut self, kind: BodyKind) {
        let docs = self.cursor.take_docs();
        let token = self.cursor.bump();
        let name = self.ident(token);
        match kind {
            BodyKind::Enum => {
                let mut end = name.span.end;
                let value = if self.cursor.eat(TokenKind::Equals).is_some() {
                    let node = parse_node(&mut self.cursor, &mut self.errors);
                    end = node.span().end;
                    Some(node)
                } else {
                    None
                };
                self.statements
                    .push(Statement::EnumMemberDef(EnumMemberDefStmt {
                        span: Span::new(name.span.start, end),
                        name,
                        value,
                        docs,
                    }));
            }
            BodyKind::NodeMembers => {
                let mut end = name.span.end;
                let mut colon = None;
                let mut value = None;
                if let Some(colon_token) = self.cursor.eat(TokenKind::Colon) {
                    colon = Some(colon_token.span);
                    end = colon_token.span.end;
                    if self.value_continues() {
                        let node = parse_node(&mut self.cursor, &mut self.errors);
                        end = node.span().end;
                        value = Some(node);
                    }
                }
                self.statements
                    .push(Statement::NodeMemberDef(NodeMemberDefStmt {
                        span: Span::new(name.span.start, end),
                        name,
                        colon,
                        value,
                    }));
            }
            BodyKind::Operation => {
                if let Some(walrus) = self.cursor.eat(TokenKind::Walrus) {
                    self.statements
                        .push(Statement::InlineMemberDef(InlineMemberDefStmt {
                            span: Span::new(name.span.start, walrus.span.end),
                            name,
                        }));
                    while self.cursor.at(TokenKind::At) {
                        self.trait_application();
                    }
                    self.resource_and_mixins();
                    if self.cursor.at(TokenKind::LBrace) {
                        self.block(BodyKind::Structure);
                    }
                } else if let Some(colon_token) = self.cursor.eat(TokenKind::Colon) {
                    if matches!(
                        self.cursor.peek().kind,
                        TokenKind::LBrace | TokenKind::LBracket
                    ) {
                        let node = parse_node(&mut self.cursor, &mut self.errors);
                        self.statements
                            .push(Statement::NodeMemberDef(NodeMemberDefStmt {
                                span: Span::new(name.span.start, node.span().end),
                                name,
                                colon: Some(colon_token.span),
                                value: Some(node),
                            }));
                    } else {
                        let target = self.same_line_ident();
                        if target.is_none() {
                            self.error("expected member target", Span::empty(self.cursor.prev_end()));
                        }
                        let end = target
                            .as_ref()
                            .map_or(colon_token.span.end, |t| t.span.end);
                        self.statements.push(Statement::MemberDef(MemberDefStmt {
                            span: Span::new(name.span.start, end),
                            name,
                            target,
                            colon: Some(colon_token.span),
                            default: None,
                            docs,
                        }));
                    }
                } else {
                    self.statements.push(Statement::MemberDef(MemberDefStmt {
                        span: name.span,
                        name,
                        target: None,
                        colon: None,
                        default: None,
                        docs,
                    }));
                }
            }
            BodyKind::Structure => {
                let mut end = name.span.end;
                let mut target = None;
                let mut colon = None;
                let mut default = None;
                if let Some(colon_token) = self.cursor.eat(TokenKind::Colon) {
                    colon = Some(colon_token.span);
                    end = colon_token.span.end;
                    target = self.same_line_ident();
                    match &target {
                        Some(t) => end = t.span.end,
                        None => self.error(
                            "expected member target",
                            Span::empty(self.cursor.prev_end()),
                        ),
                    }
                    if self.cursor.eat(TokenKind::Equals).is_some() && self.value_continues() {
                        let node = parse_node(&mut self.cursor, &mut self.errors);
                        end = node.span().end;
                        default = Some(node);
                    }
                }
                self.statements.push(Statement::MemberDef(MemberDefStmt {
                    span: Span::new(name.span.start, end),
                    name,
                    target,
                    colon,
                    default,
                    docs,
                }));
            }
        }
    }
}
