//! The flat statement list an IDL file parses into.
//!
//! Statements are emitted in source order. A `Block` records the indices
//! of the first and last statement it encloses, so membership tests are
//! index-range checks rather than tree walks. Member-bearing statements
//! always follow the `ShapeDef` (or `InlineMemberDef`) they belong to.

use std::collections::BTreeSet;

use crate::node::Node;
use crate::span::Span;

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `$key: value`
    Control(ControlStmt),
    /// `metadata key = value`
    Metadata(MetadataStmt),
    /// `namespace com.example`
    Namespace(NamespaceStmt),
    /// `use com.example#Shape`
    Use(UseStmt),
    /// `structure Name`, `operation Name`, `string Name`, ...
    ShapeDef(ShapeDefStmt),
    /// `{ ... }` following a shape definition or an inline member.
    Block(BlockStmt),
    /// `for Resource`
    ForResource(ForResourceStmt),
    /// `with [A, B]`
    Mixins(MixinsStmt),
    /// `@id` or `@id(value)`
    TraitApplication(TraitApplicationStmt),
    /// `apply Target`
    Apply(ApplyStmt),
    /// `name: Target` inside a structure, union, list, map, or operation.
    MemberDef(MemberDefStmt),
    /// `NAME` inside an enum or intEnum body.
    EnumMemberDef(EnumMemberDefStmt),
    /// `$name` inside a structure body.
    ElidedMemberDef(ElidedMemberDefStmt),
    /// `name: <node>` inside a service or resource body.
    NodeMemberDef(NodeMemberDefStmt),
    /// `name :=` introducing an inline structure in an operation body.
    InlineMemberDef(InlineMemberDefStmt),
    /// A stray identifier in statement position, usually mid-typing.
    Incomplete(Ident),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlStmt {
    pub key: Ident,
    pub value: Option<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataStmt {
    pub key: Ident,
    pub value: Option<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceStmt {
    pub name: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseStmt {
    pub target: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDefStmt {
    pub shape_type: Ident,
    pub name: Ident,
    pub docs: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStmt {
    pub span: Span,
    /// Indices of the first and last enclosed statement, when any.
    pub enclosed: Option<(usize, usize)>,
}

impl BlockStmt {
    /// Whether the statement at `index` lies inside this block.
    pub fn encloses(&self, index: usize) -> bool {
        self.enclosed
            .is_some_and(|(first, last)| first <= index && index <= last)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForResourceStmt {
    pub resource: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinsStmt {
    pub names: Vec<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitApplicationStmt {
    /// Trait id without the leading `@`.
    pub id: Ident,
    /// Span including the leading `@` (and the value parens when present).
    pub span: Span,
    pub value: Option<Node>,
}

impl TraitApplicationStmt {
    /// Span of the id including the leading `@`.
    pub fn at_id_span(&self) -> Span {
        Span::new(self.span.start, self.id.span.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyStmt {
    pub target: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberDefStmt {
    pub name: Ident,
    pub target: Option<Ident>,
    /// Span of the `:` separator, when present.
    pub colon: Option<Span>,
    /// `= default` assigned value, when present.
    pub default: Option<Node>,
    pub docs: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMemberDefStmt {
    pub name: Ident,
    pub value: Option<Node>,
    pub docs: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElidedMemberDefStmt {
    /// Member name without the leading `$`.
    pub name: Ident,
    /// Span including the leading `$`.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeMemberDefStmt {
    pub name: Ident,
    /// Span of the `:` separator, when present.
    pub colon: Option<Span>,
    pub value: Option<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMemberDefStmt {
    pub name: Ident,
    pub span: Span,
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Control(s) => s.span,
            Statement::Metadata(s) => s.span,
            Statement::Namespace(s) => s.span,
            Statement::Use(s) => s.span,
            Statement::ShapeDef(s) => s.span,
            Statement::Block(s) => s.span,
            Statement::ForResource(s) => s.span,
            Statement::Mixins(s) => s.span,
            Statement::TraitApplication(s) => s.span,
            Statement::Apply(s) => s.span,
            Statement::MemberDef(s) => s.span,
            Statement::EnumMemberDef(s) => s.span,
            Statement::ElidedMemberDef(s) => s.span,
            Statement::NodeMemberDef(s) => s.span,
            Statement::InlineMemberDef(s) => s.span,
            Statement::Incomplete(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A parse-time diagnostic. These never halt parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub severity: Severity,
}

/// The declared `$version` control value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDecl {
    pub value: String,
    /// Span of the whole `$version: "..."` statement.
    pub span: Span,
}

/// The declared namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub name: String,
    pub statement_span: Span,
    pub value_span: Span,
}

/// The file's `use` targets plus the range covering all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Imports {
    pub ids: BTreeSet<String>,
    pub span: Option<Span>,
}

/// Immutable result of parsing one IDL file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseResult {
    pub version: Option<VersionDecl>,
    pub namespace: Option<NamespaceDecl>,
    pub imports: Imports,
    pub statements: Vec<Statement>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// The namespace name, or `""` when the file has not declared one.
    pub fn namespace_name(&self) -> &str {
        self.namespace.as_ref().map_or("", |ns| ns.name.as_str())
    }

    /// Index of the statement owning `offset`: the one whose span
    /// touches the offset, innermost (narrowest) first.
    pub fn statement_index_at(&self, offset: usize) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (index, statement) in self.statements.iter().enumerate() {
            let span = statement.span();
            if !span.touches(offset) {
                continue;
            }
            let width = span.len();
            match best {
                Some((_, best_width)) if best_width < width => {}
                _ => best = Some((index, width)),
            }
        }
        best.map(|(index, _)| index)
    }
}
