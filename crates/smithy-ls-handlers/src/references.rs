//! Find-references.

use lsp_types::{Location, Position, Uri};
use smithy_ls_model::Shape;
use smithy_ls_project::Project;
use smithy_ls_syntax::node::Node;
use smithy_ls_syntax::position::IdlPosition;
use smithy_ls_syntax::span::Span;
use smithy_ls_syntax::statement::Statement;

use crate::cancel::CancelToken;
use crate::error::{RpcError, RpcResult};
use crate::search::{ResolveScope, ShapeSearch};
use crate::FileView;

/// One reference to a shape inside one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub path: String,
    pub span: Span,
    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// The shape's defining token.
    Definition,
    /// A `use` statement's target.
    Import,
    /// A trait application's id.
    TraitId,
    /// A member target, mixin, `for` resource, or `apply` target ident.
    Target,
    /// A node value resolved to the shape (id-ref or service rename).
    NodeValue,
}

/// Convert a filesystem path into a `file://` URI.
pub fn path_to_uri(path: &str) -> Option<Uri> {
    let prefixed = if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    };
    prefixed.parse().ok()
}

/// The references request: resolves the shape under the cursor and
/// scans the whole project. Unresolvable positions fail the request.
pub fn find_references_request(
    project: &Project,
    file: &FileView<'_>,
    position: Position,
    cancel: &CancelToken,
) -> RpcResult<Vec<Location>> {
    if cancel.is_cancelled() {
        return Ok(Vec::new());
    }
    if file.document.copy_document_id(position).is_none() {
        return Err(RpcError::request_failed(
            "no identifier under the cursor to find references of",
        ));
    }
    let Some(snapshot) = project.snapshot() else {
        return Ok(Vec::new());
    };
    let search = ShapeSearch::new(&snapshot.model_result.model);
    let offset = file.document.index_of(position);
    let classified = IdlPosition::of(file.parsed, file.source(), offset);
    let Some(shape) = search.get_shape_reference(file, classified, offset) else {
        return Err(RpcError::request_failed(
            "the identifier under the cursor does not resolve to a shape",
        ));
    };

    let mut locations = Vec::new();
    for reference in find_references(project, &search, shape, cancel) {
        let Some(project_file) = project.smithy_file(&reference.path) else {
            continue;
        };
        let document = project_file.document();
        let Some(range) = document.range_of(reference.span) else {
            continue;
        };
        let Some(uri) = path_to_uri(&reference.path) else {
            continue;
        };
        locations.push(Location { uri, range });
    }
    Ok(locations)
}

/// Scan every IDL file of the project for references to `target`:
/// trait applications, member targets, mixins, `for` resources, `apply`
/// targets, `use` statements, node values that resolve to the shape,
/// and the defining token itself. Results group per file in scan order.
pub fn find_references(
    project: &Project,
    search: &ShapeSearch<'_>,
    target: &Shape,
    cancel: &CancelToken,
) -> Vec<Reference> {
    let mut references = Vec::new();
    for smithy_file in project.smithy_files() {
        if cancel.is_cancelled() {
            return references;
        }
        let document = smithy_file.document();
        let parsed = smithy_file.parsed();
        let file = FileView::new(smithy_file.path(), &document, &parsed);
        collect_in_file(&file, search, target, &mut references);
    }
    references
}

fn collect_in_file(
    file: &FileView<'_>,
    search: &ShapeSearch<'_>,
    target: &Shape,
    references: &mut Vec<Reference>,
) {
    let scope = ResolveScope::of(file.parsed);
    let mut push = |span: Span, kind: ReferenceKind, references: &mut Vec<Reference>| {
        references.push(Reference {
            path: file.path.to_string(),
            span,
            kind,
        });
    };

    for (index, statement) in file.parsed.statements.iter().enumerate() {
        match statement {
            Statement::Use(stmt) => {
                if resolves_to(search, &scope, &stmt.target.text, target) {
                    push(stmt.target.span, ReferenceKind::Import, references);
                }
            }
            Statement::TraitApplication(stmt) => {
                if resolves_to(search, &scope, &stmt.id.text, target) {
                    push(stmt.id.span, ReferenceKind::TraitId, references);
                }
                if let Some(value) = &stmt.value {
                    collect_in_node(file, search, target, value, index, references);
                }
            }
            Statement::MemberDef(stmt) => {
                if let Some(member_target) = &stmt.target {
                    if resolves_to(search, &scope, &member_target.text, target) {
                        push(member_target.span, ReferenceKind::Target, references);
                    }
                }
            }
            Statement::Mixins(stmt) => {
                for name in &stmt.names {
                    if resolves_to(search, &scope, &name.text, target) {
                        push(name.span, ReferenceKind::Target, references);
                    }
                }
            }
            Statement::ForResource(stmt) => {
                if resolves_to(search, &scope, &stmt.resource.text, target) {
                    push(stmt.resource.span, ReferenceKind::Target, references);
                }
            }
            Statement::Apply(stmt) => {
                if resolves_to(search, &scope, &stmt.target.text, target) {
                    push(stmt.target.span, ReferenceKind::Target, references);
                }
            }
            Statement::NodeMemberDef(stmt) => {
                if let Some(value) = &stmt.value {
                    collect_in_node(file, search, target, value, index, references);
                }
            }
            Statement::ShapeDef(stmt) => {
                if !scope.namespace.is_empty()
                    && target.id.namespace() == scope.namespace
                    && target.id.name() == stmt.name.text
                    && !target.id.is_member()
                {
                    push(stmt.name.span, ReferenceKind::Definition, references);
                }
            }
            _ => {}
        }
    }
}

/// Walk a node value's string/ident leaves; any leaf position the
/// reference search resolves to the target counts.
fn collect_in_node(
    file: &FileView<'_>,
    search: &ShapeSearch<'_>,
    target: &Shape,
    node: &Node,
    statement_index: usize,
    references: &mut Vec<Reference>,
) {
    match node {
        Node::Obj(obj) => {
            for kvp in &obj.kvps {
                // service rename keys are shape ids
                probe_leaf(file, search, target, kvp.key.span, statement_index, references);
                collect_in_node(file, search, target, &kvp.value, statement_index, references);
            }
        }
        Node::Arr(arr) => {
            for element in &arr.elements {
                collect_in_node(file, search, target, element, statement_index, references);
            }
        }
        Node::Str(leaf) => {
            probe_leaf(file, search, target, leaf.span, statement_index, references);
        }
        Node::Ident(leaf) => {
            probe_leaf(file, search, target, leaf.span, statement_index, references);
        }
        _ => {}
    }
}

fn probe_leaf(
    file: &FileView<'_>,
    search: &ShapeSearch<'_>,
    target: &Shape,
    span: Span,
    statement_index: usize,
    references: &mut Vec<Reference>,
) {
    let offset = span.start + span.len().min(1);
    let classified = match file.parsed.statements.get(statement_index) {
        Some(Statement::TraitApplication(_)) => IdlPosition::TraitValue(statement_index),
        Some(Statement::NodeMemberDef(_)) => IdlPosition::NodeMemberTarget(statement_index),
        _ => return,
    };
    let Some(found) = search.get_shape_reference(file, classified, offset) else {
        return;
    };
    if found.id == target.id {
        // strings carry their quotes in the span; narrow to the content
        let narrowed = narrow_string_span(file, span);
        references.push(Reference {
            path: file.path.to_string(),
            span: narrowed,
            kind: ReferenceKind::NodeValue,
        });
    }
}

/// Drop surrounding quotes from a string token's span.
fn narrow_string_span(file: &FileView<'_>, span: Span) -> Span {
    let text = file.document.slice(span);
    if text.starts_with('"') && text.ends_with('"') && text.len() >= 2 {
        Span::new(span.start + 1, span.end - 1)
    } else {
        span
    }
}

fn resolves_to(
    search: &ShapeSearch<'_>,
    scope: &ResolveScope<'_>,
    token: &str,
    target: &Shape,
) -> bool {
    search
        .resolve(token, scope)
        .is_some_and(|shape| shape.id == target.id)
}
