//! Rename.

use std::collections::{BTreeMap, HashMap};

use lsp_types::{Position, Range, TextEdit, Uri, WorkspaceEdit};
use smithy_ls_model::{Shape, ShapeId};
use smithy_ls_project::Project;
use smithy_ls_syntax::position::IdlPosition;
use smithy_ls_syntax::span::Span;
use smithy_ls_syntax::statement::Statement;

use crate::cancel::CancelToken;
use crate::error::{RpcError, RpcResult};
use crate::references::{find_references, path_to_uri, Reference, ReferenceKind};
use crate::search::ShapeSearch;
use crate::FileView;

/// `prepareRename`: the identifier range under the cursor, when it
/// resolves to a renameable shape.
pub fn prepare_rename(
    project: &Project,
    file: &FileView<'_>,
    position: Position,
) -> Option<Range> {
    let token = file.document.copy_document_id(position)?;
    let snapshot = project.snapshot()?;
    let search = ShapeSearch::new(&snapshot.model_result.model);
    let offset = file.document.index_of(position);
    let classified = IdlPosition::of(file.parsed, file.source(), offset);
    search
        .get_shape_reference(file, classified, offset)
        .map(|_| token.range)
}

/// The rename request. Every reference in the project is rewritten; in
/// files where the new simple name would be ambiguous the references
/// are expanded to fully-qualified ids and the now-wrong `use` is
/// dropped.
pub fn rename(
    project: &Project,
    file: &FileView<'_>,
    position: Position,
    new_name: &str,
    cancel: &CancelToken,
) -> RpcResult<WorkspaceEdit> {
    if file.document.copy_document_id(position).is_none() {
        return Err(RpcError::request_failed("nothing to rename at this position"));
    }
    let Some(snapshot) = project.snapshot() else {
        return Err(RpcError::request_failed("no model loaded"));
    };
    let search = ShapeSearch::new(&snapshot.model_result.model);
    let offset = file.document.index_of(position);
    let classified = IdlPosition::of(file.parsed, file.source(), offset);
    let Some(shape) = search.get_shape_reference(file, classified, offset) else {
        return Err(RpcError::request_failed(
            "the identifier under the cursor does not resolve to a renameable shape",
        ));
    };

    let new_id = ShapeId::new(shape.id.namespace(), new_name);
    tracing::debug!(from = %shape.id, to = %new_id, "rename");
    let references = find_references(project, &search, shape, cancel);

    for reference in &references {
        if project
            .smithy_file(&reference.path)
            .is_some_and(|f| f.is_from_jar())
        {
            return Err(RpcError::request_failed(
                "cannot rename a shape referenced in a jar",
            ));
        }
    }

    let mut by_file: BTreeMap<String, Vec<&Reference>> = BTreeMap::new();
    for reference in &references {
        by_file.entry(reference.path.clone()).or_default().push(reference);
    }

    let mut changes: HashMap<Uri, Vec<TextEdit>> = HashMap::new();
    for (path, file_references) in by_file {
        let Some(project_file) = project.smithy_file(&path) else {
            continue;
        };
        let document = project_file.document();
        let parsed = project_file.parsed();
        let target_file = FileView::new(&path, &document, &parsed);

        let defines_shape = file_references
            .iter()
            .any(|reference| reference.kind == ReferenceKind::Definition);
        let conflicted = !defines_shape && has_conflict(&target_file, &search, shape, new_name);

        let mut edits = Vec::new();
        for reference in &file_references {
            if conflicted && reference.kind == ReferenceKind::Import {
                // the import goes away with the fully-qualified rewrite
                remove_statement_line(&target_file, reference.span, &mut edits);
                continue;
            }
            let span = if conflicted {
                reference.span
            } else {
                simple_name_span(&target_file, reference.span)
            };
            let replacement = if conflicted {
                qualified_replacement(&target_file, reference.span, &new_id)
            } else {
                new_name.to_string()
            };
            if let Some(range) = target_file.document.range_of(span) {
                edits.push(TextEdit {
                    range,
                    new_text: replacement,
                });
            }
        }

        if defines_shape {
            deconflict_definition_file(&target_file, &search, shape, new_name, &mut edits);
        }

        if let Some(uri) = path_to_uri(&path) {
            changes.entry(uri).or_default().extend(edits);
        }
    }

    Ok(WorkspaceEdit {
        changes: Some(changes),
        document_changes: None,
        change_annotations: None,
    })
}

/// Whether renaming to `new_name` is ambiguous inside `file`: it
/// already imports a different shape with that simple name, or a shape
/// with that name exists in the file's namespace.
fn has_conflict(
    file: &FileView<'_>,
    search: &ShapeSearch<'_>,
    renamed: &Shape,
    new_name: &str,
) -> bool {
    for import in file.parsed.imports.ids.iter() {
        if let Ok(id) = import.parse::<ShapeId>() {
            if id.name() == new_name && id != renamed.id {
                return true;
            }
        }
    }
    let namespace = file.parsed.namespace_name();
    if namespace.is_empty() || namespace == renamed.id.namespace() {
        return false;
    }
    search
        .model()
        .get(&ShapeId::new(namespace, new_name))
        .is_some()
}

/// Narrow a reference span to its simple-name portion: past any
/// `namespace#` prefix and before any `$member` suffix.
fn simple_name_span(file: &FileView<'_>, span: Span) -> Span {
    let text = file.document.slice(span);
    let start = text.find('#').map(|at| at + 1).unwrap_or(0);
    let end = text[start..]
        .find('$')
        .map(|at| start + at)
        .unwrap_or(text.len());
    Span::new(span.start + start, span.start + end)
}

/// The fully-qualified replacement for a reference, preserving a
/// member suffix when one was written.
fn qualified_replacement(file: &FileView<'_>, span: Span, new_id: &ShapeId) -> String {
    let text = file.document.slice(span);
    match text.find('$') {
        Some(at) => format!("{new_id}{}", &text[at..]),
        None => new_id.to_string(),
    }
}

/// Delete the whole line a `use` statement sits on.
fn remove_statement_line(file: &FileView<'_>, target_span: Span, edits: &mut Vec<TextEdit>) {
    let Some(index) = file.parsed.statement_index_at(target_span.start) else {
        return;
    };
    let statement_span = file.parsed.statements[index].span();
    let start = file.document.position_of(statement_span.start);
    let next_line_start = Position {
        line: start.line + 1,
        character: 0,
    };
    edits.push(TextEdit {
        range: Range {
            start: Position {
                line: start.line,
                character: 0,
            },
            end: next_line_start,
        },
        new_text: String::new(),
    });
}

/// In the file that defines the renamed shape, an import with the new
/// simple name now collides: rewrite that import's uses to
/// fully-qualified ids and drop the import.
fn deconflict_definition_file(
    file: &FileView<'_>,
    search: &ShapeSearch<'_>,
    renamed: &Shape,
    new_name: &str,
    edits: &mut Vec<TextEdit>,
) {
    let conflicting: Option<ShapeId> = file.parsed.imports.ids.iter().find_map(|import| {
        let id = import.parse::<ShapeId>().ok()?;
        (id.name() == new_name && id != renamed.id).then_some(id)
    });
    let Some(conflicting) = conflicting else {
        return;
    };
    let Some(conflicting_shape) = search.model().get(&conflicting) else {
        return;
    };

    for statement in &file.parsed.statements {
        match statement {
            Statement::Use(stmt) => {
                if stmt.target.text == conflicting.to_string() {
                    remove_statement_line(file, stmt.target.span, edits);
                }
            }
            Statement::MemberDef(stmt) => {
                if let Some(target) = &stmt.target {
                    if target.text == conflicting_shape.id.name() {
                        if let Some(range) = file.document.range_of(target.span) {
                            edits.push(TextEdit {
                                range,
                                new_text: conflicting.to_string(),
                            });
                        }
                    }
                }
            }
            Statement::TraitApplication(stmt) => {
                if stmt.id.text == conflicting.name() {
                    if let Some(range) = file.document.range_of(stmt.id.span) {
                        edits.push(TextEdit {
                            range,
                            new_text: conflicting.to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}
