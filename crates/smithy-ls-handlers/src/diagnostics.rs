//! Diagnostics published per file.

use lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};
use smithy_ls_model::{Model, NodeValue, Severity, SourceLocation, ValidationEvent};
use smithy_ls_project::{Project, ProjectKind};
use smithy_ls_syntax::document::Document;
use smithy_ls_syntax::statement::{Severity as ParseSeverity, Statement};

use crate::cancel::CancelToken;
use crate::FileView;

pub const SOURCE: &str = "smithy-language-server";
pub const CODE_MIGRATE: &str = "migrating-idl-1-to-2";
pub const CODE_DEFINE_VERSION: &str = "define-idl-version";
pub const CODE_DETACHED: &str = "detached-file";
pub const CODE_USE_SMITHY_BUILD: &str = "use-smithy-build";

/// Map a validation severity onto the LSP scale.
pub fn lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error | Severity::Danger => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Note => DiagnosticSeverity::INFORMATION,
    }
}

/// Diagnostics for one IDL file.
pub fn file_diagnostics(
    project: &Project,
    file: &FileView<'_>,
    minimum_severity: Severity,
    cancel: &CancelToken,
) -> Vec<Diagnostic> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    if project
        .smithy_file(file.path)
        .is_some_and(|smithy_file| smithy_file.is_from_jar())
    {
        return Vec::new();
    }

    let mut diagnostics = Vec::new();
    version_diagnostic(file, &mut diagnostics);

    if project.kind() == ProjectKind::Detached {
        let line_end = file.document.line_end(0) as u32;
        diagnostics.push(diagnostic(
            Range {
                start: Position { line: 0, character: 0 },
                end: Position {
                    line: 0,
                    character: line_end,
                },
            },
            DiagnosticSeverity::WARNING,
            CODE_DETACHED,
            "This file isn't attached to a project",
        ));
    }

    for error in &file.parsed.errors {
        let severity = match error.severity {
            ParseSeverity::Error => DiagnosticSeverity::ERROR,
            ParseSeverity::Warning => DiagnosticSeverity::WARNING,
        };
        let range = file
            .document
            .range_of(error.span)
            .unwrap_or_else(zero_range);
        diagnostics.push(diagnostic(range, severity, "Parse", &error.message));
    }

    if cancel.is_cancelled() {
        return diagnostics;
    }

    if let Some(snapshot) = project.snapshot() {
        let suppressions = suppression_rules(&snapshot.model_result.model);
        for event in &snapshot.model_result.events {
            if event.location.filename != file.path || event.severity < minimum_severity {
                continue;
            }
            if is_suppressed(event, &suppressions) {
                continue;
            }
            diagnostics.push(diagnostic(
                event_range(event, file),
                lsp_severity(event.severity),
                &event.id,
                &event.message,
            ));
        }
    }
    diagnostics
}

/// `(event id, namespace)` pairs from every `suppressions` metadata
/// entry in the model. Entries are per contributing file, so each
/// file's suppressions count.
fn suppression_rules(model: &Model) -> Vec<(String, String)> {
    let mut rules = Vec::new();
    for entry in model.metadata() {
        if entry.key != "suppressions" {
            continue;
        }
        let Some(items) = entry.value.as_arr() else {
            continue;
        };
        for item in items {
            let Some(id) = item.get("id").and_then(NodeValue::as_str) else {
                continue;
            };
            let namespace = item
                .get("namespace")
                .and_then(NodeValue::as_str)
                .unwrap_or("*");
            rules.push((id.to_string(), namespace.to_string()));
        }
    }
    rules
}

fn is_suppressed(event: &ValidationEvent, rules: &[(String, String)]) -> bool {
    rules.iter().any(|(id, namespace)| {
        id == &event.id
            && (namespace == "*"
                || event
                    .shape_id
                    .as_ref()
                    .is_some_and(|shape| shape.namespace() == namespace))
    })
}

/// Diagnostics for a build file: the structural/resolution events the
/// config loader pinned into it, plus the legacy-file advisory.
pub fn build_file_diagnostics(project: &Project, path: &str) -> Vec<Diagnostic> {
    let Some(build_file) = project.build_file(path) else {
        return Vec::new();
    };
    let mut diagnostics = Vec::new();
    if build_file.file_type.is_legacy() {
        diagnostics.push(diagnostic(
            zero_range(),
            DiagnosticSeverity::WARNING,
            CODE_USE_SMITHY_BUILD,
            "This file is deprecated; use smithy-build.json instead",
        ));
    }
    for event in project.config_events() {
        if event.location.filename != path {
            continue;
        }
        let range = location_range(&event.location, &build_file.document);
        diagnostics.push(diagnostic(
            range,
            lsp_severity(event.severity),
            &event.id,
            &event.message,
        ));
    }
    diagnostics
}

/// The `$version` advisory: missing versions should be defined, and
/// version 1 files should be upgraded.
fn version_diagnostic(file: &FileView<'_>, diagnostics: &mut Vec<Diagnostic>) {
    match &file.parsed.version {
        None => {
            diagnostics.push(diagnostic(
                zero_range(),
                DiagnosticSeverity::WARNING,
                CODE_DEFINE_VERSION,
                "This file should define a version. Add `$version: \"2\"` to the top of the file",
            ));
        }
        Some(version) if version.value.starts_with('1') => {
            let range = file
                .document
                .range_of(version.span)
                .unwrap_or_else(zero_range);
            diagnostics.push(diagnostic(
                range,
                DiagnosticSeverity::WARNING,
                CODE_MIGRATE,
                "This file uses Smithy IDL 1.0; upgrade it to 2.0",
            ));
        }
        Some(_) => {}
    }
}

/// Precise range for a model event: member-target events point at the
/// target identifier, trait-application events at `@id`, everything
/// else at the contiguous token under the event's position.
fn event_range(event: &ValidationEvent, file: &FileView<'_>) -> Range {
    let offset = location_offset(&event.location, file.document);
    if event.shape_id.is_some() {
        if let Some(index) = file.parsed.statement_index_at(offset) {
            match &file.parsed.statements[index] {
                Statement::MemberDef(stmt) if event.id.contains("Target") => {
                    if let Some(target) = &stmt.target {
                        if let Some(range) = file.document.range_of(target.span) {
                            return range;
                        }
                    }
                }
                Statement::TraitApplication(stmt) => {
                    if let Some(range) = file.document.range_of(stmt.at_id_span()) {
                        return range;
                    }
                }
                _ => {}
            }
        }
    }
    token_range_at(file.document, offset)
}

/// The contiguous identifier token at `offset`, or a zero-width range
/// there.
fn token_range_at(document: &Document, offset: usize) -> Range {
    let position = document.position_of(offset);
    document
        .copy_document_id(position)
        .map(|id| id.range)
        .unwrap_or(Range {
            start: position,
            end: position,
        })
}

fn location_offset(location: &SourceLocation, document: &Document) -> usize {
    document.index_of(Position {
        line: location.line.saturating_sub(1),
        character: location.column.saturating_sub(1),
    })
}

fn location_range(location: &SourceLocation, document: &Document) -> Range {
    let offset = location_offset(location, document);
    token_range_at(document, offset)
}

fn zero_range() -> Range {
    Range {
        start: Position { line: 0, character: 0 },
        end: Position { line: 0, character: 0 },
    }
}

fn diagnostic(
    range: Range,
    severity: DiagnosticSeverity,
    code: &str,
    message: &str,
) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(severity),
        code: Some(NumberOrString::String(code.to_string())),
        source: Some(SOURCE.to_string()),
        message: message.to_string(),
        ..Diagnostic::default()
    }
}

/// Helper for the dispatcher: diagnostics for whatever kind of file
/// `path` is in `project`.
pub fn diagnostics_for_path(
    project: &Project,
    path: &str,
    minimum_severity: Severity,
    cancel: &CancelToken,
) -> Vec<Diagnostic> {
    if project.build_file(path).is_some() {
        return build_file_diagnostics(project, path);
    }
    let Some(smithy_file) = project.smithy_file(path) else {
        return Vec::new();
    };
    let document = smithy_file.document();
    let parsed = smithy_file.parsed();
    let file = FileView::new(path, &document, &parsed);
    file_diagnostics(project, &file, minimum_severity, cancel)
}
