//! Hover.

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};
use smithy_ls_model::{builtins, Model, Severity, Shape, ShapeType};
use smithy_ls_project::Project;
use smithy_ls_syntax::position::IdlPosition;
use smithy_ls_syntax::statement::Statement;
use smithy_ls_syntax::view::StatementView;

use crate::cancel::CancelToken;
use crate::search::{NodeSearchResult, ShapeSearch};
use crate::FileView;

/// Answer a hover request with markdown, or nothing.
pub fn hover(
    project: &Project,
    file: &FileView<'_>,
    position: Position,
    minimum_severity: Severity,
    cancel: &CancelToken,
) -> Option<Hover> {
    if cancel.is_cancelled() {
        return None;
    }
    file.document.copy_document_id(position)?;

    let snapshot = project.snapshot()?;
    let model = &snapshot.model_result.model;
    let search = ShapeSearch::new(model);
    let offset = file.document.index_of(position);
    let classified = IdlPosition::of(file.parsed, file.source(), offset);

    let markdown = match classified {
        IdlPosition::ControlKey(index) => {
            let Statement::Control(stmt) = file.parsed.statements.get(index)? else {
                return None;
            };
            builtin_member_docs(builtins::control_statements(), &stmt.key.text)
        }
        IdlPosition::MetadataKey(index) => {
            let Statement::Metadata(stmt) = file.parsed.statements.get(index)? else {
                return None;
            };
            builtin_member_docs(builtins::metadata_statements(), &stmt.key.text)
        }
        IdlPosition::StatementKeyword(_) => None,
        IdlPosition::MemberName(index) => {
            builtin_body_member_docs(file, index).or_else(|| {
                model_hover(&search, file, classified, offset, &snapshot, minimum_severity)
            })
        }
        IdlPosition::MetadataValue(index) => {
            match search.search_metadata_value(file, index, offset) {
                NodeSearchResult::TerminalShape(shape, node)
                    if shape.has_trait_named("smithy.api#idRef") =>
                {
                    let referenced = search.resolve(
                        node.as_text()?,
                        &crate::search::ResolveScope::of(file.parsed),
                    )?;
                    Some(shape_markdown(referenced, model, &[], minimum_severity))
                }
                NodeSearchResult::ObjectKey(key, container) => {
                    builtin_member_docs(container, &key.value)
                }
                NodeSearchResult::TerminalShape(shape, _) => {
                    shape.documentation().map(str::to_string)
                }
                _ => None,
            }
        }
        _ => model_hover(&search, file, classified, offset, &snapshot, minimum_severity),
    }?;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: None,
    })
}

/// Documentation for a member of a builtins shape, with the containing
/// shape's external-documentation links appended.
fn builtin_member_docs(container: &Shape, member_name: &str) -> Option<String> {
    let model = builtins::builtins();
    let member_id = container.get_member(member_name)?;
    let member = model.get_shape(member_id)?;
    let mut text = member.documentation()?.to_string();

    let external = container.get_trait(&smithy_ls_model::ShapeId::new(
        builtins::PRELUDE,
        "externalDocumentation",
    ));
    if let Some(external) = external {
        if let Some(links) = external.value.as_obj() {
            for (title, url) in links {
                if let Some(url) = url.as_str() {
                    text.push_str(&format!("\n\n[{title}]({url})"));
                }
            }
        }
    }
    Some(text)
}

/// Docs for a member name inside a service/resource/operation body,
/// from the builtins member layout.
fn builtin_body_member_docs(file: &FileView<'_>, index: usize) -> Option<String> {
    let name = match file.parsed.statements.get(index)? {
        Statement::NodeMemberDef(stmt) => &stmt.name.text,
        Statement::MemberDef(stmt) => &stmt.name.text,
        Statement::InlineMemberDef(stmt) => &stmt.name.text,
        _ => return None,
    };
    let view = StatementView::at_index(file.parsed, file.source(), index)?;
    let (_, shape_def) = view.nearest_shape_def_before()?;
    let body = builtins::shape_body(&shape_def.shape_type.text)?;
    builtin_member_docs(body, name)
}

/// Model-sensitive hover: the found shape serialized back to IDL,
/// prefixed with its validation events.
fn model_hover(
    search: &ShapeSearch<'_>,
    file: &FileView<'_>,
    classified: IdlPosition,
    offset: usize,
    snapshot: &smithy_ls_project::ProjectSnapshot,
    minimum_severity: Severity,
) -> Option<String> {
    let shape = match classified {
        IdlPosition::ElidedMember(index) => search.find_elided_member_parent(file, index),
        IdlPosition::TraitValue(index) => {
            match search.search_trait_value(file, index, offset) {
                NodeSearchResult::TerminalShape(terminal, node)
                    if terminal.has_trait_named("smithy.api#idRef") =>
                {
                    search.resolve(
                        node.as_text()?,
                        &crate::search::ResolveScope::of(file.parsed),
                    )
                }
                _ => None,
            }
        }
        other => search.find_shape_definition(file, other, offset),
    }?;
    Some(shape_markdown(
        shape,
        search.model().model(),
        &snapshot.model_result.events,
        minimum_severity,
    ))
}

/// Serialize a shape to IDL inside a fenced code block, with matching
/// validation events ahead of it. Documentation traits stay on the
/// serialized shape; stripping them would leave empty `apply` blocks on
/// members that inherit docs through mixins.
fn shape_markdown(
    shape: &Shape,
    model: &Model,
    events: &[smithy_ls_model::ValidationEvent],
    minimum_severity: Severity,
) -> String {
    let mut out = String::new();
    for event in events {
        if event.severity < minimum_severity {
            continue;
        }
        let matches = event
            .shape_id
            .as_ref()
            .is_some_and(|id| *id == shape.id || *id == shape.id.container());
        if matches {
            out.push_str(&format!("**{}**: {}\n\n", event.severity, event.message));
        }
    }
    out.push_str("```smithy\n");
    out.push_str(&format!("namespace {}\n\n", shape.id.namespace()));
    render_shape(&mut out, shape, model, 0);
    out.push_str("```\n");
    out
}

fn render_shape(out: &mut String, shape: &Shape, model: &Model, depth: usize) {
    let indent = "    ".repeat(depth);
    for line in trait_lines(shape) {
        out.push_str(&format!("{indent}{line}\n"));
    }
    match shape.shape_type {
        ShapeType::Member => {
            let target = shape
                .target
                .as_ref()
                .map(|t| t.name().to_string())
                .unwrap_or_default();
            let name = shape.id.member().unwrap_or("member");
            out.push_str(&format!("{indent}{name}: {target}\n"));
        }
        ShapeType::Structure
        | ShapeType::Union
        | ShapeType::Enum
        | ShapeType::IntEnum
        | ShapeType::List
        | ShapeType::Map => {
            out.push_str(&format!(
                "{indent}{} {} {{\n",
                shape.shape_type.keyword(),
                shape.id.name()
            ));
            for member_id in shape.members.values() {
                if let Some(member) = model
                    .get_shape(member_id)
                    .or_else(|| builtins::builtins().get_shape(member_id))
                {
                    render_shape(out, member, model, depth + 1);
                }
            }
            out.push_str(&format!("{indent}}}\n"));
        }
        ShapeType::Service | ShapeType::Resource | ShapeType::Operation => {
            out.push_str(&format!(
                "{indent}{} {} {{\n",
                shape.shape_type.keyword(),
                shape.id.name()
            ));
            for (name, member_id) in &shape.members {
                let target = model
                    .get_shape(member_id)
                    .and_then(|member| member.target.as_ref())
                    .map(|t| t.name().to_string())
                    .unwrap_or_default();
                out.push_str(&format!("{indent}    {name}: {target}\n"));
            }
            for (name, target) in &shape.identifiers {
                out.push_str(&format!("{indent}    // identifier {name}: {}\n", target.name()));
            }
            out.push_str(&format!("{indent}}}\n"));
        }
        _ => {
            out.push_str(&format!(
                "{indent}{} {}\n",
                shape.shape_type.keyword(),
                shape.id.name()
            ));
        }
    }
}

/// Trait applications rendered as `@id` / `@id(...)` lines. Doc
/// comments come out as `///` lines.
fn trait_lines(shape: &Shape) -> Vec<String> {
    let mut lines = Vec::new();
    for application in &shape.traits {
        let id = &application.id;
        if id.namespace() == builtins::PRELUDE && id.name() == "documentation" {
            if let Some(docs) = application.value.as_str() {
                for doc_line in docs.lines() {
                    lines.push(format!("/// {doc_line}"));
                }
                continue;
            }
        }
        let rendered = render_value(&application.value);
        if rendered == "{}" {
            lines.push(format!("@{}", id.name()));
        } else {
            lines.push(format!("@{}({rendered})", id.name()));
        }
    }
    lines
}

fn render_value(value: &smithy_ls_model::NodeValue) -> String {
    use smithy_ls_model::NodeValue;
    match value {
        NodeValue::Obj(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{key}: {}", render_value(value)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        NodeValue::Arr(values) => {
            let parts: Vec<String> = values.iter().map(render_value).collect();
            format!("[{}]", parts.join(", "))
        }
        NodeValue::Str(text) => format!("{text:?}"),
        NodeValue::Num(number) => {
            if number.fract() == 0.0 {
                format!("{}", *number as i64)
            } else {
                format!("{number}")
            }
        }
        NodeValue::Bool(value) => value.to_string(),
        NodeValue::Null => "null".to_string(),
    }
}
