//! Inlay hints for inline operation inputs and outputs.

use lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, Range};
use smithy_ls_syntax::statement::Statement;

use crate::cancel::CancelToken;
use crate::FileView;

/// For each `input :=` / `output :=` the hint shows the name of the
/// generated structure: the operation name plus the input/output
/// suffix, which `$operationInputSuffix`/`$operationOutputSuffix`
/// control statements may override before the first shape definition.
pub fn inlay_hints(file: &FileView<'_>, range: Range, cancel: &CancelToken) -> Vec<InlayHint> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let mut input_suffix = "Input".to_string();
    let mut output_suffix = "Output".to_string();
    let mut current_operation: Option<&str> = None;
    let mut seen_shape_def = false;
    let mut hints = Vec::new();

    let start = file.document.index_of(range.start);
    let end = file.document.index_of(range.end);

    for statement in &file.parsed.statements {
        match statement {
            // suffix controls only count before the first shape
            Statement::Control(stmt) if !seen_shape_def => {
                let value = stmt.value.as_ref().and_then(|v| v.as_text());
                match (stmt.key.text.as_str(), value) {
                    ("operationInputSuffix", Some(suffix)) => input_suffix = suffix.to_string(),
                    ("operationOutputSuffix", Some(suffix)) => output_suffix = suffix.to_string(),
                    _ => {}
                }
            }
            Statement::ShapeDef(def) => {
                seen_shape_def = true;
                current_operation = (def.shape_type.text == "operation")
                    .then_some(def.name.text.as_str());
            }
            Statement::InlineMemberDef(stmt) => {
                let Some(operation) = current_operation else {
                    continue;
                };
                if stmt.span.end < start || stmt.span.start > end {
                    continue;
                }
                let suffix = if stmt.name.text == "input" {
                    &input_suffix
                } else {
                    &output_suffix
                };
                hints.push(InlayHint {
                    position: file.document.position_of(stmt.span.end),
                    label: InlayHintLabel::String(format!("{operation}{suffix}")),
                    kind: Some(InlayHintKind::TYPE),
                    text_edits: None,
                    tooltip: None,
                    padding_left: Some(true),
                    padding_right: None,
                    data: None,
                });
            }
            _ => {}
        }
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;
    use smithy_ls_syntax::document::Document;
    use smithy_ls_syntax::parse::parse_idl;

    fn hints_for(source: &str) -> Vec<String> {
        let document = Document::of(source);
        let parsed = parse_idl(&document);
        let file = crate::FileView::new("a.smithy", &document, &parsed);
        let full = Range {
            start: Position { line: 0, character: 0 },
            end: document.position_of(document.len()),
        };
        inlay_hints(&file, full, &CancelToken::new())
            .into_iter()
            .map(|hint| match hint.label {
                InlayHintLabel::String(label) => label,
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn default_suffixes() {
        let labels = hints_for(
            "$version: \"2\"\nnamespace com.a\noperation GetThing {\n    input := {}\n    output := {}\n}\n",
        );
        assert_eq!(labels, vec!["GetThingInput", "GetThingOutput"]);
    }

    #[test]
    fn control_statements_override_suffixes() {
        let labels = hints_for(
            "$version: \"2\"\n$operationInputSuffix: \"Request\"\n$operationOutputSuffix: \"Response\"\nnamespace com.a\noperation Call {\n    input := {}\n    output := {}\n}\n",
        );
        assert_eq!(labels, vec!["CallRequest", "CallResponse"]);
    }
}
