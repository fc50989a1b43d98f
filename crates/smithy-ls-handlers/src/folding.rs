//! Folding ranges.

use lsp_types::{FoldingRange, FoldingRangeKind};
use smithy_ls_syntax::node::Node;
use smithy_ls_syntax::span::Span;
use smithy_ls_syntax::statement::Statement;

use crate::cancel::CancelToken;
use crate::FileView;

/// Folds: the imports block, every multi-line block, every multi-line
/// object or array node, and every contiguous run of trait
/// applications.
pub fn folding_ranges(file: &FileView<'_>, cancel: &CancelToken) -> Vec<FoldingRange> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let mut ranges = Vec::new();

    if let Some(imports) = file.parsed.imports.span {
        push_range(file, imports, Some(FoldingRangeKind::Imports), &mut ranges);
    }

    let mut trait_run: Option<Span> = None;
    for statement in &file.parsed.statements {
        match statement {
            Statement::TraitApplication(stmt) => {
                trait_run = Some(match trait_run {
                    Some(run) => run.union(stmt.span),
                    None => stmt.span,
                });
                if let Some(value) = &stmt.value {
                    fold_node(file, value, &mut ranges);
                }
                continue;
            }
            Statement::Block(block) => {
                push_range(file, block.span, None, &mut ranges);
            }
            Statement::Metadata(stmt) => {
                if let Some(value) = &stmt.value {
                    fold_node(file, value, &mut ranges);
                }
            }
            Statement::NodeMemberDef(stmt) => {
                if let Some(value) = &stmt.value {
                    fold_node(file, value, &mut ranges);
                }
            }
            _ => {}
        }
        if let Some(run) = trait_run.take() {
            push_range(file, run, None, &mut ranges);
        }
    }
    if let Some(run) = trait_run {
        push_range(file, run, None, &mut ranges);
    }

    ranges.sort_by_key(|range| (range.start_line, range.end_line));
    ranges.dedup();
    ranges
}

fn fold_node(file: &FileView<'_>, node: &Node, ranges: &mut Vec<FoldingRange>) {
    match node {
        Node::Obj(obj) => {
            push_range(file, obj.span, None, ranges);
            for kvp in &obj.kvps {
                fold_node(file, &kvp.value, ranges);
            }
        }
        Node::Arr(arr) => {
            push_range(file, arr.span, None, ranges);
            for element in &arr.elements {
                fold_node(file, element, ranges);
            }
        }
        _ => {}
    }
}

/// Only spans covering at least two lines fold.
fn push_range(
    file: &FileView<'_>,
    span: Span,
    kind: Option<FoldingRangeKind>,
    ranges: &mut Vec<FoldingRange>,
) {
    let start = file.document.position_of(span.start);
    let end = file.document.position_of(span.end);
    if end.line <= start.line {
        return;
    }
    ranges.push(FoldingRange {
        start_line: start.line,
        start_character: Some(start.character),
        end_line: end.line,
        end_character: Some(end.character),
        kind,
        collapsed_text: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_ls_syntax::document::Document;
    use smithy_ls_syntax::parse::parse_idl;

    #[test]
    fn folds_imports_blocks_and_trait_runs() {
        let source = "$version: \"2\"\nnamespace com.a\nuse com.b#X\nuse com.b#Y\n\n@tags([\n    \"a\",\n    \"b\"\n])\n@internal\nstructure S {\n    one: String\n}\n";
        let document = Document::of(source);
        let parsed = parse_idl(&document);
        let file = crate::FileView::new("a.smithy", &document, &parsed);
        let ranges = folding_ranges(&file, &CancelToken::new());

        // imports lines 2-3
        assert!(ranges
            .iter()
            .any(|r| r.start_line == 2 && r.end_line == 3 && r.kind == Some(FoldingRangeKind::Imports)));
        // trait run from @tags through @internal (lines 5-9)
        assert!(ranges.iter().any(|r| r.start_line == 5 && r.end_line == 9));
        // the array value inside @tags
        assert!(ranges.iter().any(|r| r.start_line == 5 && r.end_line == 8));
        // the structure block
        assert!(ranges.iter().any(|r| r.start_line == 10 && r.end_line == 12));
    }

    #[test]
    fn single_line_imports_do_not_fold() {
        let source = "namespace com.a\nuse com.b#X\n";
        let document = Document::of(source);
        let parsed = parse_idl(&document);
        let file = crate::FileView::new("a.smithy", &document, &parsed);
        let ranges = folding_ranges(&file, &CancelToken::new());
        assert!(ranges.is_empty());
    }
}
