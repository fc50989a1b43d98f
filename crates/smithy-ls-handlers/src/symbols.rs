//! Document symbols: a two-level outline of the file.

use lsp_types::{DocumentSymbol, Position, Range, SymbolKind};
use smithy_ls_syntax::span::Span;
use smithy_ls_syntax::statement::Statement;

use crate::cancel::CancelToken;
use crate::FileView;

/// Namespace and shape definitions at the top level, member definitions
/// as children, with each parent's range extended over its block.
pub fn document_symbols(file: &FileView<'_>, cancel: &CancelToken) -> Vec<DocumentSymbol> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let statements = &file.parsed.statements;
    let mut symbols = Vec::new();
    let mut index = 0;

    while index < statements.len() {
        match &statements[index] {
            Statement::Namespace(stmt) => {
                symbols.push(symbol(
                    &stmt.name.text,
                    SymbolKind::NAMESPACE,
                    range_of(file, stmt.span),
                    range_of(file, stmt.name.span),
                    Vec::new(),
                ));
                index += 1;
            }
            Statement::ShapeDef(def) => {
                let (children, full_span, next) = shape_children(file, index);
                symbols.push(symbol(
                    &def.name.text,
                    shape_symbol_kind(&def.shape_type.text),
                    range_of(file, full_span),
                    range_of(file, def.name.span),
                    children,
                ));
                index = next;
            }
            _ => index += 1,
        }
    }
    symbols
}

/// Member symbols of the shape defined at `index`, the span including
/// its block, and the index of the next top-level statement.
fn shape_children(
    file: &FileView<'_>,
    index: usize,
) -> (Vec<DocumentSymbol>, Span, usize) {
    let statements = &file.parsed.statements;
    let Statement::ShapeDef(def) = &statements[index] else {
        return (Vec::new(), Span::empty(0), index + 1);
    };
    let mut span = def.span;
    let mut children = Vec::new();
    let mut cursor = index + 1;
    let mut last = None;

    while cursor < statements.len() {
        match &statements[cursor] {
            Statement::ForResource(_) | Statement::Mixins(_) | Statement::InlineMemberDef(_) => {
                cursor += 1;
            }
            Statement::Block(block) => {
                span = span.union(block.span);
                match block.enclosed {
                    Some((_, block_last)) => {
                        last = Some(block_last.max(last.unwrap_or(0)));
                        cursor += 1;
                    }
                    None => {
                        cursor += 1;
                    }
                }
            }
            Statement::TraitApplication(_) if last.is_some_and(|l| cursor <= l) => {
                cursor += 1;
            }
            statement => {
                let within = last.is_some_and(|l| cursor <= l);
                if !within {
                    break;
                }
                if let Some((name, name_span, stmt_span)) = member_parts(statement) {
                    children.push(symbol(
                        name,
                        SymbolKind::FIELD,
                        range_of(file, stmt_span),
                        range_of(file, name_span),
                        Vec::new(),
                    ));
                }
                cursor += 1;
            }
        }
    }
    (children, span, cursor)
}

fn member_parts(statement: &Statement) -> Option<(&str, Span, Span)> {
    match statement {
        Statement::MemberDef(stmt) => Some((&stmt.name.text, stmt.name.span, stmt.span)),
        Statement::EnumMemberDef(stmt) => Some((&stmt.name.text, stmt.name.span, stmt.span)),
        Statement::ElidedMemberDef(stmt) => Some((&stmt.name.text, stmt.name.span, stmt.span)),
        Statement::NodeMemberDef(stmt) => Some((&stmt.name.text, stmt.name.span, stmt.span)),
        _ => None,
    }
}

fn shape_symbol_kind(shape_type: &str) -> SymbolKind {
    match shape_type {
        "service" | "resource" => SymbolKind::INTERFACE,
        "operation" => SymbolKind::FUNCTION,
        "structure" | "union" => SymbolKind::STRUCT,
        "enum" | "intEnum" => SymbolKind::ENUM,
        "list" | "set" | "map" => SymbolKind::ARRAY,
        _ => SymbolKind::CLASS,
    }
}

fn range_of(file: &FileView<'_>, span: Span) -> Range {
    file.document.range_of(span).unwrap_or(Range {
        start: Position { line: 0, character: 0 },
        end: Position { line: 0, character: 0 },
    })
}

fn symbol(
    name: &str,
    kind: SymbolKind,
    range: Range,
    selection_range: Range,
    children: Vec<DocumentSymbol>,
) -> DocumentSymbol {
    #[allow(deprecated)]
    DocumentSymbol {
        name: name.to_string(),
        detail: None,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_ls_syntax::document::Document;
    use smithy_ls_syntax::parse::parse_idl;

    #[test]
    fn two_level_outline() {
        let source = "$version: \"2\"\nnamespace com.a\n\nstructure S {\n    one: String\n    two: Integer\n}\n\nenum E {\n    A\n}\n";
        let document = Document::of(source);
        let parsed = parse_idl(&document);
        let file = crate::FileView::new("a.smithy", &document, &parsed);
        let symbols = document_symbols(&file, &CancelToken::new());

        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["com.a", "S", "E"]);
        let members: Vec<_> = symbols[1]
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(members, vec!["one", "two"]);
        // the structure's range covers its block
        assert_eq!(symbols[1].range.end.line, 6);
    }
}
