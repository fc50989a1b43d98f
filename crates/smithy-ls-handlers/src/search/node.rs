//! Node-tree traversal against the model.

use smithy_ls_model::{Shape, ShapeType};
use smithy_ls_syntax::node::{ArrNode, Edge, Node, NodeCursor, ObjNode, StrNode};

use super::dynamic::dynamic_target_of;
use super::{ModelView, ResolveScope};

/// Where a cursor inside a node value landed, semantically.
#[derive(Debug, Clone, Copy)]
pub enum NodeSearchResult<'a, 'n> {
    None,
    /// On a leaf value typed by `shape`.
    TerminalShape(&'a Shape, &'n Node),
    /// On a key of an object typed by `container`.
    ObjectKey(&'n StrNode, &'a Shape),
    /// Inside an object typed by `shape`, on no particular entry.
    ObjectShape(&'n ObjNode, &'a Shape),
    /// Inside an array typed by the list shape `shape`, between
    /// elements.
    ArrayShape(&'n ArrNode, &'a Shape),
}

impl<'a, 'n> NodeSearchResult<'a, 'n> {
    pub fn is_none(&self) -> bool {
        matches!(self, NodeSearchResult::None)
    }
}

/// Walk the cursor's edge path, tracking the shape each step is typed
/// by. Member steps honor the dynamic-member-target registry;
/// `applied_to` is the shape carrying the enclosing trait, which the
/// operation-input/output targets need.
pub fn node_search<'a, 'n>(
    mut cursor: NodeCursor<'n>,
    start: &'a Shape,
    model: &ModelView<'a>,
    scope: &ResolveScope<'_>,
    applied_to: Option<&'a Shape>,
) -> NodeSearchResult<'a, 'n> {
    let mut current = start;
    loop {
        match cursor.next() {
            None => return NodeSearchResult::None,
            Some(Edge::Obj(obj)) => match cursor.peek() {
                None => {
                    if current.shape_type.is_object_like()
                        || current.shape_type == ShapeType::Document
                    {
                        return NodeSearchResult::ObjectShape(obj, current);
                    }
                    return NodeSearchResult::None;
                }
                Some(Edge::Key(key)) => {
                    cursor.next();
                    return NodeSearchResult::ObjectKey(key, current);
                }
                Some(Edge::ValueForKey(key, parent)) => {
                    cursor.next();
                    let Some(next) = member_target(current, key, parent, model, scope, applied_to)
                    else {
                        return NodeSearchResult::None;
                    };
                    current = next;
                }
                Some(_) => return NodeSearchResult::None,
            },
            Some(Edge::Arr(arr)) => match cursor.peek() {
                None => return NodeSearchResult::ArrayShape(arr, current),
                Some(Edge::Elem(_)) => {
                    cursor.next();
                    let Some(next) = list_element_target(current, model) else {
                        return NodeSearchResult::None;
                    };
                    current = next;
                }
                Some(_) => return NodeSearchResult::None,
            },
            Some(Edge::Terminal(node)) => {
                return NodeSearchResult::TerminalShape(current, node);
            }
            // Key / ValueForKey / Elem are always consumed right after
            // their container edge
            Some(_) => return NodeSearchResult::None,
        }
    }
}

/// The shape typing the value for `key` inside `current`. Map shapes
/// descend into their value member; structures and unions look the
/// member up by name, with the dynamic registry taking precedence.
fn member_target<'a>(
    current: &'a Shape,
    key: &str,
    parent: &ObjNode,
    model: &ModelView<'a>,
    scope: &ResolveScope<'_>,
    applied_to: Option<&'a Shape>,
) -> Option<&'a Shape> {
    let member_id = match current.shape_type {
        ShapeType::Map => current.get_member("value")?,
        _ => current.get_member(key)?,
    };
    if let Some(dynamic) = dynamic_target_of(member_id) {
        if let Some(target) = dynamic.resolve(parent, applied_to, model, scope) {
            return Some(target);
        }
    }
    let member = model.get(member_id)?;
    model.target_of(member)
}

fn list_element_target<'a>(current: &'a Shape, model: &ModelView<'a>) -> Option<&'a Shape> {
    let member_id = current.get_member("member")?;
    let member = model.get(member_id)?;
    model.target_of(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_ls_model::builtins;
    use smithy_ls_model::ShapeId;
    use smithy_ls_syntax::document::Document;
    use smithy_ls_syntax::parse::parse_json_with_comments;
    use std::collections::BTreeSet;

    fn search_at<'n>(
        source: &str,
        offset: usize,
        start: &'static Shape,
        node: &'n Node,
    ) -> NodeSearchResult<'static, 'n> {
        let model = ModelView::new(builtins::builtins());
        let imports = BTreeSet::new();
        let scope = ResolveScope {
            namespace: "",
            imports: &imports,
        };
        let _ = source;
        node_search(NodeCursor::build(node, offset), start, &model, &scope, None)
    }

    #[test]
    fn walks_into_validator_list() {
        // the metadata value for `validators`
        let source = r#"[{"name": "EmitEachSelector", "configuration": {"selector": "*"}}]"#;
        let document = Document::of(source);
        let node = parse_json_with_comments(&document);
        let start_id: ShapeId = "smithy.lang.server#Validators".parse().unwrap();
        let start = builtins::builtins().get_shape(&start_id).unwrap();

        // on the value of "name"
        let offset = source.find("EmitEach").unwrap();
        match search_at(source, offset, start, &node) {
            NodeSearchResult::TerminalShape(shape, _) => {
                assert_eq!(shape.id.to_string(), "smithy.api#String");
            }
            other => panic!("expected terminal, got {other:?}"),
        }

        // on the "selector" key inside configuration: the mapped
        // dynamic target picks EmitEachSelectorConfig
        let offset = source.find("selector").unwrap();
        match search_at(source, offset, start, &node) {
            NodeSearchResult::ObjectKey(key, container) => {
                assert_eq!(key.value, "selector");
                assert_eq!(
                    container.id.to_string(),
                    "smithy.lang.server#EmitEachSelectorConfig"
                );
            }
            other => panic!("expected key, got {other:?}"),
        }
    }

    #[test]
    fn object_between_entries_reports_object_shape() {
        let source = r#"[{ }]"#;
        let document = Document::of(source);
        let node = parse_json_with_comments(&document);
        let start_id: ShapeId = "smithy.lang.server#Validators".parse().unwrap();
        let start = builtins::builtins().get_shape(&start_id).unwrap();
        match search_at(source, 2, start, &node) {
            NodeSearchResult::ObjectShape(_, shape) => {
                assert_eq!(shape.id.to_string(), "smithy.lang.server#Validator");
            }
            other => panic!("expected object shape, got {other:?}"),
        }
    }

    #[test]
    fn array_between_elements_reports_array_shape() {
        let source = "[ ]";
        let document = Document::of(source);
        let node = parse_json_with_comments(&document);
        let start_id: ShapeId = "smithy.lang.server#Validators".parse().unwrap();
        let start = builtins::builtins().get_shape(&start_id).unwrap();
        match search_at(source, 1, start, &node) {
            NodeSearchResult::ArrayShape(_, shape) => {
                assert_eq!(shape.id.to_string(), "smithy.lang.server#Validators");
            }
            other => panic!("expected array shape, got {other:?}"),
        }
    }
}
