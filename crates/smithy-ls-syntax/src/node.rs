//! The node tree shared by trait values, metadata values, and build files.
//!
//! Every node carries the exact byte span it covered. Malformed input
//! becomes an `Err` node so consumers can keep walking the tree.

use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Obj(ObjNode),
    Arr(ArrNode),
    Str(StrNode),
    Num(NumNode),
    /// Bare identifier value: `true`, `false`, `null`, or a shape id.
    Ident(IdentNode),
    Err(ErrNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjNode {
    pub kvps: Vec<Kvp>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrNode {
    pub elements: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrNode {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumNode {
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentNode {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrNode {
    pub message: String,
    pub span: Span,
}

/// A key-value pair inside an object node. The value is an `Err` node
/// when the source had a key with nothing usable after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Kvp {
    pub key: StrNode,
    pub value: Node,
    pub span: Span,
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Obj(n) => n.span,
            Node::Arr(n) => n.span,
            Node::Str(n) => n.span,
            Node::Num(n) => n.span,
            Node::Ident(n) => n.span,
            Node::Err(n) => n.span,
        }
    }

    /// The string content of a `Str` or `Ident` node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Str(n) => Some(&n.value),
            Node::Ident(n) => Some(&n.value),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<&ObjNode> {
        match self {
            Node::Obj(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_arr(&self) -> Option<&ArrNode> {
        match self {
            Node::Arr(n) => Some(n),
            _ => None,
        }
    }
}

impl ObjNode {
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.kvps
            .iter()
            .find(|kvp| kvp.key.value == key)
            .map(|kvp| &kvp.value)
    }
}

/// One step of the path from a node root down to a document offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge<'a> {
    /// The offset is inside this object.
    Obj(&'a ObjNode),
    /// The offset is inside this array.
    Arr(&'a ArrNode),
    /// The offset is on this key of the preceding object.
    Key(&'a StrNode),
    /// The offset is inside the value for this key of `parent`.
    ValueForKey(&'a str, &'a ObjNode),
    /// The offset is inside an element of `parent`.
    Elem(&'a ArrNode),
    /// The offset landed on a leaf node.
    Terminal(&'a Node),
}

/// A consumable path of edges from a node root to a byte offset.
///
/// `set_checkpoint`/`return_to_checkpoint` give searches bounded
/// backtracking when a dynamic member target has to re-inspect the
/// surrounding object.
#[derive(Debug, Clone)]
pub struct NodeCursor<'a> {
    edges: Vec<Edge<'a>>,
    pos: usize,
    checkpoint: usize,
}

impl<'a> NodeCursor<'a> {
    /// Descend `root` to `offset`, recording the path as edges. The
    /// cursor is empty when the offset lies outside the root entirely.
    pub fn build(root: &'a Node, offset: usize) -> Self {
        let mut edges = Vec::new();
        if root.span().touches(offset) {
            descend(root, offset, &mut edges);
        }
        Self {
            edges,
            pos: 0,
            checkpoint: 0,
        }
    }

    pub fn next(&mut self) -> Option<Edge<'a>> {
        let edge = self.edges.get(self.pos).copied();
        if edge.is_some() {
            self.pos += 1;
        }
        edge
    }

    pub fn peek(&self) -> Option<Edge<'a>> {
        self.edges.get(self.pos).copied()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.edges.len()
    }

    pub fn set_checkpoint(&mut self) {
        self.checkpoint = self.pos;
    }

    pub fn return_to_checkpoint(&mut self) {
        self.pos = self.checkpoint;
    }

    pub fn edges(&self) -> &[Edge<'a>] {
        &self.edges
    }
}

fn descend<'a>(node: &'a Node, offset: usize, edges: &mut Vec<Edge<'a>>) {
    match node {
        Node::Obj(obj) => {
            edges.push(Edge::Obj(obj));
            for kvp in &obj.kvps {
                if kvp.key.span.touches(offset) {
                    edges.push(Edge::Key(&kvp.key));
                    return;
                }
                if kvp.value.span().touches(offset) {
                    edges.push(Edge::ValueForKey(&kvp.key.value, obj));
                    descend(&kvp.value, offset, edges);
                    return;
                }
            }
            // inside the braces but on no entry: the path ends at the object
        }
        Node::Arr(arr) => {
            edges.push(Edge::Arr(arr));
            for element in &arr.elements {
                if element.span().touches(offset) {
                    edges.push(Edge::Elem(arr));
                    descend(element, offset, edges);
                    return;
                }
            }
        }
        leaf => edges.push(Edge::Terminal(leaf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::parse::parse_json_with_comments;

    fn cursor_kinds(source: &str, offset: usize) -> Vec<String> {
        let doc = Document::of(source);
        let node = parse_json_with_comments(&doc);
        NodeCursor::build(&node, offset)
            .edges()
            .iter()
            .map(|edge| match edge {
                Edge::Obj(_) => "obj".to_string(),
                Edge::Arr(_) => "arr".to_string(),
                Edge::Key(key) => format!("key:{}", key.value),
                Edge::ValueForKey(key, _) => format!("value-for:{key}"),
                Edge::Elem(_) => "elem".to_string(),
                Edge::Terminal(_) => "terminal".to_string(),
            })
            .collect()
    }

    #[test]
    fn cursor_path_through_nested_object() {
        let source = r#"{"a": {"b": [1, 2]}}"#;
        // offset of the `2`
        let offset = source.find('2').unwrap();
        assert_eq!(
            cursor_kinds(source, offset),
            vec![
                "obj",
                "value-for:a",
                "obj",
                "value-for:b",
                "arr",
                "elem",
                "terminal"
            ]
        );
    }

    #[test]
    fn cursor_stops_on_key() {
        let source = r#"{"alpha": 1}"#;
        assert_eq!(cursor_kinds(source, 3), vec!["obj", "key:alpha"]);
    }

    #[test]
    fn cursor_ends_at_object_on_whitespace() {
        let source = "{ \"a\": 1,   }";
        assert_eq!(cursor_kinds(source, 11), vec!["obj"]);
    }

    #[test]
    fn checkpoint_returns_cursor() {
        let source = r#"{"a": [1]}"#;
        let doc = Document::of(source);
        let node = parse_json_with_comments(&doc);
        let mut cursor = NodeCursor::build(&node, source.find('1').unwrap());
        cursor.next();
        cursor.set_checkpoint();
        cursor.next();
        cursor.next();
        cursor.return_to_checkpoint();
        assert!(matches!(cursor.next(), Some(Edge::ValueForKey("a", _))));
    }
}
