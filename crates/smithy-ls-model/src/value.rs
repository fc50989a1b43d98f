//! Plain data values carried by traits and metadata.
//!
//! Unlike the syntax tree's `Node`, these values are detached from any
//! document; source positions travel separately on the applications
//! that carry them.

use indexmap::IndexMap;

use smithy_ls_syntax::node::Node;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Obj(IndexMap<String, NodeValue>),
    Arr(Vec<NodeValue>),
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl NodeValue {
    /// Convert a parsed node, dropping spans. `Err` nodes become `Null`.
    pub fn from_node(node: &Node) -> NodeValue {
        match node {
            Node::Obj(obj) => NodeValue::Obj(
                obj.kvps
                    .iter()
                    .map(|kvp| (kvp.key.value.clone(), NodeValue::from_node(&kvp.value)))
                    .collect(),
            ),
            Node::Arr(arr) => NodeValue::Arr(arr.elements.iter().map(NodeValue::from_node).collect()),
            Node::Str(s) => NodeValue::Str(s.value.clone()),
            Node::Num(n) => NodeValue::Num(n.value),
            Node::Ident(ident) => match ident.value.as_str() {
                "true" => NodeValue::Bool(true),
                "false" => NodeValue::Bool(false),
                "null" => NodeValue::Null,
                other => NodeValue::Str(other.to_string()),
            },
            Node::Err(_) => NodeValue::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NodeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<&IndexMap<String, NodeValue>> {
        match self {
            NodeValue::Obj(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_arr(&self) -> Option<&[NodeValue]> {
        match self {
            NodeValue::Arr(values) => Some(values),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&NodeValue> {
        self.as_obj().and_then(|map| map.get(key))
    }
}
