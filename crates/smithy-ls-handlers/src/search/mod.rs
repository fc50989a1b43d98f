//! The semantic query engine: shape resolution from classified cursor
//! positions, and node-tree traversal with dynamic member targets.

mod dynamic;
mod node;
mod shape;

pub use dynamic::{validator_config_shape, DynamicMemberTarget, VALIDATOR_NAMES};
pub use node::{node_search, NodeSearchResult};
pub use shape::ShapeSearch;

use std::collections::BTreeSet;

use smithy_ls_model::{builtins, Model, Shape, ShapeId};

/// Lookup over the user model with the builtins model as fallback.
#[derive(Clone, Copy)]
pub struct ModelView<'a> {
    model: &'a Model,
}

impl<'a> ModelView<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn get(&self, id: &ShapeId) -> Option<&'a Shape> {
        self.model
            .get_shape(id)
            .or_else(|| builtins::builtins().get_shape(id))
    }

    /// Follow a member shape to its target.
    pub fn target_of(&self, shape: &Shape) -> Option<&'a Shape> {
        shape.target.as_ref().and_then(|target| self.get(target))
    }
}

/// The resolution context of one file: its namespace and `use` targets.
#[derive(Clone, Copy)]
pub struct ResolveScope<'a> {
    pub namespace: &'a str,
    pub imports: &'a BTreeSet<String>,
}

impl<'a> ResolveScope<'a> {
    pub fn of(parsed: &'a smithy_ls_syntax::statement::ParseResult) -> Self {
        Self {
            namespace: parsed.namespace_name(),
            imports: &parsed.imports.ids,
        }
    }
}
