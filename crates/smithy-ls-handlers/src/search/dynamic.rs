//! Dynamic member targets.
//!
//! Some structure members have an effective target that depends on
//! context: the `params` of a smoke test case are typed by the enclosing
//! operation's input, a validator's `configuration` is typed by the
//! validator named in its sibling `name` member, and so on. The
//! registry below is frozen; the search consults it whenever it steps
//! into a member.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use smithy_ls_model::{Shape, ShapeId, ShapeType};
use smithy_ls_syntax::node::ObjNode;

use super::{ModelView, ResolveScope};

/// Maps validator names (the `name` member of a `validators` metadata
/// entry) to the shape describing their configuration.
pub static VALIDATOR_CONFIG_MAPPING: &[(&str, &str)] = &[
    ("EmitEachSelector", "smithy.lang.server#EmitEachSelectorConfig"),
    ("EmitNoneSelector", "smithy.lang.server#EmitNoneSelectorConfig"),
    ("UnreferencedShape", "smithy.lang.server#UnreferencedShapeConfig"),
    ("ReservedWords", "smithy.lang.server#ReservedWordsConfig"),
];

/// The validator names completion offers for `validators` entries.
pub static VALIDATOR_NAMES: &[&str] = &[
    "EmitEachSelector",
    "EmitNoneSelector",
    "UnreferencedShape",
    "ReservedWords",
];

/// The shape describing the configuration of a named validator.
pub fn validator_config_shape(name: &str) -> Option<&'static str> {
    VALIDATOR_CONFIG_MAPPING
        .iter()
        .find(|(validator, _)| *validator == name)
        .map(|(_, shape)| *shape)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicMemberTarget {
    /// Target is the input structure of the operation the enclosing
    /// trait is applied to.
    OperationInput,
    /// Target is the operation's output structure.
    OperationOutput,
    /// Target is the shape named by a sibling member's string value.
    ShapeIdDependent(&'static str),
    /// Like `ShapeIdDependent`, but the sibling's value goes through a
    /// static mapping first.
    MappedDependent(&'static str, &'static [(&'static str, &'static str)]),
}

/// The frozen registry, keyed by member shape id.
static REGISTRY: Lazy<HashMap<&'static str, DynamicMemberTarget>> = Lazy::new(|| {
    HashMap::from([
        (
            "smithy.test#SmokeTestCase$params",
            DynamicMemberTarget::OperationInput,
        ),
        (
            "smithy.test#SmokeTestCase$vendorParams",
            DynamicMemberTarget::ShapeIdDependent("vendorParamsShape"),
        ),
        (
            "smithy.api#Example$input",
            DynamicMemberTarget::OperationInput,
        ),
        (
            "smithy.api#Example$output",
            DynamicMemberTarget::OperationOutput,
        ),
        (
            "smithy.test#HttpRequestTestCase$params",
            DynamicMemberTarget::OperationInput,
        ),
        (
            "smithy.test#HttpRequestTestCase$vendorParams",
            DynamicMemberTarget::ShapeIdDependent("vendorParamsShape"),
        ),
        (
            "smithy.test#HttpResponseTestCase$params",
            DynamicMemberTarget::OperationOutput,
        ),
        (
            "smithy.test#HttpResponseTestCase$vendorParams",
            DynamicMemberTarget::ShapeIdDependent("vendorParamsShape"),
        ),
        (
            "smithy.lang.server#Validator$configuration",
            DynamicMemberTarget::MappedDependent("name", VALIDATOR_CONFIG_MAPPING),
        ),
    ])
});

/// A registered override for `member_id`, if any.
pub fn dynamic_target_of(member_id: &ShapeId) -> Option<DynamicMemberTarget> {
    REGISTRY.get(member_id.to_string().as_str()).copied()
}

impl DynamicMemberTarget {
    /// Compute the effective target shape, or `None` when the context
    /// cannot supply one.
    pub fn resolve<'a>(
        &self,
        parent: &ObjNode,
        applied_to: Option<&'a Shape>,
        model: &ModelView<'a>,
        scope: &ResolveScope<'_>,
    ) -> Option<&'a Shape> {
        match self {
            DynamicMemberTarget::OperationInput => {
                operation_binding(applied_to, model, "input")
            }
            DynamicMemberTarget::OperationOutput => {
                operation_binding(applied_to, model, "output")
            }
            DynamicMemberTarget::ShapeIdDependent(sibling) => {
                let token = sibling_text(parent, sibling)?;
                ShapeSearchFallback { model, scope }.resolve(&token)
            }
            DynamicMemberTarget::MappedDependent(sibling, table) => {
                let token = sibling_text(parent, sibling)?;
                let mapped = table
                    .iter()
                    .find(|(name, _)| *name == token)
                    .map(|(_, shape)| *shape)?;
                let id: ShapeId = mapped.parse().ok()?;
                model.get(&id)
            }
        }
    }
}

fn operation_binding<'a>(
    applied_to: Option<&'a Shape>,
    model: &ModelView<'a>,
    member: &str,
) -> Option<&'a Shape> {
    let operation = applied_to?;
    if operation.shape_type != ShapeType::Operation {
        return None;
    }
    let member_id = operation.get_member(member)?;
    let member_shape = model.get(member_id)?;
    model.target_of(member_shape)
}

fn sibling_text(parent: &ObjNode, sibling: &str) -> Option<String> {
    parent.get(sibling)?.as_text().map(str::to_string)
}

/// Minimal three-stage resolution reused here to avoid a cyclic
/// dependency on the full `ShapeSearch`.
struct ShapeSearchFallback<'m, 'a> {
    model: &'m ModelView<'a>,
    scope: &'m ResolveScope<'m>,
}

impl<'m, 'a> ShapeSearchFallback<'m, 'a> {
    fn resolve(&self, token: &str) -> Option<&'a Shape> {
        if token.contains('#') {
            let id: ShapeId = token.parse().ok()?;
            return self.model.get(&id);
        }
        for import in self.scope.imports.iter() {
            if let Ok(id) = import.parse::<ShapeId>() {
                if id.name() == token {
                    return self.model.get(&id);
                }
            }
        }
        if !self.scope.namespace.is_empty() {
            if let Some(shape) = self.model.get(&ShapeId::new(self.scope.namespace, token)) {
                return Some(shape);
            }
        }
        self.model
            .get(&ShapeId::new(smithy_ls_model::builtins::PRELUDE, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_the_frozen_set() {
        for member in [
            "smithy.test#SmokeTestCase$params",
            "smithy.test#SmokeTestCase$vendorParams",
            "smithy.api#Example$input",
            "smithy.api#Example$output",
            "smithy.test#HttpRequestTestCase$params",
            "smithy.test#HttpResponseTestCase$params",
            "smithy.lang.server#Validator$configuration",
        ] {
            let id: ShapeId = member.parse().unwrap();
            assert!(dynamic_target_of(&id).is_some(), "missing {member}");
        }
    }

    #[test]
    fn validator_mapping_is_total_over_known_names() {
        assert_eq!(
            validator_config_shape("EmitEachSelector"),
            Some("smithy.lang.server#EmitEachSelectorConfig")
        );
        assert_eq!(validator_config_shape("NoSuchValidator"), None);
    }
}
