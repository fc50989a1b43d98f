//! Shape lookup from classified cursor positions.

use smithy_ls_model::{builtins, Model, Shape, ShapeId, ShapeType};
use smithy_ls_syntax::node::NodeCursor;
use smithy_ls_syntax::position::IdlPosition;
use smithy_ls_syntax::statement::Statement;
use smithy_ls_syntax::view::StatementView;

use super::node::{node_search, NodeSearchResult};
use super::{ModelView, ResolveScope};
use crate::FileView;

/// Resolves shape references for one request. All queries are
/// infallible: a token that is not a valid id, or that matches nothing,
/// yields "no shape" rather than an error.
pub struct ShapeSearch<'a> {
    model: ModelView<'a>,
}

impl<'a> ShapeSearch<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self {
            model: ModelView::new(model),
        }
    }

    pub fn model(&self) -> &ModelView<'a> {
        &self.model
    }

    /// Strict three-stage lookup: absolute id, then the file's imports
    /// (including `Container$member` forms), then the current namespace
    /// and finally the prelude. First hit wins.
    pub fn resolve(&self, token: &str, scope: &ResolveScope<'_>) -> Option<&'a Shape> {
        if !ShapeId::is_valid_token(token) {
            return None;
        }
        if token.contains('#') {
            let id: ShapeId = token.parse().ok()?;
            return self.model.get(&id);
        }
        let (name, member) = match token.split_once('$') {
            Some((name, member)) => (name, Some(member)),
            None => (token, None),
        };
        for import in scope.imports.iter() {
            let Ok(imported) = import.parse::<ShapeId>() else {
                continue;
            };
            if imported.name() != name {
                continue;
            }
            let id = match member {
                Some(member) => imported.with_member(member),
                None => imported,
            };
            if let Some(shape) = self.model.get(&id) {
                return Some(shape);
            }
        }
        if !scope.namespace.is_empty() {
            let id = match member {
                Some(member) => ShapeId::new(scope.namespace, name).with_member(member),
                None => ShapeId::new(scope.namespace, name),
            };
            if let Some(shape) = self.model.get(&id) {
                return Some(shape);
            }
        }
        let id = match member {
            Some(member) => ShapeId::new(builtins::PRELUDE, name).with_member(member),
            None => ShapeId::new(builtins::PRELUDE, name),
        };
        self.model.get(&id)
    }

    /// The shape a classified cursor position refers to, for hover and
    /// go-to style queries.
    pub fn find_shape_definition(
        &self,
        file: &FileView<'_>,
        position: IdlPosition,
        offset: usize,
    ) -> Option<&'a Shape> {
        let scope = ResolveScope::of(file.parsed);
        let statements = &file.parsed.statements;
        match position {
            IdlPosition::TraitId(index) => {
                let Statement::TraitApplication(stmt) = statements.get(index)? else {
                    return None;
                };
                self.resolve(&stmt.id.text, &scope)
            }
            IdlPosition::MemberTarget(index) => {
                let Statement::MemberDef(stmt) = statements.get(index)? else {
                    return None;
                };
                self.resolve(&stmt.target.as_ref()?.text, &scope)
            }
            IdlPosition::Mixin(index) => {
                let Statement::Mixins(stmt) = statements.get(index)? else {
                    return None;
                };
                let name = stmt
                    .names
                    .iter()
                    .find(|name| name.span.touches(offset))
                    .or_else(|| stmt.names.first())?;
                self.resolve(&name.text, &scope)
            }
            IdlPosition::ForResource(index) => {
                let Statement::ForResource(stmt) = statements.get(index)? else {
                    return None;
                };
                self.resolve(&stmt.resource.text, &scope)
            }
            IdlPosition::UseTarget(index) => {
                let Statement::Use(stmt) = statements.get(index)? else {
                    return None;
                };
                self.resolve(&stmt.target.text, &scope)
            }
            IdlPosition::ApplyTarget(index) => {
                let Statement::Apply(stmt) = statements.get(index)? else {
                    return None;
                };
                self.resolve(&stmt.target.text, &scope)
            }
            IdlPosition::ShapeDef(index) => {
                let Statement::ShapeDef(stmt) = statements.get(index)? else {
                    return None;
                };
                if scope.namespace.is_empty() {
                    return None;
                }
                self.model
                    .get(&ShapeId::new(scope.namespace, stmt.name.text.as_str()))
            }
            IdlPosition::ElidedMember(index) => self.find_elided_member_parent(file, index),
            _ => None,
        }
    }

    /// Like [`Self::find_shape_definition`], but scoped for references
    /// and rename: member shapes are excluded, and node values only
    /// count when they are id-refs or service-rename keys.
    pub fn get_shape_reference(
        &self,
        file: &FileView<'_>,
        position: IdlPosition,
        offset: usize,
    ) -> Option<&'a Shape> {
        let found = match position {
            IdlPosition::TraitValue(index) => {
                self.id_ref_in(self.search_trait_value(file, index, offset), file)
            }
            IdlPosition::NodeMemberTarget(index) => {
                self.id_ref_in(self.search_node_member_target(file, index, offset), file)
            }
            IdlPosition::MetadataValue(_) | IdlPosition::ElidedMember(_) => None,
            other => self.find_shape_definition(file, other, offset),
        }?;
        (found.shape_type != ShapeType::Member).then_some(found)
    }

    /// Follow an id-ref-typed terminal or a service-rename key to the
    /// shape it names.
    fn id_ref_in(
        &self,
        result: NodeSearchResult<'a, '_>,
        file: &FileView<'_>,
    ) -> Option<&'a Shape> {
        let scope = ResolveScope::of(file.parsed);
        match result {
            NodeSearchResult::TerminalShape(shape, node) => {
                if !shape.has_trait_named("smithy.api#idRef") {
                    return None;
                }
                self.resolve(node.as_text()?, &scope)
            }
            NodeSearchResult::ObjectKey(key, container) => {
                if container.id != ShapeId::new(builtins::NAMESPACE, "RenameMap") {
                    return None;
                }
                self.resolve(&key.value, &scope)
            }
            _ => None,
        }
    }

    /// The shape contributing an elided member's type: the bound
    /// resource's identifier or property, else the same-named member of
    /// one of the mixins.
    pub fn find_elided_member_parent(
        &self,
        file: &FileView<'_>,
        statement_index: usize,
    ) -> Option<&'a Shape> {
        let Statement::ElidedMemberDef(stmt) = file.parsed.statements.get(statement_index)?
        else {
            return None;
        };
        let scope = ResolveScope::of(file.parsed);
        let view = StatementView::at_index(file.parsed, file.source(), statement_index)?;
        let (for_resource, mixins) = view.nearest_for_resource_and_mixins_before();

        if let Some(for_resource) = for_resource {
            if let Some(resource) = self.resolve(&for_resource.resource.text, &scope) {
                if let Some(target) = resource.identifiers.get(&stmt.name.text) {
                    if let Some(shape) = self.model.get(target) {
                        return Some(shape);
                    }
                }
            }
        }
        if let Some(mixins) = mixins {
            for name in &mixins.names {
                let Some(mixin) = self.resolve(&name.text, &scope) else {
                    continue;
                };
                if let Some(member_id) = mixin.get_member(&stmt.name.text) {
                    if let Some(member) = self.model.get(member_id) {
                        return Some(member);
                    }
                }
            }
        }
        None
    }

    /// Search inside a trait's value node. The start shape is the trait
    /// definition from the user model or the builtins.
    pub fn search_trait_value<'f>(
        &self,
        file: &FileView<'f>,
        statement_index: usize,
        offset: usize,
    ) -> NodeSearchResult<'a, 'f> {
        let Some(Statement::TraitApplication(stmt)) =
            file.parsed.statements.get(statement_index)
        else {
            return NodeSearchResult::None;
        };
        let Some(value) = &stmt.value else {
            return NodeSearchResult::None;
        };
        let scope = ResolveScope::of(file.parsed);
        let Some(trait_shape) = self.resolve(&stmt.id.text, &scope) else {
            return NodeSearchResult::None;
        };
        let applied_to = self.trait_applied_to(file, statement_index);
        node_search(
            NodeCursor::build(value, offset),
            trait_shape,
            &self.model,
            &scope,
            applied_to,
        )
    }

    /// Search inside a metadata value. The start shape comes from the
    /// builtins description of the metadata key.
    pub fn search_metadata_value<'f>(
        &self,
        file: &FileView<'f>,
        statement_index: usize,
        offset: usize,
    ) -> NodeSearchResult<'a, 'f> {
        let Some(Statement::Metadata(stmt)) = file.parsed.statements.get(statement_index) else {
            return NodeSearchResult::None;
        };
        let Some(value) = &stmt.value else {
            return NodeSearchResult::None;
        };
        let Some(member_id) = builtins::metadata_statements().get_member(&stmt.key.text) else {
            return NodeSearchResult::None;
        };
        let Some(start) = self
            .model
            .get(member_id)
            .and_then(|member| self.model.target_of(member))
        else {
            return NodeSearchResult::None;
        };
        let scope = ResolveScope::of(file.parsed);
        node_search(
            NodeCursor::build(value, offset),
            start,
            &self.model,
            &scope,
            None,
        )
    }

    /// Search inside the node value of a service/resource member. The
    /// start shape comes from the builtins member layout of the owning
    /// shape type.
    pub fn search_node_member_target<'f>(
        &self,
        file: &FileView<'f>,
        statement_index: usize,
        offset: usize,
    ) -> NodeSearchResult<'a, 'f> {
        let Some(Statement::NodeMemberDef(stmt)) = file.parsed.statements.get(statement_index)
        else {
            return NodeSearchResult::None;
        };
        let Some(value) = &stmt.value else {
            return NodeSearchResult::None;
        };
        let Some(view) = StatementView::at_index(file.parsed, file.source(), statement_index)
        else {
            return NodeSearchResult::None;
        };
        let Some((_, shape_def)) = view.nearest_shape_def_before() else {
            return NodeSearchResult::None;
        };
        let Some(body) = builtins::shape_body(&shape_def.shape_type.text) else {
            return NodeSearchResult::None;
        };
        let Some(start) = body
            .get_member(&stmt.name.text)
            .and_then(|member_id| self.model.get(member_id))
            .and_then(|member| self.model.target_of(member))
        else {
            return NodeSearchResult::None;
        };
        let scope = ResolveScope::of(file.parsed);
        node_search(
            NodeCursor::build(value, offset),
            start,
            &self.model,
            &scope,
            None,
        )
    }

    /// The shape the trait application at `statement_index` is applied
    /// to: the `apply` target when the application belongs to one, else
    /// the next shape definition.
    pub fn trait_applied_to(
        &self,
        file: &FileView<'_>,
        statement_index: usize,
    ) -> Option<&'a Shape> {
        let statements = &file.parsed.statements;
        let scope = ResolveScope::of(file.parsed);

        // walk back over the contiguous run of trait applications
        let mut first = statement_index;
        while first > 0 && matches!(statements[first - 1], Statement::TraitApplication(_)) {
            first -= 1;
        }
        if first > 0 {
            match &statements[first - 1] {
                Statement::Apply(apply) => return self.resolve(&apply.target.text, &scope),
                Statement::Block(_) if first >= 2 => {
                    if let Statement::Apply(apply) = &statements[first - 2] {
                        return self.resolve(&apply.target.text, &scope);
                    }
                }
                _ => {}
            }
        }

        // otherwise the run precedes a definition; member-level traits
        // have no operation context and yield nothing
        for statement in statements.iter().skip(statement_index + 1) {
            match statement {
                Statement::TraitApplication(_) => continue,
                Statement::ShapeDef(def) => {
                    if scope.namespace.is_empty() {
                        return None;
                    }
                    return self
                        .model
                        .get(&ShapeId::new(scope.namespace, def.name.text.as_str()));
                }
                _ => return None,
            }
        }
        None
    }
}
