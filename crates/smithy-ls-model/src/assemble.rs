//! The model-assembler facade and its default IDL implementation.
//!
//! The project layer only ever talks to [`ModelAssembler`]: feed it file
//! text keyed by path, stage cross-file trait applications, and ask for
//! a [`ModelResult`]. The default [`IdlAssembler`] builds shapes from
//! the parsed statement lists, resolves member targets against the
//! model and the prelude, merges metadata, and reports what it could
//! not resolve as validation events.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use smithy_ls_syntax::document::Document;
use smithy_ls_syntax::node::Node;
use smithy_ls_syntax::parse::parse_idl_text;
use smithy_ls_syntax::span::Span;
use smithy_ls_syntax::statement::{ParseResult, Statement};

use crate::builtins;
use crate::event::{SourceLocation, ValidationEvent};
use crate::id::ShapeId;
use crate::model::{Model, ModelBuilder};
use crate::shape::{Shape, ShapeType, TraitApplication};
use crate::value::NodeValue;

/// Result of one assembly: the model plus every event it produced.
#[derive(Debug, Clone, Default)]
pub struct ModelResult {
    pub model: Model,
    pub events: Vec<ValidationEvent>,
}

/// The facade the project layer consumes.
pub trait ModelAssembler: Send {
    /// Stage or replace a document's text under its path.
    fn add_document(&mut self, path: &str, text: &str);

    /// Remove a document and everything it contributed.
    fn remove_document(&mut self, path: &str);

    /// Stage a trait application to re-apply after the next assembly,
    /// used to preserve cross-file traits over incremental reloads.
    fn add_trait_application(&mut self, target: ShapeId, application: TraitApplication);

    /// Assemble the staged documents into a model.
    fn assemble(&mut self) -> ModelResult;
}

/// Factory producing fresh assembler instances, one per project.
pub type AssemblerFactory = Arc<dyn Fn() -> Box<dyn ModelAssembler> + Send + Sync>;

/// The default factory, producing [`IdlAssembler`]s.
pub fn default_assembler_factory() -> AssemblerFactory {
    Arc::new(|| Box::new(IdlAssembler::default()) as Box<dyn ModelAssembler>)
}

/// Assembles models straight from IDL text.
#[derive(Default)]
pub struct IdlAssembler {
    documents: BTreeMap<String, String>,
    staged: Vec<(ShapeId, TraitApplication)>,
}

impl ModelAssembler for IdlAssembler {
    fn add_document(&mut self, path: &str, text: &str) {
        self.documents.insert(path.to_string(), text.to_string());
    }

    fn remove_document(&mut self, path: &str) {
        self.documents.remove(path);
    }

    fn add_trait_application(&mut self, target: ShapeId, application: TraitApplication) {
        self.staged.push((target, application));
    }

    fn assemble(&mut self) -> ModelResult {
        tracing::debug!(
            documents = self.documents.len(),
            staged = self.staged.len(),
            "assembling model"
        );
        let mut assembly = Assembly::default();
        for (path, text) in &self.documents {
            assembly.load_file(path, text);
        }
        let staged = std::mem::take(&mut self.staged);
        assembly.finish(staged)
    }
}

/// A member target, mixin, or trait id waiting for global resolution.
#[derive(Debug)]
struct PendingReference {
    owner: ShapeId,
    token: String,
    location: SourceLocation,
    kind: ReferenceKind,
}

#[derive(Debug)]
enum ReferenceKind {
    /// Member target; owner is the member shape.
    Target,
    /// Mixin applied to owner.
    Mixin,
    /// Elided member; resolved through the owner's resource or mixins.
    Elided {
        for_resource: Option<String>,
        mixins: Vec<String>,
    },
    /// Resource identifier or property entry, keyed by name.
    Identifier(String),
}

/// A trait application waiting for its id (and possibly its target) to
/// resolve.
#[derive(Debug)]
struct PendingTrait {
    target: TraitTarget,
    token: String,
    value: Option<Node>,
    location: SourceLocation,
    element_locations: Option<Vec<SourceLocation>>,
    synthetic: bool,
}

/// Trait targets from `apply` statements stay tokens until every shape
/// of every file exists.
#[derive(Debug)]
enum TraitTarget {
    Shape(ShapeId),
    Token(String),
}

/// Per-file context needed by the resolution pass.
#[derive(Debug, Default)]
struct FileScope {
    namespace: String,
    imports: HashMap<String, ShapeId>,
}

#[derive(Default)]
struct Assembly {
    builder: ModelBuilder,
    events: Vec<ValidationEvent>,
    scopes: HashMap<String, FileScope>,
    references: Vec<PendingReference>,
    traits: Vec<PendingTrait>,
}

impl Assembly {
    fn load_file(&mut self, path: &str, text: &str) {
        let document = Document::of(text);
        let parsed = parse_idl_text(text);

        let mut scope = FileScope {
            namespace: parsed.namespace_name().to_string(),
            imports: HashMap::new(),
        };
        for import in &parsed.imports.ids {
            if let Ok(id) = import.parse::<ShapeId>() {
                scope.imports.insert(id.name().to_string(), id);
            }
        }

        FileWalker {
            assembly: self,
            path,
            document: &document,
            parsed: &parsed,
            scope: &scope,
            input_suffix: "Input".to_string(),
            output_suffix: "Output".to_string(),
        }
        .walk();

        self.scopes.insert(path.to_string(), scope);
    }

    fn location(document: &Document, path: &str, span: Span) -> SourceLocation {
        let position = document.position_of(span.start);
        SourceLocation::new(path, position.line + 1, position.character + 1)
    }

    /// Strict three-stage resolution: absolute id, file imports, current
    /// namespace, then the prelude.
    fn resolve(&self, scope: &FileScope, token: &str) -> Option<ShapeId> {
        if !ShapeId::is_valid_token(token) {
            return None;
        }
        if token.contains('#') {
            let id: ShapeId = token.parse().ok()?;
            return self.lookup(&id);
        }
        let (name, member) = match token.split_once('$') {
            Some((name, member)) => (name, Some(member)),
            None => (token, None),
        };
        if let Some(imported) = scope.imports.get(name) {
            let id = match member {
                Some(member) => imported.with_member(member),
                None => imported.clone(),
            };
            if let Some(found) = self.lookup(&id) {
                return Some(found);
            }
        }
        let local = match member {
            Some(member) => ShapeId::new(scope.namespace.as_str(), name).with_member(member),
            None => ShapeId::new(scope.namespace.as_str(), name),
        };
        if let Some(found) = self.lookup(&local) {
            return Some(found);
        }
        let prelude = match member {
            Some(member) => ShapeId::new(builtins::PRELUDE, name).with_member(member),
            None => ShapeId::new(builtins::PRELUDE, name),
        };
        self.lookup(&prelude)
    }

    fn lookup(&self, id: &ShapeId) -> Option<ShapeId> {
        if self.builder.get_shape(id).is_some() || builtins::builtins().contains(id) {
            Some(id.clone())
        } else {
            None
        }
    }

    fn finish(mut self, staged: Vec<(ShapeId, TraitApplication)>) -> ModelResult {
        self.resolve_references();
        self.resolve_traits();
        // re-staged traits are usually re-applied by their source file's
        // own text already; only fill actual holes
        for (target, application) in staged {
            let already_applied = self
                .builder
                .get_shape(&target)
                .is_some_and(|shape| shape.traits.iter().any(|t| subsumes(t, &application)));
            if !already_applied {
                self.builder.apply_trait(&target, application);
            }
        }
        ModelResult {
            model: self.builder.build(),
            events: self.events,
        }
    }

    fn resolve_references(&mut self) {
        let mut references = std::mem::take(&mut self.references);
        // elided members read the targets of mixin members, so everything
        // else resolves first
        references.sort_by_key(|reference| {
            matches!(reference.kind, ReferenceKind::Elided { .. })
        });
        for reference in references {
            let scope = self
                .scopes
                .get(&reference.location.filename)
                .cloned_scope();
            let resolved = self.resolve(&scope, &reference.token);
            match &reference.kind {
                ReferenceKind::Target => match resolved {
                    Some(target) => {
                        if let Some(member) = self.builder.get_shape_mut(&reference.owner) {
                            member.target = Some(target);
                        }
                    }
                    None => self.unresolved_target(&reference),
                },
                ReferenceKind::Mixin => match resolved {
                    Some(mixin) => {
                        if let Some(shape) = self.builder.get_shape_mut(&reference.owner) {
                            shape.mixins.push(mixin);
                        }
                    }
                    None => self.events.push(
                        ValidationEvent::error(
                            "Mixins",
                            format!("Unresolved mixin `{}`", reference.token),
                            reference.location.clone(),
                        )
                        .for_shape(reference.owner.clone()),
                    ),
                },
                ReferenceKind::Identifier(name) => match resolved {
                    Some(target) => {
                        let name = name.clone();
                        if let Some(shape) = self.builder.get_shape_mut(&reference.owner) {
                            shape.identifiers.insert(name, target);
                        }
                    }
                    None => self.unresolved_target(&reference),
                },
                ReferenceKind::Elided {
                    for_resource,
                    mixins,
                } => {
                    let member_name = reference.token.clone();
                    let target = self.elided_target(&scope, &member_name, for_resource, mixins);
                    match target {
                        Some(target) => {
                            if let Some(member) = self.builder.get_shape_mut(&reference.owner) {
                                member.target = Some(target);
                            }
                        }
                        None => self.events.push(
                            ValidationEvent::error(
                                "Target",
                                format!("No source for elided member `${member_name}`"),
                                reference.location.clone(),
                            )
                            .for_shape(reference.owner.clone()),
                        ),
                    }
                }
            }
        }
    }

    fn unresolved_target(&mut self, reference: &PendingReference) {
        self.events.push(
            ValidationEvent::error(
                "Target",
                format!("Unresolved shape id `{}`", reference.token),
                reference.location.clone(),
            )
            .for_shape(reference.owner.clone()),
        );
    }

    /// The shape an elided member's type comes from: a resource
    /// identifier or property, else the same-named member of a mixin.
    fn elided_target(
        &self,
        scope: &FileScope,
        member_name: &str,
        for_resource: &Option<String>,
        mixins: &[String],
    ) -> Option<ShapeId> {
        if let Some(resource_token) = for_resource {
            if let Some(resource_id) = self.resolve(scope, resource_token) {
                if let Some(resource) = self.builder.get_shape(&resource_id) {
                    if let Some(target) = resource.identifiers.get(member_name) {
                        return Some(target.clone());
                    }
                }
            }
        }
        for mixin_token in mixins {
            let Some(mixin_id) = self.resolve(scope, mixin_token) else {
                continue;
            };
            let Some(mixin) = self.builder.get_shape(&mixin_id) else {
                continue;
            };
            if let Some(member_id) = mixin.get_member(member_name) {
                if let Some(member) = self.builder.get_shape(member_id) {
                    if let Some(target) = &member.target {
                        return Some(target.clone());
                    }
                }
            }
        }
        None
    }

    fn resolve_traits(&mut self) {
        let traits = std::mem::take(&mut self.traits);
        for pending in traits {
            let scope = self.scopes.get(&pending.location.filename).cloned_scope();
            let target = match &pending.target {
                TraitTarget::Shape(id) => id.clone(),
                TraitTarget::Token(token) => match self.resolve(&scope, token) {
                    Some(id) => id,
                    None => {
                        self.events.push(ValidationEvent::warning(
                            "Model",
                            format!("Unresolved apply target `{token}`"),
                            pending.location.clone(),
                        ));
                        continue;
                    }
                },
            };
            let id = match self.resolve(&scope, &pending.token) {
                Some(id) => id,
                None => {
                    if !pending.synthetic {
                        self.events.push(
                            ValidationEvent::warning(
                                "Model",
                                format!("Unresolved trait `{}`", pending.token),
                                pending.location.clone(),
                            )
                            .for_shape(target.clone()),
                        );
                    }
                    best_guess_trait_id(&scope, &pending.token)
                }
            };
            let value = pending
                .value
                .as_ref()
                .map(NodeValue::from_node)
                .unwrap_or_else(|| NodeValue::Obj(Default::default()));
            let mut application = if pending.synthetic {
                TraitApplication::synthetic(id, value, pending.location.clone())
            } else {
                TraitApplication::new(id, value, pending.location.clone())
            };
            application.element_locations = pending.element_locations;
            self.builder.apply_trait(&target, application);
        }
    }
}

/// Missing scopes (files outside the assembly) resolve like an empty
/// file with no namespace.
trait ScopeLookup {
    fn cloned_scope(&self) -> FileScope;
}

impl ScopeLookup for Option<&FileScope> {
    fn cloned_scope(&self) -> FileScope {
        match self {
            Some(scope) => FileScope {
                namespace: scope.namespace.clone(),
                imports: scope.imports.clone(),
            },
            None => FileScope::default(),
        }
    }
}

/// Whether `existing` already covers `staged`: same trait from the same
/// place, or an array application whose fragments are all present.
fn subsumes(existing: &TraitApplication, staged: &TraitApplication) -> bool {
    if existing.id != staged.id {
        return false;
    }
    match (&staged.value, existing.element_locations.as_ref()) {
        (NodeValue::Arr(_), Some(existing_locations)) => staged
            .element_locations
            .as_ref()
            .map_or(existing.location == staged.location, |staged_locations| {
                staged_locations
                    .iter()
                    .all(|location| existing_locations.contains(location))
            }),
        _ => existing.location == staged.location,
    }
}

fn best_guess_trait_id(scope: &FileScope, token: &str) -> ShapeId {
    if token.contains('#') {
        if let Ok(id) = token.parse() {
            return id;
        }
    }
    if scope.namespace.is_empty() {
        ShapeId::new(builtins::PRELUDE, token)
    } else {
        ShapeId::new(scope.namespace.as_str(), token)
    }
}

struct FileWalker<'a> {
    assembly: &'a mut Assembly,
    path: &'a str,
    document: &'a Document,
    parsed: &'a ParseResult,
    scope: &'a FileScope,
    input_suffix: String,
    output_suffix: String,
}

/// What owns the members of the block currently being walked.
#[derive(Debug, Clone)]
struct Owner {
    id: ShapeId,
    shape_type: ShapeType,
    last_index: usize,
}

impl<'a> FileWalker<'a> {
    fn location(&self, span: Span) -> SourceLocation {
        Assembly::location(self.document, self.path, span)
    }

    fn walk(&mut self) {
        let mut owners: Vec<Owner> = Vec::new();
        // the most recent shape awaiting its block
        let mut candidate: Option<(ShapeId, ShapeType)> = None;
        // traits waiting for the next shape or member definition
        let mut pending: Vec<usize> = Vec::new();
        // an `apply` target consuming the next trait applications
        let mut apply_target: Option<String> = None;
        let mut apply_block_end: Option<usize> = None;
        // for/with clauses since the last shape def
        let mut for_resource: Option<String> = None;
        let mut mixin_tokens: Vec<String> = Vec::new();
        // suffix controls only count before the first shape definition
        let mut seen_shape_def = false;

        let statements = &self.parsed.statements;
        for (index, statement) in statements.iter().enumerate() {
            while owners
                .last()
                .is_some_and(|owner| owner.last_index < index)
            {
                owners.pop();
            }
            if apply_block_end.is_some_and(|end| end < index) {
                apply_block_end = None;
                apply_target = None;
            }

            match statement {
                Statement::Control(stmt) => {
                    let value = stmt.value.as_ref().and_then(|v| v.as_text());
                    match (stmt.key.text.as_str(), value) {
                        ("operationInputSuffix", Some(suffix)) if !seen_shape_def => {
                            self.input_suffix = suffix.to_string();
                        }
                        ("operationOutputSuffix", Some(suffix)) if !seen_shape_def => {
                            self.output_suffix = suffix.to_string();
                        }
                        _ => {}
                    }
                }
                Statement::Metadata(stmt) => {
                    if let Some(value) = &stmt.value {
                        self.assembly.builder.put_metadata(
                            stmt.key.text.clone(),
                            NodeValue::from_node(value),
                            self.location(stmt.span),
                        );
                    }
                }
                Statement::Namespace(_) | Statement::Use(_) | Statement::Incomplete(_) => {
                    pending.clear();
                    apply_target = None;
                }
                Statement::Apply(stmt) => {
                    pending.clear();
                    apply_target = Some(stmt.target.text.clone());
                    apply_block_end = None;
                }
                Statement::TraitApplication(_) => {
                    if let Some(target_token) = apply_target.clone() {
                        self.attach_trait(index, TraitTarget::Token(target_token));
                        if apply_block_end.is_none() {
                            // single `apply X @t` form consumes one trait
                            apply_target = None;
                        }
                    } else {
                        pending.push(index);
                    }
                }
                Statement::Block(block) => {
                    if let Some((id, shape_type)) = candidate.take() {
                        owners.push(Owner {
                            id,
                            shape_type,
                            last_index: block.enclosed.map_or(index, |(_, last)| last),
                        });
                    } else if apply_target.is_some() {
                        apply_block_end = Some(block.enclosed.map_or(index, |(_, last)| last));
                    }
                }
                Statement::ShapeDef(stmt) => {
                    apply_target = None;
                    for_resource = None;
                    mixin_tokens.clear();
                    candidate = None;
                    seen_shape_def = true;
                    if stmt.name.text.is_empty() {
                        pending.clear();
                        continue;
                    }
                    let Some(shape_type) = ShapeType::from_keyword(&stmt.shape_type.text) else {
                        pending.clear();
                        continue;
                    };
                    let id = self.define_shape(stmt.name.text.as_str(), shape_type, stmt.span);
                    if let Some(docs) = &stmt.docs {
                        self.attach_docs(&id, docs, stmt.span);
                    }
                    self.flush_pending(&mut pending, &id);
                    candidate = Some((id, shape_type));
                }
                Statement::ForResource(stmt) => {
                    for_resource = Some(stmt.resource.text.clone());
                }
                Statement::Mixins(stmt) => {
                    for name in &stmt.names {
                        mixin_tokens.push(name.text.clone());
                        if let Some((id, _)) = &candidate {
                            self.assembly.references.push(PendingReference {
                                owner: id.clone(),
                                token: name.text.clone(),
                                location: self.location(name.span),
                                kind: ReferenceKind::Mixin,
                            });
                        }
                    }
                }
                Statement::MemberDef(stmt) => {
                    let Some(owner) = owners.last().cloned() else {
                        pending.clear();
                        continue;
                    };
                    let member_id = self.define_member(&owner, &stmt.name.text, stmt.span);
                    if let (Some(member_id), Some(target)) = (&member_id, &stmt.target) {
                        self.assembly.references.push(PendingReference {
                            owner: member_id.clone(),
                            token: target.text.clone(),
                            location: self.location(target.span),
                            kind: ReferenceKind::Target,
                        });
                    }
                    if let Some(member_id) = &member_id {
                        if let Some(docs) = &stmt.docs {
                            self.attach_docs(member_id, docs, stmt.span);
                        }
                        self.flush_pending(&mut pending, member_id);
                    } else {
                        pending.clear();
                    }
                }
                Statement::EnumMemberDef(stmt) => {
                    let Some(owner) = owners.last().cloned() else {
                        pending.clear();
                        continue;
                    };
                    let member_id = self.define_member(&owner, &stmt.name.text, stmt.span);
                    if let Some(member_id) = &member_id {
                        if let Some(shape) = self.assembly.builder.get_shape_mut(member_id) {
                            shape.target = Some(ShapeId::new(builtins::PRELUDE, "Unit"));
                        }
                        if let Some(docs) = &stmt.docs {
                            self.attach_docs(member_id, docs, stmt.span);
                        }
                        self.flush_pending(&mut pending, member_id);
                    } else {
                        pending.clear();
                    }
                }
                Statement::ElidedMemberDef(stmt) => {
                    let Some(owner) = owners.last().cloned() else {
                        pending.clear();
                        continue;
                    };
                    let member_id = self.define_member(&owner, &stmt.name.text, stmt.span);
                    if let Some(member_id) = &member_id {
                        self.assembly.references.push(PendingReference {
                            owner: member_id.clone(),
                            token: stmt.name.text.clone(),
                            location: self.location(stmt.span),
                            kind: ReferenceKind::Elided {
                                for_resource: for_resource.clone(),
                                mixins: mixin_tokens.clone(),
                            },
                        });
                        self.flush_pending(&mut pending, member_id);
                    } else {
                        pending.clear();
                    }
                }
                Statement::NodeMemberDef(stmt) => {
                    pending.clear();
                    let Some(owner) = owners.last().cloned() else {
                        continue;
                    };
                    self.node_member(&owner, stmt);
                }
                Statement::InlineMemberDef(stmt) => {
                    pending.clear();
                    let Some(owner) = owners.last().cloned() else {
                        continue;
                    };
                    if owner.shape_type != ShapeType::Operation {
                        continue;
                    }
                    let suffix = if stmt.name.text == "input" {
                        &self.input_suffix
                    } else {
                        &self.output_suffix
                    };
                    let inline_name = format!("{}{}", owner.id.name(), suffix);
                    let inline_id =
                        self.define_shape(&inline_name, ShapeType::Structure, stmt.span);
                    let member_id = self.define_member(&owner, &stmt.name.text, stmt.span);
                    if let Some(member_id) = member_id {
                        if let Some(member) = self.assembly.builder.get_shape_mut(&member_id) {
                            member.target = Some(inline_id.clone());
                        }
                    }
                    for_resource = None;
                    mixin_tokens.clear();
                    candidate = Some((inline_id, ShapeType::Structure));
                }
            }
        }
    }

    fn define_shape(&mut self, name: &str, shape_type: ShapeType, span: Span) -> ShapeId {
        let namespace = if self.scope.namespace.is_empty() {
            // file-less namespace still yields shapes so features work
            "smithy.detached"
        } else {
            self.scope.namespace.as_str()
        };
        let id = ShapeId::new(namespace, name);
        let location = self.location(span);
        if self.assembly.builder.get_shape(&id).is_some() {
            self.assembly.events.push(
                ValidationEvent::error(
                    "Model",
                    format!("Conflicting shape definition for `{id}`"),
                    location.clone(),
                )
                .for_shape(id.clone()),
            );
        }
        self.assembly
            .builder
            .add_shape(Shape::new(id.clone(), shape_type, location));
        id
    }

    fn define_member(&mut self, owner: &Owner, name: &str, span: Span) -> Option<ShapeId> {
        if name.is_empty() {
            return None;
        }
        let member_id = owner.id.with_member(name);
        let location = self.location(span);
        let mut member = Shape::new(member_id.clone(), ShapeType::Member, location);
        member.target = None;
        self.assembly.builder.add_shape(member);
        if let Some(shape) = self.assembly.builder.get_shape_mut(&owner.id) {
            shape.members.insert(name.to_string(), member_id.clone());
        }
        Some(member_id)
    }

    fn node_member(&mut self, owner: &Owner, stmt: &smithy_ls_syntax::statement::NodeMemberDefStmt) {
        let member_id = self.define_member(owner, &stmt.name.text, stmt.span);
        let Some(value) = &stmt.value else {
            return;
        };
        match (owner.shape_type, stmt.name.text.as_str()) {
            (ShapeType::Resource, "identifiers" | "properties") => {
                if let Node::Obj(obj) = value {
                    for kvp in &obj.kvps {
                        if let Some(token) = kvp.value.as_text() {
                            self.assembly.references.push(PendingReference {
                                owner: owner.id.clone(),
                                token: token.to_string(),
                                location: self.location(kvp.value.span()),
                                kind: ReferenceKind::Identifier(kvp.key.value.clone()),
                            });
                        }
                    }
                }
            }
            (ShapeType::Operation, "input" | "output") => {
                if let (Some(member_id), Some(token)) = (&member_id, value.as_text()) {
                    self.assembly.references.push(PendingReference {
                        owner: member_id.clone(),
                        token: token.to_string(),
                        location: self.location(value.span()),
                        kind: ReferenceKind::Target,
                    });
                }
            }
            _ => {}
        }
    }

    fn attach_docs(&mut self, target: &ShapeId, docs: &str, span: Span) {
        self.assembly.traits.push(PendingTrait {
            target: TraitTarget::Shape(target.clone()),
            token: "smithy.api#documentation".to_string(),
            value: Some(Node::Str(smithy_ls_syntax::node::StrNode {
                value: docs.to_string(),
                span,
            })),
            location: self.location(span),
            element_locations: None,
            synthetic: true,
        });
    }

    fn flush_pending(&mut self, pending: &mut Vec<usize>, target: &ShapeId) {
        for index in pending.drain(..) {
            self.attach_trait(index, TraitTarget::Shape(target.clone()));
        }
    }

    fn attach_trait(&mut self, index: usize, target: TraitTarget) {
        let Some(Statement::TraitApplication(stmt)) = self.parsed.statements.get(index) else {
            return;
        };
        let element_locations = match &stmt.value {
            Some(Node::Arr(arr)) => Some(
                arr.elements
                    .iter()
                    .map(|element| self.location(element.span()))
                    .collect(),
            ),
            _ => None,
        };
        self.assembly.traits.push(PendingTrait {
            target,
            token: stmt.id.text.clone(),
            value: stmt.value.clone(),
            location: self.location(stmt.span),
            element_locations,
            synthetic: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assemble(files: &[(&str, &str)]) -> ModelResult {
        let mut assembler = IdlAssembler::default();
        for (path, text) in files {
            assembler.add_document(path, text);
        }
        assembler.assemble()
    }

    const BASE: &str = "$version: \"2\"\nnamespace com.a\n\nstructure S {\n    name: String\n}\n";

    #[test]
    fn assembles_shapes_and_members() {
        let result = assemble(&[("a.smithy", BASE)]);
        let id: ShapeId = "com.a#S".parse().unwrap();
        let shape = result.model.get_shape(&id).unwrap();
        assert_eq!(shape.shape_type, ShapeType::Structure);
        let member_id = shape.get_member("name").unwrap();
        let member = result.model.get_shape(member_id).unwrap();
        assert_eq!(
            member.target.as_ref().unwrap().to_string(),
            "smithy.api#String"
        );
        assert_eq!(shape.location.filename, "a.smithy");
        assert_eq!(shape.location.line, 4);
    }

    #[test]
    fn cross_file_apply_survives() {
        let other = "$version: \"2\"\nnamespace com.b\nuse com.a#S\napply S @documentation(\"from b\")\n";
        let result = assemble(&[("a.smithy", BASE), ("b.smithy", other)]);
        let id: ShapeId = "com.a#S".parse().unwrap();
        let shape = result.model.get_shape(&id).unwrap();
        let doc = shape.documentation().unwrap();
        assert_eq!(doc, "from b");
        let application = shape
            .get_trait(&"smithy.api#documentation".parse().unwrap())
            .unwrap();
        assert_eq!(application.location.filename, "b.smithy");
    }

    #[test]
    fn unresolved_member_target_reports_event() {
        let text = "$version: \"2\"\nnamespace com.a\nstructure S {\n    bad: Missing\n}\n";
        let result = assemble(&[("a.smithy", text)]);
        assert!(result
            .events
            .iter()
            .any(|event| event.id == "Target" && event.message.contains("Missing")));
    }

    #[test]
    fn inline_operation_members_get_suffixed_shapes() {
        let text = "$version: \"2\"\n$operationInputSuffix: \"Request\"\nnamespace com.a\n\noperation GetThing {\n    input := {\n        id: String\n    }\n}\n";
        let result = assemble(&[("a.smithy", text)]);
        let inline: ShapeId = "com.a#GetThingRequest".parse().unwrap();
        assert!(result.model.get_shape(&inline).is_some());
        let op: ShapeId = "com.a#GetThing".parse().unwrap();
        let op_shape = result.model.get_shape(&op).unwrap();
        let input_member = result
            .model
            .get_shape(op_shape.get_member("input").unwrap())
            .unwrap();
        assert_eq!(input_member.target.as_ref().unwrap(), &inline);
    }

    #[test]
    fn metadata_is_collected_per_file() {
        let text = "$version: \"2\"\nmetadata validators = [{name: \"EmitEachSelector\"}]\nnamespace com.a\n";
        let result = assemble(&[("a.smithy", text)]);
        let entry = &result.model.metadata()[0];
        assert_eq!(entry.key, "validators");
        assert_eq!(entry.location.filename, "a.smithy");
    }

    #[test]
    fn staged_traits_apply_after_assembly() {
        let mut assembler = IdlAssembler::default();
        assembler.add_document("a.smithy", BASE);
        assembler.add_trait_application(
            "com.a#S".parse().unwrap(),
            TraitApplication::new(
                "smithy.api#documentation".parse().unwrap(),
                NodeValue::Str("staged".to_string()),
                SourceLocation::top_of("b.smithy"),
            ),
        );
        let result = assembler.assemble();
        let shape = result
            .model
            .get_shape(&"com.a#S".parse().unwrap())
            .unwrap();
        assert_eq!(shape.documentation(), Some("staged"));
    }

    #[test]
    fn enum_members_are_modeled() {
        let text = "$version: \"2\"\nnamespace com.a\nenum Suit {\n    CLUB\n    HEART\n}\n";
        let result = assemble(&[("a.smithy", text)]);
        let shape = result
            .model
            .get_shape(&"com.a#Suit".parse().unwrap())
            .unwrap();
        assert_eq!(shape.members.len(), 2);
    }

    #[test]
    fn elided_member_resolves_through_mixin() {
        let text = "$version: \"2\"\nnamespace com.a\n\n@mixin\nstructure Base {\n    id: String\n}\n\nstructure Derived with [Base] {\n    $id\n}\n";
        let result = assemble(&[("a.smithy", text)]);
        let member = result
            .model
            .get_shape(&"com.a#Derived$id".parse().unwrap())
            .unwrap();
        assert_eq!(
            member.target.as_ref().unwrap().to_string(),
            "smithy.api#String"
        );
    }
}
