//! Completion.
//!
//! The classified position picks a candidate set; the candidate set is
//! rendered into completion items with text edits. Filtering happens
//! server-side because every item carries an edit against the typed
//! token.

use std::collections::BTreeSet;

use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Position, Range, TextEdit,
};
use smithy_ls_model::{builtins, Shape, ShapeType};
use smithy_ls_project::Project;
use smithy_ls_syntax::parse::idl_statement_keywords;
use smithy_ls_syntax::position::IdlPosition;
use smithy_ls_syntax::view::StatementView;

use crate::cancel::CancelToken;
use crate::search::{ModelView, NodeSearchResult, ResolveScope, ShapeSearch};
use crate::FileView;

/// What a position offers for completion.
enum Candidates<'a> {
    None,
    /// Fixed keyword or key literals.
    Literals(Vec<String>),
    /// Member names of `shape`.
    Members(&'a Shape),
    /// Elidable member names, offered as both `name` and `$name`.
    ElidedMembers(Vec<String>),
    /// Shapes passing a selector.
    Shapes(ShapeSelector),
    /// Names of the well-known validators.
    ValidatorNames,
    /// Both of two sets.
    And(Box<Candidates<'a>>, Box<Candidates<'a>>),
}

/// Which shapes a reference position accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeSelector {
    /// Any non-member shape.
    Any,
    /// Shapes carrying the trait marker.
    Traits,
    /// Shapes carrying the mixin marker.
    Mixins,
    Resources,
    /// Valid member targets: anything but traits, members, and the
    /// service closure.
    MemberTargets,
    /// A selector string from an `idRef` trait.
    Selector(String),
}

impl ShapeSelector {
    fn matches(&self, shape: &Shape) -> bool {
        if shape.shape_type == ShapeType::Member {
            return false;
        }
        let is_trait = shape.has_trait_named("smithy.api#trait");
        match self {
            ShapeSelector::Any => true,
            ShapeSelector::Traits => is_trait,
            ShapeSelector::Mixins => shape.has_trait_named("smithy.api#mixin"),
            ShapeSelector::Resources => shape.shape_type == ShapeType::Resource,
            ShapeSelector::MemberTargets => {
                !is_trait
                    && !matches!(
                        shape.shape_type,
                        ShapeType::Service | ShapeType::Resource | ShapeType::Operation
                    )
            }
            ShapeSelector::Selector(selector) => selector_matches(selector, shape, is_trait),
        }
    }
}

/// The small selector subset the builtins id-ref shapes use.
fn selector_matches(selector: &str, shape: &Shape, is_trait: bool) -> bool {
    match selector {
        "*" => true,
        "operation" => shape.shape_type == ShapeType::Operation,
        "resource" => shape.shape_type == ShapeType::Resource,
        "service" => shape.shape_type == ShapeType::Service,
        "structure" => shape.shape_type == ShapeType::Structure,
        "structure[trait|error]" => {
            shape.shape_type == ShapeType::Structure
                && shape.has_trait_named("smithy.api#error")
        }
        _ => !is_trait,
    }
}

/// Answer a completion request.
pub fn completions(
    project: &Project,
    file: &FileView<'_>,
    position: Position,
    cancel: &CancelToken,
) -> Vec<CompletionItem> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let Some(snapshot) = project.snapshot() else {
        return Vec::new();
    };
    let model = &snapshot.model_result.model;
    let search = ShapeSearch::new(model);

    let offset = file.document.index_of(position);
    let classified = IdlPosition::of(file.parsed, file.source(), offset);
    tracing::debug!(path = file.path, ?classified, "completion");
    if matches!(classified, IdlPosition::Namespace(_)) {
        return namespace_completions(project, file, position);
    }

    let token = file.document.copy_document_id(position);
    let (prefix, replace_range) = match &token {
        Some(token) => (token.text.to_lowercase(), token.range),
        None => {
            let at = file.document.position_of(offset);
            (String::new(), Range { start: at, end: at })
        }
    };

    if cancel.is_cancelled() {
        return Vec::new();
    }

    let mut exclude = BTreeSet::new();
    let candidates = candidates_for(classified, file, &search, offset, &mut exclude);

    let context = RenderContext {
        file,
        search: &search,
        prefix,
        replace_range,
        exclude,
        typed_absolute: token
            .as_ref()
            .is_some_and(|t| t.text.contains('#') || t.text.contains('.')),
    };
    render(candidates, &context, cancel)
}

fn candidates_for<'a>(
    classified: IdlPosition,
    file: &FileView<'_>,
    search: &ShapeSearch<'a>,
    offset: usize,
    exclude: &mut BTreeSet<String>,
) -> Candidates<'a> {
    match classified {
        IdlPosition::ControlKey(_) => Candidates::Literals(
            member_names(builtins::control_statements())
                .into_iter()
                .map(|name| format!("${name}"))
                .collect(),
        ),
        IdlPosition::MetadataKey(_) => {
            Candidates::Literals(member_names(builtins::metadata_statements()))
        }
        IdlPosition::StatementKeyword(_) => {
            Candidates::Literals(idl_statement_keywords())
        }
        IdlPosition::Namespace(_) => Candidates::None,
        IdlPosition::MetadataValue(index) => node_candidates(
            search.search_metadata_value(file, index, offset),
            search,
            exclude,
        ),
        IdlPosition::TraitValue(index) => node_candidates(
            search.search_trait_value(file, index, offset),
            search,
            exclude,
        ),
        IdlPosition::NodeMemberTarget(index) => node_candidates(
            search.search_node_member_target(file, index, offset),
            search,
            exclude,
        ),
        IdlPosition::ElidedMember(index) | IdlPosition::MemberName(index) => {
            member_position_candidates(classified, index, file, search, exclude)
        }
        IdlPosition::UseTarget(_) => Candidates::Shapes(ShapeSelector::Any),
        IdlPosition::TraitId(_) => Candidates::Shapes(ShapeSelector::Traits),
        IdlPosition::Mixin(_) => Candidates::Shapes(ShapeSelector::Mixins),
        IdlPosition::ForResource(_) => Candidates::Shapes(ShapeSelector::Resources),
        IdlPosition::MemberTarget(_) => Candidates::Shapes(ShapeSelector::MemberTargets),
        IdlPosition::ApplyTarget(_) => Candidates::Shapes(ShapeSelector::Any),
        IdlPosition::ShapeDef(_) | IdlPosition::Unknown => Candidates::None,
    }
}

/// Candidates inside a node value, from the search result.
fn node_candidates<'a>(
    result: NodeSearchResult<'a, '_>,
    search: &ShapeSearch<'a>,
    exclude: &mut BTreeSet<String>,
) -> Candidates<'a> {
    match result {
        NodeSearchResult::None => Candidates::None,
        NodeSearchResult::TerminalShape(shape, _) => shape_value_candidates(shape),
        NodeSearchResult::ObjectKey(_, container) => Candidates::Members(container),
        NodeSearchResult::ObjectShape(obj, container) => {
            for kvp in &obj.kvps {
                exclude.insert(kvp.key.value.clone());
            }
            Candidates::Members(container)
        }
        NodeSearchResult::ArrayShape(_, list) => {
            // completing a fresh element: typed by the list's member
            let element = list
                .get_member("member")
                .and_then(|id| search.model().get(id))
                .and_then(|member| search.model().target_of(member));
            match element {
                Some(element) => shape_value_candidates(element),
                None => Candidates::None,
            }
        }
    }
}

/// What to offer for a value typed by `shape`.
fn shape_value_candidates<'a>(shape: &'a Shape) -> Candidates<'a> {
    if let Some(id_ref) = id_ref_selector(shape) {
        return Candidates::Shapes(ShapeSelector::Selector(id_ref));
    }
    if shape.id == smithy_ls_model::ShapeId::new(builtins::NAMESPACE, "ValidatorName") {
        return Candidates::ValidatorNames;
    }
    match shape.shape_type {
        ShapeType::Boolean => {
            Candidates::Literals(vec!["true".to_string(), "false".to_string()])
        }
        ShapeType::Enum | ShapeType::IntEnum => {
            Candidates::Literals(shape.members.keys().cloned().collect())
        }
        _ => Candidates::None,
    }
}

fn id_ref_selector(shape: &Shape) -> Option<String> {
    let id_ref = smithy_ls_model::ShapeId::new(builtins::PRELUDE, "idRef");
    let application = shape.get_trait(&id_ref)?;
    Some(
        application
            .value
            .get("selector")
            .and_then(|v| v.as_str())
            .unwrap_or("*")
            .to_string(),
    )
}

/// Member-name and elided-member completion inside a shape body.
fn member_position_candidates<'a>(
    classified: IdlPosition,
    index: usize,
    file: &FileView<'_>,
    search: &ShapeSearch<'a>,
    exclude: &mut BTreeSet<String>,
) -> Candidates<'a> {
    let Some(view) = StatementView::at_index(file.parsed, file.source(), index) else {
        return Candidates::None;
    };
    for name in view.other_member_names() {
        exclude.insert(name.to_string());
        exclude.insert(format!("${name}"));
    }

    let elided = elidable_members(&view, search, file);
    if matches!(classified, IdlPosition::ElidedMember(_)) {
        return Candidates::ElidedMembers(elided);
    }

    let structural = view
        .nearest_shape_def_before()
        .and_then(|(_, def)| builtins::shape_body(&def.shape_type.text))
        .map(Candidates::Members)
        .unwrap_or(Candidates::None);
    if elided.is_empty() {
        structural
    } else {
        Candidates::And(
            Box::new(structural),
            Box::new(Candidates::ElidedMembers(elided)),
        )
    }
}

/// Member names the surrounding `for` resource and mixins can supply.
fn elidable_members(
    view: &StatementView<'_>,
    search: &ShapeSearch<'_>,
    file: &FileView<'_>,
) -> Vec<String> {
    let scope = ResolveScope::of(file.parsed);
    let (for_resource, mixins) = view.nearest_for_resource_and_mixins_before();
    let mut names = Vec::new();
    if let Some(for_resource) = for_resource {
        if let Some(resource) = search.resolve(&for_resource.resource.text, &scope) {
            names.extend(resource.identifiers.keys().cloned());
        }
    }
    if let Some(mixins) = mixins {
        for name in &mixins.names {
            if let Some(mixin) = search.resolve(&name.text, &scope) {
                names.extend(mixin.members.keys().cloned());
            }
        }
    }
    names.sort();
    names.dedup();
    names
}

fn member_names(shape: &Shape) -> Vec<String> {
    shape.members.keys().cloned().collect()
}

struct RenderContext<'a, 'f> {
    file: &'a FileView<'f>,
    search: &'a ShapeSearch<'a>,
    prefix: String,
    replace_range: Range,
    exclude: BTreeSet<String>,
    /// The typed token contains `#` or `.`, so items match and insert
    /// fully-qualified ids.
    typed_absolute: bool,
}

impl RenderContext<'_, '_> {
    fn matches(&self, key: &str) -> bool {
        !self.exclude.contains(key)
            && (self.prefix.is_empty() || key.to_lowercase().starts_with(&self.prefix))
    }

    fn simple_item(&self, label: &str, kind: CompletionItemKind) -> CompletionItem {
        CompletionItem {
            label: label.to_string(),
            kind: Some(kind),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: self.replace_range,
                new_text: label.to_string(),
            })),
            ..CompletionItem::default()
        }
    }
}

fn render(
    candidates: Candidates<'_>,
    context: &RenderContext<'_, '_>,
    cancel: &CancelToken,
) -> Vec<CompletionItem> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    match candidates {
        Candidates::None => Vec::new(),
        Candidates::Literals(literals) => literals
            .iter()
            .filter(|literal| context.matches(literal))
            .map(|literal| context.simple_item(literal, CompletionItemKind::KEYWORD))
            .collect(),
        Candidates::Members(shape) => {
            let model = context.search.model();
            shape
                .members
                .iter()
                .filter(|(name, _)| context.matches(name))
                .map(|(name, member_id)| {
                    let mut item = context.simple_item(name, CompletionItemKind::FIELD);
                    if let Some(docs) = model.get(member_id).and_then(Shape::documentation) {
                        item.detail = Some(docs.to_string());
                    }
                    item
                })
                .collect()
        }
        Candidates::ElidedMembers(names) => names
            .iter()
            .filter(|name| {
                context.matches(name) || context.matches(&format!("${name}"))
            })
            .map(|name| {
                let label = format!("${name}");
                let mut item = context.simple_item(&label, CompletionItemKind::FIELD);
                item.filter_text = Some(name.clone());
                item
            })
            .collect(),
        Candidates::Shapes(selector) => shape_items(&selector, context, cancel),
        Candidates::ValidatorNames => crate::search::VALIDATOR_NAMES
            .iter()
            .filter(|name| context.matches(name))
            .map(|name| context.simple_item(name, CompletionItemKind::VALUE))
            .collect(),
        Candidates::And(first, second) => {
            let mut items = render(*first, context, cancel);
            let existing: BTreeSet<String> =
                items.iter().map(|item| item.label.clone()).collect();
            items.extend(
                render(*second, context, cancel)
                    .into_iter()
                    .filter(|item| !existing.contains(&item.label)),
            );
            items
        }
    }
}

fn shape_items(
    selector: &ShapeSelector,
    context: &RenderContext<'_, '_>,
    cancel: &CancelToken,
) -> Vec<CompletionItem> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let model = context.search.model();
    let namespace = context.file.parsed.namespace_name();
    let mut items = Vec::new();

    // trait and mixin positions walk the by-trait index instead of the
    // whole shape map
    let marker = match selector {
        ShapeSelector::Traits => Some(smithy_ls_model::ShapeId::new(builtins::PRELUDE, "trait")),
        ShapeSelector::Mixins => Some(smithy_ls_model::ShapeId::new(builtins::PRELUDE, "mixin")),
        _ => None,
    };
    let shapes: Box<dyn Iterator<Item = &Shape> + '_> = match &marker {
        Some(marker) => Box::new(
            model
                .model()
                .shapes_with_trait(marker)
                .chain(builtins::builtins().shapes_with_trait(marker)),
        ),
        None => Box::new(model.model().shapes().chain(builtins::builtins().shapes())),
    };

    for shape in shapes {
        if shape.id.namespace() == builtins::NAMESPACE {
            continue;
        }
        if !selector.matches(shape) {
            continue;
        }
        // private shapes are invisible outside their namespace
        if shape.has_trait_named("smithy.api#private") && shape.id.namespace() != namespace {
            continue;
        }
        let absolute = shape.id.to_string();
        let match_key = if context.typed_absolute {
            absolute.to_lowercase()
        } else {
            shape.id.name().to_lowercase()
        };
        if context.exclude.contains(&absolute)
            || !(context.prefix.is_empty() || match_key.starts_with(&context.prefix))
        {
            continue;
        }

        let insert = if context.typed_absolute {
            absolute.clone()
        } else {
            shape.id.name().to_string()
        };
        let mut item = CompletionItem {
            label: shape.id.name().to_string(),
            kind: Some(completion_kind(shape)),
            detail: Some(absolute.clone()),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: context.replace_range,
                new_text: insert,
            })),
            ..CompletionItem::default()
        };
        if !context.typed_absolute {
            if let Some(edit) = import_edit(shape, context) {
                item.additional_text_edits = Some(vec![edit]);
            }
        }
        items.push(item);

        if *selector == ShapeSelector::Traits {
            if let Some(skeleton) = trait_skeleton(shape, context) {
                items.push(skeleton);
            }
        }
    }
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

fn completion_kind(shape: &Shape) -> CompletionItemKind {
    match shape.shape_type {
        ShapeType::Operation => CompletionItemKind::FUNCTION,
        ShapeType::Service | ShapeType::Resource => CompletionItemKind::MODULE,
        ShapeType::Enum | ShapeType::IntEnum => CompletionItemKind::ENUM,
        ShapeType::Structure | ShapeType::Union => CompletionItemKind::STRUCT,
        _ => CompletionItemKind::CLASS,
    }
}

/// A `use` line for a shape outside the current namespace and the
/// prelude, appended after the existing imports (or the namespace
/// statement when there are none).
fn import_edit(shape: &Shape, context: &RenderContext<'_, '_>) -> Option<TextEdit> {
    let parsed = context.file.parsed;
    let namespace = parsed.namespace_name();
    let shape_namespace = shape.id.namespace();
    if shape_namespace == namespace
        || shape_namespace == builtins::PRELUDE
        || parsed.imports.ids.contains(&shape.id.absolute_name())
    {
        return None;
    }
    let anchor = parsed
        .imports
        .span
        .map(|span| span.end)
        .or_else(|| parsed.namespace.as_ref().map(|ns| ns.statement_span.end))?;
    let at = context.file.document.position_of(anchor);
    let line_end = context.file.document.line_end(at.line);
    let insert_at = context.file.document.position_of(line_end);
    Some(TextEdit {
        range: Range {
            start: insert_at,
            end: insert_at,
        },
        new_text: format!("\nuse {}", shape.id.absolute_name()),
    })
}

/// The second completion item for a trait: the id with its required
/// members filled in with default values. Recursive trait structures
/// are bounded by a visited set.
fn trait_skeleton(
    shape: &Shape,
    context: &RenderContext<'_, '_>,
) -> Option<CompletionItem> {
    if shape.shape_type != ShapeType::Structure || shape.members.is_empty() {
        return None;
    }
    let model = context.search.model();
    let mut visited = BTreeSet::new();
    visited.insert(shape.id.clone());

    let mut parts = Vec::new();
    for (name, member_id) in &shape.members {
        let member = model.get(member_id)?;
        if !member.has_trait_named("smithy.api#required") {
            continue;
        }
        let target = model.target_of(member);
        parts.push(format!(
            "{name}: {}",
            default_value(target, model, &mut visited)
        ));
    }
    if parts.is_empty() {
        return None;
    }
    let body = parts.join(", ");
    let label = format!("{}({body})", shape.id.name());
    Some(CompletionItem {
        label,
        kind: Some(CompletionItemKind::SNIPPET),
        detail: Some(shape.id.to_string()),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: context.replace_range,
            new_text: format!("{}({body})", shape.id.name()),
        })),
        ..CompletionItem::default()
    })
}

fn default_value(
    shape: Option<&Shape>,
    model: &ModelView<'_>,
    visited: &mut BTreeSet<smithy_ls_model::ShapeId>,
) -> String {
    let Some(shape) = shape else {
        return "\"\"".to_string();
    };
    match shape.shape_type {
        ShapeType::String | ShapeType::Timestamp | ShapeType::Blob => "\"\"".to_string(),
        ShapeType::Boolean => "false".to_string(),
        ShapeType::List | ShapeType::Set => "[]".to_string(),
        ShapeType::Map => "{}".to_string(),
        ShapeType::Structure | ShapeType::Union => {
            if !visited.insert(shape.id.clone()) {
                // break recursion on revisited shapes
                return "{}".to_string();
            }
            let mut parts = Vec::new();
            for (name, member_id) in &shape.members {
                let Some(member) = model.get(member_id) else {
                    continue;
                };
                if !member.has_trait_named("smithy.api#required") {
                    continue;
                }
                let target = model.target_of(member);
                parts.push(format!("{name}: {}", default_value(target, model, visited)));
            }
            format!("{{{}}}", parts.join(", "))
        }
        _ if shape.shape_type.is_simple() => "0".to_string(),
        _ => "\"\"".to_string(),
    }
}

/// Project-namespace candidates need the project, which `render` does
/// not carry; the entry point handles them directly.
pub fn namespace_completions(
    project: &Project,
    file: &FileView<'_>,
    position: Position,
) -> Vec<CompletionItem> {
    let token = file.document.copy_document_id(position);
    let (prefix, range) = match &token {
        Some(token) => (token.text.to_lowercase(), token.range),
        None => {
            let at = position;
            (String::new(), Range { start: at, end: at })
        }
    };
    let mut namespaces = BTreeSet::new();
    for smithy_file in project.smithy_files() {
        let namespace = smithy_file.parsed().namespace_name().to_string();
        if !namespace.is_empty() {
            namespaces.insert(namespace);
        }
    }
    namespaces
        .into_iter()
        .filter(|namespace| prefix.is_empty() || namespace.to_lowercase().starts_with(&prefix))
        .map(|namespace| CompletionItem {
            label: namespace.clone(),
            kind: Some(CompletionItemKind::MODULE),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range,
                new_text: namespace,
            })),
            ..CompletionItem::default()
        })
        .collect()
}
