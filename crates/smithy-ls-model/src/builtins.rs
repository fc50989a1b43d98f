//! The frozen builtins model.
//!
//! Loaded once at startup and read-only afterwards. It carries three
//! groups of shapes:
//!
//! - the `smithy.api` prelude: simple shapes and the trait definitions
//!   the engine needs to recognize;
//! - the `smithy.test` protocol-test traits with their test-case
//!   structures;
//! - the `smithy.lang.server` namespace describing the language's own
//!   surface: control keys, metadata keys, per-shape-type member
//!   layouts, validator configurations, and build-file schemas.
//!
//! Completion and hover for constructs that are not part of the user's
//! model all read from here.

use once_cell::sync::Lazy;

use crate::event::SourceLocation;
use crate::id::ShapeId;
use crate::model::{Model, ModelBuilder};
use crate::shape::{Shape, ShapeType, TraitApplication};
use crate::value::NodeValue;

/// Namespace of the language-surface shapes.
pub const NAMESPACE: &str = "smithy.lang.server";
/// The prelude namespace.
pub const PRELUDE: &str = "smithy.api";
/// Namespace of the protocol-test traits.
pub const TEST_NAMESPACE: &str = "smithy.test";

pub const DOCS_URL: &str = "https://smithy.io/2.0/spec/idl.html";

static BUILTINS: Lazy<Model> = Lazy::new(build);

/// The process-wide builtins model.
pub fn builtins() -> &'static Model {
    &BUILTINS
}

/// A shape from the `smithy.lang.server` namespace.
pub fn language_shape(name: &str) -> Option<&'static Shape> {
    builtins().get_shape(&ShapeId::new(NAMESPACE, name))
}

/// The shape describing the file-level control keys (`$version`, ...).
pub fn control_statements() -> &'static Shape {
    language_shape("BuiltinControls").unwrap_or_else(|| unreachable!("builtins are frozen"))
}

/// The shape describing the well-known metadata keys.
pub fn metadata_statements() -> &'static Shape {
    language_shape("BuiltinMetadata").unwrap_or_else(|| unreachable!("builtins are frozen"))
}

/// The syntactic member layout of a shape-type keyword: what can be
/// written inside a `service`, `resource`, `operation`, `list`, or
/// `map` body.
pub fn shape_body(keyword: &str) -> Option<&'static Shape> {
    let name = match keyword {
        "service" => "ServiceShape",
        "resource" => "ResourceShape",
        "operation" => "OperationShape",
        "list" | "set" => "ListShape",
        "map" => "MapShape",
        _ => return None,
    };
    language_shape(name)
}

/// Schema shape for a build-file type, by schema name.
pub fn build_file_schema(name: &str) -> Option<&'static Shape> {
    language_shape(name)
}

fn builtin_location() -> SourceLocation {
    SourceLocation::top_of("smithy-language-builtins.smithy")
}

/// Shape-construction helpers over a [`ModelBuilder`]. Builtins are
/// assembled in code rather than parsed from an embedded file so the
/// model is available even before any document exists.
struct Builtin<'a> {
    builder: &'a mut ModelBuilder,
    namespace: &'static str,
}

impl<'a> Builtin<'a> {
    fn new(builder: &'a mut ModelBuilder, namespace: &'static str) -> Self {
        Self { builder, namespace }
    }

    fn id(&self, name: &str) -> ShapeId {
        ShapeId::new(self.namespace, name)
    }

    fn simple(&mut self, name: &str, shape_type: ShapeType) -> ShapeId {
        let id = self.id(name);
        self.builder
            .add_shape(Shape::new(id.clone(), shape_type, builtin_location()));
        id
    }

    fn documented(&mut self, id: &ShapeId, docs: &str) {
        let application = TraitApplication::synthetic(
            ShapeId::new(PRELUDE, "documentation"),
            NodeValue::Str(docs.to_string()),
            builtin_location(),
        );
        if let Some(shape) = self.builder.get_shape_mut(id) {
            shape.traits.push(application);
        }
    }

    fn mark(&mut self, id: &ShapeId, trait_name: &str) {
        let application = TraitApplication::synthetic(
            ShapeId::new(PRELUDE, trait_name),
            NodeValue::Obj(Default::default()),
            builtin_location(),
        );
        if let Some(shape) = self.builder.get_shape_mut(id) {
            shape.traits.push(application);
        }
    }

    /// A string shape constrained to reference other shapes, used for
    /// node members whose values are shape ids.
    fn id_ref(&mut self, name: &str, selector: &str) -> ShapeId {
        let id = self.simple(name, ShapeType::String);
        let mut value = indexmap::IndexMap::new();
        value.insert(
            "selector".to_string(),
            NodeValue::Str(selector.to_string()),
        );
        let application = TraitApplication::synthetic(
            ShapeId::new(PRELUDE, "idRef"),
            NodeValue::Obj(value),
            builtin_location(),
        );
        if let Some(shape) = self.builder.get_shape_mut(&id) {
            shape.traits.push(application);
        }
        id
    }

    fn list_of(&mut self, name: &str, member_target: &ShapeId) -> ShapeId {
        let id = self.id(name);
        let member_id = id.with_member("member");
        let mut member = Shape::new(member_id.clone(), ShapeType::Member, builtin_location());
        member.target = Some(member_target.clone());
        let mut list = Shape::new(id.clone(), ShapeType::List, builtin_location());
        list.members.insert("member".to_string(), member_id);
        self.builder.add_shape(member);
        self.builder.add_shape(list);
        id
    }

    fn map_of(&mut self, name: &str, key: &ShapeId, value: &ShapeId) -> ShapeId {
        let id = self.id(name);
        let key_id = id.with_member("key");
        let value_id = id.with_member("value");
        let mut key_shape = Shape::new(key_id.clone(), ShapeType::Member, builtin_location());
        key_shape.target = Some(key.clone());
        let mut value_shape = Shape::new(value_id.clone(), ShapeType::Member, builtin_location());
        value_shape.target = Some(value.clone());
        let mut map = Shape::new(id.clone(), ShapeType::Map, builtin_location());
        map.members.insert("key".to_string(), key_id);
        map.members.insert("value".to_string(), value_id);
        self.builder.add_shape(key_shape);
        self.builder.add_shape(value_shape);
        self.builder.add_shape(map);
        id
    }

    /// A structure with `(member, target, docs)` rows. Empty docs are
    /// not attached.
    fn structure(&mut self, name: &str, members: &[(&str, ShapeId, &str)]) -> ShapeId {
        let id = self.id(name);
        let mut shape = Shape::new(id.clone(), ShapeType::Structure, builtin_location());
        for (member_name, target, docs) in members {
            let member_id = id.with_member(*member_name);
            let mut member =
                Shape::new(member_id.clone(), ShapeType::Member, builtin_location());
            member.target = Some(target.clone());
            if !docs.is_empty() {
                member.traits.push(TraitApplication::synthetic(
                    ShapeId::new(PRELUDE, "documentation"),
                    NodeValue::Str(docs.to_string()),
                    builtin_location(),
                ));
            }
            shape.members.insert(member_name.to_string(), member_id.clone());
            self.builder.add_shape(member);
        }
        self.builder.add_shape(shape);
        id
    }

    /// A trait definition: a shape of `shape_type` carrying the `trait`
    /// marker.
    fn trait_def(&mut self, name: &str, shape_type: ShapeType, docs: &str) -> ShapeId {
        let id = self.simple(name, shape_type);
        self.mark(&id, "trait");
        if !docs.is_empty() {
            self.documented(&id, docs);
        }
        id
    }
}

fn build() -> Model {
    let mut builder = ModelBuilder::new();
    build_prelude(&mut builder);
    build_test_traits(&mut builder);
    build_language_surface(&mut builder);
    builder.build()
}

fn build_prelude(builder: &mut ModelBuilder) {
    let mut ns = Builtin::new(builder, PRELUDE);

    for (name, shape_type) in [
        ("String", ShapeType::String),
        ("Blob", ShapeType::Blob),
        ("Boolean", ShapeType::Boolean),
        ("Byte", ShapeType::Byte),
        ("Short", ShapeType::Short),
        ("Integer", ShapeType::Integer),
        ("Long", ShapeType::Long),
        ("Float", ShapeType::Float),
        ("Double", ShapeType::Double),
        ("BigInteger", ShapeType::BigInteger),
        ("BigDecimal", ShapeType::BigDecimal),
        ("Timestamp", ShapeType::Timestamp),
        ("Document", ShapeType::Document),
    ] {
        ns.simple(name, shape_type);
    }
    ns.structure("Unit", &[]);

    let string = ns.id("String");
    let long = ns.id("Long");
    let integer = ns.id("Integer");
    let boolean = ns.id("Boolean");
    let document = ns.id("Document");

    // the trait marker itself
    let trait_marker = ns.structure(
        "trait",
        &[("selector", string.clone(), "Valid targets of this trait.")],
    );
    ns.mark(&trait_marker, "trait");
    ns.documented(&trait_marker, "Marks a shape as a trait definition.");

    ns.trait_def(
        "documentation",
        ShapeType::String,
        "Adds documentation to a shape or member.",
    );
    ns.trait_def("required", ShapeType::Structure, "The member must be set.");
    ns.trait_def("pattern", ShapeType::String, "Restricts string values to a regular expression.");
    ns.trait_def("error", ShapeType::String, "Marks a structure as an error. Value is \"client\" or \"server\".");
    ns.trait_def("readonly", ShapeType::Structure, "The operation has no side effects.");
    ns.trait_def("idempotent", ShapeType::Structure, "Repeating the operation has no further effect.");
    ns.trait_def("httpLabel", ShapeType::Structure, "Binds the member to a URI label.");
    ns.trait_def("httpPayload", ShapeType::Structure, "Binds the member to the HTTP message body.");
    ns.trait_def("httpQuery", ShapeType::String, "Binds the member to a query string parameter.");
    ns.trait_def("httpHeader", ShapeType::String, "Binds the member to an HTTP header.");
    ns.trait_def("httpError", ShapeType::Integer, "HTTP status code of an error structure.");
    ns.trait_def("private", ShapeType::Structure, "The shape cannot be referenced outside its namespace.");
    ns.trait_def("internal", ShapeType::Structure, "The shape is for internal use only.");
    ns.trait_def("sensitive", ShapeType::Structure, "The shape holds sensitive data.");
    ns.trait_def("default", ShapeType::Document, "Assigns a default value to a member.");
    ns.trait_def("enumValue", ShapeType::Document, "Assigns the wire value of an enum member.");
    ns.trait_def("title", ShapeType::String, "Human-readable name of the shape.");
    ns.trait_def("uniqueItems", ShapeType::Structure, "List elements must be unique.");
    ns.trait_def("sparse", ShapeType::Structure, "Collection values may be null.");
    ns.trait_def("input", ShapeType::Structure, "The structure is an operation input.");
    ns.trait_def("output", ShapeType::Structure, "The structure is an operation output.");
    ns.trait_def("requiresLength", ShapeType::Structure, "Streaming blob requires a known length.");
    ns.trait_def("streaming", ShapeType::Structure, "The blob is streamed.");
    ns.trait_def("suppress", ShapeType::List, "Suppresses named validation events on this shape.");

    let length = ns.structure(
        "length",
        &[
            ("min", long.clone(), "Minimum permitted length."),
            ("max", long.clone(), "Maximum permitted length."),
        ],
    );
    ns.mark(&length, "trait");
    ns.documented(&length, "Constrains the length of a string, blob, list, or map.");

    let range = ns.structure(
        "range",
        &[
            ("min", long.clone(), "Minimum permitted value."),
            ("max", long.clone(), "Maximum permitted value."),
        ],
    );
    ns.mark(&range, "trait");
    ns.documented(&range, "Constrains numeric values to an inclusive range.");

    let http = ns.structure(
        "http",
        &[
            ("method", string.clone(), "HTTP method of the operation."),
            ("uri", string.clone(), "URI pattern of the operation."),
            ("code", integer.clone(), "Status code of a successful response."),
        ],
    );
    ns.mark(&http, "trait");
    ns.documented(&http, "Binds an operation to an HTTP method and URI.");

    let deprecated = ns.structure(
        "deprecated",
        &[
            ("message", string.clone(), "Reason for the deprecation."),
            ("since", string.clone(), "Version the deprecation started in."),
        ],
    );
    ns.mark(&deprecated, "trait");
    ns.documented(&deprecated, "Marks a shape or member as deprecated.");

    let paginated = ns.structure(
        "paginated",
        &[
            ("inputToken", string.clone(), ""),
            ("outputToken", string.clone(), ""),
            ("items", string.clone(), ""),
            ("pageSize", string.clone(), ""),
        ],
    );
    ns.mark(&paginated, "trait");
    ns.documented(&paginated, "Marks an operation as paginated.");

    let id_ref = ns.structure(
        "idRef",
        &[
            ("selector", string.clone(), "Selector the referenced shape must match."),
            ("failWhenMissing", boolean.clone(), ""),
            ("errorMessage", string.clone(), ""),
        ],
    );
    ns.mark(&id_ref, "trait");
    ns.documented(&id_ref, "The string value must be a shape id.");

    let local_traits = ns.list_of("LocalTraits", &string);
    let mixin = ns.structure(
        "mixin",
        &[("localTraits", local_traits, "Traits not carried over to mixed-in shapes.")],
    );
    ns.mark(&mixin, "trait");
    ns.documented(&mixin, "Marks a shape as a mixin.");

    let tags = ns.list_of("tags", &string);
    ns.mark(&tags, "trait");
    ns.documented(&tags, "Attaches free-form tags to a shape.");

    let external_docs = ns.map_of("externalDocumentation", &string, &string);
    ns.mark(&external_docs, "trait");
    ns.documented(&external_docs, "Links a shape to external documentation pages.");

    // examples: a list of Example structures whose input/output follow
    // the operation the trait is applied to
    let example = ns.structure(
        "Example",
        &[
            ("title", string.clone(), "Short title of the example."),
            ("documentation", string.clone(), ""),
            ("input", document.clone(), "Example operation input parameters."),
            ("output", document.clone(), "Example operation output."),
            ("allowConstraintErrors", boolean.clone(), ""),
        ],
    );
    let examples = ns.list_of("examples", &example);
    ns.mark(&examples, "trait");
    ns.documented(&examples, "Provides example inputs and outputs for an operation.");
}

fn build_test_traits(builder: &mut ModelBuilder) {
    let string = ShapeId::new(PRELUDE, "String");
    let integer = ShapeId::new(PRELUDE, "Integer");
    let document = ShapeId::new(PRELUDE, "Document");

    let mut ns = Builtin::new(builder, TEST_NAMESPACE);

    let expectation = ns.structure(
        "SmokeTestExpectation",
        &[
            ("success", document.clone(), "The call must succeed."),
            ("failure", document.clone(), "The call must fail."),
        ],
    );
    let smoke_case = ns.structure(
        "SmokeTestCase",
        &[
            ("id", string.clone(), "Unique test case id."),
            ("params", document.clone(), "Operation input parameters."),
            ("vendorParams", document.clone(), "Vendor-specific parameters."),
            ("vendorParamsShape", string.clone(), "Shape of vendorParams."),
            ("expect", expectation, "Expected outcome."),
        ],
    );
    let smoke_tests = ns.list_of("smokeTests", &smoke_case);
    ns.mark(&smoke_tests, "trait");
    ns.documented(&smoke_tests, "Defines smoke test cases for an operation.");

    let headers = ns.map_of("HttpHeaders", &string, &string);
    let request_case = ns.structure(
        "HttpRequestTestCase",
        &[
            ("id", string.clone(), "Unique test case id."),
            ("protocol", string.clone(), "Protocol shape id."),
            ("method", string.clone(), "Expected HTTP method."),
            ("uri", string.clone(), "Expected request URI."),
            ("headers", headers.clone(), ""),
            ("body", string.clone(), "Expected message body."),
            ("params", document.clone(), "Operation input parameters."),
            ("vendorParams", document.clone(), ""),
            ("vendorParamsShape", string.clone(), "Shape of vendorParams."),
        ],
    );
    let request_tests = ns.list_of("httpRequestTests", &request_case);
    ns.mark(&request_tests, "trait");
    ns.documented(&request_tests, "Defines HTTP request protocol tests.");

    let response_case = ns.structure(
        "HttpResponseTestCase",
        &[
            ("id", string.clone(), "Unique test case id."),
            ("protocol", string.clone(), "Protocol shape id."),
            ("code", integer.clone(), "Expected HTTP status code."),
            ("headers", headers, ""),
            ("body", string.clone(), "Expected message body."),
            ("params", document.clone(), "Operation output parameters."),
            ("vendorParams", document.clone(), ""),
            ("vendorParamsShape", string.clone(), "Shape of vendorParams."),
        ],
    );
    let response_tests = ns.list_of("httpResponseTests", &response_case);
    ns.mark(&response_tests, "trait");
    ns.documented(&response_tests, "Defines HTTP response protocol tests.");
}

fn build_language_surface(builder: &mut ModelBuilder) {
    let string = ShapeId::new(PRELUDE, "String");
    let document = ShapeId::new(PRELUDE, "Document");

    let mut ns = Builtin::new(builder, NAMESPACE);

    let controls = ns.structure(
        "BuiltinControls",
        &[
            (
                "version",
                string.clone(),
                "Defines the Smithy IDL version of the file. \"2\" or \"2.0\".",
            ),
            (
                "operationInputSuffix",
                string.clone(),
                "Suffix of inline operation input structure names. Defaults to \"Input\".",
            ),
            (
                "operationOutputSuffix",
                string.clone(),
                "Suffix of inline operation output structure names. Defaults to \"Output\".",
            ),
        ],
    );
    let mut docs_map = indexmap::IndexMap::new();
    docs_map.insert(
        "Smithy IDL reference".to_string(),
        NodeValue::Str(DOCS_URL.to_string()),
    );
    if let Some(shape) = ns.builder.get_shape_mut(&controls) {
        shape.traits.push(TraitApplication::synthetic(
            ShapeId::new(PRELUDE, "externalDocumentation"),
            NodeValue::Obj(docs_map),
            builtin_location(),
        ));
    }

    // metadata surface
    let suppression = ns.structure(
        "Suppression",
        &[
            ("id", string.clone(), "Validation event id to suppress."),
            ("namespace", string.clone(), "Namespace the suppression applies to, or \"*\"."),
            ("reason", string.clone(), "Why the event is suppressed."),
        ],
    );
    let suppressions = ns.list_of("Suppressions", &suppression);

    let namespace_list = ns.list_of("NamespaceList", &string);
    let validator_name = ns.simple("ValidatorName", ShapeType::String);
    let validator = ns.structure(
        "Validator",
        &[
            ("name", validator_name, "Name of the validator to apply."),
            ("id", string.clone(), "Identifier used in validation events."),
            ("message", string.clone(), "Message template for emitted events."),
            ("severity", string.clone(), "Severity of emitted events."),
            ("namespaces", namespace_list, "Namespaces the validator runs on."),
            ("selector", string.clone(), "Shapes the validator applies to."),
            ("configuration", document.clone(), "Validator-specific configuration."),
        ],
    );
    let validators = ns.list_of("Validators", &validator);

    let severity_override = ns.structure(
        "SeverityOverride",
        &[
            ("id", string.clone(), "Validation event id to override."),
            ("namespace", string.clone(), "Namespace the override applies to, or \"*\"."),
            ("severity", string.clone(), "New severity, WARNING or DANGER."),
        ],
    );
    let severity_overrides = ns.list_of("SeverityOverrides", &severity_override);

    ns.structure(
        "BuiltinMetadata",
        &[
            ("suppressions", suppressions, "Suppresses validation events model-wide."),
            ("validators", validators, "Applies custom validators to the model."),
            ("severityOverrides", severity_overrides, "Changes the severity of validation events."),
        ],
    );

    // validator configuration shapes for the well-known validators
    ns.structure(
        "EmitEachSelectorConfig",
        &[
            ("selector", string.clone(), "Selector that emits one event per match."),
            ("bindToTrait", string.clone(), "Only emit for shapes with this trait."),
            ("messageTemplate", string.clone(), ""),
        ],
    );
    ns.structure(
        "EmitNoneSelectorConfig",
        &[("selector", string.clone(), "Selector that must match nothing.")],
    );
    ns.structure(
        "UnreferencedShapeConfig",
        &[("rootShapeSelector", string.clone(), "Roots the reachability walk.")],
    );
    let word_list = ns.list_of("WordList", &string);
    let term_list = ns.list_of("TermList", &string);
    let reserved = ns.structure(
        "ReservedWordsDefinition",
        &[
            ("words", word_list, "Exact words to reserve."),
            ("terms", term_list, "Wildcard terms to reserve."),
            ("reason", string.clone(), ""),
        ],
    );
    let reserved_list = ns.list_of("ReservedWordsList", &reserved);
    ns.structure(
        "ReservedWordsConfig",
        &[("reserved", reserved_list, "Reserved word definitions.")],
    );

    // per-shape-type member layouts
    let operation_ref = ns.id_ref("OperationRef", "operation");
    let resource_ref = ns.id_ref("ResourceRef", "resource");
    let structure_ref = ns.id_ref("StructureRef", "structure");
    let error_ref = ns.id_ref("ErrorRef", "structure[trait|error]");
    let any_ref = ns.id_ref("AnyRef", "*");

    let operation_refs = ns.list_of("OperationRefs", &operation_ref);
    let resource_refs = ns.list_of("ResourceRefs", &resource_ref);
    let error_refs = ns.list_of("ErrorRefs", &error_ref);
    let rename_map = ns.map_of("RenameMap", &any_ref, &string);

    ns.structure(
        "ServiceShape",
        &[
            ("version", string.clone(), "Version of the service."),
            ("operations", operation_refs.clone(), "Operations bound to the service."),
            ("resources", resource_refs.clone(), "Resources bound to the service."),
            ("errors", error_refs.clone(), "Errors common to every operation."),
            ("rename", rename_map, "Renames shapes when generating code."),
        ],
    );
    ns.structure(
        "ResourceShape",
        &[
            ("identifiers", document.clone(), "Identifier name to shape id map."),
            ("properties", document.clone(), "Property name to shape id map."),
            ("create", operation_ref.clone(), "Create lifecycle operation."),
            ("put", operation_ref.clone(), "Put lifecycle operation."),
            ("read", operation_ref.clone(), "Read lifecycle operation."),
            ("update", operation_ref.clone(), "Update lifecycle operation."),
            ("delete", operation_ref.clone(), "Delete lifecycle operation."),
            ("list", operation_ref.clone(), "List lifecycle operation."),
            ("operations", operation_refs.clone(), "Instance operations."),
            ("collectionOperations", operation_refs, "Collection operations."),
            ("resources", resource_refs, "Child resources."),
        ],
    );
    ns.structure(
        "OperationShape",
        &[
            ("input", structure_ref.clone(), "Input structure of the operation."),
            ("output", structure_ref, "Output structure of the operation."),
            ("errors", error_refs, "Errors the operation can return."),
        ],
    );
    ns.structure(
        "ListShape",
        &[("member", any_ref.clone(), "Target of the list member.")],
    );
    ns.structure(
        "MapShape",
        &[
            ("key", any_ref.clone(), "Target of the map key."),
            ("value", any_ref, "Target of the map value."),
        ],
    );

    // build-file schemas
    let string_list = ns.list_of("StringList", &string);
    let repository = ns.structure(
        "MavenRepository",
        &[
            ("url", string.clone(), "Repository URL."),
            ("httpCredentials", string.clone(), "Credentials, user:pass form."),
        ],
    );
    let repositories = ns.list_of("MavenRepositories", &repository);
    let maven = ns.structure(
        "MavenConfig",
        &[
            ("dependencies", string_list.clone(), "Maven coordinates to resolve."),
            ("repositories", repositories, "Repositories to resolve from."),
        ],
    );
    ns.structure(
        "SmithyBuildConfig",
        &[
            ("version", string.clone(), "Version of smithy-build. Always \"1.0\"."),
            ("sources", string_list.clone(), "Directories and files holding model sources."),
            ("imports", string_list.clone(), "Additional models to import."),
            ("outputDirectory", string.clone(), "Where build artifacts are written."),
            ("projections", document.clone(), "Projections to apply."),
            ("plugins", document.clone(), "Plugins to apply to all projections."),
            ("maven", maven, "Maven dependency configuration."),
        ],
    );
    let dependency = ns.structure(
        "ProjectDependency",
        &[
            ("name", string.clone(), "Name of the dependency."),
            ("path", string.clone(), "Path to a jar or model directory."),
        ],
    );
    let dependencies = ns.list_of("ProjectDependencies", &dependency);
    ns.structure(
        "SmithyProjectConfig",
        &[
            ("sources", string_list.clone(), "Directories and files holding model sources."),
            ("imports", string_list.clone(), "Additional models to import."),
            ("outputDirectory", string.clone(), "Where build artifacts are written."),
            ("dependencies", dependencies, "Local dependencies of the project."),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_model_is_populated() {
        let model = builtins();
        assert!(model.get_shape(&ShapeId::new(PRELUDE, "String")).is_some());
        assert!(model
            .get_shape(&ShapeId::new(PRELUDE, "documentation"))
            .is_some());
        assert!(model
            .get_shape(&ShapeId::new(TEST_NAMESPACE, "smokeTests"))
            .is_some());
    }

    #[test]
    fn control_keys_have_docs() {
        let controls = control_statements();
        assert!(controls.members.contains_key("version"));
        let member_id = controls.get_member("version").unwrap();
        let member = builtins().get_shape(member_id).unwrap();
        assert!(member.documentation().unwrap().contains("IDL version"));
    }

    #[test]
    fn shape_bodies_cover_aggregate_keywords() {
        for keyword in ["service", "resource", "operation", "list", "map"] {
            assert!(shape_body(keyword).is_some(), "missing body for {keyword}");
        }
        assert!(shape_body("structure").is_none());
    }

    #[test]
    fn trait_definitions_carry_the_marker() {
        let model = builtins();
        let doc_trait = model
            .get_shape(&ShapeId::new(PRELUDE, "documentation"))
            .unwrap();
        assert!(doc_trait.has_trait_named("smithy.api#trait"));
    }
}
