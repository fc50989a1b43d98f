//! Project configuration: build-file extraction, structural validation,
//! and the merge across recognized files.
//!
//! Values are pulled straight from the parsed node tree rather than a
//! serde mirror, so every event can be pinned to the exact source node
//! that caused it.

use std::path::PathBuf;

use smithy_ls_model::builtins;
use smithy_ls_model::{Model, SourceLocation, ValidationEvent};
use smithy_ls_syntax::node::{Node, ObjNode};
use smithy_ls_syntax::span::Span;

use crate::build_file::{BuildFile, BuildFileType};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MavenRepository {
    pub url: String,
    pub http_credentials: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MavenConfig {
    pub dependencies: Vec<String>,
    pub repositories: Vec<MavenRepository>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDependency {
    pub name: String,
    pub path: String,
}

/// The merged configuration of a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    pub sources: Vec<String>,
    pub imports: Vec<String>,
    pub project_dependencies: Vec<ProjectDependency>,
    pub maven: MavenConfig,
    /// Model files contributed by resolved dependencies.
    pub resolved_model_paths: Vec<PathBuf>,
    /// Repository URLs the Maven dependencies would be fetched from.
    pub resolved_dependency_urls: Vec<String>,
}

impl ProjectConfig {
    /// Merge the recognized build files, in order: `smithy-build.json`
    /// is the base; legacy extension files only fill in missing `maven`
    /// fields; `.smithy-project.json` appends sources/imports and
    /// contributes local dependencies.
    pub fn merge(build_files: &[BuildFile], events: &mut Vec<ValidationEvent>) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        for file_type in BuildFileType::merge_order() {
            let Some(file) = build_files.iter().find(|f| f.file_type == file_type) else {
                continue;
            };
            validate_against_schema(file, events);
            let Some(obj) = file.node.as_obj() else {
                events.push(ValidationEvent::error(
                    "Config",
                    "expected a JSON object",
                    location_of(file, file.node.span()),
                ));
                continue;
            };
            match file_type {
                BuildFileType::SmithyBuild => {
                    extend_strings(obj, "sources", &mut config.sources);
                    extend_strings(obj, "imports", &mut config.imports);
                    if let Some(maven) = obj.get("maven").and_then(Node::as_obj) {
                        read_maven(maven, &mut config.maven);
                    }
                }
                BuildFileType::SmithyBuildExt0 | BuildFileType::SmithyBuildExt1 => {
                    // legacy files only fill gaps in the maven config
                    if let Some(maven) = obj.get("maven").and_then(Node::as_obj) {
                        let mut extension = MavenConfig::default();
                        read_maven(maven, &mut extension);
                        if config.maven.dependencies.is_empty() {
                            config.maven.dependencies = extension.dependencies;
                        }
                        if config.maven.repositories.is_empty() {
                            config.maven.repositories = extension.repositories;
                        }
                    }
                }
                BuildFileType::SmithyProject => {
                    extend_strings(obj, "sources", &mut config.sources);
                    extend_strings(obj, "imports", &mut config.imports);
                    if let Some(dependencies) = obj.get("dependencies").and_then(Node::as_arr) {
                        for element in &dependencies.elements {
                            let Some(entry) = element.as_obj() else {
                                continue;
                            };
                            let name = entry
                                .get("name")
                                .and_then(Node::as_text)
                                .unwrap_or_default()
                                .to_string();
                            let Some(path) = entry.get("path").and_then(Node::as_text) else {
                                events.push(ValidationEvent::error(
                                    "Config",
                                    "dependency entry is missing 'path'",
                                    location_of(file, element.span()),
                                ));
                                continue;
                            };
                            config.project_dependencies.push(ProjectDependency {
                                name,
                                path: path.to_string(),
                            });
                        }
                    }
                }
            }
        }
        config
    }
}

fn extend_strings(obj: &ObjNode, key: &str, into: &mut Vec<String>) {
    if let Some(values) = obj.get(key).and_then(Node::as_arr) {
        for element in &values.elements {
            if let Some(text) = element.as_text() {
                if !into.iter().any(|existing| existing == text) {
                    into.push(text.to_string());
                }
            }
        }
    }
}

fn read_maven(obj: &ObjNode, into: &mut MavenConfig) {
    if let Some(dependencies) = obj.get("dependencies").and_then(Node::as_arr) {
        for element in &dependencies.elements {
            if let Some(text) = element.as_text() {
                into.dependencies.push(text.to_string());
            }
        }
    }
    if let Some(repositories) = obj.get("repositories").and_then(Node::as_arr) {
        for element in &repositories.elements {
            if let Some(entry) = element.as_obj() {
                if let Some(url) = entry.get("url").and_then(Node::as_text) {
                    into.repositories.push(MavenRepository {
                        url: url.trim_end_matches('/').to_string(),
                        http_credentials: entry
                            .get("httpCredentials")
                            .and_then(Node::as_text)
                            .map(str::to_string),
                    });
                }
            }
        }
    }
}

/// Location of a span within a build file, 1-based.
pub fn location_of(file: &BuildFile, span: Span) -> SourceLocation {
    let position = file.document.position_of(span.start);
    SourceLocation::new(&file.path, position.line + 1, position.character + 1)
}

/// Structural validation of a build file against its builtins schema:
/// unknown keys and mismatched value kinds become warning events pinned
/// to the offending node.
pub fn validate_against_schema(file: &BuildFile, events: &mut Vec<ValidationEvent>) {
    let Some(schema) = builtins::build_file_schema(file.file_type.schema_name()) else {
        return;
    };
    let Some(obj) = file.node.as_obj() else {
        return;
    };
    validate_object(file, obj, schema, builtins::builtins(), events);
}

fn validate_object(
    file: &BuildFile,
    obj: &ObjNode,
    schema: &smithy_ls_model::Shape,
    model: &Model,
    events: &mut Vec<ValidationEvent>,
) {
    for kvp in &obj.kvps {
        let Some(member_id) = schema.get_member(&kvp.key.value) else {
            events.push(ValidationEvent::warning(
                "Config",
                format!("unknown key '{}'", kvp.key.value),
                location_of(file, kvp.key.span),
            ));
            continue;
        };
        let Some(target) = model
            .get_shape(member_id)
            .and_then(|member| member.target.as_ref())
            .and_then(|target| model.get_shape(target))
        else {
            continue;
        };
        use smithy_ls_model::ShapeType;
        match (&kvp.value, target.shape_type) {
            (Node::Arr(arr), ShapeType::List) => {
                // descend into object-typed list members
                let element_schema = target
                    .get_member("member")
                    .and_then(|id| model.get_shape(id))
                    .and_then(|member| member.target.as_ref())
                    .and_then(|target| model.get_shape(target));
                if let Some(element_schema) = element_schema {
                    if element_schema.shape_type == ShapeType::Structure {
                        for element in &arr.elements {
                            if let Some(entry) = element.as_obj() {
                                validate_object(file, entry, element_schema, model, events);
                            }
                        }
                    }
                }
            }
            (Node::Obj(nested), ShapeType::Structure) => {
                validate_object(file, nested, target, model, events);
            }
            (Node::Obj(_), ShapeType::Map | ShapeType::Document) => {}
            (Node::Str(_) | Node::Ident(_), _) if target.shape_type.is_simple() => {}
            (Node::Num(_), _) if target.shape_type.is_simple() => {}
            (Node::Err(_), _) => {}
            (value, ShapeType::List) => events.push(ValidationEvent::warning(
                "Config",
                format!("'{}' should be an array", kvp.key.value),
                location_of(file, value.span()),
            )),
            (value, ShapeType::Structure) => events.push(ValidationEvent::warning(
                "Config",
                format!("'{}' should be an object", kvp.key.value),
                location_of(file, value.span()),
            )),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(text: &str) -> BuildFile {
        BuildFile::parse("smithy-build.json", text, BuildFileType::SmithyBuild)
    }

    fn project(text: &str) -> BuildFile {
        BuildFile::parse(".smithy-project.json", text, BuildFileType::SmithyProject)
    }

    #[test]
    fn merges_sources_and_dependencies() {
        let files = vec![
            build(r#"{"version": "1.0", "sources": ["model"], "maven": {"dependencies": ["a:b:1"]}}"#),
            project(r#"{"sources": ["extra"], "dependencies": [{"name": "lib", "path": "./lib"}]}"#),
        ];
        let mut events = Vec::new();
        let config = ProjectConfig::merge(&files, &mut events);
        assert_eq!(config.sources, vec!["model", "extra"]);
        assert_eq!(config.maven.dependencies, vec!["a:b:1"]);
        assert_eq!(config.project_dependencies[0].path, "./lib");
        assert_eq!(events, vec![]);
    }

    #[test]
    fn legacy_maven_only_fills_gaps() {
        let files = vec![
            build(r#"{"maven": {"dependencies": ["keep:me:1"]}}"#),
            BuildFile::parse(
                ".smithy.json",
                r#"{"maven": {"dependencies": ["ignored:dep:2"], "repositories": [{"url": "https://repo/"}]}}"#,
                BuildFileType::SmithyBuildExt1,
            ),
        ];
        let mut events = Vec::new();
        let config = ProjectConfig::merge(&files, &mut events);
        assert_eq!(config.maven.dependencies, vec!["keep:me:1"]);
        assert_eq!(config.maven.repositories[0].url, "https://repo");
    }

    #[test]
    fn unknown_keys_are_pinned_to_their_node() {
        let file = build("{\n  \"sauces\": [\"model\"]\n}");
        let mut events = Vec::new();
        let config = ProjectConfig::merge(&[file], &mut events);
        assert!(config.sources.is_empty());
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("sauces"));
        assert_eq!(events[0].location.line, 2);
        assert_eq!(events[0].location.column, 3);
    }

    #[test]
    fn type_mismatches_warn() {
        let file = build(r#"{"sources": "model"}"#);
        let mut events = Vec::new();
        ProjectConfig::merge(&[file], &mut events);
        assert!(events.iter().any(|e| e.message.contains("array")));
    }

    #[test]
    fn comments_are_tolerated() {
        let file = build("{\n  // model sources\n  \"sources\": [\"model\"]\n}");
        let mut events = Vec::new();
        let config = ProjectConfig::merge(&[file], &mut events);
        assert_eq!(config.sources, vec!["model"]);
        assert_eq!(events, vec![]);
    }

    #[test]
    fn missing_dependency_path_is_an_error() {
        let file = project(r#"{"dependencies": [{"name": "x"}]}"#);
        let mut events = Vec::new();
        ProjectConfig::merge(&[file], &mut events);
        assert!(events.iter().any(|e| e.message.contains("path")));
    }
}
