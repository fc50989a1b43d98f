//! Initial project loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use smithy_ls_model::assemble::default_assembler_factory;
use smithy_ls_model::{AssemblerFactory, SourceLocation};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::build_file::{BuildFile, BuildFileType};
use crate::config::{location_of, ProjectConfig};
use crate::file::SmithyFile;
use crate::project::{ManagedDocuments, Project, ProjectKind};
use crate::resolve::resolve_dependencies;

pub struct ProjectLoader {
    assembler_factory: AssemblerFactory,
}

impl Default for ProjectLoader {
    fn default() -> Self {
        Self {
            assembler_factory: default_assembler_factory(),
        }
    }
}

impl ProjectLoader {
    pub fn new(assembler_factory: AssemblerFactory) -> Self {
        Self { assembler_factory }
    }

    /// Load the project rooted at `root`: read its build files, merge
    /// and resolve the configuration, parse every model file reachable
    /// from `sources`/`imports`/resolved dependencies, and assemble.
    pub fn load_root(&self, root: &Path, managed: &dyn ManagedDocuments) -> Project {
        let mut build_files = Vec::new();
        for file_type in BuildFileType::merge_order() {
            let path = root.join(file_type.relative_path());
            let Ok(text) = std::fs::read_to_string(&path) else {
                continue;
            };
            build_files.push(BuildFile::parse(
                path.to_string_lossy().to_string(),
                text,
                file_type,
            ));
        }

        let kind = if build_files.is_empty() {
            ProjectKind::Empty
        } else {
            ProjectKind::Normal
        };

        let mut events = Vec::new();
        let mut config = ProjectConfig::merge(&build_files, &mut events);
        let origin = build_files
            .first()
            .map(|file| location_of(file, file.node.span()))
            .unwrap_or_else(|| {
                SourceLocation::top_of(root.join("smithy-build.json").to_string_lossy())
            });
        resolve_dependencies(root, &mut config, &origin, &mut events);

        for entry in config.sources.iter().chain(config.imports.iter()) {
            if !root.join(entry).exists() {
                let location = find_string_node(&build_files, entry).unwrap_or_else(|| origin.clone());
                events.push(smithy_ls_model::ValidationEvent::error(
                    "Config",
                    format!("'{entry}' does not exist"),
                    location,
                ));
            }
        }

        let model_paths = discover_model_paths(root, &config);
        debug!(
            root = %root.display(),
            files = model_paths.len(),
            "loading project"
        );

        let build_file_map: HashMap<String, BuildFile> = build_files
            .into_iter()
            .map(|file| (file.path.clone(), file))
            .collect();
        let project = Project::new(
            root.to_path_buf(),
            kind,
            config,
            events,
            build_file_map,
            &self.assembler_factory,
        );

        for path in model_paths {
            let path_text = path.to_string_lossy().to_string();
            let text = managed
                .text_of(&path_text)
                .or_else(|| std::fs::read_to_string(&path).ok());
            let Some(text) = text else {
                warn!(path = %path.display(), "cannot read model file");
                continue;
            };
            project.insert_file(Arc::new(SmithyFile::new(path_text, text)));
        }

        project.assemble_now();
        project
    }

    /// Build an ad-hoc project around a single in-editor file.
    pub fn load_detached(&self, path: &str, text: &str) -> Project {
        let config = ProjectConfig {
            sources: vec![path.to_string()],
            ..Default::default()
        };
        let root = Path::new(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let project = Project::new(
            root,
            ProjectKind::Detached,
            config,
            Vec::new(),
            HashMap::new(),
            &self.assembler_factory,
        );
        project.insert_file(Arc::new(SmithyFile::new(path.to_string(), text.to_string())));
        project.assemble_now();
        project
    }
}

/// Location of the string node holding `value`, searched across every
/// build file, so config errors pin to the text that caused them.
fn find_string_node(build_files: &[BuildFile], value: &str) -> Option<SourceLocation> {
    use smithy_ls_syntax::node::Node;
    fn search(node: &Node, value: &str) -> Option<smithy_ls_syntax::span::Span> {
        match node {
            Node::Str(s) if s.value == value => Some(s.span),
            Node::Obj(obj) => obj.kvps.iter().find_map(|kvp| search(&kvp.value, value)),
            Node::Arr(arr) => arr.elements.iter().find_map(|element| search(element, value)),
            _ => None,
        }
    }
    build_files.iter().find_map(|file| {
        search(&file.node, value).map(|span| location_of(file, span))
    })
}

/// Expand sources, imports, and resolved dependency paths into the set
/// of model files to load. Directories are walked recursively for
/// `.smithy` files; jar dependencies are skipped (their models surface
/// through the assembler's prelude only).
fn discover_model_paths(root: &Path, config: &ProjectConfig) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut push = |path: PathBuf| {
        if !out.contains(&path) {
            out.push(path);
        }
    };

    let configured = config
        .sources
        .iter()
        .chain(config.imports.iter())
        .map(|entry| root.join(entry));
    let resolved = config.resolved_model_paths.iter().cloned();

    for entry in configured.chain(resolved) {
        if entry.extension().is_some_and(|ext| ext == "jar") {
            debug!(path = %entry.display(), "skipping jar dependency");
            continue;
        }
        if entry.is_dir() {
            for file in WalkDir::new(&entry)
                .follow_links(false)
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = file.path();
                if path.extension().is_some_and(|ext| ext == "smithy") {
                    push(path.to_path_buf());
                }
            }
        } else if entry.is_file() {
            push(entry);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::NoManagedDocuments;
    use pretty_assertions::assert_eq;
    use smithy_ls_model::ShapeId;

    #[test]
    fn loads_a_configured_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("model")).unwrap();
        std::fs::write(
            dir.path().join("smithy-build.json"),
            r#"{"version": "1.0", "sources": ["model"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("model/main.smithy"),
            "$version: \"2\"\nnamespace com.example\nstructure Widget {}\n",
        )
        .unwrap();

        let loader = ProjectLoader::default();
        let project = loader.load_root(dir.path(), &NoManagedDocuments);
        assert_eq!(project.kind(), ProjectKind::Normal);
        let snapshot = project.snapshot().unwrap();
        let id: ShapeId = "com.example#Widget".parse().unwrap();
        assert!(snapshot.model_result.model.get_shape(&id).is_some());
    }

    #[test]
    fn missing_config_loads_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ProjectLoader::default();
        let project = loader.load_root(dir.path(), &NoManagedDocuments);
        assert_eq!(project.kind(), ProjectKind::Empty);
        assert_eq!(project.smithy_file_paths().len(), 0);
    }

    #[test]
    fn detached_projects_are_isolated() {
        let loader = ProjectLoader::default();
        let first = loader.load_detached(
            "/tmp/one.smithy",
            "$version: \"2\"\nnamespace com.one\nstructure A {}\n",
        );
        let second = loader.load_detached(
            "/tmp/two.smithy",
            "$version: \"2\"\nnamespace com.two\nstructure B {}\n",
        );

        let a: ShapeId = "com.one#A".parse().unwrap();
        let b: ShapeId = "com.two#B".parse().unwrap();
        let first_model = &first.snapshot().unwrap().model_result.model;
        let second_model = &second.snapshot().unwrap().model_result.model;
        assert!(first_model.get_shape(&a).is_some());
        assert!(first_model.get_shape(&b).is_none());
        assert!(second_model.get_shape(&b).is_some());

        // reassembling one never touches the other
        use std::collections::BTreeSet;
        struct Edited;
        impl ManagedDocuments for Edited {
            fn text_of(&self, path: &str) -> Option<String> {
                (path == "/tmp/one.smithy")
                    .then(|| "$version: \"2\"\nnamespace com.one\nstructure A2 {}\n".to_string())
            }
        }
        let changed: BTreeSet<String> = ["/tmp/one.smithy".to_string()].into();
        first.update_files(&BTreeSet::new(), &BTreeSet::new(), &changed, true, &Edited);
        assert!(second.snapshot().unwrap().model_result.model.get_shape(&b).is_some());
        assert!(first
            .snapshot()
            .unwrap()
            .model_result
            .model
            .get_shape(&"com.one#A2".parse().unwrap())
            .is_some());
    }

    #[test]
    fn missing_source_directory_reports_event() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("smithy-build.json"),
            r#"{"sources": ["nope"], "maven": {"dependencies": ["not-a-coordinate"]}}"#,
        )
        .unwrap();
        let loader = ProjectLoader::default();
        let project = loader.load_root(dir.path(), &NoManagedDocuments);
        assert!(project
            .config_events()
            .iter()
            .any(|event| event.message.contains("not-a-coordinate")));
    }
}
