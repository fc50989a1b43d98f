//! A loaded project: files, configuration, model, and rebuild index.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use smithy_ls_model::{AssemblerFactory, ModelAssembler, ModelResult, ShapeId, ValidationEvent};
use tracing::{debug, warn};

use crate::build_file::BuildFile;
use crate::config::ProjectConfig;
use crate::file::SmithyFile;
use crate::rebuild_index::RebuildIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// Loaded from build configuration at a workspace root.
    Normal,
    /// Ad-hoc single-file project for a file outside any workspace.
    Detached,
    /// A root with no recognizable build configuration.
    Empty,
}

/// The atomic pair handlers read: reassembly swaps both together under
/// the project's writer lock.
#[derive(Clone)]
pub struct ProjectSnapshot {
    pub model_result: Arc<ModelResult>,
    pub rebuild_index: Arc<RebuildIndex>,
}

/// Source of in-editor document text, provided by the project manager.
pub trait ManagedDocuments: Send + Sync {
    fn text_of(&self, path: &str) -> Option<String>;
}

/// No documents are managed. Used by tests and initial loads from disk.
pub struct NoManagedDocuments;

impl ManagedDocuments for NoManagedDocuments {
    fn text_of(&self, _path: &str) -> Option<String> {
        None
    }
}

pub struct Project {
    root: PathBuf,
    kind: ProjectKind,
    config: ProjectConfig,
    config_events: Vec<ValidationEvent>,
    build_files: HashMap<String, BuildFile>,
    smithy_files: RwLock<HashMap<String, Arc<SmithyFile>>>,
    assembler: Mutex<Box<dyn ModelAssembler>>,
    state: RwLock<Option<ProjectSnapshot>>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("root", &self.root)
            .field("kind", &self.kind)
            .field("files", &self.smithy_files.read().len())
            .finish()
    }
}

impl Project {
    pub(crate) fn new(
        root: PathBuf,
        kind: ProjectKind,
        config: ProjectConfig,
        config_events: Vec<ValidationEvent>,
        build_files: HashMap<String, BuildFile>,
        assembler_factory: &AssemblerFactory,
    ) -> Self {
        Self {
            root,
            kind,
            config,
            config_events,
            build_files,
            smithy_files: RwLock::new(HashMap::new()),
            assembler: Mutex::new(assembler_factory()),
            state: RwLock::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_events(&self) -> &[ValidationEvent] {
        &self.config_events
    }

    pub fn build_files(&self) -> &HashMap<String, BuildFile> {
        &self.build_files
    }

    pub fn build_file(&self, path: &str) -> Option<&BuildFile> {
        self.build_files.get(path)
    }

    pub fn smithy_file(&self, path: &str) -> Option<Arc<SmithyFile>> {
        self.smithy_files.read().get(path).cloned()
    }

    pub fn smithy_file_paths(&self) -> Vec<String> {
        self.smithy_files.read().keys().cloned().collect()
    }

    pub fn smithy_files(&self) -> Vec<Arc<SmithyFile>> {
        self.smithy_files.read().values().cloned().collect()
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.smithy_files.read().contains_key(path) || self.build_files.contains_key(path)
    }

    /// The current model/rebuild-index pair, cloned together under one
    /// reader lock so a request works on a consistent snapshot.
    pub fn snapshot(&self) -> Option<ProjectSnapshot> {
        self.state.read().clone()
    }

    /// Register a file and stage its text, without assembling yet.
    pub(crate) fn insert_file(&self, file: Arc<SmithyFile>) {
        self.assembler
            .lock()
            .add_document(file.path(), &file.text_snapshot());
        self.smithy_files
            .write()
            .insert(file.path().to_string(), file);
    }

    /// First assembly after loading. Also used by tests.
    pub(crate) fn assemble_now(&self) {
        let mut assembler = self.assembler.lock();
        let result = assembler.assemble();
        let index = RebuildIndex::from_model(&result.model);
        *self.state.write() = Some(ProjectSnapshot {
            model_result: Arc::new(result),
            rebuild_index: Arc::new(index),
        });
    }

    /// Apply an incremental batch of file updates and reassemble.
    ///
    /// Dependents of changed files (through array-trait fragments) are
    /// re-fed to the assembler, traits applied to removed shapes from
    /// other files are re-staged so they survive, and the new model and
    /// rebuild index replace the old pair atomically. With no validated
    /// model present the update is silently skipped.
    pub fn update_files(
        &self,
        added: &BTreeSet<String>,
        removed: &BTreeSet<String>,
        changed: &BTreeSet<String>,
        validate: bool,
        managed: &dyn ManagedDocuments,
    ) {
        let Some(snapshot) = self.snapshot() else {
            return;
        };
        if added.is_empty() && removed.is_empty() && changed.is_empty() {
            return;
        }
        debug!(
            added = added.len(),
            removed = removed.len(),
            changed = changed.len(),
            root = %self.root.display(),
            "updating project files"
        );

        let index = &snapshot.rebuild_index;
        let mut visited: BTreeSet<String> = removed.union(changed).cloned().collect();
        for file in removed.union(changed) {
            // files whose shapes carry array-trait fragments authored
            // here, and files contributing fragments to shapes defined
            // here, both get re-fed
            visited.extend(index.get_dependent_files(file));
            for shape in index.shapes_in_file(file) {
                visited.extend(index.get_dependencies_files(&shape));
            }
        }

        // traits authored by files in this batch are not re-staged
        // below; the batch files' current text is authoritative and
        // re-staging would resurrect applications the edit deleted
        let mut batch_authored: HashSet<(ShapeId, String)> = HashSet::new();
        for file in removed.union(changed) {
            if let Some(applied) = index.applied_traits_of(file) {
                for shape in applied.keys() {
                    batch_authored.insert((shape.clone(), file.clone()));
                }
            }
        }

        let mut assembler = self.assembler.lock();

        for file in removed {
            assembler.remove_document(file);
        }

        // shapes in rebuilt files lose their assembled state; traits
        // applied to them from files outside the batch are re-staged so
        // they survive the reload
        for file in removed.union(changed) {
            for shape in index.shapes_in_file(file) {
                for application in index.other_file_traits(&shape) {
                    let key = (shape.clone(), application.location.filename.clone());
                    if batch_authored.contains(&key) {
                        continue;
                    }
                    assembler.add_trait_application(shape.clone(), application.clone());
                }
            }
        }

        for file in &visited {
            if removed.contains(file) {
                continue;
            }
            let Some(smithy_file) = self.refresh_file(file, changed.contains(file), managed)
            else {
                warn!(file, "skipping unreadable file during update");
                continue;
            };
            assembler.add_document(file, &smithy_file.text_snapshot());
        }

        for file in added {
            let text = managed
                .text_of(file)
                .or_else(|| std::fs::read_to_string(file).ok());
            let Some(text) = text else {
                warn!(file, "cannot read added file");
                continue;
            };
            let smithy_file = Arc::new(SmithyFile::new(file.clone(), text));
            assembler.add_document(file, &smithy_file.text_snapshot());
            self.smithy_files
                .write()
                .insert(file.clone(), smithy_file);
        }

        {
            let mut files = self.smithy_files.write();
            for file in removed {
                files.remove(file);
            }
        }

        let mut result = assembler.assemble();
        if !validate {
            result.events.clear();
        }
        let new_index = RebuildIndex::from_model(&result.model);
        *self.state.write() = Some(ProjectSnapshot {
            model_result: Arc::new(result),
            rebuild_index: Arc::new(new_index),
        });
    }

    /// Current text of a visited file: managed documents win, disk is
    /// read for changed unmanaged files, and the in-memory snapshot is
    /// the fallback.
    fn refresh_file(
        &self,
        path: &str,
        changed_on_disk: bool,
        managed: &dyn ManagedDocuments,
    ) -> Option<Arc<SmithyFile>> {
        let existing = self.smithy_file(path);
        if let Some(text) = managed.text_of(path) {
            return match existing {
                Some(file) => {
                    if file.text_snapshot() != text {
                        file.replace_text(&text);
                    }
                    Some(file)
                }
                None => {
                    let file = Arc::new(SmithyFile::new(path.to_string(), text));
                    self.smithy_files
                        .write()
                        .insert(path.to_string(), file.clone());
                    Some(file)
                }
            };
        }
        if changed_on_disk || existing.is_none() {
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    return match existing {
                        Some(file) => {
                            file.replace_text(&text);
                            Some(file)
                        }
                        None => {
                            let file = Arc::new(SmithyFile::new(path.to_string(), text));
                            self.smithy_files
                                .write()
                                .insert(path.to_string(), file.clone());
                            Some(file)
                        }
                    };
                }
                Err(error) => {
                    if existing.is_none() {
                        warn!(path, %error, "failed to read file");
                        return None;
                    }
                }
            }
        }
        existing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_ls_model::assemble::default_assembler_factory;
    use smithy_ls_model::ShapeId;

    fn project_with(files: &[(&str, &str)]) -> Project {
        let factory = default_assembler_factory();
        let project = Project::new(
            PathBuf::from("/proj"),
            ProjectKind::Normal,
            ProjectConfig::default(),
            Vec::new(),
            HashMap::new(),
            &factory,
        );
        for (path, text) in files {
            project.insert_file(Arc::new(SmithyFile::new(path.to_string(), text.to_string())));
        }
        project.assemble_now();
        project
    }

    const DEFINES: &str = "$version: \"2\"\nnamespace com.a\nstructure S {}\n";
    const APPLIES: &str =
        "$version: \"2\"\nnamespace com.b\nuse com.a#S\napply S @documentation(\"x\")\n";

    #[test]
    fn empty_update_is_idempotent() {
        let project = project_with(&[("a.smithy", DEFINES)]);
        let before = project.snapshot().unwrap();
        project.update_files(
            &BTreeSet::new(),
            &BTreeSet::new(),
            &BTreeSet::new(),
            true,
            &NoManagedDocuments,
        );
        let after = project.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before.model_result, &after.model_result));
        assert!(Arc::ptr_eq(&before.rebuild_index, &after.rebuild_index));
    }

    #[test]
    fn changing_a_file_preserves_cross_file_traits() {
        let project = project_with(&[("a.smithy", DEFINES), ("b.smithy", APPLIES)]);
        let id: ShapeId = "com.a#S".parse().unwrap();
        let doc = |project: &Project| {
            project
                .snapshot()
                .unwrap()
                .model_result
                .model
                .get_shape(&id)
                .and_then(|shape| shape.documentation().map(str::to_string))
        };
        assert_eq!(doc(&project).as_deref(), Some("x"));

        // whitespace-only change to the defining file
        struct Edited;
        impl ManagedDocuments for Edited {
            fn text_of(&self, path: &str) -> Option<String> {
                (path == "a.smithy")
                    .then(|| "$version: \"2\"\nnamespace com.a\n\nstructure S {}\n".to_string())
            }
        }
        let changed: BTreeSet<String> = ["a.smithy".to_string()].into();
        project.update_files(&BTreeSet::new(), &BTreeSet::new(), &changed, true, &Edited);
        assert_eq!(doc(&project).as_deref(), Some("x"));
    }

    #[test]
    fn batch_edits_drop_traits_their_authors_deleted() {
        let project = project_with(&[("a.smithy", DEFINES), ("b.smithy", APPLIES)]);
        let id: ShapeId = "com.a#S".parse().unwrap();

        // one batch touches both files; b's new text no longer applies
        // the trait, so re-staging must not resurrect it
        struct Edited;
        impl ManagedDocuments for Edited {
            fn text_of(&self, path: &str) -> Option<String> {
                match path {
                    "a.smithy" => {
                        Some("$version: \"2\"\nnamespace com.a\n\nstructure S {}\n".to_string())
                    }
                    "b.smithy" => {
                        Some("$version: \"2\"\nnamespace com.b\nuse com.a#S\n".to_string())
                    }
                    _ => None,
                }
            }
        }
        let changed: BTreeSet<String> =
            ["a.smithy".to_string(), "b.smithy".to_string()].into();
        project.update_files(&BTreeSet::new(), &BTreeSet::new(), &changed, true, &Edited);

        let snapshot = project.snapshot().unwrap();
        let shape = snapshot.model_result.model.get_shape(&id).unwrap();
        assert!(shape.documentation().is_none());
    }

    #[test]
    fn removing_the_applying_file_drops_the_trait() {
        let project = project_with(&[("a.smithy", DEFINES), ("b.smithy", APPLIES)]);
        let removed: BTreeSet<String> = ["b.smithy".to_string()].into();
        project.update_files(
            &BTreeSet::new(),
            &removed,
            &BTreeSet::new(),
            true,
            &NoManagedDocuments,
        );
        let snapshot = project.snapshot().unwrap();
        let id: ShapeId = "com.a#S".parse().unwrap();
        let shape = snapshot.model_result.model.get_shape(&id).unwrap();
        assert!(shape.documentation().is_none());
        assert!(project.smithy_file("b.smithy").is_none());
    }

    #[test]
    fn update_without_model_is_skipped() {
        let factory = default_assembler_factory();
        let project = Project::new(
            PathBuf::from("/proj"),
            ProjectKind::Normal,
            ProjectConfig::default(),
            Vec::new(),
            HashMap::new(),
            &factory,
        );
        let added: BTreeSet<String> = ["a.smithy".to_string()].into();
        project.update_files(
            &added,
            &BTreeSet::new(),
            &BTreeSet::new(),
            true,
            &NoManagedDocuments,
        );
        assert!(project.snapshot().is_none());
    }
}
