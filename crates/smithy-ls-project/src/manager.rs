//! Maps URIs to the projects that own them.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::build_file::BuildFileType;
use crate::file::SmithyFile;
use crate::loader::ProjectLoader;
use crate::project::{ManagedDocuments, Project, ProjectKind};

/// Owns every project: the workspace root project plus one detached
/// project per orphan file opened in the editor. Also keeps the
/// managed-document table the loaders read from.
pub struct ProjectManager {
    loader: ProjectLoader,
    root_project: RwLock<Option<Arc<Project>>>,
    detached: DashMap<String, Arc<Project>>,
    managed: DashMap<String, Arc<SmithyFile>>,
}

impl Default for ProjectManager {
    fn default() -> Self {
        Self {
            loader: ProjectLoader::default(),
            root_project: RwLock::new(None),
            detached: DashMap::new(),
            managed: DashMap::new(),
        }
    }
}

impl ManagedDocuments for ProjectManager {
    fn text_of(&self, path: &str) -> Option<String> {
        self.managed.get(path).map(|file| file.text_snapshot())
    }
}

impl ProjectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or reload) the workspace root project.
    pub fn load_root(&self, root: &Path) {
        info!(root = %root.display(), "loading workspace project");
        let project = Arc::new(self.loader.load_root(root, self));
        *self.root_project.write() = Some(project);
    }

    pub fn root_project(&self) -> Option<Arc<Project>> {
        self.root_project.read().clone()
    }

    /// The project owning `path`: the root project when it tracks the
    /// file, else the file's detached project.
    pub fn project_for(&self, path: &str) -> Option<Arc<Project>> {
        if let Some(project) = self.root_project() {
            if project.contains_file(path) {
                return Some(project);
            }
        }
        self.detached.get(path).map(|entry| entry.clone())
    }

    /// Every live project, root first.
    pub fn projects(&self) -> Vec<Arc<Project>> {
        let mut projects = Vec::new();
        if let Some(root) = self.root_project() {
            projects.push(root);
        }
        projects.extend(self.detached.iter().map(|entry| entry.clone()));
        projects
    }

    /// Handle `didOpen`: attach the document to its owning project, or
    /// build a detached project when no configured project tracks it.
    pub fn open_document(&self, path: &str, text: &str) -> Arc<Project> {
        if let Some(project) = self.root_project() {
            if let Some(file) = project.smithy_file(path) {
                if file.text_snapshot() != text {
                    file.replace_text(text);
                    let changed: BTreeSet<String> = [path.to_string()].into();
                    project.update_files(
                        &BTreeSet::new(),
                        &BTreeSet::new(),
                        &changed,
                        true,
                        self,
                    );
                }
                self.managed.insert(path.to_string(), file);
                return project;
            }
        }
        debug!(path, "opening detached project");
        let project = Arc::new(self.loader.load_detached(path, text));
        if let Some(file) = project.smithy_file(path) {
            self.managed.insert(path.to_string(), file);
        }
        self.detached.insert(path.to_string(), project.clone());
        project
    }

    /// Handle `didChange`: patch the managed document and reparse. The
    /// model update is driven separately by the dispatcher.
    pub fn change_document(&self, path: &str, range: Option<lsp_types::Range>, text: &str) -> bool {
        let Some(file) = self.managed.get(path).map(|entry| entry.clone()) else {
            return false;
        };
        file.apply_edit(range, text);
        true
    }

    /// Handle `didClose`: release the managed document, and drop the
    /// file's detached project when it has one.
    pub fn close_document(&self, path: &str) {
        self.managed.remove(path);
        if self.detached.remove(path).is_some() {
            debug!(path, "dropped detached project");
        }
    }

    pub fn is_managed(&self, path: &str) -> bool {
        self.managed.contains_key(path)
    }

    pub fn managed_file(&self, path: &str) -> Option<Arc<SmithyFile>> {
        self.managed.get(path).map(|entry| entry.clone())
    }

    /// Paths of every document currently open in the editor.
    pub fn managed_paths(&self) -> Vec<String> {
        self.managed.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Route a watched-files batch: build-file changes reload the whole
    /// root project, model-file changes update it incrementally.
    pub fn on_watched_files(
        &self,
        added: BTreeSet<String>,
        changed: BTreeSet<String>,
        removed: BTreeSet<String>,
    ) {
        let build_file_touched = added
            .iter()
            .chain(changed.iter())
            .chain(removed.iter())
            .any(|path| BuildFileType::of(Path::new(path)).is_some());
        let root = self.root_project();
        if build_file_touched {
            if let Some(project) = &root {
                let root_path = project.root().to_path_buf();
                self.load_root(&root_path);
                return;
            }
        }
        if let Some(project) = root {
            project.update_files(&added, &removed, &changed, true, self);
            // a file picked up by the root project supersedes its
            // detached twin
            for path in added.iter().chain(changed.iter()) {
                if project.contains_file(path) {
                    self.detached.remove(path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn orphan_files_get_detached_projects() {
        let manager = ProjectManager::new();
        let project = manager.open_document(
            "/tmp/orphan.smithy",
            "$version: \"2\"\nnamespace com.orphan\nstructure X {}\n",
        );
        assert_eq!(project.kind(), ProjectKind::Detached);
        assert!(manager.is_managed("/tmp/orphan.smithy"));

        manager.close_document("/tmp/orphan.smithy");
        assert!(!manager.is_managed("/tmp/orphan.smithy"));
        assert!(manager.project_for("/tmp/orphan.smithy").is_none());
    }

    #[test]
    fn root_project_files_stay_attached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("model")).unwrap();
        std::fs::write(
            dir.path().join("smithy-build.json"),
            r#"{"sources": ["model"]}"#,
        )
        .unwrap();
        let model_path = dir.path().join("model/main.smithy");
        std::fs::write(&model_path, "$version: \"2\"\nnamespace com.a\n").unwrap();

        let manager = ProjectManager::new();
        manager.load_root(dir.path());
        let path = model_path.to_string_lossy().to_string();
        let project = manager.open_document(&path, "$version: \"2\"\nnamespace com.a\n");
        assert_eq!(project.kind(), ProjectKind::Normal);
        assert!(manager.project_for(&path).is_some());
    }

    #[test]
    fn managed_text_wins_over_disk() {
        let manager = ProjectManager::new();
        manager.open_document("/tmp/mem.smithy", "namespace com.mem\n");
        assert_eq!(
            manager.text_of("/tmp/mem.smithy").as_deref(),
            Some("namespace com.mem\n")
        );
    }
}
