//! The project model.
//!
//! A [`Project`] owns a set of build files and Smithy files, the latest
//! validated model, and the rebuild index that makes incremental reloads
//! safe for cross-file trait applications. The [`ProjectManager`] maps
//! URIs to the project that owns them and spins up ad-hoc detached
//! projects for orphan files.

pub mod build_file;
pub mod config;
pub mod file;
pub mod loader;
pub mod manager;
pub mod project;
pub mod rebuild_index;
pub mod resolve;

pub use build_file::{BuildFile, BuildFileType};
pub use config::{MavenRepository, ProjectConfig, ProjectDependency};
pub use file::SmithyFile;
pub use loader::ProjectLoader;
pub use manager::ProjectManager;
pub use project::{ManagedDocuments, NoManagedDocuments, Project, ProjectKind, ProjectSnapshot};
pub use rebuild_index::RebuildIndex;
