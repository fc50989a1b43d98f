//! Recognized build-configuration files.

use std::path::Path;

use smithy_ls_syntax::document::Document;
use smithy_ls_syntax::node::Node;
use smithy_ls_syntax::parse::parse_json_with_comments;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildFileType {
    /// `smithy-build.json`, the primary configuration.
    SmithyBuild,
    /// `build/smithy-dependencies.json`, legacy.
    SmithyBuildExt0,
    /// `.smithy.json`, legacy.
    SmithyBuildExt1,
    /// `.smithy-project.json`, local dependencies for editor tooling.
    SmithyProject,
}

impl BuildFileType {
    /// Path of this build file relative to a project root.
    pub fn relative_path(&self) -> &'static str {
        match self {
            BuildFileType::SmithyBuild => "smithy-build.json",
            BuildFileType::SmithyBuildExt0 => "build/smithy-dependencies.json",
            BuildFileType::SmithyBuildExt1 => ".smithy.json",
            BuildFileType::SmithyProject => ".smithy-project.json",
        }
    }

    /// All types, in config merge order: the primary file is the base,
    /// extensions fill gaps, the project file appends.
    pub fn merge_order() -> [BuildFileType; 4] {
        [
            BuildFileType::SmithyBuild,
            BuildFileType::SmithyBuildExt0,
            BuildFileType::SmithyBuildExt1,
            BuildFileType::SmithyProject,
        ]
    }

    /// Recognize a path by its file name (and parent for the legacy
    /// `build/` file).
    pub fn of(path: &Path) -> Option<BuildFileType> {
        let name = path.file_name()?.to_str()?;
        match name {
            "smithy-build.json" => Some(BuildFileType::SmithyBuild),
            ".smithy.json" => Some(BuildFileType::SmithyBuildExt1),
            ".smithy-project.json" => Some(BuildFileType::SmithyProject),
            "smithy-dependencies.json" => {
                let parent = path.parent()?.file_name()?.to_str()?;
                (parent == "build").then_some(BuildFileType::SmithyBuildExt0)
            }
            _ => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            BuildFileType::SmithyBuildExt0 | BuildFileType::SmithyBuildExt1
        )
    }

    /// Name of the builtins schema shape this file validates against.
    pub fn schema_name(&self) -> &'static str {
        match self {
            BuildFileType::SmithyProject => "SmithyProjectConfig",
            _ => "SmithyBuildConfig",
        }
    }
}

/// A parsed build-configuration file.
#[derive(Debug, Clone)]
pub struct BuildFile {
    pub path: String,
    pub document: Document,
    pub node: Node,
    pub file_type: BuildFileType,
}

impl BuildFile {
    pub fn parse(path: impl Into<String>, text: impl Into<String>, file_type: BuildFileType) -> Self {
        let document = Document::of(text.into());
        let node = parse_json_with_comments(&document);
        Self {
            path: path.into(),
            document,
            node,
            file_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_filenames() {
        assert_eq!(
            BuildFileType::of(Path::new("/p/smithy-build.json")),
            Some(BuildFileType::SmithyBuild)
        );
        assert_eq!(
            BuildFileType::of(Path::new("/p/.smithy-project.json")),
            Some(BuildFileType::SmithyProject)
        );
        assert_eq!(
            BuildFileType::of(Path::new("/p/build/smithy-dependencies.json")),
            Some(BuildFileType::SmithyBuildExt0)
        );
        assert_eq!(
            BuildFileType::of(Path::new("/p/other/smithy-dependencies.json")),
            None
        );
        assert_eq!(BuildFileType::of(Path::new("/p/model.smithy")), None);
    }

    #[test]
    fn legacy_types_are_flagged() {
        assert!(BuildFileType::SmithyBuildExt0.is_legacy());
        assert!(BuildFileType::SmithyBuildExt1.is_legacy());
        assert!(!BuildFileType::SmithyBuild.is_legacy());
    }
}
