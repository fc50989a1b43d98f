//! Dependency resolution for the merged project configuration.
//!
//! Maven dependencies are resolved against a local cache directory only;
//! nothing is fetched over the network. Misses become config events so
//! the editor can surface them in the build file.

use std::path::{Path, PathBuf};

use smithy_ls_model::{SourceLocation, ValidationEvent};
use tracing::debug;

use crate::config::ProjectConfig;

/// Environment variable naming the dependency cache directory.
pub const MAVEN_CACHE_ENV: &str = "SMITHY_MAVEN_CACHE";
/// Environment variable holding pipe-separated repository URLs.
pub const MAVEN_REPOS_ENV: &str = "SMITHY_MAVEN_REPOS";
/// Used when neither the environment nor the config names a repository.
pub const MAVEN_CENTRAL: &str = "https://repo.maven.apache.org/maven2";

/// A `group:artifact:version` coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    pub fn parse(value: &str) -> Option<Coordinate> {
        let mut parts = value.split(':');
        let group = parts.next()?.to_string();
        let artifact = parts.next()?.to_string();
        let version = parts.next()?.to_string();
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            return None;
        }
        Some(Coordinate {
            group,
            artifact,
            version,
        })
    }

    /// Repository-relative path of the artifact jar.
    pub fn artifact_path(&self) -> String {
        format!(
            "{}/{}/{}/{}-{}.jar",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.artifact,
            self.version
        )
    }
}

/// Fill `resolved_model_paths` and `resolved_dependency_urls` on the
/// config, reporting failures as events pinned to `origin`.
pub fn resolve_dependencies(
    root: &Path,
    config: &mut ProjectConfig,
    origin: &SourceLocation,
    events: &mut Vec<ValidationEvent>,
) {
    for dependency in &config.project_dependencies {
        let path = root.join(&dependency.path);
        if path.exists() {
            config.resolved_model_paths.push(path);
        } else {
            events.push(ValidationEvent::error(
                "DependencyResolver",
                format!("dependency path '{}' does not exist", dependency.path),
                origin.clone(),
            ));
        }
    }

    if config.maven.dependencies.is_empty() {
        return;
    }

    let cache = maven_cache_dir();
    let repositories = repository_urls(config);
    for coordinate_text in &config.maven.dependencies {
        let Some(coordinate) = Coordinate::parse(coordinate_text) else {
            events.push(ValidationEvent::error(
                "DependencyResolver",
                format!("invalid Maven coordinate '{coordinate_text}'"),
                origin.clone(),
            ));
            continue;
        };
        for repository in &repositories {
            config
                .resolved_dependency_urls
                .push(format!("{repository}/{}", coordinate.artifact_path()));
        }
        let cached = cache.join(coordinate.artifact_path());
        if cached.exists() {
            debug!(artifact = %coordinate_text, path = %cached.display(), "resolved from cache");
            config.resolved_model_paths.push(cached);
        } else {
            events.push(ValidationEvent::error(
                "DependencyResolver",
                format!("Maven dependency '{coordinate_text}' is not in the local cache"),
                origin.clone(),
            ));
        }
    }
}

fn maven_cache_dir() -> PathBuf {
    if let Ok(cache) = std::env::var(MAVEN_CACHE_ENV) {
        if !cache.is_empty() {
            return PathBuf::from(cache);
        }
    }
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".smithy/maven-cache"))
        .unwrap_or_else(|_| PathBuf::from(".smithy-maven-cache"))
}

/// Repositories in priority order: environment, then config, then
/// Maven Central as the default when both are silent.
fn repository_urls(config: &ProjectConfig) -> Vec<String> {
    let mut urls = Vec::new();
    if let Ok(environment) = std::env::var(MAVEN_REPOS_ENV) {
        for url in environment.split('|') {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }
    for repository in &config.maven.repositories {
        if !urls.iter().any(|existing| existing == &repository.url) {
            urls.push(repository.url.clone());
        }
    }
    if urls.is_empty() {
        urls.push(MAVEN_CENTRAL.to_string());
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn coordinate_paths() {
        let coordinate = Coordinate::parse("software.amazon.smithy:smithy-aws-traits:1.50.0").unwrap();
        assert_eq!(
            coordinate.artifact_path(),
            "software/amazon/smithy/smithy-aws-traits/1.50.0/smithy-aws-traits-1.50.0.jar"
        );
        assert!(Coordinate::parse("missing:version").is_none());
    }

    #[test]
    fn default_repository_is_central() {
        let config = ProjectConfig::default();
        // only meaningful when the env override is absent
        if std::env::var(MAVEN_REPOS_ENV).is_err() {
            assert_eq!(repository_urls(&config), vec![MAVEN_CENTRAL.to_string()]);
        }
    }

    #[test]
    fn missing_local_dependency_reports_event() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ProjectConfig {
            project_dependencies: vec![crate::config::ProjectDependency {
                name: "lib".to_string(),
                path: "does-not-exist".to_string(),
            }],
            ..Default::default()
        };
        let mut events = Vec::new();
        resolve_dependencies(
            dir.path(),
            &mut config,
            &SourceLocation::top_of(".smithy-project.json"),
            &mut events,
        );
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("does-not-exist"));
    }
}
