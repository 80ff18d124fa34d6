//! Project discovery and structure

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::error::TrackError;
use crate::core::identity::ComponentId;
use crate::entities::template::TemplateSet;

/// Name of the project metadata directory
pub const PROJECT_DIR: &str = ".fieldtrack";

/// File extension of component files
pub const COMPONENT_EXT: &str = ".ft.yaml";

/// Represents a fieldtrack project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .fieldtrack/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Use an explicit project root, or discover one
    pub fn open(explicit: Option<&Path>) -> Result<Self, ProjectError> {
        match explicit {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::init_force(&root)
    }

    /// Initialize even if .fieldtrack/ exists; existing files are kept
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let project = Self { root };

        fs::create_dir_all(project.config_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        fs::create_dir_all(project.components_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        write_if_missing(&project.config_dir().join("config.yaml"), Self::default_config())?;
        write_if_missing(&project.templates_path(), Self::default_templates())?;

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# fieldtrack project configuration

# Default author for imported components (can be overridden by global config)
# author: ""

# Default output format (auto, yaml, json, tsv, id)
# default_format: auto

# Log filter when RUST_LOG is not set (e.g. "fieldtrack=debug")
# log: warn

# import:
#   # CSV column holding the provenance token (source line number)
#   token_column: line
"#
    }

    fn default_templates() -> &'static str {
        r#"# Project progress templates
#
# Templates listed here are layered over the built-in set: a template with a
# built-in id replaces it, a new id is added. The last template registered for
# a component type becomes that type's default. Weights must sum to 100.
#
# Run `fieldtrack template list` to see the templates in effect and
# `fieldtrack recompute` after editing weights.
#
# templates:
#   - id: threaded_pipe_v2
#     component_type: Threaded_Pipe
#     revision: 2
#     milestones:
#       - { name: Fabricate_LF, weight: 20, kind: quantity }
#       - { name: Install_LF, weight: 60, kind: quantity }
#       - { name: Test, weight: 20 }

templates: []
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .fieldtrack configuration directory
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Directory holding component files
    pub fn components_dir(&self) -> PathBuf {
        self.root.join("components")
    }

    /// Path of a component's file
    pub fn component_path(&self, id: &ComponentId) -> PathBuf {
        self.components_dir().join(format!("{}{}", id, COMPONENT_EXT))
    }

    /// Project template overrides
    pub fn templates_path(&self) -> PathBuf {
        self.config_dir().join("templates.yaml")
    }

    /// Built-in templates layered with the project's overrides, validated
    pub fn load_templates(&self) -> Result<TemplateSet, TrackError> {
        let mut templates = TemplateSet::builtin()?;

        let path = self.templates_path();
        if path.exists() {
            let source = fs::read_to_string(&path)?;
            if !source.trim().is_empty() {
                let overrides = TemplateSet::from_yaml(&source, &path.display().to_string())?;
                tracing::debug!(count = overrides.len(), "loaded project templates");
                templates.overlay(overrides);
            }
        }

        templates.validate()?;
        Ok(templates)
    }
}

fn write_if_missing(path: &Path, contents: &str) -> Result<(), ProjectError> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, contents).map_err(|e| ProjectError::IoError(e.to_string()))
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a fieldtrack project (searched from {searched_from:?}). Run 'fieldtrack init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("fieldtrack project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.config_dir().is_dir());
        assert!(project.config_dir().join("config.yaml").exists());
        assert!(project.templates_path().exists());
        assert!(project.components_dir().is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_init_force_keeps_existing_templates() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        fs::write(project.templates_path(), "templates: []\n# edited\n").unwrap();

        Project::init_force(tmp.path()).unwrap();
        let content = fs::read_to_string(project.templates_path()).unwrap();
        assert!(content.contains("# edited"));
    }

    #[test]
    fn test_project_discover_finds_project_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_project_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_default_templates_load() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let templates = project.load_templates().unwrap();
        assert!(templates.get("threaded_pipe").is_some());
    }

    #[test]
    fn test_invalid_project_template_rejected() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        fs::write(
            project.templates_path(),
            r#"
templates:
  - id: valve
    component_type: Valve
    milestones:
      - { name: Receive, weight: 10 }
      - { name: Install, weight: 10 }
"#,
        )
        .unwrap();

        let err = project.load_templates().unwrap_err();
        assert!(matches!(err, TrackError::InvalidTemplate { .. }));
    }
}
