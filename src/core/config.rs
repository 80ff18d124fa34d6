//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::project::Project;

/// Default CSV column carrying the provenance token
pub const DEFAULT_TOKEN_COLUMN: &str = "line";

/// Default cap on the components one instance-type row may expand to
pub const DEFAULT_MAX_INSTANCES: u32 = 1000;

/// fieldtrack configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new components
    pub author: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Log filter used when RUST_LOG and -v/-q are absent
    pub log: Option<String>,

    /// Import settings
    pub import: ImportConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// CSV column holding the provenance token
    pub token_column: Option<String>,

    /// Largest whole quantity accepted on an instance-type row
    pub max_instances: Option<u32>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// The project layer comes from `project_root` when given, else from discovery.
    pub fn load_for(project_root: Option<&Path>) -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/fieldtrack/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Project config (.fieldtrack/config.yaml)
        if let Ok(project) = Project::open(project_root) {
            let project_config_path = project.config_dir().join("config.yaml");
            if let Some(project_config) = Self::read_file(&project_config_path) {
                config.merge(project_config);
            }
        }

        // Environment variables
        if let Ok(author) = std::env::var("FIELDTRACK_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(log) = std::env::var("FIELDTRACK_LOG") {
            config.log = Some(log);
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("warning: ignoring {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "fieldtrack")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.log.is_some() {
            self.log = other.log;
        }
        if other.import.token_column.is_some() {
            self.import.token_column = other.import.token_column;
        }
        if other.import.max_instances.is_some() {
            self.import.max_instances = other.import.max_instances;
        }
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// CSV column used for provenance tokens
    pub fn token_column(&self) -> &str {
        self.import
            .token_column
            .as_deref()
            .unwrap_or(DEFAULT_TOKEN_COLUMN)
    }

    /// Instance expansion limit for import rows
    pub fn max_instances(&self) -> u32 {
        self.import.max_instances.unwrap_or(DEFAULT_MAX_INSTANCES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base: Config = serde_yml::from_str("author: global\nlog: info\n").unwrap();
        let project: Config = serde_yml::from_str(
            "author: site\nimport:\n  token_column: src_line\n  max_instances: 50\n",
        )
        .unwrap();
        base.merge(project);

        assert_eq!(base.author.as_deref(), Some("site"));
        assert_eq!(base.log.as_deref(), Some("info"));
        assert_eq!(base.token_column(), "src_line");
        assert_eq!(base.max_instances(), 50);
    }

    #[test]
    fn test_token_column_default() {
        let config = Config::default();
        assert_eq!(config.token_column(), DEFAULT_TOKEN_COLUMN);
        assert_eq!(config.max_instances(), DEFAULT_MAX_INSTANCES);
    }

    #[test]
    fn test_explicit_author_wins() {
        let config = Config {
            author: Some("Dana".to_string()),
            ..Default::default()
        };
        assert_eq!(config.author(), "Dana");
    }
}
