//! Shared helper functions for CLI commands

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::project::Project;
use crate::core::shortid::expand_reference;
use crate::core::store::{ComponentStore, FileStore};
use crate::entities::component::{Component, ComponentType};

/// Open the project named by `--project`, or discover it
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    Project::open(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))
}

/// Project, its file store and its configuration
pub fn open_store(global: &GlobalOpts) -> Result<(Project, FileStore, Config)> {
    let project = open_project(global)?;
    let store = FileStore::for_project(&project);
    let config = Config::load_for(Some(project.root()));
    Ok((project, store, config))
}

/// Resolve `@N`, a full id or a unique id prefix to a component
pub fn find_component(project: &Project, store: &FileStore, reference: &str) -> Result<Component> {
    let expanded = expand_reference(reference, project);
    Ok(store.find(&expanded)?)
}

/// Output format after applying the configured default
pub fn effective_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|f| OutputFormat::from_str(f, true).ok())
        .unwrap_or(OutputFormat::Auto)
}

/// clap value parser for component types (`threaded pipe`, `FIELD-WELD`, ...)
pub fn parse_component_type(s: &str) -> Result<ComponentType, String> {
    s.parse()
}

/// Print a value as YAML or JSON
pub fn print_serialized<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Percentage colored by completion
pub fn style_percent(percent: u8) -> String {
    let text = format!("{}%", percent);
    match percent {
        100 => style(text).green().to_string(),
        0 => style(text).dim().to_string(),
        _ => style(text).yellow().to_string(),
    }
}

/// Optional text or "-"
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
