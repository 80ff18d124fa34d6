//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    assign::AssignArgs, completions::CompletionsArgs, import::ImportArgs, init::InitArgs,
    list::ListArgs, milestone::MilestoneCommands, recompute::RecomputeArgs, retire::RetireArgs,
    show::ShowArgs, status::StatusArgs, template::TemplateCommands,
};

#[derive(Parser)]
#[command(name = "fieldtrack")]
#[command(author, version, about = "Construction component progress tracking")]
#[command(
    long_about = "Tracks installation progress of piping components imported from CSV take-offs. Components are plain YAML files; progress is derived from weighted milestones."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .fieldtrack/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fieldtrack project
    Init(InitArgs),

    /// Import components from a CSV take-off
    Import(ImportArgs),

    /// List components with progress
    List(ListArgs),

    /// Show one component with its milestone breakdown
    Show(ShowArgs),

    /// Record milestone progress
    #[command(subcommand)]
    Milestone(MilestoneCommands),

    /// Assign area, system or test package
    Assign(AssignArgs),

    /// Retire (soft-delete) a component
    Retire(RetireArgs),

    /// Recompute cached percentages against the current templates
    Recompute(RecomputeArgs),

    /// Inspect progress templates
    #[command(subcommand)]
    Template(TemplateCommands),

    /// Progress summary grouped by drawing, area, system, test package or type
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables (yaml for show)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
    /// Tab-separated values (for piping)
    Tsv,
    /// Just IDs, one per line
    Id,
}
