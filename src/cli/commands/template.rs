//! `fieldtrack template` command - inspect progress templates

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{effective_format, open_project, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::entities::component::{format_quantity, ComponentType};
use crate::entities::template::{ProgressTemplate, TemplateSet};

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List templates in effect
    List,

    /// Show one template by id or component type
    Show(ShowArgs),

    /// Validate templates and report types without one
    Check,

    /// Print the built-in template file (a starting point for overrides)
    Builtin,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Template id, or a component type for its default template
    pub template: String,
}

pub fn run(cmd: TemplateCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TemplateCommands::List => run_list(global),
        TemplateCommands::Show(args) => run_show(args, global),
        TemplateCommands::Check => run_check(global),
        TemplateCommands::Builtin => {
            print!("{}", TemplateSet::builtin_source());
            Ok(())
        }
    }
}

fn load(global: &GlobalOpts) -> Result<(TemplateSet, OutputFormat)> {
    let project = open_project(global)?;
    let config = Config::load_for(Some(project.root()));
    Ok((project.load_templates()?, effective_format(global, &config)))
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let (templates, format) = load(global)?;

    match format {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => {
            let all: Vec<&ProgressTemplate> = templates.iter().collect();
            print_serialized(&all, f)
        }
        OutputFormat::Id => {
            for t in templates.iter() {
                println!("{}", t.id);
            }
            Ok(())
        }
        OutputFormat::Auto | OutputFormat::Tsv => {
            let mut table = Builder::default();
            table.push_record(["ID", "Type", "Rev", "Milestones", "Default"]);
            for t in templates.iter() {
                let is_default = templates
                    .default_for(t.component_type)
                    .is_some_and(|d| d.id == t.id);
                table.push_record([
                    t.id.clone(),
                    t.component_type.to_string(),
                    t.revision.to_string(),
                    t.milestones.len().to_string(),
                    if is_default { "✓".to_string() } else { String::new() },
                ]);
            }
            if format == OutputFormat::Tsv {
                println!("{}", table.build().with(Style::empty()));
            } else {
                println!("{}", table.build().with(Style::sharp()));
            }
            Ok(())
        }
    }
}

/// Find a template by id, falling back to the default for a type name
fn select<'a>(templates: &'a TemplateSet, key: &str) -> Option<&'a ProgressTemplate> {
    templates.get(key).or_else(|| {
        key.parse::<ComponentType>()
            .ok()
            .and_then(|t| templates.default_for(t))
    })
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (templates, format) = load(global)?;
    let template = select(&templates, &args.template)
        .ok_or_else(|| miette::miette!("No template matching '{}'", args.template))?;

    if let f @ (OutputFormat::Json | OutputFormat::Yaml) = format {
        return print_serialized(template, f);
    }

    println!(
        "{} {} ({}, revision {})",
        style("Template").bold(),
        style(&template.id).cyan(),
        template.component_type,
        template.revision
    );

    let mut table = Builder::default();
    table.push_record(["Milestone", "Kind", "Weight"]);
    for m in &template.milestones {
        table.push_record([m.name.clone(), m.kind.to_string(), format_quantity(m.weight)]);
    }
    table.push_record([
        "Total".to_string(),
        String::new(),
        format_quantity(template.total_weight()),
    ]);
    println!("{}", table.build().with(Style::rounded()));

    if !template.aliases.is_empty() {
        println!("{}", style("Legacy names:").bold());
        for (legacy, canonical) in &template.aliases {
            println!("  {} → {}", legacy, canonical);
        }
    }
    Ok(())
}

fn run_check(global: &GlobalOpts) -> Result<()> {
    // load_templates validates; any problem surfaces as a diagnostic here
    let (templates, _format) = load(global)?;

    let uncovered = templates.uncovered_types();
    for t in &uncovered {
        println!(
            "{} No template for {}; imports of this type will fail",
            style("!").yellow(),
            t
        );
    }

    println!(
        "{} {} template(s) valid",
        style("✓").green(),
        templates.len()
    );
    Ok(())
}
