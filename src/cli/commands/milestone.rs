//! `fieldtrack milestone` command - record milestone progress

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{find_component, open_store, style_percent};
use crate::cli::GlobalOpts;
use crate::core::error::TrackError;
use crate::core::store::ComponentStore;
use crate::entities::component::{format_quantity, Component, MilestoneValue};
use crate::entities::template::{MilestoneKind, TemplateSet};
use crate::progress::{recompute, WeightTable};

#[derive(Subcommand, Debug)]
pub enum MilestoneCommands {
    /// Set a milestone value (true/false, or completed quantity for LF milestones)
    Set(SetArgs),
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Component reference (@N, full id, or unique id prefix)
    pub reference: String,

    /// Milestone name (legacy names are accepted)
    pub name: String,

    /// New value
    pub value: String,

    /// Fail unless the component is still at this version
    #[arg(long)]
    pub expect_version: Option<u64>,
}

pub fn run(cmd: MilestoneCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MilestoneCommands::Set(args) => run_set(args, global),
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let (project, mut store, _config) = open_store(global)?;
    let templates = project.load_templates()?;
    let mut component = find_component(&project, &store, &args.reference)?;

    if component.is_retired {
        return Err(miette::miette!(
            "{} is retired; milestones cannot be changed",
            component.id
        ));
    }

    let expected = args.expect_version.unwrap_or(component.version);
    let previous = component.percent_complete;
    let name = set_milestone(&mut component, &templates, &args.name, &args.value)?;
    let value = component.current_milestones.get(&name).copied();

    let saved = store.update(component, expected)?;

    if !global.quiet {
        println!(
            "{} {} {} = {} ({} → {}, version {})",
            style("✓").green(),
            style(&saved.id).cyan(),
            name,
            value.map(|v| v.to_string()).unwrap_or_default(),
            style_percent(previous),
            style_percent(saved.percent_complete),
            saved.version
        );
    }
    Ok(())
}

/// Apply a milestone update under its canonical name and recompute
///
/// Returns the canonical name. Legacy keys already stored are left in place;
/// the canonical key takes precedence from now on.
pub fn set_milestone(
    component: &mut Component,
    templates: &TemplateSet,
    name: &str,
    raw: &str,
) -> Result<String, TrackError> {
    let table = WeightTable::for_component(templates, component)?;
    let canonical = table
        .canonical_name(name)
        .ok_or_else(|| TrackError::UnknownMilestone {
            template: table.template().id.clone(),
            name: name.to_string(),
        })?
        .to_string();

    let kind = table
        .template()
        .milestone(&canonical)
        .map(|def| def.kind)
        .unwrap_or_default();

    let invalid = |reason: String| TrackError::InvalidMilestoneValue {
        name: canonical.clone(),
        value: raw.to_string(),
        reason,
    };

    let value = kind.parse_value(raw).ok_or_else(|| {
        invalid(match kind {
            MilestoneKind::Discrete => "expected true or false".to_string(),
            MilestoneKind::Quantity => "expected a number".to_string(),
        })
    })?;

    if let (MilestoneKind::Quantity, MilestoneValue::Quantity(qty)) = (kind, value) {
        let total = component
            .total_quantity()
            .ok_or_else(|| invalid("component has no quantity total".to_string()))?;
        if qty < 0.0 || qty > total {
            return Err(invalid(format!(
                "must be between 0 and {}",
                format_quantity(total)
            )));
        }
    }

    component.current_milestones.insert(canonical.clone(), value);
    recompute(component, templates)?;
    Ok(canonical)
}
