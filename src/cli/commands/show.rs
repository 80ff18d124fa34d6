//! `fieldtrack show` command - one component with its progress breakdown

use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{
    effective_format, find_component, open_store, or_dash, print_serialized, style_percent,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::ComponentStore;
use crate::entities::component::{format_quantity, ComponentAttributes};
use crate::entities::template::MilestoneKind;
use crate::progress::{contributions, display_labels, WeightTable};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Component reference (@N, full id, or unique id prefix)
    pub reference: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store, config) = open_store(global)?;
    let component = find_component(&project, &store, &args.reference)?;

    match effective_format(global, &config) {
        OutputFormat::Id => {
            println!("{}", component.id);
            return Ok(());
        }
        f @ (OutputFormat::Json | OutputFormat::Yaml) => return print_serialized(&component, f),
        OutputFormat::Auto | OutputFormat::Tsv => {}
    }

    let templates = project.load_templates()?;
    let all = store.all()?;
    let label = display_labels(&all)
        .remove(&component.id)
        .unwrap_or_else(|| component.base_label());

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&component.id).cyan());
    println!("{}: {}", style("Component").bold(), style(&label).yellow());
    println!("{}: {}", style("Type").bold(), component.component_type);
    println!("{}: {}", style("Drawing").bold(), component.drawing);
    if component.is_retired {
        println!("{}: {}", style("Status").bold(), style("retired").red());
    }

    match &component.attributes {
        ComponentAttributes::Aggregate(agg) => {
            println!(
                "{}: {} LF (first import {} LF)",
                style("Quantity").bold(),
                format_quantity(agg.total_linear_feet),
                format_quantity(agg.original_qty)
            );
            println!(
                "{}: {}",
                style("Source Lines").bold(),
                agg.line_numbers.as_slice().join(", ")
            );
        }
        ComponentAttributes::Discrete(d) => {
            if let Some(ref desc) = d.description {
                println!("{}: {}", style("Description").bold(), desc);
            }
            for (key, value) in &d.fields {
                println!("{}: {}", style(key).bold(), value);
            }
        }
    }

    println!("{}: {}", style("Area").bold(), or_dash(component.area.as_deref()));
    println!("{}: {}", style("System").bold(), or_dash(component.system.as_deref()));
    println!(
        "{}: {}",
        style("Test Package").bold(),
        or_dash(component.test_package.as_deref())
    );
    println!("{}", style("─".repeat(60)).dim());

    let table = match WeightTable::for_component(&templates, &component) {
        Ok(table) => table,
        Err(e) => {
            println!("{} {}", style("✗").red(), e);
            println!(
                "{}: {} (stored)",
                style("Progress").bold(),
                style_percent(component.percent_complete)
            );
            return Ok(());
        }
    };

    let template = table.template();
    println!(
        "{}: {} (revision {})",
        style("Template").bold(),
        template.id,
        template.revision
    );

    let total = component.total_quantity();
    let mut breakdown = Builder::default();
    breakdown.push_record(["Milestone", "Weight", "Recorded", "Earned"]);
    for c in contributions(&component.current_milestones, &table, total) {
        let recorded = match (c.kind, c.value, total) {
            (_, None, _) => "-".to_string(),
            (MilestoneKind::Quantity, Some(v), Some(total)) => {
                format!("{} / {} LF", v, format_quantity(total))
            }
            (_, Some(v), _) => v.to_string(),
        };
        breakdown.push_record([
            c.name,
            format_quantity(c.weight),
            recorded,
            format!("{:.2}", c.earned),
        ]);
    }
    println!("{}", breakdown.build().with(Style::rounded()));

    println!(
        "{}: {}",
        style("Progress").bold(),
        style_percent(component.percent_complete)
    );

    let unrecognized = table.unrecognized(&component.current_milestones);
    if !unrecognized.is_empty() {
        println!(
            "{} Not counted (unknown to template): {}",
            style("!").yellow(),
            unrecognized.join(", ")
        );
    }

    println!(
        "{}: {}   {}: {}   {}: {}",
        style("Version").dim(),
        component.version,
        style("Author").dim(),
        component.author,
        style("Created").dim(),
        component.created.format("%Y-%m-%d %H:%M")
    );

    Ok(())
}
