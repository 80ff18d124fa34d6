//! `fieldtrack list` command - components with display labels and progress

use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{
    effective_format, open_store, or_dash, parse_component_type, print_serialized, style_percent,
    truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::shortid::ShortIdIndex;
use crate::core::store::ComponentStore;
use crate::entities::component::{Component, ComponentType};
use crate::progress::display_labels;
use crate::progress::resolver::normalize_drawing;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by drawing number
    #[arg(long, short = 'd')]
    pub drawing: Option<String>,

    /// Filter by component type
    #[arg(long = "type", short = 't', value_parser = parse_component_type)]
    pub component_type: Option<ComponentType>,

    /// Filter by area
    #[arg(long)]
    pub area: Option<String>,

    /// Filter by system
    #[arg(long)]
    pub system: Option<String>,

    /// Filter by test package
    #[arg(long)]
    pub test_package: Option<String>,

    /// Include retired components
    #[arg(long)]
    pub all: bool,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (project, store, config) = open_store(global)?;
    let all = store.all()?;

    // Labels are computed over the whole project so "n of m" counts every live sibling
    let labels = display_labels(&all);

    let drawing = args.drawing.as_deref().map(normalize_drawing);
    let mut components: Vec<&Component> = all
        .iter()
        .filter(|c| args.all || !c.is_retired)
        .filter(|c| drawing.as_ref().map_or(true, |d| &c.drawing == d))
        .filter(|c| args.component_type.map_or(true, |t| c.component_type == t))
        .filter(|c| matches_opt(&c.area, &args.area))
        .filter(|c| matches_opt(&c.system, &args.system))
        .filter(|c| matches_opt(&c.test_package, &args.test_package))
        .collect();

    if args.count {
        println!("{}", components.len());
        return Ok(());
    }

    components.sort_by(|a, b| {
        (&a.drawing, a.component_type, a.identity.group_key(), a.identity.seq(), &a.id).cmp(&(
            &b.drawing,
            b.component_type,
            b.identity.group_key(),
            b.identity.seq(),
            &b.id,
        ))
    });

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.rebuild(components.iter().map(|c| &c.id));
    if let Err(e) = short_ids.save(&project) {
        tracing::debug!(error = %e, "could not save short ids");
    }

    let label = |c: &Component| -> String {
        labels
            .get(&c.id)
            .cloned()
            .unwrap_or_else(|| format!("{} [retired]", c.base_label()))
    };

    match effective_format(global, &config) {
        OutputFormat::Id => {
            for c in &components {
                println!("{}", c.id);
            }
        }
        f @ (OutputFormat::Json | OutputFormat::Yaml) => {
            print_serialized(&components, f)?;
        }
        OutputFormat::Tsv => {
            println!("SHORT\tID\tDRAWING\tTYPE\tLABEL\tPERCENT\tAREA\tSYSTEM\tTEST_PACKAGE");
            for c in &components {
                println!(
                    "@{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    short_ids.get_short_id(&c.id).unwrap_or_default(),
                    c.id,
                    c.drawing,
                    c.component_type,
                    label(c),
                    c.percent_complete,
                    c.area.as_deref().unwrap_or(""),
                    c.system.as_deref().unwrap_or(""),
                    c.test_package.as_deref().unwrap_or(""),
                );
            }
        }
        OutputFormat::Auto => {
            if components.is_empty() {
                println!("No components found.");
                return Ok(());
            }

            let mut table = Builder::default();
            table.push_record(["#", "Drawing", "Type", "Component", "Progress", "Area", "Test Pkg"]);
            for c in &components {
                let short = short_ids
                    .get_short_id(&c.id)
                    .map(|n| format!("@{}", n))
                    .unwrap_or_default();
                table.push_record([
                    style(short).cyan().to_string(),
                    c.drawing.clone(),
                    c.component_type.to_string(),
                    truncate_str(&label(c), 48),
                    style_percent(c.percent_complete),
                    or_dash(c.area.as_deref()),
                    or_dash(c.test_package.as_deref()),
                ]);
            }
            println!("{}", table.build().with(Style::blank()));

            if !global.quiet {
                println!();
                println!("{} component(s) found", style(components.len()).cyan());
            }
        }
    }

    Ok(())
}

fn matches_opt(value: &Option<String>, filter: &Option<String>) -> bool {
    match filter {
        None => true,
        Some(f) => value
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case(f.trim())),
    }
}
