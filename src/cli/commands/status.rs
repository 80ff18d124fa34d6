//! `fieldtrack status` command - grouped progress summary

use clap::ValueEnum;
use console::style;
use miette::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{effective_format, open_store, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::ComponentStore;
use crate::entities::component::{format_quantity, Component};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Grouping
    #[arg(long, value_enum, default_value = "drawing")]
    pub by: GroupBy,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupBy {
    Drawing,
    Area,
    System,
    TestPackage,
    Type,
}

impl GroupBy {
    fn key(&self, c: &Component) -> String {
        let value = match self {
            GroupBy::Drawing => Some(c.drawing.clone()),
            GroupBy::Area => c.area.clone(),
            GroupBy::System => c.system.clone(),
            GroupBy::TestPackage => c.test_package.clone(),
            GroupBy::Type => Some(c.component_type.to_string()),
        };
        value.unwrap_or_else(|| "(unassigned)".to_string())
    }
}

/// Progress of one group of live components
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStatus {
    pub group: String,
    pub components: usize,
    pub complete: usize,
    pub mean_percent: f64,
    pub linear_feet: f64,
}

/// Summarize non-retired components per group, groups in sorted order
pub fn summarize(components: &[Component], by: GroupBy) -> Vec<GroupStatus> {
    let mut groups: BTreeMap<String, Vec<&Component>> = BTreeMap::new();
    for c in components.iter().filter(|c| !c.is_retired) {
        groups.entry(by.key(c)).or_default().push(c);
    }

    groups
        .into_iter()
        .map(|(group, members)| {
            let sum: u32 = members.iter().map(|c| c.percent_complete as u32).sum();
            GroupStatus {
                components: members.len(),
                complete: members.iter().filter(|c| c.percent_complete == 100).count(),
                mean_percent: sum as f64 / members.len() as f64,
                linear_feet: members.iter().filter_map(|c| c.total_quantity()).sum(),
                group,
            }
        })
        .collect()
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, store, config) = open_store(global)?;
    let components = store.all()?;
    let rows = summarize(&components, args.by);

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => return print_serialized(&rows, f),
        OutputFormat::Id => {
            for r in &rows {
                println!("{}", r.group);
            }
            return Ok(());
        }
        OutputFormat::Tsv => {
            println!("GROUP\tCOMPONENTS\tCOMPLETE\tMEAN_PERCENT\tLINEAR_FEET");
            for r in &rows {
                println!(
                    "{}\t{}\t{}\t{:.1}\t{}",
                    r.group,
                    r.components,
                    r.complete,
                    r.mean_percent,
                    format_quantity(r.linear_feet)
                );
            }
            return Ok(());
        }
        OutputFormat::Auto => {}
    }

    if rows.is_empty() {
        println!("No components found.");
        return Ok(());
    }

    let mut table = Builder::default();
    table.push_record(["Group", "Components", "Complete", "Mean %", "Pipe LF"]);
    for r in &rows {
        table.push_record([
            r.group.clone(),
            r.components.to_string(),
            r.complete.to_string(),
            format!("{:.1}", r.mean_percent),
            if r.linear_feet > 0.0 {
                format_quantity(r.linear_feet)
            } else {
                "-".to_string()
            },
        ]);
    }
    println!("{}", table.build().with(Style::rounded()));

    let live: usize = rows.iter().map(|r| r.components).sum();
    let complete: usize = rows.iter().map(|r| r.complete).sum();
    println!(
        "{} {} of {} component(s) complete",
        style("Σ").bold(),
        style(complete).green(),
        live
    );
    Ok(())
}
