//! `fieldtrack retire` command - soft delete

use console::style;
use miette::Result;

use crate::cli::helpers::{find_component, open_store};
use crate::cli::GlobalOpts;
use crate::core::store::ComponentStore;

#[derive(clap::Args, Debug)]
pub struct RetireArgs {
    /// Component reference (@N, full id, or unique id prefix)
    pub reference: String,

    /// Fail unless the component is still at this version
    #[arg(long)]
    pub expect_version: Option<u64>,
}

pub fn run(args: RetireArgs, global: &GlobalOpts) -> Result<()> {
    let (project, mut store, _config) = open_store(global)?;
    let mut component = find_component(&project, &store, &args.reference)?;

    if component.is_retired {
        println!("{} {} is already retired", style("!").yellow(), component.id);
        return Ok(());
    }

    let expected = args.expect_version.unwrap_or(component.version);
    component.is_retired = true;
    let saved = store.update(component, expected)?;
    tracing::info!(id = %saved.id, "component retired");

    if !global.quiet {
        println!(
            "{} Retired {} ({}, version {})",
            style("✓").green(),
            style(&saved.id).cyan(),
            saved.identity,
            saved.version
        );
    }
    Ok(())
}
