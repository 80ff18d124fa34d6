//! `fieldtrack recompute` command - re-derive cached percentages

use console::style;
use miette::Result;

use crate::cli::helpers::open_store;
use crate::cli::GlobalOpts;
use crate::core::error::TrackError;
use crate::core::store::ComponentStore;
use crate::entities::component::Component;
use crate::entities::template::TemplateSet;
use crate::progress::recompute;

#[derive(clap::Args, Debug)]
pub struct RecomputeArgs {
    /// Only report stale percentages; exit non-zero if any exist
    #[arg(long)]
    pub check: bool,
}

/// A component whose stored percentage disagrees with the current templates
#[derive(Debug, Clone)]
pub struct Drift {
    pub component: Component,
    pub stored: u8,
    pub computed: u8,
}

/// Compare every component's stored percentage with a fresh computation
///
/// Components whose template cannot be resolved are returned separately.
pub fn find_drift(
    components: Vec<Component>,
    templates: &TemplateSet,
) -> (Vec<Drift>, Vec<(Component, TrackError)>) {
    let mut drift = Vec::new();
    let mut failed = Vec::new();

    for mut component in components {
        let stored = component.percent_complete;
        match recompute(&mut component, templates) {
            Ok(computed) if computed != stored => drift.push(Drift {
                component,
                stored,
                computed,
            }),
            Ok(_) => {}
            Err(e) => failed.push((component, e)),
        }
    }
    (drift, failed)
}

pub fn run(args: RecomputeArgs, global: &GlobalOpts) -> Result<()> {
    let (project, mut store, _config) = open_store(global)?;
    let templates = project.load_templates()?;
    let components = store.all()?;
    let total = components.len();

    let (drift, failed) = find_drift(components, &templates);

    for (component, e) in &failed {
        eprintln!("{} {}: {}", style("✗").red(), component.id, e);
    }

    for d in &drift {
        if !global.quiet {
            println!(
                "{} {} ({}) {}% → {}%",
                if args.check {
                    style("!").yellow()
                } else {
                    style("✓").green()
                },
                style(&d.component.id).cyan(),
                d.component.identity,
                d.stored,
                d.computed
            );
        }
    }

    if args.check {
        println!(
            "{} of {} component(s) have a stale percentage",
            drift.len(),
            total
        );
        if !drift.is_empty() || !failed.is_empty() {
            return Err(miette::miette!(
                "{} stale, {} without a template",
                drift.len(),
                failed.len()
            ));
        }
        return Ok(());
    }

    let mut updated = 0;
    for d in drift {
        let expected = d.component.version;
        store.update(d.component, expected)?;
        updated += 1;
    }
    tracing::info!(updated, total, "recompute finished");

    println!(
        "{} Recomputed {} component(s), {} updated",
        style("✓").green(),
        total,
        style(updated).cyan()
    );

    if !failed.is_empty() {
        return Err(miette::miette!(
            "{} component(s) have no progress template",
            failed.len()
        ));
    }
    Ok(())
}
