//! `fieldtrack assign` command - area, system and test package metadata

use console::style;
use miette::Result;

use crate::cli::helpers::{find_component, open_store, or_dash};
use crate::cli::GlobalOpts;
use crate::core::store::ComponentStore;

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// Component reference (@N, full id, or unique id prefix)
    pub reference: String,

    /// Set the area
    #[arg(long, conflicts_with = "clear_area")]
    pub area: Option<String>,

    /// Set the system
    #[arg(long, conflicts_with = "clear_system")]
    pub system: Option<String>,

    /// Set the test package
    #[arg(long, conflicts_with = "clear_test_package")]
    pub test_package: Option<String>,

    /// Remove the area
    #[arg(long)]
    pub clear_area: bool,

    /// Remove the system
    #[arg(long)]
    pub clear_system: bool,

    /// Remove the test package
    #[arg(long)]
    pub clear_test_package: bool,

    /// Fail unless the component is still at this version
    #[arg(long)]
    pub expect_version: Option<u64>,
}

impl AssignArgs {
    fn has_changes(&self) -> bool {
        self.area.is_some()
            || self.system.is_some()
            || self.test_package.is_some()
            || self.clear_area
            || self.clear_system
            || self.clear_test_package
    }
}

pub fn run(args: AssignArgs, global: &GlobalOpts) -> Result<()> {
    if !args.has_changes() {
        return Err(miette::miette!(
            "Nothing to assign. Use --area, --system, --test-package or a --clear-* flag"
        ));
    }

    let (project, mut store, _config) = open_store(global)?;
    let mut component = find_component(&project, &store, &args.reference)?;
    let expected = args.expect_version.unwrap_or(component.version);

    apply(&mut component.area, args.area, args.clear_area);
    apply(&mut component.system, args.system, args.clear_system);
    apply(
        &mut component.test_package,
        args.test_package,
        args.clear_test_package,
    );

    let saved = store.update(component, expected)?;

    if !global.quiet {
        println!(
            "{} {} area={} system={} test_package={} (version {})",
            style("✓").green(),
            style(&saved.id).cyan(),
            or_dash(saved.area.as_deref()),
            or_dash(saved.system.as_deref()),
            or_dash(saved.test_package.as_deref()),
            saved.version
        );
    }
    Ok(())
}

fn apply(field: &mut Option<String>, value: Option<String>, clear: bool) {
    if clear {
        *field = None;
    } else if let Some(v) = value.map(|v| v.trim().to_string()) {
        *field = if v.is_empty() { None } else { Some(v) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_field() {
        let mut field = Some("A1".to_string());
        apply(&mut field, None, false);
        assert_eq!(field.as_deref(), Some("A1"));

        apply(&mut field, Some(" A2 ".to_string()), false);
        assert_eq!(field.as_deref(), Some("A2"));

        apply(&mut field, None, true);
        assert_eq!(field, None);
    }
}
