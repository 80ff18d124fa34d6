//! `fieldtrack import` command - CSV take-off import

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::cli::helpers::{effective_format, open_store, print_serialized};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::Severity;
use crate::import::reader::{TEMPLATE_EXAMPLES, TEMPLATE_HEADERS};
use crate::import::{read_rows, ImportReport, Importer};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Print the CSV header row and example rows instead of importing
    #[arg(long, conflicts_with_all = ["dry_run", "strict"])]
    pub template: bool,

    /// Report what would change without writing any files
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with an error if any row failed
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        return print_template();
    }
    let Some(file_path) = args.file else {
        return Err(miette::miette!("No CSV file given"));
    };

    let (project, mut store, config) = open_store(global)?;
    let templates = project.load_templates()?;

    let file = File::open(&file_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot open {}", file_path.display()))?;
    let rows = read_rows(BufReader::new(file), config.token_column())?;

    let report = Importer::new(&mut store, &templates, config.author())
        .dry_run(args.dry_run)
        .max_instances(config.max_instances())
        .run(rows)?;

    match effective_format(global, &config) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_serialized(&report, f)?,
        _ => print_report(&report, global.quiet),
    }

    if args.strict && report.errors() > 0 {
        return Err(miette::miette!(
            "{} row(s) failed to import",
            report.errors()
        ));
    }
    Ok(())
}

fn print_report(report: &ImportReport, quiet: bool) {
    if !quiet {
        for issue in &report.issues {
            let marker = match issue.severity {
                Severity::Warning => style("!").yellow(),
                Severity::Error => style("✗").red(),
            };
            eprintln!("{} Row {}: {}", marker, issue.row, issue.message);
        }
    }

    let heading = if report.dry_run {
        style("Dry run").yellow().bold()
    } else {
        style("Imported").green().bold()
    };
    println!(
        "{} {} row(s): {} created, {} merged, {} duplicate(s) skipped",
        heading,
        report.rows,
        style(report.created).cyan(),
        style(report.merged).cyan(),
        report.duplicates
    );
    if report.retired_skipped > 0 {
        println!("  {} retired component(s) left untouched", report.retired_skipped);
    }
    if report.warnings() > 0 || report.errors() > 0 {
        println!(
            "  {} warning(s), {} error(s)",
            style(report.warnings()).yellow(),
            style(report.errors()).red()
        );
    }
}

fn print_template() -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(TEMPLATE_HEADERS).into_diagnostic()?;
    for example in TEMPLATE_EXAMPLES {
        wtr.write_record(*example).into_diagnostic()?;
    }
    wtr.flush().into_diagnostic()?;
    Ok(())
}
