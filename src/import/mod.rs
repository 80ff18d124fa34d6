//! Take-off import pipeline
//!
//! Rows are resolved to identities and routed by type: quantity-bearing types
//! go through the aggregator and merge into an existing component, everything
//! else expands to one component per unit of quantity. Row-level failures are
//! collected in the [`ImportReport`] and the remaining rows continue.

pub mod reader;

use std::collections::HashMap;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::config::DEFAULT_MAX_INSTANCES;
use crate::core::error::{Severity, TrackError};
use crate::core::store::ComponentStore;
use crate::entities::component::{Component, ComponentAttributes, DiscreteAttributes, ScopeKey};
use crate::entities::template::TemplateSet;
use crate::progress::aggregate::{apply_import, parse_quantity, AggregateInput, AggregateOutcome};
use crate::progress::calculator::recompute;
use crate::progress::resolver::{resolve, ImportRow, ResolvedIdentity};
use crate::progress::weights::WeightTable;

pub use reader::{read_rows, RowResult};

/// File-level import failures
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    #[diagnostic(code(fieldtrack::import::csv))]
    Csv(#[from] csv::Error),

    #[error("CSV has no '{0}' column")]
    #[diagnostic(
        code(fieldtrack::import::column),
        help("run `fieldtrack import --template` for the expected header row")
    )]
    MissingColumn(String),
}

/// A problem with one import row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub severity: Severity,
    pub message: String,
}

/// Summary of an import run
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub rows: usize,
    pub created: usize,
    pub merged: usize,
    pub duplicates: usize,
    pub retired_skipped: usize,
    pub dry_run: bool,
    pub issues: Vec<RowIssue>,
}

impl ImportReport {
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    fn push_issue(&mut self, row: usize, severity: Severity, message: String) {
        tracing::warn!(row, ?severity, "{}", message);
        self.issues.push(RowIssue {
            row,
            severity,
            message,
        });
    }
}

/// Applies import rows to a component store
pub struct Importer<'a, S: ComponentStore> {
    store: &'a mut S,
    templates: &'a TemplateSet,
    author: String,
    dry_run: bool,
    max_instances: u32,
}

impl<'a, S: ComponentStore> Importer<'a, S> {
    pub fn new(store: &'a mut S, templates: &'a TemplateSet, author: impl Into<String>) -> Self {
        Self {
            store,
            templates,
            author: author.into(),
            dry_run: false,
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }

    /// Compute the report without writing anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Largest quantity an instance-type row may expand to
    pub fn max_instances(mut self, max_instances: u32) -> Self {
        self.max_instances = max_instances;
        self
    }

    /// Import every row; only storage failures abort the run
    pub fn run(
        &mut self,
        rows: impl IntoIterator<Item = RowResult>,
    ) -> Result<ImportReport, TrackError> {
        let mut index: HashMap<ScopeKey, Component> = self
            .store
            .all()?
            .into_iter()
            .map(|c| (c.scope_key(), c))
            .collect();

        let mut report = ImportReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for row in rows {
            report.rows += 1;
            let row = match row {
                Ok(row) => row,
                Err(issue) => {
                    report.push_issue(issue.row, issue.severity, issue.message);
                    continue;
                }
            };

            if let Err(e) = self.apply_row(&row, &mut index, &mut report) {
                match e {
                    TrackError::Io(_) | TrackError::Yaml { .. } => return Err(e),
                    e => report.push_issue(row.row, e.severity(), e.to_string()),
                }
            }
        }

        tracing::info!(
            rows = report.rows,
            created = report.created,
            merged = report.merged,
            duplicates = report.duplicates,
            warnings = report.warnings(),
            errors = report.errors(),
            dry_run = self.dry_run,
            "import finished"
        );
        Ok(report)
    }

    fn apply_row(
        &mut self,
        row: &ImportRow,
        index: &mut HashMap<ScopeKey, Component>,
        report: &mut ImportReport,
    ) -> Result<(), TrackError> {
        let resolved = resolve(row)?;
        if resolved.component_type.is_aggregate() {
            self.apply_aggregate(row, &resolved, index, report)
        } else {
            self.apply_discrete(row, &resolved, index, report)
        }
    }

    fn apply_aggregate(
        &mut self,
        row: &ImportRow,
        resolved: &ResolvedIdentity,
        index: &mut HashMap<ScopeKey, Component>,
        report: &mut ImportReport,
    ) -> Result<(), TrackError> {
        let qty = parse_quantity(row.qty.as_deref().unwrap_or(""))?;
        let key = resolved.scope_key(resolved.identity.clone());

        let existing = index.get(&key).cloned();
        if let Some(ref c) = existing {
            if c.is_retired {
                report.retired_skipped += 1;
                report.push_issue(
                    row.row,
                    Severity::Warning,
                    format!("{} is retired; row skipped", c.identity),
                );
                return Ok(());
            }
        }

        let input = AggregateInput {
            component_type: resolved.component_type,
            drawing: resolved.drawing.clone(),
            identity: resolved.identity.clone(),
            qty,
            token: row.provenance_token(),
        };

        let stored = match apply_import(existing, input, self.templates, &self.author)? {
            AggregateOutcome::Created(mut component) => {
                assign_metadata(&mut component, row);
                self.insert(&component)?;
                report.created += 1;
                component
            }
            AggregateOutcome::Merged {
                component,
                token_appended,
                ..
            } => {
                if !token_appended {
                    report.push_issue(
                        row.row,
                        Severity::Warning,
                        format!(
                            "line {} already recorded for {}; quantity added again",
                            row.provenance_token(),
                            component.identity
                        ),
                    );
                }
                let expected = component.version;
                let component = self.update(component, expected)?;
                report.merged += 1;
                component
            }
        };

        index.insert(key, stored);
        Ok(())
    }

    fn apply_discrete(
        &mut self,
        row: &ImportRow,
        resolved: &ResolvedIdentity,
        index: &mut HashMap<ScopeKey, Component>,
        report: &mut ImportReport,
    ) -> Result<(), TrackError> {
        let count = match resolved.identity.seq() {
            Some(_) => instance_count(row.qty.as_deref(), self.max_instances)?,
            None => 1,
        };

        // Fail before creating anything when the type has no template
        let zero_state =
            WeightTable::resolve(self.templates, resolved.component_type, None)?
                .template()
                .zero_state();

        for seq in 1..=count {
            let identity = resolved.with_seq(seq);
            let key = resolved.scope_key(identity.clone());

            if let Some(existing) = index.get(&key) {
                if existing.is_retired {
                    report.retired_skipped += 1;
                    report.push_issue(
                        row.row,
                        Severity::Warning,
                        format!("{} is retired; not re-created", existing.identity),
                    );
                } else {
                    report.duplicates += 1;
                    tracing::debug!(row = row.row, identity = %identity, "duplicate skipped");
                }
                continue;
            }

            let mut component = Component::new(
                resolved.component_type,
                resolved.drawing.clone(),
                identity,
                ComponentAttributes::Discrete(DiscreteAttributes {
                    description: row.description.clone(),
                    fields: row.extra.clone(),
                }),
                self.author.clone(),
            );
            assign_metadata(&mut component, row);
            component.current_milestones = zero_state.clone();
            recompute(&mut component, self.templates)?;

            self.insert(&component)?;
            report.created += 1;
            index.insert(key, component);
        }

        Ok(())
    }

    fn insert(&mut self, component: &Component) -> Result<(), TrackError> {
        if self.dry_run {
            return Ok(());
        }
        self.store.insert(component)
    }

    fn update(&mut self, component: Component, expected: u64) -> Result<Component, TrackError> {
        if self.dry_run {
            let mut component = component;
            component.version = expected + 1;
            return Ok(component);
        }
        self.store.update(component, expected)
    }
}

/// Whole-unit quantity for instance types; blank means one
fn instance_count(raw: Option<&str>, limit: u32) -> Result<u32, TrackError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(1);
    };
    let qty = parse_quantity(raw)?;
    if qty.fract() != 0.0 {
        return Err(TrackError::InvalidQuantity {
            value: raw.to_string(),
            reason: "must be a whole number of units".to_string(),
        });
    }
    if qty > f64::from(limit) {
        return Err(TrackError::InvalidQuantity {
            value: raw.to_string(),
            reason: format!("exceeds the limit of {} instances per row", limit),
        });
    }
    Ok(qty as u32)
}

fn assign_metadata(component: &mut Component, row: &ImportRow) {
    component.area = row.area.clone();
    component.system = row.system.clone();
    component.test_package = row.test_package.clone();
}
