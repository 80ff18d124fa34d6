//! Progress calculation
//!
//! The single authoritative mapping from recorded milestones, the weight table
//! and the quantity denominator to a whole percent in `[0, 100]`.
//!
//! Quantity milestones are measured against the component's *current* total,
//! so growing the total through a merge lowers their contribution while the
//! completed quantity stays the same. Rounding happens once, on the sum.

use std::collections::BTreeMap;

use crate::core::error::TrackError;
use crate::entities::component::{Component, MilestoneValue};
use crate::entities::template::{MilestoneKind, TemplateSet};
use crate::progress::weights::WeightTable;

/// Weighted credit earned by one milestone
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub name: String,
    pub weight: f64,
    pub kind: MilestoneKind,
    /// Stored value the credit was computed from
    pub value: Option<MilestoneValue>,
    /// Unrounded credit, `0..=weight`
    pub earned: f64,
}

/// Per-milestone credit breakdown in template order
pub fn contributions(
    milestones: &BTreeMap<String, MilestoneValue>,
    table: &WeightTable<'_>,
    total_quantity: Option<f64>,
) -> Vec<Contribution> {
    table
        .entries()
        .iter()
        .map(|def| {
            let value = table.lookup(milestones, def).copied();
            let fraction = value
                .map(|v| completion_fraction(def.kind, v, total_quantity))
                .unwrap_or(0.0);
            Contribution {
                name: def.name.clone(),
                weight: def.weight,
                kind: def.kind,
                value,
                earned: def.weight * fraction,
            }
        })
        .collect()
}

/// Weighted percent complete, rounded once and clamped to `[0, 100]`
pub fn percent_complete(
    milestones: &BTreeMap<String, MilestoneValue>,
    table: &WeightTable<'_>,
    total_quantity: Option<f64>,
) -> u8 {
    let sum: f64 = contributions(milestones, table, total_quantity)
        .iter()
        .map(|c| c.earned)
        .sum();
    round_percent(sum)
}

/// Recompute and store a component's cached percentage
///
/// Returns the new value. Fails only when the component's template cannot be
/// resolved; the stored percentage is left untouched in that case.
pub fn recompute(component: &mut Component, templates: &TemplateSet) -> Result<u8, TrackError> {
    let table = WeightTable::for_component(templates, component)?;
    let percent = percent_complete(
        &component.current_milestones,
        &table,
        component.total_quantity(),
    );
    if percent != component.percent_complete {
        tracing::debug!(
            id = %component.id,
            from = component.percent_complete,
            to = percent,
            "percent complete changed"
        );
    }
    component.percent_complete = percent;
    Ok(percent)
}

/// Fraction of a milestone's weight earned by a stored value
fn completion_fraction(kind: MilestoneKind, value: MilestoneValue, total: Option<f64>) -> f64 {
    match (kind, value) {
        (MilestoneKind::Discrete, MilestoneValue::Flag(done)) => {
            if done {
                1.0
            } else {
                0.0
            }
        }
        (MilestoneKind::Discrete, MilestoneValue::Quantity(q)) => {
            if q > 0.0 {
                1.0
            } else {
                0.0
            }
        }
        (MilestoneKind::Quantity, MilestoneValue::Quantity(done)) => match total {
            Some(total) if total > 0.0 && done.is_finite() => (done / total).clamp(0.0, 1.0),
            _ => 0.0,
        },
        // A bare flag says nothing about how much was installed
        (MilestoneKind::Quantity, MilestoneValue::Flag(_)) => 0.0,
    }
}

fn round_percent(sum: f64) -> u8 {
    if !sum.is_finite() {
        return 0;
    }
    sum.round().clamp(0.0, 100.0) as u8
}
