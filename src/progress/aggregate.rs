//! Quantity aggregation for repeated imports of the same identity
//!
//! Quantity-bearing components (pipe runs measured in linear feet) are never
//! duplicated by a re-import. The new quantity is added to the running total
//! and the provenance token is recorded once. Recorded milestone quantities
//! are absolute and are never rescaled, so percentages fall when the total
//! grows.

use crate::core::error::TrackError;
use crate::entities::component::{
    format_quantity, AggregateAttributes, Component, ComponentAttributes, ComponentType,
    IdentityKey, ProvenanceTokens,
};
use crate::entities::template::TemplateSet;
use crate::progress::calculator::recompute;
use crate::progress::weights::WeightTable;

/// One aggregate import row, already resolved and validated
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateInput {
    pub component_type: ComponentType,
    pub drawing: String,
    pub identity: IdentityKey,
    pub qty: f64,
    pub token: String,
}

/// What an import did to the aggregate component
#[derive(Debug, Clone)]
pub enum AggregateOutcome {
    Created(Component),
    Merged {
        component: Component,
        previous_total: f64,
        /// False when the token was already recorded (quantity is still summed)
        token_appended: bool,
    },
}

impl AggregateOutcome {
    pub fn component(&self) -> &Component {
        match self {
            AggregateOutcome::Created(c) => c,
            AggregateOutcome::Merged { component, .. } => component,
        }
    }

    pub fn into_component(self) -> Component {
        match self {
            AggregateOutcome::Created(c) => c,
            AggregateOutcome::Merged { component, .. } => component,
        }
    }
}

/// Reject non-finite and non-positive quantities
pub fn validate_quantity(qty: f64) -> Result<f64, TrackError> {
    if qty.is_finite() && qty > 0.0 {
        Ok(qty)
    } else {
        Err(TrackError::InvalidQuantity {
            value: format_quantity(qty),
            reason: "must be greater than zero".to_string(),
        })
    }
}

/// Parse and validate a raw quantity cell
pub fn parse_quantity(raw: &str) -> Result<f64, TrackError> {
    let qty = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| TrackError::InvalidQuantity {
            value: raw.trim().to_string(),
            reason: "not a number".to_string(),
        })?;
    validate_quantity(qty)
}

/// Apply an aggregate import row to the existing component for its identity
///
/// With no existing component a new one is created holding the row's quantity
/// and zero-state milestones. Otherwise the quantity is summed into the
/// existing total and the token appended if unseen. Either way the percentage
/// is recomputed against the new total before returning.
pub fn apply_import(
    existing: Option<Component>,
    input: AggregateInput,
    templates: &TemplateSet,
    author: &str,
) -> Result<AggregateOutcome, TrackError> {
    let qty = validate_quantity(input.qty)?;
    if !input.component_type.is_aggregate() {
        return Err(TrackError::NotAggregate {
            component_type: input.component_type,
        });
    }

    match existing {
        None => {
            let table = WeightTable::resolve(templates, input.component_type, None)?;
            let mut line_numbers = ProvenanceTokens::new();
            add_token(&mut line_numbers, &input.token);

            let mut component = Component::new(
                input.component_type,
                input.drawing,
                input.identity,
                ComponentAttributes::Aggregate(AggregateAttributes {
                    original_qty: qty,
                    total_linear_feet: qty,
                    line_numbers,
                }),
                author,
            );
            component.current_milestones = table.template().zero_state();
            recompute(&mut component, templates)?;

            tracing::debug!(
                id = %component.id,
                identity = %component.identity,
                qty,
                "created aggregate component"
            );
            Ok(AggregateOutcome::Created(component))
        }
        Some(mut component) => {
            // Resolve first so a missing template leaves the component untouched
            WeightTable::for_component(templates, &component)?;

            let id = component.id.clone();
            let agg = component.aggregate_mut().ok_or(TrackError::NotAggregate {
                component_type: input.component_type,
            })?;

            let previous_total = agg.total_linear_feet;
            agg.total_linear_feet = previous_total + qty;
            let token_appended = add_token(&mut agg.line_numbers, &input.token);

            if !token_appended {
                tracing::warn!(
                    id = %id,
                    token = %input.token,
                    qty,
                    "provenance token already recorded; quantity summed anyway"
                );
            }

            recompute(&mut component, templates)?;
            tracing::debug!(
                id = %component.id,
                previous_total,
                total = previous_total + qty,
                percent = component.percent_complete,
                "merged aggregate import"
            );

            Ok(AggregateOutcome::Merged {
                component,
                previous_total,
                token_appended,
            })
        }
    }
}

fn add_token(tokens: &mut ProvenanceTokens, token: &str) -> bool {
    tokens.insert(token.trim())
}
