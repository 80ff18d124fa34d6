//! Component progress model
//!
//! - [`resolver`] - identity keys for import rows
//! - [`aggregate`] - quantity merge for repeated imports
//! - [`weights`] - milestone weight tables and legacy-name mapping
//! - [`calculator`] - weighted percent complete
//! - [`display`] - duplicate counts and display labels
//!
//! Everything here is pure and synchronous; templates arrive as an explicit
//! [`TemplateSet`](crate::entities::template::TemplateSet) snapshot.

pub mod aggregate;
pub mod calculator;
pub mod display;
pub mod resolver;
pub mod weights;

pub use aggregate::{apply_import, AggregateInput, AggregateOutcome};
pub use calculator::{contributions, percent_complete, recompute, Contribution};
pub use display::{display_labels, duplicate_counts};
pub use resolver::{resolve, ImportRow, ResolvedIdentity};
pub use weights::WeightTable;
