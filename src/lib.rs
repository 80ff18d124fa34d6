//! fieldtrack: construction component progress tracking
//!
//! Components imported from CSV take-offs are stored as plain YAML files.
//! Repeated imports of quantity-bearing pipe runs merge into one record, and
//! completion percentages are derived from weighted milestone templates.

pub mod cli;
pub mod core;
pub mod entities;
pub mod import;
pub mod progress;
