//! Entity type definitions
//!
//! - [`Component`] - a trackable item (spool, weld, valve, pipe run, ...)
//! - [`ProgressTemplate`] - weighted milestone list for a component type

pub mod component;
pub mod template;

pub use component::{Component, ComponentType, IdentityKey, MilestoneValue};
pub use template::{MilestoneKind, ProgressTemplate, TemplateSet};
