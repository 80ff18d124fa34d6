//! Core module - identity, errors, project layout and persistence

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod project;
pub mod shortid;
pub mod store;

pub use config::Config;
pub use error::{Severity, TrackError};
pub use identity::{ComponentId, IdParseError};
pub use project::{Project, ProjectError};
pub use shortid::ShortIdIndex;
pub use store::{ComponentStore, FileStore, MemoryStore};
