//! Command implementations

pub mod assign;
pub mod completions;
pub mod import;
pub mod init;
pub mod list;
pub mod milestone;
pub mod recompute;
pub mod retire;
pub mod show;
pub mod status;
pub mod template;
