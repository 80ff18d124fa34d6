//! Error taxonomy for identity, aggregation, progress and persistence

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::identity::ComponentId;
use crate::entities::component::ComponentType;

/// Errors raised by the progress model and its persistence boundary
#[derive(Debug, Error, Diagnostic)]
pub enum TrackError {
    #[error("invalid identity: {reason}")]
    #[diagnostic(
        code(fieldtrack::identity),
        help("every row needs a drawing plus the key fields for its component type")
    )]
    InvalidIdentity { reason: String },

    #[error("invalid quantity {value}: {reason}")]
    #[diagnostic(code(fieldtrack::quantity))]
    InvalidQuantity { value: String, reason: String },

    #[error("no progress template found for {component_type}{}", template_suffix(.template))]
    #[diagnostic(
        code(fieldtrack::template::missing),
        help("add a template for this type to .fieldtrack/templates.yaml")
    )]
    MissingTemplate {
        component_type: ComponentType,
        template: Option<String>,
    },

    #[error("{id} was modified concurrently (expected version {expected}, found {found})")]
    #[diagnostic(
        code(fieldtrack::store::conflict),
        help("reload the component and retry the change")
    )]
    ConcurrentUpdate {
        id: ComponentId,
        expected: u64,
        found: u64,
    },

    #[error("{id} is locked by another writer ({path})")]
    #[diagnostic(
        code(fieldtrack::store::locked),
        help("retry once the other command finishes; remove the lock file if no fieldtrack process is running")
    )]
    Locked { id: ComponentId, path: String },

    #[error("template '{template}' has no milestone named '{name}'")]
    #[diagnostic(code(fieldtrack::milestone::unknown))]
    UnknownMilestone { template: String, name: String },

    #[error("invalid value '{value}' for milestone '{name}': {reason}")]
    #[diagnostic(code(fieldtrack::milestone::value))]
    InvalidMilestoneValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("invalid progress template '{template}': {reason}")]
    #[diagnostic(code(fieldtrack::template::invalid))]
    InvalidTemplate { template: String, reason: String },

    #[error("{component_type} does not aggregate quantities")]
    #[diagnostic(code(fieldtrack::aggregate::routing))]
    NotAggregate { component_type: ComponentType },

    #[error("no component found matching '{0}'")]
    #[diagnostic(code(fieldtrack::store::not_found))]
    NotFound(String),

    #[error("'{reference}' matches {count} components")]
    #[diagnostic(
        code(fieldtrack::store::ambiguous),
        help("use more characters of the id, or an @N short id from `fieldtrack list`")
    )]
    AmbiguousReference { reference: String, count: usize },

    #[error("failed to parse YAML in {path}: {message}")]
    #[diagnostic(code(fieldtrack::yaml))]
    Yaml { path: String, message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(fieldtrack::io))]
    Io(#[from] std::io::Error),
}

fn template_suffix(template: &Option<String>) -> String {
    template
        .as_ref()
        .map(|t| format!(" (template '{}')", t))
        .unwrap_or_default()
}

/// How an import row failure should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl TrackError {
    /// Whether the failure only affects one import row (siblings keep importing)
    pub fn is_row_recoverable(&self) -> bool {
        matches!(
            self,
            TrackError::InvalidIdentity { .. } | TrackError::InvalidQuantity { .. }
        )
    }

    /// Severity used when the failure is reported against an import row
    pub fn severity(&self) -> Severity {
        match self {
            TrackError::InvalidQuantity { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub(crate) fn invalid_identity(reason: impl Into<String>) -> Self {
        TrackError::InvalidIdentity {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_recoverable_kinds() {
        assert!(TrackError::invalid_identity("missing drawing").is_row_recoverable());
        assert!(TrackError::InvalidQuantity {
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        }
        .is_row_recoverable());
        assert!(!TrackError::MissingTemplate {
            component_type: ComponentType::Valve,
            template: None,
        }
        .is_row_recoverable());
    }

    #[test]
    fn test_quantity_is_warning() {
        let err = TrackError::InvalidQuantity {
            value: "-1".to_string(),
            reason: "must be greater than zero".to_string(),
        };
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(
            TrackError::invalid_identity("x").severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_missing_template_message() {
        let err = TrackError::MissingTemplate {
            component_type: ComponentType::ThreadedPipe,
            template: Some("tp-v9".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "no progress template found for Threaded_Pipe (template 'tp-v9')"
        );
    }
}
