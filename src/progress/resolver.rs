//! Identity resolution for import rows
//!
//! Maps a raw take-off row to its component type, drawing scope and
//! type-specific identity key. Free-text fields keep their case; only the
//! drawing number and size are normalized.

use std::collections::BTreeMap;

use crate::core::error::TrackError;
use crate::entities::component::{ComponentType, IdentityGroupKey, IdentityKey, ScopeKey};

/// One normalized take-off row as produced by the CSV reader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    /// 1-based data row number in the source file
    pub row: usize,
    pub component_type: String,
    pub drawing: String,
    pub spool_id: Option<String>,
    pub weld_number: Option<String>,
    pub commodity_code: Option<String>,
    pub size: Option<String>,
    /// Raw quantity text, validated before aggregation
    pub qty: Option<String>,
    /// Provenance token (source line number)
    pub token: Option<String>,
    pub description: Option<String>,
    pub area: Option<String>,
    pub system: Option<String>,
    pub test_package: Option<String>,
    /// Columns with no dedicated field
    pub extra: BTreeMap<String, String>,
}

impl ImportRow {
    /// Provenance token, falling back to the row number
    pub fn provenance_token(&self) -> String {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.row.to_string())
    }
}

/// Result of resolving a row's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub component_type: ComponentType,
    pub drawing: String,
    /// Identity of the first (or only) component the row describes
    pub identity: IdentityKey,
}

impl ResolvedIdentity {
    /// Identity of the `seq`-th instance for instance types; other keys are returned as-is
    pub fn with_seq(&self, seq: u32) -> IdentityKey {
        match &self.identity {
            IdentityKey::Instance {
                commodity_code,
                size,
                ..
            } => IdentityKey::Instance {
                commodity_code: commodity_code.clone(),
                size: size.clone(),
                seq,
            },
            other => other.clone(),
        }
    }

    pub fn group_key(&self) -> IdentityGroupKey {
        self.identity.group_key()
    }

    pub fn scope_key(&self, identity: IdentityKey) -> ScopeKey {
        ScopeKey {
            drawing: self.drawing.clone(),
            component_type: self.component_type,
            identity,
        }
    }
}

/// Resolve the identity of an import row
pub fn resolve(row: &ImportRow) -> Result<ResolvedIdentity, TrackError> {
    let component_type: ComponentType = row
        .component_type
        .parse()
        .map_err(|e: String| TrackError::invalid_identity(e))?;

    let drawing = normalize_drawing(&row.drawing);
    if drawing.is_empty() {
        return Err(TrackError::invalid_identity(format!(
            "{} row is missing a drawing number",
            component_type
        )));
    }

    let identity = match component_type {
        ComponentType::Spool => IdentityKey::Spool {
            spool_id: required(&row.spool_id, "spool_id", component_type)?,
        },
        ComponentType::FieldWeld => IdentityKey::Weld {
            weld_number: required(&row.weld_number, "weld_number", component_type)?,
        },
        ty if ty.is_aggregate() => {
            let commodity_code = required(&row.commodity_code, "commodity_code", ty)?;
            let size = required_size(&row.size, ty)?;
            IdentityKey::Aggregate {
                pipe_id: format!("{}-{}-{}-AGG", drawing, size, commodity_code),
            }
        }
        ty => IdentityKey::Instance {
            commodity_code: required(&row.commodity_code, "commodity_code", ty)?,
            size: required_size(&row.size, ty)?,
            seq: 1,
        },
    };

    Ok(ResolvedIdentity {
        component_type,
        drawing,
        identity,
    })
}

fn required(
    value: &Option<String>,
    field: &str,
    component_type: ComponentType,
) -> Result<String, TrackError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            TrackError::invalid_identity(format!(
                "{} row is missing required field '{}'",
                component_type, field
            ))
        })
}

fn required_size(value: &Option<String>, component_type: ComponentType) -> Result<String, TrackError> {
    let size = value.as_deref().map(normalize_size).unwrap_or_default();
    if size.is_empty() {
        return Err(TrackError::invalid_identity(format!(
            "{} row is missing required field 'size'",
            component_type
        )));
    }
    Ok(size)
}

/// Upper-case, trim and collapse internal whitespace
pub fn normalize_drawing(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Strip inch marks, join words with `-`, upper-case (`1 1/2"` -> `1-1/2`)
pub fn normalize_size(raw: &str) -> String {
    raw.replace('"', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(component_type: &str) -> ImportRow {
        ImportRow {
            row: 1,
            component_type: component_type.to_string(),
            drawing: " p-001  rev a ".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_threaded_pipe() {
        let mut r = row("Threaded_Pipe");
        r.commodity_code = Some("Tp40-CS".to_string());
        r.size = Some("1\"".to_string());

        let resolved = resolve(&r).unwrap();
        assert_eq!(resolved.component_type, ComponentType::ThreadedPipe);
        assert_eq!(resolved.drawing, "P-001 REV A");
        assert_eq!(
            resolved.identity,
            IdentityKey::Aggregate {
                pipe_id: "P-001 REV A-1-Tp40-CS-AGG".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let mut r = row("Valve");
        r.commodity_code = Some("VBALU-001".to_string());
        r.size = Some("2".to_string());
        assert_eq!(resolve(&r).unwrap(), resolve(&r).unwrap());
    }

    #[test]
    fn test_free_text_case_preserved() {
        let mut r = row("Spool");
        r.spool_id = Some("sp-12a".to_string());
        let resolved = resolve(&r).unwrap();
        assert_eq!(
            resolved.identity,
            IdentityKey::Spool {
                spool_id: "sp-12a".to_string()
            }
        );
    }

    #[test]
    fn test_instance_expansion() {
        let mut r = row("valve");
        r.commodity_code = Some("VBALU-001".to_string());
        r.size = Some("2".to_string());
        let resolved = resolve(&r).unwrap();

        let second = resolved.with_seq(2);
        assert_eq!(second.seq(), Some(2));
        assert_eq!(second.group_key(), resolved.group_key());
    }

    #[test]
    fn test_missing_drawing() {
        let mut r = row("Field_Weld");
        r.drawing = "   ".to_string();
        r.weld_number = Some("W-1".to_string());
        let err = resolve(&r).unwrap_err();
        assert!(matches!(err, TrackError::InvalidIdentity { .. }));
    }

    #[test]
    fn test_missing_key_field() {
        let mut r = row("Field_Weld");
        r.weld_number = Some("  ".to_string());
        let err = resolve(&r).unwrap_err();
        assert!(err.to_string().contains("weld_number"));
    }

    #[test]
    fn test_missing_size() {
        let mut r = row("Flange");
        r.commodity_code = Some("FLG".to_string());
        r.size = Some("\"".to_string());
        let err = resolve(&r).unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_unknown_type() {
        let err = resolve(&row("Gasket")).unwrap_err();
        assert!(matches!(err, TrackError::InvalidIdentity { .. }));
    }

    #[test]
    fn test_provenance_token_fallback() {
        let mut r = row("Pipe");
        r.row = 7;
        assert_eq!(r.provenance_token(), "7");
        r.token = Some("12".to_string());
        assert_eq!(r.provenance_token(), "12");
    }

    #[test]
    fn test_normalize_size() {
        assert_eq!(normalize_size(" 1 1/2\" "), "1-1/2");
        assert_eq!(normalize_size("2in"), "2IN");
    }
}
