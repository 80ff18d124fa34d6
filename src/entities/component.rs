//! Component entity - a trackable physical item on a drawing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::identity::ComponentId;

/// Supported component categories
///
/// The type decides which identity schema, aggregation rule and default
/// progress template apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentType {
    /// Prefabricated pipe spool
    #[serde(rename = "Spool")]
    Spool,
    /// Field weld joining spools
    #[serde(rename = "Field_Weld")]
    FieldWeld,
    #[serde(rename = "Valve")]
    Valve,
    #[serde(rename = "Fitting")]
    Fitting,
    #[serde(rename = "Flange")]
    Flange,
    #[serde(rename = "Instrument")]
    Instrument,
    /// Pipe support or hanger
    #[serde(rename = "Support")]
    Support,
    /// Straight run pipe measured in linear feet
    #[serde(rename = "Pipe")]
    Pipe,
    /// Threaded pipe measured in linear feet
    #[serde(rename = "Threaded_Pipe")]
    ThreadedPipe,
    #[serde(rename = "Tubing")]
    Tubing,
    #[serde(rename = "Hose")]
    Hose,
    #[serde(rename = "Misc_Component")]
    MiscComponent,
}

impl ComponentType {
    /// Canonical name as stored in files and templates
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Spool => "Spool",
            ComponentType::FieldWeld => "Field_Weld",
            ComponentType::Valve => "Valve",
            ComponentType::Fitting => "Fitting",
            ComponentType::Flange => "Flange",
            ComponentType::Instrument => "Instrument",
            ComponentType::Support => "Support",
            ComponentType::Pipe => "Pipe",
            ComponentType::ThreadedPipe => "Threaded_Pipe",
            ComponentType::Tubing => "Tubing",
            ComponentType::Hose => "Hose",
            ComponentType::MiscComponent => "Misc_Component",
        }
    }

    /// Get all component types
    pub fn all() -> &'static [ComponentType] {
        &[
            ComponentType::Spool,
            ComponentType::FieldWeld,
            ComponentType::Valve,
            ComponentType::Fitting,
            ComponentType::Flange,
            ComponentType::Instrument,
            ComponentType::Support,
            ComponentType::Pipe,
            ComponentType::ThreadedPipe,
            ComponentType::Tubing,
            ComponentType::Hose,
            ComponentType::MiscComponent,
        ]
    }

    /// Whether repeated imports of the same identity accumulate quantity
    pub fn is_aggregate(&self) -> bool {
        matches!(self, ComponentType::Pipe | ComponentType::ThreadedPipe)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ComponentType {
    type Err = String;

    /// Accepts canonical names in any case, with `_`, `-` or spaces between words
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold_type_name(s);
        ComponentType::all()
            .iter()
            .copied()
            .find(|t| fold_type_name(t.as_str()) == wanted)
            .ok_or_else(|| format!("Unknown component type: {}", s.trim()))
    }
}

fn fold_type_name(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Type-specific identity of a component within its drawing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityKey {
    Spool {
        spool_id: String,
    },
    Weld {
        weld_number: String,
    },
    /// One physical instance of a commodity; `seq` separates identical items
    Instance {
        commodity_code: String,
        size: String,
        seq: u32,
    },
    /// Merge key for quantity-bearing types
    Aggregate {
        pipe_id: String,
    },
}

impl IdentityKey {
    /// Coarser key that ignores the sequence discriminator
    pub fn group_key(&self) -> IdentityGroupKey {
        match self {
            IdentityKey::Instance {
                commodity_code,
                size,
                ..
            } => IdentityGroupKey(format!("{} {}", commodity_code, size)),
            other => IdentityGroupKey(other.to_string()),
        }
    }

    /// Sequence number for instance keys
    pub fn seq(&self) -> Option<u32> {
        match self {
            IdentityKey::Instance { seq, .. } => Some(*seq),
            _ => None,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Spool { spool_id } => write!(f, "{}", spool_id),
            IdentityKey::Weld { weld_number } => write!(f, "{}", weld_number),
            IdentityKey::Instance {
                commodity_code,
                size,
                seq,
            } => write!(f, "{} {} #{}", commodity_code, size, seq),
            IdentityKey::Aggregate { pipe_id } => write!(f, "{}", pipe_id),
        }
    }
}

/// Display-level identity shared by components that differ only by `seq`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityGroupKey(String);

impl IdentityGroupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uniqueness scope of a component: drawing + type + identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey {
    pub drawing: String,
    pub component_type: ComponentType,
    pub identity: IdentityKey,
}

/// Ordered, append-only, deduplicated provenance tokens (source line numbers)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ProvenanceTokens(Vec<String>);

impl ProvenanceTokens {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a token unless already present; returns whether it was appended
    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        if self.contains(&token) {
            return false;
        }
        self.0.push(token);
        true
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for ProvenanceTokens {
    fn from(tokens: Vec<String>) -> Self {
        let mut set = ProvenanceTokens::new();
        for token in tokens {
            set.insert(token);
        }
        set
    }
}

impl From<ProvenanceTokens> for Vec<String> {
    fn from(tokens: ProvenanceTokens) -> Self {
        tokens.0
    }
}

/// Running totals for quantity-bearing components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateAttributes {
    /// Quantity from the import that created the component
    pub original_qty: f64,

    /// Current aggregate total; the denominator for quantity milestones
    pub total_linear_feet: f64,

    /// Source line numbers that contributed quantity
    #[serde(default)]
    pub line_numbers: ProvenanceTokens,
}

/// Attributes of non-aggregating components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscreteAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Extra columns carried over from the import row
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

/// Type-specific attribute data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentAttributes {
    Aggregate(AggregateAttributes),
    Discrete(DiscreteAttributes),
}

/// Recorded completion for one milestone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MilestoneValue {
    /// Discrete milestone done flag
    Flag(bool),
    /// Completed quantity for quantity milestones
    Quantity(f64),
}

impl fmt::Display for MilestoneValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneValue::Flag(done) => write!(f, "{}", done),
            MilestoneValue::Quantity(qty) => write!(f, "{}", format_quantity(*qty)),
        }
    }
}

/// Format a quantity without a trailing `.0` for whole numbers
pub fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 && qty.abs() < 1e15 {
        format!("{}", qty as i64)
    } else {
        format!("{}", qty)
    }
}

/// A Component entity - one trackable item (spool, valve, weld, pipe run, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier
    pub id: ComponentId,

    /// Component category
    pub component_type: ComponentType,

    /// Normalized drawing number
    pub drawing: String,

    /// Identity within the drawing
    pub identity: IdentityKey,

    /// Linked progress template (type default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Type-specific attributes
    pub attributes: ComponentAttributes,

    /// Milestone name -> recorded completion
    #[serde(default)]
    pub current_milestones: BTreeMap<String, MilestoneValue>,

    /// Cached weighted completion, 0-100
    #[serde(default)]
    pub percent_complete: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_package: Option<String>,

    /// Soft-delete flag
    #[serde(default)]
    pub is_retired: bool,

    /// Optimistic-locking counter
    #[serde(default = "default_version")]
    pub version: u64,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who imported this component)
    pub author: String,
}

fn default_version() -> u64 {
    1
}

impl Component {
    /// Create a new component at version 1 with no recorded progress
    pub fn new(
        component_type: ComponentType,
        drawing: impl Into<String>,
        identity: IdentityKey,
        attributes: ComponentAttributes,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: ComponentId::new(),
            component_type,
            drawing: drawing.into(),
            identity,
            template: None,
            attributes,
            current_milestones: BTreeMap::new(),
            percent_complete: 0,
            area: None,
            system: None,
            test_package: None,
            is_retired: false,
            version: default_version(),
            created: Utc::now(),
            author: author.into(),
        }
    }

    /// Aggregate attributes, if this is a quantity-bearing component
    pub fn aggregate(&self) -> Option<&AggregateAttributes> {
        match &self.attributes {
            ComponentAttributes::Aggregate(agg) => Some(agg),
            ComponentAttributes::Discrete(_) => None,
        }
    }

    pub fn aggregate_mut(&mut self) -> Option<&mut AggregateAttributes> {
        match &mut self.attributes {
            ComponentAttributes::Aggregate(agg) => Some(agg),
            ComponentAttributes::Discrete(_) => None,
        }
    }

    /// Denominator for quantity milestones
    pub fn total_quantity(&self) -> Option<f64> {
        self.aggregate().map(|agg| agg.total_linear_feet)
    }

    /// Key that must be unique for non-aggregating types
    pub fn scope_key(&self) -> ScopeKey {
        ScopeKey {
            drawing: self.drawing.clone(),
            component_type: self.component_type,
            identity: self.identity.clone(),
        }
    }

    /// Human-readable label before duplicate disambiguation
    pub fn base_label(&self) -> String {
        match &self.identity {
            IdentityKey::Instance {
                commodity_code,
                size,
                ..
            } => format!("{} {}", commodity_code, size),
            IdentityKey::Aggregate { .. } => match self.aggregate() {
                Some(agg) => format!(
                    "{} ({} LF)",
                    self.identity,
                    format_quantity(agg.total_linear_feet)
                ),
                None => self.identity.to_string(),
            },
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threaded_pipe() -> Component {
        Component::new(
            ComponentType::ThreadedPipe,
            "P-001",
            IdentityKey::Aggregate {
                pipe_id: "P-001-1-TP40-AGG".to_string(),
            },
            ComponentAttributes::Aggregate(AggregateAttributes {
                original_qty: 50.0,
                total_linear_feet: 50.0,
                line_numbers: vec!["1".to_string()].into(),
            }),
            "tester",
        )
    }

    #[test]
    fn test_component_type_parse_lenient() {
        assert_eq!(
            "threaded pipe".parse::<ComponentType>().unwrap(),
            ComponentType::ThreadedPipe
        );
        assert_eq!(
            "FIELD-WELD".parse::<ComponentType>().unwrap(),
            ComponentType::FieldWeld
        );
        assert_eq!(
            "Misc_Component".parse::<ComponentType>().unwrap(),
            ComponentType::MiscComponent
        );
        assert!("gasket".parse::<ComponentType>().is_err());
    }

    #[test]
    fn test_component_type_roundtrip_names() {
        for ty in ComponentType::all() {
            assert_eq!(ty.as_str().parse::<ComponentType>().unwrap(), *ty);
        }
    }

    #[test]
    fn test_aggregate_types() {
        assert!(ComponentType::ThreadedPipe.is_aggregate());
        assert!(ComponentType::Pipe.is_aggregate());
        assert!(!ComponentType::Valve.is_aggregate());
        assert!(!ComponentType::FieldWeld.is_aggregate());
    }

    #[test]
    fn test_provenance_tokens_dedupe() {
        let mut tokens = ProvenanceTokens::new();
        assert!(tokens.insert("1"));
        assert!(tokens.insert("2"));
        assert!(!tokens.insert("1"));
        assert_eq!(tokens.as_slice(), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_provenance_tokens_dedupe_on_load() {
        let tokens: ProvenanceTokens =
            serde_json::from_str(r#"["3", "1", "3"]"#).unwrap();
        assert_eq!(tokens.as_slice(), &["3".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_group_key_ignores_seq() {
        let a = IdentityKey::Instance {
            commodity_code: "VBALU-001".to_string(),
            size: "2".to_string(),
            seq: 1,
        };
        let b = IdentityKey::Instance {
            commodity_code: "VBALU-001".to_string(),
            size: "2".to_string(),
            seq: 2,
        };
        assert_ne!(a, b);
        assert_eq!(a.group_key(), b.group_key());
    }

    #[test]
    fn test_component_yaml_shape() {
        let mut cmp = threaded_pipe();
        cmp.current_milestones
            .insert("Fabricate_LF".to_string(), MilestoneValue::Quantity(25.0));
        cmp.current_milestones
            .insert("Punch".to_string(), MilestoneValue::Flag(false));

        let yaml = serde_yml::to_string(&cmp).unwrap();
        assert!(yaml.contains("total_linear_feet: 50"));
        assert!(yaml.contains("line_numbers:"));
        assert!(yaml.contains("kind: aggregate"));

        let parsed: Component = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, cmp.id);
        assert_eq!(parsed.total_quantity(), Some(50.0));
        assert_eq!(
            parsed.current_milestones.get("Fabricate_LF"),
            Some(&MilestoneValue::Quantity(25.0))
        );
        assert_eq!(
            parsed.current_milestones.get("Punch"),
            Some(&MilestoneValue::Flag(false))
        );
        assert_eq!(parsed.version, 1);
    }

    #[test]
    fn test_base_label() {
        let cmp = threaded_pipe();
        assert_eq!(cmp.base_label(), "P-001-1-TP40-AGG (50 LF)");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(50.0), "50");
        assert_eq!(format_quantity(12.5), "12.5");
    }
}
