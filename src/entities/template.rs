//! Progress templates - ordered, weighted milestone lists per component type

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::core::error::TrackError;
use crate::entities::component::{ComponentType, MilestoneValue};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const BUILTIN_FILE: &str = "progress_templates.yaml";

/// Allowed drift from 100 when summing fractional weights
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// How a milestone records completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneKind {
    /// Done / not done
    #[default]
    Discrete,
    /// Completed quantity out of the component's total
    Quantity,
}

impl MilestoneKind {
    /// Value a freshly created component starts with
    pub fn zero_value(&self) -> MilestoneValue {
        match self {
            MilestoneKind::Discrete => MilestoneValue::Flag(false),
            MilestoneKind::Quantity => MilestoneValue::Quantity(0.0),
        }
    }

    /// Parse a user-entered value for this kind of milestone
    pub fn parse_value(&self, raw: &str) -> Option<MilestoneValue> {
        let raw = raw.trim();
        match self {
            MilestoneKind::Discrete => match raw.to_lowercase().as_str() {
                "true" | "yes" | "y" | "done" | "1" => Some(MilestoneValue::Flag(true)),
                "false" | "no" | "n" | "0" => Some(MilestoneValue::Flag(false)),
                _ => None,
            },
            MilestoneKind::Quantity => raw
                .parse::<f64>()
                .ok()
                .filter(|q| q.is_finite())
                .map(MilestoneValue::Quantity),
        }
    }
}

impl std::fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MilestoneKind::Discrete => write!(f, "discrete"),
            MilestoneKind::Quantity => write!(f, "quantity"),
        }
    }
}

/// One weighted milestone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneDef {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub kind: MilestoneKind,
}

/// Ordered, weighted milestone list governing one component type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressTemplate {
    /// Template identifier (components may link to it explicitly)
    pub id: String,

    /// Component type this template applies to
    pub component_type: ComponentType,

    /// Bumped by administrators when weights change
    #[serde(default = "default_revision")]
    pub revision: u32,

    /// Milestones in credit order
    pub milestones: Vec<MilestoneDef>,

    /// Legacy milestone name -> current milestone name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

fn default_revision() -> u32 {
    1
}

impl ProgressTemplate {
    /// Sum of all milestone weights
    pub fn total_weight(&self) -> f64 {
        self.milestones.iter().map(|m| m.weight).sum()
    }

    /// Look up a milestone by its exact name
    pub fn milestone(&self, name: &str) -> Option<&MilestoneDef> {
        self.milestones.iter().find(|m| m.name == name)
    }

    /// Initial milestone map for a new component
    pub fn zero_state(&self) -> BTreeMap<String, MilestoneValue> {
        self.milestones
            .iter()
            .map(|m| (m.name.clone(), m.kind.zero_value()))
            .collect()
    }

    /// Check weights, names and aliases
    pub fn validate(&self) -> Result<(), TrackError> {
        let invalid = |reason: String| TrackError::InvalidTemplate {
            template: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("template id is empty".to_string()));
        }
        if self.milestones.is_empty() {
            return Err(invalid("no milestones defined".to_string()));
        }

        let mut seen = HashSet::new();
        for m in &self.milestones {
            if m.name.trim().is_empty() {
                return Err(invalid("milestone with empty name".to_string()));
            }
            if !m.weight.is_finite() || m.weight < 0.0 {
                return Err(invalid(format!(
                    "milestone '{}' has invalid weight {}",
                    m.name, m.weight
                )));
            }
            if !seen.insert(fold_milestone_name(&m.name)) {
                return Err(invalid(format!("duplicate milestone '{}'", m.name)));
            }
        }

        let total = self.total_weight();
        if (total - 100.0).abs() > WEIGHT_TOLERANCE {
            return Err(invalid(format!("weights sum to {}, expected 100", total)));
        }

        for (legacy, canonical) in &self.aliases {
            if self.milestone(canonical).is_none() {
                return Err(invalid(format!(
                    "alias '{}' points at unknown milestone '{}'",
                    legacy, canonical
                )));
            }
        }

        Ok(())
    }
}

/// Case- and punctuation-insensitive form of a milestone name
pub fn fold_milestone_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: Vec<ProgressTemplate>,
}

/// Immutable snapshot of all progress templates in effect
///
/// Passed explicitly into every progress computation; never global state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSet {
    templates: Vec<ProgressTemplate>,
}

impl TemplateSet {
    pub fn new(templates: Vec<ProgressTemplate>) -> Self {
        Self { templates }
    }

    /// Templates shipped with the binary
    pub fn builtin() -> Result<Self, TrackError> {
        let file = EmbeddedTemplates::get(BUILTIN_FILE).ok_or_else(|| {
            TrackError::InvalidTemplate {
                template: BUILTIN_FILE.to_string(),
                reason: "embedded template file missing".to_string(),
            }
        })?;
        let source = String::from_utf8_lossy(&file.data);
        Self::from_yaml(&source, BUILTIN_FILE)
    }

    /// Raw text of the built-in template file
    pub fn builtin_source() -> String {
        EmbeddedTemplates::get(BUILTIN_FILE)
            .map(|f| String::from_utf8_lossy(&f.data).into_owned())
            .unwrap_or_default()
    }

    /// Parse a template file (`templates: [...]`)
    pub fn from_yaml(source: &str, origin: &str) -> Result<Self, TrackError> {
        let file: TemplateFile = serde_yml::from_str(source).map_err(|e| TrackError::Yaml {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(file.templates))
    }

    /// Layer `other` on top: same ids replace, new ids append
    pub fn overlay(&mut self, other: TemplateSet) {
        for template in other.templates {
            match self.templates.iter_mut().find(|t| t.id == template.id) {
                Some(existing) => *existing = template,
                None => self.templates.push(template),
            }
        }
    }

    /// Look up a template by id
    pub fn get(&self, id: &str) -> Option<&ProgressTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Default template for a type: the last one registered for it
    pub fn default_for(&self, component_type: ComponentType) -> Option<&ProgressTemplate> {
        self.templates
            .iter()
            .rev()
            .find(|t| t.component_type == component_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgressTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Validate every template
    pub fn validate(&self) -> Result<(), TrackError> {
        let mut ids = HashSet::new();
        for template in &self.templates {
            if !ids.insert(template.id.as_str()) {
                return Err(TrackError::InvalidTemplate {
                    template: template.id.clone(),
                    reason: "duplicate template id".to_string(),
                });
            }
            template.validate()?;
        }
        Ok(())
    }

    /// Component types with no template at all
    pub fn uncovered_types(&self) -> Vec<ComponentType> {
        ComponentType::all()
            .iter()
            .copied()
            .filter(|t| self.default_for(*t).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(weights: &[(&str, f64, MilestoneKind)]) -> ProgressTemplate {
        ProgressTemplate {
            id: "t".to_string(),
            component_type: ComponentType::Valve,
            revision: 1,
            milestones: weights
                .iter()
                .map(|(name, weight, kind)| MilestoneDef {
                    name: name.to_string(),
                    weight: *weight,
                    kind: *kind,
                })
                .collect(),
            aliases: BTreeMap::new(),
        }
    }

    #[test]
    fn test_builtin_templates_sum_to_100() {
        let set = TemplateSet::builtin().unwrap();
        assert!(!set.is_empty());
        for t in set.iter() {
            assert!(
                (t.total_weight() - 100.0).abs() < 1e-9,
                "{} sums to {}",
                t.id,
                t.total_weight()
            );
        }
        set.validate().unwrap();
    }

    #[test]
    fn test_builtin_covers_every_type() {
        let set = TemplateSet::builtin().unwrap();
        assert!(set.uncovered_types().is_empty());
    }

    #[test]
    fn test_threaded_pipe_fabricate_weight() {
        let set = TemplateSet::builtin().unwrap();
        let tp = set.default_for(ComponentType::ThreadedPipe).unwrap();
        let fab = tp.milestone("Fabricate_LF").unwrap();
        assert_eq!(fab.weight, 16.0);
        assert_eq!(fab.kind, MilestoneKind::Quantity);
    }

    #[test]
    fn test_validate_rejects_bad_sum() {
        let t = template(&[("A", 50.0, MilestoneKind::Discrete), ("B", 40.0, MilestoneKind::Discrete)]);
        let err = t.validate().unwrap_err();
        assert!(matches!(err, TrackError::InvalidTemplate { .. }));
        assert!(err.to_string().contains("90"));
    }

    #[test]
    fn test_validate_accepts_fractional_weights() {
        let t = template(&[
            ("A", 33.3, MilestoneKind::Discrete),
            ("B", 33.3, MilestoneKind::Discrete),
            ("C", 33.4, MilestoneKind::Discrete),
        ]);
        t.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let t = template(&[
            ("Fit-up", 50.0, MilestoneKind::Discrete),
            ("fit up", 50.0, MilestoneKind::Discrete),
        ]);
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dangling_alias() {
        let mut t = template(&[("Install", 100.0, MilestoneKind::Discrete)]);
        t.aliases
            .insert("Installed".to_string(), "Erect".to_string());
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_overlay_replaces_and_appends() {
        let mut base = TemplateSet::builtin().unwrap();
        let project = TemplateSet::from_yaml(
            r#"
templates:
  - id: valve
    component_type: Valve
    revision: 2
    milestones:
      - { name: Receive, weight: 20 }
      - { name: Install, weight: 80 }
  - id: threaded_pipe_v2
    component_type: Threaded_Pipe
    milestones:
      - { name: Fabricate_LF, weight: 50, kind: quantity }
      - { name: Install_LF, weight: 50, kind: quantity }
"#,
            "project",
        )
        .unwrap();
        let before = base.len();
        base.overlay(project);

        assert_eq!(base.len(), before + 1);
        assert_eq!(base.get("valve").unwrap().revision, 2);
        assert_eq!(
            base.default_for(ComponentType::ThreadedPipe).unwrap().id,
            "threaded_pipe_v2"
        );
        // The previous default stays reachable by id
        assert!(base.get("threaded_pipe").is_some());
    }

    #[test]
    fn test_zero_state() {
        let t = template(&[
            ("Receive", 50.0, MilestoneKind::Discrete),
            ("Install_LF", 50.0, MilestoneKind::Quantity),
        ]);
        let zero = t.zero_state();
        assert_eq!(zero.get("Receive"), Some(&MilestoneValue::Flag(false)));
        assert_eq!(zero.get("Install_LF"), Some(&MilestoneValue::Quantity(0.0)));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            MilestoneKind::Discrete.parse_value("Yes"),
            Some(MilestoneValue::Flag(true))
        );
        assert_eq!(MilestoneKind::Discrete.parse_value("12"), None);
        assert_eq!(
            MilestoneKind::Quantity.parse_value("12.5"),
            Some(MilestoneValue::Quantity(12.5))
        );
        assert_eq!(MilestoneKind::Quantity.parse_value("NaN"), None);
    }
}
