//! Milestone weight resolution
//!
//! Resolves the weighted milestone list that governs a component and maps
//! stored milestone keys, including legacy spellings, onto it.

use std::collections::BTreeMap;

use crate::core::error::TrackError;
use crate::entities::component::{Component, ComponentType, MilestoneValue};
use crate::entities::template::{fold_milestone_name, MilestoneDef, ProgressTemplate, TemplateSet};

/// The weight table in effect for one component
#[derive(Debug, Clone, Copy)]
pub struct WeightTable<'a> {
    template: &'a ProgressTemplate,
}

impl<'a> WeightTable<'a> {
    /// Resolve by explicit template id, else the type's default template
    pub fn resolve(
        templates: &'a TemplateSet,
        component_type: ComponentType,
        template_id: Option<&str>,
    ) -> Result<Self, TrackError> {
        let template = match template_id {
            Some(id) => templates.get(id),
            None => templates.default_for(component_type),
        };

        template
            .map(|template| Self { template })
            .ok_or_else(|| TrackError::MissingTemplate {
                component_type,
                template: template_id.map(str::to_string),
            })
    }

    /// Resolve the table linked to a component
    pub fn for_component(templates: &'a TemplateSet, component: &Component) -> Result<Self, TrackError> {
        Self::resolve(
            templates,
            component.component_type,
            component.template.as_deref(),
        )
    }

    pub fn template(&self) -> &'a ProgressTemplate {
        self.template
    }

    /// Ordered `(name, weight, kind)` entries
    pub fn entries(&self) -> &'a [MilestoneDef] {
        &self.template.milestones
    }

    /// Map a stored (possibly legacy) milestone name to the template's name
    ///
    /// Tries an exact match, then the template's alias table, then a
    /// case- and punctuation-insensitive match.
    pub fn canonical_name(&self, stored: &str) -> Option<&'a str> {
        let template = self.template;

        if let Some(def) = template.milestone(stored) {
            return Some(&def.name);
        }

        if let Some(target) = template.aliases.get(stored) {
            if let Some(def) = template.milestone(target) {
                return Some(&def.name);
            }
        }

        let folded = fold_milestone_name(stored);
        template
            .milestones
            .iter()
            .find(|m| fold_milestone_name(&m.name) == folded)
            .map(|m| m.name.as_str())
    }

    /// Stored value for a milestone; the canonical key wins over legacy keys
    pub fn lookup<'m>(
        &self,
        milestones: &'m BTreeMap<String, MilestoneValue>,
        def: &MilestoneDef,
    ) -> Option<&'m MilestoneValue> {
        if let Some(value) = milestones.get(&def.name) {
            return Some(value);
        }
        milestones
            .iter()
            .find(|(key, _)| self.canonical_name(key) == Some(def.name.as_str()))
            .map(|(_, value)| value)
    }

    /// Stored keys the template does not recognize (kept, but not counted)
    pub fn unrecognized<'m>(
        &self,
        milestones: &'m BTreeMap<String, MilestoneValue>,
    ) -> Vec<&'m str> {
        milestones
            .keys()
            .filter(|key| self.canonical_name(key).is_none())
            .map(String::as_str)
            .collect()
    }
}
