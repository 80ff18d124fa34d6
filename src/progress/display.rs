//! Duplicate counting and display labels
//!
//! Components on the same drawing that share a display identity (same type
//! and group key, differing only by sequence) get a ` (n of m)` suffix.
//! Retired components are not counted.

use std::collections::{BTreeMap, HashMap};

use crate::core::identity::ComponentId;
use crate::entities::component::{Component, ComponentType, IdentityGroupKey};

/// Grouping used for duplicate counts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayGroup {
    pub drawing: String,
    pub component_type: ComponentType,
    pub group_key: IdentityGroupKey,
}

impl DisplayGroup {
    fn of(component: &Component) -> Self {
        Self {
            drawing: component.drawing.clone(),
            component_type: component.component_type,
            group_key: component.identity.group_key(),
        }
    }
}

/// Number of live components per display group
pub fn duplicate_counts<'a>(
    components: impl IntoIterator<Item = &'a Component>,
) -> BTreeMap<DisplayGroup, usize> {
    let mut counts = BTreeMap::new();
    for c in components.into_iter().filter(|c| !c.is_retired) {
        *counts.entry(DisplayGroup::of(c)).or_insert(0) += 1;
    }
    counts
}

/// Disambiguated display label for every live component
pub fn display_labels<'a>(
    components: impl IntoIterator<Item = &'a Component>,
) -> HashMap<ComponentId, String> {
    let mut groups: BTreeMap<DisplayGroup, Vec<&Component>> = BTreeMap::new();
    for c in components.into_iter().filter(|c| !c.is_retired) {
        groups.entry(DisplayGroup::of(c)).or_default().push(c);
    }

    let mut labels = HashMap::new();
    for members in groups.into_values() {
        if members.len() == 1 {
            let c = members[0];
            labels.insert(c.id.clone(), c.base_label());
            continue;
        }

        let mut members = members;
        members.sort_by(|a, b| {
            a.identity
                .seq()
                .cmp(&b.identity.seq())
                .then_with(|| a.id.cmp(&b.id))
        });
        let total = members.len();
        for (idx, c) in members.into_iter().enumerate() {
            labels.insert(
                c.id.clone(),
                format!("{} ({} of {})", c.base_label(), idx + 1, total),
            );
        }
    }
    labels
}
