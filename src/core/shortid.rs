//! Short ID system for easier component selection
//!
//! `list` assigns aliases like `@1`, `@2` in display order and saves them, so
//! the next command can refer to a component without its full id.

use std::collections::HashMap;
use std::fs;

use crate::core::identity::ComponentId;
use crate::core::project::Project;

/// Index file name within the project metadata directory
const INDEX_FILE: &str = "shortids.json";

/// A mapping of short IDs (@N) to full component IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    entries: HashMap<u32, String>,
    #[serde(skip)]
    reverse: HashMap<String, u32>,
    next_id: u32,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            reverse: HashMap::new(),
            next_id: 1,
        }
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.config_dir().join(INDEX_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::new();
        };
        match serde_json::from_str::<ShortIdIndex>(&content) {
            Ok(mut index) => {
                index.reverse = index.entries.iter().map(|(k, v)| (v.clone(), *k)).collect();
                index
            }
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable short id index");
                Self::new()
            }
        }
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.config_dir().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Clear and rebuild the index in the given order
    pub fn rebuild<'a>(&mut self, ids: impl IntoIterator<Item = &'a ComponentId>) {
        self.entries.clear();
        self.reverse.clear();
        self.next_id = 1;

        for id in ids {
            self.add(id);
        }
    }

    /// Add a component id and return its short number
    pub fn add(&mut self, id: &ComponentId) -> u32 {
        let key = id.to_string();
        if let Some(&short_id) = self.reverse.get(&key) {
            return short_id;
        }

        let short_id = self.next_id;
        self.next_id += 1;
        self.entries.insert(short_id, key.clone());
        self.reverse.insert(key, short_id);
        short_id
    }

    /// Resolve `@N` (or a bare number) to a full id; anything else passes through
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let num_str = if let Some(rest) = reference.strip_prefix('@') {
            rest
        } else if !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit()) {
            reference
        } else {
            return Some(reference.to_string());
        };

        num_str
            .parse::<u32>()
            .ok()
            .and_then(|n| self.entries.get(&n).cloned())
    }

    pub fn get_short_id(&self, id: &ComponentId) -> Option<u32> {
        self.reverse.get(&id.to_string()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Expand a short reference; unknown `@N` is returned unchanged so lookup reports it
pub fn expand_reference(reference: &str, project: &Project) -> String {
    let index = ShortIdIndex::load(project);
    index
        .resolve(reference)
        .unwrap_or_else(|| reference.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_short_id_add_and_resolve() {
        let a = ComponentId::new();
        let b = ComponentId::new();
        let mut index = ShortIdIndex::new();

        assert_eq!(index.add(&a), 1);
        assert_eq!(index.add(&b), 2);
        assert_eq!(index.add(&a), 1);

        assert_eq!(index.resolve("@1"), Some(a.to_string()));
        assert_eq!(index.resolve("2"), Some(b.to_string()));
        assert_eq!(index.resolve("@99"), None);
        assert_eq!(index.get_short_id(&b), Some(2));
    }

    #[test]
    fn test_short_id_passthrough() {
        let index = ShortIdIndex::new();
        assert_eq!(index.resolve("CMP-01ABC"), Some("CMP-01ABC".to_string()));
    }

    #[test]
    fn test_short_id_rebuild_and_persist() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let ids: Vec<ComponentId> = (0..3).map(|_| ComponentId::new()).collect();
        let mut index = ShortIdIndex::new();
        index.add(&ComponentId::new());
        index.rebuild(ids.iter());
        assert_eq!(index.len(), 3);
        index.save(&project).unwrap();

        let loaded = ShortIdIndex::load(&project);
        assert_eq!(loaded.resolve("@3"), Some(ids[2].to_string()));
        assert_eq!(loaded.get_short_id(&ids[0]), Some(1));
        assert_eq!(expand_reference("@2", &project), ids[1].to_string());
        assert_eq!(expand_reference("@7", &project), "@7");
    }
}
