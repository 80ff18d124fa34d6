//! Component persistence with optimistic locking
//!
//! Every write through [`ComponentStore::update`] names the version the caller
//! loaded. The write is accepted only if the stored version still matches, and
//! the stored version is then incremented. A mismatch is reported as
//! [`TrackError::ConcurrentUpdate`]; nothing is merged or retried here.
//!
//! [`FileStore`] holds an exclusive `<id>.lock` file across the read, version
//! check and write, and replaces component files by renaming a fully written
//! temp file over them.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::error::TrackError;
use crate::core::identity::ComponentId;
use crate::core::project::{Project, COMPONENT_EXT};
use crate::entities::component::Component;

/// Storage boundary for components
pub trait ComponentStore {
    /// Load every component, retired ones included
    fn all(&self) -> Result<Vec<Component>, TrackError>;

    /// Load one component by id
    fn get(&self, id: &ComponentId) -> Result<Option<Component>, TrackError>;

    /// Persist a new component as-is
    fn insert(&mut self, component: &Component) -> Result<(), TrackError>;

    /// Compare-and-swap write; returns the stored component with its new version
    fn update(&mut self, component: Component, expected_version: u64)
        -> Result<Component, TrackError>;

    /// Find a component by full id or unique id prefix
    fn find(&self, reference: &str) -> Result<Component, TrackError> {
        if let Ok(id) = ComponentId::parse(reference) {
            return self
                .get(&id)?
                .ok_or_else(|| TrackError::NotFound(reference.to_string()));
        }

        let wanted = reference.trim().to_uppercase();
        if wanted.is_empty() {
            return Err(TrackError::NotFound(reference.to_string()));
        }
        let mut matches: Vec<Component> = self
            .all()?
            .into_iter()
            .filter(|c| {
                c.id.to_string().starts_with(&wanted) || c.id.ulid().to_string().starts_with(&wanted)
            })
            .collect();

        match matches.len() {
            0 => Err(TrackError::NotFound(reference.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(TrackError::AmbiguousReference {
                reference: reference.to_string(),
                count,
            }),
        }
    }
}

fn check_version(stored: &Component, expected: u64) -> Result<(), TrackError> {
    if stored.version != expected {
        tracing::warn!(
            id = %stored.id,
            expected,
            found = stored.version,
            "rejected stale write"
        );
        return Err(TrackError::ConcurrentUpdate {
            id: stored.id.clone(),
            expected,
            found: stored.version,
        });
    }
    Ok(())
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    components: BTreeMap<ComponentId, Component>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl ComponentStore for MemoryStore {
    fn all(&self) -> Result<Vec<Component>, TrackError> {
        Ok(self.components.values().cloned().collect())
    }

    fn get(&self, id: &ComponentId) -> Result<Option<Component>, TrackError> {
        Ok(self.components.get(id).cloned())
    }

    fn insert(&mut self, component: &Component) -> Result<(), TrackError> {
        self.components
            .insert(component.id.clone(), component.clone());
        Ok(())
    }

    fn update(
        &mut self,
        mut component: Component,
        expected_version: u64,
    ) -> Result<Component, TrackError> {
        let stored = self
            .components
            .get(&component.id)
            .ok_or_else(|| TrackError::NotFound(component.id.to_string()))?;
        check_version(stored, expected_version)?;

        component.version = expected_version + 1;
        self.components
            .insert(component.id.clone(), component.clone());
        Ok(component)
    }
}

const LOCK_EXT: &str = ".lock";

/// Exclusive write lock on one component file, released on drop
#[derive(Debug)]
struct WriteLock {
    path: PathBuf,
}

impl WriteLock {
    fn acquire(path: PathBuf, id: &ComponentId) -> Result<Self, TrackError> {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!(id = %id, path = %path.display(), "component is locked");
                Err(TrackError::Locked {
                    id: id.clone(),
                    path: path.display().to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}

/// One YAML file per component under `components/`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_project(project: &Project) -> Self {
        Self::new(project.components_dir())
    }

    fn path_for(&self, id: &ComponentId) -> PathBuf {
        self.dir.join(format!("{}{}", id, COMPONENT_EXT))
    }

    fn lock(&self, id: &ComponentId) -> Result<WriteLock, TrackError> {
        fs::create_dir_all(&self.dir)?;
        WriteLock::acquire(self.dir.join(format!("{}{}", id, LOCK_EXT)), id)
    }

    fn read(path: &Path) -> Result<Component, TrackError> {
        let content = fs::read_to_string(path)?;
        serde_yml::from_str(&content).map_err(|e| TrackError::Yaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write to a temp file in the same directory, then rename it into place
    fn write(&self, component: &Component) -> Result<(), TrackError> {
        let path = self.path_for(&component.id);
        let yaml = serde_yml::to_string(component).map_err(|e| TrackError::Yaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        temp.write_all(yaml.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ComponentStore for FileStore {
    fn all(&self) -> Result<Vec<Component>, TrackError> {
        let mut components = Vec::new();
        if !self.dir.exists() {
            return Ok(components);
        }

        for entry in walkdir::WalkDir::new(&self.dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(COMPONENT_EXT))
        {
            components.push(Self::read(entry.path())?);
        }

        Ok(components)
    }

    fn get(&self, id: &ComponentId) -> Result<Option<Component>, TrackError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn insert(&mut self, component: &Component) -> Result<(), TrackError> {
        let _lock = self.lock(&component.id)?;
        self.write(component)
    }

    fn update(
        &mut self,
        mut component: Component,
        expected_version: u64,
    ) -> Result<Component, TrackError> {
        let _lock = self.lock(&component.id)?;
        let stored = self
            .get(&component.id)?
            .ok_or_else(|| TrackError::NotFound(component.id.to_string()))?;
        check_version(&stored, expected_version)?;

        component.version = expected_version + 1;
        self.write(&component)?;
        Ok(component)
    }
}
