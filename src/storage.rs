use crate::config::project_dirs;
use crate::model::TodoRecord;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PROJECT_DIR: &str = ".dayplan";

/// Day index to that day's todos, in display order.
pub type Snapshot = BTreeMap<usize, Vec<TodoRecord>>;

/// String-keyed, string-valued persistent storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        Ok(Some(data))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).with_context(|| format!("creating {:?}", self.root))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("writing {:?}", path))?;
        Ok(())
    }
}

/// Period snapshots on top of a [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct TodoStore<S> {
    backend: S,
}

impl<S: KeyValueStore> TodoStore<S> {
    pub fn new(backend: S) -> Self {
        TodoStore { backend }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Missing, unreadable and malformed values all load as an empty snapshot.
    pub fn load(&self, period_key: &str) -> Snapshot {
        let raw = match self.backend.get(period_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Snapshot::new(),
            Err(err) => {
                warn!(key = period_key, error = %err, "failed to read period, treating as empty");
                return Snapshot::new();
            }
        };
        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(key = period_key, error = %err, "malformed period data, treating as empty");
                Snapshot::new()
            }
        }
    }

    /// Rewrites one day inside the period snapshot. Empty lists are written as `[]`.
    pub fn save(&mut self, period_key: &str, day: usize, records: Vec<TodoRecord>) -> Result<()> {
        let mut snapshot = self.load(period_key);
        let count = records.len();
        snapshot.insert(day, records);
        let serialized = serde_json::to_string(&snapshot).context("serializing period")?;
        self.backend
            .set(period_key, &serialized)
            .with_context(|| format!("saving period {}", period_key))?;
        debug!(key = period_key, day, count, "saved day");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Project,
    Configured,
    Global,
}

impl StoreScope {
    pub fn label(&self) -> &'static str {
        match self {
            StoreScope::Project => "project",
            StoreScope::Configured => "configured",
            StoreScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub dir: PathBuf,
    pub scope: StoreScope,
}

impl StoreLocation {
    pub fn open(&self) -> TodoStore<FileStore> {
        TodoStore::new(FileStore::new(self.dir.clone()))
    }
}

pub fn init_project_store(dir: &Path) -> Result<StoreLocation> {
    let store_dir = dir.join(PROJECT_DIR);
    fs::create_dir_all(&store_dir).context("failed to create .dayplan directory")?;
    Ok(StoreLocation {
        dir: store_dir,
        scope: StoreScope::Project,
    })
}

/// Nearest `.dayplan` directory above `start`, then the configured data
/// directory, then the platform data directory.
pub fn locate_store(start: &Path, configured: Option<&Path>) -> Result<StoreLocation> {
    if let Some(dir) = find_project_store(start) {
        return Ok(StoreLocation {
            dir,
            scope: StoreScope::Project,
        });
    }
    if let Some(dir) = configured {
        return Ok(StoreLocation {
            dir: dir.to_path_buf(),
            scope: StoreScope::Configured,
        });
    }
    Ok(StoreLocation {
        dir: global_store_dir()?,
        scope: StoreScope::Global,
    })
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_store_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("periods"))
}
