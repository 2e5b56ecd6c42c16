use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::foundation::error::{DemolineError, DemolineResult};

/// Key-value blob store holding the persisted state.
pub trait KeyValueStore {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> DemolineResult<Option<String>>;
    /// Replace the whole value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> DemolineResult<()>;
}

/// Read-only document fetch by relative path. `Ok(None)` means not found.
pub trait DocumentSource {
    /// Document at `path`, or `Ok(None)` when it does not exist.
    fn fetch(&self, path: &str) -> DemolineResult<Option<String>>;
}

/// In-process store, used by tests and by front ends without durable storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> DemolineResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> DemolineResult<()> {
        self.values.insert(key.to_owned(), value.to_owned());
        self.writes += 1;
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
///
/// Writes go to a sibling temp file that is then renamed over the target, so a reader never
/// sees a partial blob.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store under `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> DemolineResult<PathBuf> {
        let plain = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !plain {
            return Err(DemolineError::validation(format!(
                "store key '{key}' must be a plain file name"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> DemolineResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DemolineError::persist(format!(
                "read '{}': {e}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> DemolineResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            DemolineError::persist(format!("create '{}': {e}", self.dir.display()))
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value.as_bytes()).map_err(|e| {
            DemolineError::persist(format!("write '{}': {e}", tmp.display()))
        })?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(DemolineError::persist(format!(
                "rename '{}' -> '{}': {e}",
                tmp.display(),
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), bytes = value.len(), "state written");
        Ok(())
    }
}

/// Documents read from files below a root directory.
#[derive(Clone, Debug)]
pub struct DirDocuments {
    root: PathBuf,
}

impl DirDocuments {
    /// Documents below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentSource for DirDocuments {
    fn fetch(&self, path: &str) -> DemolineResult<Option<String>> {
        let rel = Path::new(path);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(DemolineError::validation(format!(
                "document path '{path}' must be relative and stay below the root"
            )));
        }
        let full = self.root.join(rel);
        match std::fs::read_to_string(&full) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DemolineError::persist(format!(
                "read '{}': {e}",
                full.display()
            ))),
        }
    }
}

/// A source where every fetch is a miss.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDocuments;

impl DocumentSource for NoDocuments {
    fn fetch(&self, _path: &str) -> DemolineResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/store.rs"]
mod tests;
