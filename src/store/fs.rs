use super::{ObjectStore, StorageError, validate_key};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory-backed object store.
///
/// ```text
/// <root>/
/// └── <container>/
///     └── image/
///         ├── a.bmp                  ← key "image/a.bmp"
///         └── a.bmp_processed.jpg    ← key "image/a.bmp_processed.jpg"
/// ```
///
/// Intermediate directories are created on write and left in place on delete.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, StorageError> {
        if container.is_empty() || container.contains(['/', '\\']) || container.starts_with('.') {
            return Err(StorageError::Backend(format!(
                "invalid container name {container:?}"
            )));
        }
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        let mut path = self.container_dir(container)?;
        path.extend(key.split('/'));
        Ok(path)
    }
}

fn io_error(container: &str, key: &str, source: io::Error) -> StorageError {
    if source.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound {
            container: container.to_string(),
            key: key.to_string(),
        }
    } else {
        StorageError::Io {
            container: container.to_string(),
            key: key.to_string(),
            source,
        }
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Relative path of `path` under `base` as a `/`-joined key.
fn key_for(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments: Option<Vec<&str>> = relative.iter().map(|s| s.to_str()).collect();
    Some(segments?.join("/"))
}

impl ObjectStore for FsObjectStore {
    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.container_dir(container)?;
        if !dir.is_dir() {
            return Err(StorageError::Backend(format!(
                "container {container:?} does not exist under {}",
                self.root.display()
            )));
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir).follow_links(false) {
            let entry = entry.map_err(|e| StorageError::Io {
                container: container.to_string(),
                key: prefix.to_string(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Non-UTF-8 names cannot be addressed by key; skip them
            if let Some(key) = key_for(&dir, entry.path())
                && key.starts_with(prefix)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(container, key)?;
        fs::read(&path).map_err(|e| io_error(container, key, e))
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(container, key)?;
        ensure_parent(&path).map_err(|e| io_error(container, key, e))?;
        fs::write(&path, bytes).map_err(|e| io_error(container, key, e))
    }

    fn copy(&self, container: &str, source_key: &str, dest_key: &str) -> Result<(), StorageError> {
        let source = self.object_path(container, source_key)?;
        let dest = self.object_path(container, dest_key)?;
        if !source.is_file() {
            return Err(StorageError::NotFound {
                container: container.to_string(),
                key: source_key.to_string(),
            });
        }
        ensure_parent(&dest).map_err(|e| io_error(container, dest_key, e))?;
        fs::copy(&source, &dest)
            .map(|_| ())
            .map_err(|e| io_error(container, dest_key, e))
    }

    fn delete(&self, container: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(container, key)?;
        fs::remove_file(&path).map_err(|e| io_error(container, key, e))
    }

    fn exists(&self, container: &str, key: &str) -> Result<bool, StorageError> {
        Ok(self.object_path(container, key)?.is_file())
    }
}
