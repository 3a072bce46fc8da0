use super::{ObjectStore, StorageError, validate_key};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Objects = BTreeMap<(String, String), Vec<u8>>;

/// In-process object store keyed by `(container, key)`.
///
/// Uses a `Mutex` (not `RefCell`) so it is `Sync` and can be shared with
/// rayon workers.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<Objects>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from `(container, key, bytes)` triples.
    pub fn with_objects<'a>(objects: impl IntoIterator<Item = (&'a str, &'a str, Vec<u8>)>) -> Self {
        let map = objects
            .into_iter()
            .map(|(c, k, bytes)| ((c.to_string(), k.to_string()), bytes))
            .collect();
        Self {
            objects: Mutex::new(map),
        }
    }

    /// Every key in `container`, sorted.
    pub fn keys(&self, container: &str) -> Vec<String> {
        self.lock()
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, k)| k.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Objects> {
        // A panicking writer cannot leave a half-written entry behind,
        // so a poisoned map is still consistent.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn not_found(container: &str, key: &str) -> StorageError {
    StorageError::NotFound {
        container: container.to_string(),
        key: key.to_string(),
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .lock()
            .keys()
            .filter(|(c, k)| c == container && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.lock()
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| not_found(container, key))
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock()
            .insert((container.to_string(), key.to_string()), bytes.to_vec());
        Ok(())
    }

    fn copy(&self, container: &str, source_key: &str, dest_key: &str) -> Result<(), StorageError> {
        validate_key(dest_key)?;
        let mut objects = self.lock();
        let bytes = objects
            .get(&(container.to_string(), source_key.to_string()))
            .cloned()
            .ok_or_else(|| not_found(container, source_key))?;
        objects.insert((container.to_string(), dest_key.to_string()), bytes);
        Ok(())
    }

    fn delete(&self, container: &str, key: &str) -> Result<(), StorageError> {
        self.lock()
            .remove(&(container.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(container, key))
    }

    fn exists(&self, container: &str, key: &str) -> Result<bool, StorageError> {
        Ok(self
            .lock()
            .contains_key(&(container.to_string(), key.to_string())))
    }
}
