//! Object storage seam.
//!
//! The batch pipeline only ever talks to storage through [`ObjectStore`]:
//! list keys under a prefix, read, write, server-side copy, delete. Every
//! call names its container (bucket) explicitly, so a single store handle can
//! serve several containers.
//!
//! Two implementations ship with the crate:
//!
//! - [`FsObjectStore`]: each container is a directory under a root, keys
//!   are `/`-separated relative paths. Used by the CLI.
//! - [`MemoryObjectStore`]: a locked in-process map, for tests and embedding.

mod fs;
mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found: {container}/{key}")]
    NotFound { container: String, key: String },
    #[error("invalid object key: {0:?}")]
    InvalidKey(String),
    #[error("IO error on {container}/{key}: {source}")]
    Io {
        container: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Narrow interface to a blob store.
///
/// Implementations must be `Sync`: the orchestrator shares one handle across
/// its worker threads.
pub trait ObjectStore: Sync {
    /// All keys in `container` that start with `prefix`, in lexicographic order.
    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Full contents of an object.
    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or overwrite an object.
    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Copy `source_key` to `dest_key` within a container, overwriting the destination.
    fn copy(&self, container: &str, source_key: &str, dest_key: &str) -> Result<(), StorageError>;

    /// Remove an object. Deleting a missing key is an error.
    fn delete(&self, container: &str, key: &str) -> Result<(), StorageError>;

    /// Whether an object exists.
    fn exists(&self, container: &str, key: &str) -> Result<bool, StorageError> {
        match self.get(container, key) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        (**self).list(container, prefix)
    }

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).get(container, key)
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).put(container, key, bytes)
    }

    fn copy(&self, container: &str, source_key: &str, dest_key: &str) -> Result<(), StorageError> {
        (**self).copy(container, source_key, dest_key)
    }

    fn delete(&self, container: &str, key: &str) -> Result<(), StorageError> {
        (**self).delete(container, key)
    }

    fn exists(&self, container: &str, key: &str) -> Result<bool, StorageError> {
        (**self).exists(container, key)
    }
}

/// Reject keys that could escape a container or name nothing.
///
/// Keys are `/`-separated; empty, `.` and `..` segments and leading slashes
/// are refused.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
