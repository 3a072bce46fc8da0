//! Shared test utilities for the bucket-resizer test suite.
//!
//! Provides plane and bitmap builders plus fault-injecting collaborators so
//! batch tests can exercise every failure branch without a real backend.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let inner = MemoryObjectStore::new();
//! inner.put("bucket", "image/a.bmp", &solid_bitmap(200, 100, [0, 0, 0])).unwrap();
//!
//! // Every `delete` of image/a.bmp now fails
//! let store = FaultyStore::new(&inner).fail(StoreOp::Delete, "image/a.bmp");
//! ```

use crate::imaging::{Dimensions, PixelPlane, bitmap};
use crate::notify::{NotificationError, Notifier};
use crate::store::{ObjectStore, StorageError};
use std::sync::Mutex;

// =========================================================================
// Plane and bitmap builders
// =========================================================================

/// A plane whose bytes encode their own position, so crops are traceable.
///
/// Pixel `(x, y)` is `[x as u8, y as u8, (x + y) as u8]`.
pub fn gradient_plane(width: u32, height: u32) -> PixelPlane {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8, y as u8, (x + y) as u8]);
        }
    }
    PixelPlane::new(Dimensions::new(width, height), pixels).unwrap()
}

/// Encoded bitmap of a single colour.
pub fn solid_bitmap(width: u32, height: u32, bgr: [u8; 3]) -> Vec<u8> {
    let plane = PixelPlane::filled(Dimensions::new(width, height), bgr).unwrap();
    bitmap::encode(&plane).unwrap()
}

// =========================================================================
// Fault-injecting store
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    List,
    Get,
    Put,
    Copy,
    Delete,
}

/// Wraps a store and fails chosen `(operation, key)` pairs.
///
/// For `Copy` the key is the source key; for `List` it is the prefix.
/// Every call that reaches the inner store is recorded.
pub struct FaultyStore<'a> {
    inner: &'a dyn ObjectStore,
    failures: Vec<(StoreOp, String)>,
    calls: Mutex<Vec<(StoreOp, String)>>,
}

impl<'a> FaultyStore<'a> {
    pub fn new(inner: &'a dyn ObjectStore) -> Self {
        Self {
            inner,
            failures: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(mut self, op: StoreOp, key: &str) -> Self {
        self.failures.push((op, key.to_string()));
        self
    }

    /// Calls forwarded to the inner store, in arrival order.
    pub fn calls(&self) -> Vec<(StoreOp, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, op: StoreOp, key: &str) -> Result<(), StorageError> {
        if self.failures.iter().any(|(o, k)| *o == op && k == key) {
            return Err(StorageError::Backend(format!("injected {op:?} failure on {key}")));
        }
        self.calls.lock().unwrap().push((op, key.to_string()));
        Ok(())
    }
}

impl ObjectStore for FaultyStore<'_> {
    fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.check(StoreOp::List, prefix)?;
        self.inner.list(container, prefix)
    }

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.check(StoreOp::Get, key)?;
        self.inner.get(container, key)
    }

    fn put(&self, container: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.check(StoreOp::Put, key)?;
        self.inner.put(container, key, bytes)
    }

    fn copy(&self, container: &str, source_key: &str, dest_key: &str) -> Result<(), StorageError> {
        self.check(StoreOp::Copy, source_key)?;
        self.inner.copy(container, source_key, dest_key)
    }

    fn delete(&self, container: &str, key: &str) -> Result<(), StorageError> {
        self.check(StoreOp::Delete, key)?;
        self.inner.delete(container, key)
    }

    fn exists(&self, container: &str, key: &str) -> Result<bool, StorageError> {
        self.inner.exists(container, key)
    }
}

// =========================================================================
// Failing notifier
// =========================================================================

/// Notifier that rejects every publish and counts the attempts.
#[derive(Default)]
pub struct FailingNotifier {
    attempts: Mutex<usize>,
}

impl FailingNotifier {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl Notifier for FailingNotifier {
    fn publish(&self, topic: &str, _message: &str) -> Result<(), NotificationError> {
        *self.attempts.lock().unwrap() += 1;
        Err(NotificationError::PublishFailed {
            topic: topic.to_string(),
            reason: "topic unavailable".to_string(),
        })
    }
}
