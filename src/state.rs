//! Processing state: which objects are done, and how to mark them done.
//!
//! Each object moves through two states, `unprocessed → processed`. The
//! default [`SuffixTracker`] encodes the state in the key itself: a key that
//! ends with the processed suffix is done, and marking `key` done means
//! copying it to `key + suffix` and deleting `key`. There is no other record
//! of completion.
//!
//! ## Partial failure
//!
//! Copy and delete are separate store calls with no transaction around them.
//! If the copy lands but the delete fails, both objects remain and
//! [`StateTransitionError::DeleteFailed`] carries the [`ProcessingRecord`]
//! describing the duplicate so an operator (or a later job) can reconcile it.
//! Nothing is rolled back.

use crate::store::{ObjectStore, StorageError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Default processed-marker suffix.
pub const DEFAULT_SUFFIX: &str = "_processed.jpg";

/// Association between an original key and its processed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingRecord {
    pub container: String,
    pub original_key: String,
    pub processed_key: String,
}

#[derive(Error, Debug)]
pub enum StateTransitionError {
    /// Nothing changed: the original is still in place and unmarked.
    #[error("copy {} -> {} failed: {source}", .record.original_key, .record.processed_key)]
    CopyFailed {
        record: ProcessingRecord,
        #[source]
        source: StorageError,
    },
    /// The copy exists but the original could not be removed.
    #[error(
        "delete of {} failed after copy to {}; both objects remain: {source}",
        .record.original_key,
        .record.processed_key
    )]
    DeleteFailed {
        record: ProcessingRecord,
        #[source]
        source: StorageError,
    },
}

impl StateTransitionError {
    pub fn record(&self) -> &ProcessingRecord {
        match self {
            Self::CopyFailed { record, .. } | Self::DeleteFailed { record, .. } => record,
        }
    }

    /// True when the failure left the original and its processed copy side by side.
    pub fn leaves_duplicate(&self) -> bool {
        matches!(self, Self::DeleteFailed { .. })
    }
}

/// Decides which objects are done and records completion.
///
/// The orchestrator only talks to this trait, so the key-suffix convention
/// can be swapped for another marker without touching the batch loop.
pub trait ProcessingStateTracker: Sync {
    /// Whether a listed key is already in the processed state.
    fn is_processed(&self, key: &str) -> bool;

    /// Key the processed output of `key` is stored under.
    fn processed_key(&self, key: &str) -> String;

    /// Move `key` into the processed state.
    fn mark_processed(
        &self,
        store: &dyn ObjectStore,
        container: &str,
        key: &str,
    ) -> Result<ProcessingRecord, StateTransitionError>;

    /// Whether the processed companion of `key` already exists in the store.
    fn has_companion(
        &self,
        store: &dyn ObjectStore,
        container: &str,
        key: &str,
    ) -> Result<bool, StorageError> {
        store.exists(container, &self.processed_key(key))
    }
}

/// Marker-by-key-suffix tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixTracker {
    suffix: String,
}

impl SuffixTracker {
    /// Tracker using `suffix`. An empty suffix would make every key look
    /// processed; callers validate it (see `BatchConfig::validate`).
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for SuffixTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}

impl ProcessingStateTracker for SuffixTracker {
    fn is_processed(&self, key: &str) -> bool {
        key.ends_with(&self.suffix)
    }

    fn processed_key(&self, key: &str) -> String {
        format!("{key}{}", self.suffix)
    }

    fn mark_processed(
        &self,
        store: &dyn ObjectStore,
        container: &str,
        key: &str,
    ) -> Result<ProcessingRecord, StateTransitionError> {
        let record = ProcessingRecord {
            container: container.to_string(),
            original_key: key.to_string(),
            processed_key: self.processed_key(key),
        };

        if let Err(source) = store.copy(container, key, &record.processed_key) {
            return Err(StateTransitionError::CopyFailed { record, source });
        }
        debug!(container, key, processed_key = %record.processed_key, "copied to processed key");

        if let Err(source) = store.delete(container, key) {
            warn!(
                container,
                key,
                processed_key = %record.processed_key,
                error = %source,
                "delete failed after copy; original and processed copy both remain"
            );
            return Err(StateTransitionError::DeleteFailed { record, source });
        }

        Ok(record)
    }
}
