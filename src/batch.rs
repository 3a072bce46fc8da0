//! Batch orchestration: list, filter, and drive every object through the pipeline.
//!
//! ```text
//! list(prefix)
//!   └── per key (parallel, rayon)
//!         skip if already processed
//!         fetch → decode → resize → encode → store → mark processed → notify
//! ```
//!
//! ## Failure isolation
//!
//! A failing item never stops the batch. Decode, dimension, storage and
//! state-transition errors end the *current* item and are recorded in its
//! [`ItemOutcome`]; the remaining items run normally. A failed notification
//! is logged and recorded as `notified: false` but the item still counts as
//! succeeded. The only batch-level error is a failed listing.
//!
//! The batch reports status `200` whenever it ran, even if some items
//! failed: inspect [`BatchSummary::failed`] for per-item health.
//!
//! ## Concurrency
//!
//! Keys are de-duplicated before dispatch, so no two workers ever mark the
//! same key. Stages within one item run strictly in order. Notifications
//! from different items arrive in no particular order; outcomes are
//! reported in listing order.
//!
//! ## Timeouts
//!
//! Each item has a deadline measured from the moment it starts. The deadline
//! is checked before every stage up to and including the mark; an expired
//! item is recorded as [`ErrorKind::Timeout`] and left untouched from that
//! stage on. Work already in flight inside a stage is not interrupted.

use crate::config::BatchConfig;
use crate::imaging::{Dimensions, ImagingError, bitmap, resize};
use crate::notify::{Notifier, completion_message};
use crate::state::{ProcessingRecord, ProcessingStateTracker, StateTransitionError};
use crate::store::{ObjectStore, StorageError};
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

/// Status reported for every batch that ran to completion.
pub const STATUS_OK: u16 = 200;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("listing {container}/{prefix} failed: {source}")]
    List {
        container: String,
        prefix: String,
        #[source]
        source: StorageError,
    },
}

/// Pipeline stage an item was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lookup,
    Fetch,
    Decode,
    Resize,
    Encode,
    Store,
    Mark,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Lookup => "lookup",
            Stage::Fetch => "fetch",
            Stage::Decode => "decode",
            Stage::Resize => "resize",
            Stage::Encode => "encode",
            Stage::Store => "store",
            Stage::Mark => "mark",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("{stage} failed: {source}")]
    Imaging {
        stage: Stage,
        #[source]
        source: ImagingError,
    },
    #[error("{stage} failed: {source}")]
    Storage {
        stage: Stage,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),
    #[error("timed out before {stage} after {elapsed:?}")]
    Timeout { stage: Stage, elapsed: Duration },
}

impl ItemError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Imaging { stage, .. } | Self::Storage { stage, .. } | Self::Timeout { stage, .. } => {
                *stage
            }
            Self::StateTransition(_) => Stage::Mark,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Imaging {
                source: ImagingError::MalformedImage(_),
                ..
            } => ErrorKind::MalformedImage,
            Self::Imaging {
                source: ImagingError::InvalidDimensions(_),
                ..
            } => ErrorKind::InvalidDimensions,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::StateTransition(_) => ErrorKind::StateTransition,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

/// Failure category recorded for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedImage,
    InvalidDimensions,
    Storage,
    StateTransition,
    Timeout,
}

/// Why a listed key was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The key itself carries the processed marker.
    AlreadyProcessed,
    /// The key's processed companion already exists.
    CompanionExists,
}

/// What happened to one listed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Succeeded {
        processed_key: String,
        width: u32,
        height: u32,
        notified: bool,
    },
    Failed {
        stage: Stage,
        kind: ErrorKind,
        message: String,
        /// Set when the original and its processed copy were both left behind.
        #[serde(skip_serializing_if = "Option::is_none")]
        duplicate: Option<ProcessingRecord>,
    },
    Skipped {
        reason: SkipReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub key: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, ItemStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ItemStatus::Skipped { .. })
    }
}

/// Counts and per-item outcomes for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub container: String,
    pub prefix: String,
    /// Items that entered the pipeline (`succeeded + failed`).
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// One entry per listed key, in listing order.
    pub items: Vec<ItemOutcome>,
}

impl BatchSummary {
    fn from_outcomes(container: &str, prefix: &str, items: Vec<ItemOutcome>) -> Self {
        let succeeded = items.iter().filter(|i| i.is_success()).count();
        let failed = items.iter().filter(|i| i.is_failure()).count();
        let skipped = items.iter().filter(|i| i.is_skipped()).count();
        Self {
            container: container.to_string(),
            prefix: prefix.to_string(),
            attempted: succeeded + failed,
            succeeded,
            failed,
            skipped,
            items,
        }
    }
}

/// `{status, summary}` returned by [`BatchOrchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub status: u16,
    pub summary: BatchSummary,
}

/// Knobs for a batch that are not collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Topic completion messages are published to.
    pub topic: String,
    /// Per-item deadline.
    pub item_timeout: Duration,
    /// Also skip keys whose processed companion already exists.
    pub skip_when_companion_exists: bool,
}

impl BatchOptions {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            item_timeout: config.processing.item_timeout(),
            skip_when_companion_exists: config.processing.skip_when_companion_exists,
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&BatchConfig::default())
    }
}

/// Successful pipeline run for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedItem {
    pub record: ProcessingRecord,
    pub dimensions: Dimensions,
}

/// Drives listed objects through fetch → decode → resize → encode → store →
/// mark → notify.
///
/// All collaborators are injected; the orchestrator holds no global state.
/// References work too (`&MemoryObjectStore` is an [`ObjectStore`]), which is
/// how tests keep access to the store after a run.
pub struct BatchOrchestrator<S, N, T> {
    store: S,
    notifier: N,
    tracker: T,
    options: BatchOptions,
}

impl<S, N, T> BatchOrchestrator<S, N, T>
where
    S: ObjectStore,
    N: Notifier,
    T: ProcessingStateTracker,
{
    pub fn new(store: S, notifier: N, tracker: T, options: BatchOptions) -> Self {
        Self {
            store,
            notifier,
            tracker,
            options,
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Process every unprocessed object under `prefix` in `container`.
    pub fn run(
        &self,
        container: &str,
        prefix: &str,
        bound: Dimensions,
    ) -> Result<BatchResult, BatchError> {
        let mut keys = self
            .store
            .list(container, prefix)
            .map_err(|source| BatchError::List {
                container: container.to_string(),
                prefix: prefix.to_string(),
                source,
            })?;
        keys.sort();
        keys.dedup();

        info!(container, prefix, keys = keys.len(), %bound, "starting batch");

        let items: Vec<ItemOutcome> = keys
            .par_iter()
            .map(|key| self.handle_key(container, key, bound))
            .collect();

        let summary = BatchSummary::from_outcomes(container, prefix, items);
        info!(
            container,
            prefix,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "batch complete"
        );

        Ok(BatchResult {
            status: STATUS_OK,
            summary,
        })
    }

    fn handle_key(&self, container: &str, key: &str, bound: Dimensions) -> ItemOutcome {
        let status = match self.skip_reason(container, key) {
            Ok(Some(reason)) => ItemStatus::Skipped { reason },
            Ok(None) => match self.process_item(container, key, bound) {
                Ok(item) => {
                    let notified = self.notify(container, &item.record.processed_key);
                    info!(
                        container,
                        key,
                        processed_key = %item.record.processed_key,
                        dimensions = %item.dimensions,
                        "item processed"
                    );
                    ItemStatus::Succeeded {
                        processed_key: item.record.processed_key,
                        width: item.dimensions.width,
                        height: item.dimensions.height,
                        notified,
                    }
                }
                Err(err) => failed(container, key, err),
            },
            Err(err) => failed(container, key, err),
        };
        ItemOutcome {
            key: key.to_string(),
            status,
        }
    }

    fn skip_reason(&self, container: &str, key: &str) -> Result<Option<SkipReason>, ItemError> {
        if self.tracker.is_processed(key) {
            return Ok(Some(SkipReason::AlreadyProcessed));
        }
        if self.options.skip_when_companion_exists {
            let exists = self
                .tracker
                .has_companion(&self.store, container, key)
                .map_err(|source| ItemError::Storage {
                    stage: Stage::Lookup,
                    source,
                })?;
            if exists {
                return Ok(Some(SkipReason::CompanionExists));
            }
        }
        Ok(None)
    }

    /// Run one key through fetch → decode → resize → encode → store → mark.
    ///
    /// Does not consult the skip policy and does not notify.
    pub fn process_item(
        &self,
        container: &str,
        key: &str,
        bound: Dimensions,
    ) -> Result<ProcessedItem, ItemError> {
        let deadline = Deadline::start(self.options.item_timeout);

        deadline.check(Stage::Fetch)?;
        let bytes = self
            .store
            .get(container, key)
            .map_err(|source| ItemError::Storage {
                stage: Stage::Fetch,
                source,
            })?;

        deadline.check(Stage::Decode)?;
        let plane = bitmap::decode(&bytes).map_err(|source| ItemError::Imaging {
            stage: Stage::Decode,
            source,
        })?;

        deadline.check(Stage::Resize)?;
        let resized = resize(&plane, bound).map_err(|source| ItemError::Imaging {
            stage: Stage::Resize,
            source,
        })?;

        deadline.check(Stage::Encode)?;
        let encoded = bitmap::encode(&resized).map_err(|source| ItemError::Imaging {
            stage: Stage::Encode,
            source,
        })?;

        deadline.check(Stage::Store)?;
        let processed_key = self.tracker.processed_key(key);
        self.store
            .put(container, &processed_key, &encoded)
            .map_err(|source| ItemError::Storage {
                stage: Stage::Store,
                source,
            })?;

        deadline.check(Stage::Mark)?;
        let record = self.tracker.mark_processed(&self.store, container, key)?;

        Ok(ProcessedItem {
            record,
            dimensions: resized.dimensions(),
        })
    }

    /// Publish the completion message. Failures are logged, never raised.
    fn notify(&self, container: &str, processed_key: &str) -> bool {
        let message = completion_message(container, processed_key);
        match self.notifier.publish(&self.options.topic, &message) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    container,
                    processed_key,
                    topic = %self.options.topic,
                    error = %err,
                    "notification failed"
                );
                false
            }
        }
    }
}

fn failed(container: &str, key: &str, err: ItemError) -> ItemStatus {
    let duplicate = match &err {
        ItemError::StateTransition(e) if e.leaves_duplicate() => Some(e.record().clone()),
        _ => None,
    };
    error!(
        container,
        key,
        stage = %err.stage(),
        error = %err,
        duplicate = duplicate.is_some(),
        "item failed"
    );
    ItemStatus::Failed {
        stage: err.stage(),
        kind: err.kind(),
        message: err.to_string(),
        duplicate,
    }
}

/// Per-item deadline, checked between stages.
struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self, stage: Stage) -> Result<(), ItemError> {
        let elapsed = self.started.elapsed();
        if elapsed >= self.limit {
            return Err(ItemError::Timeout { stage, elapsed });
        }
        Ok(())
    }
}
