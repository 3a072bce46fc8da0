//! # Bucket Resizer
//!
//! A batch job that walks an object-store container, resizes every
//! unprocessed bitmap under a key prefix into a fixed bounding box, marks the
//! original as processed, and announces each result on a notification topic.
//!
//! # Architecture: Per-Item Pipeline
//!
//! ```text
//! list(container, prefix)
//!   └── for each unprocessed key (in parallel)
//!         fetch → decode → resize → encode → store → mark processed → notify
//! ```
//!
//! The orchestrator never reaches for ambient state: the object store, the
//! notifier and the processing-state tracker are all passed in. The CLI wires
//! a directory-backed store and a log-backed notifier; tests wire in-memory
//! doubles.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Orchestrator: listing, skip policy, parallel per-item pipeline, batch summary |
//! | [`imaging`] | Bitmap codec, target-dimension math, center crop/pad resize |
//! | [`store`] | `ObjectStore` trait with filesystem and in-memory backends |
//! | [`state`] | `ProcessingStateTracker` trait and the key-suffix tracker |
//! | [`notify`] | `Notifier` trait, completion message, log and in-memory notifiers |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting for batch results |
//!
//! # Design Decisions
//!
//! ## Processed State Lives in the Key
//!
//! An object is processed when its key ends with the processed suffix. There
//! is no manifest or database to drift out of sync with the store: listing
//! the container *is* reading the state. The cost is that marking is a copy
//! plus a delete with no transaction, so a failed delete leaves a visible
//! duplicate, reported per item in the summary.
//!
//! ## Failures Stay Local
//!
//! One corrupt object never aborts the batch. Every per-item error is
//! recorded with the stage it happened in; only a failed listing stops the
//! run, since without it there is nothing to do.
//!
//! ## Pure-Rust Bitmap Handling
//!
//! The codec reads and writes uncompressed 24-bit bitmaps directly. Resizing
//! is a center crop or pad onto a white canvas; there is no resampling, so
//! output pixels are always exact copies of source pixels.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod notify;
pub mod output;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
