//! Batch configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user config file overrides any subset of keys, and CLI
//! flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! container = "images"               # Container (bucket) holding the images
//! prefix = "image/"                  # Only keys starting with this are scanned
//! topic = "image-processed"          # Notification topic
//! processed_suffix = "_processed.jpg"
//!
//! [target]
//! width = 100                        # Bounding box for resized output
//! height = 100
//!
//! [processing]
//! max_processes = 4                  # Max parallel workers (omit for auto = CPU cores)
//! item_timeout_secs = 30             # Per-item deadline
//! skip_when_companion_exists = false # Also skip keys whose processed copy exists
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Dimensions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Batch configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Container (bucket) to scan.
    pub container: String,
    /// Key prefix to scan within the container.
    pub prefix: String,
    /// Topic completion notifications are published to.
    pub topic: String,
    /// Suffix that marks a key as processed.
    pub processed_suffix: String,
    /// Bounding box for resized output.
    pub target: TargetConfig,
    /// Worker pool and per-item limits.
    pub processing: ProcessingConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            container: "images".to_string(),
            prefix: "image/".to_string(),
            topic: "image-processed".to_string(),
            processed_suffix: crate::state::DEFAULT_SUFFIX.to_string(),
            target: TargetConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.container.trim().is_empty() {
            return Err(ConfigError::Validation("container must not be empty".into()));
        }
        if self.topic.trim().is_empty() {
            return Err(ConfigError::Validation("topic must not be empty".into()));
        }
        if self.processed_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "processed_suffix must not be empty".into(),
            ));
        }
        if self.target.width == 0 || self.target.height == 0 {
            return Err(ConfigError::Validation(
                "target.width and target.height must be non-zero".into(),
            ));
        }
        if self.processing.item_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "processing.item_timeout_secs must be non-zero".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Bounding box for resized images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
        }
    }
}

impl TargetConfig {
    pub fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Deadline for a single item's whole pipeline, in seconds.
    pub item_timeout_secs: u64,
    /// Treat a key as processed when `key + processed_suffix` already exists.
    pub skip_when_companion_exists: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processes: None,
            item_timeout_secs: 30,
            skip_when_companion_exists: false,
        }
    }
}

impl ProcessingConfig {
    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BatchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BatchConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file, or stock defaults when `path` is `None`.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<BatchConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# Bucket Resizer Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Container (bucket) holding the source images. With the filesystem store
# this is a directory directly under --root.
container = "images"

# Only keys starting with this prefix are considered.
prefix = "image/"

# Topic that receives one message per processed image.
topic = "image-processed"

# Suffix appended to a key once it has been processed. Listed keys that
# already end with it are skipped.
processed_suffix = "_processed.jpg"

# ---------------------------------------------------------------------------
# Output size
# ---------------------------------------------------------------------------
[target]
# Bounding box. Landscape images take the full width, everything else the
# full height; the other edge follows the source aspect ratio.
width = 100
height = 100

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit to use one per CPU core.
# Values above the core count are clamped down.
# max_processes = 4

# Seconds a single image may take from fetch to notification before it is
# recorded as timed out.
item_timeout_secs = 30

# Also skip a key when its processed copy (key + processed_suffix) already
# exists in the container.
skip_when_companion_exists = false
"##
}
