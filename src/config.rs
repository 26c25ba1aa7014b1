//! Run configuration module.
//!
//! Handles loading, validating, and layering `sobel.toml`. Configuration is
//! hierarchical: stock defaults are overridden by the config file, which is
//! overridden by command-line flags.
//!
//! ## Config File Location
//!
//! Pass `--config <FILE>` explicitly, or place `sobel.toml` in the working
//! directory. Without either, the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [image]
//! # width = 30000          # Expected input width (omit to accept any)
//! # height = 22943         # Expected input height (omit to accept any)
//!
//! [io]
//! input = "Large_image.jpg"
//! output = "Large_image_edge.jpg"
//! quality = 95             # JPEG quality (1-100), ignored for PNG output
//!
//! [processing]
//! # threads = 8            # Worker threads (omit for auto = CPU cores)
//! strategy = "row-chunked" # row-chunked | index-chunked | private-buffer-merge | serial
//! clip_threshold = 255     # Magnitudes above this become 255
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::partition::{MAX_THREADS, PartitionStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "sobel.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("image dimensions must both be greater than 2, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}

/// Edge detection configuration loaded from `sobel.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeConfig {
    /// Expected input dimensions.
    pub image: ImageConfig,
    /// Input and output files.
    pub io: IoConfig,
    /// Partitioning and filter settings.
    pub processing: ProcessingConfig,
}

impl EdgeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("width", self.image.width), ("height", self.image.height)] {
            if value.is_some_and(|v| v <= 2) {
                return Err(ConfigError::Validation(format!(
                    "image.{key} must be greater than 2"
                )));
            }
        }
        if !(1..=100).contains(&self.io.quality) {
            return Err(ConfigError::Validation("io.quality must be 1-100".into()));
        }
        if self.processing.clip_threshold > 255 {
            return Err(ConfigError::Validation(
                "processing.clip_threshold must be 0-255".into(),
            ));
        }
        if let Some(threads) = self.processing.threads
            && !(1..=MAX_THREADS).contains(&threads)
        {
            return Err(ConfigError::Validation(format!(
                "processing.threads must be 1-{MAX_THREADS}, got {threads}"
            )));
        }
        Ok(())
    }
}

/// Expected image dimensions. Either may be set on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    pub width: Option<usize>,
    pub height: Option<usize>,
}

/// Input and output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IoConfig {
    /// RGB image to read (JPEG or PNG, detected from contents).
    pub input: PathBuf,
    /// Edge map to write; `.jpg`/`.jpeg` or `.png`.
    pub output: PathBuf,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("Large_image.jpg"),
            output: PathBuf::from("Large_image_edge.jpg"),
            quality: 95,
        }
    }
}

/// Parallel processing and filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of worker threads.
    /// When absent or null, defaults to the number of CPU cores.
    pub threads: Option<usize>,
    /// How the work is divided among workers.
    pub strategy: PartitionStrategy,
    /// Gradient magnitudes strictly above this value are written as 255.
    pub clip_threshold: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: None,
            strategy: PartitionStrategy::default(),
            clip_threshold: 255,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → exactly `n`; range checked by [`EdgeConfig::validate`]
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    config.threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EdgeConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value. The file must exist.
pub fn read_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `sobel.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `sobel.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    read_config_file(&config_path).map(Some)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EdgeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EdgeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the layered config: stock defaults, then the config file, then
/// `cli_overlay`.
///
/// The file is `explicit` when given (and must exist), otherwise
/// `sobel.toml` in `search_dir` if present.
pub fn load_config(
    explicit: Option<&Path>,
    search_dir: &Path,
    cli_overlay: Option<toml::Value>,
) -> Result<EdgeConfig, ConfigError> {
    let file = match explicit {
        Some(path) => Some(read_config_file(path)?),
        None => load_raw_config(search_dir)?,
    };
    let base = match file {
        Some(file) => merge_toml(stock_defaults_value(), file),
        None => stock_defaults_value(),
    };
    resolve_config(base, cli_overlay)
}

/// Returns a fully-commented stock `sobel.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Sobel Edges Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Layering, lowest to highest priority:
#   stock defaults -> this file -> command-line flags
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Expected input dimensions
# ---------------------------------------------------------------------------
[image]
# When set, inputs of any other size are rejected before decoding.
# Both must be greater than 2.
# width = 30000
# height = 22943

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
[io]
# RGB input image. JPEG and PNG are detected from the file contents.
input = "Large_image.jpg"

# Edge map output. The extension picks the format: .jpg, .jpeg or .png.
output = "Large_image_edge.jpg"

# JPEG encoding quality (1 = worst, 100 = best). Ignored for PNG.
quality = 95

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Worker threads (1-256).
# Omit or comment out to auto-detect (= number of CPU cores).
# threads = 8

# How work is divided among workers. Every strategy produces the same bytes.
#   row-chunked          - contiguous bands of rows, written in place
#   index-chunked        - contiguous ranges of interior pixel indices
#   private-buffer-merge - per-worker buffers copied in under a lock
#   serial               - one worker, no thread pool
strategy = "row-chunked"

# Gradient magnitudes above this value are written as 255 (0-255).
# 255 is plain saturation; 128 gives a harder, more binary edge map.
clip_threshold = 255
"##
}
