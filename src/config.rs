//! Build configuration.
//!
//! Handles loading, validating, and merging `pagewrap.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top, so a
//! config file only needs the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_dir = "content"                    # Fragment tree (read-only)
//! output_dir = "generated_html"              # Rendered tree (owned by pagewrap)
//! template = "sample_template.html"          # Template every fragment is wrapped in
//! snapshot_file = ".pagewrap-snapshot.json"  # Modification-time snapshot
//! ignore = []                                # Output path suffixes never rendered
//! fail_fast = false                          # Abort a cycle on the first render error
//!
//! [watch]
//! poll_interval_ms = 1000                    # Delay between change checks
//!
//! # Optional. When present, every template must be listed here.
//! [converters]
//! "toolbox_template.html" = "toolbox"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "pagewrap.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Built-in converters selectable from `[converters]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    /// `<title>` / `<body>` marker renderer.
    Default,
    /// `PAGE TITLE` / `HEADER TITLE` / `CONTENT` / `FILENAME` renderer with breadcrumbs.
    Toolbox,
}

/// Build configuration loaded from `pagewrap.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory holding the fragment tree.
    pub content_dir: PathBuf,
    /// Directory the rendered tree is written to.
    pub output_dir: PathBuf,
    /// Template every fragment is wrapped in.
    pub template: PathBuf,
    /// Where the modification-time snapshot is persisted.
    pub snapshot_file: PathBuf,
    /// Output path suffixes that are copied but never rendered.
    pub ignore: Vec<String>,
    /// Abort the cycle on the first render error instead of isolating it.
    pub fail_fast: bool,
    /// Polling settings for `watch`.
    pub watch: WatchConfig,
    /// Template basename → converter. `None` means "use the default renderer".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converters: Option<BTreeMap<String, ConverterKind>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("generated_html"),
            template: PathBuf::from("sample_template.html"),
            snapshot_file: PathBuf::from(".pagewrap-snapshot.json"),
            ignore: Vec::new(),
            fail_fast: false,
            watch: WatchConfig::default(),
            converters: None,
        }
    }
}

impl SiteConfig {
    /// Validate config values are usable before any tree is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, path) in [
            ("content_dir", &self.content_dir),
            ("output_dir", &self.output_dir),
            ("template", &self.template),
            ("snapshot_file", &self.snapshot_file),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.poll_interval_ms must be greater than 0".into(),
            ));
        }
        if self.ignore.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "ignore entries must not be empty".into(),
            ));
        }
        let content = std::path::absolute(&self.content_dir)?;
        let output = std::path::absolute(&self.output_dir)?;
        if content.starts_with(&output) || output.starts_with(&content) {
            return Err(ConfigError::Validation(format!(
                "output_dir {} must not overlap content_dir {}",
                self.output_dir.display(),
                self.content_dir.display()
            )));
        }
        // Files the tool writes or reads itself must not be picked up as content.
        for (name, path) in [
            ("snapshot_file", &self.snapshot_file),
            ("template", &self.template),
        ] {
            if std::path::absolute(path)?.starts_with(&content) {
                return Err(ConfigError::Validation(format!(
                    "{name} {} must not be inside content_dir {}",
                    path.display(),
                    self.content_dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Milliseconds between change checks.
    pub poll_interval_ms: u64,
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value and deserialize.
///
/// Validation is left to the caller so command-line overrides can be applied
/// first.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
///
/// Unknown keys are rejected. The result is not yet validated.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pagewrap.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pagewrap configuration
# ======================
# All settings are optional. Values shown are the defaults.
# Relative paths are resolved from the working directory.

# Directory holding the HTML fragments. Never modified.
content_dir = "content"

# Directory the rendered site is written to. A full build deletes and
# recreates it, so never point it at anything you want to keep.
output_dir = "generated_html"

# Template every fragment is wrapped in.
template = "sample_template.html"

# Modification-time snapshot used by `update` and `watch`.
snapshot_file = ".pagewrap-snapshot.json"

# Output path suffixes that are copied verbatim and never rendered.
# Matching is a plain suffix comparison on '/'-separated paths.
ignore = []

# Stop the whole cycle on the first fragment that fails to render.
# When false, failures are reported per file and retried next cycle.
fail_fast = false

# ---------------------------------------------------------------------------
# Watch mode
# ---------------------------------------------------------------------------
[watch]
# Delay between change checks, in milliseconds.
poll_interval_ms = 1000

# ---------------------------------------------------------------------------
# Converters
# ---------------------------------------------------------------------------
# Map a template file name to a built-in converter ("default" or "toolbox").
# Once this table exists, the template in use MUST be listed in it.
#
# [converters]
# "toolbox_template.html" = "toolbox"
"##
}
