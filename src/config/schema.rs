//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Page discovery conventions.
    pub discovery: DiscoveryConfig,

    /// File watching settings.
    pub watch: WatchConfig,

    /// History backend selection.
    pub history: HistoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// How page files map onto routes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Root directory holding page files.
    pub pages_dir: PathBuf,

    /// Source extensions considered page files (without the dot).
    pub extensions: Vec<String>,

    /// Base name (extension stripped) of a layout file.
    pub layout_marker: String,

    /// Prefix marking a dynamic segment (`$id` -> `:id`).
    pub dynamic_prefix: String,

    /// Base name collapsed onto its directory (`/a/index` -> `/a`).
    pub index_name: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pages_dir: PathBuf::from("src/pages"),
            extensions: ["js", "jsx", "ts", "tsx"].iter().map(|s| s.to_string()).collect(),
            layout_marker: "_layout".to_string(),
            dynamic_prefix: "$".to_string(),
            index_name: "index".to_string(),
        }
    }
}

/// File watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval used by polling backends, in milliseconds.
    pub poll_interval_ms: u64,

    /// Quiet period after the first event of a burst before rebuilding.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            debounce_ms: 50,
        }
    }
}

/// Location backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    #[default]
    Browser,
    Hash,
    Memory,
}

/// History configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub mode: HistoryMode,

    /// Document URL the browser and hash backends start from.
    pub base_url: String,

    /// Entries a memory history starts with; the last one is current.
    pub initial_entries: Vec<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            mode: HistoryMode::Browser,
            base_url: "http://localhost/".to_string(),
            initial_entries: vec!["/".to_string()],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
