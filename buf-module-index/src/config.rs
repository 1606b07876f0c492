//! Configuration management for buf-module-index

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Directories skipped while scanning unless configured otherwise
const DEFAULT_EXCLUDES: &[&str] = &[".git", "node_modules", "target"];

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Workspace scan configuration
    pub scan: ScanConfig,
    /// Output configuration
    pub output: OutputConfig,
}

/// Workspace scan configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names never descended into
    pub exclude: Vec<String>,
    /// Maximum directory depth below the scan root
    pub max_depth: Option<usize>,
    /// Follow symbolic links
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            max_depth: None,
            follow_links: false,
        }
    }
}

impl ScanConfig {
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.exclude.iter().any(|e| e == dir_name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Config {
    /// Parse configuration from a JSON value, falling back to defaults
    pub fn from_init_options(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Invalid configuration, using defaults: {e}");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}
