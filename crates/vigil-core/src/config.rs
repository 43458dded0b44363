//! TOML configuration. Every field has a default so an absent file or an
//! empty table yields a working local-only setup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub capture: CaptureConfig,
    pub process: ProcessConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Which storage backend the factory should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Prefer remote, fall back to local on any initialization failure.
    #[default]
    Auto,
    Remote,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub mode: StorageMode,
    /// Base URL of the remote backend. Required for remote mode.
    pub remote_url: Option<String>,
    /// API key for the remote backend. Required for remote mode.
    pub api_key: Option<String>,
    /// Session snapshot path for the local adapter; the event log lives
    /// next to it with the extension replaced by `.jsonl`.
    pub local_path: PathBuf,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
    /// Hard cap on buffered events awaiting a flush; overflow drops the
    /// oldest entries.
    pub max_buffered_events: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Auto,
            remote_url: None,
            api_key: None,
            local_path: PathBuf::from("activity-session.json"),
            batch_size: 50,
            batch_timeout_ms: 3_000,
            max_buffered_events: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub pointer_interval_ms: u64,
    pub idle_check_interval_ms: u64,
    pub idle_threshold_ms: u64,
    pub geometry_interval_ms: u64,
    pub process_interval_ms: u64,
    /// Capacity of the capture → persistence queue; a full queue drops the
    /// newest event rather than stalling capture.
    pub queue_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            pointer_interval_ms: 500,
            idle_check_interval_ms: 30_000,
            idle_threshold_ms: 5 * 60 * 1_000,
            geometry_interval_ms: 5_000,
            process_interval_ms: 5_000,
            queue_capacity: 512,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub exclude_system_processes: bool,
    pub include_patterns: Vec<String>,
    pub extra_suspicious: Vec<String>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            exclude_system_processes: true,
            include_patterns: Vec::new(),
            extra_suspicious: Vec::new(),
        }
    }
}

impl ProcessConfig {
    pub fn to_classify_config(&self) -> crate::classify::ClassifyConfig {
        crate::classify::ClassifyConfig {
            exclude_system_processes: self.exclude_system_processes,
            include_patterns: self.include_patterns.clone(),
            extra_suspicious: self.extra_suspicious.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.mode, StorageMode::Auto);
        assert_eq!(config.storage.batch_size, 50);
        assert_eq!(config.capture.pointer_interval_ms, 500);
        assert_eq!(config.capture.idle_threshold_ms, 300_000);
        assert!(config.process.exclude_system_processes);
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            mode = "remote"
            remote_url = "https://telemetry.example.com"
            api_key = "anon-key"
            batch_size = 10

            [capture]
            process_interval_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.mode, StorageMode::Remote);
        assert_eq!(
            config.storage.remote_url.as_deref(),
            Some("https://telemetry.example.com")
        );
        assert_eq!(config.storage.batch_size, 10);
        // Untouched fields keep their defaults.
        assert_eq!(config.storage.batch_timeout_ms, 3_000);
        assert_eq!(config.capture.process_interval_ms, 1_000);
        assert_eq!(config.capture.geometry_interval_ms, 5_000);
    }

    #[test]
    fn process_section_parses_pattern_lists() {
        let config: Config = toml::from_str(
            r#"
            [process]
            include_patterns = ["svchost"]
            extra_suspicious = ["copilot-overlay"]
            "#,
        )
        .unwrap();

        let classify = config.process.to_classify_config();
        assert_eq!(classify.include_patterns, vec!["svchost".to_string()]);
        assert_eq!(classify.extra_suspicious, vec!["copilot-overlay".to_string()]);
    }
}
