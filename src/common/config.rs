use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::errors::SweepError;
use crate::junk::catalog::CategorySpec;

/// Global diskbroom configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Large file threshold in MB (decimal, 1 MB = 1_000_000 bytes)
    #[serde(default = "default_large_file_mb")]
    pub large_file_threshold_mb: u64,

    /// Files smaller than this are ignored by the duplicate finder
    #[serde(default = "default_duplicate_min_size")]
    pub duplicate_min_size: u64,

    /// How many leading bytes feed the duplicate fingerprint
    #[serde(default = "default_fingerprint_bytes")]
    pub fingerprint_bytes: usize,

    /// Publish partial duplicate results every N size buckets
    #[serde(default = "default_publish_every")]
    pub publish_every: usize,

    /// Confirm prefix matches with a full-content hash
    #[serde(default)]
    pub verify_duplicates: bool,

    /// Worker threads for hashing and measuring (0 = one per core)
    #[serde(default)]
    pub max_workers: usize,

    /// Paths to exclude from scanning
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Also write logs to ~/.diskbroom/logs
    #[serde(default)]
    pub log_to_file: bool,

    /// Junk categories appended to the built-in catalog
    #[serde(default)]
    pub extra_categories: Vec<CategorySpec>,
}

fn default_large_file_mb() -> u64 {
    100
}
fn default_duplicate_min_size() -> u64 {
    1024
}
fn default_fingerprint_bytes() -> usize {
    8192
}
fn default_publish_every() -> usize {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            large_file_threshold_mb: default_large_file_mb(),
            duplicate_min_size: default_duplicate_min_size(),
            fingerprint_bytes: default_fingerprint_bytes(),
            publish_every: default_publish_every(),
            verify_duplicates: false,
            max_workers: 0,
            exclude_paths: Vec::new(),
            log_to_file: false,
            extra_categories: Vec::new(),
        }
    }
}

impl Config {
    /// Get the diskbroom data directory (~/.diskbroom)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".diskbroom")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from file, or defaults if it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| SweepError::Config {
                    path: path.to_path_buf(),
                    message: e.message().to_string(),
                })
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            // A zero-byte prefix would fingerprint nothing
            config.fingerprint_bytes = config.fingerprint_bytes.max(1);
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Create the data and logs directories
    pub fn init_dirs() -> Result<()> {
        for dir in [Self::data_dir(), Self::logs_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Get large file threshold in bytes
    pub fn large_file_threshold_bytes(&self) -> u64 {
        self.large_file_threshold_mb.saturating_mul(1_000_000)
    }

    /// Resolved worker count, never zero
    pub fn worker_count(&self) -> usize {
        if self.max_workers > 0 {
            self.max_workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}
