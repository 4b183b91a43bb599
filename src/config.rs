// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration loaded from `labelbench.yaml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "labelbench.yaml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV: &str = "LABELBENCH_CONFIG";

/// External detector command used to pre-fill unlabeled images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds between silent session saves; 0 disables auto-save.
    pub auto_save_secs: u64,
    pub resize_debounce_ms: u64,
    pub detector: Option<DetectorConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auto_save_secs: 300,
            resize_debounce_ms: 100,
            detector: None,
        }
    }
}

impl AppConfig {
    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_secs)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Malformed config {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration, falling back to defaults.
    ///
    /// A missing file is normal. A malformed one is logged and ignored.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load_or_default(&path)
    }

    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("{:#}", e);
                Self::default()
            }
        }
    }
}
