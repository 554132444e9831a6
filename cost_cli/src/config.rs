//! Application configuration management
//!
//! Handles loading configuration from ~/.sectio/config.toml

use std::path::PathBuf;

use anyhow::{Context, Result};
use cost_core::AllocationSettings;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output format when `--format` is not given
    #[serde(default)]
    pub output: OutputFormat,

    /// Name recorded in lock files
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Settings of the projects the CLI creates
    #[serde(rename = "parametres", default)]
    pub settings: AllocationSettings,
}

fn default_user_id() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "sectio".to_string())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            user_id: default_user_id(),
            settings: AllocationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(".sectio"))
    }

    /// Load the default configuration file, if there is one
    pub fn load() -> Result<Self> {
        match Self::config_dir().map(|dir| dir.join("config.toml")) {
            Some(path) if path.exists() => Self::load_from(&path.to_string_lossy()),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }
}
