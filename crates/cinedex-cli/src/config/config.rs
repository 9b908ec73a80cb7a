//! `AppConfig` struct and TOML read/write.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default image delivery base URL.
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500/";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Guest session settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Image delivery settings.
    #[serde(default)]
    pub images: ImagesConfig,
}

/// Guest session configuration. Holds the one persisted identifier.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Persisted guest session identifier.
    #[serde(default)]
    pub guest_session_id: Option<String>,
}

/// Image delivery configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImagesConfig {
    /// Base URL poster path fragments are joined onto.
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
    /// Hosts poster URLs may point at.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

fn default_image_base_url() -> String {
    String::from(DEFAULT_IMAGE_BASE_URL)
}

fn default_allowed_hosts() -> Vec<String> {
    vec![String::from("image.tmdb.org")]
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}
