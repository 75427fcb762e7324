//! Configuration loading from TOML files.
//!
//! Every value has a default, so the file is optional. CLI flags and
//! environment variables override what is loaded here.

use crate::error::{PapersError, Result};
use crate::survey::SurveyConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the current directory
const LOCAL_CONFIG: &str = "rustpapers.toml";

/// Global configuration for rustpapers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of `*.json` paper records
    pub papers_dir: PathBuf,
    pub survey: SurveyConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            papers_dir: PathBuf::from("Papers"),
            survey: SurveyConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./rustpapers.toml (current directory)
    /// 2. <config dir>/rustpapers/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(user) = user_config_path() {
            if user.exists() {
                return Self::from_file(&user);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            PapersError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// `<config dir>/rustpapers/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rustpapers").join("config.toml"))
}
