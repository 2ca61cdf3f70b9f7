// src/config/app.rs
use super::defaults::*;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

use crate::consts::DEFAULT_CONFIG_FILE;
use crate::enums::EnvelopeVersion;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_paths")]
    pub paths: Paths,
    #[serde(default)]
    pub sharing: Sharing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paths {
    pub store_dir: String,
    pub index_db: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sharing {
    /// Envelope version written for new shares
    #[serde(default)]
    pub default_version: EnvelopeVersion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            sharing: Sharing::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Environment variables win over the file
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("IRYSHARE_STORE_DIR") {
            self.paths.store_dir = dir;
        }
        if let Ok(db) = std::env::var("IRYSHARE_INDEX_DB") {
            self.paths.index_db = db;
        }
    }
}

/// Read a config file without touching the global
pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let mut conf = Config::from_toml_str(&content)?;
    conf.apply_env_overrides();
    Ok(conf)
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Global config: loaded once, falls back to defaults if missing or invalid
pub fn load() -> &'static Config {
    CONFIG.get_or_init(|| {
        let config_path =
            std::env::var("IRYSHARE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&config_path).exists() {
            warn!(path = %config_path, "config file not found, using built-in defaults");
            let mut conf = Config::default();
            conf.apply_env_overrides();
            return conf;
        }

        load_from(&config_path).unwrap_or_else(|err| {
            warn!(path = %config_path, error = %err, "invalid config, using built-in defaults");
            let mut conf = Config::default();
            conf.apply_env_overrides();
            conf
        })
    })
}
