//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`] on top of a single JSON document.  Missing
//! fields take their defaults (`#[serde(default)]` on [`HubConfig`]), a
//! missing file means first boot, and every save is validated first.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::HubConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<HubConfig, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        let cfg: HubConfig = serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("Config: loaded from {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &HubConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string(config).map_err(|_| ConfigError::Corrupted)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|_| ConfigError::IoError)?;
        }
        fs::write(&self.path, text).map_err(|_| ConfigError::IoError)
    }
}
