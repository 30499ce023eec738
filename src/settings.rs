use crate::errors::{PassthruError, Result};
use directories::ProjectDirs;
use jack_bridge::ClientConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassthruSettings {
    pub client: ClientConfig,
    /// Linear gain applied from each input to its output
    pub gain: f32,
}

impl Default for PassthruSettings {
    fn default() -> Self {
        Self {
            client: ClientConfig {
                name: "jack-passthru".to_string(),
                ..ClientConfig::default()
            },
            gain: 1.0,
        }
    }
}

impl PassthruSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(PassthruError::InvalidSettings(format!(
                "gain must be a finite, non-negative number (got {})",
                self.gain
            )));
        }
        self.client.validate()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, or from the default location if it exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_settings_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "jack-bridge", "jack-passthru")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}
