//! Client configuration

use crate::{
    error::{Error, Result},
    ffi::JackOptions,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest client name JACK accepts (`jack_client_name_size() - 1`)
pub const MAX_CLIENT_NAME_LEN: usize = 63;

/// JACK client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client name shown in the JACK graph
    pub name: String,
    /// Number of audio input ports (`in_0`, `in_1`, ...)
    pub input_ports: usize,
    /// Number of audio output ports (`out_0`, `out_1`, ...)
    pub output_ports: usize,
    /// Let libjack start a server when none is running
    pub start_server: bool,
    /// Fail instead of letting the server pick a unique name
    pub use_exact_name: bool,
    /// Explicit path to the JACK client library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "jack-bridge".to_string(),
            input_ports: 2,
            output_ports: 2,
            start_server: true,
            use_exact_name: false,
            library_path: None,
        }
    }
}

impl ClientConfig {
    /// Open options for `jack_client_open`
    ///
    /// The default configuration maps to `JackNullOption`.
    pub fn options(&self) -> JackOptions {
        let mut options = JackOptions::NULL;
        if !self.start_server {
            options = options | JackOptions::NO_START_SERVER;
        }
        if self.use_exact_name {
            options = options | JackOptions::USE_EXACT_NAME;
        }
        options
    }

    /// Check the configuration before any server call
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::ConfigError("client name is empty".to_string()));
        }
        if self.name.len() > MAX_CLIENT_NAME_LEN {
            return Err(Error::ConfigError(format!(
                "client name is {} bytes, JACK allows at most {}",
                self.name.len(),
                MAX_CLIENT_NAME_LEN
            )));
        }
        if self.name.contains('\0') {
            return Err(Error::InvalidName(self.name.clone()));
        }
        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
