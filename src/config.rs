//! Configuration module for the adbmap scanner

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Well-known TCP port of the ADB daemon in network mode
pub const DEFAULT_ADB_PORT: u16 = 5555;

/// Main configuration structure for scanning operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Port used for targets that do not carry one
    pub port: u16,

    /// Maximum number of probes in flight at once
    pub max_in_flight: usize,

    /// Timeout for each connection attempt in milliseconds
    pub connect_timeout: u64,

    /// Timeout for the protocol handshake in milliseconds
    pub handshake_timeout: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_ADB_PORT,
            max_in_flight: 512,
            connect_timeout: 1000,
            handshake_timeout: 2000,
        }
    }
}

impl ScanConfig {
    /// Set the default port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the in-flight probe limit
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: u64) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the handshake timeout
    pub fn with_handshake_timeout(mut self, timeout: u64) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Get connect timeout as Duration
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    /// Get handshake timeout as Duration
    pub fn handshake_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `~/.adbmap.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let Some(home_dir) = dirs::home_dir() else {
            return Self::default();
        };

        let config_path = home_dir.join(".adbmap.toml");
        if !config_path.exists() {
            return Self::default();
        }

        match Self::from_toml_file(&config_path) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring {}: {}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.port == 0 {
            return Err(crate::ScanError::ConfigError("Port must be greater than 0".to_string()));
        }

        if self.max_in_flight == 0 {
            return Err(crate::ScanError::ConfigError(
                "max_in_flight must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout == 0 || self.handshake_timeout == 0 {
            return Err(crate::ScanError::ConfigError(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
