use crate::DSP_DEFAULT_PORT;
use crate::error::config::ConfigError;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the appliance lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bound on connecting, on each write, and on each reply wait.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DSP_DEFAULT_PORT
}
fn default_timeout_ms() -> u64 {
    5000
}

impl DeviceConfig {
    /// Config for `host` with the default port and timeout.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty host, port 0 or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("device host cannot be empty"));
        }

        if self.port == 0 {
            return Err(ConfigError::validation("device port cannot be 0"));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::validation("device timeout_ms must be greater than 0"));
        }

        Ok(())
    }
}
