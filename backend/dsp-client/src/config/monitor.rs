use crate::error::config::ConfigError;
use crate::protocol::{ParameterAddress, ParameterValueType};

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One matrix parameter the monitor polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedParameter {
    pub label: String,
    /// Matrix index, addressed as `MTX:Index_<index>`.
    pub index: u32,
    #[serde(default)]
    pub value_type: ParameterValueType,
}

impl WatchedParameter {
    pub fn new(label: impl Into<String>, index: u32, value_type: ParameterValueType) -> Self {
        Self {
            label: label.into(),
            index,
            value_type,
        }
    }

    pub fn address(&self) -> ParameterAddress {
        ParameterAddress::matrix_index(self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Give up connecting after this long. 0 retries forever.
    #[serde(default = "default_connect_max_elapsed_secs")]
    pub connect_max_elapsed_secs: u64,
    #[serde(default = "default_parameters")]
    pub parameters: Vec<WatchedParameter>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            connect_max_elapsed_secs: default_connect_max_elapsed_secs(),
            parameters: default_parameters(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}
fn default_connect_max_elapsed_secs() -> u64 {
    60
}
fn default_parameters() -> Vec<WatchedParameter> {
    vec![
        WatchedParameter::new("input level", 0, ParameterValueType::Normalized),
        WatchedParameter::new("input mute", 1, ParameterValueType::Raw),
    ]
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn connect_max_elapsed(&self) -> Option<Duration> {
        match self.connect_max_elapsed_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero poll interval or empty or
    /// duplicate parameter labels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::validation(
                "monitor poll_interval_secs must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            if parameter.label.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "watched parameter at index {} has an empty label",
                    parameter.index
                )));
            }

            if !seen.insert(parameter.label.as_str()) {
                return Err(ConfigError::validation(format!(
                    "duplicate watched parameter label: {}",
                    parameter.label
                )));
            }
        }

        Ok(())
    }
}
