use dsp_client::error::{ConfigError, DeviceError};

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors that end the monitor.
///
/// Per-parameter poll failures are logged and never become a `MonitorError`.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Error from this app (logging, directories)
    #[error("Monitor Error: {message} {location}")]
    Monitor {
        message: String,
        location: ErrorLocation,
    },

    /// Config could not be loaded, validated or saved
    #[error("Config Error: {source} {location}")]
    Config {
        location: ErrorLocation,
        #[source]
        source: ConfigError,
    },

    /// The appliance could not be reached within the retry budget
    #[error("Device Error: {source} {location}")]
    Device {
        location: ErrorLocation,
        #[source]
        source: DeviceError,
    },
}

impl MonitorError {
    #[track_caller]
    pub fn monitor(message: impl Into<String>) -> Self {
        MonitorError::Monitor {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for MonitorError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        MonitorError::Config {
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }
}

impl From<DeviceError> for MonitorError {
    #[track_caller]
    fn from(source: DeviceError) -> Self {
        MonitorError::Device {
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }
}
