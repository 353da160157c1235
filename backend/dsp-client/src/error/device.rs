//! Error types for device command operations.
//!
//! Key design decisions:
//! - Transport faults are classified once (`is_transport_failure()`) so callers can
//!   decide on their own retry policy without string matching
//! - Appliance refusals keep the appliance's error code verbatim
//! - All errors include ErrorLocation for debugging
//! - `#[track_caller]` for automatic location capture

use crate::error::transport::TransportError;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use thiserror::Error as ThisError;

/// Errors surfaced by [`DspDevice`](crate::device::DspDevice) operations.
#[derive(Debug, ThisError)]
pub enum DeviceError {
    #[error("Connection Failure: {address}: {message} {location}")]
    ConnectionFailure {
        address: String,
        message: String,
        location: ErrorLocation,
        #[source]
        source: TransportError,
    },

    #[error("Not Connected Error: device is disconnected {location}")]
    NotConnected { location: ErrorLocation },

    #[error("Busy Error: '{command}' refused, another command is in flight {location}")]
    Busy {
        command: String,
        location: ErrorLocation,
    },

    #[error("Command Timeout: '{command}' got no reply within {timeout:?} {location}")]
    CommandTimeout {
        command: String,
        timeout: Duration,
        location: ErrorLocation,
    },

    #[error("Connection Lost: '{command}': {message} {location}")]
    ConnectionLost {
        command: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Command Rejected: '{command}' failed with {error_code} {location}")]
    CommandRejected {
        command: String,
        command_name: String,
        error_code: String,
        location: ErrorLocation,
    },

    #[error("Handshake Error: {source} {location}")]
    Handshake {
        location: ErrorLocation,
        #[source]
        source: Box<DeviceError>,
    },

    #[error("Transport Error: '{command}': {source} {location}")]
    Transport {
        command: String,
        location: ErrorLocation,
        #[source]
        source: TransportError,
    },
}

impl DeviceError {
    #[track_caller]
    pub fn not_connected() -> Self {
        DeviceError::NotConnected {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn busy(command: impl Into<String>) -> Self {
        DeviceError::Busy {
            command: command.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn command_timeout(command: impl Into<String>, timeout: Duration) -> Self {
        DeviceError::CommandTimeout {
            command: command.into(),
            timeout,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn connection_lost(command: impl Into<String>, message: impl Into<String>) -> Self {
        DeviceError::ConnectionLost {
            command: command.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn command_rejected(
        command: impl Into<String>,
        command_name: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        DeviceError::CommandRejected {
            command: command.into(),
            command_name: command_name.into(),
            error_code: error_code.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn handshake(source: DeviceError) -> Self {
        DeviceError::Handshake {
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(source),
        }
    }

    #[track_caller]
    pub fn transport(command: impl Into<String>, source: TransportError) -> Self {
        DeviceError::Transport {
            command: command.into(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    /// Create from a failed `connect()` on the transport.
    #[track_caller]
    pub fn connection_failure(address: impl Into<String>, source: TransportError) -> Self {
        DeviceError::ConnectionFailure {
            address: address.into(),
            message: match &source {
                TransportError::Connect { source, .. } => source.to_string(),
                other => other.to_string(),
            },
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    /// Faults of the link itself rather than of the command or the appliance's answer.
    pub fn is_transport_failure(&self) -> bool {
        match self {
            DeviceError::ConnectionFailure { .. } => true,
            DeviceError::ConnectionLost { .. } => true,
            DeviceError::NotConnected { .. } => true,
            DeviceError::Transport { source, .. } => source.is_connection_reset(),
            DeviceError::Handshake { source, .. } => source.is_transport_failure(),

            DeviceError::Busy { .. } => false,
            DeviceError::CommandTimeout { .. } => false,
            DeviceError::CommandRejected { .. } => false,
        }
    }

    /// Get error category for log fields.
    pub fn error_category(&self) -> &'static str {
        match self {
            DeviceError::ConnectionFailure { .. } => "connection_failure",
            DeviceError::NotConnected { .. } => "not_connected",
            DeviceError::Busy { .. } => "busy",
            DeviceError::CommandTimeout { .. } => "command_timeout",
            DeviceError::ConnectionLost { .. } => "connection_lost",
            DeviceError::CommandRejected { .. } => "command_rejected",
            DeviceError::Handshake { .. } => "handshake",
            DeviceError::Transport { .. } => "transport",
        }
    }

    /// Appliance error code, for rejected commands.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            DeviceError::CommandRejected { error_code, .. } => Some(error_code),
            DeviceError::Handshake { source, .. } => source.error_code(),
            _ => None,
        }
    }
}
