use common::ErrorLocation;

use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures of the raw byte stream, independent of the wire grammar.
#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("Connect Error: {address}: {source} {location}")]
    Connect {
        address: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        kind: ErrorKind,
        location: ErrorLocation,
    },

    #[error("Not Connected Error: {location}")]
    NotConnected { location: ErrorLocation },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },
}

impl TransportError {
    #[track_caller]
    pub fn connect(address: impl Into<String>, source: IoError) -> Self {
        TransportError::Connect {
            address: address.into(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn not_connected() -> Self {
        TransportError::NotConnected {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Reset-class failures: the peer is gone and the socket cannot be reused.
    pub fn is_connection_reset(&self) -> bool {
        match self {
            TransportError::Io { kind, .. } => matches!(
                kind,
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::NotConnected
                    | ErrorKind::UnexpectedEof
            ),
            TransportError::NotConnected { .. } => true,
            TransportError::Connect { .. } | TransportError::Decode { .. } => false,
        }
    }

    /// Whether the read side can keep going after this error.
    ///
    /// Only a line that failed to decode is recoverable; every I/O error ends the stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransportError::Decode { .. })
    }
}

impl From<IoError> for TransportError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        TransportError::Io {
            message: error.to_string(),
            kind: error.kind(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
