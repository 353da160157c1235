use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Lifecycle of the device connection.
///
/// `Disconnected → Connecting → Handshaking → Ready`, back to `Disconnected` on an
/// explicit disconnect or a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Handshaking,
    Ready,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Handshaking => "handshaking",
            ConnectionState::Ready => "ready",
        };
        f.write_str(name)
    }
}
