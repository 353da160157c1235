//! Stream transport: one TCP connection to the appliance.
//!
//! The transport moves bytes and lines; it knows nothing about the wire grammar. The
//! read half is handed out once per connection via [`StreamTransport::take_reader`] so
//! a dedicated task can own it, while writes stay with the transport's owner.
//!
//! # Lifecycle
//!
//! `connect()` → (owner runs its after-connect step) → `write()` / reader task →
//! (owner runs its before-disconnect step) → `disconnect()`. `reconnect()` is
//! `disconnect()` followed by `connect()` against the same endpoint.

mod line_reader;
mod link_status;

pub use line_reader::{DEFAULT_MAX_LINE_LENGTH, LineReader};
pub use link_status::LinkStatus;

use crate::error::transport::TransportError;

use std::time::Duration;

use log::{debug, info};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout as TokioTimeout;

pub struct StreamTransport {
    host: String,
    port: u16,
    connect_timeout: Duration,
    link: LinkStatus,
    reader: Option<LineReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
}

impl StreamTransport {
    /// Create a transport for `host:port`. No connection is made yet.
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            link: LinkStatus::default(),
            reader: None,
            writer: None,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_up()
    }

    /// Handle on the connected flag, shared with the read-side task.
    pub fn link_status(&self) -> LinkStatus {
        self.link.clone()
    }

    /// Open the socket.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the socket cannot be established within
    /// the connect timeout.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        let address = self.address();
        debug!("Opening connection to {address}");

        let stream = match TokioTimeout(
            self.connect_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(TransportError::connect(address, e)),
            Err(_) => {
                return Err(TransportError::connect(
                    address,
                    std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("no answer within {:?}", self.connect_timeout),
                    ),
                ));
            }
        };

        // Commands are tiny and latency bound
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::connect(&address, e))?;

        let (read_half, write_half) = stream.into_split();
        self.reader = Some(LineReader::new(read_half));
        self.writer = Some(write_half);
        self.link.mark_up();

        info!("Connected to {address}");
        Ok(())
    }

    /// Hand the read half to its consumer. Yields `Some` once per connection.
    pub fn take_reader(&mut self) -> Option<LineReader<OwnedReadHalf>> {
        self.reader.take()
    }

    /// Write `bytes` and flush them to the socket.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(TransportError::not_connected)?;

        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Close the socket. Errors while closing are ignored, the socket is going away anyway.
    pub async fn disconnect(&mut self) {
        self.link.mark_down();

        if self.reader.is_none() && self.writer.is_none() {
            return;
        }
        self.reader = None;

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Ignoring error while closing {}: {e}", self.address());
            }
        }

        info!("Disconnected from {}", self.address());
    }

    /// Drop whatever is left of the current socket and open a fresh one.
    ///
    /// Safe on a transport that never connected or already disconnected.
    pub async fn reconnect(&mut self) -> Result<(), TransportError> {
        self.disconnect().await;
        self.connect().await
    }
}
