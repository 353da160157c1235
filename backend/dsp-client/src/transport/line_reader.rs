use crate::error::transport::TransportError;

use std::panic::Location;

use common::ErrorLocation;
use log::trace;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Longest line accepted by [`LineReader::new`], delimiter included.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Buffered reader yielding delimiter-terminated text lines.
pub struct LineReader<R> {
    inner: BufReader<R>,
    max_line_length: usize,
    /// Set while skipping the remainder of a line that was too long.
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_line_length(reader, DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_max_line_length(reader: R, max_line_length: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_line_length,
            discarding: false,
        }
    }

    /// Read until `delimiter` matches the tail of the accumulated bytes.
    ///
    /// Returns the line including its delimiter, or `Ok(None)` when the stream ends
    /// before a full line arrives. A trailing partial line is discarded.
    ///
    /// A line longer than the maximum is reported as soon as the limit is crossed; the
    /// next call skips its remainder up to the delimiter's last byte.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Io`] if the underlying read fails
    /// - [`TransportError::Decode`] if the line is not valid UTF-8 or too long (the bytes
    ///   are consumed)
    pub async fn read_line(&mut self, delimiter: &str) -> Result<Option<String>, TransportError> {
        let delimiter = delimiter.as_bytes();
        let Some(&last_byte) = delimiter.last() else {
            return Err(TransportError::Decode {
                message: "line delimiter must not be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let mut buffer = Vec::new();

        loop {
            let (found, used) = {
                let available = self.inner.fill_buf().await?;
                if available.is_empty() {
                    if !buffer.is_empty() {
                        trace!("Dropping {} bytes of unterminated input at end of stream", buffer.len());
                    }
                    return Ok(None);
                }

                let (found, used) = match available.iter().position(|&b| b == last_byte) {
                    Some(at) => (true, at + 1),
                    None => (false, available.len()),
                };
                if !self.discarding {
                    buffer.extend_from_slice(&available[..used]);
                }
                (found, used)
            };
            self.inner.consume(used);

            if self.discarding {
                if found {
                    self.discarding = false;
                }
                continue;
            }

            let complete = found && buffer.ends_with(delimiter);
            if buffer.len() > self.max_line_length {
                self.discarding = !complete;
                return Err(TransportError::Decode {
                    message: format!("line exceeds {} bytes", self.max_line_length),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            if complete {
                break;
            }
        }

        String::from_utf8(buffer)
            .map(Some)
            .map_err(|e| TransportError::Decode {
                message: format!("line is not valid UTF-8: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
