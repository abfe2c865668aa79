//! Error types for packet framing.

use thiserror::Error;
use tokio::io;

/// Errors that can occur when reading a packet.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The source ended before the 4-byte header was complete.
    #[error("truncated header: received {received} of 4 bytes")]
    HeaderTruncated {
        /// Header bytes received before end-of-stream.
        received: usize,
    },
    /// The source ended before the declared payload length was read.
    #[error("truncated payload: received {received} of {expected} bytes")]
    PayloadTruncated {
        /// Payload length declared by the header.
        expected: usize,
        /// Payload bytes received before end-of-stream.
        received: usize,
    },
    /// Payload does not fit the 3-byte length prefix.
    #[error("payload of {0} bytes exceeds the packet length limit")]
    PayloadTooLarge(usize),
    /// The read deadline elapsed before the packet arrived.
    #[error("timed out waiting for packet")]
    Timeout,
    /// I/O error reported by the source.
    #[error("I/O error while reading packet")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Whether the error means "peer too slow" rather than "peer sent garbage".
    #[must_use]
    pub const fn is_timeout(&self) -> bool { matches!(self, Self::Timeout) }
}
