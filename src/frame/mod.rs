//! Packet framing for the MySQL client/server protocol.
//!
//! Every packet starts with a 4-byte header: a 3-byte little-endian payload
//! length followed by a 1-byte sequence id. The payload follows immediately.
//! This module reads exactly one such packet from an asynchronous byte
//! source and reports truncation and deadline expiry as distinct errors.

use std::time::Duration;

pub mod errors;
pub mod reader;

use bytes::Bytes;
pub use errors::FrameError;
pub use reader::read_frame;

/// Length of the packet header (length prefix plus sequence id) in bytes.
pub const HEADER_LEN: usize = 4;
/// Number of bytes in the payload length prefix.
pub const LENGTH_PREFIX_LEN: usize = 3;
/// Largest payload a single packet can carry (`2^24 - 1`).
pub const MAX_PAYLOAD_LEN: usize = 0x00FF_FFFF;
/// Default deadline for reading one packet.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// One transport-level packet.
///
/// A `Frame` is only ever built from a complete payload; the reader never
/// hands out partially filled frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    sequence_id: u8,
    payload: Bytes,
}

impl Frame {
    /// Build a frame from a sequence id and payload.
    ///
    /// # Errors
    /// Returns [`FrameError::PayloadTooLarge`] if the payload does not fit the
    /// 3-byte length prefix.
    pub fn new(sequence_id: u8, payload: impl Into<Bytes>) -> Result<Self, FrameError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            sequence_id,
            payload,
        })
    }

    /// Sequence id carried in the header. Passed through unvalidated.
    #[must_use]
    pub const fn sequence_id(&self) -> u8 { self.sequence_id }

    /// Payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Serialise the frame, header included.
    #[must_use = "use the serialised bytes"]
    #[expect(
        clippy::little_endian_bytes,
        reason = "MySQL packet lengths are little-endian"
    )]
    #[expect(
        clippy::indexing_slicing,
        reason = "a u32 always has four little-endian bytes"
    )]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        // Frame::new guarantees the length fits in 24 bits.
        let len = u32::try_from(self.payload.len()).unwrap_or(u32::MAX);
        buf.extend_from_slice(&len.to_le_bytes()[..LENGTH_PREFIX_LEN]);
        buf.push(self.sequence_id);
        buf.extend_from_slice(&self.payload);
        buf
    }
}
