//! Decoding of the server's initial handshake packet.
//!
//! The first payload byte selects the layout. Only protocol version 10 is
//! understood; any other value is rejected without reading further. All
//! field reads go through a bounds-checked cursor, so a short payload is
//! always reported as [`HandshakeError::Truncated`] and never as a panic or
//! a partially filled record.

mod cursor;
pub mod v10;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use self::cursor::PayloadCursor;
pub use self::v10::HandshakeV10;

/// Protocol version byte of the version 10 handshake.
pub const PROTOCOL_V10: u8 = 10;

/// Errors that can occur when decoding a handshake payload.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// The payload ended before `field` could be read.
    #[error("truncated payload reading {field}; not a MySQL handshake")]
    Truncated {
        /// Name of the handshake field that could not be read.
        field: &'static str,
    },
    /// The leading protocol version byte is not supported.
    #[error("unsupported protocol version {0}; not a MySQL handshake")]
    UnsupportedVersion(u8),
}

/// A decoded handshake, tagged by protocol version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Handshake {
    /// Protocol version 10 handshake.
    V10(HandshakeV10),
}

impl Handshake {
    /// Protocol version this handshake was decoded as.
    #[must_use]
    pub const fn proto_version(&self) -> u8 {
        match self {
            Self::V10(_) => HandshakeV10::PROTO_VERSION,
        }
    }

    /// Server version string advertised in the handshake.
    #[must_use]
    pub fn server_version(&self) -> &str {
        match self {
            Self::V10(hs) => &hs.server_version,
        }
    }
}

impl From<HandshakeV10> for Handshake {
    fn from(value: HandshakeV10) -> Self { Self::V10(value) }
}

/// Decode a handshake packet payload.
///
/// Decoding is a pure function of `payload`.
///
/// # Errors
/// Returns [`HandshakeError::Truncated`] if any field extends past the end of
/// the payload and [`HandshakeError::UnsupportedVersion`] if the version byte
/// is not recognised.
pub fn decode_handshake(payload: &[u8]) -> Result<Handshake, HandshakeError> {
    let mut cursor = PayloadCursor::new(payload);
    let version = cursor.take_u8("protocol_version")?;
    let handshake = match version {
        PROTOCOL_V10 => Handshake::V10(v10::decode(&mut cursor)?),
        other => return Err(HandshakeError::UnsupportedVersion(other)),
    };
    trace!(
        proto_version = version,
        consumed = cursor.position(),
        trailing = payload.len().saturating_sub(cursor.position()),
        "decoded handshake"
    );
    Ok(handshake)
}
