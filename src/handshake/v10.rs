//! Protocol version 10 handshake layout.
//!
//! ```text
//! 1        protocol version (10, read by the caller)
//! string   server version, NUL-terminated
//! 4        thread id
//! 8        auth plugin data, part 1
//! 1        filler
//! 2        capability flags, lower half
//! 1        character set
//! 2        status flags
//! 2        capability flags, upper half
//! 1        auth plugin data length
//! 10       reserved
//! n        auth plugin data, part 2 (n = clamp(length - 8, 0, 13))
//! string   auth plugin name, NUL-terminated, if CLIENT_PLUGIN_AUTH
//! ```

#![expect(
    clippy::little_endian_bytes,
    reason = "MySQL integers are little-endian on the wire"
)]

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Serialize, Serializer};

use super::{HandshakeError, PROTOCOL_V10, cursor::PayloadCursor};
use crate::flags::{Capability, ServerStatus};

/// Length of the first scramble segment.
pub const SCRAMBLE_PART1_LEN: usize = 8;
/// Upper bound on the second scramble segment.
pub const SCRAMBLE_PART2_MAX_LEN: usize = 13;
/// Reserved bytes following the auth plugin data length.
pub const RESERVED_LEN: usize = 10;

/// Initial handshake sent by the server for protocol version 10.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HandshakeV10 {
    /// Human-readable server version.
    pub server_version: String,
    /// Connection id assigned by the server.
    pub thread_id: u32,
    /// Scramble for the authentication plugin, both segments concatenated.
    #[serde(serialize_with = "serialize_base64")]
    pub auth_plugin_data: Vec<u8>,
    /// Server default character set id.
    pub character_set: u8,
    /// Capabilities advertised by the server.
    pub capability_flags: Capability,
    /// Session status at connect time.
    pub server_status_flags: ServerStatus,
    /// Authentication plugin the scramble belongs to. Only present when the
    /// server advertises [`Capability::PLUGIN_AUTH`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_plugin_name: Option<String>,
}

impl HandshakeV10 {
    /// Protocol version of this layout.
    pub const PROTO_VERSION: u8 = PROTOCOL_V10;

    /// Always 10.
    #[must_use]
    pub const fn proto_version(&self) -> u8 { Self::PROTO_VERSION }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn text(bytes: &[u8]) -> String { String::from_utf8_lossy(bytes).into_owned() }

/// Length of the second scramble segment given the advertised total.
fn scramble_continuation_len(declared: u8) -> usize {
    usize::from(declared)
        .saturating_sub(SCRAMBLE_PART1_LEN)
        .min(SCRAMBLE_PART2_MAX_LEN)
}

/// Decode the fields following the version byte.
pub(super) fn decode(cursor: &mut PayloadCursor<'_>) -> Result<HandshakeV10, HandshakeError> {
    let server_version = text(cursor.take_until_nul("server_version")?);
    let thread_id = u32::from_le_bytes(cursor.take_array("thread_id")?);

    let mut auth_plugin_data = cursor
        .take(SCRAMBLE_PART1_LEN, "auth_plugin_data_part_1")?
        .to_vec();
    cursor.skip(1, "filler")?;

    let [lower_0, lower_1] = cursor.take_array("capability_flags_lower")?;
    let character_set = cursor.take_u8("character_set")?;
    let server_status_flags =
        ServerStatus::from_raw(u16::from_le_bytes(cursor.take_array("status_flags")?));
    let [upper_0, upper_1] = cursor.take_array("capability_flags_upper")?;
    // The upper half precedes the lower half before the little-endian read.
    let capability_flags =
        Capability::from_raw(u32::from_le_bytes([upper_0, upper_1, lower_0, lower_1]));

    let plugin_data_len = cursor.take_u8("auth_plugin_data_len")?;
    cursor.skip(RESERVED_LEN, "reserved")?;
    auth_plugin_data.extend_from_slice(cursor.take(
        scramble_continuation_len(plugin_data_len),
        "auth_plugin_data_part_2",
    )?);

    let auth_plugin_name = if capability_flags.has(Capability::PLUGIN_AUTH) {
        Some(text(cursor.take_until_nul("auth_plugin_name")?))
    } else {
        None
    };

    Ok(HandshakeV10 {
        server_version,
        thread_id,
        auth_plugin_data,
        character_set,
        capability_flags,
        server_status_flags,
        auth_plugin_name,
    })
}
