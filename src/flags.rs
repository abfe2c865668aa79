//! Capability and server status bitmasks from the initial handshake.
//!
//! Both masks keep every bit the server sent, including reserved positions,
//! and render to the protocol's symbolic names through a fixed table in
//! ascending bit order. Rendering is for presentation only; the decoder
//! tests bits directly.

use bitflags::bitflags;
use serde::{Serialize, Serializer, ser::SerializeSeq};

bitflags! {
    /// Capability flags advertised by the server (32 bits).
    ///
    /// Bits 26 to 29 are unassigned and carry no name.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capability: u32 {
        /// Bit 0: new, more secure password hashing.
        const LONG_PASSWORD = 1 << 0;
        /// Bit 1: report found rows instead of affected rows.
        const FOUND_ROWS = 1 << 1;
        /// Bit 2: longer column flags.
        const LONG_FLAG = 1 << 2;
        /// Bit 3: a database name may be sent on connect.
        const CONNECT_WITH_DB = 1 << 3;
        /// Bit 4: disallow `database.table.column` syntax.
        const NO_SCHEMA = 1 << 4;
        /// Bit 5: compressed protocol.
        const COMPRESS = 1 << 5;
        /// Bit 6: ODBC client.
        const ODBC = 1 << 6;
        /// Bit 7: `LOAD DATA LOCAL` is allowed.
        const LOCAL_FILES = 1 << 7;
        /// Bit 8: ignore spaces before `(`.
        const IGNORE_SPACE = 1 << 8;
        /// Bit 9: 4.1 protocol.
        const PROTOCOL_41 = 1 << 9;
        /// Bit 10: interactive client timeouts.
        const INTERACTIVE = 1 << 10;
        /// Bit 11: TLS upgrade supported.
        const SSL = 1 << 11;
        /// Bit 12: do not issue `SIGPIPE`.
        const IGNORE_SIGPIPE = 1 << 12;
        /// Bit 13: transaction status in replies.
        const TRANSACTIONS = 1 << 13;
        /// Bit 14: reserved (old 4.1 protocol flag).
        const RESERVED = 1 << 14;
        /// Bit 15: reserved (old 4.1 authentication).
        const RESERVED2 = 1 << 15;
        /// Bit 16: multiple statements per query.
        const MULTI_STATEMENTS = 1 << 16;
        /// Bit 17: multiple result sets.
        const MULTI_RESULTS = 1 << 17;
        /// Bit 18: multiple result sets from prepared statements.
        const PS_MULTI_RESULTS = 1 << 18;
        /// Bit 19: pluggable authentication; the handshake names the plugin.
        const PLUGIN_AUTH = 1 << 19;
        /// Bit 20: connection attributes.
        const CONNECT_ATTRS = 1 << 20;
        /// Bit 21: length-encoded auth response.
        const PLUGIN_AUTH_LENENC_CLIENT_DATA = 1 << 21;
        /// Bit 22: expired passwords are handled by the client.
        const CAN_HANDLE_EXPIRED_PASSWORDS = 1 << 22;
        /// Bit 23: session state tracking.
        const SESSION_TRACK = 1 << 23;
        /// Bit 24: OK packets replace EOF packets.
        const DEPRECATE_EOF = 1 << 24;
        /// Bit 25: optional result set metadata.
        const OPTIONAL_RESULTSET_METADATA = 1 << 25;
        /// Bit 30: verify the server certificate.
        const SSL_VERIFY_SERVER_CERT = 1 << 30;
        /// Bit 31: keep client options after a failed connect.
        const REMEMBER_OPTIONS = 1 << 31;
    }
}

bitflags! {
    /// Server status flags (16 bits).
    ///
    /// Bits 2 and 15 are unassigned and carry no name.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ServerStatus: u16 {
        /// Bit 0: a transaction is active.
        const IN_TRANS = 1 << 0;
        /// Bit 1: autocommit mode.
        const AUTOCOMMIT = 1 << 1;
        /// Bit 3: more result sets follow.
        const MORE_RESULTS_EXIST = 1 << 3;
        /// Bit 4: the last query used a poor index.
        const NO_GOOD_INDEX_USED = 1 << 4;
        /// Bit 5: the last query used no index.
        const NO_INDEX_USED = 1 << 5;
        /// Bit 6: a read-only cursor exists.
        const CURSOR_EXISTS = 1 << 6;
        /// Bit 7: the last row of a cursor was sent.
        const LAST_ROW_SENT = 1 << 7;
        /// Bit 8: a database was dropped.
        const DB_DROPPED = 1 << 8;
        /// Bit 9: backslash escapes are disabled.
        const NO_BACKSLASH_ESCAPES = 1 << 9;
        /// Bit 10: prepared statement metadata changed.
        const METADATA_CHANGED = 1 << 10;
        /// Bit 11: the last query was slow.
        const QUERY_WAS_SLOW = 1 << 11;
        /// Bit 12: the result set holds stored procedure out parameters.
        const PS_OUT_PARAMS = 1 << 12;
        /// Bit 13: a read-only transaction is active.
        const IN_TRANS_READONLY = 1 << 13;
        /// Bit 14: session state changed.
        const SESSION_STATE_CHANGED = 1 << 14;
    }
}

/// Wire names for each capability bit, in ascending bit order.
pub const CAPABILITY_NAMES: &[(Capability, &str)] = &[
    (Capability::LONG_PASSWORD, "CLIENT_LONG_PASSWORD"),
    (Capability::FOUND_ROWS, "CLIENT_FOUND_ROWS"),
    (Capability::LONG_FLAG, "CLIENT_LONG_FLAG"),
    (Capability::CONNECT_WITH_DB, "CLIENT_CONNECT_WITH_DB"),
    (Capability::NO_SCHEMA, "CLIENT_NO_SCHEMA"),
    (Capability::COMPRESS, "CLIENT_COMPRESS"),
    (Capability::ODBC, "CLIENT_ODBC"),
    (Capability::LOCAL_FILES, "CLIENT_LOCAL_FILES"),
    (Capability::IGNORE_SPACE, "CLIENT_IGNORE_SPACE"),
    (Capability::PROTOCOL_41, "CLIENT_PROTOCOL_41"),
    (Capability::INTERACTIVE, "CLIENT_INTERACTIVE"),
    (Capability::SSL, "CLIENT_SSL"),
    (Capability::IGNORE_SIGPIPE, "CLIENT_IGNORE_SIGPIPE"),
    (Capability::TRANSACTIONS, "CLIENT_TRANSACTIONS"),
    (Capability::RESERVED, "CLIENT_RESERVED"),
    (Capability::RESERVED2, "CLIENT_RESERVED2"),
    (Capability::MULTI_STATEMENTS, "CLIENT_MULTI_STATEMENTS"),
    (Capability::MULTI_RESULTS, "CLIENT_MULTI_RESULTS"),
    (Capability::PS_MULTI_RESULTS, "CLIENT_PS_MULTI_RESULTS"),
    (Capability::PLUGIN_AUTH, "CLIENT_PLUGIN_AUTH"),
    (Capability::CONNECT_ATTRS, "CLIENT_CONNECT_ATTRS"),
    (
        Capability::PLUGIN_AUTH_LENENC_CLIENT_DATA,
        "CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA",
    ),
    // Spelling matches reports produced by earlier scanner releases.
    (
        Capability::CAN_HANDLE_EXPIRED_PASSWORDS,
        "CLIENT_CAN_HANDLED_EXPIRED_PASSWORDS",
    ),
    (Capability::SESSION_TRACK, "CLIENT_SESSION_TRACK"),
    (Capability::DEPRECATE_EOF, "CLIENT_DEPRECATE_EOF"),
    (
        Capability::OPTIONAL_RESULTSET_METADATA,
        "CLIENT_OPTIONAL_RESULTSET_METADATA",
    ),
    (
        Capability::SSL_VERIFY_SERVER_CERT,
        "CLIENT_SSL_VERIFY_SERVER_CERT",
    ),
    (Capability::REMEMBER_OPTIONS, "CLIENT_REMEMBER_OPTIONS"),
];

/// Wire names for each server status bit, in ascending bit order.
pub const SERVER_STATUS_NAMES: &[(ServerStatus, &str)] = &[
    (ServerStatus::IN_TRANS, "SERVER_STATUS_IN_TRANS"),
    (ServerStatus::AUTOCOMMIT, "SERVER_STATUS_AUTOCOMMIT"),
    (ServerStatus::MORE_RESULTS_EXIST, "SERVER_MORE_RESULT_EXISTS"),
    (
        ServerStatus::NO_GOOD_INDEX_USED,
        "SERVER_QUERY_NO_GOOD_INDEX_USED",
    ),
    (ServerStatus::NO_INDEX_USED, "SERVER_QUERY_NO_INDEX_USED"),
    (ServerStatus::CURSOR_EXISTS, "SERVER_STATUS_CURSOR_EXISTS"),
    (ServerStatus::LAST_ROW_SENT, "SERVER_STATUS_LAST_ROW_SENT"),
    (ServerStatus::DB_DROPPED, "SERVER_STATUS_DB_DROPPED"),
    (
        ServerStatus::NO_BACKSLASH_ESCAPES,
        "SERVER_STATUS_NO_BACKSLASH_ESCAPES",
    ),
    (
        ServerStatus::METADATA_CHANGED,
        "SERVER_STATUS_METADATA_CHANGED",
    ),
    (ServerStatus::QUERY_WAS_SLOW, "SERVER_QUERY_WAS_SLOW"),
    (ServerStatus::PS_OUT_PARAMS, "SERVER_PS_OUT_PARAMS"),
    (
        ServerStatus::IN_TRANS_READONLY,
        "SERVER_STATUS_IN_TRANS_READONLY",
    ),
    (
        ServerStatus::SESSION_STATE_CHANGED,
        "SERVER_SESSION_STATE_CHANGED",
    ),
];

fn render<F>(mask: F, table: &'static [(F, &'static str)]) -> Vec<&'static str>
where
    F: bitflags::Flags + Copy,
{
    table
        .iter()
        .filter(|(flag, _)| mask.contains(*flag))
        .map(|&(_, name)| name)
        .collect()
}

impl Capability {
    /// Build a mask from raw bits, keeping reserved positions.
    #[must_use]
    pub const fn from_raw(bits: u32) -> Self { Self::from_bits_retain(bits) }

    /// Whether every bit of `flag` is set.
    #[must_use]
    pub const fn has(self, flag: Self) -> bool { self.bits() & flag.bits() == flag.bits() }

    /// Symbolic names of the set bits, in ascending bit order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> { render(self, CAPABILITY_NAMES) }
}

impl ServerStatus {
    /// Build a mask from raw bits, keeping reserved positions.
    #[must_use]
    pub const fn from_raw(bits: u16) -> Self { Self::from_bits_retain(bits) }

    /// Whether every bit of `flag` is set.
    #[must_use]
    pub const fn has(self, flag: Self) -> bool { self.bits() & flag.bits() == flag.bits() }

    /// Symbolic names of the set bits, in ascending bit order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> { render(self, SERVER_STATUS_NAMES) }
}

fn serialize_names<S: Serializer>(names: &[&str], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(names.len()))?;
    for name in names {
        seq.serialize_element(name)?;
    }
    seq.end()
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_names(&self.names(), serializer)
    }
}

impl Serialize for ServerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_names(&self.names(), serializer)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[test]
    fn tables_cover_every_named_bit_once() {
        assert_eq!(CAPABILITY_NAMES.len(), 28);
        assert_eq!(SERVER_STATUS_NAMES.len(), 14);
        let cap_bits = CAPABILITY_NAMES
            .iter()
            .fold(0u32, |acc, (flag, _)| acc | flag.bits());
        assert_eq!(cap_bits, Capability::all().bits());
        let status_bits = SERVER_STATUS_NAMES
            .iter()
            .fold(0u16, |acc, (flag, _)| acc | flag.bits());
        assert_eq!(status_bits, ServerStatus::all().bits());
    }

    #[test]
    fn tables_are_in_ascending_bit_order() {
        assert!(
            CAPABILITY_NAMES
                .windows(2)
                .all(|w| matches!(w, [a, b] if a.0.bits() < b.0.bits()))
        );
        assert!(
            SERVER_STATUS_NAMES
                .windows(2)
                .all(|w| matches!(w, [a, b] if a.0.bits() < b.0.bits()))
        );
    }

    #[rstest]
    #[case(Capability::LONG_PASSWORD, 0)]
    #[case(Capability::PROTOCOL_41, 9)]
    #[case(Capability::RESERVED2, 15)]
    #[case(Capability::PLUGIN_AUTH, 19)]
    #[case(Capability::OPTIONAL_RESULTSET_METADATA, 25)]
    #[case(Capability::SSL_VERIFY_SERVER_CERT, 30)]
    #[case(Capability::REMEMBER_OPTIONS, 31)]
    fn capability_bit_position(#[case] flag: Capability, #[case] bit: u32) {
        assert_eq!(flag.bits(), 1u32 << bit, "flag {flag:?} should be at bit {bit}");
    }

    #[rstest]
    #[case(ServerStatus::IN_TRANS, 0)]
    #[case(ServerStatus::AUTOCOMMIT, 1)]
    #[case(ServerStatus::MORE_RESULTS_EXIST, 3)]
    #[case(ServerStatus::SESSION_STATE_CHANGED, 14)]
    fn status_bit_position(#[case] flag: ServerStatus, #[case] bit: u16) {
        assert_eq!(flag.bits(), 1u16 << bit, "flag {flag:?} should be at bit {bit}");
    }

    #[test]
    fn empty_masks_render_nothing() {
        assert!(Capability::empty().names().is_empty());
        assert!(ServerStatus::empty().names().is_empty());
    }

    #[test]
    fn full_masks_render_every_name_in_order() {
        let caps = Capability::from_raw(u32::MAX).names();
        let expected: Vec<_> = CAPABILITY_NAMES.iter().map(|&(_, n)| n).collect();
        assert_eq!(caps, expected);
        assert_eq!(caps.first(), Some(&"CLIENT_LONG_PASSWORD"));
        assert_eq!(caps.last(), Some(&"CLIENT_REMEMBER_OPTIONS"));

        let status = ServerStatus::from_raw(u16::MAX).names();
        assert_eq!(status.len(), 14);
        assert_eq!(status.first(), Some(&"SERVER_STATUS_IN_TRANS"));
        assert_eq!(status.last(), Some(&"SERVER_SESSION_STATE_CHANGED"));
    }

    #[test]
    fn reserved_bits_are_kept_but_unnamed() {
        let caps = Capability::from_raw(0b1111 << 26);
        assert_eq!(caps.bits(), 0b1111 << 26);
        assert!(caps.names().is_empty());

        let status = ServerStatus::from_raw((1 << 2) | (1 << 15) | 1);
        assert_eq!(status.names(), vec!["SERVER_STATUS_IN_TRANS"]);
    }

    #[test]
    fn has_requires_every_bit() {
        let caps = Capability::PROTOCOL_41 | Capability::SSL;
        assert!(caps.has(Capability::SSL));
        assert!(caps.has(Capability::PROTOCOL_41 | Capability::SSL));
        assert!(!caps.has(Capability::SSL | Capability::PLUGIN_AUTH));
        assert!(caps.has(Capability::empty()));
    }

    #[test]
    fn serializes_as_name_arrays() {
        let caps = Capability::LONG_PASSWORD | Capability::PLUGIN_AUTH;
        assert_eq!(
            serde_json::to_string(&caps).expect("json"),
            r#"["CLIENT_LONG_PASSWORD","CLIENT_PLUGIN_AUTH"]"#
        );
        let status = ServerStatus::AUTOCOMMIT;
        assert_eq!(
            serde_json::to_string(&status).expect("json"),
            r#"["SERVER_STATUS_AUTOCOMMIT"]"#
        );
        assert_eq!(
            serde_json::to_string(&ServerStatus::empty()).expect("json"),
            "[]"
        );
    }

    proptest! {
        /// `has` agrees with the raw mask test for every pair of masks.
        #[test]
        fn has_matches_mask_arithmetic(mask in any::<u32>(), flag in any::<u32>()) {
            prop_assert_eq!(
                Capability::from_raw(mask).has(Capability::from_raw(flag)),
                mask & flag == flag
            );
        }

        /// Rendering names exactly the set, named bits.
        #[test]
        fn names_follow_set_bits(mask in any::<u16>()) {
            let status = ServerStatus::from_raw(mask);
            let expected: Vec<&str> = SERVER_STATUS_NAMES
                .iter()
                .filter(|(flag, _)| mask & flag.bits() != 0)
                .map(|&(_, name)| name)
                .collect();
            prop_assert_eq!(status.names(), expected);
        }
    }
}
