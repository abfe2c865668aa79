//! JSON scan report.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{handshake::Handshake, probe::Probe};

/// Outcome of one probe, as printed by the command-line tool.
#[derive(Clone, Debug, Serialize)]
pub struct ScanReport {
    /// Target as requested.
    pub target: String,
    /// Resolved peer address.
    pub peer: SocketAddr,
    /// When the handshake was captured.
    pub when: DateTime<Utc>,
    /// Protocol version of the decoded handshake.
    pub proto_version: u8,
    /// Sequence id of the handshake packet.
    pub sequence_id: u8,
    /// Decoded handshake.
    pub handshake: Handshake,
}

impl ScanReport {
    /// Assemble a report from a completed probe.
    #[must_use]
    pub fn new(target: impl Into<String>, when: DateTime<Utc>, probe: Probe) -> Self {
        let Probe {
            peer,
            sequence_id,
            handshake,
        } = probe;
        Self {
            target: target.into(),
            peer,
            when,
            proto_version: handshake.proto_version(),
            sequence_id,
            handshake,
        }
    }

    /// Render the report as JSON.
    ///
    /// # Errors
    /// Returns any serialisation error from `serde_json`.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
