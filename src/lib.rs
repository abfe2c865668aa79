//! Inspect the initial handshake of a MySQL-protocol server.
//!
//! The crate reads one length-prefixed packet from a connection and decodes
//! it into a versioned handshake record naming the server version, thread
//! id, authentication scramble, capabilities and status flags. It never
//! writes to the peer and never attempts authentication.
//!
//! [`frame`] handles packet framing, [`handshake`] decodes the payload and
//! [`flags`] renders the capability and status bitmasks. [`probe`] and
//! [`report`] tie these together for the `protoscan` binary.

pub mod cli;
pub mod flags;
pub mod frame;
pub mod handshake;
pub mod logging;
pub mod probe;
pub mod report;
pub mod timeout;
