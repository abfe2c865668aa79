//! Connect to a server and capture its initial handshake.
//!
//! The probe never writes to the peer: it connects, reads the first packet,
//! decodes it, and drops the connection.

use std::{net::SocketAddr, time::Duration};

use thiserror::Error;
use tokio::{
    io,
    net::{TcpStream, lookup_host},
    time::timeout,
};
use tracing::{debug, info};

use crate::{
    frame::{FrameError, READ_TIMEOUT, read_frame},
    handshake::{Handshake, HandshakeError, decode_handshake},
};

/// Default deadline for establishing the TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadlines applied while probing. `None` waits indefinitely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Deadline for the TCP connect.
    pub connect_timeout: Option<Duration>,
    /// Deadline for reading the handshake packet.
    pub read_timeout: Option<Duration>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(CONNECT_TIMEOUT),
            read_timeout: Some(READ_TIMEOUT),
        }
    }
}

/// Result of a successful probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
    /// Address the connection was made to.
    pub peer: SocketAddr,
    /// Sequence id of the handshake packet.
    pub sequence_id: u8,
    /// Decoded handshake.
    pub handshake: Handshake,
}

/// Errors raised while probing a target.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The target could not be resolved to a socket address.
    #[error("failed to resolve {target}")]
    Resolve {
        /// Target as given.
        target: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The connection attempt failed.
    #[error("failed to connect to {target}")]
    Connect {
        /// Target as given.
        target: String,
        /// Connect error.
        #[source]
        source: io::Error,
    },
    /// The connection was not established before the deadline.
    #[error("timed out connecting to {target}")]
    ConnectTimeout {
        /// Target as given.
        target: String,
    },
    /// The handshake packet could not be read.
    #[error("failed to read handshake packet")]
    Frame(#[from] FrameError),
    /// The handshake packet could not be decoded.
    #[error("failed to decode handshake")]
    Handshake(#[from] HandshakeError),
}

impl ProbeError {
    /// Whether the server was too slow rather than unreachable or malformed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        match self {
            Self::ConnectTimeout { .. } => true,
            Self::Frame(err) => err.is_timeout(),
            _ => false,
        }
    }
}

async fn resolve(target: &str) -> Result<Vec<SocketAddr>, ProbeError> {
    let addrs: Vec<SocketAddr> = lookup_host(target)
        .await
        .map_err(|source| ProbeError::Resolve {
            target: target.to_owned(),
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(ProbeError::Resolve {
            target: target.to_owned(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
        });
    }
    Ok(addrs)
}

async fn connect(target: &str, deadline: Option<Duration>) -> Result<TcpStream, ProbeError> {
    let addrs = resolve(target).await?;
    let attempt = TcpStream::connect(addrs.as_slice());
    let result = match deadline {
        Some(dur) => timeout(dur, attempt)
            .await
            .map_err(|_| ProbeError::ConnectTimeout {
                target: target.to_owned(),
            })?,
        None => attempt.await,
    };
    result.map_err(|source| ProbeError::Connect {
        target: target.to_owned(),
        source,
    })
}

/// Connect to `target` (`host:port`) and decode the server's handshake.
///
/// # Errors
/// Returns a [`ProbeError`] describing the stage that failed.
pub async fn probe(target: &str, options: &ProbeOptions) -> Result<Probe, ProbeError> {
    let mut stream = connect(target, options.connect_timeout).await?;
    let peer = stream.peer_addr().map_err(|source| ProbeError::Connect {
        target: target.to_owned(),
        source,
    })?;
    info!(%peer, "connected");

    let frame = read_frame(&mut stream, options.read_timeout).await?;
    debug!(
        sequence_id = frame.sequence_id(),
        payload_len = frame.payload().len(),
        "received handshake packet"
    );

    let handshake = decode_handshake(frame.payload())?;
    info!(
        %peer,
        proto_version = handshake.proto_version(),
        server_version = handshake.server_version(),
        "decoded handshake"
    );

    Ok(Probe {
        peer,
        sequence_id: frame.sequence_id(),
        handshake,
    })
}
