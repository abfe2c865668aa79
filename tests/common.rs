//! Shared helpers for integration tests.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use std::net::SocketAddr;

use protoscan::frame::Frame;
use tokio::{
    io::{self, AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

/// Handshake payload captured from a MySQL 5.7.31 server.
pub const MYSQL_57_HANDSHAKE: &[u8] = &[
    0x0a, // protocol version
    b'5', b'.', b'7', b'.', b'3', b'1', 0x00, // server version
    0x2a, 0x00, 0x00, 0x00, // thread id
    0x3b, 0x5c, 0x1f, 0x08, 0x6e, 0x32, 0x4b, 0x11, // scramble, part 1
    0x00, // filler
    0xff, 0xf7, // capability flags, lower
    0x21, // character set
    0x02, 0x00, // status flags
    0xff, 0x81, // capability flags, upper
    0x15, // auth plugin data length
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // reserved
    0x6f, 0x1a, 0x43, 0x55, 0x2d, 0x7c, 0x0d, 0x57, 0x35, 0x4e, 0x3a, 0x16, 0x00, // scramble, part 2
    b'm', b'y', b's', b'q', b'l', b'_', b'n', b'a', b't', b'i', b'v', b'e', b'_', b'p', b'a',
    b's', b's', b'w', b'o', b'r', b'd', 0x00, // auth plugin name
];

/// Serialise `payload` as packet 0.
pub fn packet(payload: &[u8]) -> Vec<u8> {
    Frame::new(0, payload.to_vec())
        .expect("payload fits in a packet")
        .to_bytes()
}

/// Single-connection server used to stand in for a database.
pub struct FakeServer {
    /// Address the server listens on.
    pub addr: SocketAddr,
    handle: JoinHandle<io::Result<Vec<u8>>>,
}

impl FakeServer {
    /// Accept one connection and send `reply`, then close the write half.
    ///
    /// With `None` the server accepts and stays silent.
    pub async fn start(reply: Option<Vec<u8>>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await?;
            if let Some(bytes) = reply {
                socket.write_all(&bytes).await?;
                socket.shutdown().await?;
            }
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await?;
            Ok(received)
        });
        Ok(Self { addr, handle })
    }

    /// Target string for the probe.
    pub fn target(&self) -> String { self.addr.to_string() }

    /// Wait for the client to hang up and return what it sent.
    pub async fn client_bytes(self) -> io::Result<Vec<u8>> {
        self.handle.await.map_err(io::Error::other)?
    }
}
