//! Reading single packets from an asynchronous byte source.
//!
//! A packet read is bounded by one deadline covering the header and the
//! payload, the same way a socket read deadline bounds the whole exchange.
//! Reads are repeated until each stage is complete, so a payload split
//! across many TCP segments is assembled transparently; end-of-stream before
//! a stage completes is reported as truncation of that stage.

use std::time::Duration;

use bytes::Bytes;
use tokio::{
    io::{self, AsyncRead, AsyncReadExt},
    time::timeout,
};

use super::{Frame, FrameError, HEADER_LEN};

/// Map a source error, treating socket-level timeouts as deadline expiry.
fn classify_io(err: io::Error) -> FrameError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FrameError::Timeout,
        _ => FrameError::Io(err),
    }
}

/// Read until `buf` is full or the source reports end-of-stream.
///
/// Returns the number of bytes written into `buf`.
async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FrameError> {
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        let n = reader.read(rest).await.map_err(classify_io)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[expect(
    clippy::little_endian_bytes,
    reason = "MySQL packet lengths are little-endian"
)]
async fn read_frame_unbounded<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Frame, FrameError> {
    let mut header = [0u8; HEADER_LEN];
    let header_received = fill(reader, &mut header).await?;
    if header_received < HEADER_LEN {
        return Err(FrameError::HeaderTruncated {
            received: header_received,
        });
    }
    let [len_lo, len_mid, len_hi, sequence_id] = header;
    let expected = u32::from_le_bytes([len_lo, len_mid, len_hi, 0]) as usize;

    let mut payload = vec![0u8; expected];
    let payload_received = fill(reader, &mut payload).await?;
    if payload_received < expected {
        return Err(FrameError::PayloadTruncated {
            expected,
            received: payload_received,
        });
    }

    Ok(Frame {
        sequence_id,
        payload: Bytes::from(payload),
    })
}

/// Read exactly one packet from `reader`.
///
/// `deadline` bounds the whole read; `None` waits indefinitely.
///
/// # Errors
/// Returns [`FrameError::HeaderTruncated`] or [`FrameError::PayloadTruncated`]
/// when the source ends early, [`FrameError::Timeout`] when the deadline
/// elapses, and [`FrameError::Io`] for any other source failure. After an
/// error the source position is unspecified and the connection should be
/// discarded.
pub async fn read_frame<R>(reader: &mut R, deadline: Option<Duration>) -> Result<Frame, FrameError>
where
    R: AsyncRead + Unpin,
{
    match deadline {
        Some(dur) => timeout(dur, read_frame_unbounded(reader))
            .await
            .map_err(|_| FrameError::Timeout)?,
        None => read_frame_unbounded(reader).await,
    }
}
