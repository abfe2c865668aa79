//! AFL harness for the packet reader and handshake decoder.
//!
//! Each input is fed to the frame reader as a byte stream, and the
//! resulting payload (or the raw input when framing fails) is decoded as a
//! handshake. Errors are expected; only panics count as crashes.

use protoscan::{frame::read_frame, handshake::decode_handshake};

fn main() {
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    afl::fuzz!(|data: &[u8]| {
        let mut reader = data;
        match runtime.block_on(read_frame(&mut reader, None)) {
            Ok(frame) => drop(decode_handshake(frame.payload())),
            Err(_) => drop(decode_handshake(data)),
        }
    });
}
