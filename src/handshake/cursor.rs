//! Bounds-checked sequential reads over a handshake payload.

use super::HandshakeError;

/// Forward-only cursor over a payload buffer.
///
/// Every read names the field it is extracting so that a short payload is
/// reported against the field that could not be read.
#[derive(Debug)]
pub(crate) struct PayloadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadCursor<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self { Self { buf, pos: 0 } }

    /// Current offset from the start of the payload.
    pub(crate) const fn position(&self) -> usize { self.pos }

    /// Take the next `n` bytes.
    pub(crate) fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], HandshakeError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(HandshakeError::Truncated { field })?;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(HandshakeError::Truncated { field })?;
        self.pos = end;
        Ok(bytes)
    }

    /// Take exactly `N` bytes as an array.
    pub(crate) fn take_array<const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[u8; N], HandshakeError> {
        let bytes = self.take(N, field)?;
        <[u8; N]>::try_from(bytes).map_err(|_| HandshakeError::Truncated { field })
    }

    pub(crate) fn take_u8(&mut self, field: &'static str) -> Result<u8, HandshakeError> {
        let [byte] = self.take_array::<1>(field)?;
        Ok(byte)
    }

    /// Advance past `n` bytes without inspecting them.
    pub(crate) fn skip(&mut self, n: usize, field: &'static str) -> Result<(), HandshakeError> {
        self.take(n, field).map(|_| ())
    }

    /// Take a NUL-terminated string, consuming the terminator.
    ///
    /// When the remaining bytes hold no NUL, index 0 is treated as the
    /// terminator: the result is empty and exactly one byte is consumed.
    /// Captured traces were decoded with this rule, so it is kept even though
    /// it desynchronises the cursor on malformed input.
    ///
    /// An exhausted buffer is a truncation, not an empty string.
    pub(crate) fn take_until_nul(&mut self, field: &'static str) -> Result<&'a [u8], HandshakeError> {
        let rest = self
            .buf
            .get(self.pos..)
            .filter(|rest| !rest.is_empty())
            .ok_or(HandshakeError::Truncated { field })?;
        let len = rest.iter().position(|&b| b == 0).unwrap_or(0);
        let text = self.take(len, field)?;
        self.skip(1, field)?;
        Ok(text)
    }
}
