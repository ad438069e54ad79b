//! The abstract byte transport consumed by the protocol.

use crate::error::TransportError;

/// A point-to-point byte stream.
///
/// Implementations wrap whatever carries the bytes — a serial port, a
/// pty, an in-memory queue. All three operations are required by the
/// protocol: `write` to send frames, `read` to poll for response bytes,
/// `discard` for pre-request hygiene.
pub trait Transport {
    /// Best-effort write. Returns the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Nonblocking read of up to `buf.len()` bytes. Returns 0 when no
    /// byte is currently available.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Drops any buffered inbound bytes.
    fn discard(&mut self) -> Result<(), TransportError>;
}
