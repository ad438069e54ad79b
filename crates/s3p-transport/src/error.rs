//! Transport-layer errors.

use thiserror::Error;

/// Failures of the underlying byte link. All are fatal to the current
/// transaction; the protocol never reconnects on its own.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The device was closed or went away.
    #[error("transport closed")]
    Closed,

    /// An I/O error from the underlying device.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of waiting for a single frame.
#[derive(Error, Debug)]
pub enum FrameReadError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No complete frame arrived within the response timeout.
    #[error("response timeout")]
    Timeout,

    /// The cancellation token was set while waiting.
    #[error("wait cancelled")]
    Cancelled,
}
