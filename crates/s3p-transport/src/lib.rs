//! Byte transport abstraction for the S3P protocol.
//!
//! The protocol consumes any byte-oriented link through the
//! [`Transport`] trait; opening and configuring the underlying device
//! (a serial port, usually) is the host application's business. This
//! crate also owns frame assembly: reading bytes until the COBS
//! delimiter, with timeout, overrun resynchronization and cooperative
//! cancellation.

#![forbid(unsafe_code)]

pub mod cancel;
pub mod error;
pub mod framer;
pub mod loopback;
pub mod traits;

pub use cancel::CancelToken;
pub use error::{FrameReadError, TransportError};
pub use framer::read_frame;
pub use loopback::Loopback;
pub use traits::Transport;
