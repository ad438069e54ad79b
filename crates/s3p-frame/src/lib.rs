//! Frame-level building blocks for the S3P serial protocol: COBS byte
//! stuffing and the CRC-16/CCITT integrity check, together with the frame
//! size bounds shared by every other layer.

#![forbid(unsafe_code)]

pub mod cobs;
pub mod crc16;

pub use cobs::{CobsDecodeError, CobsEncodeError};
pub use crc16::crc16;

/// Max serial frame size, including the trailing delimiter.
pub const MAX_FRAME_SIZE: usize = 1024;
/// Max unencoded packet size (header + payload + CRC).
pub const MAX_PKT_SIZE: usize = 1018;
/// Max data (payload) size.
pub const MAX_DATA_SIZE: usize = 1010;
/// Frame COBS delimiter. Never appears inside an encoded frame.
pub const COBS_DELIM: u8 = 0x00;
