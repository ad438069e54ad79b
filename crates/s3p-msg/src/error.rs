//! Message-layer errors and the node-reported status code.

use thiserror::Error;

use binrw::prelude::*;

/// Errors raised while building or parsing S3P messages and frames.
#[derive(Error, Debug)]
pub enum S3pMsgError {
    /// Payload exceeds [`MAX_DATA_SIZE`][s3p_frame::MAX_DATA_SIZE].
    #[error("payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },

    /// Encoded frame exceeds [`MAX_FRAME_SIZE`][s3p_frame::MAX_FRAME_SIZE].
    #[error("encoded frame too large: {len} bytes")]
    FrameTooLarge { len: usize },

    /// COBS decoding of a received frame failed.
    #[error("frame unstuffing failed: {0}")]
    Cobs(#[from] s3p_frame::CobsDecodeError),

    /// Decoded frame is shorter than header plus CRC.
    #[error("frame too short: {len} decoded bytes")]
    FrameTooShort { len: usize },

    /// CRC trailer does not match the computed checksum.
    #[error("CRC mismatch: received {received:#06x}, computed {computed:#06x}")]
    CrcMismatch { received: u16, computed: u16 },

    /// Header `data_len` disagrees with the decoded byte count.
    #[error("length mismatch: header says {header} payload bytes, frame carries {actual}")]
    LengthMismatch { header: usize, actual: usize },

    /// The frame is addressed to another node and must be discarded.
    #[error("frame not for us: dst {dst_id:#04x}, expected {expected:#04x}")]
    NotForUs { dst_id: u8, expected: u8 },

    /// A content enum held a different variant than the caller expected.
    #[error("unexpected content: expected {expected}, got {actual}")]
    UnexpectedContent {
        expected: &'static str,
        actual: &'static str,
    },

    /// A string value is not representable in the scalar record format.
    #[error("string value in scalar context")]
    NotScalar,

    /// Structural decode/encode failure from the underlying codec.
    #[error("codec error: {0}")]
    Codec(#[from] binrw::Error),
}

/// The 1-byte status code that opens every S3P response payload.
///
/// Zero means success; the bytes after the code are defined only then.
/// The code space is open: unknown values survive decode and display as
/// `UNKNOWN`.
#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    /// No error.
    pub const NONE: ErrorCode = ErrorCode(0);
    /// Virtual VMEM address does not translate to a physical address.
    pub const VMEM_XLATE: ErrorCode = ErrorCode(100);
    /// The requested register does not exist.
    pub const NO_REG: ErrorCode = ErrorCode(101);
    /// The node could not lock its register table.
    pub const NO_LOCK: ErrorCode = ErrorCode(102);
    /// Wrong value type in a register write request.
    pub const TYPE: ErrorCode = ErrorCode(103);
    /// Packet/payload has the wrong size (missing bytes or arguments).
    pub const SIZE: ErrorCode = ErrorCode(104);
    /// Register is read only.
    pub const NO_WRITE: ErrorCode = ErrorCode(105);
    /// The requested VMEM mapping index does not exist.
    pub const NO_VMEM: ErrorCode = ErrorCode(106);
    /// The requested command id is not supported.
    pub const NO_CMD: ErrorCode = ErrorCode(107);

    /// Whether this code signals success.
    pub fn is_ok(self) -> bool {
        self == Self::NONE
    }

    /// Short human label for the code.
    pub fn label(self) -> &'static str {
        match self {
            Self::NONE => "NONE",
            Self::VMEM_XLATE => "VMEM_XLATE",
            Self::NO_REG => "NO_REG",
            Self::NO_LOCK => "NO_LOCK",
            Self::TYPE => "TYPE",
            Self::SIZE => "SIZE",
            Self::NO_WRITE => "NO_WRITE",
            Self::NO_VMEM => "NO_VMEM",
            Self::NO_CMD => "NO_CMD",
            _ => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.0)
    }
}
