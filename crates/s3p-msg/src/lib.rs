//! S3P message structures: typed values, packet header, per-operation
//! request/response contents, metadata descriptors and the frame
//! build/parse entry points.
//!
//! All multi-byte integers are big-endian on the wire.

#![forbid(unsafe_code)]

pub mod content;
pub mod error;
pub mod exec;
pub mod info;
pub mod packet;
pub mod regs;
pub mod value;
pub mod vmem;


pub use content::*;
pub use error::*;
pub use exec::*;
pub use info::*;
pub use packet::*;
pub use regs::*;
pub use value::*;
pub use vmem::*;

pub use s3p_frame::{COBS_DELIM, MAX_DATA_SIZE, MAX_FRAME_SIZE, MAX_PKT_SIZE};

/// Protocol version, `0xMMmm` (major.minor).
pub const PROTOCOL_VERSION: u16 = 0x0100;

/// Max size of any `name` field in a request/response, including the NUL.
pub const MAX_NAME_SIZE: usize = 32;

/// Max size of a string value, including the NUL.
pub const MAX_STR_SIZE: usize = 255;

/// Client-side register table end marker. Never a valid register id.
pub const REG_ID_END: u16 = 0xFFFF;

/// Client-side VMEM table end marker. Never a valid mapping start.
pub const VMEM_ADDR_END: u32 = 0xFFFF_FFFF;

/// Node ids `0x00` and `0xFF` are reserved and invalid for both source
/// and destination.
pub fn is_valid_node_id(id: u8) -> bool {
    id != 0x00 && id != 0xFF
}

/// S3P message Result type.
pub type Result<T> = std::result::Result<T, error::S3pMsgError>;
