//! VMEM byte-range read/write messages.

use binrw::helpers::until_eof;
use binrw::prelude::*;

/// Max size of an upload/download chunk.
pub const MAX_CHUNK_SIZE: usize = 1004;

/// Reads `size` bytes from the virtual address `addr`.
/// `size` must not exceed [`MAX_CHUNK_SIZE`].
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct ReadVmemRequest {
    pub addr: u32,
    #[br(assert(size as usize <= MAX_CHUNK_SIZE))]
    #[bw(assert(*size as usize <= MAX_CHUNK_SIZE))]
    pub size: u16,
}

/// The bytes read. The node may return fewer than requested.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ReadVmemResponse {
    #[br(parse_with = until_eof)]
    pub data: Vec<u8>,
}

/// Writes the payload bytes at the virtual address `addr`.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct WriteVmemRequest {
    pub addr: u32,
    #[br(parse_with = until_eof, assert(data.len() <= MAX_CHUNK_SIZE))]
    #[bw(assert(data.len() <= MAX_CHUNK_SIZE))]
    pub data: Vec<u8>,
}

/// Success carries no payload beyond the status code.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct WriteVmemResponse {}
