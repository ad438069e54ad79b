//! Self-describing metadata messages: node info, register descriptors
//! and VMEM mapping descriptors.

use binrw::NullString;
use binrw::prelude::*;
use modular_bitfield::prelude::*;

use crate::MAX_NAME_SIZE;
use crate::value::ValueType;

/// Requests the node's version and table summary.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct S3pInfoRequest {}

/// Version and table bounds: the walk anchors for the register and
/// VMEM metadata downloads.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct S3pInfoResponse {
    /// Protocol version, `0xMMmm`.
    pub version: u16,
    /// Lowest register id, the register walk entry point.
    pub reg_min_id: u16,
    /// Highest register id.
    pub reg_max_id: u16,
    /// Number of registers in the node table.
    pub regs_cnt: u16,
    /// Number of VMEM mapping rows; zero when VMEM is unsupported.
    pub vmem_rows: u8,
}

/// Requests the descriptor of one register.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct RegInfoRequest {
    pub reg_id: u16,
}

/// Register behavior flags. Bit 0 = writable, bit 1 = persisted across
/// reboots; the rest of the word is reserved.
#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq, BinRead, BinWrite)]
#[br(map = |raw: [u8; 2]| Self::from_bytes([raw[1], raw[0]]))]
#[bw(map = |flags: &Self| { let b = flags.into_bytes(); [b[1], b[0]] })]
pub struct RegFlags {
    pub mutable: bool,
    pub persist: bool,
    #[skip]
    __: B14,
}

/// One register descriptor, a link in the walk chain.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct RegInfoResponse {
    /// Register id, strictly positive.
    pub id: u16,
    /// Next id in the node's walk order, 0 at the end of the chain.
    pub next_id: u16,
    /// Value type of the register.
    pub vt: ValueType,
    /// Domain-specific grouping label, opaque to the protocol.
    pub group_id: u8,
    pub flags: RegFlags,
    #[br(assert(name.len() < MAX_NAME_SIZE))]
    pub name: NullString,
}

impl RegInfoResponse {
    /// The register name as lossy UTF-8.
    pub fn name_string(&self) -> String {
        crate::value::lossy_string(&self.name)
    }
}

/// Requests the descriptor of one VMEM mapping row.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct VmemInfoRequest {
    pub row_idx: u8,
}

/// Backing-memory kind of a VMEM mapping. The set is open: unknown
/// kinds survive decode and display as `UNK`.
#[binrw]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemType(pub u8);

impl MemType {
    pub const NONE: MemType = MemType(0);
    pub const SNOR: MemType = MemType(1);
    pub const FRAM: MemType = MemType(2);
    pub const MRAM: MemType = MemType(3);
    pub const UNOR1: MemType = MemType(4);
    pub const UNOR2: MemType = MemType(5);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NONE => "NONE",
            Self::SNOR => "SNOR",
            Self::FRAM => "FRAM",
            Self::MRAM => "MRAM",
            Self::UNOR1 => "UNOR1",
            Self::UNOR2 => "UNOR2",
            _ => "UNK",
        }
    }
}

impl std::fmt::Display for MemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// VMEM mapping access flags: readable, writable, mirrored.
#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq, BinRead, BinWrite)]
#[br(map = Self::from_bytes)]
#[bw(map = |&x| Self::into_bytes(x))]
pub struct VmemFlags {
    pub read: bool,
    pub write: bool,
    pub mirror: bool,
    #[skip]
    __: B5,
}

/// One VMEM mapping descriptor, a link in the walk chain.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct VmemInfoResponse {
    /// Row index.
    pub idx: u8,
    /// Next row in walk order, 0 at the end of the chain.
    pub next_idx: u8,
    /// Backing memory kind.
    pub mem_type: MemType,
    /// Virtual start address of the range.
    pub vstart: u32,
    /// Size of the range in bytes.
    pub size: u32,
    pub flags: VmemFlags,
    /// Mirror target kind, NONE when the range is not mirrored.
    pub mirror_type: MemType,
    #[br(assert(name.len() < MAX_NAME_SIZE))]
    pub name: NullString,
}

impl VmemInfoResponse {
    /// The mapping name as lossy UTF-8.
    pub fn name_string(&self) -> String {
        crate::value::lossy_string(&self.name)
    }
}
