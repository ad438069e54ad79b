//! Request and response content enums, dispatched by packet type.
//!
//! The status code byte that opens every response payload is *not* part
//! of these structures: the transaction engine strips and checks it
//! first, and only parses a [`ResponseContent`] on success.

use binrw::prelude::*;

use crate::error::S3pMsgError;
use crate::exec::*;
use crate::info::*;
use crate::packet::PacketType;
use crate::regs::*;
use crate::vmem::*;

/// Makes the `content_name`, cast and `From` impls for a content enum.
macro_rules! make_content_impl {
    (
        $enum_name:ident,
        $({$variant:ident, $struct_type:ty},)+
    ) => {
        pastey::paste! {

impl $enum_name {
    /// Returns the name of the content value.
    pub fn content_name(&self) -> &'static str {
        match self {
            $(
                Self::$variant(_) => stringify!($variant),
            )+
        }
    }

    $(
        #[doc = concat!("Attempts to cast the content to [`", stringify!($struct_type), "`].")]
        pub fn [<to_ $variant:snake>](self) -> crate::Result<$struct_type> {
            match self {
                Self::$variant(inner) => Ok(inner),
                _ => Err(S3pMsgError::UnexpectedContent {
                    expected: stringify!($variant),
                    actual: self.content_name(),
                }),
            }
        }

        #[doc = concat!("Attempts to borrow the content as [`", stringify!($struct_type), "`].")]
        pub fn [<as_ $variant:snake>](&self) -> crate::Result<&$struct_type> {
            match self {
                Self::$variant(inner) => Ok(inner),
                _ => Err(S3pMsgError::UnexpectedContent {
                    expected: stringify!($variant),
                    actual: self.content_name(),
                }),
            }
        }
    )+
}

$(
    impl From<$struct_type> for $enum_name {
        fn from(value: $struct_type) -> Self {
            Self::$variant(value)
        }
    }
)+
        }
    };
}

/// Contains all the variants for an S3P request payload.
#[binrw]
#[brw(big, import(ptype: &PacketType))]
#[derive(Clone, Debug, PartialEq)]
pub enum RequestContent {
    #[br(pre_assert(*ptype == PacketType::ExecCmd))]
    ExecCmd(ExecCmdRequest),
    #[br(pre_assert(*ptype == PacketType::ReadRegs))]
    ReadRegs(ReadRegsRequest),
    #[br(pre_assert(*ptype == PacketType::WriteReg))]
    WriteReg(WriteRegRequest),
    #[br(pre_assert(*ptype == PacketType::ReadVmem))]
    ReadVmem(ReadVmemRequest),
    #[br(pre_assert(*ptype == PacketType::WriteVmem))]
    WriteVmem(WriteVmemRequest),
    #[br(pre_assert(*ptype == PacketType::ReadStrReg))]
    ReadStrReg(ReadStrRegRequest),
    #[br(pre_assert(*ptype == PacketType::WriteStrReg))]
    WriteStrReg(WriteStrRegRequest),
    #[br(pre_assert(*ptype == PacketType::S3pInfo))]
    S3pInfo(S3pInfoRequest),
    #[br(pre_assert(*ptype == PacketType::RegInfo))]
    RegInfo(RegInfoRequest),
    #[br(pre_assert(*ptype == PacketType::VmemInfo))]
    VmemInfo(VmemInfoRequest),
}

/// Contains all the variants for an S3P response payload (after the
/// status code).
#[binrw]
#[brw(big, import(ptype: &PacketType))]
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseContent {
    #[br(pre_assert(*ptype == PacketType::ExecCmdResp))]
    ExecCmd(ExecCmdResponse),
    #[br(pre_assert(*ptype == PacketType::ReadRegsResp))]
    ReadRegs(ReadRegsResponse),
    #[br(pre_assert(*ptype == PacketType::WriteRegResp))]
    WriteReg(WriteRegResponse),
    #[br(pre_assert(*ptype == PacketType::ReadVmemResp))]
    ReadVmem(ReadVmemResponse),
    #[br(pre_assert(*ptype == PacketType::WriteVmemResp))]
    WriteVmem(WriteVmemResponse),
    #[br(pre_assert(*ptype == PacketType::ReadStrRegResp))]
    ReadStrReg(ReadStrRegResponse),
    #[br(pre_assert(*ptype == PacketType::WriteStrRegResp))]
    WriteStrReg(WriteStrRegResponse),
    #[br(pre_assert(*ptype == PacketType::S3pInfoResp))]
    S3pInfo(S3pInfoResponse),
    #[br(pre_assert(*ptype == PacketType::RegInfoResp))]
    RegInfo(RegInfoResponse),
    #[br(pre_assert(*ptype == PacketType::VmemInfoResp))]
    VmemInfo(VmemInfoResponse),
}

make_content_impl! {
    RequestContent,
    {ExecCmd, ExecCmdRequest},
    {ReadRegs, ReadRegsRequest},
    {WriteReg, WriteRegRequest},
    {ReadVmem, ReadVmemRequest},
    {WriteVmem, WriteVmemRequest},
    {ReadStrReg, ReadStrRegRequest},
    {WriteStrReg, WriteStrRegRequest},
    {S3pInfo, S3pInfoRequest},
    {RegInfo, RegInfoRequest},
    {VmemInfo, VmemInfoRequest},
}

make_content_impl! {
    ResponseContent,
    {ExecCmd, ExecCmdResponse},
    {ReadRegs, ReadRegsResponse},
    {WriteReg, WriteRegResponse},
    {ReadVmem, ReadVmemResponse},
    {WriteVmem, WriteVmemResponse},
    {ReadStrReg, ReadStrRegResponse},
    {WriteStrReg, WriteStrRegResponse},
    {S3pInfo, S3pInfoResponse},
    {RegInfo, RegInfoResponse},
    {VmemInfo, VmemInfoResponse},
}

impl RequestContent {
    /// The request type code carrying this content.
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::ExecCmd(_) => PacketType::ExecCmd,
            Self::ReadRegs(_) => PacketType::ReadRegs,
            Self::WriteReg(_) => PacketType::WriteReg,
            Self::ReadVmem(_) => PacketType::ReadVmem,
            Self::WriteVmem(_) => PacketType::WriteVmem,
            Self::ReadStrReg(_) => PacketType::ReadStrReg,
            Self::WriteStrReg(_) => PacketType::WriteStrReg,
            Self::S3pInfo(_) => PacketType::S3pInfo,
            Self::RegInfo(_) => PacketType::RegInfo,
            Self::VmemInfo(_) => PacketType::VmemInfo,
        }
    }

    /// The response type code paired with this request.
    pub fn response_packet_type(&self) -> PacketType {
        match self {
            Self::ExecCmd(_) => PacketType::ExecCmdResp,
            Self::ReadRegs(_) => PacketType::ReadRegsResp,
            Self::WriteReg(_) => PacketType::WriteRegResp,
            Self::ReadVmem(_) => PacketType::ReadVmemResp,
            Self::WriteVmem(_) => PacketType::WriteVmemResp,
            Self::ReadStrReg(_) => PacketType::ReadStrRegResp,
            Self::WriteStrReg(_) => PacketType::WriteStrRegResp,
            Self::S3pInfo(_) => PacketType::S3pInfoResp,
            Self::RegInfo(_) => PacketType::RegInfoResp,
            Self::VmemInfo(_) => PacketType::VmemInfoResp,
        }
    }
}
