//! Register read/write messages, scalar and string.

use std::io::{Read, Seek, SeekFrom, Write};

use binrw::prelude::*;
use binrw::{Endian, NullString};

use crate::value::{Value, ValueType};
use crate::{MAX_STR_SIZE, Result};

/// Size of a single serialized reg value inside a
/// [`ReadRegsResponse`]: id (2) + tag (1) + value field (4).
pub const SER_ITEM_SIZE: usize = 7;

/// One register value record in the fixed 7-byte form.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct RegValue {
    pub id: u16,
    pub value: Value,
}

/// Reads up to `count` registers starting from `first_id`, following
/// the node's walk order. The node may return fewer records than asked
/// for, when it hits its payload cap or an invalid id.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct ReadRegsRequest {
    pub first_id: u16,
    pub count: u16,
}

/// A run of 7-byte records. Records are consumed while at least
/// [`SER_ITEM_SIZE`] payload bytes remain; a shorter tail is ignored.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ReadRegsResponse {
    pub values: Vec<RegValue>,
}

impl BinRead for ReadRegsResponse {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut pos = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(pos))?;

        let mut values = Vec::new();
        while pos + SER_ITEM_SIZE as u64 <= end {
            values.push(RegValue::read_options(reader, endian, ())?);
            pos = reader.stream_position()?;
        }
        Ok(ReadRegsResponse { values })
    }
}

impl BinWrite for ReadRegsResponse {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<()> {
        for value in &self.values {
            value.write_options(writer, endian, ())?;
        }
        Ok(())
    }
}

/// Writes one scalar register. The value travels in the same
/// right-justified 4-byte field as read records; the node uses the tag
/// to pick the low bytes.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct WriteRegRequest {
    pub reg_id: u16,
    pub value: Value,
}

/// Success carries no payload beyond the status code.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct WriteRegResponse {}

/// Reads a string register.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct ReadStrRegRequest {
    pub reg_id: u16,
}

/// Echoes the id and tag, then the null-terminated string value.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct ReadStrRegResponse {
    pub reg_id: u16,
    pub vt: ValueType,
    #[br(assert(value.len() < MAX_STR_SIZE))]
    pub value: NullString,
}

/// Writes a string register. The string is transmitted as `strlen + 1`
/// bytes; a payload without the NUL is malformed.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct WriteStrRegRequest {
    pub reg_id: u16,
    #[brw(assert(value.len() < MAX_STR_SIZE))]
    pub value: NullString,
}

/// Success carries no payload beyond the status code.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct WriteStrRegResponse {}

impl ReadStrRegResponse {
    /// The string value as lossy UTF-8.
    pub fn value_string(&self) -> String {
        crate::value::lossy_string(&self.value)
    }
}

impl WriteStrRegRequest {
    /// Builds a write request after checking the string fits the wire
    /// cap.
    pub fn new(reg_id: u16, value: &str) -> Result<WriteStrRegRequest> {
        if value.len() + 1 > MAX_STR_SIZE {
            return Err(crate::S3pMsgError::PayloadTooLarge {
                len: value.len() + 1,
            });
        }
        Ok(WriteStrRegRequest {
            reg_id,
            value: NullString::from(value),
        })
    }
}
