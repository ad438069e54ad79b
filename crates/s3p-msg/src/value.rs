//! Tagged values carried by register operations.
//!
//! Scalar values (every tag but `STR`) travel inside a fixed record:
//! 1-byte tag followed by 4 value bytes, big-endian, right-justified and
//! zero-padded. The tag, not the field width, decides how many of those
//! bytes are meaningful — and the sign, for the signed tags. The `X`
//! tags are display hints only and are wire-identical to their unsigned
//! twins.

use std::io::{Read, Seek, Write};

use binrw::prelude::*;
use binrw::{Endian, NullString};

/// Value type tag, one byte on the wire.
#[binrw]
#[brw(repr(u8))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    /// Sentinel, "no value".
    Empty = 0,
    U8 = 1,
    I8 = 2,
    /// Unsigned 8, rendered in hex.
    X8 = 3,
    U16 = 4,
    I16 = 5,
    /// Unsigned 16, rendered in hex.
    X16 = 6,
    U32 = 7,
    I32 = 8,
    /// Unsigned 32, rendered in hex.
    X32 = 9,
    /// IEEE-754 single.
    Flt = 10,
    /// Null-terminated string, at most 255 bytes including the NUL.
    Str = 11,
}

impl ValueType {
    /// Whether the tag is a fixed-width scalar (anything but `Str`).
    pub fn is_scalar(self) -> bool {
        self != Self::Str
    }

    /// Short text name, as accepted by [`ValueType::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "ee",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::X8 => "x8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::X16 => "x16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::X32 => "x32",
            Self::Flt => "flt",
            Self::Str => "str",
        }
    }

    /// Parses a text tag name. Unknown names map to [`ValueType::Empty`].
    pub fn from_name(name: &str) -> ValueType {
        const ALL: [ValueType; 12] = [
            ValueType::Empty,
            ValueType::U8,
            ValueType::I8,
            ValueType::X8,
            ValueType::U16,
            ValueType::I16,
            ValueType::X16,
            ValueType::U32,
            ValueType::I32,
            ValueType::X32,
            ValueType::Flt,
            ValueType::Str,
        ];
        ALL.into_iter()
            .find(|vt| vt.name() == name)
            .unwrap_or(ValueType::Empty)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed S3P value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Empty,
    U8(u8),
    I8(i8),
    /// Same wire form as [`Value::U8`], hex display.
    X8(u8),
    U16(u16),
    I16(i16),
    /// Same wire form as [`Value::U16`], hex display.
    X16(u16),
    U32(u32),
    I32(i32),
    /// Same wire form as [`Value::U32`], hex display.
    X32(u32),
    Flt(f32),
    Str(String),
}

impl Value {
    /// The tag for this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Empty => ValueType::Empty,
            Self::U8(_) => ValueType::U8,
            Self::I8(_) => ValueType::I8,
            Self::X8(_) => ValueType::X8,
            Self::U16(_) => ValueType::U16,
            Self::I16(_) => ValueType::I16,
            Self::X16(_) => ValueType::X16,
            Self::U32(_) => ValueType::U32,
            Self::I32(_) => ValueType::I32,
            Self::X32(_) => ValueType::X32,
            Self::Flt(_) => ValueType::Flt,
            Self::Str(_) => ValueType::Str,
        }
    }

    /// Whether the value fits the fixed scalar record.
    pub fn is_scalar(&self) -> bool {
        self.value_type().is_scalar()
    }

    /// The raw bits as placed in the 4-byte record field: right-justified
    /// and zero-padded, never sign-extended.
    ///
    /// Fails with [`S3pMsgError::NotScalar`][crate::S3pMsgError::NotScalar]
    /// for string values.
    pub fn scalar_bits(&self) -> crate::Result<u32> {
        Ok(match *self {
            Self::Empty => 0,
            Self::U8(v) | Self::X8(v) => u32::from(v),
            Self::I8(v) => u32::from(v as u8),
            Self::U16(v) | Self::X16(v) => u32::from(v),
            Self::I16(v) => u32::from(v as u16),
            Self::U32(v) | Self::X32(v) => v,
            Self::I32(v) => v as u32,
            Self::Flt(v) => v.to_bits(),
            Self::Str(_) => return Err(crate::S3pMsgError::NotScalar),
        })
    }

    /// Rebuilds a scalar value from its tag and the 32-bit record field.
    /// The tag selects the low bytes; upper bytes are ignored.
    pub fn from_scalar_bits(vt: ValueType, bits: u32) -> crate::Result<Value> {
        Ok(match vt {
            ValueType::Empty => Self::Empty,
            ValueType::U8 => Self::U8(bits as u8),
            ValueType::I8 => Self::I8(bits as u8 as i8),
            ValueType::X8 => Self::X8(bits as u8),
            ValueType::U16 => Self::U16(bits as u16),
            ValueType::I16 => Self::I16(bits as u16 as i16),
            ValueType::X16 => Self::X16(bits as u16),
            ValueType::U32 => Self::U32(bits),
            ValueType::I32 => Self::I32(bits as i32),
            ValueType::X32 => Self::X32(bits),
            ValueType::Flt => Self::Flt(f32::from_bits(bits)),
            ValueType::Str => return Err(crate::S3pMsgError::NotScalar),
        })
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("EMPTY"),
            Self::U8(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::X8(v) => write!(f, "0x{v:X}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::X16(v) => write!(f, "0x{v:X}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::X32(v) => write!(f, "0x{v:X}"),
            Self::Flt(v) => write!(f, "{v:.3}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

// The scalar record form: tag byte + 4 value bytes. String values never
// use this path; they are carried null-terminated by the dedicated
// string register messages.
impl BinRead for Value {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let vt = ValueType::read_options(reader, endian, ())?;
        let bits = u32::read_options(reader, Endian::Big, ())?;
        Value::from_scalar_bits(vt, bits).map_err(|_| binrw::Error::AssertFail {
            pos,
            message: "string tag in scalar record".into(),
        })
    }
}

impl BinWrite for Value {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<()> {
        let bits = self.scalar_bits().map_err(|_| binrw::Error::AssertFail {
            pos: 0,
            message: "string tag in scalar record".into(),
        })?;
        self.value_type().write_options(writer, endian, ())?;
        bits.write_options(writer, Endian::Big, ())
    }
}

/// Converts a wire string into UTF-8, replacing invalid sequences.
///
/// Node-sent names and string registers are raw null-terminated bytes;
/// display must never fail on them.
pub fn lossy_string(s: &NullString) -> String {
    String::from_utf8_lossy(&s.0).into_owned()
}
