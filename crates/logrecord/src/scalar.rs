//! Scalar variant values used for LogRecord additional data.

use std::fmt;

use bytes::Bytes;

use crate::reader::RecordReader;
use crate::types::{DecodeError, EncodeError};
use crate::writer::RecordBuffer;

// Built-in type ids (low 6 bits of the variant encoding byte).
const NULL: u8 = 0;
const BOOLEAN: u8 = 1;
const SBYTE: u8 = 2;
const BYTE: u8 = 3;
const INT16: u8 = 4;
const UINT16: u8 = 5;
const INT32: u8 = 6;
const UINT32: u8 = 7;
const INT64: u8 = 8;
const UINT64: u8 = 9;
const FLOAT: u8 = 10;
const DOUBLE: u8 = 11;
const STRING: u8 = 12;

const TYPE_MASK: u8 = 0x3F;

/// A single scalar variant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// The empty variant.
    Null,
    Bool(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    /// A value whose type tag is not supported. It carries no value and
    /// cannot be encoded again.
    Unsupported(u8),
}

impl Scalar {
    /// The built-in type id written on the wire for this value.
    pub fn type_id(&self) -> u8 {
        match self {
            Scalar::Null => NULL,
            Scalar::Bool(_) => BOOLEAN,
            Scalar::SByte(_) => SBYTE,
            Scalar::Byte(_) => BYTE,
            Scalar::Int16(_) => INT16,
            Scalar::UInt16(_) => UINT16,
            Scalar::Int32(_) => INT32,
            Scalar::UInt32(_) => UINT32,
            Scalar::Int64(_) => INT64,
            Scalar::UInt64(_) => UINT64,
            Scalar::Float(_) => FLOAT,
            Scalar::Double(_) => DOUBLE,
            Scalar::String(_) => STRING,
            Scalar::Unsupported(tag) => *tag,
        }
    }

    /// Whether this value carries data.
    pub fn has_value(&self) -> bool {
        !matches!(self, Scalar::Null | Scalar::Unsupported(_))
    }

    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut buf = RecordBuffer::with_capacity(9);
        write_scalar(&mut buf, self)?;
        Ok(buf.freeze())
    }

    /// Decode a value, returning it together with the number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Scalar, usize), DecodeError> {
        let mut r = RecordReader::new(data);
        let value = read_scalar(&mut r);
        let n = r.finish()?;
        Ok((value, n))
    }
}

pub(crate) fn write_scalar(buf: &mut RecordBuffer, value: &Scalar) -> Result<(), EncodeError> {
    if let Scalar::Unsupported(tag) = value {
        return Err(EncodeError::UnsupportedScalar(*tag));
    }
    buf.byte(value.type_id());
    match value {
        Scalar::Null | Scalar::Unsupported(_) => {}
        Scalar::Bool(v) => buf.bool(*v),
        Scalar::SByte(v) => buf.i8(*v),
        Scalar::Byte(v) => buf.byte(*v),
        Scalar::Int16(v) => buf.i16(*v),
        Scalar::UInt16(v) => buf.u16(*v),
        Scalar::Int32(v) => buf.i32(*v),
        Scalar::UInt32(v) => buf.u32(*v),
        Scalar::Int64(v) => buf.i64(*v),
        Scalar::UInt64(v) => buf.u64(*v),
        Scalar::Float(v) => buf.f32(*v),
        Scalar::Double(v) => buf.f64(*v),
        Scalar::String(v) => buf.str(v)?,
    }
    Ok(())
}

/// Read a variant value. Unknown type ids consume only the encoding byte
/// and yield [`Scalar::Unsupported`].
pub(crate) fn read_scalar(r: &mut RecordReader<'_>) -> Scalar {
    let tag = r.byte() & TYPE_MASK;
    match tag {
        NULL => Scalar::Null,
        BOOLEAN => Scalar::Bool(r.bool_val()),
        SBYTE => Scalar::SByte(r.int8()),
        BYTE => Scalar::Byte(r.byte()),
        INT16 => Scalar::Int16(r.int16()),
        UINT16 => Scalar::UInt16(r.uint16()),
        INT32 => Scalar::Int32(r.int32()),
        UINT32 => Scalar::UInt32(r.uint32()),
        INT64 => Scalar::Int64(r.int64()),
        UINT64 => Scalar::UInt64(r.uint64()),
        FLOAT => Scalar::Float(r.float32()),
        DOUBLE => Scalar::Double(r.float64()),
        STRING => Scalar::String(r.string()),
        other => Scalar::Unsupported(other),
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::SByte(v) => write!(f, "{v}"),
            Scalar::Byte(v) => write!(f, "{v}"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::UInt16(v) => write!(f, "{v}"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::UInt32(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::UInt64(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Double(v) => write!(f, "{v}"),
            Scalar::String(v) => f.write_str(v),
            Scalar::Unsupported(tag) => write!(f, "<unsupported type {tag}>"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => SByte,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}
