//! Binary and textual forms of OPC UA node identifiers.
//!
//! | Tag  | Form    | Layout                                   |
//! |------|---------|------------------------------------------|
//! | 0x00 | TwoByte | value: u8 (namespace 0)                  |
//! | 0x01 | FourByte| namespace: u8, value: u16                |
//! | 0x02 | Numeric | namespace: u16, value: u32               |
//! | 0x03 | String  | namespace: u16, value: String            |
//! | 0x04 | Guid    | namespace: u16, 16 bytes (decoded as null) |
//! | 0x05 | Opaque  | namespace: u16, ByteString (decoded as null) |
//!
//! Only the low nibble of the tag selects the form; the high bits used by
//! expanded identifiers are ignored.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::reader::RecordReader;
use crate::types::{DecodeError, EncodeError};
use crate::writer::RecordBuffer;

const TWO_BYTE: u8 = 0x00;
const FOUR_BYTE: u8 = 0x01;
const NUMERIC: u8 = 0x02;
const STRING: u8 = 0x03;
const GUID: u8 = 0x04;
const OPAQUE: u8 = 0x05;

/// A namespaced address of a node in a server's address space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric { namespace: u16, value: u32 },
    Text { namespace: u16, value: String },
}

impl Identifier {
    /// The type id of the LogRecord structure.
    pub const LOG_RECORD_TYPE: Identifier = Identifier::numeric(0, 5001);
    /// The standard GetRecords method of a LogObject.
    pub const GET_RECORDS_METHOD: Identifier = Identifier::numeric(0, 11550);
    /// The standard ServerLog object.
    pub const SERVER_LOG: Identifier = Identifier::numeric(0, 2042);

    pub const fn numeric(namespace: u16, value: u32) -> Self {
        Identifier::Numeric { namespace, value }
    }

    pub fn text<S: Into<String>>(namespace: u16, value: S) -> Self {
        Identifier::Text {
            namespace,
            value: value.into(),
        }
    }

    /// The null identifier, which represents absence.
    pub const fn null() -> Self {
        Identifier::numeric(0, 0)
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Identifier::Numeric {
                namespace: 0,
                value: 0
            }
        )
    }

    pub fn namespace(&self) -> u16 {
        match self {
            Identifier::Numeric { namespace, .. } | Identifier::Text { namespace, .. } => {
                *namespace
            }
        }
    }

    /// Name of the identifier kind, as used in exported attributes.
    pub fn kind(&self) -> &'static str {
        match self {
            Identifier::Numeric { .. } => "Numeric",
            Identifier::Text { .. } => "String",
        }
    }

    /// The identifier value without its namespace.
    pub fn value_string(&self) -> String {
        match self {
            Identifier::Numeric { value, .. } => value.to_string(),
            Identifier::Text { value, .. } => value.clone(),
        }
    }

    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut buf = RecordBuffer::with_capacity(8);
        write_identifier(&mut buf, Some(self))?;
        Ok(buf.freeze())
    }

    /// Decode an identifier, returning it together with the number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Identifier, usize), DecodeError> {
        let mut r = RecordReader::new(data);
        let id = read_identifier(&mut r);
        let n = r.finish()?;
        Ok((id, n))
    }
}

/// Write an identifier in its most compact form. `None` and the null
/// identifier are written as a TwoByte zero.
pub(crate) fn write_identifier(
    buf: &mut RecordBuffer,
    id: Option<&Identifier>,
) -> Result<(), EncodeError> {
    match id {
        None => {
            buf.byte(TWO_BYTE);
            buf.byte(0);
        }
        Some(Identifier::Numeric { namespace, value }) => {
            let (namespace, value) = (*namespace, *value);
            if let (0, Ok(v)) = (namespace, u8::try_from(value)) {
                buf.byte(TWO_BYTE);
                buf.byte(v);
            } else if let (Ok(ns), Ok(v)) = (u8::try_from(namespace), u16::try_from(value)) {
                buf.byte(FOUR_BYTE);
                buf.byte(ns);
                buf.u16(v);
            } else {
                buf.byte(NUMERIC);
                buf.u16(namespace);
                buf.u32(value);
            }
        }
        Some(Identifier::Text { namespace, value }) => {
            buf.byte(STRING);
            buf.u16(*namespace);
            buf.str(value)?;
        }
    }
    Ok(())
}

pub(crate) fn read_identifier(r: &mut RecordReader<'_>) -> Identifier {
    let tag = r.byte();
    match tag & 0x0F {
        TWO_BYTE => Identifier::numeric(0, u32::from(r.byte())),
        FOUR_BYTE => {
            let namespace = u16::from(r.byte());
            Identifier::numeric(namespace, u32::from(r.uint16()))
        }
        NUMERIC => {
            let namespace = r.uint16();
            Identifier::numeric(namespace, r.uint32())
        }
        STRING => {
            let namespace = r.uint16();
            Identifier::text(namespace, r.string())
        }
        // Guid and opaque identifiers are consumed but not represented.
        GUID => {
            r.uint16();
            r.skip(16);
            Identifier::null()
        }
        OPAQUE => {
            r.uint16();
            r.byte_string();
            Identifier::null()
        }
        _ => Identifier::null(),
    }
}

/// Read an identifier, mapping the null identifier to `None`.
pub(crate) fn read_opt_identifier(r: &mut RecordReader<'_>) -> Option<Identifier> {
    Some(read_identifier(r)).filter(|id| !id.is_null())
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespace = self.namespace();
        if namespace != 0 {
            write!(f, "ns={namespace};")?;
        }
        match self {
            Identifier::Numeric { value, .. } => write!(f, "i={value}"),
            Identifier::Text { value, .. } => write!(f, "s={value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierParseError {
    #[error("invalid namespace in {0:?}")]
    InvalidNamespace(String),
    #[error("invalid numeric identifier in {0:?}")]
    InvalidNumeric(String),
    #[error("unsupported identifier format {0:?} (expected i=<n> or s=<text>)")]
    UnsupportedFormat(String),
}

impl FromStr for Identifier {
    type Err = IdentifierParseError;

    /// Parses `i=2042`, `ns=1;i=100` and `ns=2;s=Boiler`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, rest) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, rest) = rest
                    .split_once(';')
                    .ok_or_else(|| IdentifierParseError::UnsupportedFormat(s.to_string()))?;
                let ns = ns
                    .parse::<u16>()
                    .map_err(|_| IdentifierParseError::InvalidNamespace(s.to_string()))?;
                (ns, rest)
            }
            None => (0, s),
        };

        if let Some(value) = rest.strip_prefix("i=") {
            let value = value
                .parse::<u32>()
                .map_err(|_| IdentifierParseError::InvalidNumeric(s.to_string()))?;
            Ok(Identifier::numeric(namespace, value))
        } else if let Some(value) = rest.strip_prefix("s=") {
            Ok(Identifier::text(namespace, value))
        } else {
            Err(IdentifierParseError::UnsupportedFormat(s.to_string()))
        }
    }
}
