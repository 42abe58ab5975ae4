//! Binary codec for OPC UA `LogRecord` structures.
//!
//! This crate encodes and decodes the LogRecord DataType (`i=5001`) used by
//! the `GetRecords` method of OPC UA log objects, and classifies raw
//! severities into named tiers.
//!
//! # Wire format
//!
//! All integers are little-endian. Strings carry an `Int32` length prefix
//! where `-1` is null.
//!
//! | Field          | Encoding                                              |
//! |----------------|-------------------------------------------------------|
//! | Time           | `Int64` 100ns ticks since 1601-01-01 UTC              |
//! | Severity       | `UInt16`                                              |
//! | EventType      | NodeId                                                |
//! | SourceNode     | NodeId                                                |
//! | SourceName     | String                                                |
//! | Message        | LocalizedText (mask byte, optional locale, text)      |
//! | TraceContext   | Guid trace id, `UInt64` span, `UInt64` parent, String |
//! | AdditionalData | `Int32` count, then (String name, Variant value)      |
//!
//! # Usage
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use opcua_logrecord::{decode_record, encode_record, Identifier, LogRecord};
//!
//! let time = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
//! let record = LogRecord::new(time, 300, "Configuration loaded successfully")
//!     .with_source_name("SystemComponent")
//!     .with_source_node(Identifier::numeric(1, 100));
//!
//! let bytes = encode_record(&record).unwrap();
//! let (decoded, consumed) = decode_record(&bytes).unwrap();
//! assert_eq!(decoded, record);
//! assert_eq!(consumed, bytes.len());
//! ```

pub mod identifier;
pub mod scalar;
pub mod severity;
pub mod trace;
pub mod types;
mod reader;
mod record;
mod writer;

pub use identifier::{Identifier, IdentifierParseError};
pub use record::{decode_record, encode_record, ALL_OPTIONAL_FIELDS};
pub use scalar::Scalar;
pub use severity::{classify, SeverityLevel, SeverityTier, UnknownSeverity};
pub use trace::{span_id_from_hex, span_id_hex, trace_id_from_hex, trace_id_hex, TraceHexError};
pub use types::{
    ticks_to_time, time_to_ticks, DecodeError, EncodeError, LogRecord, TraceContext,
    UNIX_EPOCH_TICKS,
};
