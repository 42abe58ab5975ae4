//! Record payloads returned by GetRecords and the table that decodes them.

use std::collections::HashMap;

use bytes::Bytes;
use opcua_logrecord::{decode_record, DecodeError, Identifier, LogRecord};

/// One element of the records output argument.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPayload {
    /// The data type id the body was encoded with.
    pub type_id: Identifier,
    pub body: PayloadBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadBody {
    /// Already decoded by the remote type registry.
    Structured(LogRecord),
    /// An undecoded binary body.
    Raw(Bytes),
    /// No body at all.
    Empty,
}

impl RecordPayload {
    pub fn structured(record: LogRecord) -> Self {
        Self {
            type_id: Identifier::LOG_RECORD_TYPE,
            body: PayloadBody::Structured(record),
        }
    }

    pub fn raw(type_id: Identifier, body: Bytes) -> Self {
        Self {
            type_id,
            body: PayloadBody::Raw(body),
        }
    }

    pub fn empty(type_id: Identifier) -> Self {
        Self {
            type_id,
            body: PayloadBody::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("decoding record of type {type_id}: {source}")]
    Decode {
        type_id: Identifier,
        #[source]
        source: DecodeError,
    },
    #[error("no decoder for type {type_id} and the body is not a log record: {source}")]
    UnrecognizedType {
        type_id: Identifier,
        #[source]
        source: DecodeError,
    },
    #[error("record of type {0} has no body")]
    Empty(Identifier),
}

/// Decodes a binary body into a record.
pub type Decoder = fn(&[u8]) -> Result<LogRecord, DecodeError>;

fn decode_log_record(data: &[u8]) -> Result<LogRecord, DecodeError> {
    decode_record(data).map(|(record, _)| record)
}

#[derive(Debug, Clone, Copy)]
enum Codec {
    /// The standard LogRecord structure. Nothing to fall back to.
    LogRecord,
    Custom(Decoder),
}

/// Binary decoders keyed by data type id.
///
/// Bodies whose type has no registered decoder, or whose custom decoder
/// fails, are retried as a plain LogRecord before being rejected. This covers
/// servers that register the structure under a different namespace.
#[derive(Debug, Clone)]
pub struct CodecTable {
    decoders: HashMap<Identifier, Codec>,
}

impl CodecTable {
    /// A table with no registered decoders.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    pub fn register(&mut self, type_id: Identifier, decoder: Decoder) -> &mut Self {
        self.decoders.insert(type_id, Codec::Custom(decoder));
        self
    }

    pub fn is_registered(&self, type_id: &Identifier) -> bool {
        self.decoders.contains_key(type_id)
    }

    pub fn decode(&self, payload: RecordPayload) -> Result<LogRecord, RecordError> {
        let RecordPayload { type_id, body } = payload;
        let data = match body {
            PayloadBody::Structured(record) => return Ok(record),
            PayloadBody::Empty => return Err(RecordError::Empty(type_id)),
            PayloadBody::Raw(data) if data.is_empty() => return Err(RecordError::Empty(type_id)),
            PayloadBody::Raw(data) => data,
        };

        let registered = match self.decoders.get(&type_id) {
            Some(Codec::LogRecord) => {
                return decode_log_record(&data)
                    .map_err(|source| RecordError::Decode { type_id, source });
            }
            Some(Codec::Custom(decoder)) => match decoder(&data[..]) {
                Ok(record) => return Ok(record),
                Err(err) => Some(err),
            },
            None => None,
        };

        log::debug!(
            "falling back to manual LogRecord decoding for type {} ({} bytes)",
            type_id,
            data.len()
        );
        match decode_log_record(&data) {
            Ok(record) => Ok(record),
            Err(source) => match registered {
                Some(source) => Err(RecordError::Decode { type_id, source }),
                None => Err(RecordError::UnrecognizedType { type_id, source }),
            },
        }
    }
}

impl Default for CodecTable {
    /// A table with the standard LogRecord structure registered.
    fn default() -> Self {
        let mut table = Self::empty();
        table
            .decoders
            .insert(Identifier::LOG_RECORD_TYPE, Codec::LogRecord);
        table
    }
}
