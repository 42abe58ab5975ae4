use bytes::Bytes;
use indexmap::IndexMap;

use crate::identifier::{read_opt_identifier, write_identifier};
use crate::reader::RecordReader;
use crate::scalar::{read_scalar, write_scalar, Scalar};
use crate::types::*;
use crate::writer::RecordBuffer;

// LocalizedText encoding mask bits.
const HAS_LOCALE: u8 = 0x01;
const HAS_TEXT: u8 = 0x02;

/// Request mask selecting every optional LogRecord field
/// (event type, source node, source name, trace context, additional data).
pub const ALL_OPTIONAL_FIELDS: u32 = 0x1F;

/// Decode a single LogRecord from the start of `data`.
///
/// Returns the record and the number of bytes consumed. Bytes after the
/// record are left untouched so the record can be embedded in a larger
/// payload.
pub fn decode_record(data: &[u8]) -> Result<(LogRecord, usize), DecodeError> {
    let mut r = RecordReader::new(data);
    let record = r.log_record();
    let n = r.finish()?;
    Ok((record, n))
}

/// Encode a LogRecord with all optional fields present.
pub fn encode_record(record: &LogRecord) -> Result<Bytes, EncodeError> {
    let mut buf = RecordBuffer::with_capacity(64 + record.message.len());
    buf.log_record(record)?;
    Ok(buf.freeze())
}

impl RecordReader<'_> {
    fn log_record(&mut self) -> LogRecord {
        let time = ticks_to_time(self.int64());
        let severity = self.uint16();
        let event_type = read_opt_identifier(self);
        let source_node = read_opt_identifier(self);
        let source_name = self.opt_string();
        let message = self.localized_text();
        let trace_context = self.trace_context();
        let attributes = self.attributes();

        LogRecord {
            time,
            severity,
            message,
            event_type,
            source_node,
            source_name,
            trace_context,
            attributes,
        }
    }

    /// Read a LocalizedText, discarding the locale.
    fn localized_text(&mut self) -> String {
        let mask = self.byte();
        if mask & HAS_LOCALE != 0 {
            self.opt_string();
        }
        if mask & HAS_TEXT != 0 {
            self.string()
        } else {
            String::new()
        }
    }

    /// The trace context is always present on the wire; a zero span id
    /// means the record carries none.
    fn trace_context(&mut self) -> Option<TraceContext> {
        // The GUID fields are little-endian integers whose wire bytes equal
        // the W3C trace id bytes.
        let mut trace_id = [0u8; 16];
        trace_id[0..4].copy_from_slice(&self.uint32().to_le_bytes());
        trace_id[4..6].copy_from_slice(&self.uint16().to_le_bytes());
        trace_id[6..8].copy_from_slice(&self.uint16().to_le_bytes());
        trace_id[8..16].copy_from_slice(&self.fixed::<8>());

        let span_id = self.uint64();
        let parent_span_id = self.uint64();
        let parent_identifier = self.opt_string();

        if span_id == 0 {
            return None;
        }
        Some(TraceContext {
            trace_id,
            span_id,
            parent_span_id,
            parent_identifier,
        })
    }

    fn attributes(&mut self) -> IndexMap<String, Scalar> {
        // Int32 count on the wire; -1 is a null array.
        let count = self.uint32() as i32;
        if count <= 0 {
            return IndexMap::new();
        }

        let mut attributes = IndexMap::with_capacity((count as usize).min(self.remaining()));
        for _ in 0..count {
            let name = self.opt_string();
            let value = read_scalar(self);
            if self.has_error() {
                break;
            }
            if let Some(name) = name {
                attributes.insert(name, value);
            }
        }
        attributes
    }
}

impl RecordBuffer {
    fn log_record(&mut self, record: &LogRecord) -> Result<(), EncodeError> {
        let ticks = match &record.time {
            Some(time) => time_to_ticks(time)?,
            None => 0,
        };
        self.i64(ticks);
        self.u16(record.severity);
        write_identifier(self, record.event_type.as_ref())?;
        write_identifier(self, record.source_node.as_ref())?;
        self.opt_str(record.source_name.as_deref())?;

        self.byte(HAS_TEXT);
        self.str(&record.message)?;

        self.trace_context(record.trace_context.as_ref())?;
        self.attributes(&record.attributes)
    }

    fn trace_context(&mut self, tc: Option<&TraceContext>) -> Result<(), EncodeError> {
        let Some(tc) = tc else {
            self.bytes(&[0u8; 16]);
            self.u64(0);
            self.u64(0);
            return self.opt_str(None);
        };
        if tc.span_id == 0 {
            return Err(EncodeError::ZeroSpanId);
        }

        let id = &tc.trace_id;
        self.u32(u32::from_le_bytes([id[0], id[1], id[2], id[3]]));
        self.u16(u16::from_le_bytes([id[4], id[5]]));
        self.u16(u16::from_le_bytes([id[6], id[7]]));
        self.bytes(&[id[8], id[9], id[10], id[11], id[12], id[13], id[14], id[15]]);
        self.u64(tc.span_id);
        self.u64(tc.parent_span_id);
        self.opt_str(tc.parent_identifier.as_deref())
    }

    fn attributes(&mut self, attributes: &IndexMap<String, Scalar>) -> Result<(), EncodeError> {
        let count =
            i32::try_from(attributes.len()).map_err(|_| EncodeError::TooLong(attributes.len()))?;
        self.u32(count as u32);
        for (key, value) in attributes {
            self.str(key)?;
            write_scalar(self, value).map_err(|source| EncodeError::Attribute {
                key: key.clone(),
                source: Box::new(source),
            })?;
        }
        Ok(())
    }
}
