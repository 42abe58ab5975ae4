use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

use crate::identifier::Identifier;
use crate::scalar::Scalar;
use crate::trace;

// === Error types ===

/// Errors that can occur while decoding binary data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("invalid length prefix {len} at offset {offset}")]
    InvalidLength { len: i32, offset: usize },
}

/// Errors that can occur while encoding a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("time {0} is outside the representable tick range")]
    TimeOutOfRange(DateTime<Utc>),

    #[error("value of length {0} exceeds the maximum length prefix")]
    TooLong(usize),

    #[error("scalar with type tag {0} has no wire encoding")]
    UnsupportedScalar(u8),

    #[error("trace context with a zero span id cannot be encoded")]
    ZeroSpanId,

    #[error("attribute {key:?}: {source}")]
    Attribute {
        key: String,
        #[source]
        source: Box<EncodeError>,
    },
}

// === Time ===

/// Number of 100ns ticks between 1601-01-01 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;

/// Convert a tick count to a UTC instant. Non-positive ticks mean "unset".
pub fn ticks_to_time(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 {
        return None;
    }
    let unix_ticks = ticks - UNIX_EPOCH_TICKS;
    let secs = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = unix_ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    DateTime::from_timestamp(secs, nanos as u32)
}

/// Convert a UTC instant to a tick count, truncating to 100ns precision.
pub fn time_to_ticks(time: &DateTime<Utc>) -> Result<i64, EncodeError> {
    let sub_ticks = i64::from(time.timestamp_subsec_nanos()) / NANOS_PER_TICK;
    time.timestamp()
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(sub_ticks))
        .and_then(|t| t.checked_add(UNIX_EPOCH_TICKS))
        .filter(|t| *t > 0)
        .ok_or(EncodeError::TimeOutOfRange(*time))
}

// === Records ===

/// Distributed tracing correlation data carried inline in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// Raw W3C trace id bytes (identical to the GUID wire bytes).
    pub trace_id: [u8; 16],
    /// Span id as a big-endian numeric value. Zero means "no trace context".
    pub span_id: u64,
    /// Zero for a root span.
    pub parent_span_id: u64,
    pub parent_identifier: Option<String>,
}

impl TraceContext {
    pub fn new(trace_id: [u8; 16], span_id: u64) -> Self {
        Self {
            trace_id,
            span_id,
            parent_span_id: 0,
            parent_identifier: None,
        }
    }

    pub fn with_parent(self, parent_span_id: u64) -> Self {
        Self {
            parent_span_id,
            ..self
        }
    }

    pub fn with_parent_identifier<S: Into<String>>(self, parent_identifier: S) -> Self {
        Self {
            parent_identifier: Some(parent_identifier.into()),
            ..self
        }
    }

    pub fn trace_id_hex(&self) -> String {
        trace::trace_id_hex(&self.trace_id, self.span_id)
    }

    pub fn span_id_hex(&self) -> String {
        trace::span_id_hex(self.span_id)
    }

    /// Empty for root spans.
    pub fn parent_span_id_hex(&self) -> String {
        trace::span_id_hex(self.parent_span_id)
    }
}

/// A decoded OPC UA LogRecord.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// `None` when the record carried no (or a non-positive) timestamp.
    pub time: Option<DateTime<Utc>>,
    pub severity: u16,
    pub message: String,
    pub event_type: Option<Identifier>,
    pub source_node: Option<Identifier>,
    pub source_name: Option<String>,
    pub trace_context: Option<TraceContext>,
    /// Additional data in wire order. Equality ignores ordering.
    pub attributes: IndexMap<String, Scalar>,
}

impl LogRecord {
    pub const MIN_SEVERITY: u16 = 1;
    pub const MAX_SEVERITY: u16 = 1000;

    /// Create a record with only the mandatory fields.
    ///
    /// The severity is clamped to `1..=1000`.
    pub fn new<S: Into<String>>(time: DateTime<Utc>, severity: u16, message: S) -> Self {
        Self {
            time: Some(time),
            severity: severity.clamp(Self::MIN_SEVERITY, Self::MAX_SEVERITY),
            message: message.into(),
            event_type: None,
            source_node: None,
            source_name: None,
            trace_context: None,
            attributes: IndexMap::new(),
        }
    }

    pub fn with_event_type(self, event_type: Identifier) -> Self {
        Self {
            event_type: Some(event_type),
            ..self
        }
    }

    pub fn with_source_node(self, source_node: Identifier) -> Self {
        Self {
            source_node: Some(source_node),
            ..self
        }
    }

    pub fn with_source_name<S: Into<String>>(self, source_name: S) -> Self {
        Self {
            source_name: Some(source_name.into()),
            ..self
        }
    }

    pub fn with_trace_context(self, trace_context: TraceContext) -> Self {
        Self {
            trace_context: Some(trace_context),
            ..self
        }
    }

    pub fn with_attribute<K: Into<String>, V: Into<Scalar>>(mut self, key: K, value: V) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn trace_id_hex(&self) -> String {
        self.trace_context
            .as_ref()
            .map(TraceContext::trace_id_hex)
            .unwrap_or_default()
    }

    pub fn span_id_hex(&self) -> String {
        self.trace_context
            .as_ref()
            .map(TraceContext::span_id_hex)
            .unwrap_or_default()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self
            .time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .unwrap_or_default();
        let source = self
            .source_node
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        write!(
            f,
            "LogRecord{{Time: {}, Severity: {}, Message: {:?}, SourceName: {:?}, SourceNode: {:?}, TraceID: {:?}, SpanID: {:016x}, AdditionalData: {}}}",
            time,
            self.severity,
            self.message,
            self.source_name.as_deref().unwrap_or_default(),
            source,
            self.trace_id_hex(),
            self.trace_context.as_ref().map_or(0, |tc| tc.span_id),
            self.attributes.len(),
        )
    }
}
