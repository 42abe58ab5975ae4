//! Conversion of decoded records into a normalized, transport-neutral shape.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use opcua_logrecord::{classify, Identifier, LogRecord, Scalar, SeverityTier};

/// Namespaced identity of the node that emitted a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    pub namespace: u16,
    /// `"Numeric"` or `"String"`.
    pub id_type: &'static str,
    pub id: String,
}

impl From<&Identifier> for SourceIdentity {
    fn from(id: &Identifier) -> Self {
        SourceIdentity {
            namespace: id.namespace(),
            id_type: id.kind(),
            id: id.value_string(),
        }
    }
}

/// A log record normalized for downstream telemetry pipelines.
///
/// Trace fields are lowercase hex and empty when the record carried no
/// trace context.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub time: Option<DateTime<Utc>>,
    pub severity: u16,
    pub severity_tier: SeverityTier,
    /// Normalized ordinal, see [`opcua_logrecord::SeverityLevel`].
    pub severity_number: i32,
    pub body: String,
    pub source_name: Option<String>,
    pub source: Option<SourceIdentity>,
    pub event_type: Option<String>,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: String,
    pub parent_origin: Option<String>,
    pub attributes: IndexMap<String, Scalar>,
}

impl CanonicalRecord {
    pub fn severity_text(&self) -> &'static str {
        self.severity_tier.as_str()
    }

    pub fn has_trace_context(&self) -> bool {
        !self.span_id.is_empty()
    }
}

impl From<LogRecord> for CanonicalRecord {
    fn from(record: LogRecord) -> Self {
        let (severity_tier, level) = classify(record.severity.into());

        let (trace_id, span_id, parent_span_id, parent_origin) = match record.trace_context {
            Some(tc) => (
                tc.trace_id_hex(),
                tc.span_id_hex(),
                tc.parent_span_id_hex(),
                tc.parent_identifier,
            ),
            None => Default::default(),
        };

        CanonicalRecord {
            time: record.time,
            severity: record.severity,
            severity_tier,
            severity_number: level.number(),
            body: record.message,
            source_name: record.source_name,
            source: record.source_node.as_ref().map(SourceIdentity::from),
            event_type: record.event_type.as_ref().map(ToString::to_string),
            trace_id,
            span_id,
            parent_span_id,
            parent_origin,
            attributes: record.attributes,
        }
    }
}
