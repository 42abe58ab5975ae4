//! Conversions between wire trace identifiers and their W3C hex forms.
//!
//! A zero span id means no trace context was present. In that case the hex
//! forms are empty strings, never a literal zero-valued id.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TraceHexError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected {expected} hex characters, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Returns the trace id as 32 lowercase hex characters, or an empty string
/// when `span_id` is zero.
pub fn trace_id_hex(trace_id: &[u8; 16], span_id: u64) -> String {
    if span_id == 0 {
        return String::new();
    }
    hex::encode(trace_id)
}

/// Returns the span id as 16 lowercase hex characters, or an empty string
/// when it is zero.
pub fn span_id_hex(span_id: u64) -> String {
    if span_id == 0 {
        return String::new();
    }
    hex::encode(span_id.to_be_bytes())
}

/// Parses a 32-character hex trace id. Empty text yields `None`.
pub fn trace_id_from_hex(s: &str) -> Result<Option<[u8; 16]>, TraceHexError> {
    if s.is_empty() {
        return Ok(None);
    }
    if s.len() != 32 {
        return Err(TraceHexError::Length {
            expected: 32,
            actual: s.len(),
        });
    }
    let mut out = [0u8; 16];
    hex::decode_to_slice(s, &mut out)?;
    Ok(Some(out))
}

/// Parses a 16-character hex span id. Empty text yields zero (absent).
pub fn span_id_from_hex(s: &str) -> Result<u64, TraceHexError> {
    if s.is_empty() {
        return Ok(0);
    }
    if s.len() != 16 {
        return Err(TraceHexError::Length {
            expected: 16,
            actual: s.len(),
        });
    }
    let mut out = [0u8; 8];
    hex::decode_to_slice(s, &mut out)?;
    Ok(u64::from_be_bytes(out))
}
