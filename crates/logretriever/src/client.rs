//! The transport seam: a remote method call on a log object.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opcua_logrecord::Identifier;

use crate::payload::RecordPayload;

/// Status of a completed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const GOOD: StatusCode = StatusCode(0);
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);
    pub const BAD_CONTINUATION_POINT_INVALID: StatusCode = StatusCode(0x804A_0000);
    pub const BAD_INVALID_ARGUMENT: StatusCode = StatusCode(0x80AB_0000);

    /// Severity bits `10` mark a bad status.
    pub fn is_bad(self) -> bool {
        self.0 & 0xC000_0000 == 0x8000_0000
    }

    pub fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    pub fn name(self) -> Option<&'static str> {
        match self {
            StatusCode::GOOD => Some("Good"),
            StatusCode::BAD_UNEXPECTED_ERROR => Some("BadUnexpectedError"),
            StatusCode::BAD_CONTINUATION_POINT_INVALID => Some("BadContinuationPointInvalid"),
            StatusCode::BAD_INVALID_ARGUMENT => Some("BadInvalidArgument"),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08X})", self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

/// An input argument of a method call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    DateTime(DateTime<Utc>),
    UInt32(u32),
    UInt16(u16),
    /// `None` is a null byte string.
    ByteString(Option<Bytes>),
}

/// An output argument of a method call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputArgument {
    Records(Vec<RecordPayload>),
    ByteString(Option<Bytes>),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub status: StatusCode,
    pub outputs: Vec<OutputArgument>,
}

impl CallResult {
    pub fn good(outputs: Vec<OutputArgument>) -> Self {
        Self {
            status: StatusCode::GOOD,
            outputs,
        }
    }

    pub fn bad(status: StatusCode) -> Self {
        Self {
            status,
            outputs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("call failed: {0}")]
    Other(String),
}

/// Invokes methods on remote objects over an established session.
#[async_trait::async_trait]
pub trait MethodCaller: Send + Sync {
    async fn call(
        &self,
        object: &Identifier,
        method: &Identifier,
        inputs: Vec<Argument>,
    ) -> Result<CallResult, TransportError>;
}
