//! Client for the OPC UA `GetRecords` method.
//!
//! A [`Retriever`] pages through the record history of one or more log
//! objects over a [`MethodCaller`], decodes each returned payload with a
//! [`CodecTable`] and normalizes the result into [`CanonicalRecord`]s.
//!
//! Sources are visited one after another. A source that fails is reported in
//! the [`Collection`] without affecting the others, and a rejected
//! continuation point restarts the source once before giving up.

pub mod canonical;
pub mod client;
pub mod config;
pub mod cursor;
pub mod payload;
pub mod retriever;

pub use canonical::{CanonicalRecord, SourceIdentity};
pub use client::{Argument, CallResult, MethodCaller, OutputArgument, StatusCode, TransportError};
pub use config::{ConfigError, RetrieverConfig};
pub use cursor::CollectionCursor;
pub use payload::{CodecTable, Decoder, PayloadBody, RecordError, RecordPayload};
pub use retriever::{
    Collection, InvalidWindow, RequestWindow, Retriever, SourceError, SourceOutcome, SourceReport,
};
