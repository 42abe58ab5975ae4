//! Paginated retrieval of log records from one or more log objects.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opcua_logrecord::{Identifier, ALL_OPTIONAL_FIELDS};
use tokio_util::sync::CancellationToken;

use crate::canonical::CanonicalRecord;
use crate::client::{Argument, CallResult, MethodCaller, OutputArgument, StatusCode, TransportError};
use crate::config::{ConfigError, RetrieverConfig};
use crate::payload::{CodecTable, RecordPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("window end {end} precedes start {start}")]
pub struct InvalidWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The time range and filter sent with every call of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_severity: u16,
}

impl RequestWindow {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_severity: u16,
    ) -> Result<Self, InvalidWindow> {
        if end < start {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self {
            start,
            end,
            min_severity,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn min_severity(&self) -> u16 {
        self.min_severity
    }

    /// The six GetRecords input arguments for one call.
    pub fn arguments(&self, max_records: u32, continuation_point: Option<Bytes>) -> Vec<Argument> {
        vec![
            Argument::DateTime(self.start),
            Argument::DateTime(self.end),
            Argument::UInt32(max_records),
            Argument::UInt16(self.min_severity),
            Argument::UInt32(ALL_OPTIONAL_FIELDS),
            Argument::ByteString(continuation_point),
        ]
    }
}

/// Why a source stopped contributing records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("continuation point rejected again after restarting")]
    StaleContinuationPoint,
    #[error("call failed with status {0}")]
    BadStatus(StatusCode),
    #[error("expected 2 output arguments, got {0}")]
    MissingOutputs(usize),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Done,
    Failed(SourceError),
}

/// What happened while collecting from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: Identifier,
    pub outcome: SourceOutcome,
    /// Remote calls issued, including any before a restart.
    pub calls: u32,
    /// Records contributed to the collection.
    pub records: usize,
    /// Records that could not be decoded.
    pub skipped: usize,
}

impl SourceReport {
    fn new(source: Identifier) -> Self {
        Self {
            source,
            outcome: SourceOutcome::Done,
            calls: 0,
            records: 0,
            skipped: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.outcome == SourceOutcome::Done
    }
}

/// The result of one collection cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    /// Records in source order, earlier pages first.
    pub records: Vec<CanonicalRecord>,
    pub sources: Vec<SourceReport>,
}

impl Collection {
    pub fn failed(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.is_done())
    }

    /// Whether there were sources and none of them completed.
    pub fn all_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| !s.is_done())
    }
}

/// Per-source pagination state.
struct SourceFetch {
    records: Vec<CanonicalRecord>,
    report: SourceReport,
    remaining: u32,
    continuation_point: Option<Bytes>,
    restarted: bool,
}

impl SourceFetch {
    fn new(source: Identifier, quota: u32) -> Self {
        Self {
            records: Vec::new(),
            report: SourceReport::new(source),
            remaining: quota,
            continuation_point: None,
            restarted: false,
        }
    }

    /// Start the source over, dropping everything collected so far.
    fn restart(&mut self, quota: u32) {
        self.records.clear();
        self.report.skipped = 0;
        self.remaining = quota;
        self.continuation_point = None;
        self.restarted = true;
    }
}

/// Drives GetRecords against log objects.
pub struct Retriever {
    caller: Arc<dyn MethodCaller>,
    method: Identifier,
    codecs: CodecTable,
    config: RetrieverConfig,
    min_severity: u16,
}

impl Retriever {
    pub fn new(caller: Arc<dyn MethodCaller>, config: RetrieverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let min_severity = config.min_severity()?;
        Ok(Self {
            caller,
            method: Identifier::GET_RECORDS_METHOD,
            codecs: CodecTable::default(),
            config,
            min_severity,
        })
    }

    /// Use a GetRecords method id other than the standard one.
    pub fn with_method(self, method: Identifier) -> Self {
        Self { method, ..self }
    }

    pub fn with_codecs(self, codecs: CodecTable) -> Self {
        Self { codecs, ..self }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Collect records in `[start, end]` from each source in turn.
    ///
    /// A failing source never stops the others. Records collected before a
    /// failure or cancellation are kept. A reversed window fails every source
    /// with [`SourceError::InvalidArgument`] without calling any of them.
    pub async fn collect(
        &self,
        sources: &[Identifier],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        token: &CancellationToken,
    ) -> Collection {
        let window = match RequestWindow::new(start, end, self.min_severity) {
            Ok(window) => Some(window),
            Err(err) => {
                log::warn!("not calling {} sources: {}", sources.len(), err);
                None
            }
        };
        let quota = self.config.quota_per_source(sources.len());

        let mut collection = Collection::default();
        for source in sources {
            let mut fetch = SourceFetch::new(source.clone(), quota);
            let result = match &window {
                Some(window) => self.fetch_source(&mut fetch, window, quota, token).await,
                None => Err(SourceError::InvalidArgument),
            };
            if let Err(err) = result {
                log::warn!(
                    "collecting from {} failed after {} calls: {}",
                    source,
                    fetch.report.calls,
                    err
                );
                fetch.report.outcome = SourceOutcome::Failed(err);
            }
            fetch.report.records = fetch.records.len();
            collection.records.append(&mut fetch.records);
            collection.sources.push(fetch.report);
        }

        log::info!(
            "collected {} records from {} sources ({} failed)",
            collection.records.len(),
            collection.sources.len(),
            collection.failed().count()
        );
        collection
    }

    async fn fetch_source(
        &self,
        fetch: &mut SourceFetch,
        window: &RequestWindow,
        quota: u32,
        token: &CancellationToken,
    ) -> Result<(), SourceError> {
        let source = fetch.report.source.clone();
        loop {
            if token.is_cancelled() {
                return Err(SourceError::Cancelled);
            }
            let max_records = fetch.remaining.min(self.config.max_records_per_call);
            fetch.report.calls += 1;
            let result = self
                .call(&source, window, max_records, fetch.continuation_point.clone(), token)
                .await?;

            match result.status {
                StatusCode::BAD_INVALID_ARGUMENT => return Err(SourceError::InvalidArgument),
                StatusCode::BAD_CONTINUATION_POINT_INVALID => {
                    if fetch.restarted {
                        // The partial history cannot be trusted; drop the source.
                        fetch.records.clear();
                        return Err(SourceError::StaleContinuationPoint);
                    }
                    log::warn!(
                        "continuation point for {} rejected, restarting without one",
                        source
                    );
                    fetch.restart(quota);
                    continue;
                }
                status if !status.is_good() => return Err(SourceError::BadStatus(status)),
                _ => {}
            }

            let (mut payloads, next) = split_outputs(result.outputs)?;
            log::debug!(
                "GetRecords on {} returned {} records (has continuation point: {})",
                source,
                payloads.len(),
                next.is_some()
            );
            if payloads.len() > max_records as usize {
                log::warn!(
                    "{} returned {} records but only {} were requested, dropping the rest",
                    source,
                    payloads.len(),
                    max_records
                );
                payloads.truncate(max_records as usize);
            }
            let received = payloads.len() as u32;

            for (index, payload) in payloads.into_iter().enumerate() {
                match self.codecs.decode(payload) {
                    Ok(record) => fetch.records.push(CanonicalRecord::from(record)),
                    Err(err) => {
                        log::warn!("skipping record {} from {}: {}", index, source, err);
                        fetch.report.skipped += 1;
                    }
                }
            }

            fetch.remaining = fetch.remaining.saturating_sub(received);
            match next {
                Some(_) if received == 0 => {
                    log::warn!(
                        "{} returned an empty page with a continuation point, stopping",
                        source
                    );
                    return Ok(());
                }
                Some(cp) if fetch.continuation_point.as_ref() == Some(&cp) => {
                    log::warn!("{} returned the same continuation point again, stopping", source);
                    return Ok(());
                }
                Some(cp) if fetch.remaining > 0 => fetch.continuation_point = Some(cp),
                _ => return Ok(()),
            }
        }
    }

    /// Issue one GetRecords call, bounded by the request timeout and the
    /// cancellation token.
    async fn call(
        &self,
        source: &Identifier,
        window: &RequestWindow,
        max_records: u32,
        continuation_point: Option<Bytes>,
        token: &CancellationToken,
    ) -> Result<CallResult, SourceError> {
        log::debug!(
            "calling GetRecords on {} for [{}, {}], max {} records, min severity {}, has continuation point: {}",
            source,
            window.start(),
            window.end(),
            max_records,
            window.min_severity(),
            continuation_point.is_some()
        );
        let inputs = window.arguments(max_records, continuation_point);
        let timeout = self.config.request_timeout;

        tokio::select! {
            biased;

            _ = token.cancelled() => Err(SourceError::Cancelled),

            res = tokio::time::timeout(timeout, self.caller.call(source, &self.method, inputs)) => {
                match res {
                    Ok(result) => Ok(result?),
                    Err(_) => Err(SourceError::Timeout(timeout)),
                }
            }
        }
    }
}

/// Split the GetRecords outputs into record payloads and the next
/// continuation point, if any.
fn split_outputs(
    outputs: Vec<OutputArgument>,
) -> Result<(Vec<RecordPayload>, Option<Bytes>), SourceError> {
    if outputs.len() < 2 {
        return Err(SourceError::MissingOutputs(outputs.len()));
    }
    let mut outputs = outputs.into_iter();

    let payloads = match outputs.next() {
        Some(OutputArgument::Records(payloads)) => payloads,
        Some(OutputArgument::Null) | None => Vec::new(),
        Some(other) => {
            log::warn!("unexpected records output {:?}, treating as empty", other);
            Vec::new()
        }
    };
    let next = match outputs.next() {
        Some(OutputArgument::ByteString(Some(cp))) if !cp.is_empty() => Some(cp),
        _ => None,
    };
    Ok((payloads, next))
}
