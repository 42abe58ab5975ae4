use std::time::Duration;

use opcua_logrecord::{SeverityTier, UnknownSeverity};
use serde_with::{serde_as, DurationMilliSeconds};

pub const DEFAULT_MAX_RECORDS_PER_CALL: u32 = 100;
pub const MAX_RECORDS_PER_CALL_LIMIT: u32 = 10_000;
pub const DEFAULT_MAX_LOG_RECORDS: u32 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_COLLECTION_INTERVAL: Duration = Duration::from_secs(10);
const MIN_COLLECTION_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_records_per_call must be between 1 and {max}, got {got}")]
    MaxRecordsPerCall { got: u32, max: u32 },
    #[error("max_log_records must be at least 1")]
    MaxLogRecords,
    #[error("min_severity: {0}")]
    MinSeverity(#[from] UnknownSeverity),
    #[error("request_timeout must be positive")]
    RequestTimeout,
    #[error("collection_interval must be at least 1s, got {0:?}")]
    CollectionInterval(Duration),
}

/// Settings for one GetRecords collection cycle.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Upper bound on records requested by a single call.
    pub max_records_per_call: u32,
    /// Total records per cycle, split evenly across sources.
    pub max_log_records: u32,
    /// Severity tier name or alias, e.g. `"warn"`.
    pub min_severity: String,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub request_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub collection_interval: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            max_records_per_call: DEFAULT_MAX_RECORDS_PER_CALL,
            max_log_records: DEFAULT_MAX_LOG_RECORDS,
            min_severity: SeverityTier::Information.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            collection_interval: DEFAULT_COLLECTION_INTERVAL,
        }
    }
}

impl RetrieverConfig {
    /// Checks every setting, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_RECORDS_PER_CALL_LIMIT).contains(&self.max_records_per_call) {
            return Err(ConfigError::MaxRecordsPerCall {
                got: self.max_records_per_call,
                max: MAX_RECORDS_PER_CALL_LIMIT,
            });
        }
        if self.max_log_records == 0 {
            return Err(ConfigError::MaxLogRecords);
        }
        self.min_severity()?;
        if self.request_timeout.is_zero() {
            return Err(ConfigError::RequestTimeout);
        }
        if self.collection_interval < MIN_COLLECTION_INTERVAL {
            return Err(ConfigError::CollectionInterval(self.collection_interval));
        }
        Ok(())
    }

    /// The numeric severity floor sent with each request.
    pub fn min_severity(&self) -> Result<u16, ConfigError> {
        let tier: SeverityTier = self.min_severity.parse()?;
        Ok(tier.lower_bound())
    }

    /// Per-source record quota for a cycle over `sources` sources.
    pub fn quota_per_source(&self, sources: usize) -> u32 {
        let sources = u32::try_from(sources.max(1)).unwrap_or(u32::MAX);
        (self.max_log_records / sources).max(1)
    }
}
