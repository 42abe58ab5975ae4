use std::fmt::Display;
use std::str::FromStr;

/// The named severity bands of the 1..=1000 LogRecord severity range.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
pub enum SeverityTier {
    Unspecified,
    Debug,
    Information,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// Normalized severity ordinal, numerically compatible with the
/// OpenTelemetry `SeverityNumber` scale.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
#[repr(i32)]
pub enum SeverityLevel {
    Unspecified = 0,
    Debug = 5,
    Info = 9,
    Info4 = 12,
    Warn = 13,
    Error = 17,
    Error2 = 18,
    Error3 = 19,
    Fatal = 21,
}

impl SeverityLevel {
    pub fn number(self) -> i32 {
        self as i32
    }
}

/// Classify a raw severity value. Values outside 1..=1000 are `Unspecified`.
pub fn classify(severity: i64) -> (SeverityTier, SeverityLevel) {
    let tier = match severity {
        1..=50 => SeverityTier::Debug,
        51..=100 => SeverityTier::Information,
        101..=150 => SeverityTier::Notice,
        151..=200 => SeverityTier::Warning,
        201..=250 => SeverityTier::Error,
        251..=300 => SeverityTier::Critical,
        301..=400 => SeverityTier::Alert,
        401..=1000 => SeverityTier::Emergency,
        _ => SeverityTier::Unspecified,
    };
    (tier, tier.level())
}

impl SeverityTier {
    pub fn level(self) -> SeverityLevel {
        match self {
            SeverityTier::Unspecified => SeverityLevel::Unspecified,
            SeverityTier::Debug => SeverityLevel::Debug,
            SeverityTier::Information => SeverityLevel::Info,
            SeverityTier::Notice => SeverityLevel::Info4,
            SeverityTier::Warning => SeverityLevel::Warn,
            SeverityTier::Error => SeverityLevel::Error,
            SeverityTier::Critical => SeverityLevel::Error2,
            SeverityTier::Alert => SeverityLevel::Error3,
            SeverityTier::Emergency => SeverityLevel::Fatal,
        }
    }

    /// The smallest raw severity in this tier, used as a request floor.
    pub fn lower_bound(self) -> u16 {
        match self {
            SeverityTier::Unspecified | SeverityTier::Debug => 1,
            SeverityTier::Information => 51,
            SeverityTier::Notice => 101,
            SeverityTier::Warning => 151,
            SeverityTier::Error => 201,
            SeverityTier::Critical => 251,
            SeverityTier::Alert => 301,
            SeverityTier::Emergency => 401,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Unspecified => "Unspecified",
            SeverityTier::Debug => "Debug",
            SeverityTier::Information => "Information",
            SeverityTier::Notice => "Notice",
            SeverityTier::Warning => "Warning",
            SeverityTier::Error => "Error",
            SeverityTier::Critical => "Critical",
            SeverityTier::Alert => "Alert",
            SeverityTier::Emergency => "Emergency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity {0:?}")]
pub struct UnknownSeverity(pub String);

impl FromStr for SeverityTier {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" | "debug" => Ok(SeverityTier::Debug),
            "info" | "information" => Ok(SeverityTier::Information),
            "notice" => Ok(SeverityTier::Notice),
            "warn" | "warning" => Ok(SeverityTier::Warning),
            "error" => Ok(SeverityTier::Error),
            "critical" => Ok(SeverityTier::Critical),
            "alert" => Ok(SeverityTier::Alert),
            "fatal" | "emergency" => Ok(SeverityTier::Emergency),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

impl Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
