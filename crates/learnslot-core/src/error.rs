//! Error types for the discovery pipeline.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core types and pipeline stages.
///
/// Every stage validates its own inputs and fails fast with one of these
/// instead of producing degenerate output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A date range whose end comes before its start.
    #[error("invalid date range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A session duration that is zero or negative.
    #[error("invalid session duration: {minutes} minutes (must be > 0)")]
    InvalidDuration { minutes: i64 },

    /// An interval whose start comes after its end.
    #[error("invalid interval: start {start} is after end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A focus window whose start time-of-day comes after its end.
    #[error("invalid focus window: {start} is after {end}")]
    InvalidFocusWindow { start: NaiveTime, end: NaiveTime },

    /// Calendar arithmetic left the representable range.
    #[error("time arithmetic out of range: {context}")]
    TimeOutOfRange { context: &'static str },
}

impl CoreError {
    /// Creates a time-out-of-range error.
    pub fn out_of_range(context: &'static str) -> Self {
        Self::TimeOutOfRange { context }
    }

    /// Returns a stable snake_case name for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "invalid_range",
            Self::InvalidDuration { .. } => "invalid_duration",
            Self::InvalidInterval { .. } => "invalid_interval",
            Self::InvalidFocusWindow { .. } => "invalid_focus_window",
            Self::TimeOutOfRange { .. } => "time_out_of_range",
        }
    }
}
