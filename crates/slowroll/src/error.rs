//! Error types for rollout decisions.

use thiserror::Error;

/// Result type alias for rollout operations.
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Errors raised while parsing or evaluating a rollout entry.
///
/// None of these are retryable: they describe a malformed document or a
/// caller precondition violation. Choosing a fallback (for example, always
/// serving `stable`) is up to the embedding application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RolloutError {
    #[error("malformed duration {input:?}: {reason}")]
    MalformedDuration { input: String, reason: String },

    #[error("duplicate unit {unit:?} in duration {input:?}")]
    DuplicateUnit { unit: &'static str, input: String },

    #[error("could not parse {0:?} as any known UTC timestamp format")]
    MalformedTimestamp(String),

    #[error("{what} is not UTC (offset {offset_secs}s)")]
    TimezoneError { what: &'static str, offset_secs: i32 },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid percent range: start_pct={start_pct}, end_pct={end_pct}")]
    InvalidPercentRange { start_pct: i64, end_pct: i64 },

    #[error("malformed rollout entry: {0}")]
    MalformedEntry(String),

    #[error("time arithmetic out of range: {0}")]
    TimeOverflow(&'static str),
}
