//! Error types for dayplan-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Invalid calendar document: {0}")]
    InvalidDocument(String),

    /// A series that cannot be resolved into occurrences (missing DTSTART,
    /// no way to compute an end, ...). Never fatal to a whole expansion.
    #[error("Malformed series '{uid}': {reason}")]
    MalformedSeries { uid: String, reason: String },

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Degenerate interval: end {end} is not after start {start}")]
    DegenerateInterval { start: String, end: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid day '{0}': expected YYYY-MM-DD")]
    InvalidDay(String),
}

impl PlanError {
    pub(crate) fn degenerate(start: impl ToString, end: impl ToString) -> Self {
        PlanError::DegenerateInterval {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub(crate) fn malformed(uid: &str, reason: impl Into<String>) -> Self {
        PlanError::MalformedSeries {
            uid: uid.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
