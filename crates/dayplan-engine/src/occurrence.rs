//! Concrete event instances and their per-day fragments.
//!
//! Both types enforce `end > start` at construction, so downstream code never
//! re-checks it.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::day::DayKey;
use crate::error::{PlanError, Result};

/// Title used when an event carries no SUMMARY.
pub const DEFAULT_TITLE: &str = "Event";

/// One concrete instance of an event, after recurrence expansion and
/// exception substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    #[serde(serialize_with = "rfc3339")]
    start: DateTime<Tz>,
    #[serde(serialize_with = "rfc3339")]
    end: DateTime<Tz>,
    title: String,
}

impl Occurrence {
    /// # Errors
    /// Returns `PlanError::DegenerateInterval` when `end <= start`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>, title: impl Into<String>) -> Result<Self> {
        if end <= start {
            return Err(PlanError::degenerate(start.to_rfc3339(), end.to_rfc3339()));
        }
        Ok(Self {
            start,
            end,
            title: title.into(),
        })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// The part of an [`Occurrence`] that falls inside a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayFragment {
    #[serde(serialize_with = "rfc3339")]
    start: DateTime<Tz>,
    #[serde(serialize_with = "rfc3339")]
    end: DateTime<Tz>,
    title: String,
}

impl DayFragment {
    /// # Errors
    /// Returns `PlanError::DegenerateInterval` when `end <= start` or when the
    /// two instants fall on different local dates of `start`'s zone.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>, title: impl Into<String>) -> Result<Self> {
        let end = end.with_timezone(&start.timezone());
        if end <= start || start.date_naive() != end.date_naive() {
            return Err(PlanError::degenerate(start.to_rfc3339(), end.to_rfc3339()));
        }
        Ok(Self {
            start,
            end,
            title: title.into(),
        })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn day(&self) -> DayKey {
        DayKey::of(&self.start)
    }
}

/// Instants cross serialization boundaries as RFC 3339 with a numeric offset.
pub(crate) fn rfc3339<S: Serializer>(
    instant: &DateTime<Tz>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&instant.to_rfc3339())
}
