//! Calendar-day keys and local-midnight boundaries.
//!
//! A [`DayKey`] is a plain date. Its boundaries only become instants once a zone
//! is supplied: the day starts at local midnight and, for clipping purposes,
//! ends one millisecond before the next local midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A calendar date used as a mapping key. Serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        DayKey(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(DayKey)
    }

    /// The local date of `instant` in its own zone.
    pub fn of(instant: &DateTime<Tz>) -> Self {
        DayKey(instant.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(DayKey)
    }

    /// Local midnight opening this day in `zone`.
    pub fn start_in(&self, zone: &Tz) -> DateTime<Tz> {
        local_midnight(zone, self.0)
    }

    /// Last representable millisecond of this day in `zone` (23:59:59.999 on
    /// ordinary days).
    pub fn end_in(&self, zone: &Tz) -> DateTime<Tz> {
        if let Some(next) = self.0.succ_opt() {
            return local_midnight(zone, next) - Duration::milliseconds(1);
        }
        // Last calendar day chrono can represent.
        let last = self.0.and_time(NaiveTime::MIN) + Duration::milliseconds(86_399_999);
        resolve_local(zone, &last).unwrap_or_else(|| zone.from_utc_datetime(&last))
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(DayKey)
            .map_err(|_| PlanError::InvalidDay(s.to_string()))
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey(date)
    }
}

/// Parse an IANA zone name such as `"Europe/Berlin"`.
pub fn parse_zone(name: &str) -> crate::error::Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| PlanError::InvalidTimezone(name.to_string()))
}

fn local_midnight(zone: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    resolve_local(zone, &midnight).unwrap_or_else(|| zone.from_utc_datetime(&midnight))
}

/// Map a wall-clock time in `zone` to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// DST gap move forward to the first wall-clock time that exists.
pub(crate) fn resolve_local(zone: &Tz, local: &NaiveDateTime) -> Option<DateTime<Tz>> {
    (0..=6)
        .filter_map(|step| local.checked_add_signed(Duration::minutes(30 * step)))
        .find_map(|candidate| zone.from_local_datetime(&candidate).earliest())
}
