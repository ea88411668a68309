//! Minute-resolution interval algebra within a single day.
//!
//! Sorts intervals by start, merges busy periods, then sums their lengths.
//! Touching intervals (`a.end == b.start`) merge into one; clamping to a day,
//! by contrast, drops anything whose rounded end does not exceed its start.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::day::DayKey;
use crate::error::{PlanError, Result};
use crate::occurrence::DayFragment;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A `[start_min, end_min)` span of minutes after local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start_min: u32,
    end_min: u32,
}

#[derive(Deserialize)]
struct RawInterval {
    start_min: u32,
    end_min: u32,
}

impl TryFrom<RawInterval> for Interval {
    type Error = PlanError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start_min, raw.end_min)
    }
}

impl Interval {
    /// # Errors
    /// Returns `PlanError::DegenerateInterval` unless
    /// `start_min < end_min <= 1440`.
    pub fn new(start_min: u32, end_min: u32) -> Result<Self> {
        if start_min >= end_min || end_min > MINUTES_PER_DAY {
            return Err(PlanError::degenerate(start_min, end_min));
        }
        Ok(Self { start_min, end_min })
    }

    pub fn start_min(&self) -> u32 {
        self.start_min
    }

    pub fn end_min(&self) -> u32 {
        self.end_min
    }

    pub fn minutes(&self) -> u32 {
        self.end_min - self.start_min
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}–{}",
            format_clock(self.start_min),
            format_clock(self.end_min)
        )
    }
}

/// Convert fragments to minute offsets from `day`'s local midnight.
///
/// Each fragment end is clipped to 23:59:59.999, both ends are rounded to the
/// nearest minute (halves round up) and clamped to `[0, 1440]`. Intervals that
/// round to nothing are dropped. Fragments belonging to other days clamp to
/// nothing as well.
pub fn clamp_to_day(fragments: &[DayFragment], day: DayKey) -> Vec<Interval> {
    fragments
        .iter()
        .filter_map(|fragment| {
            let zone = fragment.start().timezone();
            let day_start = day.start_in(&zone);
            let day_end = day.end_in(&zone);

            let start = fragment.start().max(day_start);
            let end = fragment.end().min(day_end);
            let offset = |instant: chrono::DateTime<chrono_tz::Tz>| {
                let millis = (instant - day_start).num_milliseconds();
                (millis + 30_000)
                    .div_euclid(60_000)
                    .clamp(0, i64::from(MINUTES_PER_DAY)) as u32
            };
            Interval::new(offset(start), offset(end)).ok()
        })
        .collect()
}

/// Merge overlapping or touching intervals.
///
/// Output is sorted, and no two output intervals overlap or share a boundary.
pub fn merge_overlaps(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|iv| iv.start_min);

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        if let Some(last) = merged.last_mut() {
            if interval.start_min <= last.end_min {
                last.end_min = last.end_min.max(interval.end_min);
                continue;
            }
        }
        merged.push(interval);
    }
    merged
}

/// Sum of interval lengths. Callers merge first; overlaps are counted twice.
pub fn total_minutes(intervals: &[Interval]) -> u32 {
    intervals.iter().map(Interval::minutes).sum()
}

/// Minute-of-day as a 12-hour clock label, e.g. `570` → `"9:30 AM"`.
/// Minute 1440 wraps to `"12:00 AM"`.
pub fn format_clock(minute: u32) -> String {
    let minute = minute % MINUTES_PER_DAY;
    let (hour, min) = (minute / 60, minute % 60);
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour12, min, meridiem)
}
