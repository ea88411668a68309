//! # dayplan-engine
//!
//! Turns an iCalendar document into per-day busy time, and combines it with
//! planned tasks into busy / planned / free minutes.
//!
//! Recurrence rules are expanded with the `rrule` crate, bounded by an explicit
//! window; every occurrence is then cut at local midnights and reduced to
//! minute intervals within its day.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dayplan_engine::{expand_ics, merge_overlaps, clamp_to_day, total_minutes, DayKey, ExpandOptions};
//!
//! let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:1\r\nSUMMARY:Lecture\r\n\
//! DTSTART:20260302T090000Z\r\nDTEND:20260302T103000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
//! let window_start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
//! let window_end = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
//!
//! let days = expand_ics(ics, window_start, window_end, &ExpandOptions::default()).unwrap();
//! let day = DayKey::from_ymd(2026, 3, 2).unwrap();
//! let busy = total_minutes(&merge_overlaps(&clamp_to_day(&days[&day], day)));
//! assert_eq!(busy, 90);
//! ```
//!
//! ## Modules
//!
//! - [`document`]: iCalendar text → VEVENT blocks
//! - [`series`]: blocks → master + exceptions per UID
//! - [`expander`]: series + window → occurrences → [`DayMap`]
//! - [`splitter`]: occurrence → per-day fragments
//! - [`interval`]: clamp, merge, and sum minute intervals
//! - [`summary`]: tasks and busy/planned/free figures
//! - [`day`]: day keys and local-midnight boundaries
//! - [`error`]: Error types

pub mod day;
pub mod document;
pub mod error;
pub mod expander;
pub mod interval;
pub mod occurrence;
pub mod series;
pub mod splitter;
pub mod summary;

pub use day::{parse_zone, DayKey};
pub use document::CalendarDocument;
pub use error::PlanError;
pub use expander::{expand, expand_ics, expand_occurrences, ExpandOptions};
pub use interval::{clamp_to_day, merge_overlaps, total_minutes, Interval, MINUTES_PER_DAY};
pub use occurrence::{DayFragment, Occurrence};
pub use splitter::{bucket_by_day, default_day, split, DayMap};
pub use summary::{day_report, DayReport, DaySummary, Task};
