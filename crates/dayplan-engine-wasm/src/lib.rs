//! WASM bindings for dayplan-engine.
//!
//! Exposes calendar expansion, day clamping, interval merging and busy/free
//! summaries to JavaScript via `wasm-bindgen`. All complex types are passed as
//! JSON strings.
//!
//! Each export is a thin wrapper over a plain function returning
//! `Result<_, String>`, so the conversions can be tested natively.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p dayplan-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/dayplan_engine_wasm.wasm
//! ```

use chrono::{DateTime, Days, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use dayplan_engine::occurrence::DEFAULT_TITLE;
use dayplan_engine::summary::{task_intervals, DaySummary};
use dayplan_engine::{
    clamp_to_day, day_report, expand_ics, merge_overlaps, parse_zone, split, total_minutes,
    DayFragment, DayKey, ExpandOptions, Interval, Occurrence, Task,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Days either side of the requested day that `dayReport` expands, so that
/// long events starting earlier still reach it.
const REPORT_WINDOW_DAYS: u64 = 90;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// An event passed from JavaScript; it may cross midnight.
#[derive(Deserialize)]
struct FragmentInput {
    start: String,
    end: String,
    #[serde(default)]
    title: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn zone_or_utc(zone: Option<&str>) -> Result<Tz, String> {
    match zone {
        Some(name) if !name.trim().is_empty() => parse_zone(name).map_err(|e| e.to_string()),
        _ => Ok(Tz::UTC),
    }
}

fn parse_day(day: &str) -> Result<DayKey, String> {
    day.parse::<DayKey>().map_err(|e| e.to_string())
}

/// Parse an ISO 8601 datetime into `zone`.
///
/// Accepts RFC 3339 (with an offset) and naive local time, which is read as
/// wall-clock time in `zone`.
fn parse_datetime(s: &str, zone: &Tz) -> Result<DateTime<Tz>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(zone));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))?;
    zone.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("Datetime '{}' does not exist in {}", s, zone))
}

fn parse_utc(s: &str) -> Result<DateTime<Utc>, String> {
    parse_datetime(s, &Tz::UTC).map(|dt| dt.with_timezone(&Utc))
}

/// Parse `{start, end, title}` events and keep the parts that fall on `day`.
///
/// Events crossing midnight are split first, so they clip to the day instead
/// of being rejected. Events with `end <= start` contribute nothing.
fn fragments_for_day(json: &str, day: DayKey, zone: &Tz) -> Result<Vec<DayFragment>, String> {
    let inputs: Vec<FragmentInput> =
        serde_json::from_str(json).map_err(|e| format!("Invalid fragments JSON: {}", e))?;

    let mut fragments = Vec::new();
    for input in inputs {
        let start = parse_datetime(&input.start, zone)?;
        let end = parse_datetime(&input.end, zone)?;
        let title = input.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        if let Ok(occurrence) = Occurrence::new(start, end, title) {
            fragments.extend(split(&occurrence).into_iter().filter(|f| f.day() == day));
        }
    }
    Ok(fragments)
}

fn parse_intervals(json: &str) -> Result<Vec<Interval>, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid intervals JSON: {}", e))
}

fn parse_tasks(json: &str) -> Result<Vec<Task>, String> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).map_err(|e| format!("Invalid tasks JSON: {}", e))
}

fn parse_options(json: Option<&str>) -> Result<ExpandOptions, String> {
    match json {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(raw).map_err(|e| format!("Invalid options JSON: {}", e))
        }
        _ => Ok(ExpandOptions::default()),
    }
}

// ---------------------------------------------------------------------------
// Plain implementations
// ---------------------------------------------------------------------------

fn expand_ics_json(
    ics: &str,
    window_start: &str,
    window_end: &str,
    options_json: Option<&str>,
) -> Result<String, String> {
    let options = parse_options(options_json)?;
    let ws = parse_utc(window_start)?;
    let we = parse_utc(window_end)?;
    let days = expand_ics(ics, ws, we, &options).map_err(|e| e.to_string())?;
    to_json(&days)
}

fn clamp_to_day_json(fragments_json: &str, day: &str, zone: Option<&str>) -> Result<String, String> {
    let zone = zone_or_utc(zone)?;
    let day = parse_day(day)?;
    let fragments = fragments_for_day(fragments_json, day, &zone)?;
    to_json(&clamp_to_day(&fragments, day))
}

fn merge_overlaps_json(intervals_json: &str) -> Result<String, String> {
    to_json(&merge_overlaps(&parse_intervals(intervals_json)?))
}

fn total_minutes_json(intervals_json: &str) -> Result<u32, String> {
    Ok(total_minutes(&parse_intervals(intervals_json)?))
}

fn task_intervals_json(tasks_json: &str) -> Result<String, String> {
    to_json(&task_intervals(&parse_tasks(tasks_json)?))
}

fn day_summary_json(
    fragments_json: &str,
    tasks_json: &str,
    day: &str,
    zone: Option<&str>,
) -> Result<String, String> {
    let zone = zone_or_utc(zone)?;
    let day = parse_day(day)?;
    let fragments = fragments_for_day(fragments_json, day, &zone)?;
    let tasks = parse_tasks(tasks_json)?;
    to_json(&DaySummary::compute(&fragments, &tasks, day))
}

fn day_report_json(
    ics: &str,
    day: &str,
    tasks_json: &str,
    zone: Option<&str>,
) -> Result<String, String> {
    let zone = zone_or_utc(zone)?;
    let day = parse_day(day)?;
    let span = Days::new(REPORT_WINDOW_DAYS);
    let first = day
        .date()
        .checked_sub_days(span)
        .ok_or_else(|| format!("Day {} is out of range", day))?;
    let last = day
        .date()
        .checked_add_days(span)
        .ok_or_else(|| format!("Day {} is out of range", day))?;

    let ws = DayKey::new(first).start_in(&zone).with_timezone(&Utc);
    let we = DayKey::new(last).end_in(&zone).with_timezone(&Utc);
    let days = expand_ics(ics, ws, we, &ExpandOptions::in_zone(zone)).map_err(|e| e.to_string())?;
    let tasks = parse_tasks(tasks_json)?;
    to_json(&day_report(&days, &tasks, day))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand iCalendar text into a JSON object mapping `YYYY-MM-DD` to arrays of
/// `{start, end, title}` fragments.
///
/// # Arguments
/// - `ics` -- iCalendar text
/// - `window_start`, `window_end` -- ISO 8601 datetimes bounding expansion
///   (naive values are read as UTC)
/// - `options_json` -- Optional `{"zone": "...", "instance_limit": n}`
#[wasm_bindgen(js_name = "expandIcs")]
pub fn expand_ics_js(
    ics: &str,
    window_start: &str,
    window_end: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    expand_ics_json(ics, window_start, window_end, options_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Clamp `{start, end, title}` events to minute intervals of `day`
/// (`YYYY-MM-DD`) in `zone` (default UTC). Events crossing midnight are
/// clipped to the day.
#[wasm_bindgen(js_name = "clampToDay")]
pub fn clamp_to_day_js(
    fragments_json: &str,
    day: &str,
    zone: Option<String>,
) -> Result<String, JsValue> {
    clamp_to_day_json(fragments_json, day, zone.as_deref()).map_err(|e| JsValue::from_str(&e))
}

/// Merge a JSON array of `{start_min, end_min}` intervals.
#[wasm_bindgen(js_name = "mergeOverlaps")]
pub fn merge_overlaps_js(intervals_json: &str) -> Result<String, JsValue> {
    merge_overlaps_json(intervals_json).map_err(|e| JsValue::from_str(&e))
}

/// Sum the lengths of a JSON array of intervals. Merge first.
#[wasm_bindgen(js_name = "totalMinutes")]
pub fn total_minutes_js(intervals_json: &str) -> Result<u32, JsValue> {
    total_minutes_json(intervals_json).map_err(|e| JsValue::from_str(&e))
}

/// Timeline intervals for the scheduled tasks in a JSON task array.
#[wasm_bindgen(js_name = "taskIntervals")]
pub fn task_intervals_js(tasks_json: &str) -> Result<String, JsValue> {
    task_intervals_json(tasks_json).map_err(|e| JsValue::from_str(&e))
}

/// Busy / planned / free minutes for one day, from its fragments and tasks.
#[wasm_bindgen(js_name = "daySummary")]
pub fn day_summary_js(
    fragments_json: &str,
    tasks_json: &str,
    day: &str,
    zone: Option<String>,
) -> Result<String, JsValue> {
    day_summary_json(fragments_json, tasks_json, day, zone.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Full report for one day: events, merged calendar intervals, task
/// intervals and the busy / planned / free summary.
#[wasm_bindgen(js_name = "dayReport")]
pub fn day_report_js(
    ics: &str,
    day: &str,
    tasks_json: &str,
    zone: Option<String>,
) -> Result<String, JsValue> {
    day_report_json(ics, day, tasks_json, zone.as_deref()).map_err(|e| JsValue::from_str(&e))
}
