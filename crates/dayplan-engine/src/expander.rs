//! Recurrence expansion: calendar document + window → concrete occurrences.
//!
//! Recurring masters are enumerated lazily through the `rrule` crate. The
//! window end is the stop condition, so unbounded rules terminate;
//! `instance_limit` additionally caps how many in-window instances one series
//! may produce.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::day::resolve_local;
use crate::document::{CalendarDocument, EventBlock, EventTime};
use crate::error::{PlanError, Result};
use crate::occurrence::{Occurrence, DEFAULT_TITLE};
use crate::series::{group_series, EventSeries};
use crate::splitter::{bucket_by_day, DayMap};

/// Knobs for one expansion run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    /// Zone whose local midnights bound each day. Floating times and all-day
    /// dates are read as wall-clock time here.
    pub zone: Tz,
    /// Maximum in-window instances produced per recurring series. Instances
    /// before the window start are skipped without counting.
    pub instance_limit: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            zone: Tz::UTC,
            instance_limit: 100_000,
        }
    }
}

impl ExpandOptions {
    pub fn in_zone(zone: Tz) -> Self {
        Self {
            zone,
            ..Self::default()
        }
    }
}

/// Parse `text` and expand it into a day → fragments map.
///
/// # Errors
/// Returns `PlanError::InvalidDocument` only when the text is not iCalendar.
/// Malformed events inside a valid document are skipped, never fatal.
pub fn expand_ics(
    text: &str,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    options: &ExpandOptions,
) -> Result<DayMap> {
    let document = CalendarDocument::parse(text)?;
    Ok(expand(&document, window_start, window_end, options))
}

/// Expand every series in `document` over `[window_start, window_end]` and
/// split the occurrences into per-day fragments.
pub fn expand(
    document: &CalendarDocument,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    options: &ExpandOptions,
) -> DayMap {
    bucket_by_day(&expand_occurrences(
        document,
        window_start,
        window_end,
        options,
    ))
}

/// Expand every series in `document` into whole occurrences (not yet split
/// by day).
pub fn expand_occurrences(
    document: &CalendarDocument,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    options: &ExpandOptions,
) -> Vec<Occurrence> {
    let window = Window {
        start: window_start.with_timezone(&options.zone),
        end: window_end.with_timezone(&options.zone),
    };

    let series = group_series(document, &options.zone);
    let mut occurrences = Vec::new();
    for entry in &series {
        match expand_series(entry, &window, options) {
            Ok(mut found) => occurrences.append(&mut found),
            Err(err) => warn!(uid = %entry.uid, error = %err, "dropping series"),
        }
    }

    debug!(
        blocks = document.events().len(),
        series = series.len(),
        occurrences = occurrences.len(),
        "expanded calendar document"
    );
    occurrences
}

struct Window {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

/// What every instance of a series inherits from its master.
struct Template<'a> {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    /// Zone the master's DTSTART is written in; instance ends keep the
    /// master's wall-clock length there.
    wall_zone: Tz,
    wall_length: Duration,
    title: &'a str,
}

impl<'a> Template<'a> {
    fn from_master(uid: &str, master: &'a EventBlock, zone: &Tz) -> Result<Self> {
        let written = master
            .start
            .as_ref()
            .ok_or_else(|| PlanError::malformed(uid, "missing DTSTART"))?;
        let start = written
            .resolve(zone)
            .ok_or_else(|| PlanError::malformed(uid, "DTSTART cannot be resolved"))?;
        let end = master
            .resolve_end(start, zone)
            .ok_or_else(|| PlanError::malformed(uid, "missing or out-of-range DTEND/DURATION"))?;

        let wall_zone = written.wall_zone(zone);
        let wall_length = end.with_timezone(&wall_zone).naive_local()
            - start.with_timezone(&wall_zone).naive_local();
        Ok(Self {
            start,
            end,
            wall_zone,
            wall_length,
            title: master.summary.as_deref().unwrap_or(DEFAULT_TITLE),
        })
    }

    /// End of an instance starting at `start`: the master's length added on
    /// the wall clock, so all-day instances end at local midnight across DST
    /// changes.
    fn end_for(&self, start: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let local_end = start
            .with_timezone(&self.wall_zone)
            .naive_local()
            .checked_add_signed(self.wall_length)?;
        resolve_local(&self.wall_zone, &local_end).map(|end| end.with_timezone(&start.timezone()))
    }
}

fn expand_series(
    series: &EventSeries<'_>,
    window: &Window,
    options: &ExpandOptions,
) -> Result<Vec<Occurrence>> {
    let zone = &options.zone;
    let template = Template::from_master(&series.uid, series.master, zone)?;
    let mut occurrences = Vec::new();

    if !series.master.recurs() {
        if template.end >= window.start && template.start <= window.end {
            keep(&mut occurrences, template.start, Some(template.end), template.title);
        }
        return Ok(occurrences);
    }

    let rule_set = build_rule_set(&series.uid, series.master, zone)?;
    let mut emitted = 0usize;
    for instance in &rule_set {
        let instance = instance.with_timezone(zone);
        if instance > window.end {
            break;
        }
        if instance < window.start {
            continue;
        }
        if emitted >= options.instance_limit {
            warn!(
                uid = %series.uid,
                limit = options.instance_limit,
                reached = %instance,
                "instance limit reached before window end"
            );
            break;
        }
        emitted += 1;

        match series.exception_for(instance.with_timezone(&Utc)) {
            Some(exception) => {
                let start = exception
                    .start
                    .as_ref()
                    .and_then(|t| t.resolve(zone))
                    .unwrap_or(instance);
                let end = exception
                    .resolve_end(start, zone)
                    .or_else(|| template.end_for(start));
                let title = exception.summary.as_deref().unwrap_or(template.title);
                keep(&mut occurrences, start, end, title);
            }
            None => keep(
                &mut occurrences,
                instance,
                template.end_for(instance),
                template.title,
            ),
        }
    }

    Ok(occurrences)
}

fn keep(out: &mut Vec<Occurrence>, start: DateTime<Tz>, end: Option<DateTime<Tz>>, title: &str) {
    let Some(end) = end else {
        trace!(%start, title, "dropping occurrence with out-of-range end");
        return;
    };
    match Occurrence::new(start, end, title) {
        Ok(occurrence) => out.push(occurrence),
        Err(err) => trace!(error = %err, "dropping degenerate occurrence"),
    }
}

/// Assemble DTSTART/RRULE/RDATE/EXDATE lines and hand them to `rrule`.
///
/// Feeds in the wild disagree on how UNTIL is written relative to a zoned
/// DTSTART, so a rule that fails to parse is retried with UNTIL rewritten in
/// UTC and then in DTSTART's wall-clock zone.
fn build_rule_set(uid: &str, master: &EventBlock, zone: &Tz) -> Result<RRuleSet> {
    let start = master
        .start
        .as_ref()
        .ok_or_else(|| PlanError::malformed(uid, "missing DTSTART"))?;

    let mut tail = Vec::new();
    if master.rrule.is_none() {
        // A bare RDATE set does not repeat DTSTART on its own.
        tail.push(rule_line("RDATE", start, zone));
    }
    tail.extend(master.rdates.iter().map(|t| rule_line("RDATE", t, zone)));
    tail.extend(master.exdates.iter().map(|t| rule_line("EXDATE", t, zone)));

    let wall_zone = start.wall_zone(zone);
    let rules = match &master.rrule {
        Some(rule) => until_variants(rule, &wall_zone),
        None => vec![String::new()],
    };

    let mut last_error = String::new();
    for rule in rules {
        let mut lines = vec![rule_line("DTSTART", start, zone)];
        if !rule.is_empty() {
            lines.push(format!("RRULE:{}", rule));
        }
        lines.extend(tail.iter().cloned());

        match lines.join("\n").parse::<RRuleSet>() {
            Ok(set) => return Ok(set),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(PlanError::InvalidRule(format!("{}: {}", uid, last_error)))
}

/// Render a DTSTART/RDATE/EXDATE line the way `rrule` expects it.
fn rule_line(name: &str, time: &EventTime, zone: &Tz) -> String {
    match time {
        EventTime::Utc(dt) => format!("{}:{}", name, dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::Date(date) => format!(
            "{};TZID={}:{}T000000",
            name,
            zone.name(),
            date.format("%Y%m%d")
        ),
        EventTime::Floating(naive) | EventTime::Zoned { datetime: naive, .. } => format!(
            "{};TZID={}:{}",
            name,
            time.wall_zone(zone).name(),
            naive.format("%Y%m%dT%H%M%S")
        ),
    }
}

/// The rule as written, followed by the same rule with UNTIL restated in UTC
/// and in `wall_zone` local time.
fn until_variants(rule: &str, wall_zone: &Tz) -> Vec<String> {
    let mut variants = vec![rule.to_string()];

    let parts: Vec<&str> = rule.split(';').collect();
    let Some(index) = parts
        .iter()
        .position(|p| p.to_ascii_uppercase().starts_with("UNTIL="))
    else {
        return variants;
    };
    let Some(until) = parse_until(&parts[index]["UNTIL=".len()..], wall_zone) else {
        return variants;
    };

    let restated = [
        until.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string(),
        until.format("%Y%m%dT%H%M%S").to_string(),
    ];
    for value in restated {
        let mut rewritten: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
        rewritten[index] = format!("UNTIL={}", value);
        let candidate = rewritten.join(";");
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

fn parse_until(raw: &str, wall_zone: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if let Some(utc) = raw.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(naive.and_utc().with_timezone(wall_zone));
    }
    let local = match NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S") {
        Ok(naive) => naive,
        // A DATE-valued UNTIL includes the whole day.
        Err(_) => NaiveDate::parse_from_str(raw, "%Y%m%d")
            .ok()?
            .and_hms_opt(23, 59, 59)?,
    };
    resolve_local(wall_zone, &local)
}
