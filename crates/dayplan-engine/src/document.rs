//! iCalendar text → event blocks.
//!
//! Uses the `icalendar` crate's parser and keeps only what expansion needs from
//! each VEVENT. Anything else (VTODO, VTIMEZONE, VALARM, X- properties) is
//! ignored. Nothing here decides whether a block is usable; that happens when
//! series are resolved.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold, Component, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};

use crate::day::{resolve_local, DayKey};
use crate::error::{PlanError, Result};

/// A DATE or DATE-TIME property value, as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// `VALUE=DATE`: an all-day boundary.
    Date(NaiveDate),
    /// A DATE-TIME with a trailing `Z`.
    Utc(DateTime<Utc>),
    /// A DATE-TIME with neither `Z` nor TZID.
    Floating(NaiveDateTime),
    /// A DATE-TIME qualified by a TZID parameter.
    Zoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// The zone a wall-clock value belongs to: the TZID when it names an IANA
    /// zone, otherwise `zone`.
    pub fn wall_zone(&self, zone: &Tz) -> Tz {
        match self {
            EventTime::Zoned { tzid, .. } => iana_zone(tzid).unwrap_or(*zone),
            EventTime::Utc(_) => Tz::UTC,
            EventTime::Date(_) | EventTime::Floating(_) => *zone,
        }
    }

    /// Resolve to an absolute instant expressed in `zone`.
    ///
    /// Dates and floating times are read as wall-clock time in `zone`; zoned
    /// times use their TZID when it is a known IANA name.
    pub fn resolve(&self, zone: &Tz) -> Option<DateTime<Tz>> {
        match self {
            EventTime::Date(date) => Some(DayKey::new(*date).start_in(zone)),
            EventTime::Utc(dt) => Some(dt.with_timezone(zone)),
            EventTime::Floating(naive) => resolve_local(zone, naive),
            EventTime::Zoned { datetime, .. } => {
                resolve_local(&self.wall_zone(zone), datetime).map(|dt| dt.with_timezone(zone))
            }
        }
    }
}

impl From<DatePerhapsTime> for EventTime {
    fn from(value: DatePerhapsTime) -> Self {
        match value {
            DatePerhapsTime::Date(date) => EventTime::Date(date),
            DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => EventTime::Utc(dt),
            DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
                EventTime::Floating(naive)
            }
            DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
                EventTime::Zoned {
                    datetime: date_time,
                    tzid,
                }
            }
        }
    }
}

/// The parts of one VEVENT that expansion reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBlock {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub duration: Option<Duration>,
    pub rrule: Option<String>,
    pub rdates: Vec<EventTime>,
    pub exdates: Vec<EventTime>,
    pub recurrence_id: Option<EventTime>,
}

impl EventBlock {
    /// A block carrying RECURRENCE-ID overrides one instance of its series.
    pub fn is_exception(&self) -> bool {
        self.recurrence_id.is_some()
    }

    pub fn recurs(&self) -> bool {
        self.rrule.is_some() || !self.rdates.is_empty()
    }

    /// End instant: DTEND, else DTSTART + DURATION, else the following
    /// midnight for all-day starts.
    pub fn resolve_end(&self, start: DateTime<Tz>, zone: &Tz) -> Option<DateTime<Tz>> {
        if let Some(end) = &self.end {
            return end.resolve(zone);
        }
        if let Some(duration) = self.duration {
            return start.checked_add_signed(duration);
        }
        match &self.start {
            Some(EventTime::Date(date)) => date.succ_opt().map(|d| DayKey::new(d).start_in(zone)),
            _ => None,
        }
    }

    fn from_component(vevent: &Component<'_>) -> Self {
        let text = |name: &str| vevent.find_prop(name).map(|p| p.val.to_string());
        let time = |name: &str| {
            vevent
                .find_prop(name)
                .and_then(|p| DatePerhapsTime::try_from(p).ok())
                .map(EventTime::from)
        };
        let multi = |name: &str| -> Vec<EventTime> {
            vevent
                .properties
                .iter()
                .filter(|p| p.name.as_ref().eq_ignore_ascii_case(name))
                .flat_map(parse_date_list)
                .collect()
        };

        EventBlock {
            uid: text("UID").filter(|uid| !uid.trim().is_empty()),
            summary: text("SUMMARY"),
            start: time("DTSTART"),
            end: time("DTEND"),
            duration: text("DURATION").and_then(|raw| parse_duration(&raw)),
            rrule: text("RRULE"),
            rdates: multi("RDATE"),
            exdates: multi("EXDATE"),
            recurrence_id: time("RECURRENCE-ID"),
        }
    }
}

/// A parsed calendar: the VEVENT blocks in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarDocument {
    events: Vec<EventBlock>,
}

impl CalendarDocument {
    /// Parse a complete iCalendar text.
    ///
    /// Blank input is an empty document, not an error.
    ///
    /// # Errors
    /// Returns `PlanError::InvalidDocument` if the text is not iCalendar at all.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let unfolded = unfold(text);
        let calendar =
            read_calendar(&unfolded).map_err(|e| PlanError::InvalidDocument(e.to_string()))?;

        let mut events = Vec::new();
        collect_events(&calendar.components, &mut events);
        Ok(Self { events })
    }

    pub fn from_blocks(events: Vec<EventBlock>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[EventBlock] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromStr for CalendarDocument {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn collect_events(components: &[Component<'_>], out: &mut Vec<EventBlock>) {
    for component in components {
        let name = component.name.as_ref();
        if name.eq_ignore_ascii_case("VEVENT") {
            out.push(EventBlock::from_component(component));
        } else if name.eq_ignore_ascii_case("VCALENDAR") {
            collect_events(&component.components, out);
        }
    }
}

fn iana_zone(tzid: &str) -> Option<Tz> {
    tzid.trim().trim_matches('"').parse().ok()
}

/// Parse a comma-separated EXDATE/RDATE value list.
///
/// PERIOD values are skipped.
fn parse_date_list(prop: &Property<'_>) -> Vec<EventTime> {
    let param = |key: &str| {
        prop.params
            .iter()
            .find(|p| p.key.as_ref().eq_ignore_ascii_case(key))
            .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
    };
    let tzid = param("TZID");
    let is_date = param("VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| {
            if is_date || raw.len() == 8 {
                return NaiveDate::parse_from_str(raw, "%Y%m%d")
                    .ok()
                    .map(EventTime::Date);
            }
            let (local, utc) = match raw.strip_suffix('Z') {
                Some(local) => (local, true),
                None => (raw, false),
            };
            let naive = NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S").ok()?;
            Some(match (&tzid, utc) {
                (_, true) => EventTime::Utc(naive.and_utc()),
                (Some(tzid), false) => EventTime::Zoned {
                    datetime: naive,
                    tzid: tzid.clone(),
                },
                (None, false) => EventTime::Floating(naive),
            })
        })
        .collect()
}

/// Parse an RFC 5545 DURATION (`PT1H30M`, `P1D`, `-PT15M`, ...).
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let parsed = iso8601::duration(body).ok()?;
    let std_duration: std::time::Duration = parsed.into();
    let duration = Duration::from_std(std_duration).ok()?;
    Some(if negative { -duration } else { duration })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MEETING: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
SUMMARY:Standup\r\n\
DTSTART;TZID=Europe/Berlin:20260302T090000\r\n\
DTEND;TZID=Europe/Berlin:20260302T091500\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
EXDATE;TZID=Europe/Berlin:20260303T090000,20260304T090000\r\n\
END:VEVENT\r\n\
BEGIN:VTODO\r\n\
UID:todo@example.com\r\n\
SUMMARY:Not an event\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_only_vevents() {
        let doc = CalendarDocument::parse(MEETING).unwrap();
        assert_eq!(doc.events().len(), 1);
        let block = &doc.events()[0];
        assert_eq!(block.uid.as_deref(), Some("standup@example.com"));
        assert_eq!(block.summary.as_deref(), Some("Standup"));
        assert_eq!(block.rrule.as_deref(), Some("FREQ=DAILY;COUNT=5"));
        assert!(block.recurs());
        assert!(!block.is_exception());
    }

    #[test]
    fn exdate_lists_keep_their_tzid() {
        let doc = CalendarDocument::parse(MEETING).unwrap();
        let exdates = &doc.events()[0].exdates;
        assert_eq!(exdates.len(), 2);
        for exdate in exdates {
            match exdate {
                EventTime::Zoned { tzid, .. } => assert_eq!(tzid, "Europe/Berlin"),
                other => panic!("expected zoned EXDATE, got {:?}", other),
            }
        }
    }

    #[test]
    fn zoned_start_resolves_through_its_tzid() {
        let doc = CalendarDocument::parse(MEETING).unwrap();
        let start = doc.events()[0].start.as_ref().unwrap();
        let resolved = start.resolve(&Tz::UTC).unwrap();
        // 09:00 CET is 08:00 UTC.
        assert_eq!(resolved, Tz::UTC.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap());
    }

    #[test]
    fn unknown_tzid_falls_back_to_day_zone() {
        let time = EventTime::Zoned {
            datetime: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            tzid: "Custom Zone From Outlook".to_string(),
        };
        let resolved = time.resolve(&Tz::UTC).unwrap();
        assert_eq!(resolved, Tz::UTC.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
    }

    #[test]
    fn blank_text_is_an_empty_document() {
        assert!(CalendarDocument::parse("  \n").unwrap().is_empty());
    }

    #[test]
    fn duration_is_an_end_fallback() {
        let text = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:a\r\n\
DTSTART:20260302T090000Z\r\nDURATION:PT1H30M\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let doc = CalendarDocument::parse(text).unwrap();
        let block = &doc.events()[0];
        let start = block.start.as_ref().unwrap().resolve(&Tz::UTC).unwrap();
        let end = block.resolve_end(start, &Tz::UTC).unwrap();
        assert_eq!(end - start, Duration::minutes(90));
    }

    #[test]
    fn all_day_start_without_end_lasts_one_day() {
        let text = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:a\r\n\
DTSTART;VALUE=DATE:20260302\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let doc = CalendarDocument::parse(text).unwrap();
        let block = &doc.events()[0];
        assert!(block.start.as_ref().unwrap().is_date());
        let start = block.start.as_ref().unwrap().resolve(&Tz::UTC).unwrap();
        let end = block.resolve_end(start, &Tz::UTC).unwrap();
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn negative_duration_keeps_its_sign() {
        assert_eq!(parse_duration("-PT15M"), Some(-Duration::minutes(15)));
        assert_eq!(parse_duration("P1D"), Some(Duration::days(1)));
        assert_eq!(parse_duration("garbage"), None);
    }
}
