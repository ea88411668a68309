//! Tests for splitting occurrences at local midnights.

use chrono::{DateTime, Duration, TimeZone, Timelike};
use chrono_tz::Tz;
use dayplan_engine::{bucket_by_day, clamp_to_day, split, total_minutes, DayKey, Occurrence};

fn at(zone: Tz, d: u32, h: u32, m: u32) -> DateTime<Tz> {
    zone.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
}

#[test]
fn single_day_occurrence_yields_one_identical_fragment() {
    let occ = Occurrence::new(at(Tz::UTC, 4, 9, 0), at(Tz::UTC, 4, 17, 0), "Work").unwrap();
    let fragments = split(&occ);

    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].start(), occ.start());
    assert_eq!(fragments[0].end(), occ.end());
    assert_eq!(fragments[0].title(), "Work");
}

#[test]
fn three_day_occurrence_yields_three_contiguous_fragments() {
    let occ = Occurrence::new(at(Tz::UTC, 4, 18, 0), at(Tz::UTC, 6, 6, 30), "Conference").unwrap();
    let fragments = split(&occ);

    assert_eq!(fragments.len(), 3);
    let days: Vec<DayKey> = fragments.iter().map(|f| f.day()).collect();
    assert_eq!(
        days,
        vec![
            DayKey::from_ymd(2026, 3, 4).unwrap(),
            DayKey::from_ymd(2026, 3, 5).unwrap(),
            DayKey::from_ymd(2026, 3, 6).unwrap(),
        ]
    );

    // Middle day runs from midnight to 23:59:59.999.
    assert_eq!(fragments[1].start(), at(Tz::UTC, 5, 0, 0));
    assert_eq!(fragments[1].end().hour(), 23);
    assert_eq!(fragments[1].end().timestamp_subsec_millis(), 999);

    let minutes: u32 = fragments
        .iter()
        .map(|f| total_minutes(&clamp_to_day(std::slice::from_ref(f), f.day())))
        .sum();
    assert_eq!(i64::from(minutes), occ.duration().num_minutes());
}

#[test]
fn days_follow_the_occurrence_zone() {
    // 20:00-02:00 in Los Angeles is a single UTC day but two local days.
    let zone: Tz = "America/Los_Angeles".parse().unwrap();
    let occ = Occurrence::new(at(zone, 20, 20, 0), at(zone, 21, 2, 0), "Party").unwrap();
    let fragments = split(&occ);
    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0].day(), DayKey::from_ymd(2026, 3, 20).unwrap());
    assert_eq!(fragments[1].day(), DayKey::from_ymd(2026, 3, 21).unwrap());
}

#[test]
fn bucket_by_day_groups_fragments_from_many_occurrences() {
    let occurrences = vec![
        Occurrence::new(at(Tz::UTC, 2, 9, 0), at(Tz::UTC, 2, 10, 0), "A").unwrap(),
        Occurrence::new(at(Tz::UTC, 2, 22, 0), at(Tz::UTC, 3, 1, 0), "B").unwrap(),
        Occurrence::new(at(Tz::UTC, 3, 12, 0), at(Tz::UTC, 3, 12, 0) + Duration::minutes(5), "C")
            .unwrap(),
    ];
    let map = bucket_by_day(&occurrences);

    assert_eq!(map.len(), 2);
    assert_eq!(map[&DayKey::from_ymd(2026, 3, 2).unwrap()].len(), 2);
    assert_eq!(map[&DayKey::from_ymd(2026, 3, 3).unwrap()].len(), 2);
}
