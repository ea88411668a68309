//! Split occurrences that cross midnight into per-day fragments.

use std::collections::BTreeMap;

use crate::day::DayKey;
use crate::occurrence::{DayFragment, Occurrence};

/// Fragments bucketed by the day they fall in. Order within a day is not
/// meaningful.
pub type DayMap = BTreeMap<DayKey, Vec<DayFragment>>;

/// Cut `occurrence` at every local midnight it crosses.
///
/// Days are those of the zone `occurrence.start()` is expressed in. Each
/// fragment is clipped to `[day start, day end]` where the day end is
/// 23:59:59.999; clipped slivers with no length are dropped, so an occurrence
/// ending exactly at midnight does not leak into the next day.
pub fn split(occurrence: &Occurrence) -> Vec<DayFragment> {
    let zone = occurrence.start().timezone();
    let start = occurrence.start();
    let end = occurrence.end().with_timezone(&zone);
    let last = DayKey::of(&end);

    let mut fragments = Vec::new();
    let mut day = DayKey::of(&start);
    loop {
        let clipped_start = start.max(day.start_in(&zone));
        let clipped_end = end.min(day.end_in(&zone));
        if let Ok(fragment) = DayFragment::new(clipped_start, clipped_end, occurrence.title()) {
            fragments.push(fragment);
        }

        if day >= last {
            break;
        }
        match day.succ() {
            Some(next) => day = next,
            None => break,
        }
    }
    fragments
}

/// Split every occurrence and group the fragments by day.
pub fn bucket_by_day(occurrences: &[Occurrence]) -> DayMap {
    let mut map = DayMap::new();
    for occurrence in occurrences {
        for fragment in split(occurrence) {
            map.entry(fragment.day()).or_default().push(fragment);
        }
    }
    map
}

/// The day a viewer should land on: `today` when it has events, otherwise the
/// earliest day in the map.
pub fn default_day(map: &DayMap, today: DayKey) -> Option<DayKey> {
    if map.contains_key(&today) {
        return Some(today);
    }
    map.keys().next().copied()
}
