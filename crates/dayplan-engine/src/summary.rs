//! Per-day busy / planned / free figures.
//!
//! Calendar time and planned task time are kept apart: calendar fragments are
//! merged among themselves, task intervals among nothing. Only the minute totals
//! meet, in [`DaySummary`].

use serde::{Deserialize, Serialize};

use crate::day::DayKey;
use crate::interval::{clamp_to_day, merge_overlaps, total_minutes, Interval, MINUTES_PER_DAY};
use crate::occurrence::DayFragment;
use crate::splitter::DayMap;

/// A user-planned block of work for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Planned duration. Zero-minute tasks count for nothing.
    pub minutes: u32,
    /// Minute of the day the task starts at, if it is scheduled.
    #[serde(default)]
    pub start_min: Option<u32>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, minutes: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            minutes,
            start_min: None,
        }
    }

    pub fn starting_at(mut self, start_min: u32) -> Self {
        self.start_min = Some(start_min);
        self
    }

    /// The task's span on the timeline, clipped at midnight. `None` for
    /// unscheduled or empty tasks.
    pub fn interval(&self) -> Option<Interval> {
        let start = self.start_min?;
        if self.minutes == 0 {
            return None;
        }
        let end = start.saturating_add(self.minutes).min(MINUTES_PER_DAY);
        Interval::new(start, end).ok()
    }
}

/// Timeline intervals for the scheduled tasks, in input order, unmerged.
pub fn task_intervals(tasks: &[Task]) -> Vec<Interval> {
    tasks.iter().filter_map(Task::interval).collect()
}

/// Sum of all task durations, scheduled or not.
pub fn planned_minutes(tasks: &[Task]) -> u32 {
    tasks
        .iter()
        .fold(0u32, |sum, task| sum.saturating_add(task.minutes))
}

/// Minutes of `day` covered by at least one calendar fragment.
pub fn busy_minutes(fragments: &[DayFragment], day: DayKey) -> u32 {
    total_minutes(&merge_overlaps(&clamp_to_day(fragments, day)))
}

/// What is left of the day, never below zero.
pub fn free_minutes(busy: u32, planned: u32) -> u32 {
    MINUTES_PER_DAY.saturating_sub(busy.saturating_add(planned))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub busy_minutes: u32,
    pub planned_minutes: u32,
    pub free_minutes: u32,
}

impl DaySummary {
    pub fn new(busy_minutes: u32, planned_minutes: u32) -> Self {
        Self {
            busy_minutes,
            planned_minutes,
            free_minutes: free_minutes(busy_minutes, planned_minutes),
        }
    }

    pub fn compute(fragments: &[DayFragment], tasks: &[Task], day: DayKey) -> Self {
        Self::new(busy_minutes(fragments, day), planned_minutes(tasks))
    }
}

/// Everything a day view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub day: DayKey,
    /// The day's fragments, earliest first.
    pub events: Vec<DayFragment>,
    /// Merged calendar busy intervals.
    pub calendar: Vec<Interval>,
    /// Scheduled task intervals, never merged with `calendar`.
    pub tasks: Vec<Interval>,
    pub summary: DaySummary,
}

impl DayReport {
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Build the report for `day` from an expansion result and that day's tasks.
pub fn day_report(map: &DayMap, tasks: &[Task], day: DayKey) -> DayReport {
    let mut events = map.get(&day).cloned().unwrap_or_default();
    events.sort_by_key(|fragment| fragment.start());

    let calendar = merge_overlaps(&clamp_to_day(&events, day));
    let summary = DaySummary::new(total_minutes(&calendar), planned_minutes(tasks));

    DayReport {
        day,
        events,
        calendar,
        tasks: task_intervals(tasks),
        summary,
    }
}
