//! `dayplan` CLI: expand iCalendar files and report busy / planned / free time.
//!
//! ## Usage
//!
//! ```sh
//! # Expand a calendar (stdin → stdout) over today ± 90 days, as JSON
//! cat schedule.ics | dayplan expand
//!
//! # Explicit window and day zone, written to a file
//! dayplan expand -i schedule.ics --from 2026-03-01 --to 2026-03-31 \
//!     --zone America/New_York -o days.json
//!
//! # Report one day, with planned tasks
//! dayplan day -i schedule.ics --date 2026-03-02 --tasks tasks.json
//!
//! # Same report as JSON
//! dayplan day -i schedule.ics --date 2026-03-02 --json
//! ```
//!
//! Set `RUST_LOG=dayplan_engine=debug` to see expansion logs on stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use dayplan_engine::{
    day_report, default_day, expand_ics, parse_zone, DayKey, DayMap, DayReport, ExpandOptions,
    Task,
};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "dayplan",
    version,
    about = "Expand iCalendar files into per-day busy / planned / free time"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a calendar into a day → events map (JSON)
    Expand {
        /// Input .ics file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Report busy, planned and free time for one day
    Day {
        /// Input .ics file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Day to report (defaults to today, or the first day with events)
        #[arg(long)]
        date: Option<DayKey>,
        /// JSON file holding an array of planned tasks
        #[arg(long, env = "DAYPLAN_TASKS")]
        tasks: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args)]
struct WindowArgs {
    /// IANA zone whose midnights bound each day
    #[arg(long, env = "DAYPLAN_ZONE", default_value = "UTC")]
    zone: String,
    /// Centre of the expansion window (defaults to today)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    anchor: Option<NaiveDate>,
    /// Days either side of the anchor to expand
    #[arg(long, env = "DAYPLAN_DAYS", default_value_t = 90)]
    days: u64,
    /// First day of an explicit window (inclusive)
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,
    /// Last day of an explicit window (inclusive)
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
}

/// A resolved expansion window in UTC, plus the day zone.
struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    options: ExpandOptions,
}

impl WindowArgs {
    fn resolve(&self, fallback_anchor: Option<NaiveDate>) -> Result<Window> {
        let zone = parse_zone(&self.zone)?;
        let (first, last) = match (self.from, self.to) {
            (Some(from), Some(to)) => {
                if to < from {
                    anyhow::bail!("--to ({}) is before --from ({})", to, from);
                }
                (from, to)
            }
            _ => {
                let anchor = self
                    .anchor
                    .or(fallback_anchor)
                    .unwrap_or_else(|| today(&zone).date());
                let span = Days::new(self.days);
                let first = anchor
                    .checked_sub_days(span)
                    .context("Window start is out of range")?;
                let last = anchor
                    .checked_add_days(span)
                    .context("Window end is out of range")?;
                (first, last)
            }
        };

        Ok(Window {
            start: DayKey::new(first).start_in(&zone).with_timezone(&Utc),
            end: DayKey::new(last).end_in(&zone).with_timezone(&Utc),
            options: ExpandOptions::in_zone(zone),
        })
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Expand {
            input,
            output,
            window,
        } => {
            let window = window.resolve(None)?;
            let days = expand_input(input.as_deref(), &window)?;
            let json = serde_json::to_string_pretty(&days)
                .context("Failed to serialize day map to JSON")?;
            write_output(output.as_deref(), &format!("{}\n", json))?;
        }
        Commands::Day {
            input,
            date,
            tasks,
            json,
            window,
        } => {
            let window = window.resolve(date.map(|d| d.date()))?;
            let days = expand_input(input.as_deref(), &window)?;
            let tasks = match tasks.as_deref() {
                Some(path) => read_tasks(path)?,
                None => Vec::new(),
            };

            let today = today(&window.options.zone);
            let day = date
                .or_else(|| default_day(&days, today))
                .unwrap_or(today);
            let report = day_report(&days, &tasks, day);

            let rendered = if json {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize day report to JSON")?;
                format!("{}\n", json)
            } else {
                render_report(&report)
            };
            write_output(None, &rendered)?;
        }
    }

    Ok(())
}

/// Tracing is opt-in via `RUST_LOG`; invalid filters are ignored. Logs go to
/// stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn today(zone: &Tz) -> DayKey {
    DayKey::of(&Utc::now().with_timezone(zone))
}

fn expand_input(path: Option<&str>, window: &Window) -> Result<DayMap> {
    let text = read_input(path)?;
    debug!(
        start = %window.start,
        end = %window.end,
        zone = %window.options.zone,
        "expanding calendar"
    );
    expand_ics(&text, window.start, window.end, &window.options)
        .context("Failed to expand calendar")
}

fn read_tasks(path: &str) -> Result<Vec<Task>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tasks file: {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid tasks JSON in {}", path))
}

fn hours(minutes: u32) -> String {
    format!("{:.1} h", f64::from(minutes) / 60.0)
}

/// Plain-text day report: totals first, then the timeline and events.
fn render_report(report: &DayReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", report.day, report.day.date().format("%A")));
    out.push_str(&format!("Busy:    {}\n", hours(report.summary.busy_minutes)));
    out.push_str(&format!("Planned: {}\n", hours(report.summary.planned_minutes)));
    out.push_str(&format!("Free:    {}\n", hours(report.summary.free_minutes)));

    if !report.calendar.is_empty() {
        out.push_str("\nCalendar:\n");
        for interval in &report.calendar {
            out.push_str(&format!("  {}\n", interval));
        }
    }
    if !report.tasks.is_empty() {
        out.push_str("\nTasks:\n");
        for interval in &report.tasks {
            out.push_str(&format!("  {}\n", interval));
        }
    }

    out.push_str(&format!("\nEvents ({}):\n", report.event_count()));
    for event in &report.events {
        let clock = event.start().format("%-I:%M %p").to_string();
        out.push_str(&format!("  {:>8}  {}\n", clock, event.title()));
    }
    out
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
