//! Temporal analyzer: ring member ages and the genesis-to-now time scale.

use chrono::DateTime;
use serde::Serialize;
use std::fmt;

/// Fixed year length (365.25 days) used for every decomposition.
pub const SECONDS_PER_YEAR: u64 = 31_557_600;
pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_HOUR: u64 = 3_600;
pub const SECONDS_PER_MINUTE: u64 = 60;

pub const DEFAULT_SCALE_WIDTH: usize = 80;

const EMPTY_CELL: char = '_';
const MARKER: char = '*';

/// Signed difference between two timestamps, decomposed greedily.
///
/// `negative` is set when the target lies after the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeDelta {
    pub years: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub negative: bool,
}

impl TimeDelta {
    pub fn from_seconds(total: u64, negative: bool) -> Self {
        let years = total / SECONDS_PER_YEAR;
        let rest = total % SECONDS_PER_YEAR;
        let days = rest / SECONDS_PER_DAY;
        let rest = rest % SECONDS_PER_DAY;
        let hours = rest / SECONDS_PER_HOUR;
        let rest = rest % SECONDS_PER_HOUR;
        Self {
            years,
            days,
            hours,
            minutes: rest / SECONDS_PER_MINUTE,
            seconds: rest % SECONDS_PER_MINUTE,
            negative,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.years * SECONDS_PER_YEAR
            + self.days * SECONDS_PER_DAY
            + self.hours * SECONDS_PER_HOUR
            + self.minutes * SECONDS_PER_MINUTE
            + self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(
            f,
            "{} y, {} d, {} h, {} m, {} s",
            self.years, self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Difference `reference - target`.
pub fn time_delta(reference: u64, target: u64) -> TimeDelta {
    TimeDelta::from_seconds(reference.abs_diff(target), target > reference)
}

/// Render `timestamps` on a `width`-cell line spanning `genesis ..= reference`.
///
/// Members outside the range are clamped to the ends. An empty or inverted
/// range gives a line with no markers.
pub fn time_scale(timestamps: &[u64], genesis: u64, reference: u64, width: usize) -> String {
    let mut cells = vec![EMPTY_CELL; width];
    if width == 0 || reference <= genesis {
        return cells.into_iter().collect();
    }

    let span = (reference - genesis) as f64;
    let last = (width - 1) as f64;
    for &ts in timestamps {
        let clamped = ts.clamp(genesis, reference);
        let pos = ((clamped - genesis) as f64 / span * last).round() as usize;
        cells[pos.min(width - 1)] = MARKER;
    }
    cells.into_iter().collect()
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_timestamp(ts: u64) -> String {
    format_with(ts, "%Y-%m-%d %H:%M:%S")
}

/// `YYYY-MM-DD` in UTC.
pub fn format_date(ts: u64) -> String {
    format_with(ts, "%F")
}

fn format_with(ts: u64, fmt: &str) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format(fmt).to_string())
        .unwrap_or_else(|| ts.to_string())
}
