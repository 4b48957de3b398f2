// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! When can I stop? Projects the clock time at which the average over every
//! worked day reaches the daily target.

use std::collections::HashSet;

use crate::report::trunc2;
use crate::session::{Interval, OpenSession};
use crate::timefmt::{day_index, format_local};

/// Default daily target.
pub const DEFAULT_DAILY_HOURS: f64 = 8.0;

#[derive(Clone, Debug, PartialEq)]
pub enum TimeoffProjection {
    /// No interval at all.
    NoData,
    /// The average already meets the target.
    AlreadyMet { now: i64 },
    /// Keep working until `stop_at`.
    StopAt {
        stop_at: i64,
        remaining_hours: f64,
        worked_days: usize,
    },
}

impl TimeoffProjection {
    /// Plaintext lines as printed by `ts timeoff`.
    pub fn render(&self, daily_hours: f64) -> String {
        match self {
            TimeoffProjection::NoData => "No work recorded.\n".to_string(),
            TimeoffProjection::AlreadyMet { now } => format!(
                "Average already at least {} hours per day worked. You may stop now.\n{}\n",
                daily_hours,
                format_local(*now)
            ),
            TimeoffProjection::StopAt {
                stop_at,
                remaining_hours,
                worked_days,
            } => format!(
                "Stop at: {}\n({:.2} hours remaining for {}h/day average over {} day(s))\n",
                format_local(*stop_at),
                remaining_hours,
                daily_hours,
                worked_days
            ),
        }
    }
}

/// Worked days are the distinct epoch days holding an interval start, plus the
/// day the still-open session began (so a session started just now counts its
/// day); hour figures are truncated to two decimals before comparing.
pub fn project_timeoff(
    intervals: &[Interval],
    open: Option<&OpenSession>,
    now: i64,
    daily_hours: f64,
) -> TimeoffProjection {
    let days: HashSet<i64> = intervals
        .iter()
        .map(Interval::day)
        .chain(open.map(|o| day_index(o.start)))
        .collect();
    if days.is_empty() {
        return TimeoffProjection::NoData;
    }
    let total_sec: i64 = intervals.iter().map(Interval::duration).sum();
    let worked_hours = trunc2(total_sec as f64 / 3600.0);
    let target_hours = trunc2(daily_hours * days.len() as f64);
    let needed = trunc2(target_hours - worked_hours);
    if needed <= 0.0 {
        return TimeoffProjection::AlreadyMet { now };
    }
    TimeoffProjection::StopAt {
        stop_at: now + (needed * 3600.0).round() as i64,
        remaining_hours: needed,
        worked_days: days.len(),
    }
}
