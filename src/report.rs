// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Time by activity and by weekday, and the plaintext `list` report.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::session::{Interval, OpenSession};
use crate::timefmt::format_local;

/// Weekday names for the report (Sunday first).
pub const DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

/// Truncate hours to two decimal places (discard fractions beyond the second decimal).
pub fn trunc2(h: f64) -> f64 {
    (h * 100.0).trunc() / 100.0
}

/// One activity's share of the total.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityShare {
    pub activity: String,
    pub percent: f64,
    pub seconds: i64,
}

/// Percentage of total time per activity (exact, case-sensitive names),
/// highest first; ties are ordered by name. Empty when nothing was worked.
pub fn aggregate_by_activity(intervals: &[Interval]) -> Vec<ActivityShare> {
    let mut act_sec: HashMap<&str, i64> = HashMap::new();
    for iv in intervals {
        *act_sec.entry(iv.activity.as_str()).or_insert(0) += iv.duration();
    }
    let total: i64 = act_sec.values().sum();
    if total <= 0 {
        return Vec::new();
    }
    let mut shares: Vec<ActivityShare> = act_sec
        .into_iter()
        .map(|(activity, seconds)| ActivityShare {
            activity: activity.to_string(),
            percent: 100.0 * seconds as f64 / total as f64,
            seconds,
        })
        .collect();
    shares.sort_by(|a, b| {
        b.seconds
            .cmp(&a.seconds)
            .then_with(|| a.activity.cmp(&b.activity))
    });
    shares
}

/// Hours per weekday, Sunday through Saturday, by each interval's start.
pub fn aggregate_by_weekday(intervals: &[Interval]) -> [f64; 7] {
    let mut dow_sec = [0i64; 7];
    for iv in intervals {
        dow_sec[iv.weekday()] += iv.duration();
    }
    dow_sec.map(|s| s as f64 / 3600.0)
}

/// Everything the `list` command prints.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub activities: Vec<ActivityShare>,
    pub weekdays: [f64; 7],
    /// Set only when listing the current log with a session still open.
    pub current: Option<OpenSession>,
}

impl Report {
    pub fn build(intervals: &[Interval], current: Option<OpenSession>) -> Self {
        Report {
            activities: aggregate_by_activity(intervals),
            weekdays: aggregate_by_weekday(intervals),
            current,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Renders the report as printed by `ts list`; `now` is used for the
    /// running duration of the current task.
    pub fn render(&self, now: i64) -> String {
        let mut out = String::new();
        if self.is_empty() {
            out.push_str("No work recorded.\n");
            return out;
        }
        for share in &self.activities {
            let _ = writeln!(out, "{:.1}%  {}", share.percent, share.activity);
        }
        for (name, hours) in DAY_NAMES.iter().zip(self.weekdays.iter()) {
            let _ = writeln!(out, "{}  {:.2}", name, hours);
        }
        let total: f64 = self.weekdays.iter().map(|&h| trunc2(h)).sum();
        let _ = writeln!(out, "Total  {:.2}", trunc2(total));
        if let Some(task) = &self.current {
            let _ = writeln!(
                out,
                "\nCurrent Task: {}, started {}, worked {}",
                task.activity,
                format_local(task.start),
                format_worked(now - task.start)
            );
        }
        out
    }
}

/// `1h 5m` or `42m`.
fn format_worked(secs: i64) -> String {
    let mins = secs.max(0) / 60;
    if mins >= 60 {
        format!("{}h {}m", mins / 60, mins % 60)
    } else {
        format!("{}m", mins)
    }
}
