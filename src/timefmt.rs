// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Local-clock helpers: calendar days, the Sunday-based work week, display
//! formatting and the time expressions accepted by `started` and `stop`.
//!
//! Every function takes the instant it reasons about as an argument; only the
//! process's local time zone is ambient.

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::{Result, TsError};

pub const SECS_PER_DAY: i64 = 86_400;

/// Format used for every user-facing timestamp.
pub const DISPLAY_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

pub fn local_datetime(epoch: i64) -> Option<DateTime<Local>> {
    Local.timestamp_opt(epoch, 0).single()
}

/// Local calendar date of a Unix timestamp.
pub fn local_date(epoch: i64) -> Option<NaiveDate> {
    local_datetime(epoch).map(|dt| dt.date_naive())
}

/// True when both instants fall on the same local calendar date.
pub fn same_local_day(a: i64, b: i64) -> bool {
    match (local_date(a), local_date(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Renders an epoch in the local zone, e.g. `Fri Feb 20 09:00:00 EST 2026`.
pub fn format_local(epoch: i64) -> String {
    local_datetime(epoch)
        .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| epoch.to_string())
}

/// Whole days since the Unix epoch (UTC day boundaries).
pub fn day_index(epoch: i64) -> i64 {
    epoch.div_euclid(SECS_PER_DAY)
}

/// Weekday of an instant with Sunday = 0; Jan 1 1970 was a Thursday (4).
pub fn weekday_index(epoch: i64) -> usize {
    (day_index(epoch) + 4).rem_euclid(7) as usize
}

fn to_local_epoch(ndt: NaiveDateTime) -> Option<i64> {
    match ndt.and_local_timezone(Local) {
        LocalResult::Single(dt) => Some(dt.timestamp()),
        LocalResult::Ambiguous(early, _) => Some(early.timestamp()),
        LocalResult::None => None,
    }
}

/// Epoch of local midnight starting `date`. A midnight skipped by a DST jump
/// falls back to UTC midnight of the same date.
pub fn start_of_day(date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    to_local_epoch(midnight).unwrap_or_else(|| midnight.and_utc().timestamp())
}

/// Sunday 00:00:00 through the following Saturday 23:59:59, local time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekBounds {
    pub start: i64,
    pub end: i64,
}

impl WeekBounds {
    /// The work week containing `epoch`.
    pub fn containing(epoch: i64) -> Self {
        let today = local_date(epoch).unwrap_or_else(|| {
            DateTime::from_timestamp(epoch, 0)
                .map(|dt| dt.date_naive())
                .unwrap_or_default()
        });
        let sunday = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
        let start = start_of_day(sunday);
        let end = start_of_day(sunday + Duration::days(7)) - 1;
        WeekBounds { start, end }
    }

    pub fn contains(&self, epoch: i64) -> bool {
        epoch >= self.start && epoch <= self.end
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"];
const TIME_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p"];

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Parses a duration such as `90`, `1h30m` or `100s` into seconds. A bare number
/// is minutes; spelled-out units (`2 hours`, `5 minutes`) are accepted too.
pub fn parse_duration(s: &str) -> Option<i64> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut total: i64 = 0;
    let mut seen = false;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if start == i {
            return None;
        }
        let num: i64 = s[start..i].parse().ok()?;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let unit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        let scale = match s[unit_start..i].to_ascii_lowercase().as_str() {
            "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
            "" | "m" | "min" | "mins" | "minute" | "minutes" => 60,
            "s" | "sec" | "secs" | "second" | "seconds" => 1,
            _ => return None,
        };
        total = total.checked_add(num.checked_mul(scale)?)?;
        seen = true;
    }
    seen.then_some(total)
}

/// Parses a time expression into a Unix epoch, relative to `now` where needed.
///
/// Accepted: `YYYY-MM-DD HH:MM[:SS]`, `MM/DD/YYYY HH:MM`, `MM/DD HH:MM` (this
/// year), `HH:MM[:SS]` and `H:MM AM` (today), `YYYY-MM-DD` (midnight), `now`,
/// `today <time>`, `yesterday <time>`, and offsets into the past such as
/// `-45m`, `90m ago` or `2 hours ago`.
pub fn parse_time_expr(expr: &str, now: i64) -> Result<i64> {
    let fail = || TsError::Parse(expr.to_string());
    let s = expr.trim();
    if s.is_empty() {
        return Err(fail());
    }
    let today = local_date(now).ok_or_else(fail)?;

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return to_local_epoch(dt).ok_or_else(fail);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&format!("{} {}", today.year(), s), "%Y %m/%d %H:%M") {
        return to_local_epoch(dt).ok_or_else(fail);
    }
    if let Some(t) = parse_time_of_day(s) {
        return to_local_epoch(today.and_time(t)).ok_or_else(fail);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(start_of_day(d));
    }

    let lower = s.to_ascii_lowercase();
    if lower == "now" {
        return Ok(now);
    }
    for (word, offset) in [("today", 0), ("yesterday", 1)] {
        if let Some(rest) = lower.strip_prefix(word) {
            let date = today - Duration::days(offset);
            let rest = rest.trim();
            if rest.is_empty() {
                return Ok(start_of_day(date));
            }
            let t = parse_time_of_day(&rest.to_ascii_uppercase()).ok_or_else(fail)?;
            return to_local_epoch(date.and_time(t)).ok_or_else(fail);
        }
    }
    let relative = lower
        .strip_suffix("ago")
        .or_else(|| lower.strip_prefix('-'));
    if let Some(span) = relative.and_then(parse_duration) {
        return Ok(now - span);
    }
    Err(fail())
}
