// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Typed log lines.
//!
//! One entry per line:
//!
//! - `START|unix_epoch|activity`
//! - `STOP|unix_epoch`
//!
//! Lines matching neither form are carried through rewrites untouched but are
//! invisible to reconstruction and to the mutation rules.

use std::fmt;

/// Activity recorded when none is given, and for gaps filled by a double stop.
pub const DEFAULT_ACTIVITY: &str = "misc/unspecified";

/// A single parsed line from the timesheet log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// `START|epoch|activity`
    Start { epoch: i64, activity: String },
    /// `STOP|epoch`
    Stop { epoch: i64 },
}

impl Event {
    pub fn start(epoch: i64, activity: impl Into<String>) -> Self {
        Event::Start {
            epoch,
            activity: activity.into(),
        }
    }

    pub fn stop(epoch: i64) -> Self {
        Event::Stop { epoch }
    }

    pub fn epoch(&self) -> i64 {
        match self {
            Event::Start { epoch, .. } | Event::Stop { epoch } => *epoch,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Event::Start { .. })
    }

    /// Parses a log line; returns `None` if it is not a valid START/STOP line.
    ///
    /// The activity is everything after the second `|`, so an activity that itself
    /// contains `|` survives.
    pub fn parse(line: &str) -> Option<Self> {
        let s = line.trim_start().trim_end_matches(['\r', '\n']);
        if let Some(rest) = s.strip_prefix("START|") {
            let mut parts = rest.splitn(2, '|');
            let epoch: i64 = parts.next()?.trim().parse().ok()?;
            let activity = parts.next().unwrap_or("").to_string();
            return Some(Event::Start { epoch, activity });
        }
        if let Some(rest) = s.strip_prefix("STOP|") {
            let epoch: i64 = rest.trim().parse().ok()?;
            return Some(Event::Stop { epoch });
        }
        None
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Start { epoch, activity } => write!(f, "START|{}|{}", epoch, activity),
            Event::Stop { epoch } => write!(f, "STOP|{}", epoch),
        }
    }
}

/// Activity text safe to store: line breaks become spaces, outer blanks go.
pub fn clean_activity(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

/// Parses every recognised line, dropping the rest. Log order is preserved.
pub fn parse_events<S: AsRef<str>>(lines: &[S]) -> Vec<Event> {
    lines
        .iter()
        .filter_map(|l| Event::parse(l.as_ref()))
        .collect()
}

/// The event on the last non-blank line, or `None` when that line is not a
/// START/STOP entry (or there are no lines).
pub fn last_event<S: AsRef<str>>(lines: &[S]) -> Option<Event> {
    let line = lines
        .iter()
        .map(|l| l.as_ref())
        .rev()
        .find(|l| !l.trim().is_empty())?;
    Event::parse(line)
}
