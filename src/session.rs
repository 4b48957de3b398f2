// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Turns the event sequence into closed work intervals.
//!
//! Start/stop pairs are matched in LIFO order: each STOP closes the most recent
//! open START, and a START arriving while another is open closes it first (the
//! earlier session ends exactly when the next one begins). Pairs with zero or
//! negative duration are dropped. Events are processed in log order, never
//! re-sorted by time.

use std::path::Path;

use crate::error::Result;
use crate::event::{parse_events, Event};
use crate::store::LogStore;
use crate::timefmt::{day_index, weekday_index};

/// A reconstructed `(activity, start, end)` span with `end > start`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interval {
    pub activity: String,
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Weekday (Sunday = 0) the interval is attributed to, by its start.
    pub fn weekday(&self) -> usize {
        weekday_index(self.start)
    }

    /// Day number since the epoch of the interval's start.
    pub fn day(&self) -> i64 {
        day_index(self.start)
    }
}

/// A START still waiting for its STOP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenSession {
    pub activity: String,
    pub start: i64,
}

/// Result of a reconstruction pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconstruction {
    pub intervals: Vec<Interval>,
    /// Top of the stack at end of input, if a session is still open. When a
    /// synthetic stop was applied this is the session it closed.
    pub open: Option<OpenSession>,
}

fn close(stack: &mut Vec<OpenSession>, end: i64, out: &mut Vec<Interval>) {
    if let Some(open) = stack.pop() {
        if end > open.start {
            out.push(Interval {
                activity: open.activity,
                start: open.start,
                end,
            });
        }
    }
}

/// Single LIFO pass over `events`.
///
/// `synthetic_stop` is applied after the last event when given, so in-progress
/// work is counted up to that instant; it never touches the log itself.
pub fn reconstruct(events: &[Event], synthetic_stop: Option<i64>) -> Reconstruction {
    let mut stack: Vec<OpenSession> = Vec::new();
    let mut intervals = Vec::new();
    for ev in events {
        match ev {
            Event::Start { epoch, activity } => {
                close(&mut stack, *epoch, &mut intervals);
                stack.push(OpenSession {
                    activity: activity.clone(),
                    start: *epoch,
                });
            }
            Event::Stop { epoch } => close(&mut stack, *epoch, &mut intervals),
        }
    }
    let open = stack.last().cloned();
    if let Some(now) = synthetic_stop {
        close(&mut stack, now, &mut intervals);
    }
    Reconstruction { intervals, open }
}

/// Reads `path` and reconstructs it; an open session is counted up to `now`
/// when `include_open_until` is given. A missing file yields no intervals.
pub fn reconstruct_log(
    store: &LogStore,
    path: &Path,
    include_open_until: Option<i64>,
) -> Result<Reconstruction> {
    let lines = store.read_or_empty(path)?;
    let events = parse_events(&lines);
    Ok(reconstruct(&events, include_open_until))
}
