// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Rules for `start`, `stop` and `started`: append a new entry, or amend the
//! trailing one or two lines when the log already ends with an entry made
//! today.
//!
//! Decisions look only at the last non-blank line of the log. An unrecognised
//! last line counts as "no last event", so it is never dropped by an amend.
//! Callers run [`crate::rotate::rollover_if_stale`] first.

use crate::error::Result;
use crate::event::{last_event, Event, DEFAULT_ACTIVITY};
use crate::store::LogStore;
use crate::timefmt::same_local_day;

/// What a mutation did to the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// New lines appended after the existing content.
    Appended(Vec<Event>),
    /// The last `dropped` lines were replaced by `written`.
    Amended { dropped: usize, written: Vec<Event> },
    /// The log was left byte-identical.
    Unchanged,
}

fn append(store: &LogStore, events: Vec<Event>) -> Result<Mutation> {
    store.append(store.current(), &events)?;
    Ok(Mutation::Appended(events))
}

fn amend(store: &LogStore, dropped: usize, written: Vec<Event>) -> Result<Mutation> {
    store.replace_tail(store.current(), dropped, &written)?;
    Ok(Mutation::Amended { dropped, written })
}

/// Records a start at `now`. Always appends.
pub fn start(store: &LogStore, activity: &str, now: i64) -> Result<Event> {
    let ev = Event::start(now, activity);
    store.append(store.current(), std::slice::from_ref(&ev))?;
    tracing::debug!(activity, epoch = now, "recorded start");
    Ok(ev)
}

/// Records a stop at `at` (or `now`).
///
/// Without an explicit time:
/// - last entry is a STOP from today: the gap since that stop becomes a
///   placeholder session, i.e. `STOP|p` is replaced by `START|p+1|misc/unspecified`
///   and `STOP|now`;
/// - last entry is a STOP from an earlier day: nothing changes;
/// - otherwise `STOP|now` is appended.
///
/// With an explicit time, a trailing STOP is moved to that time; otherwise the
/// STOP is appended.
pub fn stop(store: &LogStore, at: Option<i64>, now: i64) -> Result<Mutation> {
    let lines = store.read_or_empty(store.current())?;
    match (last_event(&lines), at) {
        (Some(Event::Stop { epoch }), Some(t)) => {
            tracing::debug!(from = epoch, to = t, "moving trailing stop");
            amend(store, 1, vec![Event::stop(t)])
        }
        (Some(Event::Stop { epoch }), None) => {
            if !same_local_day(epoch, now) {
                tracing::debug!(last_stop = epoch, "already stopped on an earlier day");
                return Ok(Mutation::Unchanged);
            }
            if now <= epoch + 1 {
                tracing::debug!(last_stop = epoch, "stopped again within the same second");
                return Ok(Mutation::Unchanged);
            }
            tracing::debug!(last_stop = epoch, "double stop; recording the gap as a placeholder session");
            amend(
                store,
                1,
                vec![Event::start(epoch + 1, DEFAULT_ACTIVITY), Event::stop(now)],
            )
        }
        (_, t) => append(store, vec![Event::stop(t.unwrap_or(now))]),
    }
}

/// Records a start at a past time `at`.
///
/// - last entry is a START from today: it is replaced (new time and activity);
/// - last entry is a STOP from today later than `at`: a completed session
///   `START|at` .. that STOP is inserted before it;
/// - otherwise `START|at` is appended, even if that leaves the log out of
///   time order.
pub fn started(store: &LogStore, at: i64, activity: &str, now: i64) -> Result<Mutation> {
    let lines = store.read_or_empty(store.current())?;
    let new_start = Event::start(at, activity);
    match last_event(&lines) {
        Some(Event::Start { epoch, .. }) if same_local_day(epoch, now) => {
            tracing::debug!(from = epoch, to = at, "adjusting today's open start");
            amend(store, 1, vec![new_start])
        }
        Some(Event::Stop { epoch }) if at < epoch && same_local_day(epoch, now) => {
            tracing::debug!(stop = epoch, start = at, "inserting session before today's stop");
            amend(store, 1, vec![new_start, Event::stop(epoch)])
        }
        _ => append(store, vec![new_start]),
    }
}

/// Starts a placeholder session at `now` unless work is already in progress.
pub fn start_if_idle(store: &LogStore, now: i64) -> Result<Option<Event>> {
    let lines = store.read_or_empty(store.current())?;
    if last_event(&lines).map(|e| e.is_start()).unwrap_or(false) {
        return Ok(None);
    }
    start(store, DEFAULT_ACTIVITY, now).map(Some)
}
