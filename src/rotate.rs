// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Log rotation.
//!
//! The current log is archived as `<stem>.<stamp>`, where the stamp is the local
//! date (or date and time) of the latest entry in the log, not of the moment
//! of rotation. Rotating into a stamp that already exists merges into it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TsError};
use crate::event::{last_event, parse_events, Event};
use crate::store::{terminate_last_line, LogStore};
use crate::timefmt::{local_datetime, WeekBounds};

/// Shape of the archive stamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampFormat {
    /// `YYMMDD`
    #[default]
    Date,
    /// `YYMMDDHHMM`
    DateTime,
}

impl StampFormat {
    fn pattern(self) -> &'static str {
        match self {
            StampFormat::Date => "%y%m%d",
            StampFormat::DateTime => "%y%m%d%H%M",
        }
    }

    /// Local-time stamp for `epoch`.
    pub fn format(self, epoch: i64) -> Option<String> {
        local_datetime(epoch).map(|dt| dt.format(self.pattern()).to_string())
    }
}

/// Where a rotation put the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rotated {
    /// The log was renamed to a new archive.
    Renamed(PathBuf),
    /// An archive with the same stamp existed; the log was appended to it.
    Merged(PathBuf),
}

impl Rotated {
    pub fn path(&self) -> &Path {
        match self {
            Rotated::Renamed(p) | Rotated::Merged(p) => p,
        }
    }
}

/// Latest epoch among all START/STOP lines.
pub fn max_epoch<S: AsRef<str>>(lines: &[S]) -> Option<i64> {
    parse_events(lines).iter().map(Event::epoch).max()
}

/// Archives the current log.
///
/// With `close_open_at`, a trailing START is first closed by a STOP at that
/// instant so the archived week carries no open session.
pub fn rotate(store: &LogStore, stamp: StampFormat, close_open_at: Option<i64>) -> Result<Rotated> {
    let path = store.current();
    let mut lines = match store.read(path) {
        Err(TsError::NotFound(_)) => return Err(TsError::NoData(path.to_path_buf())),
        other => other?,
    };
    if lines.iter().all(|l| l.trim().is_empty()) {
        return Err(TsError::NoData(path.to_path_buf()));
    }
    if let Some(now) = close_open_at {
        if last_event(&lines).map(|e| e.is_start()).unwrap_or(false) {
            let stop = Event::stop(now);
            store.append(path, std::slice::from_ref(&stop))?;
            lines.push(stop.to_string());
        }
    }
    let latest = max_epoch(&lines).ok_or_else(|| TsError::NoValidEntries(path.to_path_buf()))?;
    let stamp = stamp
        .format(latest)
        .ok_or_else(|| TsError::NoValidEntries(path.to_path_buf()))?;
    let dest = store.archive_path(&stamp);
    if dest.exists() {
        let mut merged = store.read_raw(&dest)?;
        terminate_last_line(&mut merged);
        merged.push_str(&store.read_raw(path)?);
        store.rewrite(&dest, &merged)?;
        fs::remove_file(path).map_err(|e| TsError::io(format!("remove {}", path.display()), e))?;
        tracing::info!(from = %path.display(), to = %dest.display(), "merged log into existing archive");
        Ok(Rotated::Merged(dest))
    } else {
        fs::rename(path, &dest).map_err(|e| {
            TsError::io(format!("rename {} to {}", path.display(), dest.display()), e)
        })?;
        tracing::info!(from = %path.display(), to = %dest.display(), "rotated log");
        Ok(Rotated::Renamed(dest))
    }
}

/// Rotates when the log's last entry predates the current week (Sunday 00:00
/// local). Run at command entry, before any read or write of the log.
pub fn rollover_if_stale(store: &LogStore, stamp: StampFormat, now: i64) -> Result<Option<Rotated>> {
    let lines = store.read_or_empty(store.current())?;
    let Some(last) = last_event(&lines) else {
        return Ok(None);
    };
    let week = WeekBounds::containing(now);
    if last.epoch() >= week.start {
        return Ok(None);
    }
    tracing::debug!(last = last.epoch(), week_start = week.start, "log is from a previous week");
    rotate(store, stamp, None).map(Some)
}
