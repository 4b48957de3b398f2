// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Command glue: turns parsed CLI commands into core operations and prints
//! their results.
//!
//! Input and output are passed in so the interactive rename prompt and the
//! printed reports can be exercised without a terminal.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use chrono::Local;

use crate::cli::{join_words, Commands};
use crate::config::Config;
use crate::error::{Result, TsError};
use crate::event::DEFAULT_ACTIVITY;
use crate::mutation::{self, Mutation};
use crate::rename::{apply_renames, find_rename_candidates, RenameMatcher};
use crate::report::Report;
use crate::rotate::{rollover_if_stale, rotate, Rotated};
use crate::session::reconstruct_log;
use crate::store::LogStore;
use crate::timefmt::{format_local, local_date, parse_time_expr, WeekBounds};
use crate::timeoff::project_timeoff;

fn emit<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| TsError::io("write output", e))
}

fn activity_or_default(words: &[String]) -> String {
    let activity = join_words(words);
    if activity.is_empty() {
        DEFAULT_ACTIVITY.to_string()
    } else {
        activity
    }
}

fn rotated_message(from: &LogStore, rotated: &Rotated) -> String {
    match rotated {
        Rotated::Renamed(dest) => format!(
            "Rotated {} to {}\n",
            from.current().display(),
            dest.display()
        ),
        Rotated::Merged(dest) => format!("Appended to {}\n", dest.display()),
    }
}

/// Everything a single invocation needs.
pub struct App {
    store: LogStore,
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        App {
            store: LogStore::new(config.log_path.clone()),
            config,
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Runs `command` as of `now`; prompts read from `input`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        command: Commands,
        now: i64,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        tracing::debug!(?command, now, "dispatching");
        match command {
            Commands::Start { activity } => self.start(&activity, now, out),
            Commands::Stop { time } => self.stop(&time, now, out),
            Commands::Started { time, activity } => self.started(&time, &activity, now, out),
            Commands::List { selector } => self.list(selector.as_deref(), now, out),
            Commands::Timeoff => self.timeoff(now, out),
            Commands::Alias {
                pattern,
                replacement,
            } => self.rename(&pattern, &replacement, now, input, out),
            Commands::Rotate => self.rotate(now, out),
        }
    }

    /// Archives last week's log before a command touches it.
    fn rollover<W: Write>(&self, now: i64, out: &mut W) -> Result<()> {
        if let Some(rotated) = rollover_if_stale(&self.store, self.config.archive_stamp, now)? {
            emit(out, &rotated_message(&self.store, &rotated))?;
        }
        Ok(())
    }

    fn start<W: Write>(&self, words: &[String], now: i64, out: &mut W) -> Result<()> {
        self.rollover(now, out)?;
        let activity = activity_or_default(words);
        mutation::start(&self.store, &activity, now)?;
        emit(out, &format!("Started: {} at {}\n", activity, format_local(now)))
    }

    fn stop<W: Write>(&self, words: &[String], now: i64, out: &mut W) -> Result<()> {
        let at = match join_words(words) {
            t if t.is_empty() => None,
            t => Some(parse_time_expr(&t, now)?),
        };
        self.rollover(now, out)?;
        match mutation::stop(&self.store, at, now)? {
            Mutation::Unchanged => emit(out, "Already stopped.\n"),
            Mutation::Appended(written) | Mutation::Amended { written, .. } => {
                let when = written.last().map(|e| e.epoch()).unwrap_or(now);
                emit(out, &format!("Stopped at {}\n", format_local(when)))
            }
        }
    }

    fn started<W: Write>(&self, time: &str, words: &[String], now: i64, out: &mut W) -> Result<()> {
        let at = parse_time_expr(time, now)?;
        self.rollover(now, out)?;
        let activity = activity_or_default(words);
        mutation::started(&self.store, at, &activity, now)?;
        emit(out, &format!("Started: {} at {}\n", activity, format_local(at)))
    }

    fn list<W: Write>(&self, selector: Option<&str>, now: i64, out: &mut W) -> Result<()> {
        let today = local_date(now).unwrap_or_else(|| Local::now().date_naive());
        let path = self.store.resolve(selector, today)?;
        if !path.exists() {
            return emit(out, "No timesheet data found.\n");
        }
        let is_current = self.store.is_current(&path);
        let rec = reconstruct_log(&self.store, &path, is_current.then_some(now))?;
        let current = if is_current { rec.open } else { None };
        emit(out, &Report::build(&rec.intervals, current).render(now))
    }

    fn timeoff<W: Write>(&self, now: i64, out: &mut W) -> Result<()> {
        self.rollover(now, out)?;
        if !self.store.current().exists() {
            return emit(out, "No timesheet data.\n");
        }
        if let Some(ev) = mutation::start_if_idle(&self.store, now)? {
            tracing::debug!(%ev, "not working; started a placeholder session");
        }
        let rec = reconstruct_log(&self.store, self.store.current(), Some(now))?;
        let daily = self.config.daily_target_hours;
        emit(
            out,
            &project_timeoff(&rec.intervals, rec.open.as_ref(), now, daily).render(daily),
        )
    }

    fn rename<R: BufRead, W: Write>(
        &self,
        pattern: &str,
        replacement: &str,
        now: i64,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let matcher = RenameMatcher::new(pattern, replacement, self.config.rename_match)?;
        let week = WeekBounds::containing(now);
        let path = self.store.current();
        let candidates = find_rename_candidates(&self.store, path, &matcher, week)?;

        let mut selected = HashSet::new();
        for candidate in &candidates {
            emit(
                out,
                &format!(
                    "Original: {}\nReplaced: {}\nReplace (y/n) ",
                    candidate.original, candidate.proposed
                ),
            )?;
            let mut answer = String::new();
            let read = input
                .read_line(&mut answer)
                .map_err(|e| TsError::io("read answer", e))?;
            if read == 0 {
                emit(out, "\n")?;
                break;
            }
            if answer.trim().eq_ignore_ascii_case("y") {
                selected.insert(candidate.line_no);
            }
        }

        let changed = apply_renames(&self.store, path, &matcher, week, &selected)?;
        if changed > 0 {
            emit(out, &format!("Replaced {} of {} entries.\n", changed, candidates.len()))?;
        }
        Ok(())
    }

    fn rotate<W: Write>(&self, now: i64, out: &mut W) -> Result<()> {
        let rotated = rotate(&self.store, self.config.archive_stamp, Some(now))?;
        emit(out, &rotated_message(&self.store, &rotated))
    }
}
