// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::event::clean_activity;

/// Work timesheet: record when you start and stop, then report where the time went.
#[derive(Parser, Debug)]
#[command(name = "ts", version, arg_required_else_help = true)]
pub struct Cli {
    /// Timesheet log to use instead of ~/Documents/timesheet.log
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Path to config file (default: <config dir>/ts/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write debug diagnostics to stderr (same as TS_DEBUG=1)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start an activity now (default: misc/unspecified)
    Start {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        activity: Vec<String>,
    },

    /// Stop working now, or at the given time
    #[command(visible_alias = "stopped")]
    Stop {
        /// e.g. "17:30", "5:30 PM", "2025-02-16 17:30", "15m ago"
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        time: Vec<String>,
    },

    /// Record an activity that began at an earlier time
    Started {
        /// e.g. "09:00", "9:00 AM", "2025-02-16 09:00", "yesterday 14:00"
        #[arg(allow_hyphen_values = true)]
        time: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        activity: Vec<String>,
    },

    /// Report time by activity and by weekday
    List {
        /// "log", an archive stamp such as 250216, a date such as 02/16, or a path
        selector: Option<String>,
    },

    /// When to stop for an average of the daily target over days worked
    Timeoff,

    /// Interactively rename this week's activities matching a regex
    #[command(visible_alias = "rename")]
    Alias { pattern: String, replacement: String },

    /// Archive the current log now
    Rotate,
}

/// Joins words into one activity; embedded newlines would break the log format.
pub fn join_words(words: &[String]) -> String {
    clean_activity(&words.join(" "))
}
