// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # timesheet
//!
//! Session-log engine behind the `ts` command. Work is recorded in a plain text
//! log, one entry per line:
//!
//! - `START|unix_epoch|activity`
//! - `STOP|unix_epoch`
//!
//! START/STOP pairs are matched in LIFO order; a START while another session is
//! open closes that session. Reports (time by activity, hours by weekday, when
//! to stop for the daily average) are derived from the reconstructed intervals.
//!
//! | Module | Role |
//! |------------|------|
//! | [`event`] | parse and format log lines |
//! | [`store`] | read, append, amend and atomically rewrite log files; resolve archives |
//! | [`session`] | LIFO reconstruction of intervals |
//! | [`mutation`] | append-vs-amend rules for `start`, `stop`, `started` |
//! | [`report`] | per-activity and per-weekday aggregation |
//! | [`timeoff`] | stop-time projection |
//! | [`rotate`] | weekly archive rotation |
//! | [`rename`] | regex rename of this week's activities |

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod mutation;
pub mod rename;
pub mod report;
pub mod rotate;
pub mod session;
pub mod store;
pub mod timefmt;
pub mod timeoff;

pub use error::{Result, TsError};
pub use event::Event;
pub use store::LogStore;
