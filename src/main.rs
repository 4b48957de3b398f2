// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # ts: timesheet CLI
//!
//! Tracks work start/stop and reports time by activity and by day of week.
//! The log file lives at `$HOME/Documents/timesheet.log` by default.
//!
//! | Command    | Description |
//! |------------|-------------|
//! | `start`    | Record work start now; optional activity (default: misc/unspecified). |
//! | `stop`     | Record work stop (optional time); moves a trailing STOP, records a same-day gap. |
//! | `list`     | Report % per activity and hours per weekday; optional archive selector. |
//! | `started`  | Record a past start time; adjusts today's last START or inserts before today's STOP. |
//! | `timeoff`  | Show stop time for the daily average; starts work if idle. |
//! | `alias`    | Interactively replace activity text in this week's START entries (regex). |
//! | `rename`   | Same as `alias`. |
//! | `rotate`   | Archive the log as `timesheet.YYMMDD`; add STOP first if last entry is START. |

use std::io;
use std::process;

use chrono::Local;
use clap::Parser;

use timesheet::cli::Cli;
use timesheet::commands::App;
use timesheet::config::Config;
use timesheet::logging;

fn main() {
    // Exit quietly when stdout is closed early (`ts list | head`).
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
    let Cli {
        log,
        config,
        verbose,
        command,
    } = Cli::parse();
    logging::init(verbose);

    let result = Config::load(config.as_deref(), log).and_then(|config| {
        let app = App::new(config);
        let stdin = io::stdin();
        let stdout = io::stdout();
        app.run(
            command,
            Local::now().timestamp(),
            &mut stdin.lock(),
            &mut stdout.lock(),
        )
    });
    if let Err(e) = result {
        eprintln!("ts: {}", e);
        process::exit(1);
    }
}
