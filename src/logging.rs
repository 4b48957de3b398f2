// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Diagnostics go to stderr through `tracing`; report output never does.

use std::env;

use tracing_subscriber::EnvFilter;

/// Environment switch that forces debug output.
pub const DEBUG_ENV: &str = "TS_DEBUG";

/// Filter used when neither `--verbose`, `TS_DEBUG` nor `RUST_LOG` is set.
const DEFAULT_LEVEL: &str = "warn";

fn build_filter(force_debug: bool) -> EnvFilter {
    if force_debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }
}

/// Installs the stderr subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let force_debug = verbose || env::var_os(DEBUG_ENV).is_some();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(force_debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
