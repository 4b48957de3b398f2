// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Error types for timesheet operations.

use std::path::PathBuf;

/// All errors a single `ts` invocation can end with.
///
/// Nothing is retried: each variant is terminal for the command that produced it.
#[derive(Debug, thiserror::Error)]
pub enum TsError {
    /// The referenced log or archive does not exist.
    #[error("no timesheet data found at {}", .0.display())]
    NotFound(PathBuf),

    /// A selector matched more than one log file.
    #[error("multiple timesheets match \"{selector}\" ({} candidates)", .candidates.len())]
    Ambiguous {
        selector: String,
        candidates: Vec<PathBuf>,
    },

    /// A selector matched no log file.
    #[error("no timesheet matches \"{0}\"")]
    NoMatch(String),

    /// A time expression could not be parsed.
    #[error("could not parse time: {0}")]
    Parse(String),

    /// Rotation found an absent or empty log.
    #[error("no timesheet data found at {}", .0.display())]
    NoData(PathBuf),

    /// Rotation found a log without a single START/STOP line.
    #[error("no valid entries in {}", .0.display())]
    NoValidEntries(PathBuf),

    #[error("no activities matching \"{pattern}\" found for this week")]
    NoRenameMatches { pattern: String },

    #[error("invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("configuration file malformed: {}: {details}", .path.display())]
    Config { path: PathBuf, details: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl TsError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TsError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TsError>;
