// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Renaming activities of this week's START entries.
//!
//! Finding candidates and applying a confirmed subset are separate steps so the
//! caller can ask the user about each line in between. Only the confirmed START
//! lines are rewritten, by position; everything else is carried over verbatim.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, TsError};
use crate::event::{clean_activity, Event};
use crate::store::LogStore;
use crate::timefmt::WeekBounds;

/// How a pattern is matched against activity text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Match anywhere in the activity.
    #[default]
    Search,
    /// The whole activity must match.
    Whole,
}

/// Compiled pattern plus the activity text that replaces a match. Line breaks in
/// the replacement are flattened so a rename can never add log lines.
#[derive(Clone, Debug)]
pub struct RenameMatcher {
    pattern: String,
    regex: Regex,
    replacement: String,
}

impl RenameMatcher {
    pub fn new(pattern: &str, replacement: &str, mode: MatchMode) -> Result<Self> {
        let source = match mode {
            MatchMode::Search => pattern.to_string(),
            MatchMode::Whole => format!("^(?:{})$", pattern),
        };
        let regex = Regex::new(&source).map_err(|source| TsError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(RenameMatcher {
            pattern: pattern.to_string(),
            regex,
            replacement: clean_activity(replacement),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The replacement line for `line` when it is a START inside `week` whose
    /// activity matches.
    fn propose(&self, line: &str, week: &WeekBounds) -> Option<Event> {
        match Event::parse(line)? {
            Event::Start { epoch, activity } if week.contains(epoch) && self.regex.is_match(&activity) => {
                Some(Event::start(epoch, self.replacement.clone()))
            }
            _ => None,
        }
    }
}

/// One START line that would be renamed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameCandidate {
    /// 1-based line number in the log.
    pub line_no: usize,
    pub original: String,
    pub proposed: String,
}

/// Every START line of `week` whose activity matches. Fails with
/// [`TsError::NoRenameMatches`] when there is none.
pub fn find_rename_candidates(
    store: &LogStore,
    path: &Path,
    matcher: &RenameMatcher,
    week: WeekBounds,
) -> Result<Vec<RenameCandidate>> {
    let lines = store.read(path)?;
    let candidates: Vec<RenameCandidate> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            matcher.propose(line, &week).map(|ev| RenameCandidate {
                line_no: i + 1,
                original: line.clone(),
                proposed: ev.to_string(),
            })
        })
        .collect();
    if candidates.is_empty() {
        return Err(TsError::NoRenameMatches {
            pattern: matcher.pattern().to_string(),
        });
    }
    Ok(candidates)
}

/// Rewrites the selected candidate lines in place and returns how many changed.
/// Selected line numbers that are no longer candidates are left alone, and every
/// other line keeps its exact bytes, line ending included.
pub fn apply_renames(
    store: &LogStore,
    path: &Path,
    matcher: &RenameMatcher,
    week: WeekBounds,
    selected: &HashSet<usize>,
) -> Result<usize> {
    if selected.is_empty() {
        return Ok(0);
    }
    let content = store.read_raw(path)?;
    let mut changed = 0;
    let mut out = String::with_capacity(content.len());
    for (i, raw) in content.split_inclusive('\n').enumerate() {
        let body = raw.trim_end_matches(['\r', '\n']);
        let proposed = if selected.contains(&(i + 1)) {
            matcher.propose(body, &week)
        } else {
            None
        };
        match proposed {
            Some(ev) => {
                changed += 1;
                out.push_str(&ev.to_string());
                out.push_str(&raw[body.len()..]);
            }
            None => out.push_str(raw),
        }
    }
    if changed > 0 {
        store.rewrite(path, &out)?;
        tracing::info!(path = %path.display(), pattern = matcher.pattern(), changed, "renamed activities");
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const NOW: i64 = 1771600000;

    fn setup(content: &str) -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("timesheet.log"));
        fs::write(store.current(), content).unwrap();
        (dir, store)
    }

    fn week() -> WeekBounds {
        WeekBounds::containing(NOW)
    }

    #[test]
    fn test_candidates_only_this_week_and_matching() {
        let w = week();
        let content = format!(
            "START|{}|coding old\nSTOP|{}\nSTART|{}|coding\nSTART|{}|meeting\nSTOP|{}\n",
            w.start - 100,
            w.start - 50,
            w.start + 10,
            w.start + 20,
            w.start + 30
        );
        let (_dir, store) = setup(&content);
        let m = RenameMatcher::new("cod", "dev", MatchMode::Search).unwrap();
        let found = find_rename_candidates(&store, store.current(), &m, w).unwrap();
        assert_eq!(
            found,
            vec![RenameCandidate {
                line_no: 3,
                original: format!("START|{}|coding", w.start + 10),
                proposed: format!("START|{}|dev", w.start + 10),
            }]
        );
    }

    #[test]
    fn test_whole_mode_is_anchored() {
        let w = week();
        let (_dir, store) = setup(&format!("START|{}|coding\nSTART|{}|cod\n", w.start + 1, w.start + 2));
        let m = RenameMatcher::new("cod", "dev", MatchMode::Whole).unwrap();
        let found = find_rename_candidates(&store, store.current(), &m, w).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line_no, 2);
    }

    #[test]
    fn test_no_matches() {
        let w = week();
        let (_dir, store) = setup(&format!("START|{}|other\nSTOP|{}\n", w.start, w.start + 100));
        let m = RenameMatcher::new("nonexistent", "repl", MatchMode::Search).unwrap();
        let err = find_rename_candidates(&store, store.current(), &m, w).unwrap_err();
        assert!(matches!(err, TsError::NoRenameMatches { .. }));
        assert!(err.to_string().contains("no activities matching"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RenameMatcher::new("(", "x", MatchMode::Search).unwrap_err();
        assert!(matches!(err, TsError::InvalidPattern { .. }));
    }

    #[test]
    fn test_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("timesheet.log"));
        let m = RenameMatcher::new("a", "b", MatchMode::Search).unwrap();
        let err = find_rename_candidates(&store, store.current(), &m, week()).unwrap_err();
        assert!(matches!(err, TsError::NotFound(_)));
    }

    #[test]
    fn test_apply_only_selected_lines() {
        let w = week();
        let content = format!(
            "# kept\nSTART|{}|coding\nSTOP|{}\nSTART|{}|coding\nSTOP|{}\n",
            w.start + 10,
            w.start + 20,
            w.start + 30,
            w.start + 40
        );
        let (_dir, store) = setup(&content);
        let m = RenameMatcher::new("^coding$", "dev", MatchMode::Search).unwrap();
        let selected: HashSet<usize> = [4, 3].into_iter().collect();
        let changed = apply_renames(&store, store.current(), &m, w, &selected).unwrap();
        assert_eq!(changed, 1);
        let expected = format!(
            "# kept\nSTART|{}|coding\nSTOP|{}\nSTART|{}|dev\nSTOP|{}\n",
            w.start + 10,
            w.start + 20,
            w.start + 30,
            w.start + 40
        );
        assert_eq!(fs::read_to_string(store.current()).unwrap(), expected);
    }

    #[test]
    fn test_apply_nothing_selected_leaves_file() {
        let w = week();
        let content = format!("START|{}|coding\n", w.start + 10);
        let (_dir, store) = setup(&content);
        let m = RenameMatcher::new("coding", "dev", MatchMode::Search).unwrap();
        assert_eq!(apply_renames(&store, store.current(), &m, w, &HashSet::new()).unwrap(), 0);
        assert_eq!(fs::read_to_string(store.current()).unwrap(), content);
    }

    #[test]
    fn test_replacement_line_breaks_cannot_add_lines() {
        let w = week();
        let (_dir, store) = setup(&format!("START|{}|x\nSTOP|{}\n", w.start + 10, w.start + 20));
        let m = RenameMatcher::new("x", "y\nSTOP|1", MatchMode::Search).unwrap();
        let selected: HashSet<usize> = [1].into_iter().collect();
        assert_eq!(apply_renames(&store, store.current(), &m, w, &selected).unwrap(), 1);
        let lines = store.read(store.current()).unwrap();
        assert_eq!(
            lines,
            vec![format!("START|{}|y STOP|1", w.start + 10), format!("STOP|{}", w.start + 20)]
        );
    }

    #[test]
    fn test_apply_keeps_other_lines_byte_identical() {
        let w = week();
        let content = format!(
            "# note\r\nSTART|{}|coding\r\nSTOP|{}",
            w.start + 10,
            w.start + 20
        );
        let (_dir, store) = setup(&content);
        let m = RenameMatcher::new("coding", "dev", MatchMode::Search).unwrap();
        let selected: HashSet<usize> = [2].into_iter().collect();
        apply_renames(&store, store.current(), &m, w, &selected).unwrap();
        assert_eq!(
            fs::read_to_string(store.current()).unwrap(),
            format!("# note\r\nSTART|{}|dev\r\nSTOP|{}", w.start + 10, w.start + 20)
        );
    }
}
