// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! File-backed log storage.
//!
//! The current log lives at a configured path (default
//! `$HOME/Documents/timesheet.log`); rotated archives sit next to it as
//! `<stem>.<stamp>`. Appends go straight to the file; every rewrite goes through
//! a temp file in the same directory followed by a rename, so a crash leaves
//! either the old or the new content, never a mix.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tempfile::NamedTempFile;

use crate::error::{Result, TsError};
use crate::event::{parse_events, Event};
use crate::timefmt::local_date;

/// Handle on the current log and the archives rotated out of it.
#[derive(Clone, Debug)]
pub struct LogStore {
    current: PathBuf,
}

impl LogStore {
    pub fn new(current: impl Into<PathBuf>) -> Self {
        LogStore {
            current: current.into(),
        }
    }

    /// Path of the current log.
    pub fn current(&self) -> &Path {
        &self.current
    }

    pub fn is_current(&self, path: &Path) -> bool {
        path == self.current
    }

    fn dir(&self) -> &Path {
        match self.current.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn stem(&self) -> &str {
        self.current
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("timesheet")
    }

    /// Archive path for a rotation stamp: the current log's name with the stamp
    /// as its extension.
    pub fn archive_path(&self, stamp: &str) -> PathBuf {
        self.dir().join(format!("{}.{}", self.stem(), stamp))
    }

    /// All rotated archives next to the current log (`<stem>.<digits...>`), sorted by name.
    pub fn archives(&self) -> Vec<PathBuf> {
        let prefix = format!("{}.", self.stem());
        let mut found = Vec::new();
        let entries = match fs::read_dir(self.dir()) {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(dir = %self.dir().display(), error = %e, "cannot list archives");
                return found;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path == self.current {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let is_archive = name
                .strip_prefix(&prefix)
                .and_then(|key| key.bytes().next())
                .map(|b| b.is_ascii_digit())
                .unwrap_or(false);
            if is_archive && path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        found
    }

    /// Whole content of a log, byte for byte. Fails with [`TsError::NotFound`]
    /// when the file is absent.
    pub fn read_raw(&self, path: &Path) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TsError::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(TsError::io(format!("read {}", path.display()), e)),
        }
    }

    /// Lines of a log without their line endings.
    pub fn read(&self, path: &Path) -> Result<Vec<String>> {
        Ok(self.read_raw(path)?.lines().map(str::to_string).collect())
    }

    /// Like [`read`](Self::read) but an absent file is an empty log.
    pub fn read_or_empty(&self, path: &Path) -> Result<Vec<String>> {
        match self.read(path) {
            Err(TsError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Parsed events of a log, in file order.
    pub fn read_events(&self, path: &Path) -> Result<Vec<Event>> {
        Ok(parse_events(&self.read(path)?))
    }

    /// Appends one line per event, creating the file (and its directory) if needed.
    /// A last line left without its newline is terminated first so it stays
    /// a line of its own.
    pub fn append(&self, path: &Path, events: &[Event]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| TsError::io(format!("create {}", parent.display()), e))?;
        }
        let mut f = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| TsError::io(format!("open {}", path.display()), e))?;
        let mut buf = String::new();
        if lacks_final_newline(&mut f)
            .map_err(|e| TsError::io(format!("read {}", path.display()), e))?
        {
            buf.push('\n');
        }
        for ev in events {
            buf.push_str(&ev.to_string());
            buf.push('\n');
        }
        f.write_all(buf.as_bytes())
            .map_err(|e| TsError::io(format!("append to {}", path.display()), e))?;
        tracing::debug!(path = %path.display(), count = events.len(), "appended events");
        Ok(())
    }

    /// Drops the last `drop_count` non-blank lines and writes `events` in their
    /// place, atomically. Trailing blank lines are discarded; the lines kept
    /// are written back byte for byte.
    pub fn replace_tail(&self, path: &Path, drop_count: usize, events: &[Event]) -> Result<()> {
        let content = self.read_raw(path)?;
        let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
        while lines.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
            lines.pop();
        }
        let keep = lines.len().saturating_sub(drop_count);
        lines.truncate(keep);
        let mut out = lines.concat();
        terminate_last_line(&mut out);
        for ev in events {
            out.push_str(&ev.to_string());
            out.push('\n');
        }
        self.rewrite(path, &out)?;
        tracing::debug!(path = %path.display(), dropped = drop_count, written = events.len(), "replaced log tail");
        Ok(())
    }

    /// Atomically replaces the whole file with `content`.
    pub fn rewrite(&self, path: &Path, content: &str) -> Result<()> {
        write_atomic(path, content.as_bytes())
    }

    /// Maps a user selector onto exactly one log file.
    ///
    /// - `None`, empty or `"log"` → the current log.
    /// - An existing path → that path.
    /// - Otherwise the selector is matched against each candidate's key (the
    ///   text after the last `.`): equal, either one a substring of the other, or
    ///   equal to the selector normalized to `YYMMDD` (`MM/DD` in `today`'s year,
    ///   the last six digits of `YYYYMMDD`, or six digits as given).
    ///
    /// When no name matches and the selector is a date, the log whose entries
    /// span that date is chosen instead.
    pub fn resolve(&self, selector: Option<&str>, today: NaiveDate) -> Result<PathBuf> {
        let selector = match selector {
            None => return Ok(self.current.clone()),
            Some(s) if s.is_empty() || s == "log" => return Ok(self.current.clone()),
            Some(s) => s,
        };
        if Path::new(selector).exists() {
            return Ok(PathBuf::from(selector));
        }
        let mut candidates = Vec::new();
        if self.current.exists() {
            candidates.push(self.current.clone());
        }
        candidates.extend(self.archives());

        let norm = normalize_date_selector(selector, today);
        let matches: Vec<PathBuf> = candidates
            .iter()
            .filter(|path| {
                let key = archive_key(path);
                selector == key
                    || key.contains(selector)
                    || selector.contains(key)
                    || norm.as_deref() == Some(key)
            })
            .cloned()
            .collect();
        match matches.len() {
            1 => return Ok(matches.into_iter().next().unwrap_or_default()),
            0 => {}
            _ => {
                return Err(TsError::Ambiguous {
                    selector: selector.to_string(),
                    candidates: matches,
                })
            }
        }
        let wanted = norm.as_deref().and_then(parse_stamp_date);
        if let Some(want) = wanted {
            if let Some(path) = self.resolve_by_content(&candidates, want) {
                tracing::debug!(selector, path = %path.display(), "resolved selector by entry dates");
                return Ok(path);
            }
        }
        Err(TsError::NoMatch(selector.to_string()))
    }

    /// Picks the candidate whose entries span `want` (this year first, then
    /// next, then previous), else the earliest archive stamped on or after it.
    fn resolve_by_content(&self, candidates: &[PathBuf], want: NaiveDate) -> Option<PathBuf> {
        let (mm, dd) = (want.month(), want.day());
        let dates_to_try: Vec<NaiveDate> = [
            Some(want),
            NaiveDate::from_ymd_opt(want.year() + 1, mm, dd),
            NaiveDate::from_ymd_opt(want.year() - 1, mm, dd),
        ]
        .into_iter()
        .flatten()
        .collect();
        let mut containing: Vec<(usize, NaiveDate, &PathBuf)> = Vec::new();
        for path in candidates {
            let Some((min_d, max_d)) = self.date_range(path) else {
                continue;
            };
            if let Some(priority) = dates_to_try.iter().position(|d| *d >= min_d && *d <= max_d) {
                containing.push((priority, max_d, path));
            }
        }
        if let Some((_, _, path)) = containing.into_iter().min_by_key(|(p, max_d, _)| (*p, *max_d)) {
            return Some(path.clone());
        }
        candidates
            .iter()
            .filter_map(|path| {
                let stamp_date = parse_stamp_date(archive_key(path))?;
                (stamp_date >= want).then_some((stamp_date, path))
            })
            .min_by_key(|(d, _)| *d)
            .map(|(_, path)| path.clone())
    }

    /// Local dates of the earliest and latest entries in a log.
    fn date_range(&self, path: &Path) -> Option<(NaiveDate, NaiveDate)> {
        let events = match self.read_events(path) {
            Ok(ev) => ev,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable log");
                return None;
            }
        };
        let min = events.iter().map(Event::epoch).min()?;
        let max = events.iter().map(Event::epoch).max()?;
        Some((local_date(min)?, local_date(max)?))
    }
}

/// True when the file is non-empty and its last byte is not `\n`.
fn lacks_final_newline(f: &mut fs::File) -> std::io::Result<bool> {
    if f.metadata()?.len() == 0 {
        return Ok(false);
    }
    f.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    f.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Adds a `\n` to non-empty text that does not already end with one.
pub(crate) fn terminate_last_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

/// Writes `content` to a temp file beside `path`, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| TsError::io(format!("create temp file in {}", parent.display()), e))?;
    temp.write_all(content)
        .map_err(|e| TsError::io("write temp log", e))?;
    temp.flush().map_err(|e| TsError::io("flush temp log", e))?;
    temp.persist(path)
        .map_err(|e| TsError::io(format!("replace {}", path.display()), e.error))?;
    Ok(())
}

/// Text after the last `.` of the file name (`log` for the current log).
fn archive_key(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("log")
}

/// `YYMMDD` form of a date-like selector: `MM/DD` (in `today`'s year),
/// `YYYYMMDD`, or six digits taken as already normalized.
fn normalize_date_selector(selector: &str, today: NaiveDate) -> Option<String> {
    let all_digits = selector.chars().all(|c| c.is_ascii_digit());
    if all_digits && selector.len() == 8 {
        return Some(selector[2..].to_string());
    }
    if all_digits && selector.len() == 6 {
        return Some(selector.to_string());
    }
    let (m, d) = selector.split_once('/')?;
    let (m, d) = (m.parse::<u32>().ok()?, d.parse::<u32>().ok()?);
    Some(format!("{:02}{:02}{:02}", today.year() % 100, m, d))
}

/// Date encoded in the first six digits of a `YYMMDD[HHMM]` stamp.
fn parse_stamp_date(stamp: &str) -> Option<NaiveDate> {
    if stamp.len() < 6 || !stamp.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let yy: i32 = stamp[0..2].parse().ok()?;
    let mm: u32 = stamp[2..4].parse().ok()?;
    let dd: u32 = stamp[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timefmt::start_of_day;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 25).unwrap()
    }

    fn setup() -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("timesheet.log"));
        (dir, store)
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let (_dir, store) = setup();
        let err = store.read(store.current()).unwrap_err();
        assert!(matches!(err, TsError::NotFound(_)));
        assert!(store.read_or_empty(store.current()).unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_file_and_parent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("Documents").join("timesheet.log"));
        store.append(store.current(), &[Event::start(100, "a")]).unwrap();
        store.append(store.current(), &[Event::stop(200)]).unwrap();
        let content = fs::read_to_string(store.current()).unwrap();
        assert_eq!(content, "START|100|a\nSTOP|200\n");
    }

    #[test]
    fn test_append_after_unterminated_last_line() {
        let (_dir, store) = setup();
        fs::write(store.current(), "START|1000|a\nSTOP|2000").unwrap();
        store.append(store.current(), &[Event::start(3000, "b")]).unwrap();
        assert_eq!(
            fs::read_to_string(store.current()).unwrap(),
            "START|1000|a\nSTOP|2000\nSTART|3000|b\n"
        );
        assert_eq!(
            store.read_events(store.current()).unwrap(),
            vec![Event::start(1000, "a"), Event::stop(2000), Event::start(3000, "b")]
        );
    }

    #[test]
    fn test_replace_tail_drops_and_appends() {
        let (_dir, store) = setup();
        fs::write(store.current(), "START|100|a\nSTOP|200\n\n").unwrap();
        store
            .replace_tail(store.current(), 1, &[Event::start(201, "b"), Event::stop(300)])
            .unwrap();
        let content = fs::read_to_string(store.current()).unwrap();
        assert_eq!(content, "START|100|a\nSTART|201|b\nSTOP|300\n");
    }

    #[test]
    fn test_replace_tail_keeps_unknown_lines_above() {
        let (_dir, store) = setup();
        fs::write(store.current(), "# header\nSTART|100|a\n").unwrap();
        store.replace_tail(store.current(), 1, &[Event::start(90, "b")]).unwrap();
        let content = fs::read_to_string(store.current()).unwrap();
        assert_eq!(content, "# header\nSTART|90|b\n");
    }

    #[test]
    fn test_replace_tail_keeps_crlf_lines_byte_identical() {
        let (_dir, store) = setup();
        fs::write(store.current(), "# note\r\nSTART|100|a\r\nSTOP|200\r\n").unwrap();
        store.replace_tail(store.current(), 1, &[Event::stop(250)]).unwrap();
        assert_eq!(
            fs::read_to_string(store.current()).unwrap(),
            "# note\r\nSTART|100|a\r\nSTOP|250\n"
        );
    }

    #[test]
    fn test_replace_tail_terminates_kept_unterminated_line() {
        let (_dir, store) = setup();
        fs::write(store.current(), "START|100|a").unwrap();
        store.replace_tail(store.current(), 0, &[Event::stop(200)]).unwrap();
        assert_eq!(fs::read_to_string(store.current()).unwrap(), "START|100|a\nSTOP|200\n");
    }

    #[test]
    fn test_failed_atomic_write_keeps_target_and_leaves_no_temp() {
        let (dir, _store) = setup();
        let target = dir.path().join("busy");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "kept").unwrap();
        assert!(matches!(
            write_atomic(&target, b"START|1|x\n"),
            Err(TsError::Io { .. })
        ));
        assert_eq!(fs::read_to_string(target.join("keep")).unwrap(), "kept");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_replace_tail_missing_file() {
        let (_dir, store) = setup();
        let err = store.replace_tail(store.current(), 1, &[]).unwrap_err();
        assert!(matches!(err, TsError::NotFound(_)));
    }

    #[test]
    fn test_archives_lists_only_stamped_siblings() {
        let (dir, store) = setup();
        fs::File::create(store.current()).unwrap();
        fs::File::create(dir.path().join("timesheet.260220")).unwrap();
        fs::File::create(dir.path().join("timesheet.2602271730")).unwrap();
        fs::File::create(dir.path().join("timesheet.bak")).unwrap();
        fs::File::create(dir.path().join("other.260220")).unwrap();
        let names: Vec<String> = store
            .archives()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["timesheet.260220", "timesheet.2602271730"]);
    }

    #[test]
    fn test_resolve_none_and_log_return_current() {
        let (_dir, store) = setup();
        assert_eq!(store.resolve(None, today()).unwrap(), store.current());
        assert_eq!(store.resolve(Some(""), today()).unwrap(), store.current());
        assert_eq!(store.resolve(Some("log"), today()).unwrap(), store.current());
    }

    #[test]
    fn test_resolve_existing_path_verbatim() {
        let (dir, store) = setup();
        let other = dir.path().join("elsewhere.txt");
        fs::File::create(&other).unwrap();
        let sel = other.to_string_lossy().to_string();
        assert_eq!(store.resolve(Some(&sel), today()).unwrap(), other);
    }

    #[test]
    fn test_resolve_exact_and_substring_extension() {
        let (dir, store) = setup();
        fs::File::create(store.current()).unwrap();
        let rotated = dir.path().join("timesheet.260220");
        fs::File::create(&rotated).unwrap();
        assert_eq!(store.resolve(Some("260220"), today()).unwrap(), rotated);
        assert_eq!(store.resolve(Some("0220"), today()).unwrap(), rotated);
        assert_eq!(store.resolve(Some("20260220"), today()).unwrap(), rotated);
        assert_eq!(store.resolve(Some("2/20"), today()).unwrap(), rotated);
    }

    #[test]
    fn test_resolve_ambiguous() {
        let (dir, store) = setup();
        fs::File::create(dir.path().join("timesheet.260220")).unwrap();
        fs::File::create(dir.path().join("timesheet.260227")).unwrap();
        let err = store.resolve(Some("2602"), today()).unwrap_err();
        match err {
            TsError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_no_match() {
        let (_dir, store) = setup();
        fs::File::create(store.current()).unwrap();
        let err = store.resolve(Some("999999"), today()).unwrap_err();
        assert!(matches!(err, TsError::NoMatch(_)));
        assert!(err.to_string().contains("no timesheet matches"));
    }

    #[test]
    fn test_resolve_by_entry_dates() {
        let (dir, store) = setup();
        let feb19 = start_of_day(NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()) + 9 * 3600;
        let feb21 = start_of_day(NaiveDate::from_ymd_opt(2026, 2, 21).unwrap()) + 9 * 3600;
        let rotated = dir.path().join("timesheet.260221");
        fs::write(&rotated, format!("START|{}|a\nSTOP|{}\n", feb19, feb21)).unwrap();
        assert_eq!(store.resolve(Some("2/19"), today()).unwrap(), rotated);
    }

    #[test]
    fn test_resolve_by_stamp_on_or_after() {
        let (dir, store) = setup();
        fs::File::create(dir.path().join("timesheet.260214")).unwrap();
        let later = dir.path().join("timesheet.260221");
        fs::File::create(&later).unwrap();
        assert_eq!(store.resolve(Some("2/18"), today()).unwrap(), later);
    }

    #[test]
    fn test_normalize_date_selector() {
        assert_eq!(normalize_date_selector("2/5", today()).as_deref(), Some("260205"));
        assert_eq!(normalize_date_selector("20250105", today()).as_deref(), Some("250105"));
        assert_eq!(normalize_date_selector("250105", today()).as_deref(), Some("250105"));
        assert_eq!(normalize_date_selector("feb", today()), None);
    }
}
