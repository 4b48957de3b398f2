// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Runtime configuration: defaults, then an optional TOML file, then CLI flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TsError};
use crate::rename::MatchMode;
use crate::rotate::StampFormat;
use crate::timeoff::DEFAULT_DAILY_HOURS;

/// Raw config as parsed from the TOML file. Missing keys fall through to
/// defaults; unknown keys are ignored.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    log_path: Option<PathBuf>,
    daily_target_hours: Option<f64>,
    archive_stamp: Option<StampFormat>,
    rename_match: Option<MatchMode>,
}

/// Effective configuration handed to every command.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The current log; archives live next to it.
    pub log_path: PathBuf,
    pub daily_target_hours: f64,
    pub archive_stamp: StampFormat,
    pub rename_match: MatchMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            daily_target_hours: DEFAULT_DAILY_HOURS,
            archive_stamp: StampFormat::default(),
            rename_match: MatchMode::default(),
        }
    }
}

/// `~/Documents/timesheet.log`
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("timesheet.log")
}

/// `~/.config/ts/config.toml` (platform config dir).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ts").join("config.toml"))
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| TsError::io(format!("read config {}", path.display()), e))?;
    toml::from_str::<FileConfig>(&contents).map_err(|e| TsError::Config {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

impl Config {
    /// Builds the effective configuration.
    ///
    /// An explicit `config_path` must exist and parse. The default config file
    /// is optional, and a broken one is only warned about.
    pub fn load(config_path: Option<&Path>, log_override: Option<PathBuf>) -> Result<Config> {
        let mut config = Config::default();

        let file_cfg = match config_path {
            Some(path) => Some(load_file_config(path)?),
            None => match default_config_path() {
                Some(path) if path.exists() => match load_file_config(&path) {
                    Ok(cfg) => Some(cfg),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring config file");
                        None
                    }
                },
                _ => None,
            },
        };

        if let Some(file_cfg) = file_cfg {
            config.apply(file_cfg);
        }
        if let Some(path) = log_override {
            config.log_path = path;
        }
        tracing::debug!(log = %config.log_path.display(), "configuration loaded");
        Ok(config)
    }

    fn apply(&mut self, file_cfg: FileConfig) {
        if let Some(p) = file_cfg.log_path {
            self.log_path = expand_home(p);
        }
        if let Some(h) = file_cfg.daily_target_hours {
            if h > 0.0 && h.is_finite() {
                self.daily_target_hours = h;
            } else {
                tracing::warn!(value = h, "daily_target_hours must be positive; using default");
            }
        }
        if let Some(s) = file_cfg.archive_stamp {
            self.archive_stamp = s;
        }
        if let Some(m) = file_cfg.rename_match {
            self.rename_match = m;
        }
    }
}

/// A leading `~/` in a configured path means the home directory.
fn expand_home(path: PathBuf) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(toml_str: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(toml_str.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.daily_target_hours, 8.0);
        assert_eq!(config.archive_stamp, StampFormat::Date);
        assert_eq!(config.rename_match, MatchMode::Search);
        assert!(config.log_path.ends_with("Documents/timesheet.log"));
    }

    #[test]
    fn test_file_values_applied() {
        let f = write_config(
            "log_path = \"/tmp/x/ts.log\"\ndaily_target_hours = 7.5\narchive_stamp = \"datetime\"\nrename_match = \"whole\"\n",
        );
        let config = Config::load(Some(f.path()), None).unwrap();
        assert_eq!(config.log_path, PathBuf::from("/tmp/x/ts.log"));
        assert_eq!(config.daily_target_hours, 7.5);
        assert_eq!(config.archive_stamp, StampFormat::DateTime);
        assert_eq!(config.rename_match, MatchMode::Whole);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let f = write_config("daily_target_hours = 6.0\nunknown_key = 1\n");
        let config = Config::load(Some(f.path()), None).unwrap();
        assert_eq!(config.daily_target_hours, 6.0);
        assert_eq!(config.archive_stamp, StampFormat::Date);
    }

    #[test]
    fn test_cli_log_overrides_file() {
        let f = write_config("log_path = \"/tmp/from-file.log\"\n");
        let config = Config::load(Some(f.path()), Some(PathBuf::from("/tmp/cli.log"))).unwrap();
        assert_eq!(config.log_path, PathBuf::from("/tmp/cli.log"));
    }

    #[test]
    fn test_malformed_explicit_file_is_error() {
        let f = write_config("daily_target_hours = \"eight\"\n");
        let err = Config::load(Some(f.path()), None).unwrap_err();
        assert!(matches!(err, TsError::Config { .. }));
    }

    #[test]
    fn test_unknown_stamp_is_error() {
        let f = write_config("archive_stamp = \"weekly\"\n");
        assert!(matches!(
            Config::load(Some(f.path()), None),
            Err(TsError::Config { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml")), None).unwrap_err();
        assert!(matches!(err, TsError::Io { .. }));
    }

    #[test]
    fn test_non_positive_target_ignored() {
        let f = write_config("daily_target_hours = 0.0\n");
        let config = Config::load(Some(f.path()), None).unwrap();
        assert_eq!(config.daily_target_hours, 8.0);
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(PathBuf::from("~/a.log")), home.join("a.log"));
        }
        assert_eq!(expand_home(PathBuf::from("/abs.log")), PathBuf::from("/abs.log"));
    }
}
