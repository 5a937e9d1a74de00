use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::paths::expand_home;

use super::{DEFAULT_LOG_ROTATE_KEEP, DEFAULT_LOG_ROTATE_SIZE};

const DEFAULT_LOG_FILE: &str = "sgpt.log";

/// `[logging]` section. Logs only ever go to a file so they never mix with
/// completions on stdout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// flexi_logger spec such as `info` or `warn,sgpt=debug`
    pub level: String,
    /// Log file; `~/` is expanded. Unset means `<data>/logs/sgpt.log`.
    pub path: Option<String>,
    /// Bytes written before the file is rotated
    pub rotate_size: u64,
    /// Rotated files kept next to the live one
    pub rotate_keep: usize,
}

impl LoggingConfig {
    /// Directory and file stem of the live log file.
    pub fn file_spec(&self, logs_dir: &Path) -> (PathBuf, String) {
        let path = match self.path.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => expand_home(raw),
            _ => logs_dir.join(DEFAULT_LOG_FILE),
        };
        let directory = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| logs_dir.to_path_buf());
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("sgpt")
            .to_string();
        (directory, stem)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
            rotate_size: DEFAULT_LOG_ROTATE_SIZE,
            rotate_keep: DEFAULT_LOG_ROTATE_KEEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_lives_in_logs_dir() {
        let (dir, stem) = LoggingConfig::default().file_spec(Path::new("/data/logs"));
        assert_eq!(dir, PathBuf::from("/data/logs"));
        assert_eq!(stem, "sgpt");
    }

    #[test]
    fn bare_file_name_stays_in_logs_dir() {
        let config = LoggingConfig {
            path: Some("assistant.log".to_string()),
            ..LoggingConfig::default()
        };
        let (dir, stem) = config.file_spec(Path::new("/data/logs"));
        assert_eq!(dir, PathBuf::from("/data/logs"));
        assert_eq!(stem, "assistant");
    }

    #[test]
    fn explicit_path_is_split() {
        let config: LoggingConfig =
            toml::from_str("path = \"/var/log/sgpt/run.log\"\nlevel = \"debug\"").unwrap();
        assert_eq!(
            config.file_spec(Path::new("/data/logs")),
            (PathBuf::from("/var/log/sgpt"), "run".to_string())
        );
        assert_eq!(config.rotate_keep, DEFAULT_LOG_ROTATE_KEEP);
    }
}
