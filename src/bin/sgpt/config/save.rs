use std::io::Write;

use tempfile::NamedTempFile;

use super::error::ConfigError;
use super::load::{ensure_dirs, secure_file_permissions};
use super::paths::ConfigPaths;
use super::types::AppConfig;

/// Replaces the config file in one rename so a reader never sees half of it.
pub fn save_config(config: &AppConfig, paths: &ConfigPaths) -> Result<(), ConfigError> {
    ensure_dirs(paths)?;
    let contents = toml::to_string_pretty(config)?;
    let mut file = NamedTempFile::new_in(&paths.config_dir)?;
    file.write_all(contents.as_bytes())?;
    file.persist(&paths.config_file).map_err(|err| err.error)?;
    secure_file_permissions(&paths.config_file)?;
    Ok(())
}
