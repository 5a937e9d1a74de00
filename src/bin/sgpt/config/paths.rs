use std::path::PathBuf;

use super::error::ConfigError;

const APP_DIR: &str = "shell_gpt";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl ConfigPaths {
    pub fn resolve(config_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = default_data_dir()?;
        let (config_dir, config_file) = match config_override {
            Some(path) => {
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                (dir, path)
            }
            None => {
                let dir = default_config_dir()?;
                let file = dir.join("config.toml");
                (dir, file)
            }
        };
        Ok(Self {
            config_file,
            config_dir,
            logs_dir: data_dir.join("logs"),
            data_dir,
        })
    }

    pub fn roles_dir(&self) -> PathBuf {
        self.config_dir.join("roles")
    }

    pub fn functions_dir(&self) -> PathBuf {
        self.config_dir.join("functions")
    }
}

fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".config").join(APP_DIR))
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .ok_or(ConfigError::MissingHome)?;
    Ok(base.join(APP_DIR))
}

/// Expands a leading `~/` against the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_keeps_its_directory() {
        let paths = ConfigPaths::resolve(Some(PathBuf::from("/etc/sgpt/custom.toml"))).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("/etc/sgpt"));
        assert_eq!(paths.roles_dir(), PathBuf::from("/etc/sgpt/roles"));
    }

    #[test]
    fn bare_override_lives_in_working_directory() {
        let paths = ConfigPaths::resolve(Some(PathBuf::from("sgpt.toml"))).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("."));
    }

    #[test]
    fn expands_tilde_only_at_start() {
        assert_eq!(expand_home("/tmp/chats"), PathBuf::from("/tmp/chats"));
        assert_eq!(expand_home("a/~/b"), PathBuf::from("a/~/b"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/chats"), home.join("chats"));
        }
    }
}
