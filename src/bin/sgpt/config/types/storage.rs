use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::paths::{expand_home, ConfigPaths};

/// Directory overrides; unset entries use the defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub chat_dir: Option<String>,
    pub cache_dir: Option<String>,
    pub role_dir: Option<String>,
    pub functions_dir: Option<String>,
}

impl StorageConfig {
    pub fn chat_dir(&self) -> PathBuf {
        resolve(&self.chat_dir, || env::temp_dir().join("chat_cache"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        resolve(&self.cache_dir, || env::temp_dir().join("cache"))
    }

    pub fn role_dir(&self, paths: &ConfigPaths) -> PathBuf {
        resolve(&self.role_dir, || paths.roles_dir())
    }

    pub fn functions_dir(&self, paths: &ConfigPaths) -> PathBuf {
        resolve(&self.functions_dir, || paths.functions_dir())
    }
}

fn resolve(value: &Option<String>, default: impl FnOnce() -> PathBuf) -> PathBuf {
    match value.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => expand_home(raw),
        _ => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_dirs_use_defaults() {
        let storage = StorageConfig::default();
        assert_eq!(storage.chat_dir(), env::temp_dir().join("chat_cache"));
        let paths = ConfigPaths::resolve(Some(PathBuf::from("/opt/sgpt/config.toml"))).unwrap();
        assert_eq!(
            storage.functions_dir(&paths),
            PathBuf::from("/opt/sgpt/functions")
        );
    }

    #[test]
    fn blank_override_is_ignored() {
        let storage = StorageConfig {
            cache_dir: Some("  ".to_string()),
            chat_dir: Some("/var/chats".to_string()),
            ..StorageConfig::default()
        };
        assert_eq!(storage.cache_dir(), env::temp_dir().join("cache"));
        assert_eq!(storage.chat_dir(), PathBuf::from("/var/chats"));
    }
}
