mod api;
mod chat;
mod logging;
mod shell;
mod storage;
mod ui;

use serde::{Deserialize, Serialize};

pub use api::ApiConfig;
pub use chat::{CacheConfig, ChatConfig, FunctionsConfig};
pub use logging::LoggingConfig;
pub use shell::ShellConfig;
pub use storage::StorageConfig;
pub use ui::UiConfig;

use super::error::ConfigError;

const DEFAULT_CACHE_LENGTH: usize = 100;
const DEFAULT_LOG_ROTATE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_ROTATE_KEEP: usize = 5;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub shell: ShellConfig,
    pub ui: UiConfig,
    pub functions: FunctionsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "api.base_url",
                message: format!("\"{base_url}\" is not an http(s) URL"),
            });
        }
        if self.api.default_model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "api.default_model",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = AppConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "api.base_url",
                ..
            })
        ));
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.chat.cache_length, DEFAULT_CACHE_LENGTH);
        assert_eq!(parsed.shell.shell_name, "auto");
        assert_eq!(parsed.logging.rotate_keep, DEFAULT_LOG_ROTATE_KEEP);
    }
}
