use std::env;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use sgpt::backends::openai::DEFAULT_BASE_URL;

/// Remote API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Stored key; the environment variable named by `api_key_env` wins
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub default_model: String,
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            default_model: "gpt-4o".to_string(),
            request_timeout_seconds: 60,
        }
    }
}

impl ApiConfig {
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
            .map(SecretString::new)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.request_timeout_seconds > 0)
            .then(|| Duration::from_secs(self.request_timeout_seconds))
    }
}
