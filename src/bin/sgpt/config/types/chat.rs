use serde::{Deserialize, Serialize};

use super::DEFAULT_CACHE_LENGTH;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages kept per session besides the system message
    pub cache_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            cache_length: DEFAULT_CACHE_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub length: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            length: DEFAULT_CACHE_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FunctionsConfig {
    pub enabled: bool,
}
