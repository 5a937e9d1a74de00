use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Render Markdown for roles that ask for it
    pub prettify_markdown: bool,
    /// Color of plain completions, e.g. `magenta`, `dark_cyan`
    pub color: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            prettify_markdown: true,
            color: "magenta".to_string(),
        }
    }
}
