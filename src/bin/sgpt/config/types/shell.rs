use serde::{Deserialize, Serialize};

use sgpt::platform::AUTO;

/// How generated shell commands are described and run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Operating system named in role templates, `auto` to detect
    pub os_name: String,
    /// Shell named in role templates, `auto` to detect
    pub shell_name: String,
    /// Offer execute/modify/describe after a `--shell` completion
    pub interaction: bool,
    /// Pressing Enter at the prompt executes instead of aborting
    pub default_execute: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            os_name: AUTO.to_string(),
            shell_name: AUTO.to_string(),
            interaction: true,
            default_execute: false,
        }
    }
}
