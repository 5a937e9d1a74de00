//! Named instruction templates and their on-disk store.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SgptError;
use crate::persist::{json_files_by_mtime, json_path, read_json, write_json_atomic};
use crate::platform::PlatformContext;

const DEFAULT_ROLE: &str = "You are programming and system administration assistant.
You are managing {os} operating system with {shell} shell.
Provide short responses in about 100 words, unless you are specifically asked for more details.
If you need to store any data, assume it will be stored in the conversation.
APPLY MARKDOWN formatting when possible.";

const SHELL_ROLE: &str = "Provide only {shell} commands for {os} without any description.
If there is a lack of details, provide most logical solution.
Ensure the output is a valid shell command.
If multiple steps required try to combine them together using &&.
Provide only plain text without Markdown formatting.
Do not provide markdown formatting such as ```.";

const DESCRIBE_SHELL_ROLE: &str = "Provide a terse, single sentence description of the given shell command.
Describe each argument and option of the command.
Provide short responses in about 80 words.
APPLY MARKDOWN formatting when possible.";

const CODE_ROLE: &str = "Provide only code as output without any description.
Provide only code in plain text format without Markdown formatting.
Do not include symbols such as ``` or ```python.
If there is a lack of details, provide most logical solution.
You are not allowed to ask for more details.
For example if the prompt is \"Hello world Python\", you should return \"print('Hello world')\".";

/// Marker that turns on Markdown rendering for a role's output.
pub const MARKDOWN_MARKER: &str = "APPLY MARKDOWN";

const ROLE_PREFIX: &str = "You are ";

/// Which role is active, as far as dispatch is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Default,
    ShellCommand,
    DescribeShell,
    Code,
    Custom(String),
}

impl RoleKind {
    pub const BUILTIN: [RoleKind; 4] = [
        RoleKind::Default,
        RoleKind::ShellCommand,
        RoleKind::DescribeShell,
        RoleKind::Code,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            "ShellGPT" => RoleKind::Default,
            "Shell Command Generator" => RoleKind::ShellCommand,
            "Shell Command Descriptor" => RoleKind::DescribeShell,
            "Code Generator" => RoleKind::Code,
            other => RoleKind::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RoleKind::Default => "ShellGPT",
            RoleKind::ShellCommand => "Shell Command Generator",
            RoleKind::DescribeShell => "Shell Command Descriptor",
            RoleKind::Code => "Code Generator",
            RoleKind::Custom(name) => name,
        }
    }

    fn template(&self) -> Option<&'static str> {
        match self {
            RoleKind::Default => Some(DEFAULT_ROLE),
            RoleKind::ShellCommand => Some(SHELL_ROLE),
            RoleKind::DescribeShell => Some(DESCRIBE_SHELL_ROLE),
            RoleKind::Code => Some(CODE_ROLE),
            RoleKind::Custom(_) => None,
        }
    }
}

/// A named instruction template prefixed to model requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    /// Full instruction text, already interpolated
    pub role: String,
}

impl Role {
    /// Builds a role from a description, filling `{os}` and `{shell}` when a
    /// platform context is given.
    pub fn new(name: impl Into<String>, body: &str, platform: Option<&PlatformContext>) -> Self {
        let name = name.into();
        let body = match platform {
            Some(ctx) => body.replace("{os}", &ctx.os).replace("{shell}", &ctx.shell),
            None => body.to_string(),
        };
        let role = format!("{ROLE_PREFIX}{name}\n{body}");
        Self { name, role }
    }

    pub fn kind(&self) -> RoleKind {
        RoleKind::from_name(&self.name)
    }

    pub fn is_shell(&self) -> bool {
        self.kind() == RoleKind::ShellCommand
    }

    pub fn applies_markdown(&self) -> bool {
        self.role.contains(MARKDOWN_MARKER)
    }

    /// Name recorded in the first line of a system message written by [`Role::new`].
    pub fn name_in(system_message: &str) -> Option<&str> {
        let first = system_message.lines().next()?;
        first
            .find(ROLE_PREFIX)
            .map(|idx| first[idx + ROLE_PREFIX.len()..].trim())
    }
}

/// Flags that pick the active role.
#[derive(Debug, Clone, Default)]
pub struct RoleSelection {
    pub role: Option<String>,
    pub shell: bool,
    pub describe_shell: bool,
    pub code: bool,
}

impl RoleSelection {
    pub fn kind(&self) -> Result<RoleKind, SgptError> {
        let modes = [self.shell, self.describe_shell, self.code]
            .iter()
            .filter(|set| **set)
            .count();
        if modes > 1 {
            return Err(SgptError::Usage(
                "Only one of --shell, --describe-shell, and --code options can be used at a time."
                    .to_string(),
            ));
        }
        if let Some(name) = &self.role {
            return Ok(RoleKind::from_name(name));
        }
        Ok(if self.shell {
            RoleKind::ShellCommand
        } else if self.describe_shell {
            RoleKind::DescribeShell
        } else if self.code {
            RoleKind::Code
        } else {
            RoleKind::Default
        })
    }
}

/// One JSON record per role name.
#[derive(Debug, Clone)]
pub struct RoleStore {
    dir: PathBuf,
}

impl RoleStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the built-in roles that are not stored yet. Existing records,
    /// including user edits, are left alone.
    pub fn initialize_defaults(&self, platform: &PlatformContext) -> Result<(), SgptError> {
        fs::create_dir_all(&self.dir)?;
        for kind in RoleKind::BUILTIN {
            if self.exists(kind.name()) {
                continue;
            }
            let template = kind.template().unwrap_or_default();
            let role = Role::new(kind.name(), template, Some(platform));
            debug!("creating default role {}", role.name);
            self.save(&role, false)?;
        }
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    pub fn get(&self, name: &str) -> Result<Role, SgptError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(SgptError::RoleNotFound(name.to_string()));
        }
        read_json(&path)
    }

    pub fn get_kind(&self, kind: &RoleKind) -> Result<Role, SgptError> {
        self.get(kind.name())
    }

    /// Stores `role`. Replacing an existing record requires `overwrite`, which
    /// the caller sets only after the user confirmed.
    pub fn save(&self, role: &Role, overwrite: bool) -> Result<(), SgptError> {
        if !overwrite && self.exists(&role.name) {
            return Err(SgptError::RoleExists(role.name.clone()));
        }
        write_json_atomic(&self.path_for(&role.name), role)
    }

    /// Role files, oldest modification first.
    pub fn list(&self) -> Result<Vec<PathBuf>, SgptError> {
        json_files_by_mtime(&self.dir)
    }

    pub fn delete(&self, name: &str) -> Result<(), SgptError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(SgptError::RoleNotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Role Selector: maps CLI flags or an explicit name to a stored role.
    pub fn resolve(&self, selection: &RoleSelection) -> Result<Role, SgptError> {
        let kind = selection.kind()?;
        self.get_kind(&kind)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        json_path(&self.dir, name)
    }
}
