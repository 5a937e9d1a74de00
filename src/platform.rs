//! Host detection and shell invocation.

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, warn};

use crate::error::SgptError;

/// Value of the `os_name` / `shell_name` settings that asks for detection.
pub const AUTO: &str = "auto";

const OS_RELEASE: &str = "/etc/os-release";

/// The interactive shell commands are run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellKind {
    /// A POSIX shell binary, usually `$SHELL`
    Posix(String),
    PowerShell,
    Cmd,
}

impl ShellKind {
    /// Detects the user's shell from the environment.
    pub fn detect() -> Self {
        if cfg!(windows) {
            let module_path = env::var_os("PSModulePath").unwrap_or_default();
            if env::split_paths(&module_path).count() >= 3 {
                ShellKind::PowerShell
            } else {
                ShellKind::Cmd
            }
        } else {
            ShellKind::Posix(env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string()))
        }
    }

    /// Short name used when interpolating role templates.
    pub fn name(&self) -> String {
        match self {
            ShellKind::Posix(path) => Path::new(path)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(path)
                .to_string(),
            ShellKind::PowerShell => "powershell.exe".to_string(),
            ShellKind::Cmd => "cmd.exe".to_string(),
        }
    }

    /// Builds the process that runs `command` through this shell.
    pub fn command(&self, command: &str) -> Command {
        match self {
            ShellKind::Posix(shell) => {
                let mut cmd = Command::new(shell);
                cmd.arg("-c").arg(command);
                cmd
            }
            ShellKind::PowerShell => {
                let mut cmd = Command::new("powershell.exe");
                cmd.arg("-Command").arg(command);
                cmd
            }
            ShellKind::Cmd => {
                let mut cmd = Command::new("cmd.exe");
                cmd.arg("/c").arg(command);
                cmd
            }
        }
    }
}

/// Runs generated commands for the user.
pub trait ShellRunner: Send + Sync {
    /// Runs `command` with inherited stdio. The exit code is not reported;
    /// only a failure to start the shell is an error.
    fn execute(&self, command: &str) -> Result<(), SgptError>;
}

/// Runs commands in the user's interactive shell.
#[derive(Debug, Clone)]
pub struct SystemShell {
    kind: ShellKind,
}

impl SystemShell {
    pub fn new(kind: ShellKind) -> Self {
        Self { kind }
    }

    pub fn detect() -> Self {
        Self::new(ShellKind::detect())
    }
}

impl ShellRunner for SystemShell {
    fn execute(&self, command: &str) -> Result<(), SgptError> {
        debug!("running shell command via {:?}: {command}", self.kind);
        let status = self.kind.command(command).status()?;
        if !status.success() {
            warn!("shell command exited with {status}");
        }
        Ok(())
    }
}

/// OS and shell names interpolated into role templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformContext {
    pub os: String,
    pub shell: String,
}

impl PlatformContext {
    /// Resolves both names, detecting the ones configured as `auto`.
    pub fn resolve(os_name: &str, shell_name: &str) -> Self {
        let os = if os_name == AUTO {
            detect_os_name()
        } else {
            os_name.to_string()
        };
        let shell = if shell_name == AUTO {
            ShellKind::detect().name()
        } else {
            shell_name.to_string()
        };
        Self { os, shell }
    }
}

fn detect_os_name() -> String {
    match env::consts::OS {
        "linux" => match linux_distribution() {
            Some(distro) => format!("Linux/{distro}"),
            None => "Linux".to_string(),
        },
        "windows" => "Windows".to_string(),
        "macos" => "Darwin/MacOS".to_string(),
        other => other.to_string(),
    }
}

fn linux_distribution() -> Option<String> {
    let contents = fs::read_to_string(OS_RELEASE).ok()?;
    pretty_name(&contents)
}

fn pretty_name(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_shell_name_is_basename() {
        let kind = ShellKind::Posix("/usr/bin/zsh".to_string());
        assert_eq!(kind.name(), "zsh");
    }

    #[test]
    fn explicit_names_skip_detection() {
        let ctx = PlatformContext::resolve("Plan9", "rc");
        assert_eq!(ctx.os, "Plan9");
        assert_eq!(ctx.shell, "rc");
    }

    #[test]
    fn pretty_name_is_unquoted() {
        let release = "NAME=\"Ubuntu\"\nPRETTY_NAME=\"Ubuntu 22.04.3 LTS\"\nID=ubuntu\n";
        assert_eq!(pretty_name(release).as_deref(), Some("Ubuntu 22.04.3 LTS"));
        assert_eq!(pretty_name("ID=arch\n"), None);
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_not_an_error() {
        let shell = SystemShell::new(ShellKind::Posix("/bin/sh".to_string()));
        assert!(shell.execute("exit 3").is_ok());
    }
}
