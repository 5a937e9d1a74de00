use crate::role::RoleKind;

/// Opens and closes a multi-line block.
pub const SENTINEL: &str = "\"\"\"";
/// Leaves the loop.
pub const EXIT_COMMAND: &str = "exit()";
const SHELL_EXECUTE: &str = "e";
const SHELL_DESCRIBE: &str = "d";

/// What one line of REPL input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplLine {
    Sentinel,
    Exit,
    /// Run the last completion as a shell command
    ShellExecute,
    /// Ask the model to describe the last completion
    ShellDescribe,
    /// Send the line to the model as is
    Forward(String),
}

impl ReplLine {
    /// Classifies `raw` under the active role. `e` and `d` only mean
    /// something to the shell command role.
    pub fn classify(raw: &str, role: &RoleKind) -> Self {
        let line = raw.trim_end_matches(['\r', '\n']);
        let shell = *role == RoleKind::ShellCommand;
        match line {
            SENTINEL => ReplLine::Sentinel,
            EXIT_COMMAND => ReplLine::Exit,
            SHELL_EXECUTE if shell => ReplLine::ShellExecute,
            SHELL_DESCRIBE if shell => ReplLine::ShellDescribe,
            _ => ReplLine::Forward(line.to_string()),
        }
    }
}
