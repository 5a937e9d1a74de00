use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context};
use log::debug;

const DEFAULT_EDITOR: &str = "vim";

/// Opens `initial` in `$EDITOR` and returns the saved text.
pub fn edit_text(initial: &str) -> anyhow::Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("sgpt-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;
    edit_file(file.path())?;
    fs::read_to_string(file.path()).context("failed to read the edited prompt")
}

/// Opens `path` in `$EDITOR` and waits for it to close.
pub fn edit_file(path: &Path) -> anyhow::Result<()> {
    let editor = env::var("EDITOR").unwrap_or_else(|_| DEFAULT_EDITOR.to_string());
    let mut command = editor_command(&editor)?;
    debug!("opening {} with {editor}", path.display());
    let status = command
        .arg(path)
        .status()
        .with_context(|| format!("failed to start editor \"{editor}\""))?;
    if !status.success() {
        bail!("editor \"{editor}\" exited with {status}");
    }
    Ok(())
}

/// `$EDITOR` may carry arguments, e.g. `code --wait`.
fn editor_command(editor: &str) -> anyhow::Result<Command> {
    let words = shell_words::split(editor)
        .with_context(|| format!("cannot parse EDITOR \"{editor}\""))?;
    let Some((program, args)) = words.split_first() else {
        bail!("EDITOR is empty");
    };
    let mut command = Command::new(program);
    command.args(args);
    Ok(command)
}
