use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use sgpt::SgptError;

const BASH_INTEGRATION: &str = r#"
# Shell-GPT integration BASH v0.2
_sgpt_bash() {
if [[ -n "$READLINE_LINE" ]]; then
    READLINE_LINE=$(sgpt --shell <<< "$READLINE_LINE" --no-interaction)
    READLINE_POINT=${#READLINE_LINE}
fi
}
bind -x '"\C-l": _sgpt_bash'
# Shell-GPT integration BASH v0.2
"#;

const ZSH_INTEGRATION: &str = r#"
# Shell-GPT integration ZSH v0.2
_sgpt_zsh() {
if [[ -n "$BUFFER" ]]; then
    _sgpt_prev_cmd=$BUFFER
    BUFFER+="⌛"
    zle -I && zle redisplay
    BUFFER=$(sgpt --shell <<< "$_sgpt_prev_cmd" --no-interaction)
    zle end-of-line
fi
}
zle -N _sgpt_zsh
bindkey ^l _sgpt_zsh
# Shell-GPT integration ZSH v0.2
"#;

/// Snippet and rc file name for a shell, by the shell's base name.
fn integration_for(shell: &str) -> Result<(&'static str, &'static str), SgptError> {
    match shell {
        "bash" => Ok((BASH_INTEGRATION, ".bashrc")),
        "zsh" => Ok((ZSH_INTEGRATION, ".zshrc")),
        other => Err(SgptError::Usage(format!(
            "Shell integration is only available for ZSH and Bash, not \"{other}\"."
        ))),
    }
}

/// Appends the hotkey integration to the shell's rc file unless it is
/// already there. Returns the rc file and whether it was changed.
pub fn install(shell: &str) -> Result<(PathBuf, bool), SgptError> {
    let (snippet, rc_name) = integration_for(shell)?;
    let home = dirs::home_dir()
        .ok_or_else(|| SgptError::Usage("cannot locate the home directory".to_string()))?;
    let rc = home.join(rc_name);
    append_once(&rc, snippet).map(|changed| (rc, changed))
}

fn append_once(rc: &PathBuf, snippet: &str) -> Result<bool, SgptError> {
    let marker = snippet.trim().lines().next().unwrap_or_default();
    if fs::read_to_string(rc).is_ok_and(|contents| contents.contains(marker)) {
        return Ok(false);
    }
    let mut file = OpenOptions::new().create(true).append(true).open(rc)?;
    file.write_all(snippet.as_bytes())?;
    Ok(true)
}
