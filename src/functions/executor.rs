//! Command execution for installed functions.

use std::process::Stdio;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::platform::ShellKind;

use super::error::FunctionError;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("static regex is valid"))
}

/// Fills `{{name}}` placeholders of `template` from the model's arguments in
/// one pass. Argument values are inserted verbatim, braces included.
pub(super) fn substitute(template: &str, args: &Value) -> Result<String, FunctionError> {
    let empty = Map::new();
    let map = match args {
        Value::Object(map) => map,
        _ => &empty,
    };
    let missing: Vec<&str> = placeholder()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|name| name.as_str()))
        .filter(|name| !map.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(FunctionError::InvalidArgs(format!(
            "missing required parameters in command: {}",
            missing.join(", ")
        )));
    }
    let command = placeholder().replace_all(template, |caps: &Captures| match map.get(&caps[1]) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => caps[0].to_string(),
    });
    Ok(command.into_owned())
}

/// Runs `command` and reports everything it produced. A non-zero exit is part
/// of the transcript, not an error.
pub(super) fn run(shell: &ShellKind, command: &str) -> Result<String, FunctionError> {
    let output = shell
        .command(command)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| FunctionError::Execution(format!("{command}: {err}")))?;
    let code = output
        .status
        .code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| "signal".to_string());
    Ok(format!(
        "Command: {command}\nStdout: {}\nStderr: {}\nExit code: {code}",
        String::from_utf8_lossy(&output.stdout).trim_end(),
        String::from_utf8_lossy(&output.stderr).trim_end(),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn placeholders_are_filled() {
        let cmd = substitute("ls {{path}} | head -n {{count}}", &json!({"path": "/tmp", "count": 3}))
            .unwrap();
        assert_eq!(cmd, "ls /tmp | head -n 3");
    }

    #[test]
    fn unfilled_placeholder_is_rejected() {
        let err = substitute("cat {{file}}", &json!({})).unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArgs(_)));
    }

    #[test]
    fn braces_in_arguments_are_kept_verbatim() {
        let cmd = substitute(
            "{{shell_command}}",
            &json!({"shell_command": "docker inspect -f '{{.Id}}' web"}),
        )
        .unwrap();
        assert_eq!(cmd, "docker inspect -f '{{.Id}}' web");
    }

    #[test]
    fn values_are_not_substituted_again() {
        let cmd = substitute(
            "echo {{first}} {{second}}",
            &json!({"first": "{{second}}", "second": "two"}),
        )
        .unwrap();
        assert_eq!(cmd, "echo {{second}} two");
    }

    #[test]
    fn missing_parameters_are_named() {
        let err = substitute("cp {{from}} {{to}}", &json!({"from": "a"})).unwrap_err();
        match err {
            FunctionError::InvalidArgs(message) => assert!(message.ends_with(": to")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn transcript_includes_exit_code() {
        let shell = ShellKind::Posix("/bin/sh".to_string());
        let transcript = run(&shell, "echo out; echo err >&2; exit 4").unwrap();
        assert!(transcript.contains("Stdout: out"));
        assert!(transcript.contains("Stderr: err"));
        assert!(transcript.ends_with("Exit code: 4"));
    }
}
