use std::fs;
use std::io::{self, BufRead, IsTerminal};

use anyhow::Context;

use sgpt::SgptError;

use crate::args::CliArgs;

use super::editor;

/// Line that ends piped context; whatever follows it is interactive input.
pub const STDIN_EOF_MARKER: &str = "__sgpt__eof__";

/// Context read from a pipe on stdin.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PipedInput {
    pub context: String,
    /// The end marker was seen, so stdin still holds interactive lines
    pub has_tail: bool,
}

/// Reads piped stdin up to the end marker. `None` when stdin is a terminal.
pub fn read_piped_stdin() -> anyhow::Result<Option<PipedInput>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let piped = split_context(stdin.lock()).context("failed to read stdin")?;
    Ok(Some(piped))
}

fn split_context<R: BufRead>(reader: R) -> io::Result<PipedInput> {
    let mut piped = PipedInput::default();
    for line in reader.lines() {
        let line = line?;
        if line.contains(STDIN_EOF_MARKER) {
            piped.has_tail = true;
            break;
        }
        piped.context.push_str(&line);
        piped.context.push('\n');
    }
    Ok(piped)
}

/// Joins piped context and the prompt argument.
pub fn combine(context: Option<&str>, prompt: Option<&str>) -> String {
    match (context.filter(|c| !c.is_empty()), prompt) {
        (Some(context), Some(prompt)) => format!("{context}\n\n{prompt}"),
        (Some(context), None) => context.to_string(),
        (None, Some(prompt)) => prompt.to_string(),
        (None, None) => String::new(),
    }
}

/// Prompt Source Resolver: the editor, a file, or stdin plus argument.
pub fn resolve_prompt(args: &CliArgs, piped: Option<&PipedInput>) -> anyhow::Result<String> {
    if args.editor {
        let prompt = editor::edit_text("")?;
        if prompt.trim().is_empty() {
            return Err(SgptError::Usage("Could not get prompt from the editor.".to_string()).into());
        }
        return Ok(prompt);
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt file {}", path.display()));
    }
    if let Some(path) = &args.edit_file {
        editor::edit_file(path)?;
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt file {}", path.display()));
    }
    Ok(combine(
        piped.map(|p| p.context.as_str()),
        args.prompt.as_deref(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_stops_at_marker() {
        let input = "line one\nline two\n__sgpt__eof__\nexit()\n";
        let piped = split_context(io::Cursor::new(input)).unwrap();
        assert_eq!(piped.context, "line one\nline two\n");
        assert!(piped.has_tail);
    }

    #[test]
    fn context_without_marker_takes_everything() {
        let piped = split_context(io::Cursor::new("a\nb")).unwrap();
        assert_eq!(piped.context, "a\nb\n");
        assert!(!piped.has_tail);
    }

    #[test]
    fn reader_is_left_after_the_marker() {
        let mut cursor = io::Cursor::new("ctx\n__sgpt__eof__\nrest\n");
        let piped = split_context(&mut cursor).unwrap();
        assert_eq!(piped.context, "ctx\n");
        let mut rest = String::new();
        cursor.read_line(&mut rest).unwrap();
        assert_eq!(rest, "rest\n");
    }

    #[test]
    fn combines_context_and_prompt() {
        assert_eq!(combine(Some("log"), Some("explain")), "log\n\nexplain");
        assert_eq!(combine(Some("log"), None), "log");
        assert_eq!(combine(Some(""), Some("explain")), "explain");
        assert_eq!(combine(None, None), "");
    }
}
