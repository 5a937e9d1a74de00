use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};

use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use sgpt::repl::{BufReadLines, LineSource};
use sgpt::SgptError;

#[cfg(unix)]
const TTY: &str = "/dev/tty";
#[cfg(windows)]
const TTY: &str = "CONIN$";

/// Where interactive lines come from.
pub enum TerminalInput {
    /// Line editing on a real terminal
    Editor(DefaultEditor),
    /// Plain lines from a pipe or the controlling terminal
    Lines(BufReadLines<Box<dyn BufRead>>),
}

impl TerminalInput {
    /// Picks the interactive source.
    ///
    /// With a terminal on stdin this is a line editor. When stdin was piped
    /// and carried the end-of-context marker, the rest of the pipe is the
    /// interactive input. Otherwise the controlling terminal is opened, and
    /// failing that the remaining stdin is used.
    pub fn open(stdin_tail: bool) -> anyhow::Result<Self> {
        if io::stdin().is_terminal() {
            return Ok(TerminalInput::Editor(DefaultEditor::new()?));
        }
        if !stdin_tail {
            match File::open(TTY) {
                Ok(tty) => {
                    debug!("reading interactive input from {TTY}");
                    return Ok(Self::lines(Box::new(BufReader::new(tty))));
                }
                Err(err) => debug!("cannot open {TTY}: {err}"),
            }
        }
        Ok(Self::lines(Box::new(io::stdin().lock())))
    }

    /// Plain line input from any reader.
    pub(super) fn lines(reader: Box<dyn BufRead>) -> Self {
        TerminalInput::Lines(BufReadLines::new(reader))
    }

    /// Reads a line pre-filled with `initial`, for editing a command.
    /// Without a line editor an empty answer keeps `initial`.
    pub fn read_with_initial(
        &mut self,
        prompt: &str,
        initial: &str,
    ) -> Result<Option<String>, SgptError> {
        match self {
            TerminalInput::Editor(editor) => {
                readline_result(editor.readline_with_initial(&format!("{prompt} "), (initial, "")))
            }
            TerminalInput::Lines(lines) => Ok(lines
                .read_line(&format!("{prompt} [{initial}]"))?
                .map(|line| {
                    if line.trim().is_empty() {
                        initial.to_string()
                    } else {
                        line
                    }
                })),
        }
    }

    /// Asks a yes/no question; anything but `y`/`yes` is a no.
    pub fn confirm(&mut self, question: &str) -> Result<bool, SgptError> {
        let answer = self.read_line(&format!("{question} [y/N]"))?;
        Ok(matches!(
            answer.as_deref().map(|a| a.trim().to_ascii_lowercase()).as_deref(),
            Some("y" | "yes")
        ))
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, SgptError> {
        match self {
            TerminalInput::Editor(editor) => {
                let line = readline_result(editor.readline(&format!("{prompt} ")))?;
                if let Some(line) = line.as_deref().filter(|l| !l.trim().is_empty()) {
                    let _ = editor.add_history_entry(line);
                }
                Ok(line)
            }
            TerminalInput::Lines(lines) => lines.read_line(prompt),
        }
    }
}

/// Ctrl+C and Ctrl+D end the input; other failures are IO errors.
fn readline_result(result: Result<String, ReadlineError>) -> Result<Option<String>, SgptError> {
    match result {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(ReadlineError::Io(err)) => Err(SgptError::Io(err)),
        Err(err) => Err(SgptError::Io(io::Error::other(err.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_and_eof_end_input() {
        assert_eq!(readline_result(Err(ReadlineError::Interrupted)).unwrap(), None);
        assert_eq!(readline_result(Err(ReadlineError::Eof)).unwrap(), None);
        assert_eq!(
            readline_result(Ok("ls".to_string())).unwrap().as_deref(),
            Some("ls")
        );
    }

    #[test]
    fn piped_lines_confirm_and_keep_initial() {
        let reader: Box<dyn BufRead> = Box::new(io::Cursor::new("yes\n\nnope\n"));
        let mut input = TerminalInput::lines(reader);
        assert!(input.confirm("Delete?").unwrap());
        assert_eq!(
            input.read_with_initial("Modify:", "ls -la").unwrap().as_deref(),
            Some("ls -la")
        );
        assert!(!input.confirm("Delete?").unwrap());
        assert!(!input.confirm("Delete?").unwrap());
    }
}
