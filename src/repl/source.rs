use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::SgptError;

/// A stream of input lines, one per call.
pub trait LineSource {
    /// Reads the next line, showing `prompt` if the source is interactive.
    /// `Ok(None)` means the source is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, SgptError>;
}

/// Lines known up front, such as a block piped in before the session.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, SgptError> {
        Ok(self.lines.pop_front())
    }
}

/// Reads from any buffered reader, writing the prompt to stdout.
pub struct BufReadLines<R> {
    reader: R,
}

impl<R: BufRead> BufReadLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for BufReadLines<R> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, SgptError> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt} ")?;
        stdout.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_lines_drain_in_order() {
        let mut lines = ScriptedLines::new(["a", "b"]);
        assert_eq!(lines.read_line(">>>").unwrap().as_deref(), Some("a"));
        assert_eq!(lines.read_line(">>>").unwrap().as_deref(), Some("b"));
        assert_eq!(lines.read_line(">>>").unwrap(), None);
        assert!(lines.is_empty());
    }

    #[test]
    fn buf_read_lines_strip_line_endings() {
        let mut lines = BufReadLines::new(io::Cursor::new("first\r\nsecond\nthird"));
        assert_eq!(lines.read_line(">>>").unwrap().as_deref(), Some("first"));
        assert_eq!(lines.read_line(">>>").unwrap().as_deref(), Some("second"));
        assert_eq!(lines.read_line(">>>").unwrap().as_deref(), Some("third"));
        assert_eq!(lines.read_line(">>>").unwrap(), None);
    }
}
