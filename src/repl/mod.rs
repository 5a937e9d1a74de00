//! Interactive dispatch loop.
//!
//! Lines come first from an optional pre-supplied block, then from a live
//! [`LineSource`]. Each line is classified as a [`ReplLine`] and either
//! forwarded to the model, run as a shell command, described, or ends the
//! loop. A `"""` line opens a multi-line block that is forwarded as one
//! prompt once closed, and the block may span from the pre-supplied lines
//! into the live ones.

mod line;
mod source;

pub use line::{ReplLine, EXIT_COMMAND, SENTINEL};
pub use source::{BufReadLines, LineSource, ScriptedLines};

use std::mem;
use std::sync::Arc;

use log::{debug, warn};

use crate::chat::Message;
use crate::error::SgptError;
use crate::handler::PromptHandler;
use crate::platform::ShellRunner;
use crate::render::Printer;
use crate::role::RoleKind;

const PROMPT: &str = ">>>";
const CONTINUATION_PROMPT: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    Idle,
    AccumulatingMultiline,
    AwaitingModelResponse,
    Terminated,
}

pub struct ReplLoop<H> {
    handler: H,
    role: RoleKind,
    describer: Option<Box<dyn PromptHandler>>,
    shell: Arc<dyn ShellRunner>,
    printer: Arc<dyn Printer>,
    history: Vec<Message>,
    state: ReplState,
    last_completion: String,
}

impl<H: PromptHandler> ReplLoop<H> {
    /// `role` decides whether `e` and `d` are commands; `handler` answers
    /// forwarded prompts.
    pub fn new(
        handler: H,
        role: RoleKind,
        shell: Arc<dyn ShellRunner>,
        printer: Arc<dyn Printer>,
    ) -> Self {
        Self {
            handler,
            role,
            describer: None,
            shell,
            printer,
            history: Vec::new(),
            state: ReplState::Idle,
            last_completion: String::new(),
        }
    }

    /// Handler answering `d`, bound to the shell description role.
    pub fn with_describer(mut self, describer: Box<dyn PromptHandler>) -> Self {
        self.describer = Some(describer);
        self
    }

    /// Earlier messages of the session, replayed before the first prompt.
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn state(&self) -> ReplState {
        self.state
    }

    pub fn last_completion(&self) -> &str {
        &self.last_completion
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs until `exit()`, the end of `input`, or a failed completion.
    pub async fn run(
        &mut self,
        init_prompt: &str,
        input: &mut dyn LineSource,
    ) -> Result<(), SgptError> {
        self.state = ReplState::Idle;
        self.intro(init_prompt);

        let mut block = ScriptedLines::new(init_prompt.lines());
        let mut buffer = String::new();
        while self.state != ReplState::Terminated {
            let prompt = match self.state {
                ReplState::AccumulatingMultiline => CONTINUATION_PROMPT,
                _ => PROMPT,
            };
            let line = match block.read_line(prompt)? {
                Some(line) => {
                    self.printer.echo(&format!("{prompt} {line}"));
                    line
                }
                None => match input.read_line(prompt)? {
                    Some(line) => line,
                    None => {
                        debug!("input closed, leaving REPL");
                        self.state = ReplState::Terminated;
                        break;
                    }
                },
            };

            if self.state == ReplState::AccumulatingMultiline {
                if ReplLine::classify(&line, &self.role) == ReplLine::Sentinel {
                    self.state = ReplState::Idle;
                    let content = mem::take(&mut buffer);
                    self.forward(&content).await?;
                } else {
                    buffer.push_str(&line);
                    buffer.push('\n');
                }
                continue;
            }

            match ReplLine::classify(&line, &self.role) {
                ReplLine::Sentinel => self.state = ReplState::AccumulatingMultiline,
                ReplLine::Exit => self.state = ReplState::Terminated,
                ReplLine::ShellExecute => self.execute_last(),
                ReplLine::ShellDescribe => self.describe_last().await?,
                ReplLine::Forward(prompt) if prompt.trim().is_empty() => {}
                ReplLine::Forward(prompt) => self.forward(&prompt).await?,
            }
        }
        Ok(())
    }

    fn intro(&self, init_prompt: &str) {
        if !self.history.is_empty() {
            self.printer.rule(Some("Chat History"));
            self.printer.history(&self.history);
            self.printer.rule(None);
        }
        let info = if self.role == RoleKind::ShellCommand {
            "Entering shell REPL mode, type [e] to execute commands \
             or [d] to describe the commands, press Ctrl+C to exit."
        } else {
            "Entering REPL mode, press Ctrl+C to exit."
        };
        self.printer.notice(info);
        if !init_prompt.is_empty() {
            self.printer.rule(Some("Input"));
            self.printer.echo(init_prompt);
            self.printer.rule(None);
        }
    }

    async fn forward(&mut self, prompt: &str) -> Result<(), SgptError> {
        self.state = ReplState::AwaitingModelResponse;
        match self.handler.handle(prompt).await {
            Ok(text) => {
                self.last_completion = text;
                self.state = ReplState::Idle;
                Ok(())
            }
            Err(err) => {
                self.state = ReplState::Terminated;
                Err(err)
            }
        }
    }

    fn execute_last(&self) {
        self.printer.echo("");
        if let Err(err) = self.shell.execute(&self.last_completion) {
            warn!("shell command failed: {err}");
        }
        self.printer.echo("");
        self.printer.rule(None);
    }

    async fn describe_last(&mut self) -> Result<(), SgptError> {
        let Some(describer) = self.describer.as_mut() else {
            return Err(SgptError::Usage(
                "no describe role available for [d]".to_string(),
            ));
        };
        if let Err(err) = describer.handle(&self.last_completion).await {
            self.state = ReplState::Terminated;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "repl_tests.rs"]
mod tests;
