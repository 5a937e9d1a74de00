//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::chat::{CompletionClient, CompletionRequest, Message};
use crate::error::SgptError;
use crate::platform::ShellRunner;
use crate::render::Printer;

/// Answers requests from a fixed script and records what it was asked.
#[derive(Clone, Default)]
pub(crate) struct ScriptedClient {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedClient {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(replies.into_iter().map(|reply| Ok(reply.into())))
    }

    pub(crate) fn with_results<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Last user message of every request, in order.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|req| req.messages.last().map(|msg| msg.content.clone()))
            .collect()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SgptError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(SgptError::CompletionFailed(message)),
            None => Err(SgptError::CompletionFailed("script exhausted".to_string())),
        }
    }
}

/// Captures everything that would have been printed.
#[derive(Clone, Default)]
pub(crate) struct RecordingPrinter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingPrinter {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl Printer for RecordingPrinter {
    fn completion(&self, text: &str, markdown: bool) {
        let tag = if markdown { "md" } else { "text" };
        self.push(format!("{tag}: {text}"));
    }

    fn echo(&self, text: &str) {
        self.push(format!("echo: {text}"));
    }

    fn notice(&self, text: &str) {
        self.push(format!("notice: {text}"));
    }

    fn rule(&self, title: Option<&str>) {
        self.push(format!("rule: {}", title.unwrap_or_default()));
    }

    fn history(&self, messages: &[Message]) {
        for message in messages {
            self.push(format!("history: {}: {}", message.role, message.content));
        }
    }
}

/// Records commands instead of running them.
#[derive(Clone, Default)]
pub(crate) struct RecordingShell {
    commands: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingShell {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl ShellRunner for RecordingShell {
    fn execute(&self, command: &str) -> Result<(), SgptError> {
        self.commands.lock().unwrap().push(command.to_string());
        if self.fail {
            return Err(SgptError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such shell",
            )));
        }
        Ok(())
    }
}
