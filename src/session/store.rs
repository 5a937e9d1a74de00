use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::chat::{Message, MessageRole};
use crate::error::SgptError;
use crate::persist::{json_files_by_mtime, json_path, read_json, write_json_atomic};
use crate::role::Role;

use super::key::SessionKey;

/// An ordered, role-tagged conversation bound to a session key.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    key: SessionKey,
    messages: Vec<Message>,
    initiated: bool,
}

impl ChatSession {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True when the history was read from storage rather than freshly seeded.
    pub fn is_initiated(&self) -> bool {
        self.initiated
    }

    /// Name of the role recorded in the leading system message, if any.
    pub fn role_name(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|msg| msg.role == MessageRole::System)
            .and_then(|msg| Role::name_in(&msg.content))
    }

    /// The history as it should be sent with `prompt` as the next user turn.
    pub fn request_history(&self, prompt: &Message) -> Vec<Message> {
        let mut history = self.messages.clone();
        history.push(prompt.clone());
        history
    }
}

/// Outcome of [`ChatSessionStore::delete_all`], one entry per file.
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub removed: Vec<String>,
    pub failed: Vec<(String, io::Error)>,
}

/// Session keys in last-modified order, oldest first.
#[derive(Debug)]
pub struct SessionKeys {
    files: std::vec::IntoIter<PathBuf>,
}

impl Iterator for SessionKeys {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.files.by_ref().find_map(|path| file_key(&path))
    }
}

/// One JSON file per session under a single directory.
#[derive(Debug, Clone)]
pub struct ChatSessionStore {
    dir: PathBuf,
    max_messages: Option<usize>,
}

impl ChatSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            max_messages: None,
        }
    }

    /// Caps persisted history to the system message plus the last `limit`
    /// messages. `limit` is rounded down to whole user/assistant rounds, and
    /// at least one round is kept.
    pub fn with_max_messages(mut self, limit: usize) -> Self {
        self.max_messages = Some((limit - limit % 2).max(2));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self, key: &SessionKey) -> bool {
        self.path_for(key).exists()
    }

    /// Loads the history for `key`, or a new one seeded with `role`'s system
    /// message. Continuing an initiated session under another role fails.
    pub fn load(&self, key: &SessionKey, role: &Role) -> Result<ChatSession, SgptError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(ChatSession {
                key: key.clone(),
                messages: vec![Message::system().content(&role.role).build()],
                initiated: false,
            });
        }
        let session = ChatSession {
            key: key.clone(),
            messages: read_json(&path)?,
            initiated: true,
        };
        if let Some(initiated) = session.role_name() {
            if initiated != role.name {
                return Err(SgptError::RoleMismatch {
                    session: key.to_string(),
                    initiated: initiated.to_string(),
                    requested: role.name.clone(),
                });
            }
        }
        Ok(session)
    }

    /// Reads an existing session without binding a role.
    pub fn read(&self, key: &SessionKey) -> Result<Vec<Message>, SgptError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(SgptError::NotFound(format!("Chat \"{key}\"")));
        }
        read_json(&path)
    }

    /// Appends one user/assistant round and writes the whole session back.
    pub fn append_round(
        &self,
        session: &mut ChatSession,
        user: Message,
        assistant: Message,
    ) -> Result<(), SgptError> {
        session.messages.push(user);
        session.messages.push(assistant);
        self.truncate(&mut session.messages);
        self.save(session)?;
        session.initiated = true;
        Ok(())
    }

    pub fn save(&self, session: &ChatSession) -> Result<(), SgptError> {
        let path = self.path_for(&session.key);
        debug!(
            "writing {} messages to {}",
            session.messages.len(),
            path.display()
        );
        write_json_atomic(&path, &session.messages)
    }

    pub fn list_keys(&self) -> Result<SessionKeys, SgptError> {
        Ok(SessionKeys {
            files: json_files_by_mtime(&self.dir)?.into_iter(),
        })
    }

    pub fn delete(&self, key: &SessionKey) -> Result<(), SgptError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(SgptError::NotFound(format!("Chat \"{key}\"")));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Drops a session if present; used to reset the scratch session.
    pub fn invalidate(&self, key: &SessionKey) -> Result<(), SgptError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes every session. Confirmation is the caller's job.
    pub fn delete_all(&self) -> Result<DeleteReport, SgptError> {
        let mut report = DeleteReport::default();
        for path in json_files_by_mtime(&self.dir)? {
            let key = file_key(&path).unwrap_or_else(|| path.display().to_string());
            match fs::remove_file(&path) {
                Ok(()) => report.removed.push(key),
                Err(err) => {
                    warn!("failed to remove {}: {err}", path.display());
                    report.failed.push((key, err));
                }
            }
        }
        Ok(report)
    }

    fn truncate(&self, messages: &mut Vec<Message>) {
        let Some(limit) = self.max_messages else {
            return;
        };
        let excess = messages.len().saturating_sub(1 + limit);
        if excess > 0 {
            messages.drain(1..1 + excess);
        }
    }

    fn path_for(&self, key: &SessionKey) -> PathBuf {
        json_path(&self.dir, key.as_str())
    }
}

fn file_key(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}
