use std::path::PathBuf;

use thiserror::Error;

/// Error types raised by the assistant's components.
#[derive(Debug, Error)]
pub enum SgptError {
    /// Conflicting or invalid command-line usage
    #[error("Usage error: {0}")]
    Usage(String),
    /// An explicitly named role does not exist in the role store
    #[error("Role \"{0}\" not found")]
    RoleNotFound(String),
    /// A role with this name already exists and overwrite was not confirmed
    #[error("Role \"{0}\" already exists")]
    RoleExists(String),
    /// An initiated chat session is being continued with another role
    #[error("Can't change chat role to \"{requested}\" since chat \"{session}\" was initiated as \"{initiated}\"")]
    RoleMismatch {
        session: String,
        initiated: String,
        requested: String,
    },
    /// A chat session (or other named record) is missing
    #[error("{0} not found")]
    NotFound(String),
    /// The remote completion call failed
    #[error("Completion failed: {0}")]
    CompletionFailed(String),
    /// A persisted record could not be parsed
    #[error("Corrupt record at {path}: {message}")]
    StorageCorrupt { path: PathBuf, message: String },
    /// Input data does not match the expected schema
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    /// Filesystem or terminal IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts reqwest HTTP errors into completion failures
impl From<reqwest::Error> for SgptError {
    fn from(err: reqwest::Error) -> Self {
        SgptError::CompletionFailed(err.to_string())
    }
}

impl SgptError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        SgptError::StorageCorrupt {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
