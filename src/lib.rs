//! Command-line assistant for OpenAI-compatible chat models.
//!
//! The library holds the pieces the `sgpt` binary wires together:
//!
//! - [`role`]: named instruction templates and their JSON store
//! - [`session`]: persisted chat histories keyed by session name
//! - [`handler`]: one-shot and session-bound prompt handlers
//! - [`repl`]: the interactive dispatch loop
//! - [`batch`]: question files answered in bulk
//! - [`backends`]: the HTTP completion client, with [`cache`] in front of it
//! - [`functions`]: shell-backed functions the model may call
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use secrecy::SecretString;
//! use sgpt::{
//!     backends::OpenAIClient,
//!     chat::CompletionParams,
//!     handler::{Completer, DefaultHandler, PromptHandler},
//!     render::TerminalPrinter,
//!     role::Role,
//! };
//!
//! # async fn demo() -> Result<(), sgpt::error::SgptError> {
//! let client = OpenAIClient::new(
//!     SecretString::new("sk-...".to_string()),
//!     "https://api.openai.com/v1",
//!     None,
//! )?;
//! let completer = Completer::new(
//!     Arc::new(client),
//!     CompletionParams::new("gpt-4o"),
//!     Arc::new(TerminalPrinter::default()),
//! );
//! let role = Role::new("ShellGPT", "Answer briefly.", None);
//! DefaultHandler::new(completer, role).handle("What is a pipe?").await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod batch;
pub mod cache;
pub mod chat;
pub mod error;
pub mod functions;
pub mod handler;
pub(crate) mod persist;
pub mod platform;
pub mod render;
pub mod repl;
pub mod role;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SgptError;
