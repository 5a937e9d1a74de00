use async_trait::async_trait;
use serde::Serialize;

use crate::error::SgptError;

use super::message::Message;
use super::tool::FunctionSchema;

/// Sampling parameters shared by every request of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionParams {
    pub model: String,
    /// 0.0 to 2.0
    pub temperature: f32,
    /// 0.0 to 1.0
    pub top_p: f32,
    /// Reuse a cached answer for an identical request
    #[serde(skip)]
    pub use_cache: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionSchema>,
}

impl CompletionParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            top_p: 1.0,
            use_cache: true,
            functions: Vec::new(),
        }
    }
}

/// One request/response round-trip with the remote model.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub params: CompletionParams,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, params: CompletionParams) -> Self {
        Self { messages, params }
    }
}

/// Trait for clients that turn an ordered message history into a completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the final assistant text. Nested function-call rounds, if any,
    /// happen inside the call.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SgptError>;
}
