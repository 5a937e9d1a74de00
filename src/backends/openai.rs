//! OpenAI-compatible chat completion client.
//!
//! Speaks the `/chat/completions` endpoint with the `functions` /
//! `function_call` convention, so any server implementing that surface
//! (OpenAI, Azure proxies, LocalAI, Ollama's compatibility layer) works.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::chat::{
    CompletionClient, CompletionRequest, FunctionCall, FunctionSchema, Message,
};
use crate::error::SgptError;
use crate::functions::FunctionRegistry;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Upper bound on nested function-call rounds inside one completion.
const MAX_FUNCTION_ROUNDS: usize = 8;

/// Request payload for the chat completions endpoint.
#[derive(Serialize, Debug)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [FunctionSchema]>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChatChoice>,
}

#[derive(Deserialize, Debug)]
struct OpenAIChatChoice {
    message: OpenAIChatMessage,
}

#[derive(Deserialize, Debug)]
struct OpenAIChatMessage {
    content: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize, Debug)]
struct OpenAIErrorBody {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize, Debug)]
struct OpenAIErrorDetail {
    message: String,
}

/// Client for OpenAI-compatible APIs
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    functions: Option<FunctionRegistry>,
}

impl OpenAIClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key sent as a bearer token
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `timeout` - Request timeout; `None` leaves it to the HTTP client
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, SgptError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            api_key,
            base_url: base_url.into(),
            functions: None,
        })
    }

    /// Executes function calls requested by the model through `registry`.
    pub fn with_functions(mut self, registry: FunctionRegistry) -> Self {
        self.functions = Some(registry);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(
        &self,
        request: &CompletionRequest,
        messages: &[Message],
    ) -> Result<OpenAIChatMessage, SgptError> {
        let functions = &request.params.functions;
        let body = OpenAIChatRequest {
            model: &request.params.model,
            messages,
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            functions: (!functions.is_empty()).then_some(functions.as_slice()),
            stream: false,
        };
        debug!(
            "POST {} model={} messages={}",
            self.endpoint(),
            body.model,
            messages.len()
        );
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            let detail = serde_json::from_str::<OpenAIErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or(raw);
            return Err(SgptError::CompletionFailed(format!(
                "{} returned {status}: {detail}",
                self.endpoint()
            )));
        }
        let parsed: OpenAIChatResponse = serde_json::from_str(&raw).map_err(|err| {
            SgptError::CompletionFailed(format!("unexpected response ({err}): {raw}"))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| SgptError::CompletionFailed("response has no choices".to_string()))
    }

    fn call_function(&self, call: &FunctionCall) -> String {
        info!("model called function {}({})", call.name, call.arguments);
        let result = match &self.functions {
            Some(registry) => registry.execute(&call.name, &call.arguments),
            None => Err(crate::functions::FunctionError::NotFound(call.name.clone())),
        };
        result.unwrap_or_else(|err| format!("Function error: {err}"))
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SgptError> {
        let mut messages = request.messages.clone();
        for _ in 0..MAX_FUNCTION_ROUNDS {
            let reply = self.send(request, &messages).await?;
            let Some(call) = reply.function_call else {
                return Ok(reply.content.unwrap_or_default());
            };
            let output = self.call_function(&call);
            messages.push(
                Message::assistant()
                    .content(reply.content.unwrap_or_default())
                    .function_call(call.clone())
                    .build(),
            );
            messages.push(Message::function(call.name).content(output).build());
        }
        Err(SgptError::CompletionFailed(format!(
            "model kept calling functions after {MAX_FUNCTION_ROUNDS} rounds"
        )))
    }
}

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;
