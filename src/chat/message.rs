use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a participant in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instruction text of the active role
    System,
    /// The user/human participant in the conversation
    User,
    /// The model participant in the conversation
    Assistant,
    /// Output of a function the model asked to call
    Function,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Function => "function",
        };
        write!(f, "{name}")
    }
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call
    pub name: String,
    /// Raw JSON arguments as produced by the model
    #[serde(default)]
    pub arguments: String,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: MessageRole,
    /// Text content of the message
    #[serde(default)]
    pub content: String,
    /// Function name, set on `function` role messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Function call requested by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Message {
    /// Create a new builder for a system message
    pub fn system() -> MessageBuilder {
        MessageBuilder::new(MessageRole::System)
    }

    /// Create a new builder for a user message
    pub fn user() -> MessageBuilder {
        MessageBuilder::new(MessageRole::User)
    }

    /// Create a new builder for an assistant message
    pub fn assistant() -> MessageBuilder {
        MessageBuilder::new(MessageRole::Assistant)
    }

    /// Create a new builder for a function result message
    pub fn function(name: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(MessageRole::Function).name(name)
    }
}

/// Builder for Message
#[derive(Debug)]
pub struct MessageBuilder {
    role: MessageRole,
    content: String,
    name: Option<String>,
    function_call: Option<FunctionCall>,
}

impl MessageBuilder {
    /// Create a new MessageBuilder with specified role
    pub fn new(role: MessageRole) -> Self {
        Self {
            role,
            content: String::new(),
            name: None,
            function_call: None,
        }
    }

    /// Set the message content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the function name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a function call requested by the model
    pub fn function_call(mut self, call: FunctionCall) -> Self {
        self.function_call = Some(call);
        self
    }

    /// Build the Message
    pub fn build(self) -> Message {
        Message {
            role: self.role,
            content: self.content,
            name: self.name,
            function_call: self.function_call,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let msg = Message::assistant().content("hi").build();
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn function_message_carries_name() {
        let msg = Message::function("execute_shell_command")
            .content("ok")
            .build();
        assert_eq!(msg.role, MessageRole::Function);
        assert_eq!(msg.name.as_deref(), Some("execute_shell_command"));
    }

    #[test]
    fn missing_content_defaults_to_empty() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"assistant","function_call":{"name":"ls","arguments":"{}"}}"#,
        )
        .unwrap();
        assert!(msg.content.is_empty());
        assert_eq!(msg.function_call.unwrap().name, "ls");
    }
}
