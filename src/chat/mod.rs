mod message;
mod tool;
mod traits;

pub use message::{FunctionCall, Message, MessageBuilder, MessageRole};
pub use tool::{FunctionSchema, ParameterProperty, ParametersSchema};
pub use traits::{CompletionClient, CompletionParams, CompletionRequest};
