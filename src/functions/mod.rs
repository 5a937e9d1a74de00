//! User-defined functions the model may call during a completion.

mod error;
mod executor;
mod registry;
mod types;

pub use error::FunctionError;
pub use registry::FunctionRegistry;
pub use types::{FunctionDefinition, FunctionParam, FunctionsFile, DEFAULT_FUNCTIONS_FILE};
