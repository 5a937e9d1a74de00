/// Function execution errors. Their text is handed back to the model.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FunctionError {
    /// Invalid arguments provided by the model.
    #[error("invalid function arguments: {0}")]
    InvalidArgs(String),

    /// The model asked for a function that is not installed.
    #[error("function not found: {0}")]
    NotFound(String),

    /// The command could not be started.
    #[error("function execution failed: {0}")]
    Execution(String),
}
