use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Bind count mismatch: statement has {expected} marker(s), {actual} value(s) supplied")]
    BindCountMismatch { expected: usize, actual: usize },

    #[error("Duplicate named bind: {0}")]
    DuplicateBind(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),
}
