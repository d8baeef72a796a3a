/// Errors returned by field storage and export operations.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// Malformed or incomplete input.
    #[error("{0}")]
    Validation(String),
    #[error("field not found: {0}")]
    NotFound(String),
    /// Filesystem or serialization failure.
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl FieldError {
    pub fn validation(message: impl Into<String>) -> Self {
        FieldError::Validation(message.into())
    }
}
