use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

// Errors that abort a whole transform call. They are raised while the field
// tree is validated or parsed, before any projection work happens.
#[derive(Debug, Error)]
pub enum TransformError {
    // A single field descriptor breaks one of the grammar rules
    #[error("invalid field `{key}`: {message}")]
    InvalidField { key: String, message: String },

    // A declarative spec document does not match the field grammar
    #[error("invalid field spec: {0}")]
    InvalidSpec(String),

    // Malformed JSON handed to the spec parser or the CLI
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransformError {
    pub(crate) fn invalid_field(key: &str, message: impl Into<String>) -> Self {
        TransformError::InvalidField {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Failure reported by a user mapping. The invoker logs it and drops the field;
/// it never aborts the surrounding projection.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct MappingError {
    message: String,
}

impl MappingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<String> for MappingError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for MappingError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

// Type alias for results that use `TransformError` as the error type
pub type Result<T> = std::result::Result<T, TransformError>;
