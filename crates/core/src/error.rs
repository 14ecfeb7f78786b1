use serde::{Deserialize, Serialize};

/// Domain error shared by the server, the client and the strategies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown strategy: {0}")]
    InvalidStrategy(String),

    #[error("Strategy '{strategy}' does not support option '{option}'")]
    UnsupportedOption {
        strategy: String,
        option: &'static str,
    },

    #[error("Strategy execution failed: {0}")]
    StrategyExecution(String),

    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable code, shared by HTTP error bodies and
    /// per-item failure markers.
    pub fn code(&self) -> ItemErrorCode {
        match self {
            CoreError::InvalidStrategy(_) => ItemErrorCode::InvalidStrategy,
            CoreError::UnsupportedOption { .. } => ItemErrorCode::UnsupportedOption,
            CoreError::StrategyExecution(_) => ItemErrorCode::StrategyFailed,
            CoreError::MalformedBatch(_) => ItemErrorCode::MalformedBatch,
            CoreError::Validation(_) => ItemErrorCode::ValidationError,
            CoreError::NotFound { .. } => ItemErrorCode::NotFound,
            CoreError::Internal(_) => ItemErrorCode::InternalError,
        }
    }
}

/// Error codes as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemErrorCode {
    InvalidStrategy,
    UnsupportedOption,
    StrategyFailed,
    MalformedBatch,
    ValidationError,
    NotFound,
    InternalError,
}

impl ItemErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemErrorCode::InvalidStrategy => "INVALID_STRATEGY",
            ItemErrorCode::UnsupportedOption => "UNSUPPORTED_OPTION",
            ItemErrorCode::StrategyFailed => "STRATEGY_FAILED",
            ItemErrorCode::MalformedBatch => "MALFORMED_BATCH",
            ItemErrorCode::ValidationError => "VALIDATION_ERROR",
            ItemErrorCode::NotFound => "NOT_FOUND",
            ItemErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Explicit per-item failure marker carried in batch results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub code: ItemErrorCode,
    pub message: String,
}

impl From<&CoreError> for ItemError {
    fn from(err: &CoreError) -> Self {
        let message = match err {
            // Internal details stay in the server log.
            CoreError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        Self {
            code: err.code(),
            message,
        }
    }
}
