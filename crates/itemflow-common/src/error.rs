//! Error types shared across itemflow crates

use thiserror::Error;

/// Result type alias for shared itemflow operations
pub type Result<T> = std::result::Result<T, ItemflowError>;

/// Errors raised by the shared configuration and logging layer
#[derive(Error, Debug)]
pub enum ItemflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl ItemflowError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid value error for a named setting
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}
