//! Error types for Sleepscope

use thiserror::Error;

/// Errors that can occur while assessing a request
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for field '{field}': {reason}")]
    TypeConversion { field: String, reason: String },

    #[error("Unknown {kind}: '{label}'")]
    UnknownCategory { kind: &'static str, label: String },

    #[error("Invalid numeric input for {field}: {value}")]
    InvalidNumericInput { field: &'static str, value: f64 },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ComputeError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::ParseError(_) => "PARSE_ERROR",
            ComputeError::MissingField(_) => "MISSING_FIELD",
            ComputeError::TypeConversion { .. } => "TYPE_CONVERSION",
            ComputeError::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            ComputeError::InvalidNumericInput { .. } => "INVALID_NUMERIC_INPUT",
            ComputeError::JsonError(_) => "JSON_ERROR",
            ComputeError::ModelError(_) => "MODEL_ERROR",
            ComputeError::EncodingError(_) => "ENCODING_ERROR",
        }
    }
}

/// Reject NaN and infinities before they reach a threshold comparison.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ComputeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputeError::InvalidNumericInput { field, value })
    }
}
