//! Error types for calcdeck
//!
//! Provides standardized error handling across the engine.

use thiserror::Error;

/// Text shown in place of a result when evaluation fails.
pub const ERROR_SENTINEL: &str = "Error";

/// Errors that can occur in calcdeck
#[derive(Debug, Error)]
pub enum CalcError {
    /// Out-of-range or missing numeric input to a calculator
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Expression could not be parsed or produced a non-finite value
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Currency rate loading errors
    #[error("Rates error: {0}")]
    Rates(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CalcError {
    /// The text a display shows for this error.
    ///
    /// Evaluation failures collapse into the generic sentinel, everything
    /// else keeps its message.
    pub fn display_text(&self) -> String {
        match self {
            CalcError::Evaluation(_) => ERROR_SENTINEL.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for calcdeck operations
pub type CalcResult<T> = Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_errors_show_sentinel() {
        let err = CalcError::Evaluation("unmatched parenthesis".into());
        assert_eq!(err.display_text(), "Error");
    }

    #[test]
    fn test_other_errors_keep_message() {
        let err = CalcError::InvalidInput("principal must be positive".into());
        assert_eq!(err.display_text(), "Invalid input: principal must be positive");
    }
}
