//! Error types for adscout-core
//!
//! This module provides error types and user-friendly error formatting.

use thiserror::Error;

use crate::search::ProviderError;
use crate::store::StoreError;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, rejected at construction time
    #[error("invalid configuration: {field}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// A batch was submitted without any keywords
    #[error("batch has no keywords")]
    EmptyBatch,

    /// The orchestrator no longer accepts new intents
    #[error("orchestrator is shutting down")]
    ShuttingDown,

    /// An intent event carried a payload that could not be interpreted
    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    /// Search provider failure
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Persistence failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Internal error (runtime, serialization, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an [`Error::InvalidConfig`].
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidConfig { field, message } => {
                format!("Configuration error in '{}': {}", field, message)
            }
            Error::EmptyBatch => "No keywords were given for this run.".to_string(),
            Error::ShuttingDown => "The job orchestrator is shutting down.".to_string(),
            Error::InvalidIntent(msg) => format!("Could not understand the request: {}", msg),
            Error::Provider(e) => format!("Search provider error: {}", e),
            Error::Store(e) => format!("Storage error: {}", e),
            Error::Internal(msg) => format!("Internal error: {}", msg),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::InvalidConfig { field, .. } => Some(format!(
                "Check the '{}' setting in config/default.toml or the ADSCOUT_ environment variables.",
                field
            )),
            Error::EmptyBatch => Some("Pass at least one keyword with -k/--keyword.".to_string()),
            Error::Provider(ProviderError::NotStarted) => {
                Some("Start the search provider before submitting a run.".to_string())
            }
            Error::Store(_) => Some("Run `adscout init-db` and check the database path.".to_string()),
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let error = Error::invalid_config("orchestrator.max_concurrent_batches", "must be positive");

        let msg = error.user_message();
        assert!(msg.contains("orchestrator.max_concurrent_batches"));
        assert!(msg.contains("must be positive"));

        let suggestion = error.suggestion().unwrap();
        assert!(suggestion.contains("ADSCOUT_"));
    }

    #[test]
    fn test_provider_error_conversion() {
        let error: Error = ProviderError::Failed("timeout".to_string()).into();
        assert!(matches!(error, Error::Provider(_)));
        assert!(error.user_message().contains("timeout"));
    }

    #[test]
    fn test_format_error_for_cli() {
        let output = format_error_for_cli(&Error::EmptyBatch);
        assert!(output.contains("No keywords"));
        assert!(output.contains("--keyword"));
    }
}
