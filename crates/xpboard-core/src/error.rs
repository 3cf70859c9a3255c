//! Error types for xpboard-core
//!
//! Fetch and protocol failures are typed with thiserror. Degenerate inputs
//! (empty record sets, zero skills) are never errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for xpboard operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Auth Errors
    // ===================
    #[error("No authentication token found")]
    MissingCredential,

    // ===================
    // Transport Errors
    // ===================
    #[error("HTTP error! status: {status}")]
    Transport { status: u16 },

    #[error("Request to query service failed: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    // ===================
    // Protocol Errors
    // ===================
    #[error("{message}")]
    Protocol { message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config in {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub fn malformed(message: impl Into<String>) -> Self {
        CoreError::MalformedResponse {
            message: message.into(),
        }
    }

    /// True for failures that happen at or beyond the network boundary
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CoreError::Transport { .. }
                | CoreError::Http { .. }
                | CoreError::Protocol { .. }
                | CoreError::MalformedResponse { .. }
        )
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Error shown to the user when a refresh halts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError {
    pub message: String,
    /// Actionable suggestion for user (optional)
    pub suggestion: Option<String>,
}

impl ViewError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add an actionable suggestion to this error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create user-friendly error from CoreError with context-aware suggestions
    pub fn from_core_error(error: &CoreError) -> Self {
        let suggestion = match error {
            CoreError::MissingCredential => {
                Some("Pass --token or set XPBOARD_TOKEN to a valid bearer token".to_string())
            }
            CoreError::Transport { status: 401 | 403 } => {
                Some("The token was rejected; sign in again to obtain a fresh one".to_string())
            }
            CoreError::Http { .. } => Some("Check your network connection".to_string()),
            CoreError::MalformedResponse { .. } => {
                Some("The query service returned unexpected data; retry later".to_string())
            }
            CoreError::ConfigParse { path, .. } => Some(format!(
                "Validate JSON syntax with: jq . {}",
                path.display()
            )),
            _ => None,
        };

        Self {
            message: error.to_string(),
            suggestion,
        }
    }
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.suggestion {
            Some(hint) => write!(f, "{} ({})", self.message, hint),
            None => write!(f, "{}", self.message),
        }
    }
}
