//! Error types for the meeting/drive provider clients.

use thiserror::Error;

/// Errors that can occur while talking to the external provider.
#[derive(Debug, Error, Clone)]
pub enum GraphError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Token exchange failed or returned an unusable token
    #[error("Token acquisition failed: {message}")]
    Token { message: String },

    /// Server returned an unexpected response
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// The created event/meeting carried no join URL
    #[error("Provider response contained no join URL")]
    MissingJoinUrl,

    /// The requested drive item (folder, file) does not exist
    #[error("Drive item not found: {name}")]
    ItemNotFound { name: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },
}

impl GraphError {
    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GraphError::Network { .. } | GraphError::UnexpectedResponse { .. }
        )
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        GraphError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for GraphError {
    fn from(err: url::ParseError) -> Self {
        GraphError::UrlError {
            message: err.to_string(),
        }
    }
}
