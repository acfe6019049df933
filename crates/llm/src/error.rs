//! Error types for language-model provider calls.
//!
//! Distinguishes transient failures (timeouts, rate limits, server
//! errors), which callers may retry, from permanent ones (malformed
//! replies, client errors), which they may not.

use thiserror::Error;

/// Errors that can occur when calling a language-model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Provider rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Provider returned a non-success status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from the provider.
        message: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Reply could not be interpreted (empty choices, missing verdict,
    /// unparseable body).
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Client misconfiguration (missing key, bad URL).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Returns true if the request may succeed when retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimit { .. } | Self::Network(_) => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            Self::MalformedResponse(_) | Self::Configuration(_) => false,
        }
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after_secs } => Some(*retry_after_secs),
            Self::Timeout(_) | Self::Network(_) => Some(1),
            Self::Api { status_code, .. } if *status_code >= 500 => Some(2),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, LlmError>;
