//! Completion backend errors
//!
//! This module defines BackendError for completion backend error handling,
//! plus the coarse classification that drives retry and fallback decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse failure classification used by the retry/fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Worth retrying with backoff (timeouts, connection resets, 5xx).
    Transient,
    /// Quota or throughput exhaustion; a fallback model may still succeed.
    RateLimited,
    /// Retrying the same request cannot help (auth, rejected content, 4xx).
    Permanent,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Transient => write!(f, "transient"),
            ErrorClass::RateLimited => write!(f, "rate_limited"),
            ErrorClass::Permanent => write!(f, "permanent"),
        }
    }
}

/// Errors that can occur during backend operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Authentication failed or credentials are invalid
    AuthenticationError { message: String },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// Rate limit exceeded, retry after the specified duration (in seconds)
    RateLimitError { retry_after: Option<u64> },

    /// Invalid or malformed response from the backend
    InvalidResponse { message: String },

    /// Network-related error
    NetworkError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl BackendError {
    /// Maps this error onto the class the executor's policy acts on.
    ///
    /// Status codes, when present, take precedence: 5xx is transient, 429 is
    /// rate-limited, any other 4xx is permanent.
    pub fn class(&self) -> ErrorClass {
        match self {
            BackendError::TimeoutError { .. } | BackendError::NetworkError { .. } => {
                ErrorClass::Transient
            }
            BackendError::RateLimitError { .. } => ErrorClass::RateLimited,
            BackendError::ApiError { status_code, .. } => match status_code {
                Some(429) => ErrorClass::RateLimited,
                Some(code) if *code >= 500 => ErrorClass::Transient,
                Some(_) => ErrorClass::Permanent,
                None => ErrorClass::Transient,
            },
            BackendError::AuthenticationError { .. }
            | BackendError::InvalidResponse { .. }
            | BackendError::Other { .. } => ErrorClass::Permanent,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::AuthenticationError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::RateLimitError { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limit exceeded, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limit exceeded")
                }
            }
            BackendError::InvalidResponse { message } => {
                write!(f, "Invalid response from backend: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}
