//! # F1 Data API Error Types
//!
//! Errors raised by the remote data client. Handlers turn both kinds into a
//! single user-facing reply; neither is retried.

/// Failure fetching or decoding an upstream F1 payload
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// DNS, connect, timeout or non-2xx status
    Transport(String),
    /// Body is not JSON or lacks the expected shape
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "[TRANSPORT] Request to the F1 data API failed: {}", msg),
            FetchError::Decode(msg) => write!(f, "[DECODE] Unexpected F1 data API response: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
