// src/error.rs
//! Errors that abort a lookup before any grouping happens

use thiserror::Error;

/// Failure fetching or decoding an upstream CT result set
///
/// Each variant renders as a single message suitable for showing to the user.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network failure talking to the source
    #[error("Failed to fetch certificates from {source_name}: {source}")]
    Request {
        source_name: String,
        #[source]
        source: reqwest::Error,
    },

    /// Source answered with a non-success status
    #[error("{source_name} returned status: {status}")]
    Status { source_name: String, status: u16 },

    /// Response body did not match the expected shape
    #[error("Failed to parse response from {source_name}: {message}")]
    Decode { source_name: String, message: String },
}

impl LookupError {
    pub fn decode(source_name: &str, err: impl std::fmt::Display) -> Self {
        LookupError::Decode {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }
}
