//! Error types for the Mochi Island core.
//!
//! None of these reach the presentation layer: the response provider folds
//! them into fallback replies, and configuration errors are reported once
//! when the island is spawned.

use thiserror::Error;

/// The main error type for mochi-island-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request to the text-generation backend could not be completed.
    #[error("request to text-generation backend failed: {source}")]
    Http {
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("text-generation backend returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the backend.
        body: String,
    },

    /// The backend response could not be decoded.
    #[error("failed to decode backend response: {source}")]
    Decode {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem.
        message: String,
    },
}

impl Error {
    /// Create a new `Api` error from a status code and body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a new `ConfigError` with the given message.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Self::Http { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Decode { source }
    }
}

/// A specialized `Result` type for mochi-island-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::api(503, "overloaded");
        assert_eq!(
            err.to_string(),
            "text-generation backend returned HTTP 503: overloaded"
        );

        let err = Error::config_error("tick period must be non-zero");
        assert!(err.to_string().contains("tick period must be non-zero"));
        assert!(matches!(err, Error::ConfigError { .. }));
    }

    #[test]
    fn test_decode_error_from_serde() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::from(source);
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().starts_with("failed to decode backend response"));
    }
}
