//! Error types for building the service adapters

use thiserror::Error;

/// Errors that can occur while assembling the client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A service base URL could not be parsed
    #[error("Invalid URL in {var}: {value} ({source})")]
    InvalidUrl {
        /// Variable or field the value came from
        var: &'static str,
        /// Offending value
        value: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// A service base URL cannot carry path segments
    #[error("URL in {var} cannot be used as a service base: {value}")]
    NotABase {
        /// Variable or field the value came from
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// The page size is not a positive integer
    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),

    /// The HTTP client could not be constructed
    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}
