//! Error types for permalink embeds.

use thiserror::Error;

/// Errors raised while parsing, fetching or rendering a permalink embed.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The URL is not a GitHub permalink.
    #[error("invalid permalink: {url}")]
    InvalidPermalink { url: String },

    /// Transport failure or non-success status.
    #[error("failed to fetch permalink {url}: {message}")]
    Fetch { url: String, message: String },

    /// The response body does not have the expected shape.
    #[error("failed to parse permalink response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl EmbedError {
    /// Create an invalid permalink error.
    pub fn invalid_permalink(url: impl Into<String>) -> Self {
        Self::InvalidPermalink { url: url.into() }
    }

    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using [`EmbedError`].
pub type Result<T> = std::result::Result<T, EmbedError>;
