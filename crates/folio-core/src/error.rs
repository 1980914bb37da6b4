//! Error types for the Folio core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while loading configuration and content metadata.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Frontmatter block that could not be deserialized.
    #[error("Invalid {format} frontmatter in {}: {message}", path.display())]
    Frontmatter {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    /// Frontmatter that parsed but lacks a field the site needs.
    #[error("{}: {field} is required", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Layered (file + environment) configuration error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn frontmatter(
        path: impl Into<PathBuf>,
        format: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Frontmatter {
            path: path.into(),
            format,
            message: message.into(),
        }
    }

    pub fn missing_field(path: impl Into<PathBuf>, field: &'static str) -> Self {
        Self::MissingField {
            path: path.into(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_config_error_with_source() {
        let io_err = std::io::Error::other("disk gone");
        let err = CoreError::config_with_source("cannot read config.toml", io_err);
        assert_eq!(err.to_string(), "Configuration error: cannot read config.toml");
        assert!(err.source().is_some());
        assert!(CoreError::config("bad").source().is_none());
    }

    #[test]
    fn test_config_not_found() {
        let err = CoreError::ConfigNotFound(PathBuf::from("site/config.toml"));
        assert_eq!(err.to_string(), "Configuration file not found: site/config.toml");
    }

    #[test]
    fn test_frontmatter_error_names_format() {
        let err = CoreError::frontmatter("content/blog/post.md", "TOML", "expected `=`");
        assert_eq!(
            err.to_string(),
            "Invalid TOML frontmatter in content/blog/post.md: expected `=`"
        );
    }

    #[test]
    fn test_missing_field() {
        let err = CoreError::missing_field("content/works/app.md", "title");
        assert_eq!(err.to_string(), "content/works/app.md: title is required");
    }
}
