//! Folio Parser Library
//!
//! Markdown parsing into a document tree, HTML rendering and syntax
//! highlighting.

pub mod markdown;
pub mod syntax;
pub mod tree;

use std::path::Path;

use folio_core::content::ContentType;
pub use markdown::{Document, EmbedMap, MarkdownParser};
pub use syntax::{HighlightOptions, Highlighter, HighlighterCache};
use thiserror::Error;
pub use tree::Node;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Markdown parsing error.
    #[error("markdown error: {0}")]
    Markdown(#[from] markdown::MarkdownError),

    /// Unknown file extension.
    #[error("unknown file extension: {0}")]
    UnknownExtension(String),
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

impl MarkdownParser {
    /// Parse a content file, checking its extension first.
    ///
    /// `.md` and `.mdx` are both parsed as Markdown; JSX in MDX is passed
    /// through as raw HTML.
    pub fn parse_file(&self, content: &str, path: &Path) -> Result<Document> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ParserError::UnknownExtension("(none)".to_string()))?;

        match ContentType::from_extension(ext) {
            Some(ContentType::Markdown | ContentType::Mdx) => Ok(self.parse(content, path)?),
            None => Err(ParserError::UnknownExtension(ext.to_string())),
        }
    }
}
