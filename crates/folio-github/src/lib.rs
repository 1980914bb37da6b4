//! Folio GitHub Library
//!
//! GitHub permalink parsing, blob fetching, and code embeds, plus the
//! document-tree pass that turns bare permalinks in prose into embeds.

pub mod client;
pub mod embed;
pub mod error;
pub mod language;
pub mod permalink;
pub mod rewrite;

pub use client::{BlobSource, FetchedBlob, GitHubClient};
pub use embed::{CodeBlock, Embedder};
pub use error::{EmbedError, Result};
pub use language::grammar_for;
pub use permalink::{LineRange, Permalink, find_permalink, is_permalink, parse_permalink};
pub use rewrite::rewrite_permalinks;
