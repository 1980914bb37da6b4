//! Rendering permalinks into highlighted code blocks.

use std::sync::Arc;

use folio_parser::{EmbedMap, HighlighterCache, syntax::html_escape};

use crate::{
    client::BlobSource,
    error::Result,
    language::grammar_for,
    permalink::parse_permalink,
};

/// A rendered permalink embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Title reported for the blob.
    pub title: String,

    /// The permalink URL the block links back to.
    pub permalink: String,

    /// Grammar identifier used for highlighting.
    pub grammar: &'static str,

    /// Selected lines joined with `\n`.
    pub text: String,

    /// Highlighted `<pre>` markup.
    pub html: String,
}

impl CodeBlock {
    /// Render the block with a header linking to the permalink.
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                "<div class=\"github-embed\">",
                "<div class=\"github-embed-header\">",
                "<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{title}</a>",
                "</div>",
                "<div class=\"github-embed-body\">{html}</div>",
                "</div>"
            ),
            url = html_escape(&self.permalink),
            title = html_escape(&self.title),
            html = self.html,
        )
    }
}

/// Turns permalinks into [`CodeBlock`]s using a blob source and a shared
/// highlighter cache.
#[derive(Debug)]
pub struct Embedder<S> {
    source: S,
    highlighter: Arc<HighlighterCache>,
}

impl<S: BlobSource> Embedder<S> {
    /// Create an embedder.
    pub fn new(source: S, highlighter: Arc<HighlighterCache>) -> Self {
        Self {
            source,
            highlighter,
        }
    }

    /// The blob source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The highlighter cache.
    pub fn highlighter(&self) -> &Arc<HighlighterCache> {
        &self.highlighter
    }

    /// Fetch and render a permalink.
    ///
    /// The line range defaults are applied after the fetch, since the whole
    /// file range depends on its line count.
    pub async fn render(&self, url: &str) -> Result<CodeBlock> {
        let permalink = parse_permalink(url)?;
        let blob = self.source.fetch(url).await?;

        let text = permalink.range().select(&blob.lines).join("\n");
        let grammar = grammar_for(&blob.language);
        // Fetched source is shown verbatim, so no diff notation.
        let html = self.highlighter.get(grammar).highlight(&text);

        tracing::debug!(
            url,
            language = %blob.language,
            grammar,
            total = blob.lines.len(),
            range = %permalink.range(),
            "rendered permalink"
        );

        Ok(CodeBlock {
            title: blob.title,
            permalink: url.to_string(),
            grammar,
            text,
            html,
        })
    }

    /// Render every permalink in document order, skipping duplicates.
    ///
    /// Stops at the first failure.
    pub async fn render_all<'a>(&self, urls: impl IntoIterator<Item = &'a str>) -> Result<EmbedMap> {
        let mut embeds = EmbedMap::new();
        for url in urls {
            if embeds.contains_key(url) {
                continue;
            }
            let block = self.render(url).await?;
            embeds.insert(url.to_string(), block.to_html());
        }
        Ok(embeds)
    }
}
