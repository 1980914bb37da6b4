//! Markdown parser using pulldown-cmark.
//!
//! Parsing produces a [`Document`] whose body is a [`Node`] tree, so callers can
//! rewrite the tree (e.g. permalink embeds) before rendering it to HTML.

use std::{collections::HashMap, path::Path, sync::Arc};

use folio_core::{
    content::{ParsedContent, TocEntry},
    frontmatter::{Frontmatter, parse_frontmatter},
};
use pulldown_cmark::{Options, Parser, TextMergeStream};
use thiserror::Error;

use crate::{
    syntax::{HighlightOptions, HighlighterCache, html_escape},
    tree::{Alignment, Node, TreeBuilder, autolink_literals},
};

/// Markdown parsing errors.
#[derive(Debug, Error)]
pub enum MarkdownError {
    /// Failed to parse frontmatter.
    #[error("frontmatter error: {0}")]
    Frontmatter(#[from] folio_core::error::CoreError),
}

/// Result type for markdown operations.
pub type Result<T> = std::result::Result<T, MarkdownError>;

/// Rendered embed fragments keyed by permalink.
pub type EmbedMap = HashMap<String, String>;

/// A parsed Markdown document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Parsed frontmatter metadata.
    pub frontmatter: Frontmatter,

    /// Body tree rooted at [`Node::Root`].
    pub root: Node,

    /// Raw body source without frontmatter.
    pub raw: String,
}

/// Markdown parser with syntax highlighting support.
#[derive(Debug)]
pub struct MarkdownParser {
    highlighter: Arc<HighlighterCache>,
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new(Arc::new(HighlighterCache::default()))
    }
}

impl MarkdownParser {
    /// Create a parser sharing the given highlighter cache.
    pub fn new(highlighter: Arc<HighlighterCache>) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_MATH);

        Self {
            highlighter,
            options,
        }
    }

    /// The shared highlighter cache.
    pub fn highlighter(&self) -> &Arc<HighlighterCache> {
        &self.highlighter
    }

    /// Parse markdown content with frontmatter into a document tree.
    pub fn parse(&self, content: &str, path: &Path) -> Result<Document> {
        let (frontmatter, body) = parse_frontmatter(content, path)?;
        let root = self.parse_body(&body);

        Ok(Document {
            frontmatter,
            root,
            raw: body,
        })
    }

    /// Parse a markdown body (no frontmatter) into a tree.
    ///
    /// Bare URLs become links, as with GFM autolink literals.
    pub fn parse_body(&self, body: &str) -> Node {
        let source = autolink_literals(body, self.options);
        let events = TextMergeStream::new(Parser::new_ext(&source, self.options));
        TreeBuilder::new().build(events)
    }

    /// Render a document, resolving embed nodes through `embeds`.
    pub fn render(&self, document: &Document, embeds: &EmbedMap) -> ParsedContent {
        let (html, toc) = self.render_tree(&document.root, embeds);

        ParsedContent {
            frontmatter: document.frontmatter.clone(),
            html,
            raw: document.raw.clone(),
            toc,
        }
    }

    /// Render a tree to HTML with TOC extraction.
    pub fn render_tree(&self, root: &Node, embeds: &EmbedMap) -> (String, Vec<TocEntry>) {
        let mut writer = HtmlWriter {
            highlighter: &self.highlighter,
            embeds,
            html: String::new(),
            toc: Vec::new(),
            slugs: HashMap::new(),
        };
        writer.node(root);
        (writer.html, writer.toc)
    }

    /// Parse and render a body without embeds.
    pub fn render_body(&self, body: &str) -> (String, Vec<TocEntry>) {
        self.render_tree(&self.parse_body(body), &EmbedMap::new())
    }
}

struct HtmlWriter<'a> {
    highlighter: &'a HighlighterCache,
    embeds: &'a EmbedMap,
    html: String,
    toc: Vec<TocEntry>,
    slugs: HashMap<String, usize>,
}

impl HtmlWriter<'_> {
    fn children(&mut self, children: &[Node]) {
        for child in children {
            self.node(child);
        }
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Root { children } => self.children(children),
            Node::Paragraph { children } => {
                self.html.push_str("<p>");
                self.children(children);
                self.html.push_str("</p>\n");
            }
            Node::Heading {
                level,
                id,
                children,
            } => {
                let text = node.text_content();
                let id = match id {
                    Some(id) => id.clone(),
                    None => self.unique_slug(&text),
                };
                self.toc.push(TocEntry {
                    level: *level,
                    text,
                    id: id.clone(),
                });
                self.html
                    .push_str(&format!("<h{level} id=\"{}\">", html_escape(&id)));
                self.children(children);
                self.html.push_str(&format!("</h{level}>\n"));
            }
            Node::BlockQuote { children } => {
                self.html.push_str("<blockquote>\n");
                self.children(children);
                self.html.push_str("</blockquote>\n");
            }
            Node::List { start, children } => {
                let close = match start {
                    Some(1) => {
                        self.html.push_str("<ol>\n");
                        "</ol>\n"
                    }
                    Some(n) => {
                        self.html.push_str(&format!("<ol start=\"{n}\">\n"));
                        "</ol>\n"
                    }
                    None => {
                        self.html.push_str("<ul>\n");
                        "</ul>\n"
                    }
                };
                self.children(children);
                self.html.push_str(close);
            }
            Node::ListItem { children } => {
                self.html.push_str("<li>");
                self.children(children);
                self.html.push_str("</li>\n");
            }
            Node::TaskListMarker { checked } => {
                self.html.push_str(if *checked {
                    "<input type=\"checkbox\" checked disabled /> "
                } else {
                    "<input type=\"checkbox\" disabled /> "
                });
            }
            Node::Code { lang, meta, value } => {
                self.code_block(lang.as_deref(), meta.as_deref(), value);
            }
            Node::Html { value } => self.html.push_str(value),
            Node::ThematicBreak => self.html.push_str("<hr />\n"),
            Node::Table {
                alignments,
                children,
            } => {
                self.html.push_str("<table>\n");
                for child in children {
                    match child {
                        Node::TableHead { children } => {
                            self.html.push_str("<thead>\n");
                            self.table_row(children, "th", alignments);
                            self.html.push_str("</thead>\n<tbody>\n");
                        }
                        Node::TableRow { children } => self.table_row(children, "td", alignments),
                        other => self.node(other),
                    }
                }
                self.html.push_str("</tbody>\n</table>\n");
            }
            Node::TableHead { children } | Node::TableRow { children } => {
                self.table_row(children, "td", &[]);
            }
            Node::TableCell { children } => self.children(children),
            Node::FootnoteDefinition { label, children } => {
                self.html.push_str(&format!(
                    "<div class=\"footnote\" id=\"fn-{}\">",
                    html_escape(label)
                ));
                self.children(children);
                self.html.push_str("</div>\n");
            }
            Node::FootnoteReference { label } => {
                let label = html_escape(label);
                self.html.push_str(&format!(
                    "<sup class=\"footnote-ref\"><a href=\"#fn-{label}\">[{label}]</a></sup>"
                ));
            }
            Node::Text { value } => self.html.push_str(&html_escape(value)),
            Node::Emphasis { children } => self.wrap("em", children),
            Node::Strong { children } => self.wrap("strong", children),
            Node::Delete { children } => self.wrap("del", children),
            Node::InlineCode { value } => {
                self.html
                    .push_str(&format!("<code>{}</code>", html_escape(value)));
            }
            Node::InlineMath { value } => {
                self.html.push_str(&format!(
                    "<span class=\"math inline\">\\({}\\)</span>",
                    html_escape(value)
                ));
            }
            Node::DisplayMath { value } => {
                self.html.push_str(&format!(
                    "<div class=\"math display\">\\[{}\\]</div>",
                    html_escape(value)
                ));
            }
            // Soft breaks become line breaks, like remark-breaks.
            Node::Break | Node::SoftBreak => self.html.push_str("<br />\n"),
            Node::Link {
                url,
                title,
                children,
            } => {
                self.html.push_str(&format!("<a href=\"{}\"", html_escape(url)));
                if !title.is_empty() {
                    self.html
                        .push_str(&format!(" title=\"{}\"", html_escape(title)));
                }
                if is_external(url) {
                    self.html
                        .push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
                }
                self.html.push('>');
                self.children(children);
                self.html.push_str("</a>");
            }
            Node::Image { url, title, alt } => {
                self.html.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\"",
                    html_escape(url),
                    html_escape(alt)
                ));
                if !title.is_empty() {
                    self.html
                        .push_str(&format!(" title=\"{}\"", html_escape(title)));
                }
                self.html.push_str(" loading=\"lazy\" />");
            }
            Node::Embed { permalink } => match self.embeds.get(permalink) {
                Some(fragment) => {
                    self.html.push_str(fragment);
                    self.html.push('\n');
                }
                None => {
                    tracing::debug!(permalink, "embed not resolved, rendering as link");
                    let escaped = html_escape(permalink);
                    self.html.push_str(&format!(
                        "<p><a href=\"{escaped}\" target=\"_blank\" rel=\"noopener noreferrer\">{escaped}</a></p>\n"
                    ));
                }
            },
        }
    }

    fn wrap(&mut self, tag: &str, children: &[Node]) {
        self.html.push_str(&format!("<{tag}>"));
        self.children(children);
        self.html.push_str(&format!("</{tag}>"));
    }

    fn table_row(&mut self, cells: &[Node], tag: &str, alignments: &[Alignment]) {
        self.html.push_str("<tr>");
        for (column, cell) in cells.iter().enumerate() {
            let style = match alignments.get(column) {
                Some(Alignment::Left) => " style=\"text-align: left\"",
                Some(Alignment::Center) => " style=\"text-align: center\"",
                Some(Alignment::Right) => " style=\"text-align: right\"",
                _ => "",
            };
            self.html.push_str(&format!("<{tag}{style}>"));
            match cell {
                Node::TableCell { children } => self.children(children),
                other => self.node(other),
            }
            self.html.push_str(&format!("</{tag}>"));
        }
        self.html.push_str("</tr>\n");
    }

    fn code_block(&mut self, lang: Option<&str>, meta: Option<&str>, value: &str) {
        let options = HighlightOptions { diff: true };
        let highlighted = self.highlighter.highlight_with(value, lang, options);
        let title = meta.map(parse_meta_string).and_then(|mut m| m.remove("title"));

        match title {
            Some(title) => {
                self.html.push_str(&format!(
                    "<figure class=\"code-figure\"><figcaption>{}</figcaption>{highlighted}</figure>\n",
                    html_escape(&title)
                ));
            }
            None => {
                self.html.push_str(&highlighted);
                self.html.push('\n');
            }
        }
    }

    fn unique_slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.slugs.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}

/// Whether a link target leaves the site.
pub fn is_external(url: &str) -> bool {
    !(url.starts_with('/') || url.starts_with('#') || url.starts_with('.'))
        && url.contains(':')
}

/// Parse `key="value"` pairs from a code block meta string.
pub fn parse_meta_string(meta: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let mut rest = meta;
    while let Some(eq) = rest.find("=\"") {
        let key = rest[..eq]
            .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default();
        let after = &rest[eq + 2..];
        let Some(close) = after.find('"') else {
            break;
        };
        if !key.is_empty() {
            out.insert(key.to_string(), after[..close].to_string());
        }
        rest = &after[close + 1..];
    }
    out
}

/// Convert text to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MarkdownParser {
        MarkdownParser::default()
    }

    #[test]
    fn test_parse_simple_markdown() {
        let content = r#"---
title: "Test Post"
---

# Hello World

This is a test."#;

        let parser = parser();
        let doc = parser.parse(content, Path::new("test.md")).unwrap();
        let result = parser.render(&doc, &EmbedMap::new());

        assert_eq!(result.frontmatter.title, "Test Post");
        assert!(result.html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(result.html.contains("<p>This is a test.</p>"));
        assert_eq!(result.raw, "# Hello World\n\nThis is a test.");
    }

    #[test]
    fn test_parse_code_block() {
        let (html, _) = parser().render_body("```rust\nfn main() {}\n```");

        assert!(html.contains("<code class=\"code-block\" data-lang=\"rust\">"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_code_block_title_caption() {
        let (html, _) = parser().render_body("```ts title=\"app/main.ts\"\nconst a = 1;\n```");

        assert!(html.starts_with("<figure class=\"code-figure\"><figcaption>app/main.ts</figcaption>"));
    }

    #[test]
    fn test_code_block_diff_notation() {
        let parser = MarkdownParser::default();
        let (html, _) = parser.render_body("```rust\nlet a = 1; // [!code --]\nlet a = 2; // [!code ++]\n```");

        assert!(html.contains("has-diff"));
        assert!(html.contains("<span class=\"line diff add\">"));
        assert!(!html.contains("[!code"));
    }

    #[test]
    fn test_toc_extraction_with_unique_ids() {
        let (html, toc) = parser().render_body("# Intro\n## Setup\n## Setup\n### `cargo` usage");

        assert_eq!(toc.len(), 4);
        assert_eq!(toc[0].level, 1);
        assert_eq!(toc[1].id, "setup");
        assert_eq!(toc[2].id, "setup-1");
        assert_eq!(toc[3].text, "cargo usage");
        assert!(html.contains("<h2 id=\"setup-1\">Setup</h2>"));
    }

    #[test]
    fn test_explicit_heading_id() {
        let (html, toc) = parser().render_body("## Custom {#my-id}");

        assert_eq!(toc[0].id, "my-id");
        assert!(html.contains("<h2 id=\"my-id\">"));
    }

    #[test]
    fn test_soft_break_renders_br() {
        let (html, _) = parser().render_body("line one\nline two");
        assert_eq!(html, "<p>line one<br />\nline two</p>\n");
    }

    #[test]
    fn test_external_links_open_new_tab() {
        let (html, _) = parser().render_body("[ext](https://example.com) [int](/blog)");

        assert!(html.contains(
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">ext</a>"
        ));
        assert!(html.contains("<a href=\"/blog\">int</a>"));
    }

    #[test]
    fn test_bare_url_is_linked() {
        let (html, _) = parser().render_body("visit https://example.com today");
        assert!(html.contains("<a href=\"https://example.com\""));
    }

    #[test]
    fn test_embed_rendering() {
        let url = "https://github.com/o/r/blob/c/p.rs";
        let root = Node::Root {
            children: vec![Node::Embed {
                permalink: url.to_string(),
            }],
        };
        let mut embeds = EmbedMap::new();
        embeds.insert(url.to_string(), "<div class=\"embed\"></div>".to_string());

        let (resolved, _) = parser().render_tree(&root, &embeds);
        let (unresolved, _) = parser().render_tree(&root, &EmbedMap::new());

        assert_eq!(resolved, "<div class=\"embed\"></div>\n");
        assert!(unresolved.contains(&format!("<a href=\"{url}\"")));
    }

    #[test]
    fn test_table_rendering() {
        let (html, _) = parser().render_body(
            r#"| Header 1 | Header 2 |
|:---------|---------:|
| Cell 1   | Cell 2   |"#,
        );

        assert!(html.contains("<table>"));
        assert!(html.contains("<thead>"));
        assert!(html.contains("<th style=\"text-align: left\">Header 1</th>"));
        assert!(html.contains("<td style=\"text-align: right\">Cell 2</td>"));
    }

    #[test]
    fn test_task_list() {
        let (html, _) = parser().render_body("- [x] Done\n- [ ] Not done");

        assert!(html.contains("checkbox"));
        assert!(html.contains("checked"));
    }

    #[test]
    fn test_no_frontmatter() {
        let parser = parser();
        let doc = parser
            .parse("# Just Content\n\nNo frontmatter here.", Path::new("test.md"))
            .unwrap();

        assert!(doc.frontmatter.title.is_empty());
        assert_eq!(doc.root.kind(), "root");
    }

    #[test]
    fn test_parse_meta_string() {
        let meta = parse_meta_string(r#"title="main.rs" {1,3} showLineNumbers lang="rs""#);

        assert_eq!(meta.get("title").map(String::as_str), Some("main.rs"));
        assert_eq!(meta.get("lang").map(String::as_str), Some("rs"));
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test 123 Post"), "test-123-post");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("Special!@#Chars"), "specialchars");
        assert_eq!(slugify("はじめに"), "はじめに");
    }

    #[test]
    fn test_is_external() {
        assert!(is_external("https://github.com"));
        assert!(is_external("mailto:me@example.com"));
        assert!(!is_external("/works"));
        assert!(!is_external("#top"));
        assert!(!is_external("./image.png"));
    }
}
