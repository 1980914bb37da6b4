//! HTML page generation.
//!
//! Pages are rendered into a section-specific inner template and then wrapped
//! in the `base` layout, which carries the head metadata, navigation and
//! footer.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use folio_core::{Config, Page, Section, content::TocEntry};
use folio_parser::syntax::html_escape;
use thiserror::Error;
use tracing::debug;

use crate::template::{TemplateContext, TemplateError, TemplateRegistry};

/// HTML generation errors.
#[derive(Debug, Error)]
pub enum HtmlError {
    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Invalid page data.
    #[error("invalid page {url}: {message}")]
    InvalidPage { url: String, message: String },
}

/// Result type for HTML generation.
pub type Result<T> = std::result::Result<T, HtmlError>;

/// Navigation entries as `(label, href)`.
const NAVIGATION: [(&str, &str); 3] = [("Home", "/"), ("Works", "/works"), ("Blog", "/blog")];

/// HTML page generator.
#[derive(Debug)]
pub struct HtmlGenerator {
    templates: TemplateRegistry,
    config: Config,
    csp: String,
    head: String,
}

impl HtmlGenerator {
    /// Create a generator with the built-in templates.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            templates: TemplateRegistry::new(),
            config,
            csp: String::new(),
            head: String::new(),
        }
    }

    /// Use a custom template registry.
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    /// Content-Security-Policy meta tag, placed first in `<head>`.
    #[must_use]
    pub fn with_csp(mut self, meta: impl Into<String>) -> Self {
        self.csp = meta.into();
        self
    }

    /// Script tags placed at the end of every `<head>`.
    #[must_use]
    pub fn with_head(mut self, head: impl Into<String>) -> Self {
        self.head = head.into();
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render a content page.
    pub fn generate_page(&self, page: &Page) -> Result<String> {
        debug!(url = %page.url, section = ?page.section, "generating page");

        if page.section != Section::Home && page.title.is_empty() {
            return Err(HtmlError::InvalidPage {
                url: page.url.clone(),
                message: "missing title".to_string(),
            });
        }

        let mut ctx = TemplateContext::new().with("content", page.content.as_str());
        ctx.insert_text("page_title", &page.title);

        let template = match page.section {
            Section::Blog => {
                if let Some(date) = page.date {
                    ctx.insert(
                        "date",
                        format!(
                            r#"<time datetime="{}">{}</time>"#,
                            date.format("%Y-%m-%d"),
                            date.format("%Y/%m/%d")
                        ),
                    );
                }
                if let Some(toc) = toc_html(&page.toc) {
                    ctx.insert("toc", toc);
                }
                "article"
            }
            Section::Works => {
                if let Some(description) = page.description.as_deref() {
                    ctx.insert("summary", format!("<p>{}</p>", html_escape(description)));
                }
                if !page.links.is_empty() {
                    ctx.insert("links", links_html(&page.links));
                }
                if let Some(thumbnail) = page.thumbnail.as_deref() {
                    ctx.insert(
                        "thumbnail",
                        format!(
                            r#"<img src="{}" alt="{}">"#,
                            html_escape(thumbnail),
                            html_escape(&page.title)
                        ),
                    );
                }
                "work"
            }
            Section::Home | Section::Page => {
                if !page.title.is_empty() {
                    ctx.insert("heading", format!("<h1>{}</h1>", html_escape(&page.title)));
                }
                "page"
            }
        };

        let inner = self.templates.render(template, &ctx)?;
        let title = match page.section {
            Section::Home => None,
            _ => Some(page.title.as_str()),
        };
        self.wrap(&page.url, title, page.description.as_deref(), &inner)
    }

    /// Render the listing for a section. `pages` should already be sorted.
    pub fn generate_listing(&self, section: &Section, pages: &[&Page]) -> Result<String> {
        let Some(url) = section.listing_url() else {
            return Err(HtmlError::InvalidPage {
                url: format!("{section:?}"),
                message: "section has no listing".to_string(),
            });
        };
        let heading = match section {
            Section::Works => "Works",
            _ => "Blog",
        };
        debug!(url, count = pages.len(), "generating listing");

        let items: String = pages.iter().map(|page| list_item_html(page)).collect();
        let ctx = TemplateContext::new()
            .with("heading", heading)
            .with("class", format!("{}-list", heading.to_lowercase()))
            .with("items", items);
        let inner = self.templates.render("listing", &ctx)?;

        self.wrap(url, Some(heading), None, &inner)
    }

    fn wrap(
        &self,
        url: &str,
        title: Option<&str>,
        description: Option<&str>,
        inner: &str,
    ) -> Result<String> {
        let site = &self.config.site;
        let mut ctx = TemplateContext::new()
            .with("content", inner)
            .with("nav", nav_html(url))
            .with("og_locale", og_locale(&site.lang))
            .with("year", Utc::now().year().to_string())
            .with("csp", self.csp.as_str())
            .with("head_scripts", self.head.as_str());

        ctx.insert_text("lang", &site.lang);
        ctx.insert_text("title", &self.config.page_title(title));
        ctx.insert_text("site_title", &site.title);
        ctx.insert_text("canonical_url", &self.config.url_for(url));

        if let Some(description) = description.or(site.description.as_deref()) {
            ctx.insert_text("description", description);
        }
        if let Some(author) = site.author.as_deref() {
            ctx.insert_text("author", author);
        }
        if let Some(image) = site.image.as_deref() {
            ctx.insert(
                "og_image",
                format!(r#"<meta property="og:image" content="{}">"#, html_escape(image)),
            );
        }
        if let Some(handle) = site.twitter.as_deref() {
            let handle = html_escape(handle);
            ctx.insert(
                "twitter",
                format!(
                    "<meta name=\"twitter:site\" content=\"{handle}\">\n<meta name=\"twitter:creator\" content=\"{handle}\">"
                ),
            );
        }
        if !site.socials.is_empty() {
            ctx.insert(
                "socials",
                site.socials
                    .iter()
                    .map(|s| {
                        format!(
                            r#"<li><a href="{}" target="_blank" rel="noopener noreferrer" aria-label="{label}">{label}</a></li>"#,
                            html_escape(&s.url),
                            label = html_escape(&s.label),
                        )
                    })
                    .collect::<String>(),
            );
        }

        Ok(self.templates.render("base", &ctx)?)
    }

    /// Output file for a URL path: `/blog/hello` → `<out>/blog/hello/index.html`.
    #[must_use]
    pub fn output_path(url: &str, output_dir: &Path) -> PathBuf {
        let relative = url.trim_matches('/');
        if relative.is_empty() {
            output_dir.join("index.html")
        } else {
            output_dir.join(relative).join("index.html")
        }
    }
}

/// Navigation items, marking the exact current path.
pub fn nav_html(current: &str) -> String {
    NAVIGATION
        .iter()
        .map(|(label, href)| {
            let current_attr = if *href == current {
                r#" aria-current="page""#
            } else {
                ""
            };
            format!(r#"<li><a href="{href}"{current_attr}>{label}</a></li>"#)
        })
        .collect()
}

/// Listing entry for a page, shaped by its section.
pub fn list_item_html(page: &Page) -> String {
    let url = html_escape(&page.url);
    let title = html_escape(&page.title);

    match page.section {
        Section::Works => {
            let thumbnail = page
                .thumbnail
                .as_deref()
                .map(|src| format!(r#"<img src="{}" alt="{title}">"#, html_escape(src)))
                .unwrap_or_default();
            let description = page
                .description
                .as_deref()
                .map(|d| format!("<p>{}</p>", html_escape(d)))
                .unwrap_or_default();
            format!(r#"<li><a href="{url}">{thumbnail}<h2>{title}</h2>{description}</a></li>"#)
        }
        _ => {
            let date = page
                .date
                .map(|d| {
                    format!(
                        r#"<time datetime="{}">{}</time>"#,
                        d.format("%Y-%m-%d"),
                        d.format("%Y/%m/%d")
                    )
                })
                .unwrap_or_default();
            format!(r#"<li><a href="{url}"><h2>{title}</h2>{date}</a></li>"#)
        }
    }
}

fn links_html(links: &[String]) -> String {
    let items: String = links
        .iter()
        .map(|link| {
            let link = html_escape(link);
            format!(r#"<li><a href="{link}" target="_blank" rel="noopener noreferrer">{link}</a></li>"#)
        })
        .collect();
    format!(r#"<ul class="links">{items}</ul>"#)
}

fn toc_html(toc: &[TocEntry]) -> Option<String> {
    if toc.is_empty() {
        return None;
    }
    let items: String = toc
        .iter()
        .map(|entry| {
            format!(
                r##"<li class="toc-h{}"><a href="#{}">{}</a></li>"##,
                entry.level,
                entry.id,
                html_escape(&entry.text)
            )
        })
        .collect();
    Some(format!(r#"<nav class="toc"><ul>{items}</ul></nav>"#))
}

/// Open Graph locale for a language code, e.g. `ja` → `ja_JP`.
pub fn og_locale(lang: &str) -> String {
    match lang {
        "ja" => "ja_JP".to_string(),
        "en" => "en_US".to_string(),
        other => other.replace('-', "_"),
    }
}
