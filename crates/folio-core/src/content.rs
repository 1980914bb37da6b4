//! Content types and structures.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::frontmatter::Frontmatter;

/// Type of content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Markdown content (.md files).
    Markdown,
    /// MDX content (.mdx files), rendered as Markdown.
    Mdx,
}

impl ContentType {
    /// Determine content type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "mdx" => Some(Self::Mdx),
            _ => None,
        }
    }

    /// Get the file extension for this content type.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Mdx => "mdx",
        }
    }
}

/// Top-level site section a page belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// The home page (`index.md` at the content root).
    Home,
    /// Blog articles under `blog/`.
    Blog,
    /// Portfolio entries under `works/`.
    Works,
    /// Any other standalone page.
    Page,
}

impl Section {
    /// Section for the first component of a content-relative path.
    pub fn from_dir(dir: &str) -> Self {
        match dir {
            "blog" => Self::Blog,
            "works" => Self::Works,
            _ => Self::Page,
        }
    }

    /// URL prefix of the section listing, if the section has one.
    pub fn listing_url(&self) -> Option<&'static str> {
        match self {
            Self::Blog => Some("/blog"),
            Self::Works => Some("/works"),
            Self::Home | Self::Page => None,
        }
    }
}

/// Parsed content path with section and slug extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath {
    /// Path relative to the content directory.
    pub path: PathBuf,

    /// Section derived from the first path component.
    pub section: Section,

    /// URL slug derived from the path, without leading slash.
    pub slug: String,

    /// Content type based on extension.
    pub content_type: ContentType,
}

impl ContentPath {
    /// Parse a content-relative path.
    ///
    /// - `index.md` → home, slug ""
    /// - `blog/hello.mdx` → blog, slug "blog/hello"
    /// - `blog/hello/index.md` → blog, slug "blog/hello"
    /// - `about.md` → page, slug "about"
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        let content_type = ContentType::from_extension(extension)?;
        let stem = path.file_stem()?.to_str()?;

        let parent = path.parent().unwrap_or(Path::new(""));
        let slug = if stem == "index" {
            parent.to_string_lossy().to_string()
        } else if parent.as_os_str().is_empty() {
            stem.to_string()
        } else {
            format!("{}/{}", parent.display(), stem)
        };
        let slug = slug.replace('\\', "/").trim_matches('/').to_string();

        let section = match slug.split_once('/') {
            _ if slug.is_empty() => Section::Home,
            Some((dir, _)) => Section::from_dir(dir),
            None => Section::Page,
        };

        Some(Self {
            path: path.to_path_buf(),
            section,
            slug,
            content_type,
        })
    }

    /// Get the URL path for this content.
    pub fn url_path(&self) -> String {
        format!("/{}", self.slug)
    }

    /// Last slug segment, used as the file name of the source copy.
    pub fn basename(&self) -> &str {
        self.slug.rsplit('/').next().unwrap_or(&self.slug)
    }
}

/// Parsed content with metadata and rendered HTML.
#[derive(Debug, Clone)]
pub struct ParsedContent {
    /// Parsed frontmatter metadata.
    pub frontmatter: Frontmatter,

    /// Rendered HTML content.
    pub html: String,

    /// Raw source content (without frontmatter).
    pub raw: String,

    /// Table of contents extracted from headings.
    pub toc: Vec<TocEntry>,
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text.
    pub text: String,

    /// Anchor ID for linking.
    pub id: String,
}

/// A fully processed page ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// URL path for this page.
    pub url: String,

    /// Section this page belongs to.
    pub section: Section,

    /// Page title.
    pub title: String,

    /// Page description/summary.
    #[serde(default)]
    pub description: Option<String>,

    /// Publication date.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// Whether this is a draft.
    #[serde(default)]
    pub draft: bool,

    /// Thumbnail image for listings.
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Related links from frontmatter.
    #[serde(default)]
    pub links: Vec<String>,

    /// Rendered HTML content.
    pub content: String,

    /// Table of contents.
    #[serde(default)]
    pub toc: Vec<TocEntry>,

    /// Source file path, relative to the content directory.
    #[serde(default)]
    pub source_path: Option<PathBuf>,
}

impl Page {
    /// Create a new page from parsed content and content path.
    pub fn from_parsed(content: ParsedContent, content_path: &ContentPath) -> Self {
        let fm = content.frontmatter;

        Self {
            url: content_path.url_path(),
            section: content_path.section.clone(),
            title: fm.title,
            description: fm.description,
            date: fm.date,
            draft: fm.draft,
            thumbnail: fm.thumbnail,
            links: fm.links,
            content: content.html,
            toc: content.toc,
            source_path: Some(content_path.path.clone()),
        }
    }

    /// Date formatted for listings, e.g. `2024/12/01`.
    pub fn display_date(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y/%m/%d").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(title: &str) -> ParsedContent {
        ParsedContent {
            frontmatter: Frontmatter {
                title: title.to_string(),
                date: crate::frontmatter::parse_date("2024-12-01"),
                ..Frontmatter::default()
            },
            html: "<p>Body</p>".to_string(),
            raw: "Body".to_string(),
            toc: Vec::new(),
        }
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(
            ContentType::from_extension("md"),
            Some(ContentType::Markdown)
        );
        assert_eq!(
            ContentType::from_extension("MD"),
            Some(ContentType::Markdown)
        );
        assert_eq!(ContentType::from_extension("mdx"), Some(ContentType::Mdx));
        assert_eq!(ContentType::from_extension("txt"), None);
    }

    #[test]
    fn test_content_path_home() {
        let cp = ContentPath::from_path(Path::new("index.md")).expect("parse path");

        assert_eq!(cp.section, Section::Home);
        assert_eq!(cp.slug, "");
        assert_eq!(cp.url_path(), "/");
    }

    #[test]
    fn test_content_path_blog() {
        let cp = ContentPath::from_path(Path::new("blog/hello.mdx")).expect("parse path");

        assert_eq!(cp.section, Section::Blog);
        assert_eq!(cp.slug, "blog/hello");
        assert_eq!(cp.content_type, ContentType::Mdx);
        assert_eq!(cp.url_path(), "/blog/hello");
        assert_eq!(cp.basename(), "hello");
    }

    #[test]
    fn test_content_path_index_in_directory() {
        let cp = ContentPath::from_path(Path::new("works/site/index.md")).expect("parse path");

        assert_eq!(cp.section, Section::Works);
        assert_eq!(cp.slug, "works/site");
    }

    #[test]
    fn test_content_path_standalone_page() {
        let cp = ContentPath::from_path(Path::new("about.md")).expect("parse path");

        assert_eq!(cp.section, Section::Page);
        assert_eq!(cp.slug, "about");
    }

    #[test]
    fn test_content_path_rejects_other_files() {
        assert!(ContentPath::from_path(Path::new("blog/cover.png")).is_none());
    }

    #[test]
    fn test_section_listing_url() {
        assert_eq!(Section::Blog.listing_url(), Some("/blog"));
        assert_eq!(Section::Works.listing_url(), Some("/works"));
        assert_eq!(Section::Home.listing_url(), None);
    }

    #[test]
    fn test_page_from_parsed() {
        let cp = ContentPath::from_path(Path::new("blog/hello.md")).expect("parse path");
        let page = Page::from_parsed(parsed("Hello"), &cp);

        assert_eq!(page.url, "/blog/hello");
        assert_eq!(page.section, Section::Blog);
        assert_eq!(page.title, "Hello");
        assert_eq!(page.content, "<p>Body</p>");
        assert_eq!(page.display_date().as_deref(), Some("2024/12/01"));
        assert_eq!(page.source_path.as_deref(), Some(Path::new("blog/hello.md")));
    }
}
