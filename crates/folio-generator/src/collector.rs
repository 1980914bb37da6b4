//! Content collection.
//!
//! Walks the content directory and parses every Markdown source into a
//! document tree. Rendering happens later, after embeds are resolved.

use std::{
    cmp::Ordering,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use folio_core::{ContentPath, ContentType, Page, Section};
use folio_parser::{Document, MarkdownParser};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Parser error.
    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Path outside the recognised content layout.
    #[error("invalid content path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// A parsed content file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Location within the content directory.
    pub path: ContentPath,

    /// Parsed frontmatter and tree.
    pub document: Document,

    /// Full file contents, used for source copies.
    pub source: String,
}

impl SourceDocument {
    /// Whether this document is a draft.
    pub fn is_draft(&self) -> bool {
        self.document.frontmatter.draft
    }
}

/// Rendered pages grouped for listings.
#[derive(Debug, Default)]
pub struct SiteContent {
    /// All pages indexed by URL.
    pub pages: HashMap<String, Page>,

    /// Page URLs per section, newest first.
    pub sections: HashMap<Section, Vec<String>>,
}

impl SiteContent {
    /// Group pages by section and sort each section by date.
    pub fn from_pages(pages: impl IntoIterator<Item = Page>) -> Self {
        let mut content = Self::default();
        for page in pages {
            content
                .sections
                .entry(page.section.clone())
                .or_default()
                .push(page.url.clone());
            content.pages.insert(page.url.clone(), page);
        }

        for urls in content.sections.values_mut() {
            let pages = &content.pages;
            urls.sort_by(|a, b| by_date_desc(&pages[a], &pages[b]));
        }
        content
    }

    /// Pages of a section, newest first.
    pub fn section_pages(&self, section: &Section) -> Vec<&Page> {
        self.sections
            .get(section)
            .map(|urls| urls.iter().filter_map(|u| self.pages.get(u)).collect())
            .unwrap_or_default()
    }
}

/// Newest first; undated pages last, ordered by title.
pub fn by_date_desc(a: &Page, b: &Page) -> Ordering {
    match (&a.date, &b.date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(a_date).then_with(|| a.title.cmp(&b.title)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
}

/// Finds and parses content files.
#[derive(Debug)]
pub struct ContentCollector<'a> {
    parser: &'a MarkdownParser,
    content_dir: PathBuf,
    drafts: bool,
}

impl<'a> ContentCollector<'a> {
    /// Create a collector over `content_dir`.
    pub fn new(parser: &'a MarkdownParser, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            parser,
            content_dir: content_dir.into(),
            drafts: false,
        }
    }

    /// Include drafts.
    #[must_use]
    pub fn with_drafts(mut self, drafts: bool) -> Self {
        self.drafts = drafts;
        self
    }

    /// Parse every content file in parallel.
    ///
    /// Files that fail to parse are logged and skipped.
    pub fn collect(&self) -> Result<Vec<SourceDocument>> {
        info!(dir = %self.content_dir.display(), "collecting content");

        let files = self.find_content_files()?;
        info!(count = files.len(), "found content files");

        let mut documents: Vec<_> = files
            .par_iter()
            .filter_map(|path| match self.parse_file(path) {
                Ok(doc) if doc.is_draft() && !self.drafts => {
                    debug!(slug = %doc.path.slug, "skipping draft");
                    None
                }
                Ok(doc) => Some(doc),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse file");
                    None
                }
            })
            .collect();
        documents.sort_by(|a, b| a.path.slug.cmp(&b.path.slug));

        info!(documents = documents.len(), "content collection complete");
        Ok(documents)
    }

    /// Every content file under the content directory, skipping hidden entries.
    pub fn find_content_files(&self) -> Result<Vec<PathBuf>> {
        if !self.content_dir.exists() {
            warn!(dir = %self.content_dir.display(), "content directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.content_dir)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ContentType::from_extension(&ext.to_string_lossy()).is_some())
            {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    /// Parse a single file.
    pub fn parse_file(&self, path: &Path) -> Result<SourceDocument> {
        debug!(path = %path.display(), "parsing file");

        let source = fs::read_to_string(path)?;
        let relative = path.strip_prefix(&self.content_dir).unwrap_or(path);
        let content_path = ContentPath::from_path(relative)
            .ok_or_else(|| CollectorError::InvalidPath(path.to_path_buf()))?;

        let document = self
            .parser
            .parse_file(&source, path)
            .map_err(|e| CollectorError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(SourceDocument {
            path: content_path,
            document,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn page(url: &str, title: &str, date: Option<&str>) -> Page {
        Page {
            url: url.to_string(),
            section: Section::Blog,
            title: title.to_string(),
            description: None,
            date: date.and_then(folio_core::frontmatter::parse_date),
            draft: false,
            thumbnail: None,
            links: Vec::new(),
            content: String::new(),
            toc: Vec::new(),
            source_path: None,
        }
    }

    #[test]
    fn test_collect() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.md", "---\ntitle: Home\n---\nHi");
        write(dir.path(), "blog/hello.md", "---\ntitle: Hello\ndate: 2024-12-01\n---\nBody");
        write(dir.path(), "works/folio.mdx", "---\ntitle: folio\n---\nWork");
        write(dir.path(), "blog/draft.md", "---\ntitle: Draft\ndraft: true\n---\nWIP");
        write(dir.path(), ".hidden/secret.md", "---\ntitle: Secret\n---\n");
        write(dir.path(), "blog/notes.txt", "ignored");

        let parser = MarkdownParser::default();
        let docs = ContentCollector::new(&parser, dir.path()).collect().unwrap();

        let slugs: Vec<_> = docs.iter().map(|d| d.path.slug.as_str()).collect();
        assert_eq!(slugs, vec!["", "blog/hello", "works/folio"]);
        assert_eq!(docs[1].path.section, Section::Blog);
        assert_eq!(docs[1].document.frontmatter.title, "Hello");
        assert!(docs[1].source.starts_with("---\ntitle: Hello"));
    }

    #[test]
    fn test_collect_with_drafts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/draft.md", "---\ntitle: Draft\ndraft: true\n---\nWIP");

        let parser = MarkdownParser::default();
        let docs = ContentCollector::new(&parser, dir.path())
            .with_drafts(true)
            .collect()
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_draft());
    }

    #[test]
    fn test_missing_content_dir() {
        let dir = TempDir::new().unwrap();
        let parser = MarkdownParser::default();
        let docs = ContentCollector::new(&parser, dir.path().join("content"))
            .collect()
            .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_site_content_sorted_by_date() {
        let content = SiteContent::from_pages([
            page("/blog/old", "Old", Some("2023-01-01")),
            page("/blog/undated", "Undated", None),
            page("/blog/new", "New", Some("2024-12-01")),
        ]);

        let urls: Vec<_> = content
            .section_pages(&Section::Blog)
            .iter()
            .map(|p| p.url.as_str())
            .collect();
        assert_eq!(urls, vec!["/blog/new", "/blog/old", "/blog/undated"]);
        assert!(content.section_pages(&Section::Works).is_empty());
    }
}
