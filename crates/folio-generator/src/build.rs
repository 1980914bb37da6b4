//! Build orchestration.
//!
//! A build cleans the output directory, copies assets, parses content,
//! resolves GitHub permalink embeds, renders pages in parallel and writes
//! section listings and source copies.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use folio_core::{Config, Page, Section};
use folio_github::{BlobSource, EmbedError, Embedder, GitHubClient, rewrite_permalinks};
use folio_parser::{Document, EmbedMap, HighlighterCache, MarkdownParser};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    assets::{AssetError, AssetManifest, AssetProcessor, ScriptLoader},
    collector::{CollectorError, ContentCollector, SiteContent, SourceDocument},
    csp::ContentSecurityPolicy,
    html::{HtmlError, HtmlGenerator},
};

/// Name of the manifest written to the output directory.
pub const MANIFEST_FILE: &str = "asset-manifest.json";

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector error.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// HTML generation error.
    #[error("HTML error: {0}")]
    Html(#[from] HtmlError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Embed error.
    #[error("embed error: {0}")]
    Embed(#[from] EmbedError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Content pages written.
    pub pages: usize,

    /// Section listings written.
    pub listings: usize,

    /// Permalink embeds rendered.
    pub embeds: usize,

    /// Pages skipped because an embed or render failed.
    pub skipped: usize,

    /// Assets copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder.
#[derive(Debug)]
pub struct Builder<S = GitHubClient> {
    config: Config,
    content_dir: PathBuf,
    output_dir: PathBuf,
    static_dir: Option<PathBuf>,
    parser: MarkdownParser,
    embedder: Embedder<S>,
}

impl Builder<GitHubClient> {
    /// Builder fetching permalinks from github.com.
    pub fn new(
        config: Config,
        content_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let client = GitHubClient::from_config(&config.github)?;
        Ok(Self::with_source(config, content_dir, output_dir, client))
    }
}

impl<S: BlobSource> Builder<S> {
    /// Builder fetching permalinks from `source`.
    pub fn with_source(
        config: Config,
        content_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        source: S,
    ) -> Self {
        let highlighter = Arc::new(HighlighterCache::new(&config.build.syntax_theme));
        Self {
            parser: MarkdownParser::new(Arc::clone(&highlighter)),
            embedder: Embedder::new(source, highlighter),
            config,
            content_dir: content_dir.into(),
            output_dir: output_dir.into(),
            static_dir: None,
        }
    }

    /// Set the static assets directory.
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parser(&self) -> &MarkdownParser {
        &self.parser
    }

    pub fn embedder(&self) -> &Embedder<S> {
        &self.embedder
    }

    /// Collector over the content directory honouring the drafts setting.
    pub fn collector(&self) -> ContentCollector<'_> {
        ContentCollector::new(&self.parser, &self.content_dir).with_drafts(self.config.build.drafts)
    }

    /// Execute the full build.
    pub async fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();
        let production = self.config.build.production;

        info!(
            content = %self.content_dir.display(),
            output = %self.output_dir.display(),
            production,
            "starting build"
        );

        self.clean_output()?;

        let manifest = self.process_assets()?;
        stats.assets = manifest.len();

        let generator = self.html_generator(&manifest)?;

        let documents = self.collector().collect()?;
        let mut resolved = Vec::with_capacity(documents.len());
        for mut doc in documents {
            match self.resolve_embeds(&mut doc.document).await {
                Ok(embeds) => {
                    stats.embeds += embeds.len();
                    resolved.push((doc, embeds));
                }
                Err(e) => {
                    warn!(slug = %doc.path.slug, error = %e, "skipping page with unresolved embed");
                    stats.skipped += 1;
                }
            }
        }

        let parser = &self.parser;
        let pages: Vec<Page> = resolved
            .par_iter()
            .map(|(doc, embeds)| render_page(parser, doc, embeds))
            .collect();

        let written: Vec<bool> = pages
            .par_iter()
            .map(|page| match self.write_page(&generator, page) {
                Ok(()) => true,
                Err(e) => {
                    warn!(url = %page.url, error = %e, "failed to write page");
                    false
                }
            })
            .collect();
        stats.pages = written.iter().filter(|ok| **ok).count();
        stats.skipped += written.len() - stats.pages;

        if self.config.build.copy_sources {
            for (doc, _) in &resolved {
                self.copy_source(doc)?;
            }
        }

        let content = SiteContent::from_pages(pages);
        for section in [Section::Blog, Section::Works] {
            self.write_listing(&generator, &content, &section)?;
            stats.listings += 1;
        }

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            pages = stats.pages,
            listings = stats.listings,
            embeds = stats.embeds,
            skipped = stats.skipped,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Rewrite bare permalinks in `document` and render every embed it
    /// references.
    ///
    /// Does nothing when embeds are disabled.
    pub async fn resolve_embeds(
        &self,
        document: &mut Document,
    ) -> std::result::Result<EmbedMap, EmbedError> {
        if !self.config.github.embeds {
            return Ok(EmbedMap::new());
        }

        let rewritten = rewrite_permalinks(&mut document.root);
        if rewritten > 0 {
            debug!(rewritten, "rewrote permalink paragraphs");
        }
        self.embedder.render_all(document.root.embeds()).await
    }

    fn clean_output(&self) -> Result<()> {
        if self.output_dir.exists() {
            debug!(dir = %self.output_dir.display(), "cleaning output directory");
            fs::remove_dir_all(&self.output_dir)?;
        }
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    fn process_assets(&self) -> Result<AssetManifest> {
        let Some(static_dir) = &self.static_dir else {
            return Ok(AssetManifest::new());
        };

        let processor = AssetProcessor::new(self.config.build.fingerprint);
        let manifest = processor.process(static_dir, &self.output_dir)?;
        fs::write(self.output_dir.join(MANIFEST_FILE), manifest.to_json()?)?;
        Ok(manifest)
    }

    /// Page generator carrying the CSP meta tag and script tags shared by
    /// every page.
    fn html_generator(&self, manifest: &AssetManifest) -> Result<HtmlGenerator> {
        let production = self.config.build.production;
        let loader = ScriptLoader::new(manifest, &self.output_dir, production);
        let mut csp = ContentSecurityPolicy::from_config(&self.config.csp);
        let mut head = Vec::new();

        for src in &self.config.csp.inline_scripts {
            if production {
                if let Some(contents) = loader.inline_contents(src)? {
                    csp.allow_inline_script(&contents);
                    head.push(format!("<script>{contents}</script>"));
                }
            } else {
                head.push(loader.inline_script(src)?);
            }
        }
        head.extend(
            self.config
                .build
                .scripts
                .iter()
                .map(|src| loader.script_tag(src, true))
                .filter(|tag| !tag.is_empty()),
        );

        Ok(HtmlGenerator::new(self.config.clone())
            .with_csp(csp.to_meta(production))
            .with_head(head.join("\n")))
    }

    fn write_page(&self, generator: &HtmlGenerator, page: &Page) -> Result<()> {
        let html = generator.generate_page(page)?;
        write_file(&HtmlGenerator::output_path(&page.url, &self.output_dir), &html)
    }

    fn write_listing(
        &self,
        generator: &HtmlGenerator,
        content: &SiteContent,
        section: &Section,
    ) -> Result<()> {
        let pages = content.section_pages(section);
        let html = generator.generate_listing(section, &pages)?;
        let url = section.listing_url().unwrap_or("/");
        write_file(&HtmlGenerator::output_path(url, &self.output_dir), &html)
    }

    fn copy_source(&self, doc: &SourceDocument) -> Result<()> {
        let name = if doc.path.slug.is_empty() {
            "index.md".to_string()
        } else {
            format!("{}.md", doc.path.slug)
        };
        write_file(&self.output_dir.join(name), &doc.source)
    }
}

fn render_page(parser: &MarkdownParser, doc: &SourceDocument, embeds: &EmbedMap) -> Page {
    Page::from_parsed(parser.render(&doc.document, embeds), &doc.path)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}
