//! Check command - validate configuration, content and embeds

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use folio_core::{Config, Section};
use folio_generator::{Builder, collector::SourceDocument};
use folio_github::BlobSource;

use super::{CONTENT_DIR, STATIC_DIR, load_config, site_builder};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
pub async fn run(config_path: &Path, strict: bool, offline: bool) -> Result<()> {
    tracing::info!(?config_path, strict, offline, "Checking configuration and content");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = match load_config(config_path) {
        Ok(config) => {
            println!("  ✓ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ✗ Configuration invalid: {e:#}");
            bail!("Validation failed: {e:#}");
        }
    };
    check_config_values(&config, &mut result);

    let output = Path::new(&config.build.output_dir).to_path_buf();
    let builder = site_builder(config, &output)?;

    println!("\nChecking content files...");
    if Path::new(CONTENT_DIR).is_dir() {
        let documents = validate_content(&builder, &mut result);

        if offline || !builder.config().github.embeds {
            println!("\nSkipping embeds");
        } else {
            println!("\nChecking embeds...");
            validate_embeds(&builder, documents, &mut result).await;
        }
    } else {
        result.add_error(format!("Required directory missing: {CONTENT_DIR}/"));
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Parse every content file and validate its frontmatter.
pub fn validate_content<S: BlobSource>(
    builder: &Builder<S>,
    result: &mut ValidationResult,
) -> Vec<SourceDocument> {
    let collector = builder.collector();
    let files = match collector.find_content_files() {
        Ok(files) => files,
        Err(e) => {
            result.add_error(format!("Failed to read content directory: {e}"));
            return Vec::new();
        }
    };

    let mut documents = Vec::with_capacity(files.len());
    let mut failed = 0;
    for path in &files {
        let doc = match collector.parse_file(path) {
            Ok(doc) => doc,
            Err(e) => {
                result.add_error(format!("{}: {e}", path.display()));
                failed += 1;
                continue;
            }
        };

        let frontmatter = &doc.document.frontmatter;
        if let Err(e) = frontmatter.validate(path) {
            result.add_error(e.to_string());
            failed += 1;
        }
        if doc.path.section == Section::Blog && frontmatter.date.is_none() {
            result.add_warning(format!(
                "{}: no date, will be listed last",
                path.display()
            ));
        }
        documents.push(doc);
    }

    if failed == 0 {
        println!("  ✓ All {} content files valid", files.len());
    } else {
        println!("  ✗ {failed}/{} content files have errors", files.len());
    }
    documents
}

/// Resolve every permalink embed, reporting failures as errors.
pub async fn validate_embeds<S: BlobSource>(
    builder: &Builder<S>,
    documents: Vec<SourceDocument>,
    result: &mut ValidationResult,
) {
    let mut resolved = 0;
    for mut doc in documents {
        match builder.resolve_embeds(&mut doc.document).await {
            Ok(embeds) => resolved += embeds.len(),
            Err(e) => result.add_error(format!("{}: {e}", doc.path.path.display())),
        }
    }
    println!("  ✓ {resolved} embed(s) resolved");
}

/// Check configuration values for common issues.
fn check_config_values(config: &Config, result: &mut ValidationResult) {
    if !config.site.base_url.starts_with("http") {
        result.add_warning("site.base_url should start with http:// or https://");
    }

    let output = Path::new(&config.build.output_dir);
    if output.exists() && !output.is_dir() {
        result.add_error(format!(
            "Output path exists but is not a directory: {}",
            config.build.output_dir
        ));
    }

    let static_dir = Path::new(STATIC_DIR);
    for src in config.csp.inline_scripts.iter().chain(&config.build.scripts) {
        let path = static_dir.join(src.trim_start_matches('/'));
        if !path.is_file() {
            result.add_warning(format!(
                "script {src} not found at {}, it will be omitted in production",
                path.display()
            ));
        }
    }

    if !config.csp.enabled && !config.csp.inline_scripts.is_empty() {
        result.add_warning("csp.inline_scripts set while csp.enabled = false");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use folio_core::config::SiteConfig;
    use folio_github::{EmbedError, FetchedBlob};
    use tempfile::TempDir;

    use super::*;

    struct Source;

    impl BlobSource for Source {
        async fn fetch(&self, url: &str) -> folio_github::Result<FetchedBlob> {
            if url.contains("/missing/") {
                return Err(EmbedError::fetch(url, "HTTP 404 Not Found"));
            }
            Ok(FetchedBlob {
                title: "file".to_string(),
                lines: vec!["fn main() {}".to_string()],
                language: "Rust".to_string(),
            })
        }
    }

    fn config() -> Config {
        Config {
            site: SiteConfig {
                title: "Test".to_string(),
                base_url: "https://example.com".to_string(),
                lang: "ja".to_string(),
                description: None,
                author: None,
                image: None,
                twitter: None,
                socials: Vec::new(),
            },
            build: Default::default(),
            csp: Default::default(),
            github: Default::default(),
        }
    }

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn builder(content: &Path) -> Builder<Source> {
        Builder::with_source(config(), content, content.join("public"), Source)
    }

    #[test]
    fn test_validate_content_reports_missing_title() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/ok.md", "---\ntitle: Ok\ndate: 2024-01-01\n---\nBody");
        write(dir.path(), "blog/untitled.md", "---\ndate: 2024-01-01\n---\nBody");
        write(dir.path(), "blog/undated.md", "---\ntitle: Undated\n---\nBody");

        let mut result = ValidationResult::default();
        let docs = validate_content(&builder(dir.path()), &mut result);

        assert_eq!(docs.len(), 3);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("title is required"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("undated.md"));
    }

    #[test]
    fn test_validate_content_reports_bad_frontmatter() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/broken.md", "---\ntitle: [unclosed\n---\nBody");

        let mut result = ValidationResult::default();
        let docs = validate_content(&builder(dir.path()), &mut result);

        assert!(docs.is_empty());
        assert!(result.has_errors());
    }

    #[tokio::test]
    async fn test_validate_embeds() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "blog/ok.md",
            "---\ntitle: Ok\n---\n\nhttps://github.com/o/r/blob/c/main.rs#L1\n",
        );
        write(
            dir.path(),
            "blog/bad.md",
            "---\ntitle: Bad\n---\n\nhttps://github.com/o/missing/blob/c/main.rs\n",
        );

        let builder = builder(dir.path());
        let mut result = ValidationResult::default();
        let docs = validate_content(&builder, &mut result);
        validate_embeds(&builder, docs, &mut result).await;

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("bad.md"));
        assert!(result.errors[0].contains("404"));
    }
}
