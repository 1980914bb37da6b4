//! Site configuration management.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for Folio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Content-Security-Policy settings.
    #[serde(default)]
    pub csp: CspConfig,

    /// GitHub permalink embed settings.
    #[serde(default)]
    pub github: GithubConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title, also used as the `<title>` suffix.
    pub title: String,

    /// Base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Language code for the `<html lang>` attribute.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: Option<String>,

    /// Site author name, shown in the footer.
    #[serde(default)]
    pub author: Option<String>,

    /// Open Graph image URL.
    #[serde(default)]
    pub image: Option<String>,

    /// Twitter handle (with `@`) for card meta tags.
    #[serde(default)]
    pub twitter: Option<String>,

    /// Social links rendered in the footer.
    #[serde(default)]
    pub socials: Vec<SocialLink>,
}

/// A footer social link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    /// Accessible label, e.g. "GitHub(yu7400ki)".
    pub label: String,

    /// Target URL.
    pub url: String,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Syntax highlighting theme name.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,

    /// Whether to fingerprint static assets.
    #[serde(default)]
    pub fingerprint: bool,

    /// Whether to generate drafts.
    #[serde(default)]
    pub drafts: bool,

    /// Production builds inline scripts and emit the CSP meta tag.
    #[serde(default = "default_true")]
    pub production: bool,

    /// Copy each content source next to its rendered page as `<slug>.md`.
    #[serde(default = "default_true")]
    pub copy_sources: bool,

    /// Module scripts loaded asynchronously on every page, by source path.
    #[serde(default)]
    pub scripts: Vec<String>,
}

/// Content-Security-Policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CspConfig {
    /// Whether the CSP meta tag is emitted.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Policy directives in emission order.
    #[serde(default = "default_directives")]
    pub directives: Vec<CspDirective>,

    /// Static asset paths to inline into every page and hash into `script-src`.
    #[serde(default)]
    pub inline_scripts: Vec<String>,
}

/// A single CSP directive such as `default-src 'self'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CspDirective {
    /// Directive name, e.g. `script-src`.
    pub name: String,

    /// Source expressions.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl CspDirective {
    /// Create a directive from a name and its sources.
    pub fn new(name: impl Into<String>, sources: &[&str]) -> Self {
        Self {
            name: name.into(),
            sources: sources.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// GitHub embed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Whether bare permalinks are turned into embeds.
    #[serde(default = "default_true")]
    pub embeds: bool,

    /// User-Agent sent with permalink requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Default value functions
fn default_lang() -> String {
    "ja".to_string()
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_true() -> bool {
    true
}

fn default_directives() -> Vec<CspDirective> {
    vec![
        CspDirective::new("default-src", &["'self'"]),
        CspDirective::new("script-src", &["'self'"]),
        CspDirective::new("style-src", &["'self'", "'unsafe-inline'"]),
    ]
}

fn default_user_agent() -> String {
    concat!("folio/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            syntax_theme: default_syntax_theme(),
            fingerprint: false,
            drafts: false,
            production: true,
            copy_sources: true,
            scripts: Vec::new(),
        }
    }
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directives: default_directives(),
            inline_scripts: Vec::new(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            embeds: true,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `FOLIO__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.base_url.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        Ok(())
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Format a page title as `Title | Site`, or just the site title.
    pub fn page_title(&self, title: Option<&str>) -> String {
        match title {
            Some(t) if !t.is_empty() => format!("{t} | {}", self.site.title),
            _ => self.site.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
title = "yu7400ki.me"
base_url = "https://yu7400ki.me"
lang = "ja"
description = "yu7400ki's personal website"
twitter = "@yu7400ki"

[[site.socials]]
label = "GitHub(yu7400ki)"
url = "https://github.com/yu7400ki"

[build]
output_dir = "dist"
syntax_theme = "InspiredGitHub"
fingerprint = true
scripts = ["/app/client.js"]

[csp]
inline_scripts = ["/theme.js"]

[[csp.directives]]
name = "default-src"
sources = ["'self'"]

[[csp.directives]]
name = "script-src"
sources = ["'self'", "static.cloudflareinsights.com"]

[github]
user_agent = "yu7400ki.me"
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.title, "yu7400ki.me");
        assert_eq!(config.site.base_url, "https://yu7400ki.me");
        assert_eq!(config.site.lang, "ja");
        assert_eq!(config.site.twitter.as_deref(), Some("@yu7400ki"));
        assert_eq!(config.site.socials.len(), 1);
        assert_eq!(config.site.socials[0].url, "https://github.com/yu7400ki");
        assert_eq!(config.build.output_dir, "dist");
        assert_eq!(config.build.syntax_theme, "InspiredGitHub");
        assert!(config.build.fingerprint);
        assert_eq!(config.build.scripts, vec!["/app/client.js"]);
        assert!(config.build.production);
        assert!(config.csp.enabled);
        assert_eq!(config.csp.inline_scripts, vec!["/theme.js"]);
        assert_eq!(config.csp.directives.len(), 2);
        assert_eq!(config.csp.directives[1].name, "script-src");
        assert_eq!(
            config.csp.directives[1].sources,
            vec!["'self'", "static.cloudflareinsights.com"]
        );
        assert_eq!(config.github.user_agent, "yu7400ki.me");
        assert!(config.github.embeds);
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        let minimal_config = r#"
[site]
title = "Minimal Site"
base_url = "https://example.com"
"#;
        std::fs::write(&config_path, minimal_config).expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.lang, "ja");
        assert!(config.site.socials.is_empty());
        assert_eq!(config.build.output_dir, "public");
        assert_eq!(config.build.syntax_theme, "base16-ocean.dark");
        assert!(!config.build.fingerprint);
        assert!(config.build.copy_sources);
        assert_eq!(config.csp.directives.len(), 3);
        assert_eq!(config.csp.directives[0].name, "default-src");
        assert!(config.github.user_agent.starts_with("folio/"));
    }

    #[test]
    fn test_url_for() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        let config_content = r#"
[site]
title = "Test"
base_url = "https://example.com"
"#;
        std::fs::write(&config_path, config_content).expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.url_for("/blog/hello"), "https://example.com/blog/hello");
        assert_eq!(config.url_for("blog/hello"), "https://example.com/blog/hello");
    }

    #[test]
    fn test_page_title() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[site]\ntitle = \"yu7400ki.me\"\nbase_url = \"https://yu7400ki.me\"\n",
        )
        .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.page_title(Some("Blog")), "Blog | yu7400ki.me");
        assert_eq!(config.page_title(Some("")), "yu7400ki.me");
        assert_eq!(config.page_title(None), "yu7400ki.me");
    }

    #[test]
    fn test_config_validation_empty_title() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        let config_content = r#"
[site]
title = ""
base_url = "https://example.com"
"#;
        std::fs::write(&config_path, config_content).expect("write");

        let result = Config::load(&config_path);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("title cannot be empty")
        );
    }

    #[test]
    fn test_load_with_env() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[site]\ntitle = \"Env Site\"\nbase_url = \"https://example.com\"\n",
        )
        .expect("write");

        let config = Config::load_with_env(&config_path).expect("load config");
        assert_eq!(config.site.title, "Env Site");
        assert_eq!(config.build.output_dir, "public");
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
