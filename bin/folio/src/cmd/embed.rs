//! Embed command - render a single permalink

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, WrapErr};
use folio_core::config::GithubConfig;
use folio_github::{Embedder, GitHubClient};
use folio_parser::{HighlighterCache, syntax::DEFAULT_THEME};

use super::load_config;

/// Run the embed command.
///
/// Uses the `[github]` settings and syntax theme from the configuration when
/// the file exists, defaults otherwise.
pub async fn run(config_path: &Path, permalink: &str) -> Result<()> {
    let (github, theme) = if config_path.exists() {
        let config = load_config(config_path)?;
        (config.github, config.build.syntax_theme)
    } else {
        tracing::debug!(?config_path, "no configuration, using defaults");
        (GithubConfig::default(), DEFAULT_THEME.to_string())
    };

    let client = GitHubClient::from_config(&github)?;
    let embedder = Embedder::new(client, Arc::new(HighlighterCache::new(&theme)));

    let block = embedder
        .render(permalink)
        .await
        .wrap_err_with(|| format!("Failed to embed {permalink}"))?;

    tracing::info!(
        title = %block.title,
        grammar = block.grammar,
        lines = block.text.lines().count(),
        "rendered embed"
    );
    println!("{}", block.to_html());

    Ok(())
}
