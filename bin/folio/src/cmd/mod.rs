//! Command implementations.

pub mod build;
pub mod check;
pub mod embed;
pub mod watch;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use folio_core::Config;
use folio_generator::Builder;

/// Content sources, relative to the working directory.
pub const CONTENT_DIR: &str = "content";

/// Static assets copied into the output.
pub const STATIC_DIR: &str = "static";

/// Load `config.toml` with `FOLIO__*` environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_with_env(path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Builder over the working-directory layout.
pub fn site_builder(config: Config, output: &Path) -> Result<Builder> {
    let mut builder =
        Builder::new(config, CONTENT_DIR, output).wrap_err("Failed to create GitHub client")?;

    let static_dir = Path::new(STATIC_DIR);
    if static_dir.is_dir() {
        tracing::info!("found static directory, will copy to output");
        builder = builder.with_static_dir(static_dir);
    }
    Ok(builder)
}
