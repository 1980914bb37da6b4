//! Build command - generates the static site

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use color_eyre::eyre::{Result, WrapErr};
use folio_generator::BuildStats;

use super::{load_config, site_builder};

/// Run the build command.
pub async fn run(
    config_path: &Path,
    output: Option<&Path>,
    drafts: bool,
    dev: bool,
) -> Result<BuildStats> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, drafts, dev, "Starting build");

    let mut config = load_config(config_path)?;
    let output = output.map_or_else(|| PathBuf::from(&config.build.output_dir), Path::to_path_buf);

    config.build.output_dir = output.to_string_lossy().to_string();
    config.build.drafts |= drafts;
    if dev {
        config.build.production = false;
    }

    let builder = site_builder(config, &output)?;
    let stats = builder.build().await.wrap_err("Build failed")?;

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:     {}", stats.pages);
    println!("  Listings:  {}", stats.listings);
    println!("  Embeds:    {}", stats.embeds);
    println!("  Assets:    {}", stats.assets);
    if stats.skipped > 0 {
        println!("  Skipped:   {} (see warnings above)", stats.skipped);
    }
    println!();
    println!("  Duration:  {:.2}s", duration.as_secs_f64());
    println!("  Output:    {}", output.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(stats)
}
