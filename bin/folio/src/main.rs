//! Folio CLI
//!
//! Builds the personal site, serves it with live reload, validates content
//! and previews GitHub permalink embeds.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Folio.
#[derive(Parser)]
#[command(name = "folio", version, about = "Personal site generator")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site
    Build {
        /// Output directory (defaults to build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include draft content
        #[arg(long)]
        drafts: bool,
        /// Development build: no CSP, scripts left unresolved
        #[arg(long)]
        dev: bool,
    },
    /// Start development server with live reload
    Watch {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
    /// Validate configuration, content and embeds
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
        /// Skip fetching permalink embeds
        #[arg(long)]
        offline: bool,
    },
    /// Render a GitHub permalink and print the embed HTML
    Embed {
        /// Permalink URL, e.g. https://github.com/owner/repo/blob/sha/path#L1-L5
        permalink: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    folio::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output, drafts, dev } => {
            folio::cmd::build::run(&cli.config, output.as_deref(), drafts, dev).await?;
        }
        Commands::Watch { port, open } => {
            folio::cmd::watch::run(&cli.config, port, open).await?;
        }
        Commands::Check { strict, offline } => {
            folio::cmd::check::run(&cli.config, strict, offline).await?;
        }
        Commands::Embed { permalink } => {
            folio::cmd::embed::run(&cli.config, &permalink).await?;
        }
    }

    Ok(())
}
