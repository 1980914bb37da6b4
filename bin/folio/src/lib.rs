//! Folio CLI Library
//!
//! Command implementations and the development server behind the `folio`
//! binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, watch, check, embed)
//! - [`server`] - Development server with live reload
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! # async fn run() -> color_eyre::eyre::Result<()> {
//! folio::cmd::build::run(Path::new("config.toml"), None, false, false).await?;
//! # Ok(())
//! # }
//! ```

pub mod cmd;
pub mod server;

pub use folio_core::{Config, Page};
pub use folio_generator::{BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// `verbose` maps 0 to WARN, 1 to INFO, 2 to DEBUG and anything higher to
/// TRACE. `RUST_LOG` directives are honoured as well.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(verbose > 1))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
