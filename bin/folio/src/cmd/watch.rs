//! Watch command - development server with live reload

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use color_eyre::eyre::{Result, WrapErr};
use folio_core::Config;
use folio_generator::BuildStats;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::{net::TcpListener, sync::mpsc};

use super::{CONTENT_DIR, STATIC_DIR, load_config, site_builder};
use crate::server::{LiveReload, create_router, inject_livereload};

/// Quiet period after the last change before rebuilding.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Run the watch command.
pub async fn run(config_path: &Path, port: u16, open_browser: bool) -> Result<()> {
    tracing::info!(?config_path, port, "Starting watch mode");

    let mut config = load_config(config_path)?;
    config.build.production = false;
    config.build.drafts = true;
    let output_dir = PathBuf::from(&config.build.output_dir);

    let stats = rebuild(&config, &output_dir).await?;
    print_build_stats(&stats);

    let reload = Arc::new(LiveReload::new());
    let (tx, mut rx) = mpsc::channel::<()>(16);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event)
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) =>
            {
                let _ = tx.blocking_send(());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "watch error"),
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for dir in [CONTENT_DIR, STATIC_DIR] {
        let dir = Path::new(dir);
        if dir.exists() {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .wrap_err_with(|| format!("Failed to watch {}", dir.display()))?;
            tracing::debug!(dir = %dir.display(), "watching directory");
        }
    }
    watcher
        .watch(config_path, RecursiveMode::NonRecursive)
        .wrap_err("Failed to watch configuration file")?;

    let rebuild_reload = Arc::clone(&reload);
    let rebuild_config_path = config_path.to_path_buf();
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Wait for the burst of events an editor save produces to settle.
            while let Ok(Some(())) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {}

            println!();
            println!("  File change detected, rebuilding...");

            let config = match load_config(&rebuild_config_path) {
                Ok(mut config) => {
                    config.build.production = false;
                    config.build.drafts = true;
                    config.build.output_dir = output_dir.to_string_lossy().to_string();
                    config
                }
                Err(e) => {
                    eprintln!("  ✗ {e:#}");
                    continue;
                }
            };

            match rebuild(&config, &output_dir).await {
                Ok(stats) => {
                    println!(
                        "  ✓ Rebuilt {} pages in {}ms",
                        stats.pages, stats.duration_ms
                    );
                    let clients = rebuild_reload.notify();
                    tracing::debug!(clients, "sent reload");
                }
                Err(e) => {
                    tracing::error!(error = %e, "rebuild failed");
                    eprintln!("  ✗ Rebuild failed: {e:#}");
                }
            }
        }
    });

    let app = create_router(Path::new(&config.build.output_dir), reload);
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Dev server running at http://{addr}");
    println!("  Press Ctrl+C to stop");
    println!();

    if open_browser && let Err(e) = open::that(format!("http://{addr}")) {
        tracing::warn!(error = %e, "failed to open browser");
    }

    // The watcher stops when dropped.
    let _watcher = watcher;

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}

/// Development build followed by live reload injection.
async fn rebuild(config: &Config, output_dir: &Path) -> Result<BuildStats> {
    let builder = site_builder(config.clone(), output_dir)?;
    let stats = builder.build().await.wrap_err("Build failed")?;
    inject_livereload(output_dir).wrap_err("Failed to inject livereload script")?;
    tracing::debug!(?stats, "build completed");
    Ok(stats)
}

fn print_build_stats(stats: &BuildStats) {
    println!();
    println!("  Build Statistics:");
    println!("  ─────────────────────────────────");
    println!("  Pages:        {:>6}", stats.pages);
    println!("  Listings:     {:>6}", stats.listings);
    println!("  Embeds:       {:>6}", stats.embeds);
    println!("  Skipped:      {:>6}", stats.skipped);
    println!("  Assets:       {:>6}", stats.assets);
    println!("  ─────────────────────────────────");
    println!("  Duration:     {:>6}ms", stats.duration_ms);
    println!();
}
