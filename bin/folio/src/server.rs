//! Development server with live reload.
//!
//! Serves the output directory and pushes a `reload` server-sent event to
//! connected pages after every rebuild. Pages pick the event up through
//! [`LIVERELOAD_SCRIPT`], which [`inject_livereload`] appends to every built
//! HTML file.

use std::{convert::Infallible, fs, path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tower_http::services::ServeDir;
use walkdir::WalkDir;

/// Path of the server-sent events endpoint.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Script that reloads the page on a `reload` event.
pub const LIVERELOAD_SCRIPT: &str = r#"<script>
new EventSource("/__livereload").onmessage = (event) => {
    if (event.data === "reload") location.reload();
};
</script>
"#;

/// Broadcasts rebuild notifications to connected pages.
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<()>,
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Tell every connected page to reload. Returns the number of receivers.
    pub fn notify(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

/// Router serving `output_dir` plus the live reload endpoint.
pub fn create_router(output_dir: &Path, reload: Arc<LiveReload>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(livereload_handler))
        .fallback_service(ServeDir::new(output_dir))
        .with_state(reload)
}

async fn livereload_handler(
    State(reload): State<Arc<LiveReload>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Lagged receivers just miss a notification; the next rebuild catches up.
    let stream = BroadcastStream::new(reload.subscribe())
        .filter_map(|msg| msg.ok().map(|()| Ok(Event::default().data("reload"))));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Append [`LIVERELOAD_SCRIPT`] before `</body>` in every HTML file under
/// `output_dir`. Returns the number of files changed.
pub fn inject_livereload(output_dir: &Path) -> std::io::Result<usize> {
    let mut injected = 0;
    for entry in WalkDir::new(output_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
    {
        let path = entry.path();
        let html = fs::read_to_string(path)?;
        if html.contains(LIVERELOAD_PATH) {
            continue;
        }
        let Some(pos) = html.rfind("</body>") else {
            continue;
        };

        let mut out = String::with_capacity(html.len() + LIVERELOAD_SCRIPT.len());
        out.push_str(&html[..pos]);
        out.push_str(LIVERELOAD_SCRIPT);
        out.push_str(&html[pos..]);
        fs::write(path, out)?;
        injected += 1;
    }

    tracing::debug!(injected, "injected livereload script");
    Ok(injected)
}
