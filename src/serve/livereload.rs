// src/serve/livereload.rs

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::serve::ServeState;

/// Path of the Server-Sent-Events stream browsers subscribe to.
pub const LIVERELOAD_PATH: &str = "/__assetpipe/livereload";

/// Injected into proxied HTML pages.
pub const CLIENT_SCRIPT: &str = r#"<script>
(function () {
  var source = new EventSource("/__assetpipe/livereload");
  source.addEventListener("reload", function () { window.location.reload(); });
})();
</script>"#;

/// Fan-out point between the watch session and connected browsers.
///
/// Every [`notify`](Self::notify) bumps a generation counter and sends it to
/// all current subscribers. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<u64>,
    generation: Arc<AtomicU64>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Tell every subscriber to reload. Returns the new generation.
    pub fn notify(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // No receivers is fine: nobody has the page open.
        let receivers = self.tx.send(generation).unwrap_or(0);
        debug!(generation, receivers, "live-reload broadcast");
        generation
    }

    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert [`CLIENT_SCRIPT`] before the last `</body>`, or append it when the
/// document has none.
pub fn inject_client(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + CLIENT_SCRIPT.len());
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => {
            out.push_str(&html[..idx]);
            out.push_str(CLIENT_SCRIPT);
            out.push_str(&html[idx..]);
        }
        None => {
            out.push_str(html);
            out.push_str(CLIENT_SCRIPT);
        }
    }
    out
}

pub(crate) async fn livereload_stream(
    State(state): State<Arc<ServeState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the response is returned so no reload is missed.
    let mut rx = state.hub.subscribe();
    debug!("live-reload client connected");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(generation) => {
                    yield Ok(Event::default().event("reload").data(generation.to_string()));
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live-reload client lagged");
                    yield Ok(Event::default().event("reload").data("lagged"));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
