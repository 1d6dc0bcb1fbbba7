// src/serve/mod.rs

//! Local preview server.
//!
//! Every request is proxied to the backend; HTML pages get a small
//! live-reload client that listens on [`LIVERELOAD_PATH`] and reloads the
//! page when the watch session finishes a rebuild.

pub mod livereload;
pub mod proxy;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::errors::{PipelineError, Result};

pub use livereload::{inject_client, ReloadHub, CLIENT_SCRIPT, LIVERELOAD_PATH};
pub use proxy::ProxyError;

/// Shared by all handlers.
#[derive(Debug)]
pub struct ServeState {
    pub client: reqwest::Client,
    /// Backend base URL, e.g. `http://127.0.0.1:5000`.
    pub target: String,
    pub hub: ReloadHub,
}

impl ServeState {
    pub fn new(target: impl Into<String>, hub: ReloadHub) -> Result<Self> {
        // Redirects are relayed to the browser untouched.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| PipelineError::ServeError(format!("building proxy client: {e}")))?;
        Ok(Self {
            client,
            target: target.into(),
            hub,
        })
    }
}

pub fn router(state: Arc<ServeState>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(livereload::livereload_stream))
        .fallback(proxy::proxy_request)
        .with_state(state)
}

/// Serve on an already bound listener until the runtime shuts down.
pub async fn serve_on(listener: TcpListener, state: ServeState) -> Result<()> {
    let app = router(Arc::new(state));
    axum::serve(listener, app)
        .await
        .map_err(|e| PipelineError::ServeError(format!("server error: {e}")))
}

/// Bind the preview server's loopback address.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpListener::bind(addr)
        .await
        .map_err(|e| PipelineError::ServeError(format!("binding {addr}: {e}")))
}

/// Bind `127.0.0.1:port` and proxy everything to `proxy` from a background
/// task.
///
/// Bind errors are returned here; the returned address is the one actually
/// bound (useful with port `0`). The server runs until the runtime shuts
/// down, and a later failure is only logged.
pub async fn serve(port: u16, proxy: &str, hub: ReloadHub) -> Result<SocketAddr> {
    let listener = bind(port).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| PipelineError::ServeError(format!("reading bound address: {e}")))?;
    let state = ServeState::new(proxy, hub)?;
    info!(%addr, proxy = %proxy, "preview server listening");

    tokio::spawn(async move {
        if let Err(err) = serve_on(listener, state).await {
            error!(error = %err, "preview server stopped");
        }
    });
    Ok(addr)
}
