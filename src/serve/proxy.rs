// src/serve/proxy.rs

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::serve::livereload::inject_client;
use crate::serve::ServeState;

/// Upstream failure while proxying one request.
#[derive(Debug)]
pub enum ProxyError {
    Body(String),
    Upstream(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::Body(msg) => {
                (StatusCode::BAD_REQUEST, format!("could not read request body: {msg}"))
                    .into_response()
            }
            ProxyError::Upstream(msg) => {
                (StatusCode::BAD_GATEWAY, format!("upstream unavailable: {msg}")).into_response()
            }
        }
    }
}

/// Forward a request to the backend and relay the answer.
///
/// HTML answers get the live-reload client injected.
pub(crate) async fn proxy_request(
    State(state): State<Arc<ServeState>>,
    req: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", state.target.trim_end_matches('/'), path_and_query);
    debug!(method = %parts.method, url = %url, "proxying");

    let body = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ProxyError::Body(e.to_string()))?;

    let mut headers = parts.headers;
    headers.remove(header::HOST);
    // Upstream must answer uncompressed so HTML can be rewritten.
    headers.remove(header::ACCEPT_ENCODING);
    headers.remove(header::CONNECTION);
    // Recomputed by the client from the buffered body.
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);

    let upstream = state
        .client
        .request(parts.method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!(url = %url, error = %e, "proxy request failed");
            ProxyError::Upstream(e.to_string())
        })?;

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;

    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONNECTION);

    let body = if is_html(&headers) {
        match String::from_utf8(bytes.to_vec()) {
            Ok(html) => {
                let injected = inject_client(&html);
                headers.remove(header::CONTENT_LENGTH);
                Body::from(injected)
            }
            Err(_) => Body::from(bytes),
        }
    } else {
        Body::from(bytes)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn is_html(headers: &HeaderMap<HeaderValue>) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false)
}
