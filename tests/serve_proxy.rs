// tests/serve_proxy.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::net::SocketAddr;

use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use assetpipe::errors::PipelineError;
use assetpipe::serve::{
    inject_client, serve, serve_on, ReloadHub, ServeState, CLIENT_SCRIPT, LIVERELOAD_PATH,
};

#[test]
fn client_is_injected_before_the_last_body_tag() {
    let html = "<html><body><p>&lt;/body&gt;</p></BODY></html>";
    let out = inject_client(html);

    let idx = out.find(CLIENT_SCRIPT).expect("script injected");
    assert_eq!(&out[..idx], "<html><body><p>&lt;/body&gt;</p>");
    assert!(out.ends_with("</BODY></html>"));
}

#[test]
fn client_is_appended_without_body_tag() {
    let out = inject_client("<p>fragment</p>");
    assert_eq!(out, format!("<p>fragment</p>{CLIENT_SCRIPT}"));
}

async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route("/", get(|| async { Html("<html><body><h1>home</h1></body></html>") }))
        .route(
            "/api/data",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{\"ok\":true}") }),
        )
        .route("/echo", post(|body: String| async move { body.to_uppercase() }))
        .route(
            "/old",
            get(|| async {
                (
                    axum::http::StatusCode::FOUND,
                    [(header::LOCATION, "/new")],
                )
                    .into_response()
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_preview(backend: SocketAddr, hub: ReloadHub) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ServeState::new(format!("http://{backend}"), hub).unwrap();
    tokio::spawn(async move {
        serve_on(listener, state).await.unwrap();
    });
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn html_is_proxied_with_livereload_client() {
    init_tracing();
    let backend = spawn_backend().await;
    let preview = spawn_preview(backend, ReloadHub::new()).await;

    let resp = with_timeout(client().get(format!("http://{preview}/")).send())
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();

    assert!(body.contains("<h1>home</h1>"));
    assert!(body.contains(LIVERELOAD_PATH));
    assert!(body.ends_with("</body></html>"));
}

#[tokio::test]
async fn serve_binds_the_port_and_proxies_in_the_background() {
    let backend = spawn_backend().await;
    let addr = serve(0, &format!("http://{backend}"), ReloadHub::new())
        .await
        .unwrap();
    assert!(addr.ip().is_loopback());
    assert_ne!(addr.port(), 0);

    let resp = with_timeout(client().get(format!("http://{addr}/api/data")).send())
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "{\"ok\":true}");
}

#[tokio::test]
async fn serve_reports_a_port_already_in_use() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let err = serve(port, "http://127.0.0.1:5000", ReloadHub::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ServeError(_)));
    assert!(err.to_string().contains(&port.to_string()));
}

#[tokio::test]
async fn non_html_passes_through_untouched() {
    let backend = spawn_backend().await;
    let preview = spawn_preview(backend, ReloadHub::new()).await;
    let client = client();

    let json = with_timeout(client.get(format!("http://{preview}/api/data")).send())
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(json, "{\"ok\":true}");

    let echoed = with_timeout(
        client
            .post(format!("http://{preview}/echo"))
            .body("hello")
            .send(),
    )
    .await
    .unwrap()
    .text()
    .await
    .unwrap();
    assert_eq!(echoed, "HELLO");

    let missing = with_timeout(client.get(format!("http://{preview}/nope")).send())
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn redirects_are_relayed_to_the_browser() {
    let backend = spawn_backend().await;
    let preview = spawn_preview(backend, ReloadHub::new()).await;

    let resp = with_timeout(client().get(format!("http://{preview}/old")).send())
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers()[header::LOCATION], "/new");
}

#[tokio::test]
async fn unreachable_backend_is_bad_gateway() {
    // Bind then drop to get a port nothing listens on.
    let dead = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let preview = spawn_preview(dead, ReloadHub::new()).await;

    let resp = with_timeout(client().get(format!("http://{preview}/")).send())
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
}

#[tokio::test]
async fn livereload_stream_emits_reload_events() {
    init_tracing();
    let backend = spawn_backend().await;
    let hub = ReloadHub::new();
    let preview = spawn_preview(backend, hub.clone()).await;

    let mut resp = with_timeout(
        client()
            .get(format!("http://{preview}{LIVERELOAD_PATH}"))
            .send(),
    )
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    assert_eq!(hub.notify(), 1);

    let chunk = with_timeout(resp.chunk()).await.unwrap().expect("event chunk");
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event: reload"));
    assert!(text.contains("data: 1"));
}
