//! End-to-end tests for the static-file serving loop
//!
//! This suite covers:
//! - Index rewrite at `/` and nested asset serving
//! - Configured header injection on every response
//! - 404 / 403 / 405 surfaces
//! - The health endpoint and its request counters
//!
//! Each test acquires a real loopback listener on a kernel-assigned port
//! and serves a temporary site root.

use staticd_core::{ListenerFactory, PortList};
use staticd_daemon::{DaemonConfig, StaticServer};
use std::net::{IpAddr, Ipv4Addr};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Build a throwaway site root with an index page and a nested asset
fn setup_site() -> (TempDir, DaemonConfig) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>tomo index</h1>").unwrap();
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/app.css"), "body{margin:0}").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub/index.html"), "<h1>sub index</h1>").unwrap();

    let mut config = DaemonConfig::default();
    config.server.site_root = dir.path().to_path_buf();
    (dir, config)
}

/// Acquire a loopback listener on a kernel-assigned port and serve the
/// configured site on it until the returned sender fires.
fn start_server(
    config: &DaemonConfig,
) -> (u16, oneshot::Sender<()>, JoinHandle<staticd_daemon::DaemonResult<()>>) {
    let factory = ListenerFactory::new(IpAddr::V4(Ipv4Addr::LOCALHOST), PortList::single(0));
    let bound = factory.acquire().unwrap();
    let port = bound.endpoint.port;

    let server = StaticServer::new(config).unwrap();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(server.run(bound, async {
        let _ = rx.await;
    }));

    (port, tx, handle)
}

/// Send a raw request line, bypassing client-side path normalization
async fn raw_get(port: u16, path: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n",
        path
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn serves_index_at_root() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let response = reqwest::get(format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(response.text().await.unwrap(), "<h1>tomo index</h1>");

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn serves_nested_asset_with_content_type() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let response = reqwest::get(format!("http://127.0.0.1:{}/css/app.css", port))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/css");
    assert_eq!(response.text().await.unwrap(), "body{margin:0}");

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn directory_request_serves_its_index() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let response = reqwest::get(format!("http://127.0.0.1:{}/sub", port))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "<h1>sub index</h1>");

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn configured_headers_are_injected_on_every_response() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let ok = reqwest::get(format!("http://127.0.0.1:{}/", port)).await.unwrap();
    assert_eq!(
        ok.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert_eq!(
        ok.headers().get("cache-control").unwrap(),
        "no-cache, no-store, must-revalidate"
    );

    // Error responses carry the same configured surface
    let missing = reqwest::get(format!("http://127.0.0.1:{}/nope.html", port))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    assert_eq!(
        missing.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_file_is_404() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let response = reqwest::get(format!("http://127.0.0.1:{}/missing.js", port))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn encoded_traversal_is_403() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let response = raw_get(port, "/%2e%2e/%2e%2e/etc/passwd").await;
    assert!(response.starts_with("HTTP/1.1 403"));

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn non_get_method_is_405() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/", port))
        .body("data")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 405);

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn head_request_omits_body_but_keeps_length() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    let client = reqwest::Client::new();
    let response = client
        .head(format!("http://127.0.0.1:{}/", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let length: usize = response
        .headers()
        .get("content-length")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(length, "<h1>tomo index</h1>".len());
    assert!(response.text().await.unwrap().is_empty());

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn healthz_reports_bound_port_and_counters() {
    let (_site, config) = setup_site();
    let (port, shutdown, handle) = start_server(&config);

    // Generate some traffic first
    let _ = reqwest::get(format!("http://127.0.0.1:{}/", port)).await.unwrap();

    let health: serde_json::Value = reqwest::get(format!("http://127.0.0.1:{}/healthz", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "ok");
    assert_eq!(health["port"], port);
    assert!(health["requests_total"].as_u64().unwrap() >= 2);
    assert_eq!(health["requests_active"], 1);

    let _ = shutdown.send(());
    handle.await.unwrap().unwrap();
}
