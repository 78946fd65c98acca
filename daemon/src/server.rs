/// HTTP static-file server over an acquired listener.
use crate::config::DaemonConfig;
use crate::errors::{DaemonError, DaemonResult};
use crate::files::{content_type, resolve_request};
use crate::headers::ResponseHeaders;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde_json::json;
use staticd_core::{BoundListener, Endpoint};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Request counters with explicit start/end points, injected into every
/// handler rather than living as ambient module state.
#[derive(Debug, Default)]
pub struct RequestCounters {
    total: AtomicU64,
    active: AtomicU64,
}

impl RequestCounters {
    pub fn request_started(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    pub fn request_finished(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Static-file server
#[derive(Clone)]
pub struct StaticServer {
    site_root: PathBuf,
    index_file: String,
    headers: Arc<ResponseHeaders>,
    counters: Arc<RequestCounters>,
    endpoint: Option<Endpoint>,
}

impl StaticServer {
    /// Create a new static server from validated configuration
    pub fn new(config: &DaemonConfig) -> DaemonResult<Self> {
        let headers = ResponseHeaders::from_config(&config.headers)?;

        Ok(StaticServer {
            site_root: config.server.site_root.clone(),
            index_file: config.server.index_file.clone(),
            headers: Arc::new(headers),
            counters: Arc::new(RequestCounters::default()),
            endpoint: None,
        })
    }

    pub fn counters(&self) -> Arc<RequestCounters> {
        self.counters.clone()
    }

    /// Serve the site over an already-acquired listener until `shutdown`
    /// resolves. The serving loop never starts unless acquisition has
    /// already produced a bound endpoint.
    pub async fn run<F>(mut self, bound: BoundListener, shutdown: F) -> DaemonResult<()>
    where
        F: Future<Output = ()>,
    {
        let BoundListener {
            listener, endpoint, ..
        } = bound;
        self.endpoint = Some(endpoint);

        listener
            .set_nonblocking(true)
            .map_err(|e| DaemonError::ServerError(format!("Listener setup failed: {}", e)))?;

        let server = self.clone();
        let make_svc = make_service_fn(move |_conn| {
            let server = server.clone();
            async move {
                Ok::<_, hyper::Error>(service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle(req).await }
                }))
            }
        });

        info!(
            "Serving {} on http://{}",
            self.site_root.display(),
            endpoint
        );

        Server::from_tcp(listener)
            .map_err(|e| DaemonError::ServerError(format!("Listener handoff failed: {}", e)))?
            .serve(make_svc)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DaemonError::ServerError(format!("HTTP server error: {}", e)))
    }

    /// Handle one request, bracketed by the counter increment/decrement
    async fn handle(self, req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
        self.counters.request_started();
        let mut response = self.respond(&req).await;
        self.headers.apply(response.headers_mut());
        self.counters.request_finished();
        Ok(response)
    }

    async fn respond(&self, req: &Request<Body>) -> Response<Body> {
        let head_only = match *req.method() {
            Method::GET => false,
            Method::HEAD => true,
            _ => {
                return plain_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            }
        };

        let raw_path = req.uri().path();
        debug!(path = raw_path, "request");

        if raw_path == "/healthz" {
            return self.health_response(head_only);
        }

        let mut path = match resolve_request(&self.site_root, &self.index_file, raw_path) {
            Some(path) => path,
            None => return plain_response(StatusCode::FORBIDDEN, "Forbidden"),
        };

        // Directory requests fall through to the directory's index file
        if path.is_dir() {
            path = path.join(&self.index_file);
        }

        match tokio::fs::read(&path).await {
            Ok(contents) => file_response(&path, contents, head_only),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                plain_response(StatusCode::NOT_FOUND, "404 Not Found")
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read file");
                plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }

    fn health_response(&self, head_only: bool) -> Response<Body> {
        let body = json!({
            "status": "ok",
            "version": crate::VERSION,
            "port": self.endpoint.map(|e| e.port),
            "requests_total": self.counters.total(),
            "requests_active": self.counters.active(),
        })
        .to_string();

        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(if head_only {
                Body::empty()
            } else {
                Body::from(body)
            })
            .unwrap()
    }
}

fn plain_response(status: StatusCode, message: &'static str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, message.len())
        .body(Body::from(message))
        .unwrap()
}

fn file_response(path: &std::path::Path, contents: Vec<u8>, head_only: bool) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type(path))
        .header(CONTENT_LENGTH, contents.len())
        .body(if head_only {
            Body::empty()
        } else {
            Body::from(contents)
        })
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let config = DaemonConfig::default();
        assert!(StaticServer::new(&config).is_ok());
    }

    #[test]
    fn test_counters_start_finish() {
        let counters = RequestCounters::default();
        counters.request_started();
        counters.request_started();
        assert_eq!(counters.total(), 2);
        assert_eq!(counters.active(), 2);
        counters.request_finished();
        assert_eq!(counters.total(), 2);
        assert_eq!(counters.active(), 1);
    }
}
