//! Credential issuance server
//!
//! The backend half of login: hands the configured storage credentials to
//! any caller presenting a bearer token.
//!
//! # Endpoints
//!
//! * `POST /api/upload` - credentials JSON (requires `Authorization: Bearer <token>`)
//! * `GET /health` - health check
//! * `GET /metrics` - Prometheus metrics
//!
//! # Example
//!
//! ```no_run
//! use r2_uploadr::config::ServerConfig;
//! use r2_uploadr::credentials::Credentials;
//! use r2_uploadr::server::CredentialServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         address: "127.0.0.1:3000".to_string(),
//!         credentials: Credentials::new("account", "key", "secret", "bucket"),
//!     };
//!     let mut server = CredentialServer::new(config)?;
//!     let addr = server.start().await?;
//!     println!("Credential server listening on {}", addr);
//!     Ok(())
//! }
//! ```

use crate::config::ServerConfig;
use crate::credentials::Credentials;
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Path the credentials are served on
pub const AUTH_PATH: &str = "/api/upload";

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Credential issuance HTTP server
pub struct CredentialServer {
    address: String,
    credentials: Arc<Credentials>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl CredentialServer {
    /// Create a new server, refusing incomplete or unexpanded credentials
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        Ok(Self {
            address: config.address,
            credentials: Arc::new(config.credentials),
            shutdown_tx: None,
            server_handle: None,
        })
    }

    /// Start serving in the background
    ///
    /// Returns the actual bound address (useful when using port 0)
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(&self.address).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let credentials = Arc::clone(&self.credentials);
        let handle = tokio::spawn(async move {
            run_server(listener, credentials, shutdown_rx).await;
        });
        self.server_handle = Some(handle);

        info!("Credential server listening on {}", addr);
        Ok(addr)
    }

    /// Shutdown the server
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }

    /// Serve until Ctrl-C
    pub async fn run(mut self) -> Result<(), ServerError> {
        self.start().await?;
        tokio::signal::ctrl_c().await?;
        info!("Shutting down credential server");
        self.shutdown().await;
        Ok(())
    }
}

/// Run the HTTP server loop
async fn run_server(
    listener: TcpListener,
    credentials: Arc<Credentials>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let credentials = Arc::clone(&credentials);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let credentials = Arc::clone(&credentials);
                        async move { handle_request(req, credentials).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {}", peer_addr, e);
                    }
                });
            }
        }
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    credentials: Arc<Credentials>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    info!("Handling {} {}", req.method(), req.uri().path());

    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, AUTH_PATH) => credentials_handler(&req, &credentials),
        (&Method::GET, "/health") => respond(
            StatusCode::OK,
            "application/json",
            Bytes::from_static(br#"{"status":"ok"}"#),
        ),
        (&Method::GET, "/metrics") => metrics_handler(),
        _ => respond(
            StatusCode::NOT_FOUND,
            "text/plain",
            Bytes::from_static(b"Not Found"),
        ),
    };
    Ok(response)
}

/// Extract a non-empty bearer token
fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Handle the credentials endpoint
fn credentials_handler<B>(req: &Request<B>, credentials: &Credentials) -> Response<Full<Bytes>> {
    if bearer_token(req).is_none() {
        warn!("Credential request without bearer token");
        metrics::record_auth_attempt(false);
        return respond(
            StatusCode::UNAUTHORIZED,
            "text/plain",
            Bytes::from_static(b"Unauthorized"),
        );
    }

    match serde_json::to_vec(credentials) {
        Ok(body) => {
            metrics::record_auth_attempt(true);
            info!(bucket = %credentials.bucket_name, "Issued credentials");
            respond(StatusCode::OK, "application/json", Bytes::from(body))
        }
        Err(e) => {
            error!("Failed to encode credentials: {}", e);
            metrics::record_error("encode_credentials");
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                Bytes::from_static(b"Internal Server Error"),
            )
        }
    }
}

/// Handle /metrics endpoint
fn metrics_handler() -> Response<Full<Bytes>> {
    match metrics::render() {
        Ok((content_type, body)) => respond(StatusCode::OK, &content_type, Bytes::from(body)),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                Bytes::from_static(b"Failed to encode metrics"),
            )
        }
    }
}

fn respond(status: StatusCode, content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
