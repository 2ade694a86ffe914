//! HTTP transport for Recon requests.
//!
//! The client only needs "POST these JSON bytes, give me the body back";
//! [`Transport`] is that seam, and [`HttpTransport`] implements it with reqwest.

use std::error::Error as _;
use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

/// Transport-level failures. None of these are retried.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Connect(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx status. `body` holds whatever the server sent, possibly a
    /// JSON object with an `error` field.
    #[error("HTTP {status}")]
    Status { status: u16, body: Vec<u8> },

    #[error("{0}")]
    Other(String),
}

/// Where requests go: `{scheme}://{host}:{port}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

impl Endpoint {
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        // Bare IPv6 literals need brackets inside a URL.
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("{scheme}://[{}]:{}/", self.host, self.port)
        } else {
            format!("{scheme}://{}:{}/", self.host, self.port)
        }
    }
}

/// Sends one JSON request and returns the raw response body.
///
/// Implementations must bound the wait by `timeout` and report non-2xx
/// responses as [`TransportError::Status`].
pub trait Transport: Send + Sync {
    fn post(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // `Err` means one is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .user_agent(concat!("recon-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(error_chain(&e)))?;
        Ok(Self { http })
    }

    /// Use a preconfigured reqwest client (custom proxies, roots, ...).
    pub const fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    async fn post(
        &self,
        endpoint: &Endpoint,
        body: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let resp = self
            .http
            .post(endpoint.url())
            .header(CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(&e, timeout))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| classify(&e, timeout))?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: bytes.to_vec(),
            });
        }
        Ok(bytes.to_vec())
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(error_chain(err))
    } else {
        TransportError::Other(error_chain(err))
    }
}

/// Render an error with its sources, e.g. `error sending request: Connection refused`.
fn error_chain(err: &reqwest::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
