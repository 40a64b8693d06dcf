//! reqwest-backed transport
//!
//! Connection pooling, TLS and the per-attempt timeout are reqwest's
//! concern. Everything that fails before a complete response is read is
//! reported as a [`TransportFailure`].

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use mt_core::{ClientConfig, Error, FailureKind, Result, Transport, TransportFailure};

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("mt/", env!("CARGO_PKG_VERSION"));

/// HTTP transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client honoring the configured timeout and TLS toggle
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.tls_insecure)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn classify(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_connect() {
        FailureKind::Connect
    } else if error.is_body() || error.is_decode() {
        FailureKind::Body
    } else {
        FailureKind::Other
    }
}

fn failure(error: reqwest::Error) -> TransportFailure {
    TransportFailure::new(classify(&error), error.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: Request<Bytes>,
    ) -> std::result::Result<Response<Bytes>, TransportFailure> {
        let request = reqwest::Request::try_from(request)
            .map_err(|e| TransportFailure::new(FailureKind::Other, e.to_string()))?;

        let response = self.client.execute(request).await.map_err(failure)?;

        let mut builder = Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }

        let body = response.bytes().await.map_err(failure)?;

        builder
            .body(body)
            .map_err(|e| TransportFailure::new(FailureKind::Other, e.to_string()))
    }
}
