//! Transport seam
//!
//! The executor only needs "send one request, get one response or a
//! connection-level failure". Implementations own connection pooling, TLS
//! and per-attempt timeouts.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};

/// A request that never produced an HTTP response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Rough classification of a connection-level failure, for logs only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connect,
    Timeout,
    Body,
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Connect => write!(f, "connect failed"),
            FailureKind::Timeout => write!(f, "timed out"),
            FailureKind::Body => write!(f, "body transfer failed"),
            FailureKind::Other => write!(f, "request failed"),
        }
    }
}

impl TransportFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Sends a fully built request
///
/// Requests carry an absolute URI. Responses are fully buffered.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: Request<Bytes>,
    ) -> std::result::Result<Response<Bytes>, TransportFailure>;
}
