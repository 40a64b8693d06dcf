//! Request execution: sign, send, classify, retry
//!
//! One logical call may make several physical attempts. Each attempt is
//! signed again with a fresh Date and correlation id. The decorator stage
//! ([`RequestExecutor::prepare`]) and the decision stage
//! ([`RetryPolicy::should_retry`]) stay separate so either can be tested
//! alone.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Request, Response};
use mt_core::response::REQUEST_ID_HEADER;
use mt_core::{
    AttemptOutcome, Error, RemoteError, RemotePath, Result, RetryPolicy, Transport,
    TransportFailure,
};
use serde::Deserialize;
use url::Url;

use crate::signer::{RequestSigner, SignedHeaders};

/// One logical call
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Raw path bytes, validated and normalized at execution
    pub path: Vec<u8>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// Turn error statuses into [`Error::Remote`]
    pub throw_on_error: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl AsRef<[u8]>) -> Self {
        Self {
            method,
            path: path.as_ref().to_vec(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            throw_on_error: true,
        }
    }

    pub fn get(path: impl AsRef<[u8]>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: impl AsRef<[u8]>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl AsRef<[u8]>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn head(path: impl AsRef<[u8]>) -> Self {
        Self::new(Method::HEAD, path)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Return error statuses to the caller instead of failing
    pub fn no_throw(mut self) -> Self {
        self.throw_on_error = false;
        self
    }
}

/// Sends descriptors through a transport with signing and retries
pub struct RequestExecutor {
    base_url: Url,
    signer: RequestSigner,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(
        base_url: Url,
        signer: RequestSigner,
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            base_url,
            signer,
            transport,
            retry,
        }
    }

    /// Absolute URL for a normalized path
    pub fn url_for(&self, path: &RemotePath, query: &[(String, String)]) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}{}", path.wire_path()));
        url.set_query(None);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        url
    }

    /// Build the request for one attempt
    pub fn prepare(
        &self,
        descriptor: &RequestDescriptor,
        url: &Url,
        signed: &SignedHeaders,
    ) -> Result<Request<Bytes>> {
        let mut builder = Request::builder()
            .method(descriptor.method.clone())
            .uri(url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(descriptor.headers.clone());
            signed.apply(headers)?;
        }
        builder
            .body(descriptor.body.clone().unwrap_or_default())
            .map_err(|e| Error::InvalidPath(format!("Cannot build request for {url}: {e}")))
    }

    /// Run one logical call to completion
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Response<Bytes>> {
        let path = RemotePath::from_bytes(&descriptor.path)?;
        let url = self.url_for(&path, &descriptor.query);

        let mut attempt = 0u32;
        let result = loop {
            let signed = self.signer.sign_now()?;
            let request = self.prepare(&descriptor, &url, &signed)?;

            tracing::debug!(
                method = %descriptor.method,
                path = %path,
                attempt,
                request_id = %signed.request_id,
                "Sending request"
            );

            let result = self.transport.send(request).await;
            let outcome = match &result {
                Ok(response) => AttemptOutcome::Status(response.status().as_u16()),
                Err(_) => AttemptOutcome::ConnectionFailure,
            };

            let context = self.retry.context(attempt, outcome);
            if !RetryPolicy::should_retry(&context) {
                break result;
            }

            let delay = self.retry.backoff.delay(context.attempt);
            tracing::warn!(
                method = %descriptor.method,
                path = %path,
                attempt = context.attempt,
                max_retries = self.retry.max_retries,
                outcome = ?outcome,
                backoff_ms = delay.as_millis() as u64,
                "Retrying after transient failure"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt = context.attempt;
        };

        finish(result, &path, descriptor.throw_on_error)
    }
}

fn finish(
    result: std::result::Result<Response<Bytes>, TransportFailure>,
    path: &RemotePath,
    throw_on_error: bool,
) -> Result<Response<Bytes>> {
    match result {
        Err(failure) => Err(Error::Transport {
            path: path.to_string(),
            message: failure.to_string(),
        }),
        Ok(response) if throw_on_error && response.status().as_u16() >= 400 => {
            Err(Error::Remote(remote_error(&response, path)))
        }
        Ok(response) => Ok(response),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Build the structured error for an error response
///
/// An absent or unparsable body leaves code and message empty.
fn remote_error(response: &Response<Bytes>, path: &RemotePath) -> RemoteError {
    let body = serde_json::from_slice::<ErrorBody>(response.body()).ok();
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (server_code, server_message) = match body {
        Some(body) => (body.code, body.message),
        None => (None, None),
    };

    RemoteError {
        status: response.status().as_u16(),
        server_code,
        server_message,
        request_id,
        path: path.to_string(),
    }
}
