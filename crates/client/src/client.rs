//! Async client
//!
//! Single-call primitives over the [`RequestExecutor`]. The recursive tree
//! operations live in [`crate::tree`].

use std::sync::Arc;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use http::Response;
use mt_core::types::DIRECTORY_CONTENT_TYPE;
use mt_core::{
    ClientConfig, ConfigLayer, DirEntry, Error, JsonObject, ResponseEnvelope, Result, Transport,
};

use crate::executor::{RequestDescriptor, RequestExecutor};
use crate::signer::RequestSigner;
use crate::transport::ReqwestTransport;

/// Page size for directory listings
pub const LIST_PAGE_SIZE: usize = 1024;

const LISTING_ACCEPT: &str = "application/x-json-stream";
const DEFAULT_OBJECT_CONTENT_TYPE: &str = "application/octet-stream";

/// Client for one account
///
/// Cheap to clone; clones share the signer and the HTTP connection pool.
#[derive(Clone)]
pub struct MantaClient {
    executor: Arc<RequestExecutor>,
    home: String,
}

impl MantaClient {
    /// Create a client with the reqwest transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(&config, Arc::new(transport))
    }

    /// Create a client from the environment and profile file
    pub fn from_env() -> Result<Self> {
        Self::new(mt_core::resolve(ConfigLayer::default())?)
    }

    /// Create a client over any transport
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let signer = RequestSigner::new(&config.credential)?;
        let executor =
            RequestExecutor::new(config.endpoint.clone(), signer, transport, config.retry);
        Ok(Self {
            executor: Arc::new(executor),
            home: config.home(),
        })
    }

    /// `/<account>/stor`
    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Run an arbitrary descriptor
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Response<Bytes>> {
        self.executor.execute(descriptor).await
    }

    /// Upload an object
    pub async fn put_object(
        &self,
        path: impl AsRef<[u8]>,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<ResponseEnvelope> {
        let content_type =
            HeaderValue::from_str(content_type.unwrap_or(DEFAULT_OBJECT_CONTENT_TYPE))
                .map_err(|e| Error::Config(format!("Invalid content type: {e}")))?;
        let descriptor = RequestDescriptor::put(path)
            .header(CONTENT_TYPE, content_type)
            .body(data);
        Ok(ResponseEnvelope::header_only(self.execute(descriptor).await?))
    }

    /// Download an object
    pub async fn get_object(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope<Bytes>> {
        let response = self.execute(RequestDescriptor::get(path)).await?;
        Ok(ResponseEnvelope::raw(response))
    }

    /// Download a newline-delimited text object
    pub async fn get_lines(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope<Vec<String>>> {
        let response = self.execute(RequestDescriptor::get(path)).await?;
        Ok(ResponseEnvelope::text_lines(response))
    }

    /// Download an object holding a single JSON document
    pub async fn get_json(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope<JsonObject>> {
        let response = self.execute(RequestDescriptor::get(path)).await?;
        ResponseEnvelope::json_object(response)
    }

    /// Metadata of an object or directory
    pub async fn head(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope> {
        let response = self.execute(RequestDescriptor::head(path)).await?;
        Ok(ResponseEnvelope::header_only(response))
    }

    /// Whether the path exists; only a 404 counts as absent
    pub async fn exists(&self, path: impl AsRef<[u8]>) -> Result<bool> {
        match self.head(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete one object or empty directory
    pub async fn delete(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope> {
        let response = self.execute(RequestDescriptor::delete(path)).await?;
        Ok(ResponseEnvelope::header_only(response))
    }

    /// Create one directory; the parent must exist
    pub async fn put_directory(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope> {
        let descriptor = RequestDescriptor::put(path)
            .header(CONTENT_TYPE, HeaderValue::from_static(DIRECTORY_CONTENT_TYPE));
        Ok(ResponseEnvelope::header_only(self.execute(descriptor).await?))
    }

    /// Every entry of a directory, in service order
    ///
    /// Pages through the listing with `limit`/`marker`. The service repeats
    /// the marker entry at the top of each following page; it is dropped.
    pub async fn list_directory(&self, path: impl AsRef<[u8]>) -> Result<Vec<DirEntry>> {
        let path = path.as_ref();
        let mut entries = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut descriptor = RequestDescriptor::get(path)
                .header(ACCEPT, HeaderValue::from_static(LISTING_ACCEPT))
                .query("limit", LIST_PAGE_SIZE.to_string());
            if let Some(m) = &marker {
                descriptor = descriptor.query("marker", m.clone());
            }

            let page: ResponseEnvelope<Vec<DirEntry>> =
                ResponseEnvelope::json_lines(self.execute(descriptor).await?);
            let page = page.into_payload();
            let fetched = page.len();

            let mut fresh: Vec<DirEntry> = page
                .into_iter()
                .filter(|e| marker.as_deref() != Some(e.name.as_str()))
                .collect();
            if fresh.is_empty() {
                break;
            }

            marker = fresh.last().map(|e| e.name.clone());
            entries.append(&mut fresh);

            if fetched < LIST_PAGE_SIZE {
                break;
            }
        }

        tracing::debug!(entries = entries.len(), "Listed directory");
        Ok(entries)
    }
}
