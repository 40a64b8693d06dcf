//! Blocking facade
//!
//! Drives the async [`MantaClient`] on a private current-thread runtime, so
//! signing, retries and tree walks are the exact same code. Must not be
//! called from inside another tokio runtime.

use bytes::Bytes;
use mt_core::{
    ClientConfig, DirEntry, Error, JsonObject, ResponseEnvelope, Result, TreeOperationResult,
};
use tokio::runtime::{Builder, Runtime};

use crate::client::MantaClient;

/// Synchronous client
pub struct BlockingClient {
    inner: MantaClient,
    runtime: Runtime,
}

impl BlockingClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::from_client(MantaClient::new(config)?)
    }

    /// Wrap an existing async client
    pub fn from_client(inner: MantaClient) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Io)?;
        Ok(Self { inner, runtime })
    }

    pub fn home(&self) -> &str {
        self.inner.home()
    }

    pub fn put_object(
        &self,
        path: impl AsRef<[u8]>,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<ResponseEnvelope> {
        self.runtime
            .block_on(self.inner.put_object(path, data, content_type))
    }

    pub fn get_object(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope<Bytes>> {
        self.runtime.block_on(self.inner.get_object(path))
    }

    pub fn get_json(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope<JsonObject>> {
        self.runtime.block_on(self.inner.get_json(path))
    }

    pub fn head(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope> {
        self.runtime.block_on(self.inner.head(path))
    }

    pub fn exists(&self, path: impl AsRef<[u8]>) -> Result<bool> {
        self.runtime.block_on(self.inner.exists(path))
    }

    pub fn delete(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope> {
        self.runtime.block_on(self.inner.delete(path))
    }

    pub fn put_directory(&self, path: impl AsRef<[u8]>) -> Result<ResponseEnvelope> {
        self.runtime.block_on(self.inner.put_directory(path))
    }

    pub fn list_directory(&self, path: impl AsRef<[u8]>) -> Result<Vec<DirEntry>> {
        self.runtime.block_on(self.inner.list_directory(path))
    }

    pub fn create_with_ancestors(&self, path: impl AsRef<[u8]>) -> Result<TreeOperationResult> {
        self.runtime.block_on(self.inner.create_with_ancestors(path))
    }

    pub fn delete_recursive(
        &self,
        path: impl AsRef<[u8]>,
        recursive: bool,
    ) -> Result<TreeOperationResult> {
        self.runtime
            .block_on(self.inner.delete_recursive(path, recursive))
    }
}
