//! mt-client: signed HTTP client for Manta-style object storage
//!
//! Builds on mt-core and provides:
//! - `RequestSigner` for HTTP Signature authentication
//! - `RequestExecutor`, which signs every attempt and applies the retry policy
//! - `MantaClient` with single-call primitives and recursive tree operations
//! - `BlockingClient`, a synchronous facade over the same code path
//! - `ReqwestTransport`, the default HTTP transport

pub mod blocking;
pub mod client;
pub mod executor;
pub mod signer;
pub mod transport;
mod tree;

pub use blocking::BlockingClient;
pub use client::{LIST_PAGE_SIZE, MantaClient};
pub use executor::{RequestDescriptor, RequestExecutor};
pub use signer::{RequestSigner, SignedHeaders, http_date};
pub use transport::{ReqwestTransport, USER_AGENT};
