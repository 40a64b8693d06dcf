//! mt-core: Core library for the mt object storage client
//!
//! This crate provides the SDK-independent pieces of the client:
//! - Configuration resolution
//! - Error types
//! - Remote path normalization and classification
//! - Retry classification
//! - Typed response views and listing types
//! - The `Transport` trait the request executor sends through
//!
//! Nothing here performs network I/O or touches key material, so the
//! request pipeline can be tested against in-memory transports.

pub mod config;
pub mod error;
pub mod path;
pub mod response;
pub mod retry;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, ConfigLayer, ConfigManager, Credential, SignatureAlgorithm, resolve};
pub use error::{Error, RemoteError, Result};
pub use path::{RemotePath, is_root_or_top_level};
pub use response::{JsonObject, ResponseEnvelope};
pub use retry::{AttemptOutcome, Backoff, RetryBuilder, RetryContext, RetryPolicy};
pub use transport::{FailureKind, Transport, TransportFailure};
pub use types::{DirEntry, EntryType, TreeOperationResult};
