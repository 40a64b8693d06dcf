//! Error types for mt-core
//!
//! Every fallible operation in the workspace returns [`Result`]. Remote
//! failures carry the parsed server error body as named fields.

use thiserror::Error;

/// Result type alias for mt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for mt operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path is not well-formed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Connection-level failure that survived all retries
    #[error("Transport error for {path}: {message}")]
    Transport { path: String, message: String },

    /// HTTP error status returned by the service
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Request signing failed (bad key material or unsupported algorithm)
    #[error("Signing error: {0}")]
    Signing(String),

    /// Response payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured error for an HTTP error status.
///
/// `server_code` and `server_message` come from the JSON error body and
/// stay `None` when the body is absent or unparsable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.render())]
pub struct RemoteError {
    /// HTTP status code
    pub status: u16,
    /// Service error code, e.g. `ResourceNotFound`
    pub server_code: Option<String>,
    /// Human-readable message from the service
    pub server_message: Option<String>,
    /// Correlation id echoed by the service
    pub request_id: Option<String>,
    /// Path the request was issued against
    pub path: String,
}

impl RemoteError {
    fn render(&self) -> String {
        let mut msg = format!("HTTP {} for {}", self.status, self.path);
        if let Some(code) = &self.server_code {
            msg.push_str(&format!(" ({code})"));
        }
        if let Some(message) = &self.server_message {
            msg.push_str(&format!(": {message}"));
        }
        if let Some(id) = &self.request_id {
            msg.push_str(&format!(" [request-id: {id}]"));
        }
        msg
    }
}

/// Server code returned when the caller holds no role tag on a resource
pub const NO_MATCHING_ROLE_TAG: &str = "NoMatchingRoleTag";

impl Error {
    /// Get the exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidPath(_) => 2,
            Error::Transport { .. } => 3,
            Error::Signing(_) => 4,
            Error::Remote(e) => match e.status {
                401 | 403 => 4,
                404 => 5,
                409 | 412 => 6,
                500.. => 3,
                _ => 1,
            },
            Error::Decode(_) | Error::Io(_) => 1,
        }
    }

    /// HTTP status when this is a remote error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote(e) => Some(e.status),
            _ => None,
        }
    }

    /// Service error code when this is a remote error with a parsed body
    pub fn server_code(&self) -> Option<&str> {
        match self {
            Error::Remote(e) => e.server_code.as_deref(),
            _ => None,
        }
    }

    /// Whether the service reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the service rejected the call for lack of a role tag
    pub fn is_no_matching_role_tag(&self) -> bool {
        self.server_code() == Some(NO_MATCHING_ROLE_TAG)
    }
}
