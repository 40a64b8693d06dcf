//! Remote path normalization and classification
//!
//! Remote paths look like `/<account>/stor/dir/object`. Callers may hand
//! in raw bytes; anything that is not UTF-8 is rejected before a request
//! is built.

use std::fmt;

use crate::error::{Error, Result};

/// A normalized remote path
///
/// Internally stored without a leading slash and with every run of `/`
/// collapsed to one. [`fmt::Display`] renders it with exactly one leading
/// slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath {
    normalized: String,
}

impl RemotePath {
    /// Validate and normalize raw path bytes
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw).map_err(|e| {
            Error::InvalidPath(format!(
                "path is not valid UTF-8 (invalid byte at offset {})",
                e.valid_up_to()
            ))
        })?;
        Ok(Self::parse(text))
    }

    /// Normalize an already-valid string path
    pub fn parse(path: &str) -> Self {
        Self {
            normalized: normalize(path),
        }
    }

    /// The namespace root (`/`)
    pub fn root() -> Self {
        Self {
            normalized: String::new(),
        }
    }

    /// Normalized form without the leading slash
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Whether this is the namespace root
    pub fn is_root(&self) -> bool {
        self.segments().next().is_none()
    }

    /// Non-empty path segments in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.normalized.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, if any
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Parent directory, `None` at the root
    pub fn parent(&self) -> Option<Self> {
        let segments: Vec<&str> = self.segments().collect();
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            normalized: segments[..segments.len() - 1].join("/"),
        })
    }

    /// Append a child name
    pub fn join(&self, name: &str) -> Self {
        let base = self.normalized.trim_end_matches('/');
        if base.is_empty() {
            Self::parse(name)
        } else {
            Self::parse(&format!("{base}/{name}"))
        }
    }

    /// Every prefix of this path, shortest first, each with a leading slash
    ///
    /// `/acct/stor/a` yields `/acct`, `/acct/stor`, `/acct/stor/a`.
    pub fn prefixes(&self) -> Vec<Self> {
        let mut prefix = String::new();
        let mut out = Vec::new();
        for segment in self.segments() {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            out.push(Self {
                normalized: prefix.clone(),
            });
        }
        out
    }

    /// Percent-encoded path for the request line, with one leading slash
    pub fn wire_path(&self) -> String {
        let encoded: Vec<String> = self
            .normalized
            .split('/')
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("/{}", encoded.join("/"))
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.normalized)
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Collapse repeated slashes and strip the leading one
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = true;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                out.push('/');
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}

/// Whether a prefix names the namespace root or its first level below it
///
/// These directories (`/`, `/acct`, `/acct/stor`) are provisioned by the
/// service and are never created by the client. A prefix qualifies when it
/// is `/` or has at most one further `/` after the leading one.
pub fn is_root_or_top_level(prefix: &str) -> bool {
    if prefix.is_empty() || prefix == "/" {
        return true;
    }
    let rest = prefix.strip_prefix('/').unwrap_or(prefix);
    rest.trim_end_matches('/').matches('/').count() <= 1
}
