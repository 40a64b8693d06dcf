//! Directory listing entries and tree operation results

use http::HeaderMap;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Content type the service uses for directory PUTs
pub const DIRECTORY_CONTENT_TYPE: &str = "application/json; type=directory";

/// Content type the service reports for directories on HEAD/GET
pub const DIRECTORY_LISTING_CONTENT_TYPE: &str = "application/x-json-stream; type=directory";

/// Kind of a namespace entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Directory,
    Object,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Directory => write!(f, "directory"),
            EntryType::Object => write!(f, "object"),
        }
    }
}

/// One line of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<Timestamp>,

    /// Object size in bytes, absent for directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Number of stored copies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<u32>,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

/// Whether a response's content type marks a directory
pub fn is_directory(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.replace(' ', "") == DIRECTORY_LISTING_CONTENT_TYPE.replace(' ', ""))
        .unwrap_or(false)
}

/// Aggregate of a recursive directory operation
///
/// `all_headers` lists the response headers of every call the operation
/// made, in the order the calls completed. `headers` is the response of the
/// targeted path itself and is always the last element of `all_headers`.
#[derive(Debug, Clone, Default)]
pub struct TreeOperationResult {
    pub headers: HeaderMap,
    pub all_headers: Vec<HeaderMap>,
}

impl TreeOperationResult {
    /// Number of calls recorded
    pub fn steps(&self) -> usize {
        self.all_headers.len()
    }

    /// Record an intermediate step
    pub fn push_step(&mut self, headers: HeaderMap) {
        self.all_headers.push(headers);
    }

    /// Merge a nested operation's steps, keeping their order
    pub fn absorb(&mut self, nested: TreeOperationResult) {
        self.all_headers.extend(nested.all_headers);
    }

    /// Record the targeted call and seal the result
    pub fn finish(mut self, headers: HeaderMap) -> Self {
        self.all_headers.push(headers.clone());
        self.headers = headers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_dir_entry_deserialize() {
        let dir: DirEntry = serde_json::from_str(
            r#"{"name":"photos","type":"directory","mtime":"2024-03-01T10:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.size, None);
        assert!(dir.mtime.is_some());

        let obj: DirEntry = serde_json::from_str(
            r#"{"name":"a.txt","type":"object","mtime":"2024-03-01T10:00:00Z","size":12,"etag":"e1","durability":2}"#,
        )
        .unwrap();
        assert!(!obj.is_dir());
        assert_eq!(obj.size, Some(12));
        assert_eq!(obj.durability, Some(2));
    }

    #[test]
    fn test_is_directory() {
        let mut headers = HeaderMap::new();
        assert!(!is_directory(&headers));

        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-json-stream; type=directory"),
        );
        assert!(is_directory(&headers));

        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        assert!(!is_directory(&headers));
    }

    #[test]
    fn test_tree_result_ordering() {
        let step = |id: &'static str| {
            let mut h = HeaderMap::new();
            h.insert("x-request-id", HeaderValue::from_static(id));
            h
        };

        let mut nested = TreeOperationResult::default();
        nested.push_step(step("child-object"));
        let nested = nested.finish(step("child-dir"));

        let mut result = TreeOperationResult::default();
        result.push_step(step("top-object"));
        result.absorb(nested);
        let result = result.finish(step("root"));

        let ids: Vec<&str> = result
            .all_headers
            .iter()
            .map(|h| h["x-request-id"].to_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["top-object", "child-object", "child-dir", "root"]);
        assert_eq!(result.headers["x-request-id"], "root");
        assert_eq!(result.steps(), 4);
    }
}
