//! Typed views over a raw HTTP response
//!
//! The calling operation decides which view to build; the content type is
//! never used to guess. Headers and status stay available on every view.

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A single JSON object payload
pub type JsonObject = Map<String, Value>;

/// Header name carrying the correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Response headers plus a payload interpreted one way
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<P = ()> {
    status: StatusCode,
    headers: HeaderMap,
    payload: P,
}

impl<P> ResponseEnvelope<P> {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text, if present and visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Correlation id echoed by the service
    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }
}

fn split(response: Response<Bytes>) -> (StatusCode, HeaderMap, Bytes) {
    let (parts, body) = response.into_parts();
    (parts.status, parts.headers, body)
}

impl ResponseEnvelope<()> {
    /// Headers only, the body is dropped
    pub fn header_only(response: Response<Bytes>) -> Self {
        let (status, headers, _) = split(response);
        Self {
            status,
            headers,
            payload: (),
        }
    }
}

impl ResponseEnvelope<Bytes> {
    /// Body kept as raw bytes
    pub fn raw(response: Response<Bytes>) -> Self {
        let (status, headers, payload) = split(response);
        Self {
            status,
            headers,
            payload,
        }
    }
}

impl ResponseEnvelope<Vec<String>> {
    /// Newline-delimited text; lines are trimmed and blanks skipped
    pub fn text_lines(response: Response<Bytes>) -> Self {
        let (status, headers, body) = split(response);
        let payload = String::from_utf8_lossy(&body)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            status,
            headers,
            payload,
        }
    }
}

impl<T: DeserializeOwned> ResponseEnvelope<Vec<T>> {
    /// Newline-delimited JSON records; blank or unparsable lines are skipped
    pub fn json_lines(response: Response<Bytes>) -> Self {
        let (status, headers, body) = split(response);
        let payload = body
            .split(|b| *b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .filter_map(|line| match serde_json::from_slice::<T>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unparsable listing line");
                    None
                }
            })
            .collect();
        Self {
            status,
            headers,
            payload,
        }
    }
}

impl ResponseEnvelope<JsonObject> {
    /// A single JSON object body
    pub fn json_object(response: Response<Bytes>) -> Result<Self> {
        let (status, headers, body) = split(response);
        let payload = serde_json::from_slice::<JsonObject>(&body)
            .map_err(|e| Error::Decode(format!("expected a JSON object: {e}")))?;
        Ok(Self {
            status,
            headers,
            payload,
        })
    }

    /// Field of the object
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
