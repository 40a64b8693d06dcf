//! In-memory namespace used by the integration tests
//!
//! Speaks just enough of the service protocol for the client: directory and
//! object PUT, paged NDJSON listings, HEAD, and DELETE that refuses
//! non-empty directories. Every request is recorded.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response};
use mt_client::MantaClient;
use mt_core::{ClientConfig, ConfigLayer, Transport, TransportFailure};

pub const KEY: &str = include_str!("../fixtures/id_rsa.pem");

const DIR_TYPE: &str = "application/x-json-stream; type=directory";

#[derive(Debug, Clone)]
enum Node {
    Dir,
    Object(Bytes),
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    calls: Vec<(Method, String)>,
    role_tag_denied: Vec<String>,
    failures: HashMap<(Method, String), (u16, String)>,
}

pub struct FakeManta {
    state: Mutex<State>,
}

impl FakeManta {
    /// Namespace with `/acct` and `/acct/stor` provisioned
    pub fn new() -> Arc<Self> {
        let fake = Self {
            state: Mutex::new(State::default()),
        };
        fake.add_dir("/acct");
        fake.add_dir("/acct/stor");
        Arc::new(fake)
    }

    pub fn add_dir(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(key(path), Node::Dir);
    }

    pub fn add_object(&self, path: &str, data: &'static str) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(key(path), Node::Object(Bytes::from_static(data.as_bytes())));
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().unwrap().nodes.contains_key(&key(path))
    }

    /// Every existing path, sorted
    pub fn snapshot(&self) -> Vec<String> {
        self.state.lock().unwrap().nodes.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Paths of recorded calls with the given method
    pub fn calls_with(&self, method: Method) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// PUTs on `path` fail with `NoMatchingRoleTag`
    pub fn deny_role_tag(&self, path: &str) {
        self.state.lock().unwrap().role_tag_denied.push(key(path));
    }

    /// Calls matching method and path always fail with the given status
    pub fn fail_on(&self, method: Method, path: &str, status: u16, code: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((method, key(path)), (status, code.to_string()));
    }

    fn handle(&self, request: &Request<Bytes>) -> Response<Bytes> {
        let path = key(request.uri().path());
        let method = request.method().clone();
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let mut state = self.state.lock().unwrap();
        state.calls.push((method.clone(), path.clone()));

        if let Some((status, code)) = state.failures.get(&(method.clone(), path.clone())) {
            return error(*status, code, &request_id);
        }

        match method {
            Method::PUT => {
                if state.role_tag_denied.contains(&path) {
                    return error(403, "NoMatchingRoleTag", &request_id);
                }
                let parent = parent(&path);
                if !matches!(state.nodes.get(&parent), Some(Node::Dir)) {
                    return error(404, "DirectoryDoesNotExist", &request_id);
                }
                let is_dir = request
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .map(|ct| ct.contains("type=directory"))
                    .unwrap_or(false);
                let node = if is_dir {
                    Node::Dir
                } else {
                    Node::Object(request.body().clone())
                };
                state.nodes.insert(path, node);
                empty(204, &request_id, None)
            }
            Method::HEAD => match state.nodes.get(&path) {
                Some(Node::Dir) => empty(200, &request_id, Some(DIR_TYPE)),
                Some(Node::Object(_)) => empty(200, &request_id, Some("application/octet-stream")),
                None => empty(404, &request_id, None),
            },
            Method::GET => match state.nodes.get(&path) {
                Some(Node::Dir) => {
                    let query = parse_query(request.uri().query().unwrap_or(""));
                    let limit: usize = query
                        .get("limit")
                        .and_then(|l| l.parse().ok())
                        .unwrap_or(usize::MAX);
                    let marker = query.get("marker").cloned().unwrap_or_default();
                    let body: String = children(&state.nodes, &path)
                        .into_iter()
                        .filter(|(name, _)| name.as_str() >= marker.as_str())
                        .take(limit)
                        .map(|(name, node)| match node {
                            Node::Dir => format!(
                                "{{\"name\":\"{name}\",\"type\":\"directory\",\"mtime\":\"2024-01-01T00:00:00.000Z\"}}\n"
                            ),
                            Node::Object(data) => format!(
                                "{{\"name\":\"{name}\",\"type\":\"object\",\"mtime\":\"2024-01-01T00:00:00.000Z\",\"size\":{}}}\n",
                                data.len()
                            ),
                        })
                        .collect();
                    Response::builder()
                        .status(200)
                        .header("content-type", DIR_TYPE)
                        .header("x-request-id", request_id)
                        .body(Bytes::from(body))
                        .unwrap()
                }
                Some(Node::Object(data)) => Response::builder()
                    .status(200)
                    .header("x-request-id", request_id)
                    .body(data.clone())
                    .unwrap(),
                None => error(404, "ResourceNotFound", &request_id),
            },
            Method::DELETE => match state.nodes.get(&path) {
                None => error(404, "ResourceNotFound", &request_id),
                Some(Node::Dir) if !children(&state.nodes, &path).is_empty() => {
                    error(400, "DirectoryNotEmpty", &request_id)
                }
                Some(_) => {
                    state.nodes.remove(&path);
                    empty(204, &request_id, None)
                }
            },
            _ => error(405, "BadMethod", &request_id),
        }
    }
}

#[async_trait]
impl Transport for FakeManta {
    async fn send(
        &self,
        request: Request<Bytes>,
    ) -> std::result::Result<Response<Bytes>, TransportFailure> {
        Ok(self.handle(&request))
    }
}

fn key(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

fn children(nodes: &BTreeMap<String, Node>, dir: &str) -> Vec<(String, Node)> {
    let prefix = format!("{dir}/");
    nodes
        .iter()
        .filter_map(|(p, node)| {
            let rest = p.strip_prefix(&prefix)?;
            (!rest.contains('/')).then(|| (rest.to_string(), node.clone()))
        })
        .collect()
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn empty(status: u16, request_id: &str, content_type: Option<&str>) -> Response<Bytes> {
    let mut builder = Response::builder()
        .status(status)
        .header("x-request-id", request_id);
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    builder.body(Bytes::new()).unwrap()
}

fn error(status: u16, code: &str, request_id: &str) -> Response<Bytes> {
    Response::builder()
        .status(status)
        .header("x-request-id", request_id)
        .header("content-type", "application/json")
        .body(Bytes::from(format!(
            "{{\"code\":\"{code}\",\"message\":\"{code} (fake)\"}}"
        )))
        .unwrap()
}

/// Configuration for account `acct` with the test key
pub fn config(url: &str, retries: u32) -> ClientConfig {
    ConfigLayer {
        url: Some(url.to_string()),
        user: Some("acct".to_string()),
        key_id: Some("0a:e2:99:db:00:25:3d:37:ce:78:3c:2e:a3:56:6f:04".to_string()),
        key_content: Some(KEY.to_string()),
        retries: Some(retries),
        ..Default::default()
    }
    .into_config(None)
    .unwrap()
}

/// Client wired to the fake
pub fn client(fake: &Arc<FakeManta>) -> MantaClient {
    MantaClient::with_transport(&config("https://manta.test", 3), fake.clone()).unwrap()
}
