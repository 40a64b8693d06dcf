//! Wire-level behavior through the reqwest transport

mod support;

use mt_client::MantaClient;
use mt_core::Error;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, retries: u32) -> MantaClient {
    MantaClient::new(support::config(&server.uri(), retries)).unwrap()
}

#[tokio::test]
async fn test_signed_headers_on_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/acct/stor/file.txt"))
        .and(header_exists("date"))
        .and(header_exists("authorization"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-request-id", "srv-1"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let head = client.head("//acct//stor/file.txt").await.unwrap();
    assert_eq!(head.request_id(), Some("srv-1"));

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers["authorization"].to_str().unwrap();
    assert!(auth.starts_with(
        "Signature keyId=\"/acct/keys/0a:e2:99:db:00:25:3d:37:ce:78:3c:2e:a3:56:6f:04\",algorithm=\"rsa-sha256\",signature=\""
    ));
    let date = requests[0].headers["date"].to_str().unwrap();
    assert!(date.ends_with(" GMT"));
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/acct/stor/dir"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/acct/stor/dir"))
        .and(header("content-type", "application/json; type=directory"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    client.put_directory("/acct/stor/dir").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let ids: Vec<&str> = requests
        .iter()
        .map(|r| r.headers["x-request-id"].to_str().unwrap())
        .collect();
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acct/stor/flaky"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "code": "InternalError",
            "message": "try later"
        })))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let err = client.get_object("/acct/stor/flaky").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.server_code(), Some("InternalError"));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acct/stor/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-request-id", "srv-404")
                .set_body_json(serde_json::json!({
                    "code": "ResourceNotFound",
                    "message": "/acct/stor/missing was not found"
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    match client.get_object("/acct/stor/missing").await.unwrap_err() {
        Error::Remote(e) => {
            assert_eq!(e.status, 404);
            assert_eq!(e.server_code.as_deref(), Some("ResourceNotFound"));
            assert_eq!(e.request_id.as_deref(), Some("srv-404"));
            assert_eq!(e.path, "/acct/stor/missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_directory_over_http() {
    let server = MockServer::start().await;

    let body = concat!(
        "{\"name\":\"docs\",\"type\":\"directory\",\"mtime\":\"2024-05-01T12:00:00.000Z\"}\n",
        "{\"name\":\"a.txt\",\"type\":\"object\",\"mtime\":\"2024-05-01T12:00:00.000Z\",\"size\":5,\"etag\":\"abc\"}\n",
    );

    Mock::given(method("GET"))
        .and(path("/acct/stor"))
        .and(query_param("limit", "1024"))
        .and(header("accept", "application/x-json-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-json-stream; type=directory")
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 0);
    let entries = client.list_directory("/acct/stor").await.unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_dir());
    assert_eq!(entries[1].size, Some(5));
    assert_eq!(entries[1].etag.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    // Nothing listens on port 1
    let client = MantaClient::new(support::config("http://127.0.0.1:1", 1)).unwrap();

    let err = client.head("/acct/stor/x").await.unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
    assert_eq!(err.exit_code(), 3);
}
