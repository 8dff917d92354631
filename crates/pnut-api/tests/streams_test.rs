#![allow(clippy::unwrap_used)]
// Integration tests for stream operations using wiremock.

use pnut_api::{Client, Config, Error, StreamParams};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let config = Config::new("test-client", "test-secret".to_string())
        .with_base_url(Url::parse(&server.uri()).unwrap())
        .with_token("test-token");
    let client = Client::new(config).unwrap();
    (server, client)
}

fn stream_envelope(key: &str, object_types: &[&str]) -> Value {
    json!({
        "meta": {"code": 200},
        "data": {
            "created_at": "2018-03-02T21:00:00Z",
            "endpoint": "https://stream.pnut.io/v0/app",
            "id": "2092",
            "key": key,
            "object_types": object_types,
            "type": "long_poll"
        }
    })
}

fn not_found_envelope() -> Value {
    json!({
        "meta": {"code": 404, "error_message": "Stream not found"}
    })
}

// ── Retrieval tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_retrieve_stream() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/streams/mykey"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(stream_envelope("mykey", &["post", "bookmark", "follow"])),
        )
        .mount(&server)
        .await;

    let (meta, stream) = client
        .retrieve_stream(&StreamParams::key("mykey"))
        .await
        .unwrap();

    assert_eq!(meta.code, 200);
    assert_eq!(stream.key, "mykey");
    assert_eq!(stream.object_types, ["post", "bookmark", "follow"]);
    assert_eq!(stream.id.as_deref(), Some("2092"));
    assert_eq!(stream.stream_type.as_deref(), Some("long_poll"));
    assert!(stream.created_at.is_some());
}

#[tokio::test]
async fn test_retrieve_stream_requires_a_key() {
    let (server, client) = setup().await;

    let result = client.retrieve_stream(&StreamParams::default()).await;

    assert!(
        matches!(result, Err(Error::InvalidParameters { key: "key" })),
        "expected InvalidParameters, got: {result:?}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Creation and update tests ───────────────────────────────────────

#[tokio::test]
async fn test_create_stream_sends_a_long_poll_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(stream_envelope("news", &["post", "bookmark", "follow"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let params = StreamParams::key("news").with_object_types(["post", "bookmark", "follow"]);
    let (_, stream) = client.create_stream(&params).await.unwrap();

    assert_eq!(stream.key, "news");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["type"], "long_poll");
    assert_eq!(body["key"], "news");
    // Subscription order travels to the server untouched.
    assert_eq!(body["object_types"], json!(["post", "bookmark", "follow"]));
}

#[tokio::test]
async fn test_create_stream_requires_object_types() {
    let (server, client) = setup().await;

    let result = client.create_stream(&StreamParams::key("news")).await;

    assert!(
        matches!(result, Err(Error::InvalidParameters { key: "object_types" })),
        "expected InvalidParameters, got: {result:?}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_stream_sends_only_object_types() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/streams/news"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(stream_envelope("news", &["follow"])),
        )
        .mount(&server)
        .await;

    let params = StreamParams::key("news").with_object_types(["follow"]);
    let (_, stream) = client.update_stream(&params).await.unwrap();

    assert_eq!(stream.object_types, ["follow"]);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["object_types"], json!(["follow"]));
    // The key travels in the path, never the body, and the delivery
    // type is immutable.
    assert!(body.get("key").is_none());
    assert!(body.get("type").is_none());
}

#[tokio::test]
async fn test_update_stream_requires_object_types() {
    let (server, client) = setup().await;

    let result = client.update_stream(&StreamParams::key("news")).await;

    assert!(
        matches!(result, Err(Error::InvalidParameters { key: "object_types" })),
        "expected InvalidParameters, got: {result:?}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Removal tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_remove_stream() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/streams/oldkey"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(stream_envelope("oldkey", &["post"])),
        )
        .mount(&server)
        .await;

    let (meta, stream) = client
        .remove_stream(&StreamParams::key("oldkey"))
        .await
        .unwrap();

    assert_eq!(meta.code, 200);
    assert_eq!(stream.key, "oldkey");
}

// ── Retrieve-or-create tests ────────────────────────────────────────

#[tokio::test]
async fn test_retrieve_or_create_returns_the_existing_stream() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/streams/mykey"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(stream_envelope("mykey", &["post"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let params = StreamParams::key("mykey").with_object_types(["post"]);
    let (_, stream) = client.retrieve_or_create_stream(&params).await.unwrap();

    assert_eq!(stream.key, "mykey");
}

#[tokio::test]
async fn test_retrieve_or_create_creates_when_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/streams/fresh"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_envelope()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(stream_envelope("fresh", &["post"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let params = StreamParams::key("fresh").with_object_types(["post"]);
    let (_, stream) = client.retrieve_or_create_stream(&params).await.unwrap();

    assert_eq!(stream.key, "fresh");
    assert_eq!(stream.id.as_deref(), Some("2092"));
}

#[tokio::test]
async fn test_retrieve_or_create_passes_other_errors_through() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/streams/mykey"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "meta": {"code": 403, "error_message": "Forbidden"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/streams"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let params = StreamParams::key("mykey").with_object_types(["post"]);
    let err = client
        .retrieve_or_create_stream(&params)
        .await
        .unwrap_err();

    assert_eq!(err.api_code(), Some(403));
}

// ── Authorized user ids ─────────────────────────────────────────────

#[tokio::test]
async fn test_authenticated_ids() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/apps/me/users/ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"code": 200},
            "data": ["1", "22", "333"]
        })))
        .mount(&server)
        .await;

    let (meta, ids) = client.authenticated_ids().await.unwrap();

    assert_eq!(meta.code, 200);
    assert_eq!(ids, ["1", "22", "333"]);
}
