#![allow(clippy::unwrap_used)]
// Integration tests for `RtdbClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aquadash_api::{CACHE_BUST_PARAM, Error, RtdbClient, TransportConfig, VALUE_FIELD};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RtdbClient) {
    let server = MockServer::start().await;
    let client = RtdbClient::new(&TransportConfig::default()).unwrap();
    (server, client)
}

fn doc_url(server: &MockServer, suffix: &str) -> Url {
    Url::parse(&format!("{}{suffix}", server.uri())).unwrap()
}

// ── GET tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_document_is_cache_busted_and_no_store() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/db/X.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"LEVEL": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client
        .get_document(&doc_url(&server, "/db/X.json"))
        .await
        .unwrap();
    assert_eq!(doc.get("LEVEL"), Some(&json!(42)));

    let requests = server.received_requests().await.unwrap();
    let req = &requests[0];
    assert!(
        req.url.query_pairs().any(|(k, _)| k == CACHE_BUST_PARAM),
        "missing cache-buster in {}",
        req.url
    );
    let cache_control = req.headers.get("cache-control").unwrap().to_str().unwrap();
    assert!(cache_control.contains("no-store"));
    let pragma = req.headers.get("pragma").unwrap().to_str().unwrap();
    assert_eq!(pragma, "no-cache");
}

#[tokio::test]
async fn test_get_fields_extracts_requested_keys() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/db/plant.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TANK_LEVEL": 3.4,
            "PUMP_1": {"status": 1, "fecha": "01.01.25..08.00"},
            "UNUSED": true
        })))
        .mount(&server)
        .await;

    let fields = vec!["TANK_LEVEL".to_string(), "PUMP_1".to_string()];
    let doc = client
        .get_fields(&doc_url(&server, "/db/plant.json"), &fields)
        .await
        .unwrap();

    assert_eq!(
        serde_json::Value::Object(doc),
        json!({
            "TANK_LEVEL": 3.4,
            "PUMP_1": {"status": 1, "fecha": "01.01.25..08.00"}
        })
    );
}

#[tokio::test]
async fn test_get_device_normalizes_value() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/db/well3.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"PRESION": 2.7, "fecha": "01.01.25..08.00"})),
        )
        .mount(&server)
        .await;

    let doc = client
        .get_device(&doc_url(&server, "/db/well3.json"), Some("PRESION"))
        .await
        .unwrap();
    assert_eq!(doc.get(VALUE_FIELD), Some(&json!(2.7)));
    assert_eq!(doc.get("fecha"), Some(&json!("01.01.25..08.00")));
}

#[tokio::test]
async fn test_null_document_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/db/empty.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let doc = client
        .get_document(&doc_url(&server, "/db/empty.json"))
        .await
        .unwrap();
    assert!(doc.is_empty());
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_2xx_is_status_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/db/X.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client.get_document(&doc_url(&server, "/db/X.json")).await;
    assert!(
        matches!(result, Err(Error::Status { status: 503, .. })),
        "expected Status error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_invalid_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/db/X.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.get_document(&doc_url(&server, "/db/X.json")).await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_array_document_is_unexpected_shape() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/db/X.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let result = client.get_document(&doc_url(&server, "/db/X.json")).await;
    assert!(
        matches!(result, Err(Error::UnexpectedShape { .. })),
        "expected UnexpectedShape error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    let client = RtdbClient::new(&TransportConfig::with_timeout(Duration::from_millis(200))).unwrap();

    Mock::given(method("GET"))
        .and(path("/db/slow.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = client.get_document(&doc_url(&server, "/db/slow.json")).await;
    assert!(
        matches!(result, Err(Error::Timeout { .. })),
        "expected Timeout error, got: {result:?}"
    );
}

// ── PUT tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_put_value_sends_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/db/pump1/RESET.json"))
        .and(body_json(json!(1)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    let echoed = client
        .put_value(&doc_url(&server, "/db/pump1/RESET.json"), &json!(1))
        .await
        .unwrap();
    assert_eq!(echoed, json!(1));
}

#[tokio::test]
async fn test_put_value_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/db/pump1/RESET.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client
        .put_value(&doc_url(&server, "/db/pump1/RESET.json"), &json!(0))
        .await;
    assert!(matches!(result, Err(Error::Status { status: 401, .. })));
}
