#![allow(clippy::unwrap_used)]
// Integration tests for `Dashboard` against a wiremock realtime database.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aquadash_core::{
    CoreError, Dashboard, EngineConfig, EntryStatus, PollIntervals, RefreshMode, UrlGroup,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn doc_url(server: &MockServer, suffix: &str) -> Url {
    Url::parse(&format!("{}{suffix}", server.uri())).unwrap()
}

fn engine_config() -> EngineConfig {
    EngineConfig {
        intervals: PollIntervals {
            normal: Duration::from_secs(60),
            real_time: Duration::from_secs(5),
        },
        timeout: Duration::from_secs(2),
        start_real_time: false,
    }
}

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;

    let mut catalog: HashMap<String, Vec<UrlGroup>> = HashMap::new();
    catalog.insert(
        "LB".into(),
        vec![
            UrlGroup::new(doc_url(&server, "/tanks/A.json"), ["LEVEL", "PUMP"]),
            UrlGroup::new(doc_url(&server, "/pumps/B.json"), ["P1"]),
        ],
    );
    catalog.insert("EMPTY".into(), Vec::new());

    let dashboard = Dashboard::new(engine_config(), Arc::new(catalog)).unwrap();
    (server, dashboard)
}

async fn mount_site_documents(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/tanks/A.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"LEVEL": 3.2, "PUMP": 1, "unrelated": "x"})),
        )
        .expect(expected)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pumps/B.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"P1": true, "P2": false})))
        .expect(expected)
        .mount(server)
        .await;
}

// ── Aggregated sites ────────────────────────────────────────────────

#[tokio::test]
async fn test_site_reading_merges_requested_fields() {
    let (server, dashboard) = setup().await;
    mount_site_documents(&server, 1).await;

    let mut sub = dashboard.subscribe_site("LB").unwrap();
    let snap = sub.changed().await.unwrap();

    assert_eq!(snap.status(), EntryStatus::Ready);
    let data = snap.data.unwrap();
    assert_eq!(
        serde_json::Value::Object((*data).clone()),
        json!({"LEVEL": 3.2, "PUMP": 1, "P1": true})
    );
}

#[tokio::test]
async fn test_site_subscribers_share_one_poll() {
    let (server, dashboard) = setup().await;
    mount_site_documents(&server, 1).await;

    let mut first = dashboard.subscribe_site("LB").unwrap();
    first.changed().await.unwrap();
    let second = dashboard.subscribe_site("LB").unwrap();

    assert_eq!(dashboard.sites().len(), 1);
    assert_eq!(first.key(), second.key());
    assert!(second.snapshot().same_data(&first.snapshot()));
    assert_eq!(
        dashboard.site_snapshot("LB").status(),
        EntryStatus::Ready
    );

    drop(first);
    drop(second);
    assert!(dashboard.sites().is_empty());
}

#[tokio::test]
async fn test_unknown_or_empty_site_is_none() {
    let (_server, dashboard) = setup().await;

    assert!(dashboard.subscribe_site("NOPE").is_none());
    assert!(dashboard.subscribe_site("EMPTY").is_none());
    assert!(dashboard.sites().is_empty());
    assert_eq!(dashboard.site_snapshot("NOPE").status(), EntryStatus::Empty);
}

#[tokio::test]
async fn test_site_fails_when_any_group_fails() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/tanks/A.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"LEVEL": 1})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pumps/B.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut sub = dashboard.subscribe_site("LB").unwrap();
    let snap = sub.changed().await.unwrap();

    assert_eq!(snap.status(), EntryStatus::Failed);
    assert!(snap.data.is_none());
    assert!(matches!(snap.error, Some(CoreError::Http { status: 503, .. })));
}

// ── Individual devices ──────────────────────────────────────────────

#[tokio::test]
async fn test_device_field_copied_into_value() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/devices/X.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"LEVEL": 42, "fecha": "01.01.25..08.00"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = doc_url(&server, "/devices/X.json");
    let mut sub = dashboard.subscribe_device(url.clone(), Some("LEVEL".into()));
    let snap = sub.changed().await.unwrap();

    let data = snap.data.unwrap();
    assert_eq!(data.get("value"), Some(&json!(42)));
    assert_eq!(data.get("fecha"), Some(&json!("01.01.25..08.00")));
    assert_eq!(
        dashboard.device_snapshot(&url, Some("LEVEL")).status(),
        EntryStatus::Ready
    );
    assert_eq!(
        dashboard.device_snapshot(&url, None).status(),
        EntryStatus::Empty
    );
}

#[tokio::test]
async fn test_device_failure_is_reported() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/devices/X.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut sub = dashboard.subscribe_device(doc_url(&server, "/devices/X.json"), None);
    let snap = sub.changed().await.unwrap();

    assert_eq!(snap.status(), EntryStatus::Failed);
    assert_eq!(
        snap.error.as_ref().map(CoreError::is_transient),
        Some(true)
    );
}

#[tokio::test]
async fn test_poll_once_bypasses_cache() {
    let (server, dashboard) = setup().await;
    Mock::given(method("GET"))
        .and(path("/devices/X.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"LEVEL": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let reading = dashboard
        .poll_once(&doc_url(&server, "/devices/X.json"), Some("LEVEL"))
        .await
        .unwrap();

    assert_eq!(reading.get("value"), Some(&json!(7)));
    assert!(dashboard.devices().is_empty());
}

// ── Refresh mode ────────────────────────────────────────────────────

#[tokio::test]
async fn test_real_time_toggle_forces_refresh() {
    let (server, dashboard) = setup().await;
    mount_site_documents(&server, 2).await;

    let mut modes = dashboard.mode_changes();
    let mut sub = dashboard.subscribe_site("LB").unwrap();
    let first = sub.changed().await.unwrap();

    assert!(dashboard.set_real_time(true));
    assert!(!dashboard.set_real_time(true));
    assert!(dashboard.is_real_time());

    modes.changed().await.unwrap();
    assert_eq!(*modes.borrow(), RefreshMode::RealTime);

    // Same content, but real-time mode notifies anyway.
    let forced = sub.changed().await.unwrap();
    assert_eq!(forced.revision(), first.revision() + 1);
}

// ── Controls ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_control_puts_binary_value() {
    let (server, dashboard) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/controls/reset.json"))
        .and(body_json(json!(1)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/controls/reset.json"))
        .and(body_json(json!(0)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(0)))
        .expect(1)
        .mount(&server)
        .await;

    let url = doc_url(&server, "/controls/reset.json");
    assert_eq!(dashboard.write_control(&url, true).await.unwrap(), json!(1));
    assert_eq!(dashboard.write_control(&url, false).await.unwrap(), json!(0));
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_dispose_clears_both_caches() {
    let (server, dashboard) = setup().await;
    mount_site_documents(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/devices/X.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"LEVEL": 1})))
        .mount(&server)
        .await;

    let mut site = dashboard.subscribe_site("LB").unwrap();
    let mut device = dashboard.subscribe_device(doc_url(&server, "/devices/X.json"), None);
    site.changed().await.unwrap();
    device.changed().await.unwrap();

    dashboard.dispose();
    assert!(dashboard.sites().is_empty());
    assert!(dashboard.devices().is_empty());
    assert!(site.changed().await.is_none());
}
