//! Integration tests for the Folio HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await - tests are serialized to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::{TestResponse, TestServer};
use folio::api::{AppState, HealthResponse, create_router};
use folio::sources::{TagSource, TagSourceRegistry, store_registry};
use folio_core::{DefaultTagSet, FolioError, TagRecord, TagSet, TagSetExt, TagStore};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Mutex to serialize tests since router creation reads env vars.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("FOLIO_RATE_LIMIT") };
    }
}

/// In-memory source returning fixed pairs per classmark.
fn fixed_source(weight: f64, documents: &'static [(&'static str, &'static [(&'static str, f64)])]) -> TagSource {
    TagSource::new(weight, move |id: String| async move {
        let pairs = documents
            .iter()
            .find(|(classmark, _)| *classmark == id)
            .map(|(_, pairs)| *pairs)
            .unwrap_or_default();
        Ok(DefaultTagSet::from_pairs(pairs.iter().copied()).boxed())
    })
}

fn broken_source() -> TagSource {
    TagSource::new(1.0, |_id: String| async {
        Err::<Box<dyn TagSet>, _>(FolioError::StorageError("connection refused".to_string()))
    })
}

/// The three default sources over fixed documents:
/// - `MS-FOO`: the third-party/annotations/removals example
/// - `MS-TIES`: third-party only, with a value tie
/// - anything else: no tags
fn test_registry() -> TagSourceRegistry {
    TagSourceRegistry::new()
        .with_source(
            "third-party",
            fixed_source(
                1.0,
                &[
                    ("MS-FOO", &[("foo", 10.0), ("bar", 11.0), ("baz", 12.0)]),
                    ("MS-TIES", &[("foo", 42.0), ("bar", 42.0), ("abc", 10.0)]),
                ],
            ),
        )
        .with_source("annotations", fixed_source(1.0 / 5.0, &[("MS-FOO", &[("b", 1.0)])]))
        .with_source(
            "user-removes",
            fixed_source(
                1.0 / 5.0,
                &[("MS-FOO", &[("bar", -1.0), ("foo", -1.0), ("abc", -1.0)])],
            ),
        )
}

fn server_for(registry: TagSourceRegistry) -> (TestServer, TestGuard) {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("FOLIO_RATE_LIMIT") };
    let router = create_router(AppState::new(registry));
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

/// Create a test server over the fixed in-memory sources.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    server_for(test_registry())
}

fn content_type(response: &TestResponse) -> String {
    response
        .headers()
        .get("content-type")
        .expect("content-type header must be present")
        .to_str()
        .expect("content-type must be valid utf8")
        .to_string()
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    // Version should match Cargo.toml
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_endpoint_not_found() {
    let (server, _guard) = create_test_server();

    let response = server.get("/nonexistent").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_tag_route_mounted_under_tags_prefix() {
    let (server, _guard) = create_test_server();

    server.get("/MS-FOO.json").await.assert_status_not_found();
    server.get("/tags/MS-FOO.json").await.assert_status_ok();
}

// =============================================================================
// AGGREGATION TESTS
// =============================================================================

#[tokio::test]
async fn test_third_party_minus_removals_json() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-FOO.json")
        .add_query_param("sources", "third-party,user-removes")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.text(),
        r#"{"tags":{"baz":12,"bar":10.8,"foo":9.8},"count":3,"id":"MS-FOO"}"#
    );
}

#[tokio::test]
async fn test_all_sources_by_default() {
    let (server, _guard) = create_test_server();

    let response = server.get("/tags/MS-FOO.json").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(
        body,
        json!({
            "tags": {"baz": 12, "bar": 10.8, "foo": 9.8, "b": 0.2},
            "count": 4,
            "id": "MS-FOO"
        })
    );
}

#[tokio::test]
async fn test_empty_document_json() {
    let (server, _guard) = create_test_server();

    let response = server.get("/tags/MS-EMPTY.json").await;

    response.assert_status_ok();
    assert_eq!(response.text(), r#"{"tags":{},"count":0,"id":"MS-EMPTY"}"#);
}

#[tokio::test]
async fn test_unknown_extension_stays_in_classmark() {
    let (server, _guard) = create_test_server();

    let response = server.get("/tags/MS-FOO.pdf").await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "application/json");
    assert_eq!(response.text(), r#"{"tags":{},"count":0,"id":"MS-FOO.pdf"}"#);
}

// =============================================================================
// NEGOTIATION TESTS
// =============================================================================

#[tokio::test]
async fn test_accept_csv_ties_sorted_by_name() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-TIES")
        .add_header(header::ACCEPT, HeaderValue::from_static("text/csv"))
        .await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "text/csv");
    assert_eq!(response.text(), "tag,value\nbar,42\nfoo,42\nabc,10\n");
}

#[tokio::test]
async fn test_missing_accept_is_json() {
    let (server, _guard) = create_test_server();

    let response = server.get("/tags/MS-TIES").await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "application/json");
}

#[tokio::test]
async fn test_accept_xml() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-TIES")
        .add_header(
            header::ACCEPT,
            HeaderValue::from_static("text/html, application/xml;q=0.9, */*;q=0.1"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "application/xml");
    let body = response.text();
    assert!(body.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(body.contains(r#"<tags count="3" id="MS-TIES">"#));
    assert!(body.contains(r#"<tag value="42">bar</tag><tag value="42">foo</tag>"#));
}

#[tokio::test]
async fn test_unacceptable_falls_back_to_text() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-TIES")
        .add_header(header::ACCEPT, HeaderValue::from_static("image/png"))
        .await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "text/plain");
    assert_eq!(response.text(), "tag,value\nbar,42\nfoo,42\nabc,10\n");
}

#[tokio::test]
async fn test_unreadable_accept_falls_back_to_text() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-TIES")
        .add_header(header::ACCEPT, HeaderValue::from_bytes(b"text/\xffcsv").unwrap())
        .await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "text/plain");
    assert_eq!(response.text(), "tag,value\nbar,42\nfoo,42\nabc,10\n");
}

#[tokio::test]
async fn test_extension_overrides_accept() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-TIES.csv")
        .add_header(header::ACCEPT, HeaderValue::from_static("application/json"))
        .await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "text/csv");
}

#[tokio::test]
async fn test_every_extension_sets_content_type() {
    let (server, _guard) = create_test_server();

    for (ext, expected) in [
        ("json", "application/json"),
        ("xml", "application/xml"),
        ("csv", "text/csv"),
        ("txt", "text/plain"),
    ] {
        let response = server.get(&format!("/tags/MS-FOO.{ext}")).await;
        response.assert_status_ok();
        assert_eq!(content_type(&response), expected, "extension {ext}");
    }
}

// =============================================================================
// ERROR MAPPING TESTS
// =============================================================================

#[tokio::test]
async fn test_unknown_source_lists_valid_names() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-FOO.json")
        .add_query_param("sources", "3rd-party")
        .await;

    response.assert_status_bad_request();
    assert_eq!(content_type(&response), "text/plain");
    let body = response.text();
    assert!(body.contains("\"3rd-party\""));
    assert!(body.contains("annotations, third-party, user-removes"));
}

#[tokio::test]
async fn test_duplicate_source_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/tags/MS-FOO")
        .add_query_param("sources", "annotations,annotations")
        .await;

    response.assert_status_bad_request();
    assert!(response.text().contains("Duplicate tag source: \"annotations\""));
}

#[tokio::test]
async fn test_failing_source_is_internal_error() {
    let registry = test_registry().with_source("broken", broken_source());
    let (server, _guard) = server_for(registry);

    let response = server.get("/tags/MS-FOO.json").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Internal Server Error");
}

#[tokio::test]
async fn test_overflowing_aggregate_is_internal_error() {
    let registry = TagSourceRegistry::new()
        .with_source("first", fixed_source(1.0, &[("MS-BIG", &[("x", 1e308)])]))
        .with_source("second", fixed_source(1.0, &[("MS-BIG", &[("x", 1e308)])]));
    let (server, _guard) = server_for(registry);

    for path in ["/tags/MS-BIG.json", "/tags/MS-BIG.csv"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "Internal Server Error");
    }
}

#[tokio::test]
async fn test_failing_source_not_selected_is_harmless() {
    let registry = test_registry().with_source("broken", broken_source());
    let (server, _guard) = server_for(registry);

    let response = server
        .get("/tags/MS-FOO.json")
        .add_query_param("sources", "third-party")
        .await;

    response.assert_status_ok();
}

// =============================================================================
// RATE LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("FOLIO_RATE_LIMIT", "1") };
    let server = TestServer::new(create_router(AppState::new(test_registry()))).unwrap();
    let _guard = TestGuard { _guard: guard };

    server.get("/health").await.assert_status_ok();
    let response = server.get("/health").await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

// =============================================================================
// STORE-BACKED TESTS
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_store_backed_aggregation() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = TagStore::open(dir.path().join("folio.db")).unwrap();
    let record = |kind: &str, tag: &str, user: &str| match kind {
        "removal" => TagRecord::Removal {
            classmark: "MS-ADD-01234".to_string(),
            tag: tag.to_string(),
            user: user.to_string(),
        },
        _ => TagRecord::Annotation {
            classmark: "MS-ADD-01234".to_string(),
            tag: tag.to_string(),
            user: user.to_string(),
        },
    };
    store
        .import(&[
            TagRecord::ThirdParty {
                classmark: "MS-ADD-01234".to_string(),
                tag: "letters".to_string(),
                frequency: 3.0,
            },
            record("annotation", "poetry", "u1"),
            record("annotation", "poetry", "u2"),
            record("removal", "letters", "u1"),
        ])
        .unwrap();

    let (server, _guard) = server_for(store_registry(Arc::new(store)));
    let response = server.get("/tags/MS-ADD-01234.csv").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "tag,value\nletters,2.8\npoetry,0.4\n");
}
