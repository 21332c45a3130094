//! End-to-end tests for the gateway against a mocked upstream.
//!
//! Each test starts a `wiremock` server standing in for the KV upstream, then
//! serves the real router on an ephemeral port and drives it over HTTP.
//!
//! Run with: `cargo test --test gateway_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kv_gateway::{AppState, Config, build_router};

/// Test fixture owning the mocked upstream and the running gateway.
struct TestFixture {
    upstream: MockServer,
    base_url: String,
    client: Client,
}

impl TestFixture {
    /// Gateway holding the token `seeded`.
    async fn new() -> Self {
        Self::with_config(|config| config.api_token = Some("seeded".to_string())).await
    }

    /// Gateway started without any token.
    async fn without_token() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let upstream = MockServer::start().await;

        let mut config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            upstream_api_url: format!("{}/api/v1", upstream.uri()),
            upstream_auth_url: format!("{}/api/auth/token", upstream.uri()),
            upstream_timeout: Duration::from_secs(5),
            upstream_connect_timeout: Duration::from_secs(2),
            log_level: "warn".to_string(),
            metrics_port: 0,
            ..Config::default()
        };
        customize(&mut config);

        let state = AppState::new(config).expect("Failed to build state");
        let app = build_router(state);

        // Bind before spawning so the server is accepting by the time we return
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to ephemeral port");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            upstream,
            base_url: format!("http://{addr}"),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn upstream_request_count(&self) -> usize {
        self.upstream
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

// ============================================================================
// Health & Status Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::without_token().await;

    let response = fixture.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
    assert_eq!(fixture.upstream_request_count().await, 0);
}

#[tokio::test]
async fn test_landing_page() {
    let fixture = TestFixture::without_token().await;

    let response = fixture.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("API is running"));
}

#[tokio::test]
async fn test_ready_reflects_token() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/ready").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["token_present"], true);
    assert_eq!(body["token_expired"], Value::Null);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let fixture = TestFixture::without_token().await;

    let response = fixture
        .client
        .get(fixture.url("/health"))
        .header("X-Request-Id", "dashboard-42")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "dashboard-42");
}

#[tokio::test]
async fn test_cors_allows_dashboard_origin() {
    let fixture = TestFixture::without_token().await;

    let response = fixture
        .client
        .get(fixture.url("/health"))
        .header("Origin", "http://127.0.0.1:5173")
        .send()
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "http://127.0.0.1:5173"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

// ============================================================================
// Sensor Tests
// ============================================================================

#[tokio::test]
async fn test_list_sensors_passthrough() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sensors/"))
        .and(header("authorization", "Bearer seeded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/all/sensors").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!([{"id": 1}, {"id": 2}]));
}

#[tokio::test]
async fn test_sensor_samples_default_query() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sensors/7/samples"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "60"))
        .and(query_param("sort", "desc"))
        .and(query_param_is_missing("before"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": 1})))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/sensors/sample/7").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"a": 1}));
}

#[tokio::test]
async fn test_sensor_samples_normalized_query() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sensors/7/samples"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "100"))
        .and(query_param("after", "1700000000.5"))
        .and(query_param("sort", "asc"))
        .and(query_param_is_missing("before"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    let response = fixture
        .get("/api/sensors/sample/7?skip=20&limit=100&after=1700000000.5&before=&sort=asc")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sensor_samples_timestamps_forwarded_as_sent() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sensors/3/samples"))
        .and(query_param("before", "1e30"))
        .and(query_param("after", "1700000000.12345678901234567890123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    let response = fixture
        .get("/api/sensors/sample/3?before=1e30&after=1700000000.12345678901234567890123")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sensor_samples_invalid_query_never_reaches_upstream() {
    let fixture = TestFixture::new().await;

    for (query, field) in [
        ("limit=abc", "limit"),
        ("limit=0", "limit"),
        ("limit=2001", "limit"),
        ("skip=-1", "skip"),
        ("before=yesterday", "before"),
        ("sort=newest", "sort"),
        ("after=200&before=100", "after"),
        ("before=1_700_000_000", "before"),
        ("sort=asc&sort=desc", "sort"),
    ] {
        let response = fixture.get(&format!("/api/sensors/sample/7?{query}")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query: {query}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "validation_error", "query: {query}");
        assert_eq!(body["field"], field, "query: {query}");
    }

    assert_eq!(fixture.upstream_request_count().await, 0);
}

// ============================================================================
// Actuator Tests
// ============================================================================

#[tokio::test]
async fn test_get_actuator_upstream_404_preserved() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/actuators/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/actuator/99").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "upstream_error");
    assert_eq!(body["details"], "not found");
}

#[tokio::test]
async fn test_set_actuator_forwards_body_verbatim() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/actuators/4/state"))
        .and(header("authorization", "Bearer seeded"))
        .and(body_json(json!(true)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "state": true})))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    // No Content-Type: the body is parsed as JSON regardless
    let response = fixture
        .client
        .put(fixture.url("/api/actuator/4"))
        .body("true")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"id": 4, "state": true}));

    let requests = fixture.upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, b"true");
}

#[tokio::test]
async fn test_set_actuator_object_body() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/actuators/2/state"))
        .and(body_json(json!({"mode": "eco", "level": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    let response = fixture
        .client
        .put(fixture.url("/api/actuator/2"))
        .json(&json!({"mode": "eco", "level": 3}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_set_actuator_malformed_body() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .put(fixture.url("/api/actuator/4"))
        .body("{\"state\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "body");
    assert_eq!(fixture.upstream_request_count().await, 0);
}

// ============================================================================
// Upstream Failure Tests
// ============================================================================

#[tokio::test]
async fn test_non_json_success_is_parse_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/actuators/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/all/actuators").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "parse_error");
}

#[tokio::test]
async fn test_upstream_timeout_is_unreachable() {
    let fixture = TestFixture::with_config(|config| {
        config.api_token = Some("seeded".to_string());
        config.upstream_timeout = Duration::from_millis(300);
    })
    .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sensors/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/all/sensors").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "upstream_unreachable");
}

#[tokio::test]
async fn test_client_deadline_shortens_upstream_timeout() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/actuators/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&fixture.upstream)
        .await;

    let started = std::time::Instant::now();
    let response = fixture
        .client
        .get(fixture.url("/api/all/actuators"))
        .header("X-Request-Timeout", "200")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(2));
}

// ============================================================================
// Token Tests
// ============================================================================

#[tokio::test]
async fn test_resources_unavailable_without_token() {
    let fixture = TestFixture::without_token().await;

    for path in ["/api/all/sensors", "/api/all/actuators", "/api/actuator/1"] {
        let response = fixture.get(path).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "token_unavailable");
    }

    let response = fixture.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(fixture.upstream_request_count().await, 0);
}

#[tokio::test]
async fn test_token_fetch_stores_and_uses_token() {
    let fixture = TestFixture::without_token().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .and(query_param("team", "MemoryStackers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "fresh", "expiresAt": 4102444800u64})),
        )
        .expect(1)
        .mount(&fixture.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sensors/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/token").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"token": "fresh", "expiresAt": 4102444800u64}));

    // The token request itself carries no bearer header
    let requests = fixture.upstream.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));

    let response = fixture.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_expired"], false);

    let response = fixture.get("/api/all/sensors").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_token_fetch_keeps_previous_token() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unknown team"))
        .mount(&fixture.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/actuators/"))
        .and(header("authorization", "Bearer seeded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"], "unknown team");

    let response = fixture.get("/api/all/actuators").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_response_without_token_is_parse_error() {
    let fixture = TestFixture::without_token().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expiresAt": 1})))
        .mount(&fixture.upstream)
        .await;

    let response = fixture.get("/api/token").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let response = fixture.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
