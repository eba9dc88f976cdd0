//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: HttpEndpoint → paginators / batch fetcher → records

use falconkit::http::{HttpClient, HttpClientConfig};
use falconkit::types::BackoffType;
use falconkit::{
    paginate_numbered, paginate_numbered_parallel, paginate_token, BatchFetcher, Error,
    HttpEndpoint, SharedRemoteCall, ToolkitConfig,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(50),
        )
        .no_rate_limit()
        .bearer_token("test-token")
        .build();
    Arc::new(HttpClient::with_config(config).unwrap())
}

// ============================================================================
// Pagination Integration Tests
// ============================================================================

#[tokio::test]
async fn test_numbered_pagination_over_post_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/policy/combined/prevention/v1"))
        .and(body_json(json!({"filter": "enabled:true", "limit": 2, "offset": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "offset": 2, "total": 3}},
            "resources": [{"id": "p1"}, {"id": "p2"}],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/policy/combined/prevention/v1"))
        .and(body_json(json!({"filter": "enabled:true", "limit": 2, "offset": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "offset": 3, "total": 3}},
            "resources": [{"id": "p3"}],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint: SharedRemoteCall = Arc::new(HttpEndpoint::post(
        client_for(&server),
        "/policy/combined/prevention/v1",
    ));
    let mut body = serde_json::Map::new();
    body.insert("filter".to_string(), json!("enabled:true"));

    let records = paginate_numbered(&endpoint, &body, 2).await.unwrap();

    assert_eq!(
        records,
        vec![json!({"id": "p1"}), json!({"id": "p2"}), json!({"id": "p3"})]
    );
}

#[tokio::test]
async fn test_parallel_pagination_recovers_from_transient_failure() {
    let server = MockServer::start().await;

    // One 503 before the page at offset 2 succeeds
    Mock::given(method("GET"))
        .and(path("/devices/queries/devices-hidden/v1"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    for (offset, ids) in [(0, vec!["h0", "h1"]), (2, vec!["h2", "h3"]), (4, vec!["h4"])] {
        Mock::given(method("GET"))
            .and(path("/devices/queries/devices-hidden/v1"))
            .and(query_param("offset", offset.to_string()))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"pagination": {"limit": 2, "offset": offset, "total": 5}},
                "resources": ids,
                "errors": []
            })))
            .mount(&server)
            .await;
    }

    let endpoint: SharedRemoteCall = Arc::new(HttpEndpoint::get(
        client_for(&server),
        "/devices/queries/devices-hidden/v1",
    ));

    let records = paginate_numbered_parallel(&endpoint, 2).await.unwrap();

    assert_eq!(
        records,
        vec![json!("h0"), json!("h1"), json!("h2"), json!("h3"), json!("h4")]
    );
}

#[tokio::test]
async fn test_after_token_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/queries/alerts/v2"))
        .and(query_param("after", "eyJ2ZXJzaW9uIjoidjEifQ=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "after": null, "total": 3}},
            "resources": ["a3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/alerts/queries/alerts/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "after": "eyJ2ZXJzaW9uIjoidjEifQ==", "total": 3}},
            "resources": ["a1", "a2"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint: SharedRemoteCall = Arc::new(HttpEndpoint::get(
        client_for(&server),
        "/alerts/queries/alerts/v2",
    ));

    let records = paginate_token(&endpoint, 2, true).await.unwrap();
    assert_eq!(records, vec![json!("a1"), json!("a2"), json!("a3")]);
}

// ============================================================================
// Batch Integration Tests
// ============================================================================

#[tokio::test]
async fn test_batch_fetch_over_get_reports_partial_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/entities/online-state/v1"))
        .and(query_param("ids", "d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": "d1", "state": "online"}, {"id": "d2", "state": "offline"}],
            "errors": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/devices/entities/online-state/v1"))
        .and(query_param("ids", "d3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "resources": [],
            "errors": [{"code": 404, "message": "device d3 not found", "id": "d3"}]
        })))
        .mount(&server)
        .await;

    let endpoint: SharedRemoteCall = Arc::new(HttpEndpoint::get(
        client_for(&server),
        "/devices/entities/online-state/v1",
    ));
    let ids: Vec<String> = ["d1", "d2", "d3"].iter().map(ToString::to_string).collect();
    let fetcher = BatchFetcher::new().with_chunk_size(2);

    let err = fetcher.fetch(&ids, &endpoint).await.unwrap_err();
    assert!(matches!(err, Error::Api { ref errors } if errors.len() == 1));

    let outcome = fetcher.fetch_with_errors(&ids, &endpoint).await.unwrap();
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records["d2"]["state"], json!("offline"));
    assert_eq!(outcome.errors[0].details["id"], json!("d3"));
}

#[tokio::test]
async fn test_config_driven_device_description() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/queries/devices-scroll/v1"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 1000, "offset": "tok", "total": 2}},
            "resources": ["aid-1", "aid-2"],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/devices/entities/devices/v2"))
        .and(header("X-Custom", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {"device_id": "aid-1", "platform_name": "Linux"},
                {"device_id": "aid-2", "platform_name": "Windows"}
            ],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = format!(
        r#"
pagination:
  scroll_limit: 1000
http:
  base_url: "{}"
  max_retries: 0
  requests_per_second: 0
  headers:
    X-Custom: "yes"
"#,
        server.uri()
    );
    let config = ToolkitConfig::from_yaml_str(&yaml).unwrap();
    let client = Arc::new(HttpClient::with_config(config.http_client_config()).unwrap());

    let devices = config
        .hosts(client)
        .describe_devices(None)
        .await
        .unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices["aid-2"]["platform_name"], json!("Windows"));
}
