//! Tests for remote call module

use super::*;
use crate::envelope::{ErrorRecord, PageOffset, PaginationInfo, ResponseBody};
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::JsonObject;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(0)
        .no_rate_limit()
        .build();
    Arc::new(HttpClient::with_config(config).unwrap())
}

// ============================================================================
// CallParams Tests
// ============================================================================

#[test]
fn test_call_params_constructors() {
    let page = CallParams::page(200, 100);
    assert_eq!(page.limit, Some(100));
    assert_eq!(page.offset_index(), Some(200));
    assert_eq!(page.token_value(), None);

    let token = CallParams::token(5000, Some("tok".to_string()));
    assert_eq!(token.offset, Some(PageOffset::Token("tok".to_string())));
    assert_eq!(token.token_value(), Some("tok"));

    let first = CallParams::token(5000, None);
    assert_eq!(first.offset, None);

    let after = CallParams::after(10, Some("cursor".to_string()));
    assert_eq!(after.after.as_deref(), Some("cursor"));
    assert_eq!(after.token_value(), Some("cursor"));

    let ids = CallParams::ids(vec!["a".to_string()]);
    assert_eq!(ids.ids, Some(vec!["a".to_string()]));
    assert_eq!(ids.limit, None);
}

#[test]
fn test_numbered_body_paging_keys_win() {
    let mut extra = JsonObject::new();
    extra.insert("filter".to_string(), json!("platform_name:'Windows'"));
    extra.insert("offset".to_string(), json!(999));
    extra.insert("limit".to_string(), json!(5000));

    let params = CallParams::numbered_body(&extra, 100, 50);
    let body = params.body.unwrap();
    assert_eq!(body["filter"], json!("platform_name:'Windows'"));
    assert_eq!(body["offset"], json!(100));
    assert_eq!(body["limit"], json!(50));
    assert_eq!(body.len(), 3);
}

#[test]
fn test_paging_query_pairs() {
    let pairs = CallParams::page(300, 100).paging_query();
    assert_eq!(
        pairs,
        vec![
            ("limit".to_string(), "100".to_string()),
            ("offset".to_string(), "300".to_string()),
        ]
    );

    let pairs = CallParams::after(10, Some("abc".to_string())).paging_query();
    assert_eq!(
        pairs,
        vec![
            ("limit".to_string(), "10".to_string()),
            ("after".to_string(), "abc".to_string()),
        ]
    );
}

// ============================================================================
// FnRemoteCall Tests
// ============================================================================

#[tokio::test]
async fn test_fn_remote_call_passes_params() {
    let remote = remote_fn("echo_limit", |params: CallParams| async move {
        let limit = params.limit.unwrap_or_default();
        Ok(ResponseBody::with_resources(vec![json!(limit)]).into_envelope())
    });

    assert_eq!(remote.name(), "echo_limit");
    let envelope = remote.invoke(CallParams::page(0, 42)).await.unwrap();
    assert_eq!(envelope.resources().unwrap(), &[json!(42)]);
}

// ============================================================================
// HttpEndpoint Tests
// ============================================================================

#[tokio::test]
async fn test_endpoint_sends_filter_and_paging_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/queries/devices-scroll/v1"))
        .and(query_param("filter", "hostname:'web*'"))
        .and(query_param("limit", "5000"))
        .and(query_param("offset", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 5000, "offset": "tok-2", "total": 2}},
            "resources": ["a", "b"],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::get(client_for(&server), "/devices/queries/devices-scroll/v1")
        .with_filter(Some("hostname:'web*'"));
    let envelope = endpoint
        .invoke(CallParams::token(5000, Some("tok-1".to_string())))
        .await
        .unwrap();

    assert_eq!(envelope.status_code, 200);
    assert_eq!(envelope.resources().unwrap().len(), 2);
    assert_eq!(
        envelope.pagination(),
        Some(&PaginationInfo::token(5000, Some("tok-2"), 2))
    );
}

#[tokio::test]
async fn test_endpoint_sends_ids_as_repeated_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/entities/online-state/v1"))
        .and(query_param("ids", "a"))
        .and(query_param("ids", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": "a", "state": "online"}, {"id": "b", "state": "offline"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::get(client_for(&server), "/devices/entities/online-state/v1");
    let envelope = endpoint
        .invoke(CallParams::ids(vec!["a".to_string(), "b".to_string()]))
        .await
        .unwrap();

    assert_eq!(envelope.resources().unwrap().len(), 2);
}

#[tokio::test]
async fn test_post_endpoint_sends_ids_in_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/entities/devices/v2"))
        .and(body_json(json!({"ids": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"device_id": "a"}, {"device_id": "b"}],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::post(client_for(&server), "/devices/entities/devices/v2")
        .named("get_device_details");
    assert_eq!(endpoint.name(), "get_device_details");
    assert_eq!(endpoint.path(), "/devices/entities/devices/v2");

    let envelope = endpoint
        .invoke(CallParams::ids(vec!["a".to_string(), "b".to_string()]))
        .await
        .unwrap();
    assert_eq!(envelope.resources().unwrap().len(), 2);
}

#[tokio::test]
async fn test_endpoint_returns_error_envelope_for_4xx() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/devices/entities/devices/v2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "resources": [],
            "errors": [{"code": 404, "message": "Device not found", "id": "zzz"}]
        })))
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::post(client_for(&server), "/devices/entities/devices/v2");
    let envelope = endpoint
        .invoke(CallParams::ids(vec!["zzz".to_string()]))
        .await
        .unwrap();

    assert_eq!(envelope.status_code, 404);
    assert_eq!(envelope.errors()[0].code, ErrorRecord::new(404, "").code);
    assert_eq!(envelope.errors()[0].message, "Device not found");
}

#[tokio::test]
async fn test_endpoint_plain_4xx_stays_an_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/queries/devices/v1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("access denied"))
        .mount(&server)
        .await;

    let endpoint = HttpEndpoint::get(client_for(&server), "/devices/queries/devices/v1");
    let err = endpoint.invoke(CallParams::page(0, 100)).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
}

#[test]
fn test_with_filter_skips_empty() {
    let client = Arc::new(HttpClient::new().unwrap());
    let endpoint = HttpEndpoint::get(client, "/x")
        .with_filter(None)
        .with_filter(Some(""));
    let request = endpoint.build_request(CallParams::default());
    assert!(request.query.is_empty());
    assert!(request.body.is_none());
}
