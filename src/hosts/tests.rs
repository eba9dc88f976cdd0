//! Tests for hosts module

use super::*;
use crate::http::HttpClientConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hosts_for(server: &MockServer) -> HostsApi {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(0)
        .no_rate_limit()
        .build();
    HostsApi::new(Arc::new(HttpClient::with_config(config).unwrap()))
}

async fn mount_scroll(server: &MockServer, filter: &str) {
    Mock::given(method("GET"))
        .and(path(DEVICES_SCROLL_PATH))
        .and(query_param("filter", filter))
        .and(query_param("offset", "scroll-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "offset": "scroll-3", "total": 3}},
            "resources": ["aid-3"],
            "errors": []
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(DEVICES_SCROLL_PATH))
        .and(query_param("filter", filter))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "offset": "scroll-2", "total": 3}},
            "resources": ["aid-1", "aid-2"],
            "errors": []
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_device_ids_scrolls_every_page() {
    let server = MockServer::start().await;
    mount_scroll(&server, "platform_name:'Linux'").await;

    let ids = hosts_for(&server)
        .with_id_page_limit(2)
        .get_device_ids(Some("platform_name:'Linux'"))
        .await
        .unwrap();

    assert_eq!(ids, vec!["aid-1", "aid-2", "aid-3"]);
}

#[tokio::test]
async fn test_get_hidden_ids_uses_numbered_offsets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEVICES_HIDDEN_PATH))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "offset": 2, "total": 3}},
            "resources": ["h-1", "h-2"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(DEVICES_HIDDEN_PATH))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 2, "offset": 3, "total": 3}},
            "resources": ["h-3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = hosts_for(&server)
        .with_id_page_limit(2)
        .get_hidden_ids(None)
        .await
        .unwrap();

    assert_eq!(ids, vec!["h-1", "h-2", "h-3"]);
}

#[tokio::test]
async fn test_describe_devices_fetches_details_by_id() {
    let server = MockServer::start().await;
    mount_scroll(&server, "hostname:'web*'").await;

    Mock::given(method("POST"))
        .and(path(DEVICE_DETAILS_PATH))
        .and(body_json(json!({"ids": ["aid-1", "aid-2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {"device_id": "aid-1", "hostname": "web-1"},
                {"device_id": "aid-2", "hostname": "web-2"}
            ],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_DETAILS_PATH))
        .and(body_json(json!({"ids": ["aid-3"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"device_id": "aid-3", "hostname": "web-3"}],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let devices = hosts_for(&server)
        .with_id_page_limit(2)
        .with_fetcher(BatchFetcher::new().with_chunk_size(2))
        .describe_devices(Some("hostname:'web*'"))
        .await
        .unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(devices["aid-3"]["hostname"], json!("web-3"));
}

#[tokio::test]
async fn test_describe_login_history_surfaces_api_errors() {
    let server = MockServer::start().await;
    mount_scroll(&server, "tags:'prod'").await;

    Mock::given(method("POST"))
        .and(path(LOGIN_HISTORY_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "resources": [],
            "errors": [{"code": 400, "message": "invalid device id aid-2"}]
        })))
        .mount(&server)
        .await;

    let err = hosts_for(&server)
        .with_id_page_limit(2)
        .describe_login_history(Some("tags:'prod'"))
        .await
        .unwrap_err();

    assert_eq!(err.error_records().len(), 1);
    assert_eq!(err.error_records()[0].code, Some(400));
}

#[tokio::test]
async fn test_describe_with_no_matching_devices_skips_detail_calls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DEVICES_SCROLL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 5000, "offset": null, "total": 0}},
            "resources": [],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(NETWORK_ADDRESS_HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let history = hosts_for(&server)
        .describe_network_address_history(Some("hostname:'nothing'"))
        .await
        .unwrap();

    assert!(history.is_empty());
}

#[tokio::test]
async fn test_describe_state_joins_online_state() {
    let server = MockServer::start().await;
    mount_scroll(&server, "platform_name:'Linux'").await;

    Mock::given(method("POST"))
        .and(path(DEVICE_DETAILS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {"device_id": "aid-1", "hostname": "db-1"},
                {"device_id": "aid-2", "hostname": "db-2"},
                {"device_id": "aid-3", "hostname": "db-3"}
            ],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ONLINE_STATE_PATH))
        .and(query_param("ids", "aid-1"))
        .and(query_param("ids", "aid-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {"id": "aid-1", "state": "online"},
                {"id": "aid-2", "state": "offline"}
            ],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let devices = hosts_for(&server)
        .with_id_page_limit(2)
        .describe_state(Some("platform_name:'Linux'"))
        .await
        .unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(devices["aid-1"]["state"], json!("online"));
    assert_eq!(devices["aid-2"]["state"], json!("offline"));
    assert_eq!(devices["aid-3"]["state"], json!("unknown"));
    assert_eq!(devices["aid-3"]["hostname"], json!("db-3"));
}

async fn mount_groups(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(HOST_GROUPS_QUERY_PATH))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 100, "offset": 0, "total": 2}},
            "resources": ["grp-1", "grp-2"],
            "errors": []
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(HOST_GROUP_DETAILS_PATH))
        .and(query_param("ids", "grp-1"))
        .and(query_param("ids", "grp-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {"id": "grp-1", "name": "Servers", "group_type": "static"},
                {"id": "grp-2", "name": "Laptops", "group_type": "dynamic"}
            ],
            "errors": []
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_describe_groups_fetches_group_details() {
    let server = MockServer::start().await;
    mount_groups(&server).await;

    let groups = hosts_for(&server).describe_groups(None).await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups["grp-1"]["name"], json!("Servers"));
    assert_eq!(groups["grp-2"]["group_type"], json!("dynamic"));
}

#[tokio::test]
async fn test_get_group_member_ids_pages_in_parallel() {
    let server = MockServer::start().await;

    for (offset, ids) in [(0, vec!["aid-1", "aid-2"]), (100, vec!["aid-3"])] {
        let resources: Vec<String> = ids.iter().map(ToString::to_string).collect();
        Mock::given(method("GET"))
            .and(path(GROUP_MEMBER_IDS_PATH))
            .and(query_param("id", "grp-1"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"pagination": {"limit": 100, "offset": offset, "total": 150}},
                "resources": resources,
                "errors": []
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let ids = hosts_for(&server)
        .get_group_member_ids("grp-1")
        .await
        .unwrap();

    assert_eq!(ids, vec!["aid-1", "aid-2", "aid-3"]);
}

#[tokio::test]
async fn test_get_group_members_buckets_devices_by_group() {
    let server = MockServer::start().await;
    mount_groups(&server).await;

    Mock::given(method("GET"))
        .and(path(GROUP_MEMBERS_PATH))
        .and(query_param("filter", "platform_name:'Windows'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"pagination": {"limit": 100, "offset": 0, "total": 3}},
            "resources": [
                {"device_id": "aid-1", "groups": ["grp-1"]},
                {"device_id": "aid-2"},
                {"device_id": "aid-3", "groups": ["grp-1", "grp-9"]}
            ],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let groups = hosts_for(&server)
        .get_group_members(Some("platform_name:'Windows'"))
        .await
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups["grp-1"]["devices"],
        json!([
            {"device_id": "aid-1", "groups": ["grp-1"]},
            {"device_id": "aid-3", "groups": ["grp-1", "grp-9"]}
        ])
    );
    assert_eq!(groups["grp-2"]["devices"], json!([]));
    assert_eq!(groups["grp-2"]["name"], json!("Laptops"));
}

#[test]
fn test_into_ids_rejects_non_strings() {
    let err = into_ids(vec![json!("a"), json!({"id": "b"})], DEVICES_SCROLL_PATH).unwrap_err();
    assert!(matches!(err, Error::MalformedEnvelope { .. }));

    let ids = into_ids(vec![json!("a"), json!("b")], DEVICES_SCROLL_PATH).unwrap();
    assert_eq!(ids, vec!["a", "b"]);
}
