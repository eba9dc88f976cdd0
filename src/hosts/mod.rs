//! Hosts module
//!
//! Device inventory queries composed from the pagination and batch-fetch
//! engines: page through the matching device ids, then fetch the details
//! for those ids in parallel batches. Host groups follow the same pattern
//! with numbered offsets.

use crate::batch::BatchFetcher;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pagination::{Paginator, DEFAULT_PAGE_CAP_FACTOR, DEFAULT_SCROLL_LIMIT};
use crate::pool::PoolSizing;
use crate::remote::{HttpEndpoint, SharedRemoteCall};
use crate::types::{JsonValue, RecordMap};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Token-paged query for device ids
pub const DEVICES_SCROLL_PATH: &str = "/devices/queries/devices-scroll/v1";
/// Numbered-offset query for hidden device ids
pub const DEVICES_HIDDEN_PATH: &str = "/devices/queries/devices-hidden/v1";
/// Device details by id
pub const DEVICE_DETAILS_PATH: &str = "/devices/entities/devices/v2";
/// Login history by device id
pub const LOGIN_HISTORY_PATH: &str = "/devices/combined/devices/login-history/v1";
/// Network address history by device id
pub const NETWORK_ADDRESS_HISTORY_PATH: &str =
    "/devices/combined/devices/network-address-history/v1";
/// Online state by device id
pub const ONLINE_STATE_PATH: &str = "/devices/entities/online-state/v1";
/// Numbered-offset query for host group ids
pub const HOST_GROUPS_QUERY_PATH: &str = "/devices/queries/host-groups/v1";
/// Host group details by id
pub const HOST_GROUP_DETAILS_PATH: &str = "/devices/entities/host-groups/v1";
/// Numbered-offset query for the device ids of one host group
pub const GROUP_MEMBER_IDS_PATH: &str = "/devices/queries/host-group-members/v1";
/// Numbered-offset query for group member details
pub const GROUP_MEMBERS_PATH: &str = "/devices/combined/host-group-members/v1";

/// Page size of host group queries
pub const HOST_GROUP_PAGE_LIMIT: u32 = 100;

/// State reported for devices the online-state lookup did not cover
const UNKNOWN_STATE: &str = "unknown";

/// Device inventory operations over the Hosts API
#[derive(Debug, Clone)]
pub struct HostsApi {
    client: Arc<HttpClient>,
    fetcher: BatchFetcher,
    sizing: PoolSizing,
    id_page_limit: u32,
    page_cap_factor: usize,
}

impl HostsApi {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            fetcher: BatchFetcher::new(),
            sizing: PoolSizing::default(),
            id_page_limit: DEFAULT_SCROLL_LIMIT,
            page_cap_factor: DEFAULT_PAGE_CAP_FACTOR,
        }
    }

    /// Use `fetcher` for detail lookups
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: BatchFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Worker sizing for parallel id pagination
    #[must_use]
    pub fn with_sizing(mut self, sizing: PoolSizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Page size of id queries
    #[must_use]
    pub fn with_id_page_limit(mut self, limit: u32) -> Self {
        self.id_page_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_page_cap_factor(mut self, factor: usize) -> Self {
        self.page_cap_factor = factor;
        self
    }

    /// Ids of every device matching `filter`
    pub async fn get_device_ids(&self, filter: Option<&str>) -> Result<Vec<String>> {
        info!("Obtaining a list of all device IDs");
        let endpoint: SharedRemoteCall = Arc::new(
            HttpEndpoint::get(Arc::clone(&self.client), DEVICES_SCROLL_PATH)
                .named("query_devices_by_filter_scroll")
                .with_filter(filter),
        );
        let pages = Paginator::token()
            .with_limit(self.id_page_limit)
            .with_page_cap_factor(self.page_cap_factor)
            .collect(&endpoint)
            .await?;
        into_ids(pages, DEVICES_SCROLL_PATH)
    }

    /// Ids of every hidden device matching `filter`
    pub async fn get_hidden_ids(&self, filter: Option<&str>) -> Result<Vec<String>> {
        info!("Obtaining a list of hidden device IDs");
        let endpoint: SharedRemoteCall = Arc::new(
            HttpEndpoint::get(Arc::clone(&self.client), DEVICES_HIDDEN_PATH)
                .named("query_hidden_devices")
                .with_filter(filter),
        );
        let pages = Paginator::parallel()
            .with_limit(self.id_page_limit)
            .with_sizing(self.sizing)
            .collect(&endpoint)
            .await?;
        into_ids(pages, DEVICES_HIDDEN_PATH)
    }

    /// Details of every device matching `filter`, keyed by device id
    pub async fn describe_devices(&self, filter: Option<&str>) -> Result<RecordMap> {
        info!("Describing devices according to the filter");
        let ids = self.get_device_ids(filter).await?;
        self.fetch_details(&ids, DEVICE_DETAILS_PATH, "get_device_details")
            .await
    }

    /// Details of every hidden device matching `filter`
    pub async fn describe_hidden_devices(&self, filter: Option<&str>) -> Result<RecordMap> {
        info!("Describing hidden devices according to the filter");
        let ids = self.get_hidden_ids(filter).await?;
        self.fetch_details(&ids, DEVICE_DETAILS_PATH, "get_device_details")
            .await
    }

    /// Login history of every device matching `filter`
    pub async fn describe_login_history(&self, filter: Option<&str>) -> Result<RecordMap> {
        info!("Describing login history according to the filter");
        let ids = self.get_device_ids(filter).await?;
        self.fetch_details(&ids, LOGIN_HISTORY_PATH, "query_device_login_history")
            .await
    }

    /// Network address history of every device matching `filter`
    pub async fn describe_network_address_history(
        &self,
        filter: Option<&str>,
    ) -> Result<RecordMap> {
        info!("Describing network address history according to the filter");
        let ids = self.get_device_ids(filter).await?;
        self.fetch_details(
            &ids,
            NETWORK_ADDRESS_HISTORY_PATH,
            "query_network_address_history",
        )
        .await
    }

    /// Online state of the given devices, keyed by device id
    pub async fn get_online_state(&self, device_ids: &[String]) -> Result<RecordMap> {
        info!("Obtaining online state data for {} devices", device_ids.len());
        let endpoint: SharedRemoteCall = Arc::new(
            HttpEndpoint::get(Arc::clone(&self.client), ONLINE_STATE_PATH)
                .named("get_online_state"),
        );
        self.fetcher.fetch(device_ids, &endpoint).await
    }

    /// Details of every device matching `filter` with its online `state`
    ///
    /// Devices missing from the online-state lookup are reported as `unknown`.
    pub async fn describe_state(&self, filter: Option<&str>) -> Result<RecordMap> {
        info!("Describing device states according to the filter");
        let ids = self.get_device_ids(filter).await?;
        let mut devices = self
            .fetch_details(&ids, DEVICE_DETAILS_PATH, "get_device_details")
            .await?;
        let states = self.get_online_state(&ids).await?;

        for (device_id, device) in &mut devices {
            let state = states
                .get(device_id)
                .and_then(|record| record.get("state"))
                .cloned()
                .unwrap_or_else(|| JsonValue::from(UNKNOWN_STATE));
            if let Some(device) = device.as_object_mut() {
                device.insert("state".to_string(), state);
            }
        }
        Ok(devices)
    }

    /// Ids of every host group matching `filter`
    pub async fn get_group_ids(&self, filter: Option<&str>) -> Result<Vec<String>> {
        info!("Searching for host group IDs");
        let endpoint: SharedRemoteCall = Arc::new(
            HttpEndpoint::get(Arc::clone(&self.client), HOST_GROUPS_QUERY_PATH)
                .named("query_host_groups")
                .with_filter(filter),
        );
        let pages = self.group_paginator().collect(&endpoint).await?;
        into_ids(pages, HOST_GROUPS_QUERY_PATH)
    }

    /// Details of every host group matching `filter`, keyed by group id
    pub async fn describe_groups(&self, filter: Option<&str>) -> Result<RecordMap> {
        info!("Describing host groups according to the filter");
        let ids = self.get_group_ids(filter).await?;
        let endpoint: SharedRemoteCall = Arc::new(
            HttpEndpoint::get(Arc::clone(&self.client), HOST_GROUP_DETAILS_PATH)
                .named("get_host_groups"),
        );
        self.fetcher.fetch(&ids, &endpoint).await
    }

    /// Device ids belonging to the host group `group_id`
    pub async fn get_group_member_ids(&self, group_id: &str) -> Result<Vec<String>> {
        info!("Searching for members of host group {group_id}");
        let endpoint: SharedRemoteCall = Arc::new(
            HttpEndpoint::get(Arc::clone(&self.client), GROUP_MEMBER_IDS_PATH)
                .named("query_group_members")
                .with_param("id", group_id),
        );
        let pages = self.group_paginator().collect(&endpoint).await?;
        into_ids(pages, GROUP_MEMBER_IDS_PATH)
    }

    /// Every host group with a `devices` list of its members
    ///
    /// `filter` narrows the member devices; every group is returned, with an
    /// empty list when none of its members match.
    pub async fn get_group_members(&self, filter: Option<&str>) -> Result<RecordMap> {
        let mut groups = self.describe_groups(None).await?;
        let endpoint: SharedRemoteCall = Arc::new(
            HttpEndpoint::get(Arc::clone(&self.client), GROUP_MEMBERS_PATH)
                .named("query_combined_group_members")
                .with_filter(filter),
        );
        let members = self.group_paginator().collect(&endpoint).await?;

        let mut devices_by_group: HashMap<String, Vec<JsonValue>> = HashMap::new();
        for device in members {
            let Some(group_ids) = device.get("groups").and_then(JsonValue::as_array) else {
                continue;
            };
            for group_id in group_ids.iter().filter_map(JsonValue::as_str) {
                devices_by_group
                    .entry(group_id.to_string())
                    .or_default()
                    .push(device.clone());
            }
        }

        for (group_id, group) in &mut groups {
            let devices = devices_by_group.remove(group_id).unwrap_or_default();
            if let Some(group) = group.as_object_mut() {
                group.insert("devices".to_string(), JsonValue::Array(devices));
            }
        }
        Ok(groups)
    }

    fn group_paginator(&self) -> Paginator {
        Paginator::parallel()
            .with_limit(HOST_GROUP_PAGE_LIMIT)
            .with_sizing(self.sizing)
    }

    async fn fetch_details(&self, ids: &[String], path: &str, name: &str) -> Result<RecordMap> {
        let endpoint: SharedRemoteCall =
            Arc::new(HttpEndpoint::post(Arc::clone(&self.client), path).named(name));
        self.fetcher.fetch(ids, &endpoint).await
    }
}

/// Id query pages must hold plain string identifiers
fn into_ids(values: Vec<JsonValue>, path: &str) -> Result<Vec<String>> {
    values
        .into_iter()
        .map(|value| match value {
            JsonValue::String(id) => Ok(id),
            _ => Err(Error::malformed(format!("{path}: body.resources[]"))),
        })
        .collect()
}

#[cfg(test)]
mod tests;
