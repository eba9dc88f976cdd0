//! Configuration for the toolkit
//!
//! Loaded from YAML or JSON (chosen by file extension). Every field has a
//! default, so an empty file is a valid configuration.
//!
//! ```yaml
//! pagination:
//!   limit: 100
//!   scroll_limit: 5000
//! batch:
//!   data_batch_size: 500
//!   duplicate_policy: last_wins
//! workers:
//!   max_workers: 20
//! http:
//!   base_url: "https://api.us-2.crowdstrike.com"
//! ```

use crate::batch::{BatchFetcher, IdFields, DEFAULT_DATA_BATCH_SIZE};
use crate::error::{Error, Result, ResultExt};
use crate::hosts::HostsApi;
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::pagination::{
    PaginationStyle, Paginator, DEFAULT_LIMIT, DEFAULT_PAGE_CAP_FACTOR, DEFAULT_SCROLL_LIMIT,
};
use crate::pool::PoolSizing;
use crate::types::{BackoffType, DuplicatePolicy, StringMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default API base URL (US-1 cloud)
pub const DEFAULT_BASE_URL: &str = "https://api.crowdstrike.com";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete toolkit configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Page sizes and the runaway-page cap
    #[serde(default)]
    pub pagination: PaginationSettings,

    /// Batch-by-ID retrieval
    #[serde(default)]
    pub batch: BatchSettings,

    /// Worker pool sizing
    #[serde(default)]
    pub workers: PoolSizing,

    /// HTTP transport
    #[serde(default)]
    pub http: HttpSettings,
}

impl ToolkitConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml" | "yml") | None => Self::from_yaml_str(&content),
            Some(other) => {
                return Err(Error::config(format!(
                    "Unsupported config file extension '.{other}' (expected .yaml, .yml or .json)"
                )))
            }
        };
        parsed.with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    /// Reject values the engines cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.pagination.limit == 0 {
            return Err(Error::invalid_value("pagination.limit", "must be at least 1"));
        }
        if self.pagination.scroll_limit == 0 {
            return Err(Error::invalid_value(
                "pagination.scroll_limit",
                "must be at least 1",
            ));
        }
        if self.batch.data_batch_size == 0 {
            return Err(Error::invalid_value(
                "batch.data_batch_size",
                "must be at least 1",
            ));
        }
        if self.batch.id_fields.is_empty() {
            return Err(Error::invalid_value(
                "batch.id_fields",
                "at least one identifying field is required",
            ));
        }
        if self.workers.per_core == 0 || self.workers.max_workers == 0 {
            return Err(Error::invalid_value("workers", "worker counts must be at least 1"));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::invalid_value("http.timeout_secs", "must be at least 1"));
        }
        if self.http.requests_per_second > 0 && self.http.burst_size == 0 {
            return Err(Error::invalid_value(
                "http.burst_size",
                "must be at least 1 when rate limiting is enabled",
            ));
        }
        Url::parse(&self.http.base_url)
            .map_err(|e| Error::invalid_value("http.base_url", e.to_string()))?;
        Ok(())
    }

    /// Paginator for `style` using the configured limits
    ///
    /// Token styles use `scroll_limit`, numbered styles use `limit`.
    pub fn paginator(&self, style: PaginationStyle) -> Paginator {
        let limit = match style {
            PaginationStyle::TokenOffset { .. } => self.pagination.scroll_limit,
            _ => self.pagination.limit,
        };
        Paginator::new(style)
            .with_limit(limit)
            .with_sizing(self.workers)
            .with_page_cap_factor(self.pagination.page_cap_factor)
    }

    /// Batch fetcher using the configured chunking and merge rules
    pub fn batch_fetcher(&self) -> BatchFetcher {
        BatchFetcher::new()
            .with_chunk_size(self.batch.data_batch_size)
            .with_sizing(self.workers)
            .with_id_fields(self.batch.id_fields.clone())
            .with_duplicate_policy(self.batch.duplicate_policy)
    }

    /// HTTP client configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let http = &self.http;
        let mut builder = HttpClientConfig::builder()
            .base_url(&http.base_url)
            .timeout(Duration::from_secs(http.timeout_secs))
            .max_retries(http.max_retries)
            .backoff(
                http.backoff.backoff_type,
                Duration::from_millis(http.backoff.initial_ms),
                Duration::from_millis(http.backoff.max_ms),
            );
        builder = if http.requests_per_second > 0 {
            builder.rate_limit(RateLimiterConfig::new(
                http.requests_per_second,
                http.burst_size,
            ))
        } else {
            builder.no_rate_limit()
        };
        for (key, value) in &http.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }

    /// Hosts API over `client` using the configured engines
    pub fn hosts(&self, client: Arc<HttpClient>) -> HostsApi {
        HostsApi::new(client)
            .with_fetcher(self.batch_fetcher())
            .with_sizing(self.workers)
            .with_id_page_limit(self.pagination.scroll_limit)
            .with_page_cap_factor(self.pagination.page_cap_factor)
    }
}

// ============================================================================
// Pagination Settings
// ============================================================================

/// Page sizes and the runaway-page cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationSettings {
    /// Page size of numbered-offset endpoints
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Page size of token-offset endpoints
    #[serde(default = "default_scroll_limit")]
    pub scroll_limit: u32,

    /// Sequential pagination fails after `ceil(total / limit) × factor + 1`
    /// pages; 0 disables the cap
    #[serde(default = "default_page_cap_factor")]
    pub page_cap_factor: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            scroll_limit: default_scroll_limit(),
            page_cap_factor: default_page_cap_factor(),
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_scroll_limit() -> u32 {
    DEFAULT_SCROLL_LIMIT
}

fn default_page_cap_factor() -> usize {
    DEFAULT_PAGE_CAP_FACTOR
}

// ============================================================================
// Batch Settings
// ============================================================================

/// Batch-by-ID retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Identifiers per call
    #[serde(default = "default_data_batch_size")]
    pub data_batch_size: usize,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Identifying fields, highest priority first
    #[serde(default)]
    pub id_fields: IdFields,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            data_batch_size: default_data_batch_size(),
            duplicate_policy: DuplicatePolicy::default(),
            id_fields: IdFields::default(),
        }
    }
}

fn default_data_batch_size() -> usize {
    DEFAULT_DATA_BATCH_SIZE
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffSettings,

    /// Client-side rate limit; 0 disables it
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    #[serde(default = "default_burst")]
    pub burst_size: u32,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffSettings::default(),
            requests_per_second: default_rps(),
            burst_size: default_burst(),
            headers: StringMap::new(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rps() -> u32 {
    100
}

fn default_burst() -> u32 {
    20
}

/// Retry backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffSettings {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

// ============================================================================
// Tests
// ============================================================================
