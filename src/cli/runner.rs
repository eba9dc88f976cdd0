//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, HttpMethod, OutputFormat, QueryStyle};
use crate::config::ToolkitConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig};
use crate::pagination::PaginationStyle;
use crate::remote::{HttpEndpoint, SharedRemoteCall};
use crate::types::{JsonObject, JsonValue};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        match &self.cli.command {
            Commands::Devices {
                filter,
                hidden,
                ids_only,
            } => {
                self.devices(&config, filter.as_deref(), *hidden, *ids_only)
                    .await
            }
            Commands::Query {
                path,
                style,
                limit,
                filter,
            } => {
                self.query(&config, path, *style, *limit, filter.as_deref())
                    .await
            }
            Commands::Describe { path, ids, method } => {
                self.describe(&config, path, ids, *method).await
            }
            Commands::Config => self.output(&config),
        }
    }

    /// Configuration file (or defaults) with command-line overrides applied
    fn load_config(&self) -> Result<ToolkitConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ToolkitConfig::from_file(path)?,
            None => ToolkitConfig::default(),
        };
        if let Some(base_url) = &self.cli.base_url {
            config.http.base_url.clone_from(base_url);
            config.validate()?;
        }
        Ok(config)
    }

    fn client(&self, config: &ToolkitConfig) -> Result<Arc<HttpClient>> {
        let mut http: HttpClientConfig = config.http_client_config();
        if let Some(token) = &self.cli.bearer_token {
            http.default_headers
                .insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        Ok(Arc::new(HttpClient::with_config(http)?))
    }

    async fn devices(
        &self,
        config: &ToolkitConfig,
        filter: Option<&str>,
        hidden: bool,
        ids_only: bool,
    ) -> Result<()> {
        let hosts = config.hosts(self.client(config)?);
        let start = Instant::now();

        match (hidden, ids_only) {
            (false, true) => {
                let ids = hosts.get_device_ids(filter).await?;
                info!("Found {} device(s) in {:?}", ids.len(), start.elapsed());
                self.output(&ids)
            }
            (true, true) => {
                let ids = hosts.get_hidden_ids(filter).await?;
                info!("Found {} hidden device(s) in {:?}", ids.len(), start.elapsed());
                self.output(&ids)
            }
            (false, false) => {
                let devices = hosts.describe_devices(filter).await?;
                info!("Described {} device(s) in {:?}", devices.len(), start.elapsed());
                self.output(&devices)
            }
            (true, false) => {
                let devices = hosts.describe_hidden_devices(filter).await?;
                info!(
                    "Described {} hidden device(s) in {:?}",
                    devices.len(),
                    start.elapsed()
                );
                self.output(&devices)
            }
        }
    }

    async fn query(
        &self,
        config: &ToolkitConfig,
        path: &str,
        style: QueryStyle,
        limit: Option<u32>,
        filter: Option<&str>,
    ) -> Result<()> {
        let style = match style {
            QueryStyle::Numbered => PaginationStyle::NumberedOffset,
            QueryStyle::Parallel => PaginationStyle::NumberedOffsetParallel,
            QueryStyle::Token => PaginationStyle::TokenOffset { after_key: false },
            QueryStyle::After => PaginationStyle::TokenOffset { after_key: true },
        };

        let mut paginator = config.paginator(style);
        if let Some(limit) = limit {
            paginator = paginator.with_limit(limit);
        }

        // Sequential numbered endpoints page through the body, so they are POSTed
        let client = self.client(config)?;
        let endpoint: SharedRemoteCall = Arc::new(match style {
            PaginationStyle::NumberedOffset => HttpEndpoint::post(client, path),
            _ => HttpEndpoint::get(client, path).with_filter(filter),
        });
        if let (PaginationStyle::NumberedOffset, Some(filter)) = (style, filter) {
            let mut body = JsonObject::new();
            body.insert("filter".to_string(), JsonValue::from(filter));
            paginator = paginator.with_body(body);
        }

        let start = Instant::now();
        let records = paginator.collect(&endpoint).await?;
        info!("Collected {} record(s) in {:?}", records.len(), start.elapsed());
        self.output(&records)
    }

    async fn describe(
        &self,
        config: &ToolkitConfig,
        path: &str,
        ids: &[String],
        method: HttpMethod,
    ) -> Result<()> {
        let client = self.client(config)?;
        let endpoint: SharedRemoteCall = Arc::new(match method {
            HttpMethod::Get => HttpEndpoint::get(client, path),
            HttpMethod::Post => HttpEndpoint::post(client, path),
        });

        let start = Instant::now();
        let records = config.batch_fetcher().fetch(ids, &endpoint).await?;
        info!("Fetched {} record(s) in {:?}", records.len(), start.elapsed());
        self.output(&records)
    }

    /// Write a result to stdout
    fn output<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{rendered}");
        Ok(())
    }
}
