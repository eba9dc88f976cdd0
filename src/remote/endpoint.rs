//! REST endpoint as a remote call

use super::{CallParams, RemoteCall};
use crate::envelope::{ResponseBody, ResponseEnvelope};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::{JsonObject, JsonValue, Method};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Where an endpoint expects the identifiers of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdsLocation {
    /// Repeated `ids=` query parameters (GET entity endpoints)
    #[default]
    Query,
    /// `{"ids": [...]}` JSON body (POST entity endpoints)
    Body,
}

/// One Falcon REST endpoint bound to a client and fixed parameters
///
/// Fixed parameters (typically an FQL `filter`) are sent with every call,
/// so the endpoint plays the role of a partially applied API method.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    name: String,
    client: Arc<HttpClient>,
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    ids_location: IdsLocation,
}

impl HttpEndpoint {
    /// GET endpoint at `path`
    pub fn get(client: Arc<HttpClient>, path: impl Into<String>) -> Self {
        Self::new(client, Method::GET, path)
    }

    /// POST endpoint at `path`; identifiers go into the JSON body
    pub fn post(client: Arc<HttpClient>, path: impl Into<String>) -> Self {
        Self::new(client, Method::POST, path).ids_in(IdsLocation::Body)
    }

    /// Endpoint with an explicit method
    pub fn new(client: Arc<HttpClient>, method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: path.clone(),
            client,
            method,
            path,
            params: Vec::new(),
            ids_location: IdsLocation::default(),
        }
    }

    /// Set the name used in logs
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a query parameter sent with every call
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add an FQL filter; `None` and empty filters are skipped
    #[must_use]
    pub fn with_filter(self, filter: Option<&str>) -> Self {
        match filter {
            Some(filter) if !filter.is_empty() => self.with_param("filter", filter),
            _ => self,
        }
    }

    /// Choose where identifiers are sent
    #[must_use]
    pub fn ids_in(mut self, location: IdsLocation) -> Self {
        self.ids_location = location;
        self
    }

    /// Endpoint path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Translate call parameters into a request
    pub(crate) fn build_request(&self, params: CallParams) -> RequestConfig {
        let mut request = RequestConfig::new();
        for (key, value) in self.params.iter().cloned().chain(params.paging_query()) {
            request = request.query(key, value);
        }

        let mut body = params.body;
        if let Some(ids) = params.ids {
            match self.ids_location {
                IdsLocation::Query => {
                    for id in ids {
                        request = request.query("ids", id);
                    }
                }
                IdsLocation::Body => {
                    body.get_or_insert_with(JsonObject::new)
                        .insert("ids".to_string(), JsonValue::from(ids));
                }
            }
        }

        if let Some(body) = body {
            request = request.json(JsonValue::Object(body));
        }
        request
    }
}

#[async_trait]
impl RemoteCall for HttpEndpoint {
    async fn invoke(&self, params: CallParams) -> Result<ResponseEnvelope> {
        let request = self.build_request(params);
        debug!(
            "{:?} {} with {} query parameter(s)",
            self.method,
            self.path,
            request.query.len()
        );

        match self
            .client
            .request(self.method.into(), &self.path, request)
            .await
        {
            Ok(response) => {
                let status = response.status().as_u16();
                let body: ResponseBody = response.json().await?;
                Ok(ResponseEnvelope::new(body).with_status(status))
            }
            // Falcon reports per-id failures as 4xx bodies in envelope form
            Err(Error::HttpStatus { status, body }) if (400..500).contains(&status) => {
                match serde_json::from_str::<ResponseBody>(&body) {
                    Ok(parsed) if parsed.errors.as_ref().is_some_and(|e| !e.is_empty()) => {
                        Ok(ResponseEnvelope::new(parsed).with_status(status))
                    }
                    _ => Err(Error::HttpStatus { status, body }),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
