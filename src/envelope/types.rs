//! Envelope types
//!
//! Serde models of the Falcon response envelope and its pagination metadata.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A full response as returned by one remote call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// HTTP status code of the call
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    /// Response body
    pub body: ResponseBody,
}

fn default_status_code() -> u16 {
    200
}

impl ResponseEnvelope {
    /// Wrap a body in a 200 envelope
    pub fn new(body: ResponseBody) -> Self {
        Self {
            status_code: default_status_code(),
            body,
        }
    }

    /// Set the status code
    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Parse an envelope from a JSON value
    pub fn from_value(value: JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Records in this page; fails if `body.resources` is absent
    pub fn resources(&self) -> Result<&[JsonValue]> {
        self.body
            .resources
            .as_deref()
            .ok_or_else(|| Error::malformed("body.resources"))
    }

    /// Error records attached to the response (empty when absent)
    pub fn errors(&self) -> &[ErrorRecord] {
        self.body.errors.as_deref().unwrap_or_default()
    }

    /// Whether the response carries at least one error record
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// Pagination metadata, if the response has any
    pub fn pagination(&self) -> Option<&PaginationInfo> {
        self.body.meta.as_ref()?.pagination.as_ref()
    }

    /// Trace id reported by the API, for log correlation
    pub fn trace_id(&self) -> Option<&str> {
        self.body.meta.as_ref()?.trace_id.as_deref()
    }

    /// Split into resources and pagination; fails if resources are absent
    pub fn into_page(self) -> Result<(Vec<JsonValue>, Option<PaginationInfo>)> {
        let ResponseBody {
            resources, meta, ..
        } = self.body;
        let resources = resources.ok_or_else(|| Error::malformed("body.resources"))?;
        Ok((resources, meta.and_then(|m| m.pagination)))
    }

    /// Take the resources; fails if they are absent
    pub fn into_resources(self) -> Result<Vec<JsonValue>> {
        self.body
            .resources
            .ok_or_else(|| Error::malformed("body.resources"))
    }

    /// Take resources and errors, tolerating either being absent
    pub fn into_resources_and_errors(self) -> (Vec<JsonValue>, Vec<ErrorRecord>) {
        (
            self.body.resources.unwrap_or_default(),
            self.body.errors.unwrap_or_default(),
        )
    }
}

/// The `body` part of an envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    /// Records or identifiers
    #[serde(default)]
    pub resources: Option<Vec<JsonValue>>,
    /// Errors for a failed or partially failed request
    #[serde(default)]
    pub errors: Option<Vec<ErrorRecord>>,
    /// Response metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ResponseBody {
    /// Create a body holding the given resources
    pub fn with_resources(resources: Vec<JsonValue>) -> Self {
        Self {
            resources: Some(resources),
            errors: Some(Vec::new()),
            meta: None,
        }
    }

    /// Attach pagination metadata
    #[must_use]
    pub fn pagination(mut self, pagination: PaginationInfo) -> Self {
        self.meta.get_or_insert_with(Meta::default).pagination = Some(pagination);
        self
    }

    /// Attach error records
    #[must_use]
    pub fn errors(mut self, errors: Vec<ErrorRecord>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Wrap into a 200 envelope
    pub fn into_envelope(self) -> ResponseEnvelope {
        ResponseEnvelope::new(self)
    }
}

/// The `meta` part of a body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Anything else the API reports (query_time, powered_by, ...)
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// An offset as reported or accepted by the API
///
/// Numbered endpoints use integers; scroll endpoints hand out an opaque
/// token that must be sent back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageOffset {
    /// Numeric record offset
    Index(u64),
    /// Opaque continuation token
    Token(String),
}

impl PageOffset {
    /// Numeric offset, if this is one
    pub fn as_index(&self) -> Option<u64> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Token(_) => None,
        }
    }
}

impl fmt::Display for PageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Token(token) => f.write_str(token),
        }
    }
}

/// `meta.pagination` of a paged response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<PageOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl PaginationInfo {
    /// Pagination block of a numbered-offset endpoint
    pub fn numbered(limit: u64, offset: u64, total: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(PageOffset::Index(offset)),
            after: None,
            total: Some(total),
        }
    }

    /// Pagination block of a token-offset endpoint
    pub fn token(limit: u64, token: Option<&str>, total: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: token.map(|t| PageOffset::Token(t.to_string())),
            after: None,
            total: Some(total),
        }
    }

    /// Pagination block of an `after`-keyed token endpoint
    pub fn after(limit: u64, token: Option<&str>, total: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
            after: token.map(str::to_string),
            total: Some(total),
        }
    }

    /// Total number of records; fails if not reported
    pub fn total(&self) -> Result<u64> {
        self.total
            .ok_or_else(|| Error::malformed("body.meta.pagination.total"))
    }

    /// Server-provided numeric offset for the next page
    pub fn next_index(&self) -> Result<u64> {
        self.offset
            .as_ref()
            .and_then(PageOffset::as_index)
            .ok_or_else(|| Error::malformed("body.meta.pagination.offset"))
    }

    /// Continuation token from `offset` (or `after` when `after_key` is set)
    ///
    /// Returned verbatim; a null, absent or empty token yields `None`.
    pub fn next_token(&self, after_key: bool) -> Option<String> {
        let token = if after_key {
            self.after.clone()
        } else {
            self.offset.as_ref().map(ToString::to_string)
        };
        token.none_if_empty()
    }
}

/// A single error reported by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    /// Extra fields such as the offending `id`
    #[serde(flatten)]
    pub details: JsonObject,
}

impl ErrorRecord {
    /// Create an error record with a code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            details: JsonObject::new(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}
