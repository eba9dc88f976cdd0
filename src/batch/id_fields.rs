//! Identifying-field rule table

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use serde::{Deserialize, Serialize};

/// Identifying fields checked in order when none are configured
pub const DEFAULT_ID_FIELDS: [&str; 4] = ["id", "device_id", "child_cid", "uuid"];

/// Ordered list of fields that can identify a record
///
/// The first field present on a record (as a string or integer) becomes its
/// key in the merged result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdFields(Vec<String>);

impl Default for IdFields {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELDS)
    }
}

impl IdFields {
    /// Rule table with the given fields, highest priority first
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Fields in priority order
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifier of `record` under the first matching field
    pub fn identify(&self, record: &Record) -> Option<String> {
        self.0.iter().find_map(|field| match record.get(field)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        })
    }

    /// Like `identify`, but a record without any identifying field is an error
    pub fn require(&self, record: &Record) -> Result<String> {
        self.identify(record)
            .ok_or_else(|| Error::UnrecognizedRecord {
                checked: self.0.join(", "),
                record: record.to_string(),
            })
    }
}
