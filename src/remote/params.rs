//! Parameters of a single remote call

use crate::envelope::PageOffset;
use crate::types::{JsonObject, JsonValue};

/// Named parameters passed to `RemoteCall::invoke`
///
/// Only the fields relevant to the pagination style in use are set; the
/// rest stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallParams {
    /// Page size
    pub limit: Option<u32>,
    /// Numeric offset or continuation token
    pub offset: Option<PageOffset>,
    /// Continuation token for `after`-keyed endpoints
    pub after: Option<String>,
    /// Identifiers to look up
    pub ids: Option<Vec<String>>,
    /// JSON request body
    pub body: Option<JsonObject>,
}

impl CallParams {
    /// Numbered page: `offset` records skipped, up to `limit` returned
    pub fn page(offset: u64, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(PageOffset::Index(offset)),
            ..Self::default()
        }
    }

    /// Token page; `None` requests the first page
    pub fn token(limit: u32, token: Option<String>) -> Self {
        Self {
            limit: Some(limit),
            offset: token.map(PageOffset::Token),
            ..Self::default()
        }
    }

    /// `after`-keyed token page; `None` requests the first page
    pub fn after(limit: u32, token: Option<String>) -> Self {
        Self {
            limit: Some(limit),
            after: token,
            ..Self::default()
        }
    }

    /// Lookup of a batch of identifiers
    pub fn ids(ids: Vec<String>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    /// Call carrying only a JSON body
    pub fn body(body: JsonObject) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// `extra` merged with `limit` and `offset`; the paging keys win
    ///
    /// A `limit` or `offset` already present in `extra` is overwritten, so
    /// callers cannot start mid-result-set or change the page size through
    /// the body. Clients that merge the caller's body over the paging keys
    /// behave the other way round; use [`Paginator::with_limit`] to pick the
    /// page size instead.
    ///
    /// [`Paginator::with_limit`]: crate::pagination::Paginator::with_limit
    pub fn numbered_body(extra: &JsonObject, offset: u64, limit: u32) -> Self {
        let mut body = extra.clone();
        body.insert("limit".to_string(), JsonValue::from(limit));
        body.insert("offset".to_string(), JsonValue::from(offset));
        Self::body(body)
    }

    /// Paging parameters rendered as query pairs
    pub fn paging_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = &self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after".to_string(), after.clone()));
        }
        pairs
    }

    /// Numeric offset, if this call carries one
    pub fn offset_index(&self) -> Option<u64> {
        self.offset.as_ref().and_then(PageOffset::as_index)
    }

    /// Continuation token from `offset` or `after`
    pub fn token_value(&self) -> Option<&str> {
        match (&self.offset, &self.after) {
            (Some(PageOffset::Token(token)), _) => Some(token),
            (_, Some(after)) => Some(after),
            _ => None,
        }
    }
}
