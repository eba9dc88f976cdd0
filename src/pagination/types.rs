//! Pagination types
//!
//! Style selection, the runaway-page guard and the `Paginator` front end
//! that dispatches to the protocol implementations.

use super::{numbered, token};
use crate::error::{Error, Result};
use crate::pool::PoolSizing;
use crate::remote::SharedRemoteCall;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default page size of numbered-offset endpoints
pub const DEFAULT_LIMIT: u32 = 100;

/// Default page size of token-offset (scroll) endpoints
pub const DEFAULT_SCROLL_LIMIT: u32 = 5000;

/// Default multiplier applied to the expected page count
pub const DEFAULT_PAGE_CAP_FACTOR: usize = 4;

/// Pagination protocol spoken by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    /// Integer offset in the request body, next offset taken from the server
    #[default]
    NumberedOffset,
    /// Integer offset as parameters; pages fetched concurrently after a first call
    NumberedOffsetParallel,
    /// Opaque token handed back verbatim
    TokenOffset {
        /// Token travels as `after` instead of `offset`
        #[serde(default)]
        after_key: bool,
    },
}

impl PaginationStyle {
    /// Page size used when none is configured
    pub fn default_limit(&self) -> u32 {
        match self {
            Self::NumberedOffset | Self::NumberedOffsetParallel => DEFAULT_LIMIT,
            Self::TokenOffset { .. } => DEFAULT_SCROLL_LIMIT,
        }
    }
}

/// Counts pages of a sequential pagination and stops runaway loops
///
/// Expects `ceil(total / page_size)` pages and fails once more than
/// `expected × factor + 1` pages were requested. A factor of zero disables
/// the cap.
///
/// Servers may serve fewer records per page than requested, so `page_size`
/// is the size of the first page actually received (see [`PageGuard::observed`]).
#[derive(Debug, Clone)]
pub struct PageGuard {
    cap: Option<usize>,
    pages: usize,
    total: u64,
    limit: u32,
}

impl PageGuard {
    /// Guard for a result set of `total` records in pages of `page_size`
    pub fn new(total: u64, page_size: u32, factor: usize) -> Self {
        let expected = total.div_ceil(u64::from(page_size.max(1))) as usize;
        let cap = (factor > 0).then(|| expected.saturating_mul(factor).saturating_add(1));
        Self {
            cap,
            pages: 0,
            total,
            limit: page_size,
        }
    }

    /// Guard sized from the first page: `received` records out of a requested `limit`
    pub fn observed(total: u64, received: usize, limit: u32, factor: usize) -> Self {
        let page_size = u32::try_from(received).unwrap_or(u32::MAX).clamp(1, limit.max(1));
        Self::new(total, page_size, factor)
    }

    /// Count one more page; fails once the cap is exceeded
    pub fn record_page(&mut self) -> Result<()> {
        self.pages += 1;
        match self.cap {
            Some(cap) if self.pages > cap => Err(Error::PageLimitExceeded {
                pages: cap,
                total: self.total,
                limit: self.limit,
            }),
            _ => Ok(()),
        }
    }

    /// Pages counted so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Maximum number of pages allowed, if capped
    pub fn cap(&self) -> Option<usize> {
        self.cap
    }
}

/// Collects every page of a paginated endpoint
///
/// ```rust,ignore
/// let ids = Paginator::token().collect(&scroll_endpoint).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Paginator {
    style: PaginationStyle,
    limit: u32,
    body: JsonObject,
    sizing: PoolSizing,
    page_cap_factor: usize,
}

impl Paginator {
    /// Paginator for `style` with that style's default page size
    pub fn new(style: PaginationStyle) -> Self {
        Self {
            style,
            limit: style.default_limit(),
            body: JsonObject::new(),
            sizing: PoolSizing::default(),
            page_cap_factor: DEFAULT_PAGE_CAP_FACTOR,
        }
    }

    /// Sequential numbered-offset paginator
    pub fn numbered() -> Self {
        Self::new(PaginationStyle::NumberedOffset)
    }

    /// Parallel numbered-offset paginator
    pub fn parallel() -> Self {
        Self::new(PaginationStyle::NumberedOffsetParallel)
    }

    /// Token paginator passing the token as `offset`
    pub fn token() -> Self {
        Self::new(PaginationStyle::TokenOffset { after_key: false })
    }

    /// Token paginator passing the token as `after`
    pub fn after() -> Self {
        Self::new(PaginationStyle::TokenOffset { after_key: true })
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Extra body fields sent with every numbered-offset request
    #[must_use]
    pub fn with_body(mut self, body: JsonObject) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_sizing(mut self, sizing: PoolSizing) -> Self {
        self.sizing = sizing;
        self
    }

    #[must_use]
    pub fn with_page_cap_factor(mut self, factor: usize) -> Self {
        self.page_cap_factor = factor;
        self
    }

    pub fn style(&self) -> PaginationStyle {
        self.style
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page_cap_factor(&self) -> usize {
        self.page_cap_factor
    }

    /// Fetch every page from `remote` and return the records in order
    pub async fn collect(&self, remote: &SharedRemoteCall) -> Result<Vec<JsonValue>> {
        debug!(
            "Paginating {} with {:?} (limit {})",
            remote.name(),
            self.style,
            self.limit
        );
        match self.style {
            PaginationStyle::NumberedOffset => {
                numbered::collect_sequential(remote, &self.body, self.limit, self.page_cap_factor)
                    .await
            }
            PaginationStyle::NumberedOffsetParallel => {
                numbered::collect_parallel(remote, self.limit, &self.sizing).await
            }
            PaginationStyle::TokenOffset { after_key } => {
                token::collect_tokens(remote, self.limit, after_key, self.page_cap_factor).await
            }
        }
    }
}
