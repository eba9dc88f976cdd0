//! Pagination module
//!
//! Supports: Numbered offset (sequential and parallel), Token offset
//!
//! # Overview
//!
//! Falcon endpoints page their results in one of two ways:
//!
//! - **Numbered offset**: `offset` is a record index and `meta.pagination.total`
//!   is authoritative. Pages can be fetched one after another, or all at once
//!   after a first call has revealed the total.
//! - **Token offset**: `offset` (or `after`) is an opaque token that must be
//!   echoed back verbatim. Pages can only be fetched in sequence.
//!
//! Every paginator returns the records in page order and stops as soon as
//! the first page comes back empty.

mod numbered;
mod token;
mod types;

pub use numbered::{paginate_numbered, paginate_numbered_parallel};
pub use token::paginate_token;
pub use types::{
    PageGuard, PaginationStyle, Paginator, DEFAULT_LIMIT, DEFAULT_PAGE_CAP_FACTOR,
    DEFAULT_SCROLL_LIMIT,
};
