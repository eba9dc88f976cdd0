//! Response envelope module
//!
//! Every Falcon endpoint answers with the same envelope shape:
//!
//! ```text
//! { "body": { "resources": [...], "errors": [...], "meta": { "pagination": {...} } } }
//! ```
//!
//! The types here deserialize that shape and expose checked accessors so
//! that a missing key surfaces as `Error::MalformedEnvelope` instead of a
//! silent default.

mod types;

pub use types::{ErrorRecord, Meta, PageOffset, PaginationInfo, ResponseBody, ResponseEnvelope};
