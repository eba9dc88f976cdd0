//! Batch-by-ID fetch module
//!
//! Turns "details for N identifiers" into `ceil(N / chunk_size)` concurrent
//! calls and merges the answers into one map keyed by identifier.
//!
//! # Merge rules
//!
//! - Records are merged in chunk submission order, never completion order.
//! - A record's key is the first field of the `IdFields` table it carries.
//! - Records sharing a key are resolved by `DuplicatePolicy`.
//! - Any error record from any chunk fails `fetch` with `Error::Api`.

mod fetcher;
mod id_fields;

pub use fetcher::{chunk_ids, fetch_by_ids, BatchFetcher, BatchOutcome, DEFAULT_DATA_BATCH_SIZE};
pub use id_fields::{IdFields, DEFAULT_ID_FIELDS};
