// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # falconkit
//!
//! Pagination and parallel batch retrieval for the CrowdStrike Falcon API.
//!
//! One logical request such as "every device matching this filter" or
//! "details for these 12,000 ids" becomes a correct set of concurrent API
//! calls whose results come back complete, in order and with every API
//! error surfaced.
//!
//! ## Features
//!
//! - **Numbered-offset pagination**: sequential, or parallel after a first call
//! - **Token-offset pagination**: scroll endpoints with verbatim tokens
//! - **Batch-by-ID retrieval**: chunked, concurrent, merged by identifier
//! - **HTTP transport**: retries, backoff and client-side rate limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use falconkit::hosts::HostsApi;
//! use falconkit::http::{HttpClient, HttpClientConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> falconkit::Result<()> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("https://api.crowdstrike.com")
//!         .bearer_token(std::env::var("FALCON_BEARER_TOKEN").unwrap_or_default())
//!         .build();
//!     let hosts = HostsApi::new(Arc::new(HttpClient::with_config(config)?));
//!
//!     let devices = hosts.describe_devices(Some("platform_name:'Windows'")).await?;
//!     println!("{} devices", devices.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            Resource callers (hosts) and the CLI              │
//! └──────────────────────────────────────────────────────────────┘
//!                 │                              │
//! ┌───────────────┴──────────────┐  ┌────────────┴───────────────┐
//! │          Paginator           │  │       BatchFetcher         │
//! │ numbered │ parallel │ token  │  │ chunk │ fetch │ merge      │
//! └──────────────────────────────┘  └────────────────────────────┘
//!                 │          WorkerPool          │
//! ┌───────────────┴──────────────────────────────┴───────────────┐
//! │        RemoteCall  →  HttpEndpoint  →  HttpClient            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Response envelope models
pub mod envelope;

/// Remote call seam and REST endpoints
pub mod remote;

/// HTTP client with retry and rate limiting
pub mod http;

/// Bounded worker pool
pub mod pool;

/// Batch-by-ID retrieval
pub mod batch;

/// Pagination protocols
pub mod pagination;

/// Device inventory queries
pub mod hosts;

/// Configuration loading
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, ResultExt};
pub use types::*;

// Re-export commonly used types
pub use batch::{fetch_by_ids, BatchFetcher, BatchOutcome, IdFields};
pub use config::ToolkitConfig;
pub use envelope::{ErrorRecord, PageOffset, PaginationInfo, ResponseEnvelope};
pub use pagination::{
    paginate_numbered, paginate_numbered_parallel, paginate_token, PaginationStyle, Paginator,
};
pub use remote::{remote_fn, CallParams, HttpEndpoint, RemoteCall, SharedRemoteCall};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
