//! Remote call module
//!
//! A remote call performs exactly one API request and hands back the
//! response envelope. The paginators and the batch fetcher only ever talk
//! to the API through this seam.
//!
//! # Implementations
//!
//! - `HttpEndpoint` - one REST endpoint over the crate's `HttpClient`
//! - `FnRemoteCall` - wraps an async closure (tests, ad-hoc wiring)

mod endpoint;
mod params;

pub use endpoint::{HttpEndpoint, IdsLocation};
pub use params::CallParams;

use crate::envelope::ResponseEnvelope;
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Performs one remote operation with the given parameters
///
/// Implementations own transport concerns (timeouts, retries, rate
/// limiting); callers treat every invocation as a single opaque unit.
/// Must be safe to invoke concurrently.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Execute one request
    async fn invoke(&self, params: CallParams) -> Result<ResponseEnvelope>;

    /// Name used in log lines
    fn name(&self) -> &str {
        "remote_call"
    }
}

/// A remote call shared between workers
pub type SharedRemoteCall = Arc<dyn RemoteCall>;

/// Remote call backed by an async closure
pub struct FnRemoteCall<F> {
    name: String,
    func: F,
}

impl<F> FnRemoteCall<F> {
    /// Wrap a closure under the given name
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> RemoteCall for FnRemoteCall<F>
where
    F: Fn(CallParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResponseEnvelope>> + Send + 'static,
{
    async fn invoke(&self, params: CallParams) -> Result<ResponseEnvelope> {
        (self.func)(params).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build a shared remote call from an async closure
pub fn remote_fn<F, Fut>(name: impl Into<String>, func: F) -> SharedRemoteCall
where
    F: Fn(CallParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResponseEnvelope>> + Send + 'static,
{
    Arc::new(FnRemoteCall::new(name, func))
}

#[cfg(test)]
mod tests;
