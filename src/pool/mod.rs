//! Worker pool module
//!
//! A bounded pool used to overlap I/O-bound remote calls. A pool is built
//! per batch or parallel pagination call and dropped afterwards; nothing is
//! shared between calls.
//!
//! # Sizing
//!
//! `workers = min(per_core × logical cores, max_workers)`, by default
//! `min(2 × cores, 20)`, and never fewer than one.
//!
//! # Ordering
//!
//! `WorkerPool::run_ordered` joins every task before returning and yields
//! results in submission order, whatever order the tasks finish in.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Default multiplier applied to the logical core count
pub const DEFAULT_WORKERS_PER_CORE: usize = 2;

/// Default hard cap on concurrent workers
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// How many workers a pool may run at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSizing {
    /// Workers per logical core
    #[serde(default = "default_per_core")]
    pub per_core: usize,
    /// Upper bound regardless of core count
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_per_core() -> usize {
    DEFAULT_WORKERS_PER_CORE
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

impl Default for PoolSizing {
    fn default() -> Self {
        Self {
            per_core: DEFAULT_WORKERS_PER_CORE,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl PoolSizing {
    /// Sizing with explicit values
    pub fn new(per_core: usize, max_workers: usize) -> Self {
        Self {
            per_core,
            max_workers,
        }
    }

    /// Worker count for `cores` logical cores
    pub fn workers_for(&self, cores: usize) -> usize {
        cores
            .saturating_mul(self.per_core)
            .min(self.max_workers)
            .max(1)
    }

    /// Worker count for this machine
    pub fn workers(&self) -> usize {
        let workers = self.workers_for(num_cpus::get());
        debug!("Will use up to {workers} workers for batch data retrieval");
        workers
    }
}

/// Worker count for this machine with the default sizing
pub fn default_worker_count() -> usize {
    PoolSizing::default().workers()
}

/// A bounded, call-scoped pool of async workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Pool running at most `workers` tasks at once
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Pool sized for this machine
    pub fn sized(sizing: &PoolSizing) -> Self {
        Self::new(sizing.workers())
    }

    /// Maximum concurrent tasks
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `worker` over every input and return results in input order
    ///
    /// Every task runs to completion before this returns. If any task
    /// fails, the error of the earliest failing input is returned.
    pub async fn run_ordered<I, T, F, Fut>(&self, inputs: Vec<I>, worker: F) -> Result<Vec<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(usize, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let permits = Arc::new(Semaphore::new(self.workers));
        let worker = Arc::new(worker);
        debug!(
            "Dispatching {} task(s) to {} worker(s)",
            inputs.len(),
            self.workers
        );

        let handles: Vec<_> = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                let permits = Arc::clone(&permits);
                let worker = Arc::clone(&worker);
                tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::worker(e.to_string()))?;
                    debug!("Worker {index} started");
                    worker(index, input).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        let mut first_error = None;

        for joined in futures::future::join_all(handles).await {
            let outcome = joined.unwrap_or_else(|e| Err(Error::worker(e.to_string())));
            match outcome {
                Ok(value) => results.push(value),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}
