//! Parallel batch retrieval by identifier

use super::IdFields;
use crate::envelope::ErrorRecord;
use crate::error::{Error, Result};
use crate::pool::{PoolSizing, WorkerPool};
use crate::remote::{CallParams, SharedRemoteCall};
use crate::types::{DuplicatePolicy, Record, RecordMap};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of identifiers sent per call
pub const DEFAULT_DATA_BATCH_SIZE: usize = 500;

/// Split `ids` into contiguous chunks of at most `size` identifiers
pub fn chunk_ids(ids: &[String], size: usize) -> Vec<Vec<String>> {
    ids.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}

/// Records and error records gathered by a lenient fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub records: RecordMap,
    pub errors: Vec<ErrorRecord>,
}

impl BatchOutcome {
    /// True when no chunk reported an error
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// The records, or `Error::Api` if any chunk reported errors
    pub fn into_result(self) -> Result<RecordMap> {
        if self.errors.is_empty() {
            Ok(self.records)
        } else {
            Err(Error::api(self.errors))
        }
    }
}

/// Resources and errors of one chunk, in the order the API returned them
type ChunkPage = (Vec<Record>, Vec<ErrorRecord>);

/// Fetches details for many identifiers with a bounded set of concurrent calls
#[derive(Debug, Clone)]
pub struct BatchFetcher {
    chunk_size: usize,
    sizing: PoolSizing,
    id_fields: IdFields,
    duplicate_policy: DuplicatePolicy,
}

impl Default for BatchFetcher {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_DATA_BATCH_SIZE,
            sizing: PoolSizing::default(),
            id_fields: IdFields::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl BatchFetcher {
    /// Fetcher with default chunking, sizing and merge rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of identifiers per call
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the worker pool sizing
    #[must_use]
    pub fn with_sizing(mut self, sizing: PoolSizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Set the identifying-field rule table
    #[must_use]
    pub fn with_id_fields(mut self, id_fields: IdFields) -> Self {
        self.id_fields = id_fields;
        self
    }

    /// Set how records sharing an identifier are merged
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn sizing(&self) -> PoolSizing {
        self.sizing
    }

    pub fn id_fields(&self) -> &IdFields {
        &self.id_fields
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Fetch every identifier and merge the records by identifier
    ///
    /// Fails with `Error::Api` carrying every error record if any chunk
    /// reported errors, even when the other chunks succeeded.
    pub async fn fetch(&self, ids: &[String], remote: &SharedRemoteCall) -> Result<RecordMap> {
        let pages = self.fetch_chunks(ids, remote).await?;
        let (resources, errors) = split_pages(pages);
        if !errors.is_empty() {
            return Err(Error::api(errors));
        }
        self.merge(resources)
    }

    /// Fetch every identifier, returning error records next to the records
    pub async fn fetch_with_errors(
        &self,
        ids: &[String],
        remote: &SharedRemoteCall,
    ) -> Result<BatchOutcome> {
        let pages = self.fetch_chunks(ids, remote).await?;
        let (resources, errors) = split_pages(pages);
        Ok(BatchOutcome {
            records: self.merge(resources)?,
            errors,
        })
    }

    async fn fetch_chunks(
        &self,
        ids: &[String],
        remote: &SharedRemoteCall,
    ) -> Result<Vec<ChunkPage>> {
        if ids.is_empty() {
            debug!("No identifiers to fetch from {}", remote.name());
            return Ok(Vec::new());
        }

        let chunks = chunk_ids(ids, self.chunk_size);
        let pool = WorkerPool::sized(&self.sizing);
        info!(
            "Fetching {} identifier(s) from {} in {} batch(es) of up to {}",
            ids.len(),
            remote.name(),
            chunks.len(),
            self.chunk_size
        );

        let remote = Arc::clone(remote);
        pool.run_ordered(chunks, move |index, chunk: Vec<String>| {
            let remote = Arc::clone(&remote);
            async move {
                let requested = chunk.len();
                let envelope = remote.invoke(CallParams::ids(chunk)).await?;
                let (resources, errors) = envelope.into_resources_and_errors();
                debug!(
                    "Batch {index}: {requested} requested, {} returned, {} error(s)",
                    resources.len(),
                    errors.len()
                );
                Ok((resources, errors))
            }
        })
        .await
    }

    /// Merge chunk resources in submission order under the duplicate policy
    fn merge(&self, chunks: Vec<Vec<Record>>) -> Result<RecordMap> {
        let mut records = RecordMap::new();
        for record in chunks.into_iter().flatten() {
            let key = self.id_fields.require(&record)?;
            match (records.entry(key), self.duplicate_policy) {
                (Entry::Vacant(slot), _) => {
                    slot.insert(record);
                }
                (Entry::Occupied(mut slot), DuplicatePolicy::LastWins) => {
                    debug!("Replacing duplicate record '{}'", slot.key());
                    slot.insert(record);
                }
                (Entry::Occupied(slot), DuplicatePolicy::FirstWins) => {
                    debug!("Keeping first record for duplicate '{}'", slot.key());
                }
                (Entry::Occupied(slot), DuplicatePolicy::Reject) => {
                    return Err(Error::DuplicateRecord {
                        id: slot.key().clone(),
                    });
                }
            }
        }
        Ok(records)
    }
}

fn split_pages(pages: Vec<ChunkPage>) -> (Vec<Vec<Record>>, Vec<ErrorRecord>) {
    let mut resources = Vec::with_capacity(pages.len());
    let mut errors = Vec::new();
    for (records, page_errors) in pages {
        resources.push(records);
        errors.extend(page_errors);
    }
    (resources, errors)
}

/// Fetch `ids` in chunks of `chunk_size` with the default merge rules
pub async fn fetch_by_ids(
    ids: &[String],
    remote: &SharedRemoteCall,
    chunk_size: usize,
) -> Result<RecordMap> {
    BatchFetcher::new()
        .with_chunk_size(chunk_size)
        .fetch(ids, remote)
        .await
}
