//! Numbered-offset pagination, sequential and parallel

use super::{PageGuard, DEFAULT_PAGE_CAP_FACTOR};
use crate::error::{Error, Result};
use crate::pool::{PoolSizing, WorkerPool};
use crate::remote::{CallParams, SharedRemoteCall};
use crate::types::{JsonObject, JsonValue};
use std::sync::Arc;
use tracing::{debug, info};

/// Fetch every page of a numbered-offset endpoint, one call at a time
///
/// `body` is merged into each request body next to `limit` and `offset`.
/// The next offset is whatever the server reports, not a local count.
pub async fn paginate_numbered(
    remote: &SharedRemoteCall,
    body: &JsonObject,
    limit: u32,
) -> Result<Vec<JsonValue>> {
    collect_sequential(remote, body, limit, DEFAULT_PAGE_CAP_FACTOR).await
}

/// Fetch every page of a numbered-offset endpoint with concurrent calls
///
/// A first call learns the total; the remaining offsets are then fetched on
/// a worker pool and concatenated in offset order.
pub async fn paginate_numbered_parallel(
    remote: &SharedRemoteCall,
    limit: u32,
) -> Result<Vec<JsonValue>> {
    collect_parallel(remote, limit, &PoolSizing::default()).await
}

pub(crate) async fn collect_sequential(
    remote: &SharedRemoteCall,
    body: &JsonObject,
    limit: u32,
    page_cap_factor: usize,
) -> Result<Vec<JsonValue>> {
    let limit = limit.max(1);
    info!(
        "Grabbing all pages from {} (numbered offset, limit {limit})",
        remote.name()
    );

    let mut offset = 0;
    let mut records: Vec<JsonValue> = Vec::new();
    let mut guard: Option<PageGuard> = None;

    loop {
        if let Some(guard) = guard.as_mut() {
            guard.record_page()?;
        }
        debug!(
            "Requesting items {} up to {}",
            offset + 1,
            offset + u64::from(limit)
        );
        let envelope = remote
            .invoke(CallParams::numbered_body(body, offset, limit))
            .await?;
        let (page, pagination) = envelope.into_page()?;
        info!("Retrieved a batch of {} items", page.len());
        records.extend(page);

        if records.is_empty() {
            info!("No resources received from {}", remote.name());
            return Ok(records);
        }

        let pagination = pagination.ok_or_else(|| Error::malformed("body.meta.pagination"))?;
        let total = pagination.total()?;
        if guard.is_none() {
            let mut first = PageGuard::observed(total, records.len(), limit, page_cap_factor);
            first.record_page()?;
            guard = Some(first);
        }

        if total <= records.len() as u64 {
            return Ok(records);
        }
        offset = pagination.next_index()?;
    }
}

pub(crate) async fn collect_parallel(
    remote: &SharedRemoteCall,
    limit: u32,
    sizing: &PoolSizing,
) -> Result<Vec<JsonValue>> {
    let limit = limit.max(1);
    info!(
        "Grabbing all pages from {} (parallel numbered offset, limit {limit})",
        remote.name()
    );

    let envelope = remote.invoke(CallParams::page(0, limit)).await?;
    let (mut records, pagination) = envelope.into_page()?;
    info!("Retrieved a first batch of {} items", records.len());

    if records.is_empty() {
        info!("No resources received from {}", remote.name());
        return Ok(records);
    }

    let total = pagination
        .ok_or_else(|| Error::malformed("body.meta.pagination"))?
        .total()?;
    info!("Total number of resources: {total}");
    if total <= records.len() as u64 {
        return Ok(records);
    }

    let offsets: Vec<u64> = (u64::from(limit)..total)
        .step_by(limit as usize)
        .collect();
    let pool = WorkerPool::sized(sizing);
    info!(
        "Divided the remaining items into {} page(s) of {limit}",
        offsets.len()
    );

    let remote = Arc::clone(remote);
    let pages = pool
        .run_ordered(offsets, move |_, offset| {
            let remote = Arc::clone(&remote);
            async move {
                debug!("Page worker started at offset {offset}");
                let page = remote
                    .invoke(CallParams::page(offset, limit))
                    .await?
                    .into_resources()?;
                debug!("Page at offset {offset} returned {} items", page.len());
                Ok(page)
            }
        })
        .await?;

    records.extend(pages.into_iter().flatten());
    Ok(records)
}
