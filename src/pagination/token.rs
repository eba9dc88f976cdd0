//! Token-offset (scroll) pagination

use super::{PageGuard, DEFAULT_PAGE_CAP_FACTOR};
use crate::error::{Error, Result};
use crate::remote::{CallParams, SharedRemoteCall};
use crate::types::JsonValue;
use tracing::{debug, info, warn};

/// Fetch every page of a token-offset endpoint, one call at a time
///
/// The continuation token is read from `pagination.offset`, or from
/// `pagination.after` when `after_key` is set, and sent back untouched.
pub async fn paginate_token(
    remote: &SharedRemoteCall,
    limit: u32,
    after_key: bool,
) -> Result<Vec<JsonValue>> {
    collect_tokens(remote, limit, after_key, DEFAULT_PAGE_CAP_FACTOR).await
}

pub(crate) async fn collect_tokens(
    remote: &SharedRemoteCall,
    limit: u32,
    after_key: bool,
    page_cap_factor: usize,
) -> Result<Vec<JsonValue>> {
    let limit = limit.max(1);
    info!(
        "Grabbing all pages from {} (token offset, limit {limit})",
        remote.name()
    );

    let mut token: Option<String> = None;
    let mut records: Vec<JsonValue> = Vec::new();
    let mut guard: Option<PageGuard> = None;
    let mut page_number = 0usize;

    loop {
        if let Some(guard) = guard.as_mut() {
            guard.record_page()?;
        }
        page_number += 1;
        debug!(
            "Fetching page {page_number}: {} up to {}",
            records.len() + 1,
            u64::from(limit) * page_number as u64
        );

        let params = if after_key {
            CallParams::after(limit, token.take())
        } else {
            CallParams::token(limit, token.take())
        };
        let (page, pagination) = remote.invoke(params).await?.into_page()?;
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

        match pagination.next_token(after_key) {
            Some(next) => token = Some(next),
            None => {
                warn!(
                    "{} stopped handing out tokens after {} of {total} items",
                    remote.name(),
                    records.len()
                );
                return Ok(records);
            }
        }
    }
}
