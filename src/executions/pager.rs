use super::ExecutionQuery;
use crate::client::{ExecutionRecord, Result, RundeckApi, MAX_PAGE_SIZE};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Default cap on records merged by [`list_all`].
pub const DEFAULT_MAX_TOTAL: u64 = 5000;

/// Status lookups in flight at once for [`bulk_status`].
const BULK_CONCURRENCY: usize = 4;

/// Merge execution pages in offset order until the server runs dry or
/// `max_total` records have been collected.
///
/// Each request asks for at most `min(1000, remaining)` records and the
/// offset advances by what the server actually returned, so pages never
/// overlap.
pub async fn list_all<A>(
    api: &A,
    project: &str,
    query: &ExecutionQuery,
    max_total: u64,
) -> Result<Vec<ExecutionRecord>>
where
    A: RundeckApi + ?Sized,
{
    let mut records: Vec<ExecutionRecord> = Vec::new();
    let mut offset = 0u64;
    let mut collected = 0u64;

    while collected < max_total {
        let page_size = MAX_PAGE_SIZE.min(max_total - collected);
        let page = api.list_executions(project, query, offset, page_size).await?;
        debug!(%project, offset, page_size, received = page.received, "Fetched executions page");

        if page.received == 0 {
            break;
        }

        // A misbehaving server may over-deliver; never exceed the budget.
        let room = (max_total - collected) as usize;
        if page.records.len() > room {
            warn!(%project, received = page.records.len(), room, "Page larger than requested, truncating");
        }
        records.extend(page.records.into_iter().take(room));
        collected += page.received.min(max_total - collected);

        if !page.has_more {
            break;
        }
        offset += page.received;
    }

    info!(%project, count = records.len(), max_total, "Collected executions");
    Ok(records)
}

/// Status for each id, in input order. A failed lookup becomes
/// `{"id": .., "error": ..}` in its slot.
pub async fn bulk_status<A>(api: &A, execution_ids: &[String]) -> Vec<Value>
where
    A: RundeckApi + ?Sized,
{
    // Built up front so the stream holds plain futures, not a closure.
    let lookups: Vec<_> = execution_ids
        .iter()
        .map(|id| status_or_error(api, id))
        .collect();

    stream::iter(lookups)
        .buffered(BULK_CONCURRENCY)
        .collect()
        .await
}

async fn status_or_error<A>(api: &A, id: &str) -> Value
where
    A: RundeckApi + ?Sized,
{
    match api.execution_status(id).await {
        Ok(status) => status,
        Err(e) => {
            warn!(execution = %id, "Status lookup failed: {}", e);
            json!({ "id": id, "error": e.to_string() })
        }
    }
}
