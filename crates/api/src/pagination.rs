use crate::error::Result;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, warn};

/// Envelope for list endpoints that nest results under `values`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(rename = "startAt")]
    pub start_at: Option<u32>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<u32>,
    pub total: Option<u32>,
    #[serde(rename = "isLast")]
    pub is_last: Option<bool>,
}

impl<T> PagedResponse<T> {
    /// `isLast` wins when present; otherwise the offsets are compared to `total`.
    pub fn has_next(&self) -> bool {
        if let Some(is_last) = self.is_last {
            return !is_last;
        }

        match (self.start_at, self.max_results, self.total) {
            (Some(start), Some(max), Some(total)) => start.saturating_add(max) < total,
            _ => false,
        }
    }

    pub fn next_start(&self) -> Option<u32> {
        if !self.has_next() {
            return None;
        }

        match (self.start_at, self.max_results) {
            (Some(start), Some(max)) => Some(start.saturating_add(max)),
            _ => None,
        }
    }

    /// Offset for the request after this page, or `None` when the walk is over.
    /// Servers that omit `startAt`/`maxResults` are stepped by the number of
    /// values actually returned; an empty page always ends the walk.
    fn advance(&self, requested_start: u32) -> Option<u32> {
        if self.values.is_empty() || !self.has_next() {
            return None;
        }
        let returned = u32::try_from(self.values.len()).unwrap_or(u32::MAX);
        let next = self
            .next_start()
            .unwrap_or_else(|| requested_start.saturating_add(returned));
        // Offsets only move forward.
        (next > requested_start).then_some(next)
    }
}

/// Logs when a single fixed-ceiling request came back with fewer items than `total`.
pub(crate) fn warn_if_truncated(resource: &str, returned: usize, total: Option<u32>) {
    if let Some(total) = total {
        if returned < total as usize {
            warn!(resource, returned, total, "Result truncated at maxResults ceiling");
        }
    }
}

/// A listing that can be fetched one `startAt`/`maxResults` window at a time.
#[async_trait]
pub trait Paginator<T>: Sync {
    async fn fetch_page(&self, start_at: u32, max_results: u32) -> Result<PagedResponse<T>>;

    /// Every item of the listing, in server order.
    async fn fetch_all(&self, max_results: u32) -> Result<Vec<T>>
    where
        T: Send,
    {
        collect_pages(self, max_results, None).await
    }

    /// One item batch per page; the stream ends after the last page or the first error.
    fn stream<'a>(
        &'a self,
        max_results: u32,
    ) -> Pin<Box<dyn Stream<Item = Result<Vec<T>>> + Send + 'a>>
    where
        T: Send + 'a,
    {
        Box::pin(async_stream::stream! {
            let mut next = Some(0);

            while let Some(start_at) = next {
                debug!(start_at, max_results, "Fetching page");
                match self.fetch_page(start_at, max_results).await {
                    Ok(page) => {
                        next = page.advance(start_at);
                        yield Ok(page.values);
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}

/// Drains a paginator's stream, stopping early once `limit` items are held.
pub async fn collect_pages<T, P>(paginator: &P, max_results: u32, limit: Option<usize>) -> Result<Vec<T>>
where
    T: Send,
    P: Paginator<T> + ?Sized,
{
    let mut stream = paginator.stream(max_results);
    let mut items = Vec::new();

    while let Some(batch) = stream.next().await {
        items.extend(batch?);

        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                break;
            }
        }
    }

    debug!(total_items = items.len(), "Finished pagination");
    Ok(items)
}
