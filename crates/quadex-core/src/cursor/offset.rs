//! Offset paging: each page is a fresh search with a growing `from`.
//!
//! The index serves offset pages only while `from + size` stays within its
//! result window, so pages are shortened to end exactly at the window and
//! nothing past it is requested.

use super::PageSource;
use crate::document::Hit;
use crate::index::{IndexClient, Query, SearchRequest};
use crate::primitives::DEFAULT_MAX_RESULT_WINDOW;
use crate::types::QuadexError;

/// Pages a query by re-issuing it at increasing offsets.
///
/// Used for direction look-ups whose result set fits in the window.
#[derive(Debug, Clone)]
pub struct OffsetPager<C> {
    client: C,
    collection: String,
    query: Query,
    batch_size: usize,
    window: u64,
    offset: u64,
}

impl<C: IndexClient> OffsetPager<C> {
    #[must_use]
    pub fn new(client: C, collection: impl Into<String>, query: Query, batch_size: usize) -> Self {
        Self {
            client,
            collection: collection.into(),
            query,
            batch_size,
            window: DEFAULT_MAX_RESULT_WINDOW,
            offset: 0,
        }
    }

    /// Limit requests to `from + size <= window`.
    #[must_use]
    pub fn with_window(mut self, window: u64) -> Self {
        self.window = window;
        self
    }

    /// Build a pager and count its matches in one step.
    pub async fn open(
        client: C,
        collection: impl Into<String>,
        query: Query,
        batch_size: usize,
    ) -> Result<(Self, u64), QuadexError> {
        let pager = Self::new(client, collection, query, batch_size);
        let total = pager.client.count(&pager.collection, &pager.query).await?;
        Ok((pager, total))
    }
}

impl<C: IndexClient> PageSource for OffsetPager<C> {
    async fn next_page(&mut self) -> Result<Vec<Hit>, QuadexError> {
        let remaining = self.window.saturating_sub(self.offset);
        if remaining == 0 {
            tracing::warn!(
                collection = %self.collection,
                window = self.window,
                "offset paging reached the result window"
            );
            return Ok(Vec::new());
        }
        let size = self
            .batch_size
            .min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let request = SearchRequest::page(self.query.clone(), self.offset, size);
        let response = self.client.search(&self.collection, &request).await?;
        self.offset = self.offset.saturating_add(response.hits.len() as u64);
        Ok(response.hits)
    }

    fn rewind(&mut self) {
        self.offset = 0;
    }

    fn fresh(&self) -> Self {
        Self {
            offset: 0,
            ..self.clone()
        }
    }

    fn close(&mut self) {}

    fn describe(&self) -> String {
        format!("{} {}", self.collection, self.query)
    }
}
