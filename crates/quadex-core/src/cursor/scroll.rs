//! # Scroll Paging
//!
//! A background producer walks a scroll session and hands pages to the
//! cursor through a bounded channel.
//!
//! ```text
//! producer task                         cursor
//!   search(?scroll) ──▶ page 0 ──┐
//!   scroll_next     ──▶ page 1 ──┼──[ mpsc, capacity N ]──▶ next_page()
//!   scroll_next     ──▶  ...   ──┘
//!   clear_scroll on exit  ◀── shutdown (oneshot) ◀── close / rewind / drop
//! ```
//!
//! - The producer runs at most `capacity` pages ahead of the consumer.
//! - Every wait in the producer also watches the shutdown signal, so a
//!   closed or dropped cursor never leaves it blocked.
//! - The session is released with `clear_scroll` whenever the producer exits
//!   while it still holds a live session id.

use super::PageSource;
use crate::document::Hit;
use crate::index::{IndexClient, Query, SearchRequest, SearchResponse};
use crate::types::QuadexError;
use tokio::sync::{mpsc, oneshot};

type PageResult = Result<Vec<Hit>, QuadexError>;

/// Receiving end of a running producer. Dropping it stops the producer.
#[derive(Debug)]
struct ScrollStream {
    pages: mpsc::Receiver<PageResult>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for ScrollStream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Pages a query through a server-side scroll session.
#[derive(Debug)]
pub struct ScrollPager<C> {
    client: C,
    collection: String,
    query: Query,
    batch_size: usize,
    ttl: String,
    capacity: usize,
    stream: Option<ScrollStream>,
    closed: bool,
}

impl<C: IndexClient> ScrollPager<C> {
    /// Create an unstarted pager. The session opens on the first fetch.
    #[must_use]
    pub fn new(
        client: C,
        collection: impl Into<String>,
        query: Query,
        batch_size: usize,
        ttl: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            client,
            collection: collection.into(),
            query,
            batch_size,
            ttl: ttl.into(),
            capacity: capacity.max(1),
            stream: None,
            closed: false,
        }
    }

    /// Open the session now and return the pager with the query's total.
    ///
    /// Failures of the initial search surface here rather than on the first
    /// `advance`.
    pub async fn open(
        client: C,
        collection: impl Into<String>,
        query: Query,
        batch_size: usize,
        ttl: impl Into<String>,
        capacity: usize,
    ) -> Result<(Self, u64), QuadexError> {
        let mut pager = Self::new(client, collection, query, batch_size, ttl, capacity);
        let total = pager.start().await?;
        Ok((pager, total))
    }

    /// Run the initial search and spawn the producer. Returns the total.
    async fn start(&mut self) -> Result<u64, QuadexError> {
        let request = SearchRequest::scroll(self.query.clone(), self.batch_size, self.ttl.clone());
        let first = self.client.search(&self.collection, &request).await?;
        let total = first.total;

        let (tx, rx) = mpsc::channel(self.capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tracing::debug!(
            collection = %self.collection,
            query = %self.query,
            total,
            "scroll session opened"
        );
        tokio::spawn(produce(
            self.client.clone(),
            first,
            self.ttl.clone(),
            tx,
            shutdown_rx,
        ));

        self.stream = Some(ScrollStream {
            pages: rx,
            shutdown: Some(shutdown_tx),
        });
        Ok(total)
    }

    /// Whether a producer is currently attached.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }
}

impl<C: IndexClient> PageSource for ScrollPager<C> {
    async fn next_page(&mut self) -> Result<Vec<Hit>, QuadexError> {
        if self.closed {
            return Ok(Vec::new());
        }
        if self.stream.is_none() {
            self.start().await?;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(Vec::new());
        };

        match stream.pages.recv().await {
            Some(Ok(hits)) => Ok(hits),
            Some(Err(e)) => {
                self.stream = None;
                Err(e)
            }
            // Producer finished after sending its final page.
            None => Ok(Vec::new()),
        }
    }

    fn rewind(&mut self) {
        self.stream = None;
        self.closed = false;
    }

    fn fresh(&self) -> Self {
        Self::new(
            self.client.clone(),
            self.collection.clone(),
            self.query.clone(),
            self.batch_size,
            self.ttl.clone(),
            self.capacity,
        )
    }

    fn close(&mut self) {
        self.stream = None;
        self.closed = true;
    }

    fn describe(&self) -> String {
        format!("{} {} (scroll {})", self.collection, self.query, self.ttl)
    }
}

// =============================================================================
// PRODUCER
// =============================================================================

/// Forward scroll pages into `tx` until the session ends, the consumer goes
/// away, or shutdown is signalled. An empty page is forwarded as the end
/// marker.
async fn produce<C: IndexClient>(
    client: C,
    first: SearchResponse,
    ttl: String,
    tx: mpsc::Sender<PageResult>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut scroll_id = first.scroll_id;
    let mut page = first.hits;
    let mut pages_sent: u64 = 0;

    loop {
        let last = page.is_empty();
        tokio::select! {
            _ = &mut shutdown => break,
            sent = tx.send(Ok(page)) => {
                if sent.is_err() {
                    break;
                }
            }
        }
        pages_sent += 1;
        if last {
            break;
        }

        let Some(id) = scroll_id.clone() else {
            break;
        };
        let next = tokio::select! {
            _ = &mut shutdown => break,
            next = client.scroll_next(&id, &ttl) => next,
        };

        match next {
            Ok(next) => {
                if next.scroll_id.is_some() {
                    scroll_id = next.scroll_id;
                }
                page = next.hits;
            }
            Err(e) => {
                if matches!(e, QuadexError::CursorExpired(_)) {
                    scroll_id = None;
                }
                tokio::select! {
                    _ = &mut shutdown => {}
                    _ = tx.send(Err(e)) => {}
                }
                break;
            }
        }
    }

    if let Some(id) = scroll_id {
        match client.clear_scroll(&id).await {
            Ok(()) => tracing::debug!(pages_sent, "scroll session released"),
            Err(e) => tracing::warn!(error = %e, "failed to release scroll session"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
