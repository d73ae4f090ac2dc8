//! # In-Memory Index
//!
//! An `IndexClient` held entirely in process memory.
//!
//! - Documents are kept per collection in `BTreeMap`s, so every query
//!   returns hits in id order.
//! - Scroll sessions snapshot their matches when opened; later writes are
//!   not visible to an open session.
//! - Missing collections behave as empty ones.
//! - `set_unavailable` makes every operation fail with `Transport`, and
//!   `expire_scrolls` drops all open sessions, for exercising error paths.
//! - `set_max_result_window` rejects offset searches whose `from + size`
//!   exceeds the window, as a real index does.

use super::{IndexClient, Query, ScrollPage, SearchRequest, SearchResponse};
use crate::document::{Document, Hit};
use crate::types::QuadexError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug)]
struct ScrollSession {
    hits: Vec<Hit>,
    offset: usize,
    size: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<String, BTreeMap<String, Document>>,
    scrolls: BTreeMap<String, ScrollSession>,
    next_scroll: u64,
    max_result_window: Option<u64>,
    unavailable: bool,
    requests: u64,
}

impl MemoryState {
    /// Count a request and fail if the index is switched off.
    fn begin(&mut self) -> Result<(), QuadexError> {
        self.requests = self.requests.saturating_add(1);
        if self.unavailable {
            return Err(QuadexError::Transport("index unavailable".to_string()));
        }
        Ok(())
    }

    fn matching(&self, collection: &str, query: &Query) -> Vec<Hit> {
        self.collections
            .get(collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .filter(|(_, doc)| query.matches(doc))
            .map(|(id, doc)| Hit::new(id.clone(), doc.clone()))
            .collect()
    }
}

/// In-process index. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Reject offset searches reaching past `window` (`None` for no limit).
    pub async fn set_max_result_window(&self, window: Option<u64>) {
        self.state.write().await.max_result_window = window;
    }

    /// Drop every open scroll session, as a server would on keep-alive expiry.
    pub async fn expire_scrolls(&self) {
        self.state.write().await.scrolls.clear();
    }

    /// Number of scroll sessions not yet released.
    pub async fn open_scrolls(&self) -> usize {
        self.state.read().await.scrolls.len()
    }

    /// Number of documents stored in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.state
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Whether `collection` holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    /// Number of requests served so far, including failed ones.
    pub async fn request_count(&self) -> u64 {
        self.state.read().await.requests
    }
}

impl IndexClient for MemoryIndex {
    async fn count(&self, collection: &str, query: &Query) -> Result<u64, QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        Ok(state.matching(collection, query).len() as u64)
    }

    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        let all = state.matching(collection, &request.query);
        let total = all.len() as u64;

        match &request.scroll {
            None => {
                if let Some(window) = state.max_result_window {
                    let end = request.from.saturating_add(request.size as u64);
                    if end > window {
                        return Err(QuadexError::Transport(format!(
                            "result window is too large, from + size must be <= {window} but was {end}"
                        )));
                    }
                }
                let hits = all
                    .into_iter()
                    .skip(request.from as usize)
                    .take(request.size)
                    .collect();
                Ok(SearchResponse {
                    hits,
                    total,
                    scroll_id: None,
                })
            }
            Some(_) => {
                let first: Vec<Hit> = all.iter().take(request.size).cloned().collect();
                let scroll_id = format!("scroll-{}", state.next_scroll);
                state.next_scroll = state.next_scroll.saturating_add(1);
                state.scrolls.insert(
                    scroll_id.clone(),
                    ScrollSession {
                        offset: first.len(),
                        hits: all,
                        size: request.size,
                    },
                );
                Ok(SearchResponse {
                    hits: first,
                    total,
                    scroll_id: Some(scroll_id),
                })
            }
        }
    }

    async fn scroll_next(&self, scroll_id: &str, _ttl: &str) -> Result<ScrollPage, QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        let session = state
            .scrolls
            .get_mut(scroll_id)
            .ok_or_else(|| QuadexError::CursorExpired(scroll_id.to_string()))?;
        let end = session.offset.saturating_add(session.size).min(session.hits.len());
        let hits = session.hits[session.offset..end].to_vec();
        session.offset = end;
        Ok(ScrollPage {
            hits,
            scroll_id: Some(scroll_id.to_string()),
        })
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        state.scrolls.remove(scroll_id);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| QuadexError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn put(&self, collection: &str, id: &str, doc: &Document) -> Result<(), QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        Ok(state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }

    async fn create_collection(&self, name: &str, _schema: &Document) -> Result<(), QuadexError> {
        let mut state = self.state.write().await;
        state.begin()?;
        state.collections.entry(name.to_string()).or_default();
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded(n: usize) -> MemoryIndex {
        let index = MemoryIndex::new();
        for i in 0..n {
            index
                .put("docs", &format!("{i:03}"), &json!({ "name": format!("n{i}") }))
                .await
                .expect("put");
        }
        index
    }

    #[tokio::test]
    async fn offset_search_pages_in_id_order() {
        let index = seeded(5).await;
        let resp = index
            .search("docs", &SearchRequest::page(Query::MatchAll, 3, 10))
            .await
            .expect("search");
        assert_eq!(resp.total, 5);
        let ids: Vec<_> = resp.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["003", "004"]);
        assert!(resp.scroll_id.is_none());
    }

    #[tokio::test]
    async fn offset_search_past_window_is_rejected() {
        let index = seeded(5).await;
        index.set_max_result_window(Some(4)).await;
        assert!(
            index
                .search("docs", &SearchRequest::page(Query::MatchAll, 2, 2))
                .await
                .is_ok()
        );
        assert!(matches!(
            index
                .search("docs", &SearchRequest::page(Query::MatchAll, 3, 2))
                .await,
            Err(QuadexError::Transport(_))
        ));
        assert!(
            index
                .search("docs", &SearchRequest::scroll(Query::MatchAll, 5, "30s"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn scroll_session_pages_until_empty() {
        let index = seeded(5).await;
        let first = index
            .search("docs", &SearchRequest::scroll(Query::MatchAll, 2, "30s"))
            .await
            .expect("search");
        assert_eq!(first.hits.len(), 2);
        let id = first.scroll_id.expect("scroll id");

        let second = index.scroll_next(&id, "30s").await.expect("page");
        let third = index.scroll_next(&id, "30s").await.expect("page");
        let fourth = index.scroll_next(&id, "30s").await.expect("page");
        assert_eq!(second.hits.len(), 2);
        assert_eq!(third.hits.len(), 1);
        assert!(fourth.hits.is_empty());

        index.clear_scroll(&id).await.expect("clear");
        assert_eq!(index.open_scrolls().await, 0);
    }

    #[tokio::test]
    async fn expired_scroll_reports_cursor_expired() {
        let index = seeded(3).await;
        let first = index
            .search("docs", &SearchRequest::scroll(Query::MatchAll, 1, "30s"))
            .await
            .expect("search");
        index.expire_scrolls().await;
        let id = first.scroll_id.expect("scroll id");
        assert!(matches!(
            index.scroll_next(&id, "30s").await,
            Err(QuadexError::CursorExpired(_))
        ));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let index = MemoryIndex::new();
        assert!(matches!(
            index.get("docs", "nope").await,
            Err(QuadexError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unavailable_index_fails_every_call() {
        let index = seeded(1).await;
        index.set_unavailable(true).await;
        assert!(matches!(
            index.count("docs", &Query::MatchAll).await,
            Err(QuadexError::Transport(_))
        ));
        assert!(index.put("docs", "x", &json!({})).await.is_err());

        index.set_unavailable(false).await;
        assert_eq!(index.count("docs", &Query::MatchAll).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let index = seeded(1).await;
        assert!(index.delete("docs", "000").await.expect("delete"));
        assert!(!index.delete("docs", "000").await.expect("delete"));
        assert!(index.is_empty("docs").await);
    }
}
