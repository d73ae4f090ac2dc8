//! # Remote Index Client Surface
//!
//! The boundary the adapter consumes. A backing index supports term and
//! match-all queries, counts, document get/put/delete by id, and scroll
//! sessions for paging through large result sets.
//!
//! ## Implementations
//!
//! - [`HttpIndexClient`]: Elasticsearch-compatible REST API over `reqwest`
//! - [`MemoryIndex`]: in-process index with the same observable semantics
//!
//! Clones of a client share one connection pool (or one in-memory state), so
//! any number of cursors may hold a clone concurrently.

mod http;
mod memory;

pub use http::HttpIndexClient;
pub use memory::MemoryIndex;

use crate::document::{Document, Hit};
use crate::types::QuadexError;
use serde_json::json;
use std::future::Future;

// =============================================================================
// QUERIES
// =============================================================================

/// Query sent to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every document in the collection.
    MatchAll,
    /// Documents whose `field` equals `value` exactly.
    Term { field: String, value: String },
}

impl Query {
    /// Term query helper.
    #[must_use]
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Query DSL body fragment.
    #[must_use]
    pub fn to_json(&self) -> Document {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::Term { field, value } => {
                let mut term = serde_json::Map::new();
                term.insert(field.clone(), json!(value));
                json!({ "term": term })
            }
        }
    }

    /// Whether `doc` satisfies this query.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Term { field, value } => {
                doc.get(field).and_then(|v| v.as_str()) == Some(value.as_str())
            }
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchAll => write!(f, "match_all"),
            Self::Term { field, value } => write!(f, "{field}={value}"),
        }
    }
}

/// A page request against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: Query,
    /// Number of matching documents to skip (offset paging).
    pub from: u64,
    /// Maximum documents in the returned page.
    pub size: usize,
    /// Open a scroll session with this keep-alive (e.g. `"30s"`).
    pub scroll: Option<String>,
}

impl SearchRequest {
    /// One offset page.
    #[must_use]
    pub fn page(query: Query, from: u64, size: usize) -> Self {
        Self {
            query,
            from,
            size,
            scroll: None,
        }
    }

    /// The first page of a scroll session.
    #[must_use]
    pub fn scroll(query: Query, size: usize, ttl: impl Into<String>) -> Self {
        Self {
            query,
            from: 0,
            size,
            scroll: Some(ttl.into()),
        }
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub hits: Vec<Hit>,
    /// Total matches at query time.
    pub total: u64,
    /// Scroll session, if one was requested.
    pub scroll_id: Option<String>,
}

/// One continuation page of a scroll session. Empty hits end the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrollPage {
    pub hits: Vec<Hit>,
    /// Session id to use for the next continuation, if it changed.
    pub scroll_id: Option<String>,
}

// =============================================================================
// CLIENT TRAIT
// =============================================================================

/// Operations the adapter needs from a remote document index.
///
/// Errors:
/// - `Transport` for unreachable / non-2xx / unparseable
/// - `NotFound` from `get` on an absent id
/// - `CursorExpired` from `scroll_next` on a lapsed session
pub trait IndexClient: Clone + Send + Sync + 'static {
    /// Number of documents in `collection` matching `query`.
    fn count(
        &self,
        collection: &str,
        query: &Query,
    ) -> impl Future<Output = Result<u64, QuadexError>> + Send;

    /// Run a search, optionally opening a scroll session.
    fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, QuadexError>> + Send;

    /// Fetch the next page of a scroll session, renewing its keep-alive.
    fn scroll_next(
        &self,
        scroll_id: &str,
        ttl: &str,
    ) -> impl Future<Output = Result<ScrollPage, QuadexError>> + Send;

    /// Release a scroll session early.
    fn clear_scroll(&self, scroll_id: &str) -> impl Future<Output = Result<(), QuadexError>> + Send;

    /// Fetch a document by id.
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Document, QuadexError>> + Send;

    /// Create or overwrite a document.
    fn put(
        &self,
        collection: &str,
        id: &str,
        doc: &Document,
    ) -> impl Future<Output = Result<(), QuadexError>> + Send;

    /// Delete a document. Returns whether it existed.
    fn delete(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<bool, QuadexError>> + Send;

    /// Create a collection with the given settings and mappings.
    fn create_collection(
        &self,
        name: &str,
        schema: &Document,
    ) -> impl Future<Output = Result<(), QuadexError>> + Send;
}

// =============================================================================
// SCHEMAS
// =============================================================================

/// Collection schema for quad documents: exact-match string fields.
#[must_use]
pub fn quad_schema() -> Document {
    schema_with_fields(&["s", "p", "o", "c"])
}

/// Collection schema for node documents.
#[must_use]
pub fn node_schema() -> Document {
    schema_with_fields(&["name"])
}

fn schema_with_fields(fields: &[&str]) -> Document {
    let properties: serde_json::Map<String, Document> = fields
        .iter()
        .map(|f| ((*f).to_string(), json!({ "type": "keyword" })))
        .collect();
    json!({
        "settings": {
            "index.number_of_shards": 5,
            "index.number_of_replicas": 0,
        },
        "mappings": {
            "_source": { "enabled": true },
            "properties": properties,
        },
    })
}

// =============================================================================
// TESTS
// =============================================================================
