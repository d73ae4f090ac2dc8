//! # Quad Store
//!
//! The facade a graph query engine talks to. Composes content addressing,
//! document mapping and cursors over an injected [`IndexClient`].
//!
//! ## Primitives
//!
//! | Operation | Index traffic | Paging |
//! |---|---|---|
//! | `all_nodes` | match-all on the node collection | scroll |
//! | `all_quads` | match-all on the quad collection | scroll |
//! | `quads_by_direction` | term query on one of `s`/`p`/`o`/`c` | offset, or scroll past `max_result_window` |
//! | `fixed_cursor` | none | in memory |
//! | `resolve_quad` | get by id | - |
//! | `apply_writes` | put / delete by id | - |
//!
//! ## Write semantics
//!
//! - Every document key is a content address, so replaying a delta overwrites
//!   the same document.
//! - A batch is validated before anything is written. Once writing starts
//!   there is no atomicity: a failure leaves earlier documents committed.
//! - Node documents are a best-effort secondary index. They are written for
//!   subject, predicate, object and any non-empty label, and are never
//!   deleted by a removal.

use crate::address;
use crate::config::StoreConfig;
use crate::cursor::{Cursor, FixedPager, OffsetPager, Pager, ResultKind, ScrollPager};
use crate::document;
use crate::index::{IndexClient, Query, node_schema, quad_schema};
use crate::types::{Action, Delta, Direction, Quad, QuadexError, Value};
use serde::Serialize;
use std::collections::BTreeSet;

/// Cursor type handed out by a [`QuadStore`].
pub type StoreCursor<C> = Cursor<Pager<C>>;

/// Counts from one `apply_writes` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Quad documents put (new or overwritten).
    pub quads_written: usize,
    /// Quad documents that existed and were deleted.
    pub quads_removed: usize,
    /// Node documents put.
    pub nodes_written: usize,
}

/// A quad store backed by a remote document index.
#[derive(Debug, Clone)]
pub struct QuadStore<C: IndexClient> {
    client: C,
    config: StoreConfig,
}

impl<C: IndexClient> QuadStore<C> {
    /// Create a store over `client`. Fails if `config` is invalid.
    pub fn new(client: C, config: StoreConfig) -> Result<Self, QuadexError> {
        config.validate()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create the quad and node collections. Existing collections are kept.
    pub async fn init(&self) -> Result<(), QuadexError> {
        self.client
            .create_collection(&self.config.quad_collection, &quad_schema())
            .await?;
        self.client
            .create_collection(&self.config.node_collection, &node_schema())
            .await?;
        tracing::info!(
            quads = %self.config.quad_collection,
            nodes = %self.config.node_collection,
            "collections ready"
        );
        Ok(())
    }

    /// Number of quads stored.
    pub async fn size(&self) -> Result<u64, QuadexError> {
        self.client
            .count(&self.config.quad_collection, &Query::MatchAll)
            .await
    }

    /// Number of node documents stored.
    pub async fn node_count(&self) -> Result<u64, QuadexError> {
        self.client
            .count(&self.config.node_collection, &Query::MatchAll)
            .await
    }

    /// Apply `deltas` in order.
    ///
    /// Rejects the whole batch with `InvalidQuad` before writing anything if
    /// any quad lacks a subject, predicate or object.
    pub async fn apply_writes(&self, deltas: &[Delta]) -> Result<WriteSummary, QuadexError> {
        for delta in deltas {
            delta.quad.validate()?;
        }

        let mut summary = WriteSummary::default();
        let mut nodes_seen: BTreeSet<&str> = BTreeSet::new();

        for delta in deltas {
            let id = address::quad_id(&delta.quad);
            match delta.action {
                Action::Add => {
                    self.client
                        .put(
                            &self.config.quad_collection,
                            id.as_str(),
                            &document::encode(&delta.quad),
                        )
                        .await?;
                    summary.quads_written += 1;

                    for direction in Direction::ALL {
                        let name = delta.quad.get(direction);
                        if name.is_empty() || !nodes_seen.insert(name) {
                            continue;
                        }
                        self.client
                            .put(
                                &self.config.node_collection,
                                address::node_id(name).as_str(),
                                &document::encode_node(name),
                            )
                            .await?;
                        summary.nodes_written += 1;
                    }
                }
                Action::Remove => {
                    if self
                        .client
                        .delete(&self.config.quad_collection, id.as_str())
                        .await?
                    {
                        summary.quads_removed += 1;
                    }
                }
            }
        }

        tracing::debug!(
            deltas = deltas.len(),
            quads_written = summary.quads_written,
            quads_removed = summary.quads_removed,
            nodes_written = summary.nodes_written,
            "writes applied"
        );
        Ok(summary)
    }

    /// Fetch and decode the quad stored under `id`.
    pub async fn resolve_quad(&self, id: &Value) -> Result<Quad, QuadexError> {
        let doc = self
            .client
            .get(&self.config.quad_collection, id.as_str())
            .await?;
        document::decode(id.as_str(), &doc)
    }

    /// The `direction` field of the quad stored under `id`.
    pub async fn quad_direction(
        &self,
        id: &Value,
        direction: Direction,
    ) -> Result<Value, QuadexError> {
        let quad = self.resolve_quad(id).await?;
        Ok(self.value_of(quad.get(direction)))
    }

    /// Quads whose `direction` field equals `value`. Results are quad ids.
    ///
    /// Pages by offset when the matches fit in `max_result_window`, and
    /// through a scroll session otherwise.
    pub async fn quads_by_direction(
        &self,
        direction: Direction,
        value: &Value,
    ) -> Result<StoreCursor<C>, QuadexError> {
        let query = Query::term(direction.field(), self.name_of(value));
        let window = self.config.max_result_window;
        let (pager, size) = OffsetPager::open(
            self.client.clone(),
            self.config.quad_collection.clone(),
            query.clone(),
            self.config.batch_size,
        )
        .await?;
        if size <= window {
            let pager = pager.with_window(window);
            return Ok(Cursor::new(ResultKind::Quads, Pager::Offset(pager), size));
        }

        tracing::debug!(%direction, size, window, "look-up exceeds the result window, scrolling");
        self.scroll(ResultKind::Quads, &self.config.quad_collection, query)
            .await
    }

    /// Every node name in the node index.
    pub async fn all_nodes(&self) -> Result<StoreCursor<C>, QuadexError> {
        self.scroll(ResultKind::Nodes, &self.config.node_collection, Query::MatchAll)
            .await
    }

    /// Every stored quad. Results are quad ids.
    pub async fn all_quads(&self) -> Result<StoreCursor<C>, QuadexError> {
        self.scroll(ResultKind::Quads, &self.config.quad_collection, Query::MatchAll)
            .await
    }

    /// A cursor over `values` held in memory, returned as given.
    ///
    /// Makes no index requests. Grow it with [`Cursor::add`].
    pub fn fixed_cursor(&self, values: impl IntoIterator<Item = Value>) -> StoreCursor<C> {
        let values: Vec<Value> = values.into_iter().collect();
        let size = values.len() as u64;
        let pager = FixedPager::new(values, self.config.batch_size);
        Cursor::new(ResultKind::Values, Pager::Fixed(pager), size)
    }

    async fn scroll(
        &self,
        kind: ResultKind,
        collection: &str,
        query: Query,
    ) -> Result<StoreCursor<C>, QuadexError> {
        let (pager, size) = ScrollPager::open(
            self.client.clone(),
            collection,
            query,
            self.config.batch_size,
            self.config.scroll_ttl(),
            self.config.handoff_capacity,
        )
        .await?;
        Ok(Cursor::new(kind, Pager::Scroll(pager), size))
    }

    /// Handle for a node name. Handles are the names themselves.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Value {
        Value::new(name)
    }

    /// Name behind a handle.
    #[must_use]
    pub fn name_of(&self, value: &Value) -> String {
        value.as_str().to_string()
    }

    /// Release the store. Cursors own their sessions and close themselves;
    /// the pooled client needs no teardown.
    pub fn close(&self) {
        tracing::debug!(endpoint = %self.config.endpoint, "store closed");
    }
}

// =============================================================================
// TESTS
// =============================================================================
