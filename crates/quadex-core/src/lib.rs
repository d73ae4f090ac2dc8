//! # quadex-core
//!
//! A quad store adapter over a paginated remote document search index.
//!
//! A graph query engine sees four primitives (enumerate nodes, enumerate
//! quads, look up quads by direction, resolve an id) plus a cursor contract.
//! This crate provides them on top of any [`IndexClient`].
//!
//! ## Layers (leaves first)
//!
//! - `address`: content addresses for quads and node names
//! - `document`: quad and node wire documents
//! - `index`: the remote index surface, an HTTP client and an in-memory index
//! - `cursor`: the resumable enumerator with offset, scroll and fixed paging
//! - `store`: the facade composing the above
//!
//! ## Architectural Constraints
//!
//! - Document keys are digests of document content; writes are idempotent
//! - Results are pulled page by page, never materialized whole
//! - Configuration and the index client are injected, never global
//! - Remote failures surface as [`QuadexError`] values, never as panics

// =============================================================================
// MODULES
// =============================================================================

pub mod address;
pub mod config;
pub mod cursor;
pub mod document;
pub mod index;
pub mod primitives;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{Action, Delta, Direction, Identifier, Quad, QuadexError, Value};

// =============================================================================
// RE-EXPORTS: Adapter
// =============================================================================

pub use address::{digest, node_id, quad_id};
pub use config::StoreConfig;
pub use cursor::{
    Cursor, CursorState, CursorStats, Description, FixedPager, OffsetPager, PageSource, Pager,
    ResultKind, ScrollPager, Tagger,
};
pub use document::{Document, Hit, NodeDocument, QuadDocument};
pub use index::{HttpIndexClient, IndexClient, MemoryIndex, Query, SearchRequest};
pub use store::{QuadStore, StoreCursor, WriteSummary};
