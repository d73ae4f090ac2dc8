//! # Adapter Constants
//!
//! Defaults and fixed limits compiled into the adapter.

/// Default endpoint of the remote index.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9200";

/// Default collection holding quad documents.
pub const DEFAULT_QUAD_COLLECTION: &str = "quads";

/// Default collection holding node documents.
pub const DEFAULT_NODE_COLLECTION: &str = "nodes";

/// Default number of documents requested per page.
///
/// Larger pages mean fewer round-trips and more memory per cursor.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default server-side lifetime of a scroll session, renewed on every page.
pub const DEFAULT_SCROLL_TTL_SECS: u64 = 30;

/// Default number of pages a scroll producer may buffer ahead of the consumer.
pub const DEFAULT_HANDOFF_CAPACITY: usize = 4;

/// Default timeout for a single request to the remote index.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Largest page the index accepts in one request.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Default bound on `from + size` for offset paging, matching the index's
/// `index.max_result_window`. Larger look-ups are scrolled instead.
pub const DEFAULT_MAX_RESULT_WINDOW: u64 = 10_000;

/// Relative cost of pulling one result, reported to query planners.
pub const NEXT_COST: u64 = 5;

/// Environment variable overriding the configured endpoint.
pub const ENDPOINT_ENV: &str = "QUADEX_ENDPOINT";
