//! # Store Configuration
//!
//! Explicit configuration injected into `QuadStore` and `HttpIndexClient`.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults (see [`crate::primitives`])
//! 2. A TOML file (`StoreConfig::load`)
//! 3. `QUADEX_ENDPOINT` environment variable (`StoreConfig::with_env_overrides`)
//!
//! ```toml
//! endpoint = "http://search.internal:9200"
//! quad_collection = "quads"
//! node_collection = "nodes"
//! batch_size = 500
//! scroll_ttl_secs = 60
//! max_result_window = 10000
//! ```

use crate::primitives::{
    DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT, DEFAULT_HANDOFF_CAPACITY, DEFAULT_MAX_RESULT_WINDOW,
    DEFAULT_NODE_COLLECTION, DEFAULT_QUAD_COLLECTION, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SCROLL_TTL_SECS, ENDPOINT_ENV, MAX_BATCH_SIZE,
};
use crate::types::QuadexError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration of a quad store and its index connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Base URL of the remote index.
    pub endpoint: String,
    /// Collection holding quad documents.
    pub quad_collection: String,
    /// Collection holding node documents.
    pub node_collection: String,
    /// Documents requested per page.
    pub batch_size: usize,
    /// Server-side lifetime of a scroll session.
    pub scroll_ttl_secs: u64,
    /// Pages a scroll producer may buffer ahead of its consumer.
    pub handoff_capacity: usize,
    /// Timeout for a single request.
    pub request_timeout_secs: u64,
    /// Largest `from + size` the index serves for offset paging. Look-ups
    /// matching more documents are scrolled.
    pub max_result_window: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            quad_collection: DEFAULT_QUAD_COLLECTION.to_string(),
            node_collection: DEFAULT_NODE_COLLECTION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            scroll_ttl_secs: DEFAULT_SCROLL_TTL_SECS,
            handoff_capacity: DEFAULT_HANDOFF_CAPACITY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_result_window: DEFAULT_MAX_RESULT_WINDOW,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, QuadexError> {
        let config: Self = toml::from_str(s).map_err(|e| QuadexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuadexError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            QuadexError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `QUADEX_ENDPOINT` if it is set and non-empty.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim().to_string();
            }
        }
        self
    }

    /// Check the invariants every store relies on.
    pub fn validate(&self) -> Result<(), QuadexError> {
        if self.endpoint.trim().is_empty() {
            return Err(QuadexError::Config("endpoint must not be empty".into()));
        }
        if self.quad_collection.is_empty() || self.node_collection.is_empty() {
            return Err(QuadexError::Config("collection names must not be empty".into()));
        }
        if self.quad_collection == self.node_collection {
            return Err(QuadexError::Config(
                "quad and node collections must differ".into(),
            ));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(QuadexError::Config(format!(
                "batch_size must be in 1..={MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.batch_size as u64 > self.max_result_window {
            return Err(QuadexError::Config(format!(
                "batch_size {} exceeds max_result_window {}",
                self.batch_size, self.max_result_window
            )));
        }
        if self.handoff_capacity == 0 {
            return Err(QuadexError::Config("handoff_capacity must be positive".into()));
        }
        if self.scroll_ttl_secs == 0 {
            return Err(QuadexError::Config("scroll_ttl_secs must be positive".into()));
        }
        Ok(())
    }

    /// Scroll keep-alive in the index's duration syntax, e.g. `"30s"`.
    #[must_use]
    pub fn scroll_ttl(&self) -> String {
        format!("{}s", self.scroll_ttl_secs)
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// TESTS
// =============================================================================
