//! # HTTP Index Client
//!
//! `IndexClient` over an Elasticsearch-compatible REST API.
//!
//! | Operation | Request |
//! |---|---|
//! | count | `POST /{collection}/_count` |
//! | search | `POST /{collection}/_search[?scroll=ttl]` |
//! | scroll_next | `POST /_search/scroll` |
//! | clear_scroll | `DELETE /_search/scroll` |
//! | get / put / delete | `GET` / `PUT` / `DELETE /{collection}/_doc/{id}` |
//! | create_collection | `PUT /{collection}` |
//!
//! Collection names and document ids are percent-encoded as single path
//! segments, so an id can never reach a different document or endpoint.

use super::{IndexClient, Query, ScrollPage, SearchRequest, SearchResponse};
use crate::config::StoreConfig;
use crate::document::{Document, Hit};
use crate::types::QuadexError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

// =============================================================================
// WIRE SHAPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct CountBody {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
    hits: HitsBody,
}

#[derive(Debug, Deserialize)]
struct HitsBody {
    #[serde(default)]
    total: Option<TotalBody>,
    #[serde(default)]
    hits: Vec<HitBody>,
}

/// Older servers report a bare number, newer ones `{"value": n, "relation": ..}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalBody {
    Plain(u64),
    Tracked { value: u64 },
}

impl TotalBody {
    fn value(&self) -> u64 {
        match self {
            Self::Plain(n) | Self::Tracked { value: n } => *n,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HitBody {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Document,
}

#[derive(Debug, Deserialize)]
struct GetBody {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Document,
}

fn into_hits(hits: Vec<HitBody>) -> Vec<Hit> {
    hits.into_iter().map(|h| Hit::new(h.id, h.source)).collect()
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the remote index. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpIndexClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIndexClient {
    /// Build a client for the configured endpoint and request timeout.
    pub fn new(config: &StoreConfig) -> Result<Self, QuadexError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| QuadexError::Transport(e.to_string()))?;
        let client = Self::with_client(http, &config.endpoint);
        client.url(&[])?;
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The endpoint URL extended by `segments`, each percent-encoded as one
    /// path segment.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, QuadexError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            QuadexError::Config(format!("invalid endpoint '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                QuadexError::Config(format!("endpoint '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of one document, or `None` for ids no path segment can carry.
    fn doc_url(&self, collection: &str, id: &str) -> Result<Option<reqwest::Url>, QuadexError> {
        // `.` and `..` would be dropped from the path, not encoded.
        if matches!(id, "" | "." | "..") {
            return Ok(None);
        }
        self.url(&[collection, "_doc", id]).map(Some)
    }

    fn request(&self, method: reqwest::Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.http.request(method, url)
    }

    /// Send a request and map connection failures.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, QuadexError> {
        req.send()
            .await
            .map_err(|e| QuadexError::Transport(format!("{}: {e}", self.base_url)))
    }

    /// Reject non-2xx with the response body as context.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, QuadexError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(QuadexError::Transport(format!(
            "index returned {}: {}",
            status.as_u16(),
            body
        )))
    }

    /// Parse a JSON body.
    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, QuadexError> {
        resp.json::<T>()
            .await
            .map_err(|e| QuadexError::Transport(format!("unparseable response: {e}")))
    }
}

impl IndexClient for HttpIndexClient {
    async fn count(&self, collection: &str, query: &Query) -> Result<u64, QuadexError> {
        let body = json!({ "query": query.to_json() });
        let req = self
            .request(reqwest::Method::POST, self.url(&[collection, "_count"])?)
            .json(&body);
        let resp = Self::check_status(self.send(req).await?).await?;
        let count: CountBody = Self::parse(resp).await?;
        tracing::debug!(collection, count = count.count, "count");
        Ok(count.count)
    }

    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, QuadexError> {
        let mut body = json!({
            "query": request.query.to_json(),
            "size": request.size,
            "track_total_hits": true,
        });
        let mut url = self.url(&[collection, "_search"])?;
        match &request.scroll {
            Some(ttl) => {
                url.query_pairs_mut().append_pair("scroll", ttl);
            }
            None => body["from"] = json!(request.from),
        }

        let req = self.request(reqwest::Method::POST, url).json(&body);
        let resp = Self::check_status(self.send(req).await?).await?;
        let parsed: SearchBody = Self::parse(resp).await?;

        let hits = into_hits(parsed.hits.hits);
        let total = parsed
            .hits
            .total
            .map(|t| t.value())
            .unwrap_or(hits.len() as u64);
        tracing::debug!(collection, from = request.from, hits = hits.len(), total, "search");
        Ok(SearchResponse {
            hits,
            total,
            scroll_id: parsed.scroll_id,
        })
    }

    async fn scroll_next(&self, scroll_id: &str, ttl: &str) -> Result<ScrollPage, QuadexError> {
        let body = json!({ "scroll": ttl, "scroll_id": scroll_id });
        let req = self
            .request(reqwest::Method::POST, self.url(&["_search", "scroll"])?)
            .json(&body);
        let resp = self.send(req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(QuadexError::CursorExpired(scroll_id.to_string()));
        }
        let parsed: SearchBody = Self::parse(Self::check_status(resp).await?).await?;
        let hits = into_hits(parsed.hits.hits);
        tracing::debug!(hits = hits.len(), "scroll page");
        Ok(ScrollPage {
            hits,
            scroll_id: parsed.scroll_id,
        })
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<(), QuadexError> {
        let body = json!({ "scroll_id": scroll_id });
        let req = self
            .request(reqwest::Method::DELETE, self.url(&["_search", "scroll"])?)
            .json(&body);
        let resp = self.send(req).await?;
        // Already gone server-side.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(resp).await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, QuadexError> {
        let not_found = || QuadexError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        let Some(url) = self.doc_url(collection, id)? else {
            return Err(not_found());
        };
        let resp = self.send(self.request(reqwest::Method::GET, url)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        let parsed: GetBody = Self::parse(Self::check_status(resp).await?).await?;
        if !parsed.found {
            return Err(not_found());
        }
        Ok(parsed.source)
    }

    async fn put(&self, collection: &str, id: &str, doc: &Document) -> Result<(), QuadexError> {
        let Some(url) = self.doc_url(collection, id)? else {
            return Err(QuadexError::InvalidQuad(format!(
                "document id '{id}' is not addressable"
            )));
        };
        let req = self.request(reqwest::Method::PUT, url).json(doc);
        Self::check_status(self.send(req).await?).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, QuadexError> {
        let Some(url) = self.doc_url(collection, id)? else {
            return Ok(false);
        };
        let resp = self.send(self.request(reqwest::Method::DELETE, url)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check_status(resp).await?;
        Ok(true)
    }

    async fn create_collection(&self, name: &str, schema: &Document) -> Result<(), QuadexError> {
        let req = self
            .request(reqwest::Method::PUT, self.url(&[name])?)
            .json(schema);
        let resp = self.send(req).await?;
        if resp.status() == StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            if body.contains("resource_already_exists_exception") {
                tracing::info!(collection = name, "collection already exists");
                return Ok(());
            }
            return Err(QuadexError::Transport(format!("index returned 400: {body}")));
        }
        Self::check_status(resp).await?;
        tracing::info!(collection = name, "collection created");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
