//! # Document Mapping
//!
//! Bidirectional mapping between quads / node names and the flat JSON
//! documents stored in the index.
//!
//! Wire shapes:
//! - quad: `{"s": string, "p": string, "o": string, "c": string}`
//! - node: `{"name": string}`
//!
//! Decoding is strongly typed: any missing field or field of the wrong type
//! fails with `QuadexError::Decode`.

use crate::types::{Quad, QuadexError};
use serde::{Deserialize, Serialize};

/// Raw JSON document as exchanged with the index.
pub type Document = serde_json::Value;

/// One search result: the document key and its stored source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    pub source: Document,
}

impl Hit {
    /// Create a new hit.
    #[must_use]
    pub fn new(id: impl Into<String>, source: Document) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

/// Stored form of a quad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadDocument {
    pub s: String,
    pub p: String,
    pub o: String,
    pub c: String,
}

impl From<&Quad> for QuadDocument {
    fn from(quad: &Quad) -> Self {
        Self {
            s: quad.subject.clone(),
            p: quad.predicate.clone(),
            o: quad.object.clone(),
            c: quad.label.clone(),
        }
    }
}

impl From<QuadDocument> for Quad {
    fn from(doc: QuadDocument) -> Self {
        Quad::new(doc.s, doc.p, doc.o, doc.c)
    }
}

/// Stored form of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
}

/// Encode a quad as a document.
#[must_use]
pub fn encode(quad: &Quad) -> Document {
    serde_json::json!({
        "s": quad.subject,
        "p": quad.predicate,
        "o": quad.object,
        "c": quad.label,
    })
}

/// Decode a quad document. `id` is only used for error reporting.
pub fn decode(id: &str, doc: &Document) -> Result<Quad, QuadexError> {
    QuadDocument::deserialize(doc)
        .map(Quad::from)
        .map_err(|e| QuadexError::Decode {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

/// Encode a node name as a document.
#[must_use]
pub fn encode_node(name: &str) -> Document {
    serde_json::json!({ "name": name })
}

/// Decode a node document into its name.
pub fn decode_node(id: &str, doc: &Document) -> Result<String, QuadexError> {
    NodeDocument::deserialize(doc)
        .map(|node| node.name)
        .map_err(|e| QuadexError::Decode {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// TESTS
// =============================================================================
