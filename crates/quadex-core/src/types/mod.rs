//! # Core Type Definitions
//!
//! This module contains the core types of the quad adapter:
//! - The stored fact (`Quad`) and its roles (`Direction`)
//! - Opaque engine handles (`Value`) and content addresses (`Identifier`)
//! - Write deltas (`Delta`, `Action`)
//! - Error types (`QuadexError`)
//!
//! ## Identity
//!
//! A quad has no assigned identity. Its identifier is derived from its four
//! fields (see [`crate::address`]), so equal quads always share one document.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// DIRECTION
// =============================================================================

/// One of the four roles a string plays inside a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Subject,
    Predicate,
    Object,
    Label,
}

impl Direction {
    /// All directions in storage order.
    pub const ALL: [Direction; 4] = [
        Direction::Subject,
        Direction::Predicate,
        Direction::Object,
        Direction::Label,
    ];

    /// The document field holding this direction.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Subject => "s",
            Self::Predicate => "p",
            Self::Object => "o",
            Self::Label => "c",
        }
    }

    /// Parse a direction name (`subject`, `s`, `predicate`, ...).
    pub fn parse(s: &str) -> Result<Self, QuadexError> {
        match s.to_ascii_lowercase().as_str() {
            "subject" | "s" => Ok(Self::Subject),
            "predicate" | "p" => Ok(Self::Predicate),
            "object" | "o" => Ok(Self::Object),
            "label" | "c" | "context" => Ok(Self::Label),
            other => Err(QuadexError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
            Self::Label => "label",
        };
        f.write_str(name)
    }
}

// =============================================================================
// QUAD
// =============================================================================

/// A subject/predicate/object/label fact.
///
/// The label may be empty (no context). Quads are never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub label: String,
}

impl Quad {
    /// Create a new quad.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            label: label.into(),
        }
    }

    /// Create a quad with an empty label.
    #[must_use]
    pub fn triple(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self::new(subject, predicate, object, "")
    }

    /// The field for the given direction.
    #[must_use]
    pub fn get(&self, direction: Direction) -> &str {
        match direction {
            Direction::Subject => &self.subject,
            Direction::Predicate => &self.predicate,
            Direction::Object => &self.object,
            Direction::Label => &self.label,
        }
    }

    /// Reject quads missing a subject, predicate or object.
    pub fn validate(&self) -> Result<(), QuadexError> {
        for direction in [Direction::Subject, Direction::Predicate, Direction::Object] {
            if self.get(direction).is_empty() {
                return Err(QuadexError::InvalidQuad(format!("empty {direction} in {self}")));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} -- {} -> {}",
            self.subject, self.predicate, self.object
        )?;
        if !self.label.is_empty() {
            write!(f, " @ {}", self.label)?;
        }
        f.write_str(")")
    }
}

// =============================================================================
// IDENTIFIERS & HANDLES
// =============================================================================

/// A content address: fixed-width lowercase hex, usable directly as a
/// document key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier(pub String);

impl Identifier {
    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The opaque handle the query engine holds.
///
/// Node handles carry the node name itself; quad handles carry the quad
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Value(pub String);

impl Value {
    /// Create a new value from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Identifier> for Value {
    fn from(id: Identifier) -> Self {
        Self(id.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// DELTAS
// =============================================================================

/// Whether a delta adds or removes its quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Add,
    Remove,
}

/// One write applied by `QuadStore::apply_writes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub quad: Quad,
    pub action: Action,
}

impl Delta {
    /// An insertion of `quad`.
    #[must_use]
    pub fn add(quad: Quad) -> Self {
        Self {
            quad,
            action: Action::Add,
        }
    }

    /// A removal of `quad`.
    #[must_use]
    pub fn remove(quad: Quad) -> Self {
        Self {
            quad,
            action: Action::Remove,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the quad adapter.
///
/// - No silent failures: an empty result is never used to signal an error
/// - The adapter never panics on remote-index errors
#[derive(Debug, Error)]
pub enum QuadexError {
    /// The remote index was unreachable, answered non-2xx, or sent an
    /// unparseable response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No document with this id exists in the collection.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A stored document is missing a field or has a field of the wrong type.
    #[error("Malformed document {id}: {reason}")]
    Decode { id: String, reason: String },

    /// The server-side scroll session lapsed.
    #[error("Scroll session expired: {0}")]
    CursorExpired(String),

    /// `result()` was called before a successful `advance()`.
    #[error("Cursor has no current result")]
    NoCurrentResult,

    /// A quad failed validation and was not written.
    #[error("Invalid quad: {0}")]
    InvalidQuad(String),

    /// A direction name that is not subject, predicate, object or label.
    #[error("Unknown direction: '{0}'")]
    InvalidDirection(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A local file could not be read.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
