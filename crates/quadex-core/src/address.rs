//! # Content Addressing
//!
//! Derives stable document keys from content.
//!
//! - `digest(s)` is BLAKE3 over the UTF-8 bytes, rendered as 64 lowercase hex
//!   characters (path and URL safe).
//! - `quad_id(q)` hashes each field separately and digests the four
//!   fixed-width sub-digests. Field boundaries can never shift, so
//!   `("ab", "c")` and `("a", "bc")` address different documents.
//!
//! Node and quad identifiers are both digests of strings; they live in
//! separate collections and never meet.

use crate::types::{Direction, Identifier, Quad};

/// Width in hex characters of every identifier.
pub const IDENTIFIER_LEN: usize = blake3::OUT_LEN * 2;

/// Digest a single string into an identifier.
#[must_use]
pub fn digest(s: &str) -> Identifier {
    Identifier(blake3::hash(s.as_bytes()).to_hex().to_string())
}

/// Identifier of a node document.
#[must_use]
pub fn node_id(name: &str) -> Identifier {
    digest(name)
}

/// Identifier of a quad document.
#[must_use]
pub fn quad_id(quad: &Quad) -> Identifier {
    let mut hasher = blake3::Hasher::new();
    for direction in Direction::ALL {
        hasher.update(blake3::hash(quad.get(direction).as_bytes()).as_bytes());
    }
    Identifier(hasher.finalize().to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_fixed_width_hex() {
        for s in ["", "a", "Hello", &"x".repeat(10_000)] {
            let id = digest(s);
            assert_eq!(id.as_str().len(), IDENTIFIER_LEN);
            assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn quad_id_is_deterministic() {
        let a = Quad::triple("Eos", "daughter", "Zeus");
        let b = Quad::triple("Eos", "daughter", "Zeus");
        assert_eq!(quad_id(&a), quad_id(&b));
    }

    #[test]
    fn field_boundaries_do_not_collide() {
        let left = Quad::triple("ab", "c", "d");
        let right = Quad::triple("a", "bc", "d");
        assert_ne!(quad_id(&left), quad_id(&right));

        // A naive "s:p:o:c" join would make these two equal.
        let colon_left = Quad::triple("a:b", "c", "d");
        let colon_right = Quad::triple("a", "b:c", "d");
        assert_ne!(quad_id(&colon_left), quad_id(&colon_right));
    }

    #[test]
    fn field_order_matters() {
        let forward = Quad::triple("A", "knows", "B");
        let backward = Quad::triple("B", "knows", "A");
        assert_ne!(quad_id(&forward), quad_id(&backward));
    }

    #[test]
    fn label_changes_identity() {
        let bare = Quad::triple("A", "knows", "B");
        let labeled = Quad::new("A", "knows", "B", "g");
        assert_ne!(quad_id(&bare), quad_id(&labeled));
    }

    #[test]
    fn empty_quad_is_addressable() {
        let id = quad_id(&Quad::new("", "", "", ""));
        assert_eq!(id.as_str().len(), IDENTIFIER_LEN);
    }

    #[test]
    fn node_id_matches_digest() {
        assert_eq!(node_id("A"), digest("A"));
        assert_ne!(node_id("A"), node_id("B"));
    }
}
