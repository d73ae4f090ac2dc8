//! # Property-Based Tests
//!
//! Determinism, practical injectivity and round-trip invariants of content
//! addressing and document mapping.

use proptest::collection::vec;
use proptest::prelude::*;
use quadex_core::address::IDENTIFIER_LEN;
use quadex_core::document::{decode, decode_node, encode, encode_node};
use quadex_core::{Quad, digest, quad_id};
use std::collections::{BTreeMap, BTreeSet};

fn any_quad() -> impl Strategy<Value = Quad> {
    (".{0,12}", ".{0,12}", ".{0,12}", ".{0,12}")
        .prop_map(|(s, p, o, c)| Quad::new(s, p, o, c))
}

proptest! {
    /// Field-equal quads share one identifier.
    #[test]
    fn quad_id_is_deterministic(quad in any_quad()) {
        let copy = Quad::new(
            quad.subject.clone(),
            quad.predicate.clone(),
            quad.object.clone(),
            quad.label.clone(),
        );
        prop_assert_eq!(quad_id(&quad), quad_id(&copy));
    }

    /// Identifiers are fixed-width lowercase hex for every input.
    #[test]
    fn identifiers_are_fixed_width_hex(s in ".*") {
        let id = digest(&s);
        prop_assert_eq!(id.as_str().len(), IDENTIFIER_LEN);
        prop_assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// Distinct quads never share an identifier.
    #[test]
    fn distinct_quads_have_distinct_ids(quads in vec(any_quad(), 1..64)) {
        let mut seen: BTreeMap<String, Quad> = BTreeMap::new();
        for quad in quads {
            let id = quad_id(&quad).0;
            if let Some(previous) = seen.get(&id) {
                prop_assert_eq!(previous, &quad);
            }
            seen.insert(id, quad);
        }
    }

    /// Moving characters across a field boundary changes the identifier.
    #[test]
    fn field_boundaries_are_unambiguous(a in "[a-z]{1,6}", b in "[a-z]{1,6}", rest in "[a-z]{0,6}") {
        let split = Quad::new(format!("{a}{b}"), rest.clone(), "o", "");
        let shifted = Quad::new(a.clone(), format!("{b}{rest}"), "o", "");
        prop_assert_ne!(quad_id(&split), quad_id(&shifted));
    }

    /// decode(encode(q)) == q.
    #[test]
    fn quad_document_round_trip(quad in any_quad()) {
        let id = quad_id(&quad);
        let decoded = decode(id.as_str(), &encode(&quad)).expect("decode");
        prop_assert_eq!(decoded, quad);
    }

    /// Node documents keep their name.
    #[test]
    fn node_document_round_trip(name in ".*") {
        let decoded = decode_node("n", &encode_node(&name)).expect("decode");
        prop_assert_eq!(decoded, name);
    }
}

#[test]
fn synthetic_corpus_has_no_collisions() {
    let mut ids = BTreeSet::new();
    for i in 0..20_000u32 {
        let quad = Quad::new(
            format!("s{}", i % 97),
            format!("p{}", i % 13),
            format!("o{i}"),
            if i % 2 == 0 { String::new() } else { format!("g{}", i % 5) },
        );
        assert!(ids.insert(quad_id(&quad)), "collision at {i}");
    }
}
