//! Property-based tests for the Invertible Bloom Lookup Table.

use proptest::prelude::*;
use std::collections::HashSet;

use iblt::{DecodeStatus, Iblt};

const KEY_SIZE: usize = 12;
const VALUE_SIZE: usize = 12;

fn small_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..max_len)
}

fn distinct_pairs(n: usize) -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    prop::collection::vec((small_bytes(KEY_SIZE - 1), small_bytes(VALUE_SIZE - 1)), 1..n).prop_map(
        |pairs| {
            let mut seen = HashSet::new();
            pairs
                .into_iter()
                .filter(|(k, _)| seen.insert(k.clone()))
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // A key with no embedded zero byte survives insert -> list_entries exactly,
    // as long as the table stays well under its peeling capacity.
    #[test]
    fn prop_round_trip_below_capacity(pairs in distinct_pairs(12)) {
        let mut t = Iblt::new(200, 4, KEY_SIZE as u32, VALUE_SIZE as u32).unwrap();
        let mut expected = HashSet::new();
        for (k, v) in &pairs {
            if k.contains(&0) || v.contains(&0) {
                continue;
            }
            t.insert(k, v).unwrap();
            expected.insert((k.clone(), v.clone()));
        }

        let report = t.list_entries().unwrap();
        prop_assert_eq!(report.status, DecodeStatus::Complete);
        let got: HashSet<_> = report.entries.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    // Deleting every inserted pair always returns the table to empty, regardless
    // of insert/delete ordering.
    #[test]
    fn prop_insert_delete_cancels_in_any_order(pairs in distinct_pairs(10)) {
        let mut t = Iblt::new(100, 4, KEY_SIZE as u32, VALUE_SIZE as u32).unwrap();
        let clean: Vec<_> = pairs.into_iter().filter(|(k, v)| !k.contains(&0) && !v.contains(&0)).collect();

        for (k, v) in &clean {
            t.insert(k, v).unwrap();
        }
        for (k, v) in clean.iter().rev() {
            t.delete(k, v).unwrap();
        }
        prop_assert!(t.is_empty());
    }

    // Serialization round-trips bit-for-bit regardless of content.
    #[test]
    fn prop_serialize_deserialize_round_trip(pairs in distinct_pairs(12)) {
        let mut t = Iblt::new(150, 4, KEY_SIZE as u32, VALUE_SIZE as u32).unwrap();
        for (k, v) in &pairs {
            if k.contains(&0) || v.contains(&0) {
                continue;
            }
            t.insert(k, v).unwrap();
        }
        let bytes = t.serialize();
        let restored = Iblt::deserialize(&bytes).unwrap();
        prop_assert_eq!(t, restored);
    }

    // cell_hash/index_set are pure functions of their inputs.
    #[test]
    fn prop_hashing_is_deterministic(key in small_bytes(40)) {
        let a = iblt::hash::index_set(&key, 4, 500).unwrap();
        let b = iblt::hash::index_set(&key, 4, 500).unwrap();
        prop_assert_eq!(a, b);
    }

    // get() never claims Match for a key that was never inserted and never
    // touches a cell with no recorded evidence.
    #[test]
    fn prop_get_never_false_matches_on_empty_table(key in small_bytes(KEY_SIZE - 1)) {
        let t = Iblt::new(100, 4, KEY_SIZE as u32, VALUE_SIZE as u32).unwrap();
        prop_assert_eq!(t.get(&key).unwrap(), iblt::Lookup::NoMatch);
    }

    // Applying the same set of inserts and deletes in a different order produces
    // an identical table, since every cell's contribution is commutative.
    #[test]
    fn prop_apply_order_does_not_affect_result(pairs in distinct_pairs(8)) {
        let clean: Vec<_> = pairs.into_iter().filter(|(k, v)| !k.contains(&0) && !v.contains(&0)).collect();
        if clean.len() < 2 {
            return Ok(());
        }

        let mut forward = Iblt::new(120, 4, KEY_SIZE as u32, VALUE_SIZE as u32).unwrap();
        let mut backward = Iblt::new(120, 4, KEY_SIZE as u32, VALUE_SIZE as u32).unwrap();

        for (k, v) in &clean {
            forward.insert(k, v).unwrap();
        }
        for (k, v) in clean.iter().rev() {
            backward.insert(k, v).unwrap();
        }

        prop_assert_eq!(forward, backward);
    }
}
