// tests/property/inventory_test.rs

//! Property-based tests for the inventory store
//! Tests that stored inventories come back unchanged and that ids stay gapless

use proptest::prelude::*;
use rconnect::core::inventory::{self, InventoryStore};

const MAX_BYTES: usize = 64 * 1024;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_payload_round_trip(items in prop::collection::vec(".{0,24}", 0..16)) {
        let raw = serde_json::to_string(&items).unwrap();
        let parsed = inventory::parse_payload(&raw, MAX_BYTES).unwrap();
        prop_assert_eq!(&parsed, &items);

        let store = InventoryStore::new();
        let id = store.append(parsed);
        let stored = store.get(id);
        prop_assert_eq!(stored.as_deref(), Some(&items));
    }

    #[test]
    fn test_ids_are_gapless(batches in prop::collection::vec(prop::collection::vec("[a-z]{0,6}", 0..4), 1..32)) {
        let store = InventoryStore::new();
        for (expected, items) in batches.iter().enumerate() {
            prop_assert_eq!(store.append(items.clone()), expected as u64);
        }
        prop_assert_eq!(store.len(), batches.len());
        prop_assert!(store.get(batches.len() as u64).is_none());
    }

    #[test]
    fn test_non_string_arrays_are_rejected(numbers in prop::collection::vec(any::<i64>(), 1..8)) {
        let raw = serde_json::to_string(&numbers).unwrap();
        prop_assert!(inventory::parse_payload(&raw, MAX_BYTES).is_err());
    }
}
