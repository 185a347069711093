//! Integration tests for the storage layer
//!
//! These tests verify that MemoryStore works correctly as a complete system:
//! - Store operations under concurrent access
//! - Agreement between count and select
//! - Fault injection leaving data untouched

use std::sync::Arc;
use std::thread;

use docmap_core::{
    FieldRef, NewRow, Operator, Projection, QueryFragment, SelectOptions, Store, StoreError,
};
use docmap_storage::{MemoryStore, StoreOp};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Helper Functions
// ============================================================================

fn insert_n(store: &MemoryStore, table: &str, n: usize) {
    for i in 0..n {
        store
            .insert(table, NewRow::from_document(json!({"n": i, "parity": i % 2}), &[]))
            .unwrap();
    }
}

fn parity(p: usize) -> QueryFragment {
    QueryFragment::eq(FieldRef::Document("parity".parse().unwrap()), p)
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn test_concurrent_inserts_get_unique_ids() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || insert_n(&store, "t", 50))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let rows = store.rows("t");
        assert_eq!(rows.len(), 400);
        let mut ids: Vec<_> = rows.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(store.stats().snapshot().inserts, 400);
    }

    #[test]
    fn test_tables_are_isolated() {
        let store = MemoryStore::new();
        insert_n(&store, "a", 3);
        insert_n(&store, "b", 5);
        assert_eq!(store.count("a", &QueryFragment::MatchAll).unwrap(), 3);
        assert_eq!(store.delete("b", &parity(0)).unwrap(), 3);
        assert_eq!(store.table_len("a"), 3);
        assert_eq!(store.table_len("b"), 2);
    }
}

// ============================================================================
// Faults
// ============================================================================

mod faults {
    use super::*;

    #[test]
    fn test_failed_insert_adds_nothing() {
        let store = MemoryStore::new();
        store
            .faults()
            .fail_next(StoreOp::Insert, StoreError::Backend("constraint".into()));
        assert!(store.insert("t", NewRow::default()).is_err());
        assert_eq!(store.table_len("t"), 0);
        assert!(store.insert("t", NewRow::default()).is_ok());
    }

    #[test]
    fn test_failed_select_counts_as_round_trip() {
        let store = MemoryStore::new();
        store
            .faults()
            .fail_next(StoreOp::Select, StoreError::Timeout("slow".into()));
        let result = store.select(
            "t",
            &Projection::Full,
            &QueryFragment::MatchAll,
            &SelectOptions::default(),
        );
        assert!(result.is_err());
        assert_eq!(store.stats().snapshot().selects, 1);
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_count_agrees_with_select(n in 0usize..40, threshold in 0i64..40) {
        let store = MemoryStore::new();
        insert_n(&store, "t", n);
        let filter = QueryFragment::Compare {
            field: FieldRef::Document("n".parse().unwrap()),
            op: Operator::Lt,
            value: json!(threshold),
        };
        let counted = store.count("t", &filter).unwrap();
        let selected = store
            .select("t", &Projection::ids(), &filter, &SelectOptions::default())
            .unwrap()
            .count();
        prop_assert_eq!(counted as usize, selected);
        prop_assert_eq!(selected, n.min(threshold as usize));
    }
}
