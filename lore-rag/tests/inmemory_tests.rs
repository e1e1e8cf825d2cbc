//! Property tests for in-memory search ordering and persisted-index ranking.

use std::collections::HashMap;

use chrono::Utc;
use lore_rag::document::IndexedRecord;
use lore_rag::inmemory::InMemoryVectorStore;
use lore_rag::persist::{FORMAT_VERSION, IndexManifest, load_index, persist_index};
use lore_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a record with a normalized embedding.
fn arb_record(dim: usize) -> impl Strategy<Value = IndexedRecord> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| IndexedRecord {
            metadata: HashMap::from([("source".to_string(), format!("{id}.txt"))]),
            id,
            text,
            embedding,
        },
    )
}

/// Keep the first record for each id, preserving order.
fn dedup(records: Vec<IndexedRecord>) -> Vec<IndexedRecord> {
    let mut seen = std::collections::HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.id.clone())).collect()
}

/// **Search ordering**
/// *For any* set of records in an InMemoryVectorStore, searching returns
/// results ordered by descending cosine similarity, at most `top_k` of them.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            records in proptest::collection::vec(arb_record(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let records = dedup(records);
            let unique_count = records.len();

            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.upsert(&records).await.unwrap();
                store.search(&query, top_k).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(unique_count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not descending: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

/// **Persisted ranking equivalence**
/// *For any* set of records, persisting them and loading the index back
/// yields the same top-k ranking as searching the store built in memory.
mod prop_persisted_ranking {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn loaded_index_ranks_like_the_original(
            records in proptest::collection::vec(arb_record(DIM), 1..15),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..10,
        ) {
            let records = dedup(records);
            let temp = tempfile::tempdir().unwrap();
            let manifest = IndexManifest {
                version: FORMAT_VERSION,
                embedding_model: "prop-embedding".to_string(),
                dimensions: DIM,
                chunk_size: 100,
                chunk_overlap: 10,
                record_count: records.len(),
                created_at: Utc::now(),
            };

            let rt = tokio::runtime::Runtime::new().unwrap();
            let (before, after) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.upsert(&records).await.unwrap();
                let before = store.search(&query, top_k).await.unwrap();

                persist_index(temp.path(), &manifest, &records).unwrap();
                let loaded = load_index(temp.path()).unwrap().unwrap();
                let after = loaded.store.search(&query, top_k).await.unwrap();
                (before, after)
            });

            let ids = |rs: &[lore_rag::SearchResult]| {
                rs.iter().map(|r| r.record.id.clone()).collect::<Vec<_>>()
            };
            prop_assert_eq!(ids(&before), ids(&after));
        }
    }
}
