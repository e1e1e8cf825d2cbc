//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps records in insertion order behind a
//! `tokio::sync::RwLock`. Search is a linear scan; ties keep insertion
//! order, so a store rebuilt from persisted records ranks identically.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{IndexedRecord, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

#[derive(Debug, Default)]
struct Records {
    items: Vec<IndexedRecord>,
    positions: HashMap<String, usize>,
}

impl Records {
    fn dimensions(&self) -> Option<usize> {
        self.items.first().map(|r| r.embedding.len())
    }

    fn insert(&mut self, record: IndexedRecord) {
        match self.positions.get(&record.id) {
            Some(&pos) => self.items[pos] = record,
            None => {
                self.positions.insert(record.id.clone(), self.items.len());
                self.items.push(record);
            }
        }
    }
}

/// An in-memory vector store using cosine similarity for search.
///
/// # Example
///
/// ```rust,ignore
/// use lore_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert(&records).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<Records>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, e.g. ones read back from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if embeddings differ in length.
    pub fn from_records(records: Vec<IndexedRecord>) -> Result<Self> {
        let mut inner = Records::default();
        check_dimensions(None, &records)?;
        for record in records {
            inner.insert(record);
        }
        Ok(Self { records: RwLock::new(inner) })
    }

    /// Snapshot of all records in insertion order.
    pub async fn records(&self) -> Vec<IndexedRecord> {
        self.records.read().await.items.clone()
    }

    /// Dimensionality of the stored embeddings, if any are stored.
    pub async fn dimensions(&self) -> Option<usize> {
        self.records.read().await.dimensions()
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message }
}

/// Ensure every record has the same embedding length (and matches `expected`).
fn check_dimensions(expected: Option<usize>, records: &[IndexedRecord]) -> Result<()> {
    let Some(dims) = expected.or_else(|| records.first().map(|r| r.embedding.len())) else {
        return Ok(());
    };
    match records.iter().find(|r| r.embedding.len() != dims) {
        Some(bad) => Err(store_error(format!(
            "record '{}' has {} dimensions, expected {dims}",
            bad.id,
            bad.embedding.len()
        ))),
        None => Ok(()),
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, records: &[IndexedRecord]) -> Result<()> {
        let mut inner = self.records.write().await;
        check_dimensions(inner.dimensions(), records)?;
        for record in records {
            inner.insert(record.clone());
        }
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let inner = self.records.read().await;
        if let Some(dims) = inner.dimensions() {
            if dims != embedding.len() {
                return Err(store_error(format!(
                    "query has {} dimensions but the index stores {dims}",
                    embedding.len()
                )));
            }
        }

        let mut scored: Vec<SearchResult> = inner
            .items
            .iter()
            .map(|record| SearchResult {
                score: cosine_similarity(&record.embedding, embedding),
                record: record.clone(),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.records.read().await.items.len()
    }
}
