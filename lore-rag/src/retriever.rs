//! Query-side retrieval: embed a question and search the index.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Separator placed between chunks by [`get_context`].
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Finds the chunks most similar to a query.
///
/// The embedding provider must be the one the index was built with; the
/// [`Assistant`](crate::Assistant) checks this when it opens an index.
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever returning up to `top_k` results per query.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        top_k: usize,
    ) -> Self {
        Self { embedding_provider, vector_store, top_k }
    }

    /// The default number of results per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve the `k` records most similar to `query`, most similar first.
    ///
    /// A blank query returns nothing without calling the embedding provider
    /// or the index.
    ///
    /// # Errors
    ///
    /// Propagates embedding and vector store errors.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() || k == 0 {
            debug!("blank query, skipping retrieval");
            return Ok(Vec::new());
        }

        let embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let results = self.vector_store.search(&embedding, k).await.map_err(|e| {
            error!(error = %e, "vector store search failed");
            e
        })?;

        info!(result_count = results.len(), top_k = k, "retrieval completed");
        Ok(results)
    }

    /// [`retrieve`](Self::retrieve) with the configured `top_k`.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve(query, self.top_k).await
    }
}

/// Join retrieved chunk texts with a blank line, in retrieval order.
///
/// Returns an empty string for no results.
pub fn get_context(results: &[SearchResult]) -> String {
    results.iter().map(|r| r.record.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}
