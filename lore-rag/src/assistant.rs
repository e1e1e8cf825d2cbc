//! Question answering over a persisted index.
//!
//! [`Assistant`] ties a [`Retriever`] and a [`Generator`] together behind a
//! single [`ask`](Assistant::ask) call. `ask` never fails: retrieval and
//! generation errors come back as an [`AnswerResult`] describing the
//! problem, with no sources.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::LoreConfig;
use crate::document::{AnswerResult, SourceRef};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::LanguageModel;
use crate::generator::{EMPTY_QUESTION_REPLY, Generator};
use crate::openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
use crate::persist::{blocking, load_index};
use crate::retriever::{Retriever, get_context};

/// Answers questions from an index built by the ingestion pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use lore_rag::{Assistant, LoreConfig};
///
/// let assistant = Assistant::from_config(&LoreConfig::from_env()?).await?;
/// let result = assistant.ask("What animal is lazy?").await;
/// println!("{}", result.answer);
/// ```
#[derive(Clone)]
pub struct Assistant {
    retriever: Retriever,
    generator: Generator,
}

impl Assistant {
    /// Assemble an assistant from its parts.
    pub fn new(retriever: Retriever, generator: Generator) -> Self {
        Self { retriever, generator }
    }

    /// Open the index at `config.index_dir` with the OpenAI-compatible gateways.
    ///
    /// # Errors
    ///
    /// See [`Assistant::open`]. A missing API key is reported before the
    /// index is touched.
    pub async fn from_config(config: &LoreConfig) -> Result<Self> {
        let embedder = OpenAIEmbeddingProvider::from_config(config)?;
        let model = OpenAIChatModel::from_config(config)?;
        Self::open(config, Arc::new(embedder), Arc::new(model)).await
    }

    /// Open the index at `config.index_dir`.
    ///
    /// # Errors
    ///
    /// - [`RagError::IndexNotInitialized`] if nothing has been ingested there.
    /// - [`RagError::IndexModelMismatch`] if the index was built with a
    ///   different embedding model than `embedding_provider` uses.
    /// - Persistence errors if the index cannot be read.
    pub async fn open(
        config: &LoreConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        config.validate()?;
        let index_dir = config.index_dir.clone();
        let loaded = blocking({
            let dir = index_dir.clone();
            move || load_index(&dir)
        })
        .await?
        .ok_or_else(|| not_initialized(&index_dir))?;

        if loaded.manifest.embedding_model != embedding_provider.model() {
            error!(
                index_model = %loaded.manifest.embedding_model,
                provider_model = embedding_provider.model(),
                "embedding model mismatch"
            );
            return Err(RagError::IndexModelMismatch {
                index_model: loaded.manifest.embedding_model,
                provider_model: embedding_provider.model().to_string(),
            });
        }

        info!(
            index = %index_dir.display(),
            records = loaded.manifest.record_count,
            model = model.model(),
            "assistant ready"
        );
        let retriever = Retriever::new(embedding_provider, Arc::new(loaded.store), config.top_k);
        Ok(Self::new(retriever, Generator::new(model)))
    }

    /// Answer `query`.
    ///
    /// A blank query returns "Please provide a question." without any
    /// gateway call. Errors are reported in the answer text.
    pub async fn ask(&self, query: &str) -> AnswerResult {
        if query.trim().is_empty() {
            return AnswerResult::ungrounded(EMPTY_QUESTION_REPLY);
        }

        info!(query_len = query.len(), "processing query");
        match self.try_ask(query).await {
            Ok(result) => {
                info!(sources = result.sources.len(), grounded = result.grounded, "query answered");
                result
            }
            Err(e) => {
                error!(error = %e, "query failed");
                AnswerResult::ungrounded(format!("An error occurred: {e}"))
            }
        }
    }

    async fn try_ask(&self, query: &str) -> Result<AnswerResult> {
        let results = self.retriever.retrieve_default(query).await?;
        let context = get_context(&results);
        let generation = self.generator.generate(query, &context).await?;
        Ok(AnswerResult {
            answer: generation.text,
            sources: results.into_iter().map(SourceRef::from).collect(),
            grounded: generation.grounded,
        })
    }
}

fn not_initialized(path: &Path) -> RagError {
    error!(index = %path.display(), "index not initialized");
    RagError::IndexNotInitialized { path: path.to_path_buf() }
}
