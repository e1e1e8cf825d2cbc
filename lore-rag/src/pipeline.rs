//! Ingestion pipeline.
//!
//! [`IngestPipeline`] turns a directory of documents into a persisted index:
//! load → chunk → embed → persist. The run is all-or-nothing. Nothing is
//! written to the index directory unless every chunk was embedded, and the
//! write itself is atomic (see [`persist_index`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use lore_rag::{IngestPipeline, LoreConfig};
//!
//! let config = LoreConfig::from_env()?;
//! let pipeline = IngestPipeline::from_config(&config)?;
//! let outcome = pipeline.ingest(&config.raw_data_dir, &config.index_dir).await?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker, split_documents};
use crate::config::LoreConfig;
use crate::document::{Chunk, IndexedRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::load_documents;
use crate::openai::OpenAIEmbeddingProvider;
use crate::persist::{FORMAT_VERSION, IndexManifest, blocking, persist_index};

/// Stages of one ingestion run. Transitions are linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    /// Nothing loaded yet.
    Empty,
    /// Documents read from disk.
    Loaded,
    /// Documents split into chunks.
    Chunked,
    /// Every chunk embedded and the index written.
    EmbeddedAndPersisted,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Loaded => "loaded",
            Self::Chunked => "chunked",
            Self::EmbeddedAndPersisted => "embedded_and_persisted",
        };
        f.write_str(name)
    }
}

/// Summary of a successful ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of documents loaded (PDF pages count individually).
    pub documents: usize,
    /// Supported files that could not be read.
    pub skipped_files: Vec<PathBuf>,
    /// Number of chunks embedded and written.
    pub chunks: usize,
    /// Where the index was written.
    pub index_dir: PathBuf,
}

/// Result of [`IngestPipeline::ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The source directory held no loadable text. Nothing was written.
    NoDocumentsFound,
    /// The index was written.
    Ingested(IngestReport),
}

impl IngestOutcome {
    /// `true` if an index was written.
    pub fn is_ingested(&self) -> bool {
        matches!(self, Self::Ingested(_))
    }
}

/// Loads, chunks, embeds and persists a document directory.
///
/// Construct one via [`IngestPipeline::builder()`] or
/// [`IngestPipeline::from_config`].
pub struct IngestPipeline {
    config: LoreConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
}

impl IngestPipeline {
    /// Create a new [`IngestPipelineBuilder`].
    pub fn builder() -> IngestPipelineBuilder {
        IngestPipelineBuilder::default()
    }

    /// Build a pipeline that embeds through the configured OpenAI-compatible API.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no API key is configured or the
    /// chunking parameters are invalid. No I/O happens first.
    pub fn from_config(config: &LoreConfig) -> Result<Self> {
        let provider = OpenAIEmbeddingProvider::from_config(config)?;
        Self::builder().config(config.clone()).embedding_provider(Arc::new(provider)).build()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &LoreConfig {
        &self.config
    }

    /// Run ingestion from `source_dir` into `index_dir`.
    ///
    /// Returns [`IngestOutcome::NoDocumentsFound`] when there is nothing to
    /// index. `index_dir` is created if absent.
    ///
    /// # Errors
    ///
    /// Embedding failures abort the run and leave `index_dir` untouched.
    /// Returns [`RagError::ConfigError`] if `source_dir` is not a directory.
    pub async fn ingest(&self, source_dir: &Path, index_dir: &Path) -> Result<IngestOutcome> {
        let mut stage = IngestStage::Empty;
        info!(%stage, source = %source_dir.display(), "starting ingestion");

        let dir = source_dir.to_path_buf();
        let report = blocking(move || load_documents(&dir)).await?;
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "some files could not be loaded");
        }
        if report.documents.is_empty() {
            info!(source = %source_dir.display(), "no documents found");
            return Ok(IngestOutcome::NoDocumentsFound);
        }
        stage = IngestStage::Loaded;
        info!(%stage, documents = report.documents.len(), "documents loaded");

        let chunks = split_documents(self.chunker.as_ref(), &report.documents);
        if chunks.is_empty() {
            info!(source = %source_dir.display(), "documents contain no text");
            return Ok(IngestOutcome::NoDocumentsFound);
        }
        stage = IngestStage::Chunked;
        info!(%stage, chunks = chunks.len(), "documents chunked");

        let chunk_count = chunks.len();
        let records = self.embed_chunks(chunks).await?;
        let manifest = IndexManifest {
            version: FORMAT_VERSION,
            embedding_model: self.embedding_provider.model().to_string(),
            dimensions: records.first().map(|r| r.embedding.len()).unwrap_or_default(),
            chunk_size: self.config.chunk_size,
            chunk_overlap: self.config.chunk_overlap,
            record_count: records.len(),
            created_at: Utc::now(),
        };

        let dest = index_dir.to_path_buf();
        blocking(move || persist_index(&dest, &manifest, &records)).await.map_err(|e| {
            error!(index = %index_dir.display(), error = %e, "failed to persist index");
            e
        })?;
        stage = IngestStage::EmbeddedAndPersisted;
        info!(%stage, chunks = chunk_count, index = %index_dir.display(), "ingestion complete");

        Ok(IngestOutcome::Ingested(IngestReport {
            documents: report.documents.len(),
            skipped_files: report.skipped,
            chunks: chunk_count,
            index_dir: index_dir.to_path_buf(),
        }))
    }

    /// Embed chunks in batches of `embedding_batch_size`.
    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<IndexedRecord>> {
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.embedding_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(batch_size = texts.len(), error = %e, "embedding failed during ingestion");
                e
            })?;
            if vectors.len() != texts.len() {
                return Err(RagError::EmbeddingError {
                    provider: self.embedding_provider.model().to_string(),
                    message: format!("expected {} embeddings, got {}", texts.len(), vectors.len()),
                });
            }
            embeddings.extend(vectors);
        }

        let dims = embeddings.first().map(Vec::len).unwrap_or_default();
        if dims == 0 || embeddings.iter().any(|e| e.len() != dims) {
            return Err(RagError::EmbeddingError {
                provider: self.embedding_provider.model().to_string(),
                message: "embeddings are empty or differ in length".to_string(),
            });
        }

        Ok(chunks.into_iter().zip(embeddings).map(|(c, e)| IndexedRecord::from_chunk(c, e)).collect())
    }
}

/// Builder for constructing an [`IngestPipeline`].
///
/// `config` and `embedding_provider` are required. Without an explicit
/// chunker, a [`RecursiveChunker`] is built from the config.
#[derive(Default)]
pub struct IngestPipelineBuilder {
    config: Option<LoreConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl IngestPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: LoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`IngestPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the config is invalid, and [`RagError::ChunkingError`] for chunking
    /// parameters the splitter rejects.
    pub fn build(self) -> Result<IngestPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        Ok(IngestPipeline { config, embedding_provider, chunker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(IngestStage::Empty.to_string(), "empty");
        assert_eq!(IngestStage::EmbeddedAndPersisted.to_string(), "embedded_and_persisted");
    }

    #[test]
    fn missing_api_key_fails_at_construction() {
        let config = LoreConfig::default();
        assert!(matches!(IngestPipeline::from_config(&config), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn builder_requires_embedding_provider() {
        let result = IngestPipeline::builder().config(LoreConfig::default()).build();
        assert!(matches!(result, Err(RagError::ConfigError(msg)) if msg.contains("embedding_provider")));
    }
}
