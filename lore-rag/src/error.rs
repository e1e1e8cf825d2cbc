//! Error types for the `lore-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error. Raised at construction, never retried.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A single document could not be read or decoded.
    #[error("Failed to load '{}': {message}", path.display())]
    LoadError {
        /// The file that failed to load.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during answer generation.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The language model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The transport to a gateway failed (timeout, refused connection, ...).
    #[error("Gateway error ({provider}): {message}")]
    GatewayError {
        /// The gateway that could not be reached.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// No index exists at the configured location; ingestion must run first.
    #[error("index not initialized at '{}': run ingestion first", path.display())]
    IndexNotInitialized {
        /// The index directory that was checked.
        path: PathBuf,
    },

    /// The index was built with a different embedding model than the one configured.
    #[error(
        "index was built with embedding model '{index_model}' but '{provider_model}' is configured; re-run ingestion"
    )]
    IndexModelMismatch {
        /// The model recorded in the index manifest.
        index_model: String,
        /// The model of the configured embedding provider.
        provider_model: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A filesystem error while persisting or loading the index.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A (de)serialization error while persisting or loading the index.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
