//! Retrieval-augmented question answering over a local document folder.
//!
//! This crate provides:
//! - Recursive, overlap-aware document chunking
//! - Text and PDF loading from a directory tree
//! - OpenAI-compatible embedding and chat gateways
//! - An in-memory cosine index persisted atomically to disk
//! - The ingestion pipeline and the question-answering [`Assistant`]
//!
//! # Example
//!
//! ```rust,ignore
//! use lore_rag::{Assistant, IngestPipeline, LoreConfig};
//!
//! let config = LoreConfig::from_env()?;
//! IngestPipeline::from_config(&config)?
//!     .ingest(&config.raw_data_dir, &config.index_dir)
//!     .await?;
//!
//! let assistant = Assistant::from_config(&config).await?;
//! let answer = assistant.ask("What animal is lazy?").await;
//! ```

pub mod assistant;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod generator;
pub mod handle;
pub mod inmemory;
pub mod loader;
pub mod openai;
pub mod persist;
pub mod pipeline;
pub mod retriever;
pub mod vectorstore;

pub use assistant::Assistant;
pub use chunking::{Chunker, DEFAULT_SEPARATORS, RecursiveChunker, split_documents};
pub use config::{LoreConfig, LoreConfigBuilder};
pub use document::{AnswerResult, Chunk, Document, IndexedRecord, SearchResult, SourceRef};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::LanguageModel;
pub use generator::{EMPTY_QUESTION_REPLY, Generation, Generator};
pub use handle::AssistantHandle;
pub use inmemory::InMemoryVectorStore;
pub use loader::{LoadReport, LoaderKind, load_documents};
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
pub use persist::{IndexManifest, LoadedIndex, load_index, persist_index};
pub use pipeline::{IngestOutcome, IngestPipeline, IngestPipelineBuilder, IngestReport, IngestStage};
pub use retriever::{Retriever, get_context};
pub use vectorstore::VectorStore;
