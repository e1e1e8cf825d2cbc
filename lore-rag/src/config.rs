//! Configuration for ingestion and question answering.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// Default chat model used to generate answers.
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-3.5-turbo";
/// Default base URL of the OpenAI-compatible API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration parameters for the ingestion pipeline and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoreConfig {
    /// Embedding model identifier. Ingestion and queries must use the same one.
    pub embedding_model: String,
    /// Generation model identifier.
    pub generation_model: String,
    /// Sampling temperature passed to the generation model.
    pub temperature: f32,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Maximum number of texts sent in one embedding request.
    pub embedding_batch_size: usize,
    /// Directory scanned recursively for documents at ingestion time.
    pub raw_data_dir: PathBuf,
    /// Directory the index is persisted to and loaded from.
    pub index_dir: PathBuf,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// API key for both gateways. Never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LoreConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: 0.7,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            embedding_batch_size: 100,
            raw_data_dir: PathBuf::from("data/raw"),
            index_dir: PathBuf::from("data/index"),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
        }
    }
}

impl LoreConfig {
    /// Create a new builder for constructing a [`LoreConfig`].
    pub fn builder() -> LoreConfigBuilder {
        LoreConfigBuilder::default()
    }

    /// Build a validated configuration from the process environment.
    ///
    /// See [`LoreConfig::from_lookup`] for the variables consulted.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a validated configuration from a key lookup function.
    ///
    /// Reads `LORE_EMBEDDING_MODEL`, `LORE_GENERATION_MODEL`, `LORE_TEMPERATURE`,
    /// `LORE_CHUNK_SIZE`, `LORE_CHUNK_OVERLAP`, `LORE_TOP_K`,
    /// `LORE_EMBEDDING_BATCH_SIZE`, `LORE_RAW_DATA_DIR`, `LORE_INDEX_DIR`,
    /// `OPENAI_BASE_URL` and `OPENAI_API_KEY`. Unset or empty variables keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a numeric variable does not parse
    /// or the resulting configuration is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(model) = get("LORE_EMBEDDING_MODEL") {
            builder = builder.embedding_model(model);
        }
        if let Some(model) = get("LORE_GENERATION_MODEL") {
            builder = builder.generation_model(model);
        }
        if let Some(value) = get("LORE_TEMPERATURE") {
            builder = builder.temperature(parse_var("LORE_TEMPERATURE", &value)?);
        }
        if let Some(value) = get("LORE_CHUNK_SIZE") {
            builder = builder.chunk_size(parse_var("LORE_CHUNK_SIZE", &value)?);
        }
        if let Some(value) = get("LORE_CHUNK_OVERLAP") {
            builder = builder.chunk_overlap(parse_var("LORE_CHUNK_OVERLAP", &value)?);
        }
        if let Some(value) = get("LORE_TOP_K") {
            builder = builder.top_k(parse_var("LORE_TOP_K", &value)?);
        }
        if let Some(value) = get("LORE_EMBEDDING_BATCH_SIZE") {
            builder = builder.embedding_batch_size(parse_var("LORE_EMBEDDING_BATCH_SIZE", &value)?);
        }
        if let Some(dir) = get("LORE_RAW_DATA_DIR") {
            builder = builder.raw_data_dir(dir);
        }
        if let Some(dir) = get("LORE_INDEX_DIR") {
            builder = builder.index_dir(dir);
        }
        if let Some(base) = get("OPENAI_BASE_URL") {
            builder = builder.api_base(base);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            builder = builder.api_key(key);
        }

        builder.build()
    }

    /// Return the API key, or a configuration error if none is set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            RagError::ConfigError(
                "OPENAI_API_KEY is not set; add it to the environment or a .env file".to_string(),
            )
        })
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0` or `embedding_batch_size == 0`
    /// - `temperature` is outside `0.0..=2.0`
    /// - either model identifier is empty
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        if self.embedding_model.trim().is_empty() || self.generation_model.trim().is_empty() {
            return Err(RagError::ConfigError("model identifiers must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| RagError::ConfigError(format!("invalid value '{value}' for {key}: {e}")))
}

/// Builder for constructing a validated [`LoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct LoreConfigBuilder {
    config: LoreConfig,
}

impl LoreConfigBuilder {
    /// Set the embedding model identifier.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the generation model identifier.
    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.generation_model = model.into();
        self
    }

    /// Set the generation temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum number of texts per embedding request.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set the raw documents directory.
    pub fn raw_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.raw_data_dir = dir.into();
        self
    }

    /// Set the index directory.
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.index_dir = dir.into();
        self
    }

    /// Set the API base URL.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Build the [`LoreConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`LoreConfig::validate`].
    pub fn build(self) -> Result<LoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
