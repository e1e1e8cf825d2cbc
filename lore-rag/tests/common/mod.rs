//! Deterministic gateway doubles shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lore_rag::{EmbeddingProvider, LanguageModel, LoreConfig, RagError, Result};

pub const EMBEDDING_MODEL: &str = "bag-of-words";
const DIM: usize = 64;

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn bucket(token: &str) -> usize {
    token.bytes().fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize)) % DIM
}

/// Hashes words into a fixed-size count vector, so texts sharing words
/// score higher.
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    pub embed_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst) + self.batch_calls.load(Ordering::SeqCst)
    }
}

fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    for token in tokens(text) {
        v[bucket(&token)] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(bag_of_words(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn model(&self) -> &str {
        EMBEDDING_MODEL
    }
}

/// Always fails, like a gateway rejecting the key.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "failing".to_string(),
            message: "401 Unauthorized".to_string(),
        })
    }

    fn model(&self) -> &str {
        EMBEDDING_MODEL
    }
}

/// Answers with the first context sentence sharing a word with the
/// question, or admits it does not know.
#[derive(Default)]
pub struct ExtractiveModel {
    pub calls: AtomicUsize,
}

impl ExtractiveModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = prompt.find(start)? + start.len();
    let to = prompt[from..].find(end).map_or(prompt.len(), |i| from + i);
    Some(prompt[from..to].trim())
}

#[async_trait]
impl LanguageModel for ExtractiveModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (Some(context), Some(question)) = (
            section(prompt, "Context:\n", "\n\nQuestion:"),
            section(prompt, "Question:\n", "\n\nAnswer:"),
        ) else {
            return Ok("From general knowledge: no context was given.".to_string());
        };

        let words: Vec<String> = tokens(question).filter(|w| w.len() > 3).collect();
        let answer = context
            .split_inclusive('.')
            .map(str::trim)
            .find(|sentence| tokens(sentence).any(|t| words.contains(&t)));
        Ok(answer.map_or_else(|| "I don't know.".to_string(), str::to_string))
    }

    fn model(&self) -> &str {
        "extractive"
    }
}

/// Always fails, like an exhausted rate limit.
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::GenerationError {
            provider: "failing".to_string(),
            message: "429 Too Many Requests".to_string(),
        })
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// A config pointing at the given directories, with a small chunk size.
pub fn config(raw: &Path, index: &Path) -> LoreConfig {
    LoreConfig::builder()
        .embedding_model(EMBEDDING_MODEL)
        .chunk_size(200)
        .chunk_overlap(20)
        .top_k(3)
        .raw_data_dir(raw)
        .index_dir(index)
        .build()
        .unwrap()
}

pub fn embedder() -> Arc<BagOfWordsEmbedder> {
    Arc::new(BagOfWordsEmbedder::default())
}
