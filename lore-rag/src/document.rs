//! Data types for documents, chunks, index records, and answers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the file a document was loaded from.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the 1-based PDF page number.
pub const PAGE_KEY: &str = "page";
/// Metadata key holding a chunk's position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A source document loaded from disk. Discarded once it has been chunked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier derived from the source path (and page for PDFs).
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata; always contains [`SOURCE_KEY`].
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document whose id and `source` metadata are both `source`.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        let source = source.into();
        let metadata = HashMap::from([(SOURCE_KEY.to_string(), source.clone())]);
        Self { id: source, text: text.into(), metadata }
    }

    /// The `source` metadata value, or the id if it is missing.
    pub fn source(&self) -> &str {
        self.metadata.get(SOURCE_KEY).map(String::as_str).unwrap_or(&self.id)
    }
}

/// A bounded segment of a [`Document`], the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier: `{document_id}#{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Metadata inherited from the parent document plus [`CHUNK_INDEX_KEY`].
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A [`Chunk`] with its embedding, as stored in a vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedRecord {
    /// Unique identifier copied from the chunk.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// The vector embedding for this record's text.
    pub embedding: Vec<f32>,
    /// Metadata copied from the chunk.
    pub metadata: HashMap<String, String>,
}

impl IndexedRecord {
    /// Attach an embedding to a chunk.
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { id: chunk.id, text: chunk.text, embedding, metadata: chunk.metadata }
    }
}

/// A retrieved [`IndexedRecord`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved record.
    pub record: IndexedRecord,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A source cited by an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    /// The retrieved chunk text.
    pub content: String,
    /// The retrieved chunk metadata.
    pub metadata: HashMap<String, String>,
    /// Similarity score reported by the index.
    pub score: f32,
}

impl From<SearchResult> for SourceRef {
    fn from(result: SearchResult) -> Self {
        Self { content: result.record.text, metadata: result.record.metadata, score: result.score }
    }
}

/// The answer to one question, with its sources in retrieval order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResult {
    /// The generated answer, or a description of what went wrong.
    pub answer: String,
    /// Sources ordered most-similar first.
    pub sources: Vec<SourceRef>,
    /// Whether the answer was generated from retrieved context.
    pub grounded: bool,
}

impl AnswerResult {
    /// An answer with no sources that was not generated from context.
    pub fn ungrounded(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), sources: Vec::new(), grounded: false }
    }
}
