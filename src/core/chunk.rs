//! The [`Chunk`]: the pipeline's unit of retrieved text.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::score::Score;

/// Where a chunk's underlying text originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Extracted from a document the user uploaded.
    UploadedDocument,
    /// Retrieved via the hybrid web-search pipeline.
    WebSearch,
    /// A synthetic fallback chunk produced when no real retrieval succeeded.
    Fallback,
}

/// Provenance and positional metadata carried by every [`Chunk`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Origin URL, if any (absent for uploaded documents without a URL).
    pub url: Option<String>,
    /// Where this chunk's text came from.
    pub source_kind: SourceOrigin,
    /// The user who owns this chunk's retrieval context.
    pub user_id: String,
    /// Company this chunk's research pertains to.
    pub company: String,
    /// ISO8601 retrieval timestamp.
    pub retrieved_at: String,
    /// Position of this chunk within its parent document (0-based).
    pub chunk_index: usize,
    /// Total number of chunks produced from the parent document.
    pub total_chunks: usize,
    /// Character count of `text`.
    pub char_count: usize,
    /// Word count of `text`.
    pub word_count: usize,
    /// Title of the originating page or document, if known.
    pub title: Option<String>,
    /// The query that led to this chunk being retrieved, if applicable.
    pub query: Option<String>,
}

/// An ordered, scored unit of retrieved text.
///
/// Owned exclusively by the retrieval pipeline from creation until it is
/// written to a [`crate::external::VectorStore`]; never mutated after that
/// point except by the scorer and the optional LLM enrichment pass (which
/// attach `summary`/`key_facts` before storage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier.
    pub chunk_id: Uuid,
    /// The chunk's text. Always non-empty and at least `min_chunk_size`
    /// long, except for synthetic fallback chunks.
    pub text: String,
    /// Provenance metadata.
    pub metadata: ChunkMetadata,
    /// Multi-dimensional score.
    pub score: Score,
    /// Confidence in `[0, 1]`, set by enrichment (default 0.8 when
    /// enrichment is disabled).
    pub confidence: f32,
    /// Optional LLM-generated summary, attached by enrichment.
    pub summary: Option<String>,
    /// Optional LLM-extracted key facts, attached by enrichment.
    pub key_facts: Vec<String>,
}

impl Chunk {
    /// Builds a new chunk, computing `char_count`/`word_count` from `text`
    /// if the caller didn't already set them on `metadata`.
    #[must_use]
    pub fn new(text: String, mut metadata: ChunkMetadata, score: Score) -> Self {
        metadata.char_count = text.chars().count();
        metadata.word_count = text.split_whitespace().count();
        Self {
            chunk_id: Uuid::new_v4(),
            text,
            metadata,
            score,
            confidence: 0.8,
            summary: None,
            key_facts: Vec::new(),
        }
    }

    /// A stable per-document identifier: the source file/URL if present,
    /// else a synthetic id derived from user + company + chunk position.
    /// Used by [`crate::tools::conflict_detector`] to group chunks by
    /// document.
    #[must_use]
    pub fn document_id(&self) -> String {
        match &self.metadata.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!(
                "{}:{}:{}",
                self.metadata.user_id, self.metadata.company, self.metadata.chunk_index
            ),
        }
    }

    /// Whether this chunk satisfies the minimum-length invariant.
    #[must_use]
    pub fn meets_min_length(&self, min_chunk_size: usize) -> bool {
        self.text.chars().count() >= min_chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ChunkMetadata {
        ChunkMetadata {
            url: Some("https://example.com/article".to_string()),
            source_kind: SourceOrigin::WebSearch,
            user_id: "u1".to_string(),
            company: "Acme Corp".to_string(),
            retrieved_at: "2026-01-01T00:00:00Z".to_string(),
            chunk_index: 0,
            total_chunks: 1,
            char_count: 0,
            word_count: 0,
            title: None,
            query: None,
        }
    }

    #[test]
    fn new_computes_counts_from_text() {
        let chunk = Chunk::new("hello world foo".to_string(), metadata(), Score::default());
        assert_eq!(chunk.metadata.word_count, 3);
        assert_eq!(chunk.metadata.char_count, 15);
        assert_eq!(chunk.confidence, 0.8);
    }

    #[test]
    fn document_id_prefers_url() {
        let chunk = Chunk::new("some text here".to_string(), metadata(), Score::default());
        assert_eq!(chunk.document_id(), "https://example.com/article");
    }

    #[test]
    fn document_id_falls_back_when_no_url() {
        let mut m = metadata();
        m.url = None;
        let chunk = Chunk::new("some text here".to_string(), m, Score::default());
        assert_eq!(chunk.document_id(), "u1:Acme Corp:0");
    }

    #[test]
    fn meets_min_length_respects_threshold() {
        let chunk = Chunk::new("short".to_string(), metadata(), Score::default());
        assert!(chunk.meets_min_length(3));
        assert!(!chunk.meets_min_length(200));
    }
}
