//! Clean text → ordered sequence of overlapping chunks.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::PipelineConfig;
use crate::core::{Chunk, ChunkMetadata, Score, SourceOrigin};

/// Caller-supplied metadata applied to every chunk produced for one
/// document.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    /// Origin URL, if any.
    pub url: Option<String>,
    /// Page/document title, if known.
    pub title: Option<String>,
    /// Query that led to this retrieval, if applicable.
    pub query: Option<String>,
    /// Where the text came from.
    pub source_kind: SourceOrigin,
    /// Owning user.
    pub user_id: String,
    /// Company this text pertains to.
    pub company: String,
    /// ISO8601 retrieval timestamp.
    pub retrieved_at: String,
}

static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)(?<=[.!?])\s+").unwrap());

/// Splits on blank-line paragraph boundaries.
fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(std::string::ToString::to_string)
        .collect()
}

/// Splits on sentence terminators, preserving the terminator.
fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(std::string::ToString::to_string)
        .collect()
}

/// Finds the nearest UTF-8 char boundary at or before `pos`, then backs up
/// further to the last whitespace so the cut falls on a word boundary.
fn word_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    if pos == text.len() {
        return pos;
    }
    match text[..pos].rfind(char::is_whitespace) {
        Some(ws) if ws > 0 => ws,
        _ => pos,
    }
}

/// Fixed-width chunking with overlap, breaking at the last word boundary
/// within the window.
fn split_fixed_width(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        let target_end = (start + chunk_size).min(text.len());
        let end = if target_end >= text.len() {
            text.len()
        } else {
            let boundary = word_boundary(text, target_end);
            if boundary > start { boundary } else { target_end }
        };
        out.push(text[start..end].trim().to_string());
        if end >= text.len() {
            break;
        }
        let next_start = end.saturating_sub(chunk_overlap);
        start = if next_start > start { next_start } else { end };
    }
    out.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Applies `chunk_overlap` characters of the previous piece's tail as a
/// prefix to each subsequent piece, as the spec requires ("every chunk
/// carries forward overlap from the previous chunk's tail").
fn apply_overlap(pieces: Vec<String>, chunk_overlap: usize) -> Vec<String> {
    if chunk_overlap == 0 || pieces.len() < 2 {
        return pieces;
    }
    let mut out = Vec::with_capacity(pieces.len());
    let mut prev_tail = String::new();
    for piece in pieces {
        if prev_tail.is_empty() {
            out.push(piece.clone());
        } else {
            out.push(format!("{prev_tail} {piece}"));
        }
        let tail_start = piece.len().saturating_sub(chunk_overlap);
        let tail_start = {
            let mut t = tail_start;
            while t < piece.len() && !piece.is_char_boundary(t) {
                t += 1;
            }
            t
        };
        prev_tail = piece[tail_start..].to_string();
    }
    out
}

fn max_piece_len(pieces: &[String]) -> usize {
    pieces.iter().map(|p| p.chars().count()).max().unwrap_or(0)
}

/// Runs the chunking cascade: paragraph split, then sentence split, then
/// fixed-width-with-overlap, stopping at the first stage whose pieces are
/// all `<= 1.5 * chunk_size`.
fn cascade(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let limit = (chunk_size as f64 * 1.5) as usize;

    let paragraphs = split_paragraphs(text);
    if !paragraphs.is_empty() && max_piece_len(&paragraphs) <= limit {
        return apply_overlap(paragraphs, chunk_overlap);
    }

    let sentences = split_sentences(text);
    if !sentences.is_empty() && max_piece_len(&sentences) <= limit {
        return apply_overlap(sentences, chunk_overlap);
    }

    split_fixed_width(text, chunk_size, chunk_overlap)
}

/// Chunks `clean_text` into an ordered sequence of [`Chunk`]s per the
/// component design's cascade strategy. Chunks shorter than
/// `config.min_chunk_size` are discarded in the final filter.
#[must_use]
#[tracing::instrument(skip(clean_text, request, config), fields(company = request.company.as_str()))]
pub fn chunk_text(clean_text: &str, request: &ChunkRequest, config: &PipelineConfig) -> Vec<Chunk> {
    if clean_text.trim().is_empty() {
        return Vec::new();
    }

    let pieces = cascade(clean_text, config.chunk_size, config.chunk_overlap);
    let produced = pieces.len();
    let kept: Vec<String> = pieces
        .into_iter()
        .filter(|p| p.chars().count() >= config.min_chunk_size)
        .collect();

    let total = kept.len();
    tracing::debug!(produced, kept = total, min_chunk_size = config.min_chunk_size, "chunking complete");
    kept.into_iter()
        .enumerate()
        .map(|(index, text)| {
            let metadata = ChunkMetadata {
                url: request.url.clone(),
                source_kind: request.source_kind,
                user_id: request.user_id.clone(),
                company: request.company.clone(),
                retrieved_at: request.retrieved_at.clone(),
                chunk_index: index,
                total_chunks: total,
                char_count: 0,
                word_count: 0,
                title: request.title.clone(),
                query: request.query.clone(),
            };
            Chunk::new(text, metadata, Score::default())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChunkRequest {
        ChunkRequest {
            url: Some("https://example.com".to_string()),
            title: None,
            query: None,
            source_kind: SourceOrigin::WebSearch,
            user_id: "u1".to_string(),
            company: "Acme Corp".to_string(),
            retrieved_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn empty_text_produces_no_chunks() {
        let cfg = PipelineConfig::default();
        assert!(chunk_text("", &request(), &cfg).is_empty());
    }

    #[test]
    fn chunks_below_min_size_are_discarded() {
        let cfg = PipelineConfig::default().with_chunking(800, 100, 200);
        let chunks = chunk_text("short text", &request(), &cfg);
        assert!(chunks.is_empty());
    }

    #[test]
    fn paragraph_split_used_when_pieces_fit() {
        let cfg = PipelineConfig::default().with_chunking(800, 0, 50);
        let text = format!("{}\n\n{}", "Para one. ".repeat(20), "Para two. ".repeat(20));
        let chunks = chunk_text(&text, &request(), &cfg);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.chunk_index, 0);
        assert_eq!(chunks[0].metadata.total_chunks, 2);
    }

    #[test]
    fn fixed_width_fallback_for_one_giant_paragraph() {
        let cfg = PipelineConfig::default().with_chunking(100, 0, 20);
        let text = "word ".repeat(200);
        let chunks = chunk_text(&text, &request(), &cfg);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 150);
        }
    }

    #[test]
    fn overlap_zero_concatenation_is_prefix_of_input_modulo_whitespace() {
        let cfg = PipelineConfig::default().with_chunking(50, 0, 10);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi";
        let chunks = chunk_text(text, &request(), &cfg);
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
        let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(collapse(text).starts_with(&collapse(&joined)[..collapse(&joined).len().min(collapse(text).len())]));
    }

    #[test]
    fn chunks_tagged_with_index_and_total() {
        let cfg = PipelineConfig::default().with_chunking(800, 0, 5);
        let text = format!("{}\n\n{}\n\n{}", "First paragraph here. ".repeat(5), "Second one. ".repeat(5), "Third one. ".repeat(5));
        let chunks = chunk_text(&text, &request(), &cfg);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.metadata.chunk_index, i);
            assert_eq!(c.metadata.total_chunks, chunks.len());
        }
    }
}
