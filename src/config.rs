//! Pipeline-wide configuration.
//!
//! One [`PipelineConfig`] is constructed at startup and threaded by
//! reference through every component, rather than each module hardcoding
//! its own constants.

use serde::{Deserialize, Serialize};

/// Retry policy for one external collaborator kind. Retry semantics vary by
/// failure kind (network vs. rate-limit vs. truncation), so each policy is
/// independent rather than a single global wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retry attempts (not counting the initial attempt).
    pub max_retries: u32,
    /// Base backoff in milliseconds; attempt `n` waits `base * 2^n`.
    pub base_backoff_ms: u64,
}

impl RetryPolicy {
    /// The backoff duration before retry attempt `attempt` (0-based).
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> std::time::Duration {
        std::time::Duration::from_millis(self.base_backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

/// Every tunable named across the component design, collected in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Preprocessor: minimum post-normalization text length to keep.
    pub min_text_length: usize,
    /// Preprocessor: maximum text length to retain.
    pub max_text_length: usize,

    /// Chunker: target chunk size in characters.
    pub chunk_size: usize,
    /// Chunker: overlap carried from the previous chunk's tail.
    pub chunk_overlap: usize,
    /// Chunker: chunks shorter than this are discarded.
    pub min_chunk_size: usize,

    /// Scorer: chunks scoring below this are dropped post-scoring.
    pub min_score: f32,

    /// RetrievalPipeline: number of top SERP results to deep-scrape.
    pub top_k_scrape: usize,
    /// RetrievalPipeline: LLM enrichment batch size.
    pub enrichment_batch_size: usize,
    /// RetrievalPipeline: consecutive LLM failures before enrichment is
    /// disabled for the remainder of the session.
    pub enrichment_circuit_breaker_threshold: u32,

    /// Retry policy for SERP search.
    pub search_retry: RetryPolicy,
    /// Retry policy for per-URL scraping.
    pub scrape_retry: RetryPolicy,
    /// Retry policy for LLM rate-limit responses.
    pub llm_rate_limit_retry: RetryPolicy,
    /// Retry policy for LLM timeouts.
    pub llm_timeout_retry: RetryPolicy,

    /// Timeout for SERP search calls, in seconds.
    pub search_timeout_secs: u64,
    /// Timeout for scrape calls, in seconds.
    pub scrape_timeout_secs: u64,
    /// Timeout for LLM calls, in seconds.
    pub llm_timeout_secs: u64,
    /// Timeout for vector-store queries, in seconds.
    pub vector_query_timeout_secs: u64,

    /// CacheManager: maximum entries before eviction.
    pub cache_max_size: usize,
    /// CacheManager / QueryRouter: default SERP cache TTL in hours.
    pub serp_cache_ttl_hours: u64,

    /// QueryRouter: maximum accepted query length in characters.
    pub max_query_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_length: 100,
            max_text_length: 50_000,

            chunk_size: 800,
            chunk_overlap: 100,
            min_chunk_size: 200,

            min_score: 0.3,

            top_k_scrape: 5,
            enrichment_batch_size: 3,
            enrichment_circuit_breaker_threshold: 3,

            search_retry: RetryPolicy {
                max_retries: 3,
                base_backoff_ms: 2000,
            },
            scrape_retry: RetryPolicy {
                max_retries: 2,
                base_backoff_ms: 2000,
            },
            llm_rate_limit_retry: RetryPolicy {
                max_retries: 3,
                base_backoff_ms: 2000,
            },
            llm_timeout_retry: RetryPolicy {
                max_retries: 2,
                base_backoff_ms: 2000,
            },

            search_timeout_secs: 30,
            scrape_timeout_secs: 30,
            llm_timeout_secs: 120,
            vector_query_timeout_secs: 10,

            cache_max_size: 10_000,
            serp_cache_ttl_hours: 3,

            max_query_length: 1000,
        }
    }
}

impl PipelineConfig {
    /// Overrides `chunk_size`/`chunk_overlap`/`min_chunk_size`.
    #[must_use]
    pub const fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self.min_chunk_size = min_chunk_size;
        self
    }

    /// Overrides the minimum post-scoring threshold.
    #[must_use]
    pub const fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Overrides the SERP cache TTL, in hours.
    #[must_use]
    pub const fn with_serp_cache_ttl_hours(mut self, hours: u64) -> Self {
        self.serp_cache_ttl_hours = hours;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_numbers() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.chunk_size, 800);
        assert_eq!(cfg.chunk_overlap, 100);
        assert_eq!(cfg.min_chunk_size, 200);
        assert!((cfg.min_score - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.top_k_scrape, 5);
        assert_eq!(cfg.enrichment_batch_size, 3);
        assert_eq!(cfg.serp_cache_ttl_hours, 3);
        assert_eq!(cfg.cache_max_size, 10_000);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let cfg = PipelineConfig::default().with_chunking(400, 50, 100).with_min_score(0.5);
        assert_eq!(cfg.chunk_size, 400);
        assert!((cfg.min_score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_backoff_ms: 2000,
        };
        assert_eq!(policy.backoff_for_attempt(0).as_millis(), 2000);
        assert_eq!(policy.backoff_for_attempt(1).as_millis(), 4000);
        assert_eq!(policy.backoff_for_attempt(2).as_millis(), 8000);
    }
}
