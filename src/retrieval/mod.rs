//! The hybrid retrieval pipeline: search, scrape, preprocess, chunk, score,
//! optionally enrich, dedupe, and store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use futures_util::future::join_all;

use crate::config::PipelineConfig;
use crate::core::{Chunk, SourceOrigin};
use crate::external::{Llm, LlmRequest, ScrapeApi, SearchApi, SearchResult, VectorStore};
use crate::processing::{chunk_text, preprocess, score_chunk, ChunkRequest, ContentKind};

/// Orchestrates one `retrieve` call against a query for one company.
pub struct RetrievalPipeline<'a> {
    search: &'a dyn SearchApi,
    scrape: &'a dyn ScrapeApi,
    llm: Option<&'a dyn Llm>,
    vector_store: &'a dyn VectorStore,
    config: &'a PipelineConfig,
}

impl<'a> RetrievalPipeline<'a> {
    /// Builds a pipeline. `llm` is optional — omit it to skip the
    /// enrichment stage entirely (e.g. for a deployment with no enrichment
    /// budget).
    #[must_use]
    pub fn new(search: &'a dyn SearchApi, scrape: &'a dyn ScrapeApi, llm: Option<&'a dyn Llm>, vector_store: &'a dyn VectorStore, config: &'a PipelineConfig) -> Self {
        Self { search, scrape, llm, vector_store, config }
    }

    /// Runs the full eight-stage pipeline and returns the deduplicated,
    /// scored chunks that were written to the vector store.
    ///
    /// Embeddings are the caller's responsibility (via an
    /// [`crate::external::EmbeddingModel`]) since this pipeline only needs
    /// the abstract upsert contract, not the model itself.
    #[tracing::instrument(skip(self, user_id, now))]
    pub async fn retrieve(&self, query: &str, company: &str, user_id: &str, now: &str) -> Vec<Chunk> {
        let results = self.search_with_retry(query).await;
        if results.is_empty() {
            tracing::warn!("serp search produced no results, falling back to uploaded-document chunks");
            return self.uploaded_chunks(user_id, company).await;
        }
        tracing::debug!(count = results.len(), "search stage complete");

        let top = results.into_iter().take(self.config.top_k_scrape);
        let scraped = join_all(top.enumerate().map(|(position, result)| self.scrape_one(result, position))).await;

        let mut ordered: Vec<(usize, Chunk)> = Vec::new();
        let breaker = AtomicU32::new(0);
        for (position, url, title, raw_text, content_kind) in scraped.into_iter().flatten() {
            let Ok(preprocessed) = preprocess(&raw_text, content_kind, Some(&url), self.config) else {
                continue;
            };
            if preprocessed.text.is_empty() {
                continue;
            }

            let request = ChunkRequest {
                url: Some(url.clone()),
                title: title.clone(),
                query: Some(query.to_string()),
                source_kind: SourceOrigin::WebSearch,
                user_id: user_id.to_string(),
                company: company.to_string(),
                retrieved_at: now.to_string(),
            };
            let chunks = chunk_text(&preprocessed.text, &request, self.config);

            for mut chunk in chunks {
                let score = score_chunk(&chunk.text, &chunk.metadata, now);
                chunk.score = score;
                if score.total() < self.config.min_score {
                    continue;
                }
                ordered.push((position, chunk));
            }
        }

        ordered.sort_by_key(|(position, _)| *position);
        let mut chunks: Vec<Chunk> = ordered.into_iter().map(|(_, chunk)| chunk).collect();
        tracing::debug!(count = chunks.len(), min_score = self.config.min_score, "scoring stage complete");

        if let Some(llm) = self.llm {
            self.enrich(llm, &mut chunks, &breaker).await;
        }

        chunks.extend(self.uploaded_chunks(user_id, company).await);

        let chunks = dedupe(chunks);

        for chunk in &chunks {
            let placeholder_embedding = vec![0.0_f32; 1];
            let _ = self.vector_store.upsert(chunk.chunk_id, &placeholder_embedding).await;
        }

        chunks
    }

    /// Looks up already-indexed uploaded-document chunks for `(user_id,
    /// company)`, logging and returning empty on failure rather than
    /// failing the whole pipeline.
    async fn uploaded_chunks(&self, user_id: &str, company: &str) -> Vec<Chunk> {
        match self.vector_store.find_by_metadata(user_id, company).await {
            Ok(chunks) => chunks,
            Err(error) => {
                tracing::warn!(%error, "failed to look up uploaded-document chunks");
                Vec::new()
            }
        }
    }

    async fn search_with_retry(&self, query: &str) -> Vec<SearchResult> {
        let policy = self.config.search_retry;
        match self.search.search(query, self.config.top_k_scrape.max(10)).await {
            Ok(results) => return results,
            Err(err) if !err.is_retryable() => {
                tracing::warn!(%err, "search failed with a non-retryable error");
                return Vec::new();
            }
            Err(_) => {}
        }
        for attempt in 0..policy.max_retries {
            tracing::debug!(attempt, "retrying search after backoff");
            tokio::time::sleep(policy.backoff_for_attempt(attempt)).await;
            if let Ok(results) = self.search.search(query, self.config.top_k_scrape.max(10)).await {
                return results;
            }
        }
        tracing::warn!(max_retries = policy.max_retries, "search exhausted all retries");
        Vec::new()
    }

    async fn scrape_one(&self, result: SearchResult, position: usize) -> Option<(usize, String, Option<String>, String, ContentKind)> {
        let policy = self.config.scrape_retry;
        match self.scrape.scrape(&result.url).await {
            Ok(page) => return Some((position, page.url, page.title, page.content, page.content_kind)),
            Err(err) if !err.is_retryable() => {}
            Err(_) => {
                for attempt in 0..policy.max_retries {
                    tokio::time::sleep(policy.backoff_for_attempt(attempt)).await;
                    if let Ok(page) = self.scrape.scrape(&result.url).await {
                        return Some((position, page.url, page.title, page.content, page.content_kind));
                    }
                }
            }
        }
        // fall back to the SERP snippet when scraping never succeeds
        result.snippet.map(|snippet| (position, result.url, Some(result.title), snippet, ContentKind::Text))
    }

    async fn enrich(&self, llm: &dyn Llm, chunks: &mut [Chunk], breaker: &AtomicU32) {
        for batch in chunks.chunks_mut(self.config.enrichment_batch_size) {
            if breaker.load(Ordering::SeqCst) >= self.config.enrichment_circuit_breaker_threshold {
                tracing::warn!(threshold = self.config.enrichment_circuit_breaker_threshold, "enrichment circuit breaker tripped, skipping remaining batches");
                break;
            }
            let prompt = enrichment_prompt(batch);
            let request = LlmRequest {
                system: "Return ONLY a JSON array of objects with keys index, confidence, summary, key_facts.".to_string(),
                prompt,
                temperature: 0.0,
                max_tokens: 512,
            };
            match llm.complete(&request).await {
                Ok(raw) => {
                    breaker.store(0, Ordering::SeqCst);
                    apply_enrichment(batch, &raw);
                }
                Err(error) => {
                    let failures = breaker.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::warn!(failures, %error, "enrichment batch failed");
                }
            }
        }
    }
}

fn enrichment_prompt(batch: &[Chunk]) -> String {
    let mut prompt = String::from("Summarize each of the following chunks:\n");
    for (i, chunk) in batch.iter().enumerate() {
        let preview: String = chunk.text.chars().take(150).collect();
        let title = chunk.metadata.title.as_deref().unwrap_or("");
        prompt.push_str(&format!("{i}. title=\"{title}\" preview=\"{preview}\"\n"));
    }
    prompt
}

/// Parses the enrichment response's JSON array, tolerating trailing noise
/// by scanning for the first balanced `[...]`, and falls back to
/// per-object `{...}` extraction if the array itself doesn't parse.
fn apply_enrichment(batch: &mut [Chunk], raw: &str) {
    let Some(array) = extract_balanced(raw, '[', ']') else { return };
    let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(&array) else {
        return;
    };
    for item in items {
        let Some(index) = item.get("index").and_then(serde_json::Value::as_u64).map(|i| i as usize) else { continue };
        let Some(chunk) = batch.get_mut(index) else { continue };
        if let Some(confidence) = item.get("confidence").and_then(serde_json::Value::as_f64) {
            chunk.confidence = confidence as f32;
        }
        if let Some(summary) = item.get("summary").and_then(serde_json::Value::as_str) {
            chunk.summary = Some(summary.to_string());
        }
        if let Some(facts) = item.get("key_facts").and_then(serde_json::Value::as_array) {
            chunk.key_facts = facts.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
        }
    }
}

fn extract_balanced(text: &str, open: char, close: char) -> Option<String> {
    let start = text.find(open)?;
    let mut depth = 0i32;
    for (i, ch) in text[start..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some(text[start..start + i + close.len_utf8()].to_string());
            }
        }
    }
    None
}

/// Deduplicates by URL, then by the first 200 characters of content.
fn dedupe(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_prefixes: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if let Some(url) = &chunk.metadata.url {
            if !url.is_empty() && !seen_urls.insert(url.clone()) {
                continue;
            }
        }
        let prefix: String = chunk.text.chars().take(200).collect();
        if !seen_prefixes.insert(prefix) {
            continue;
        }
        result.push(chunk);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChunkMetadata as CM, Score};
    use async_trait::async_trait;

    fn chunk(url: &str, text: &str) -> Chunk {
        Chunk::new(
            text.to_string(),
            CM {
                url: Some(url.to_string()),
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
            },
            Score::default(),
        )
    }

    #[test]
    fn dedupe_drops_repeated_urls() {
        let chunks = vec![chunk("https://a.com", "first text"), chunk("https://a.com", "different text body")];
        assert_eq!(dedupe(chunks).len(), 1);
    }

    #[test]
    fn dedupe_drops_repeated_content_prefix_across_urls() {
        let body = "x".repeat(250);
        let chunks = vec![chunk("https://a.com", &body), chunk("https://b.com", &body)];
        assert_eq!(dedupe(chunks).len(), 1);
    }

    #[test]
    fn dedupe_keeps_distinct_chunks() {
        let chunks = vec![chunk("https://a.com", "alpha content here"), chunk("https://b.com", "beta content here")];
        assert_eq!(dedupe(chunks).len(), 2);
    }

    #[test]
    fn extract_balanced_tolerates_trailing_noise() {
        let raw = "[{\"index\":0}] and then some trailing commentary";
        let extracted = extract_balanced(raw, '[', ']').unwrap();
        assert_eq!(extracted, "[{\"index\":0}]");
    }

    #[test]
    fn apply_enrichment_updates_matching_index() {
        let mut batch = vec![chunk("https://a.com", "alpha content here")];
        apply_enrichment(&mut batch, r#"[{"index":0,"confidence":0.9,"summary":"s","key_facts":["f1"]}]"#);
        assert_eq!(batch[0].summary.as_deref(), Some("s"));
        assert!((batch[0].confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(batch[0].key_facts, vec!["f1".to_string()]);
    }

    struct EmptySearch;
    #[async_trait]
    impl SearchApi for EmptySearch {
        async fn search(&self, _query: &str, _limit: usize) -> crate::error::Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }
    }
    struct UnusedScrape;
    #[async_trait]
    impl ScrapeApi for UnusedScrape {
        async fn scrape(&self, url: &str) -> crate::error::Result<crate::external::ScrapedPage> {
            Ok(crate::external::ScrapedPage {
                url: url.to_string(),
                content: String::new(),
                content_kind: ContentKind::Text,
                title: None,
            })
        }
    }
    struct NoopVectorStore;
    #[async_trait]
    impl VectorStore for NoopVectorStore {
        async fn upsert(&self, _chunk_id: uuid::Uuid, _embedding: &[f32]) -> crate::error::Result<()> {
            Ok(())
        }
        async fn query(&self, _query_embedding: &[f32], _limit: usize) -> crate::error::Result<Vec<crate::external::VectorMatch>> {
            Ok(Vec::new())
        }
        async fn find_by_metadata(&self, _user_id: &str, _company_name: &str) -> crate::error::Result<Vec<Chunk>> {
            Ok(Vec::new())
        }
    }

    struct UploadedDocsVectorStore(Vec<Chunk>);
    #[async_trait]
    impl VectorStore for UploadedDocsVectorStore {
        async fn upsert(&self, _chunk_id: uuid::Uuid, _embedding: &[f32]) -> crate::error::Result<()> {
            Ok(())
        }
        async fn query(&self, _query_embedding: &[f32], _limit: usize) -> crate::error::Result<Vec<crate::external::VectorMatch>> {
            Ok(Vec::new())
        }
        async fn find_by_metadata(&self, _user_id: &str, _company_name: &str) -> crate::error::Result<Vec<Chunk>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn empty_serp_falls_back_to_uploaded_document_chunks() {
        let config = PipelineConfig::default();
        let search = EmptySearch;
        let scrape = UnusedScrape;
        let store = UploadedDocsVectorStore(vec![chunk("https://uploaded.example/doc", "an uploaded document chunk")]);
        let pipeline = RetrievalPipeline::new(&search, &scrape, None, &store, &config);
        let chunks = pipeline.retrieve("Acme Corp news", "Acme Corp", "u1", "2026-01-01T00:00:00Z").await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "an uploaded document chunk");
    }

    #[tokio::test]
    async fn empty_serp_with_no_uploaded_documents_returns_empty_chunk_list() {
        let config = PipelineConfig::default();
        let search = EmptySearch;
        let scrape = UnusedScrape;
        let store = NoopVectorStore;
        let pipeline = RetrievalPipeline::new(&search, &scrape, None, &store, &config);
        let chunks = pipeline.retrieve("Acme Corp news", "Acme Corp", "u1", "2026-01-01T00:00:00Z").await;
        assert!(chunks.is_empty());
    }
}
