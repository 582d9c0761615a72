//! Trait interfaces for every external collaborator.
//!
//! Everything outside the core pipeline — auth, transport, document
//! extraction, PDF/email/voice delivery, concrete storage and model
//! backends — is represented here only as an abstract, `async_trait`-based
//! interface. The core never depends on a concrete implementation; tests
//! substitute in-memory fakes.

use async_trait::async_trait;

use crate::core::{AccountPlan, Chunk, Job, Session};
use crate::error::Result;

/// A single organic search result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Search-engine snippet, if provided.
    pub snippet: Option<String>,
}

/// Search-engine-results-page provider.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Runs a web search for `query`, returning up to `limit` results.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Retrieval`] with
    /// [`crate::error::RetrievalError::SearchExhausted`] when every retry
    /// attempt fails, or [`crate::error::Error::RateLimit`] when the
    /// provider throttles the request.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// Raw page content fetched from a URL, before preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    /// The URL that was fetched.
    pub url: String,
    /// Raw response body.
    pub content: String,
    /// Best-guess content kind, from the response's `Content-Type`.
    pub content_kind: crate::processing::ContentKind,
    /// Page title, if discoverable from headers or markup.
    pub title: Option<String>,
}

/// Per-URL page fetcher.
#[async_trait]
pub trait ScrapeApi: Send + Sync {
    /// Fetches `url`'s content.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Retrieval`] with
    /// [`crate::error::RetrievalError::ScrapeFailed`] after retries are
    /// exhausted.
    async fn scrape(&self, url: &str) -> Result<ScrapedPage>;
}

/// One chat completion request to the underlying model.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    /// System prompt.
    pub system: String,
    /// User message / prompt body.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// Large-language-model completion provider.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Runs one completion request and returns the raw text response.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::RateLimit`] on provider throttling,
    /// [`crate::error::Error::Truncated`] when the response hit
    /// `max_tokens` before completing, or [`crate::error::Error::SafetyBlocked`]
    /// when the provider's content filter intervened.
    async fn complete(&self, request: &LlmRequest) -> Result<String>;
}

/// A vector similarity match.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    /// Matched chunk identifier.
    pub chunk_id: uuid::Uuid,
    /// Cosine similarity in `[-1, 1]`.
    pub similarity: f32,
}

/// Pluggable embedding-indexed vector store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upserts a chunk's embedding under its `chunk_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn upsert(&self, chunk_id: uuid::Uuid, embedding: &[f32]) -> Result<()>;

    /// Finds the `limit` nearest neighbors of `query_embedding`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or times out.
    async fn query(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<VectorMatch>>;

    /// Looks up previously-stored chunks for `(user_id, company_name)`,
    /// independent of embedding similarity. Used to serve uploaded-document
    /// chunks already indexed for this user/company pair — both as a
    /// fallback when a fresh web search turns up nothing, and as an
    /// additive source alongside fresh results.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn find_by_metadata(&self, user_id: &str, company_name: &str) -> Result<Vec<Chunk>>;
}

/// Text embedding model.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embeds `text` into a fixed-dimension vector.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Persistence for completed and in-flight account plans.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Persists `plan` for `(user_id, company_name)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn save_plan(&self, user_id: &str, company_name: &str, plan: &AccountPlan) -> Result<()>;

    /// Loads the most recent plan for `(user_id, company_name)`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn load_plan(&self, user_id: &str, company_name: &str) -> Result<Option<AccountPlan>>;

    /// Records a job's lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn save_job(&self, job: &Job) -> Result<()>;

    /// Looks up a job by its dedup/cache key.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn find_job_by_query_hash(&self, query_hash: &str) -> Result<Option<Job>>;
}

/// Persistence for conversational session state.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Persists `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn save_session(&self, session: &Session) -> Result<()>;

    /// Loads a session by id, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn load_session(&self, session_id: &str) -> Result<Option<Session>>;
}
