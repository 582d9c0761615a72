//! Error types for the research pipeline.
//!
//! This module provides the error hierarchy using `thiserror` for every
//! subsystem: retrieval, LLM synthesis, storage collaborators, and request
//! orchestration.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error taxonomy, per the error handling design.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation failure on caller-provided input (empty query, oversized
    /// query, script-injection markers, empty raw content, etc). Always
    /// surfaced to the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transient upstream failure (SERP, scrape, LLM, vector store).
    /// Retried with backoff; on exhaustion the caller downgrades to a
    /// partial-result path.
    #[error("network error calling {endpoint}: {message}")]
    Network {
        /// Which collaborator failed (`"search"`, `"scrape"`, `"llm"`, `"vector_store"`).
        endpoint: &'static str,
        /// Underlying failure description.
        message: String,
    },

    /// Rate limited (HTTP 429 or equivalent). Distinguished from `Network`
    /// because the backoff schedule is longer and a three-strike circuit
    /// breaker applies.
    #[error("rate limited calling {endpoint}: {message}")]
    RateLimit {
        /// Which collaborator rate-limited the call.
        endpoint: &'static str,
        /// Underlying failure description.
        message: String,
        /// `Retry-After` hint in seconds, if the collaborator supplied one.
        retry_after_secs: Option<u64>,
    },

    /// The LLM returned `MAX_TOKENS` with insufficient content. Triggers a
    /// prompt-shrinking retry, then a fallback to section-specific default
    /// text.
    #[error("LLM response truncated (finish_reason=MAX_TOKENS)")]
    Truncated,

    /// The LLM refused the request (`finish_reason` SAFETY or RECITATION).
    /// No retry; the caller substitutes fallback text.
    #[error("LLM refused the request: {reason}")]
    SafetyBlocked {
        /// Raw finish_reason reported by the LLM.
        reason: String,
    },

    /// Vector store schema incompatibility. The caller attempts one reset
    /// to a fresh path; a second failure surfaces this error.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Missing API key or other misconfiguration. Surfaced immediately at
    /// startup, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Retrieval-pipeline specific errors that don't map onto a generic
    /// kind above.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Account-plan generation errors.
    #[error("plan generation error: {0}")]
    PlanGeneration(#[from] PlanGenerationError),
}

impl Error {
    /// Construct a [`Error::Network`] variant.
    #[must_use]
    pub fn network(endpoint: &'static str, message: impl Into<String>) -> Self {
        Self::Network {
            endpoint,
            message: message.into(),
        }
    }

    /// Construct a [`Error::RateLimit`] variant.
    #[must_use]
    pub fn rate_limit(endpoint: &'static str, message: impl Into<String>) -> Self {
        Self::RateLimit {
            endpoint,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// Whether this error should be retried by a generic caller, independent
    /// of the per-call policy described in the account-plan generator
    /// (those policies consult the variant directly for backoff timing).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimit { .. })
    }
}

/// Errors specific to the hybrid retrieval pipeline.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// SERP search exhausted its retry budget.
    #[error("SERP search failed after retries: {0}")]
    SearchExhausted(String),

    /// Scrape of a single URL failed; the pipeline falls back to the
    /// snippet, so this is informational rather than fatal.
    #[error("scrape failed for {url}: {reason}")]
    ScrapeFailed {
        /// URL that failed to scrape.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Enrichment batch could not be parsed as the expected JSON array
    /// shape.
    #[error("enrichment response was not a valid JSON array")]
    EnrichmentParseFailed,
}

/// Errors specific to account-plan generation.
#[derive(Error, Debug)]
pub enum PlanGenerationError {
    /// A section's LLM response could not be parsed into the section's
    /// expected shape (e.g. SWOT's four-key JSON object).
    #[error("section {section} returned malformed output: {reason}")]
    MalformedSection {
        /// Section key.
        section: String,
        /// Reason for the parse failure.
        reason: String,
    },

    /// The company name could not be determined from the message or any
    /// uploaded document; per the error design this is the only case in
    /// which a research workflow does not return an `AccountPlan`.
    #[error("company name could not be determined")]
    CompanyNameUnknown,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::network("io", err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption(format!("JSON (de)serialization failed: {err}"))
    }
}
