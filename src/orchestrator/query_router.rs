//! Request deduplication, caching, and job tracking for research queries.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::config::PipelineConfig;
use crate::core::{Job, JobStatus};
use crate::orchestrator::cache_manager::CacheManager;

const SCRIPT_INJECTION_MARKERS: &[&str] = &["<script", "javascript:", "onerror=", "onload="];

/// Outcome of routing one incoming request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The query failed validation.
    Invalid { reason: String },
    /// An identical request is already in flight.
    Duplicate { job_id: String },
    /// A cached result satisfied the request.
    Cached { result: serde_json::Value },
    /// A new job was created and should be executed.
    NewJob { job_id: String, query_hash: String },
}

/// Computes `sha256(lowercase(query) + ":" + lowercase(company) + ":" +
/// user_id)` as a hex string.
#[must_use]
pub fn query_hash(query: &str, company: &str, user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.to_lowercase());
    hasher.update(":");
    hasher.update(company.to_lowercase());
    hasher.update(":");
    hasher.update(user_id);
    format!("{:x}", hasher.finalize())
}

fn validate(query: &str, max_query_length: usize) -> Result<(), String> {
    if query.trim().is_empty() {
        return Err("query must not be empty".to_string());
    }
    if query.chars().count() > max_query_length {
        return Err(format!("query exceeds maximum length of {max_query_length} characters"));
    }
    let lower = query.to_lowercase();
    if SCRIPT_INJECTION_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return Err("query contains disallowed content".to_string());
    }
    Ok(())
}

/// Coordinates incoming research requests: validates, deduplicates via an
/// active-jobs map, and serves cached SERP results.
pub struct QueryRouter {
    config: PipelineConfig,
    cache: CacheManager,
    active_jobs: Mutex<HashMap<String, Job>>,
}

impl QueryRouter {
    /// Creates a router using `config`'s validation/cache tunables.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let cache = CacheManager::new(config.cache_max_size);
        Self {
            config,
            cache,
            active_jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Routes one request, returning the outcome to act on.
    pub async fn route(&self, query: &str, user_id: &str, company: &str, job_id: impl Into<String>, created_at: impl Into<String>) -> RouteOutcome {
        if let Err(reason) = validate(query, self.config.max_query_length) {
            return RouteOutcome::Invalid { reason };
        }

        let hash = query_hash(query, company, user_id);

        let mut jobs = self.active_jobs.lock().await;
        if let Some(existing) = jobs.values().find(|j| j.query_hash == hash && j.status != JobStatus::Completed && j.status != JobStatus::Failed) {
            tracing::debug!(job_id = existing.job_id.as_str(), "duplicate in-flight request");
            return RouteOutcome::Duplicate { job_id: existing.job_id.clone() };
        }
        drop(jobs);

        if let Some(cached) = self.cache.get(&format!("serp:{hash}")).await {
            tracing::debug!(query_hash = hash.as_str(), "serp cache hit");
            return RouteOutcome::Cached { result: cached };
        }

        let job = Job::new(job_id.into(), hash.clone(), user_id, company, created_at);
        let mut jobs = self.active_jobs.lock().await;
        jobs.insert(job.job_id.clone(), job.clone());
        RouteOutcome::NewJob { job_id: job.job_id, query_hash: hash }
    }

    /// Marks the job under `query_hash` completed and caches its result
    /// under `"serp:" + query_hash` using `config.serp_cache_ttl_hours`.
    pub async fn mark_complete(&self, query_hash: &str, result: serde_json::Value, completed_at: impl Into<String>) {
        let mut jobs = self.active_jobs.lock().await;
        if let Some(job) = jobs.values_mut().find(|j| j.query_hash == query_hash) {
            job.complete(result.clone(), completed_at);
        }
        drop(jobs);
        self.cache.set(format!("serp:{query_hash}"), result, self.config.serp_cache_ttl_hours * 3600).await;
    }

    /// Marks the job under `query_hash` failed.
    pub async fn mark_failed(&self, query_hash: &str, error: impl Into<String>, completed_at: impl Into<String>) {
        let mut jobs = self.active_jobs.lock().await;
        if let Some(job) = jobs.values_mut().find(|j| j.query_hash == query_hash) {
            job.fail(error, completed_at);
        }
    }

    /// Removes completed/failed jobs whose `completed_at` precedes the
    /// caller-computed cutoff (passed as an ISO8601 string comparable
    /// lexicographically, since timestamps are always UTC `YYYY-MM-DD...`).
    pub async fn cleanup_old_jobs(&self, cutoff: &str) {
        let mut jobs = self.active_jobs.lock().await;
        jobs.retain(|_, job| match (&job.status, &job.completed_at) {
            (JobStatus::Completed | JobStatus::Failed, Some(completed_at)) => completed_at.as_str() >= cutoff,
            _ => true,
        });
    }
}
