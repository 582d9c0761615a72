//! Jobs used for request deduplication and progress tracking.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Registered, not yet started.
    Queued,
    /// Currently executing.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

/// A tracked research request, owned exclusively by the
/// [`crate::orchestrator::query_router::QueryRouter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Stable job identifier.
    pub job_id: String,
    /// The request's dedup/cache key.
    pub query_hash: String,
    /// Requesting user.
    pub user_id: String,
    /// Company under research.
    pub company_name: String,
    /// Current status.
    pub status: JobStatus,
    /// ISO8601 creation timestamp.
    pub created_at: String,
    /// ISO8601 completion timestamp, once completed or failed.
    pub completed_at: Option<String>,
    /// Serialized result payload, once completed.
    pub result: Option<serde_json::Value>,
    /// Error message, if failed.
    pub error: Option<String>,
}

impl Job {
    /// Creates a freshly queued job.
    #[must_use]
    pub fn new(
        job_id: impl Into<String>,
        query_hash: impl Into<String>,
        user_id: impl Into<String>,
        company_name: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            query_hash: query_hash.into(),
            user_id: user_id.into(),
            company_name: company_name.into(),
            status: JobStatus::Queued,
            created_at: created_at.into(),
            completed_at: None,
            result: None,
            error: None,
        }
    }

    /// Marks the job completed with a result, recording `completed_at`.
    pub fn complete(&mut self, result: serde_json::Value, completed_at: impl Into<String>) {
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(completed_at.into());
    }

    /// Marks the job failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>, completed_at: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(completed_at.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_queued_with_no_result() {
        let job = Job::new("j1", "hash1", "u1", "Acme", "2026-01-01T00:00:00Z");
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result.is_none());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn complete_sets_status_and_result() {
        let mut job = Job::new("j1", "hash1", "u1", "Acme", "2026-01-01T00:00:00Z");
        job.complete(serde_json::json!({"ok": true}), "2026-01-01T00:01:00Z");
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, Some(serde_json::json!({"ok": true})));
        assert_eq!(job.completed_at.as_deref(), Some("2026-01-01T00:01:00Z"));
    }

    #[test]
    fn fail_sets_status_and_error() {
        let mut job = Job::new("j1", "hash1", "u1", "Acme", "2026-01-01T00:00:00Z");
        job.fail("serp exhausted", "2026-01-01T00:01:00Z");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("serp exhausted"));
    }
}
