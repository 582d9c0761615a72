//! In-process working memory: `session_id → Session`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::{Chunk, Conflict, Message, Session, SessionState};

/// Maps session ids to their [`Session`], each guarded by its own mutex so
/// concurrent turns across distinct sessions don't contend on a single lock.
#[derive(Default)]
pub struct SessionMemory {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionMemory {
    /// An empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for `user_id`, using `session_id` if given, else a
    /// fresh UUID. Returns the final session id.
    pub async fn create(&self, session_id: Option<String>, user_id: &str) -> String {
        let id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let session = Session::new(id.clone(), user_id.to_string());
        self.sessions.lock().await.insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    /// Returns the per-session handle, creating one transparently if the
    /// id isn't known yet (e.g. a client-supplied session id).
    async fn handle(&self, session_id: &str, user_id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(session_id.to_string(), user_id.to_string()))))
            .clone()
    }

    /// A snapshot copy of the session, if it exists.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(session_id) {
            Some(handle.lock().await.clone())
        } else {
            None
        }
    }

    /// Appends a message to the session's history.
    pub async fn add_message(&self, session_id: &str, user_id: &str, role: impl Into<String>, content: impl Into<String>, timestamp: impl Into<String>) {
        let handle = self.handle(session_id, user_id).await;
        handle.lock().await.add_message(role, content, timestamp);
    }

    /// Sets the session's active company name, clearing stale research
    /// data per [`Session::set_company_name`]'s rules.
    pub async fn set_company_name(&self, session_id: &str, user_id: &str, company_name: impl Into<String>) {
        let handle = self.handle(session_id, user_id).await;
        handle.lock().await.set_company_name(company_name);
    }

    /// Overwrites the session's generated account plan.
    pub async fn set_account_plan(&self, session_id: &str, user_id: &str, plan: crate::core::AccountPlan) {
        let handle = self.handle(session_id, user_id).await;
        handle.lock().await.set_account_plan(plan);
    }

    /// Appends a conflict to the session.
    pub async fn add_conflict(&self, session_id: &str, user_id: &str, conflict: Conflict) {
        let handle = self.handle(session_id, user_id).await;
        handle.lock().await.conflicts.push(conflict);
    }

    /// Appends retrieved chunks to the session's accumulated research data.
    pub async fn add_research_data(&self, session_id: &str, user_id: &str, chunks: Vec<Chunk>) {
        let handle = self.handle(session_id, user_id).await;
        handle.lock().await.research_data.extend(chunks);
    }

    /// Sets the session's agent state (e.g. awaiting a conflict decision).
    pub async fn set_agent_state(&self, session_id: &str, user_id: &str, state: SessionState) {
        let handle = self.handle(session_id, user_id).await;
        handle.lock().await.agent_state = state;
    }

    /// The last `limit` messages, in insertion order.
    pub async fn get_history(&self, session_id: &str, limit: usize) -> Vec<Message> {
        let sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(handle) => handle.lock().await.recent_messages(limit).to_vec(),
            None => Vec::new(),
        }
    }
}
