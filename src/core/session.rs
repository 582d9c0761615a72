//! Per-session conversational and research state.

use serde::{Deserialize, Serialize};

use super::account_plan::AccountPlan;
use super::chunk::Chunk;
use super::conflict::Conflict;

/// A single turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// `"user"` or `"assistant"`.
    pub role: String,
    /// Message text.
    pub content: String,
    /// ISO8601 timestamp.
    pub timestamp: String,
}

/// Explicit state machine for a research workflow that has been suspended
/// pending user input, rather than an in-flight coroutine. The resumption
/// path reads from this persisted state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No workflow in progress.
    #[default]
    Idle,
    /// A research workflow is suspended awaiting a conflict-resolution
    /// decision from the user.
    AwaitingConflictDecision,
    /// A workflow is actively executing (not suspended on user input).
    Processing,
}

/// Per-session state: conversational history plus research-in-progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Stable session identifier.
    pub session_id: String,
    /// Owning user's identifier.
    pub user_id: String,
    /// Company currently under research, if any.
    pub company_name: Option<String>,
    /// Conversation history, in arrival order.
    pub messages: Vec<Message>,
    /// Chunks gathered so far for the current company.
    pub research_data: Vec<Chunk>,
    /// Conflicts detected in `research_data`.
    pub conflicts: Vec<Conflict>,
    /// The most recently generated or edited plan, if any.
    pub account_plan: Option<AccountPlan>,
    /// Current workflow state.
    pub agent_state: SessionState,
}

impl Session {
    /// Creates a fresh, empty session.
    #[must_use]
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            company_name: None,
            messages: Vec::new(),
            research_data: Vec::new(),
            conflicts: Vec::new(),
            account_plan: None,
            agent_state: SessionState::Idle,
        }
    }

    /// Appends a message, preserving arrival order.
    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>, timestamp: impl Into<String>) {
        self.messages.push(Message {
            role: role.into(),
            content: content.into(),
            timestamp: timestamp.into(),
        });
    }

    /// The last `limit` messages, in insertion order.
    #[must_use]
    pub fn recent_messages(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    /// Sets the company name, clearing prior research data and conflicts
    /// when it changes (the "new company" reset rule in the research
    /// workflow).
    pub fn set_company_name(&mut self, company_name: impl Into<String>) {
        let company_name = company_name.into();
        let changed = self
            .company_name
            .as_ref()
            .is_some_and(|prev| !prev.eq_ignore_ascii_case(&company_name));
        if changed {
            self.research_data.clear();
            self.conflicts.clear();
        }
        self.company_name = Some(company_name);
    }

    /// Replaces the account plan. Overwrites any previous plan wholesale.
    pub fn set_account_plan(&mut self, plan: AccountPlan) {
        self.account_plan = Some(plan);
    }
}
