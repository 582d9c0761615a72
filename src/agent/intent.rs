//! Rule-based intent classification over a lowercased message and recent
//! session history.

use crate::core::Session;

/// The four workflows [`crate::agent::controller::AgentController::process`]
/// can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Mutate an existing account plan's section or a custom field.
    UpdateSection,
    /// Research a company and (re)generate its account plan.
    ResearchCompany,
    /// Resume a research workflow suspended on a conflict question.
    Clarify,
    /// Anything else: greetings, help, thanks, or free-form chat.
    General,
}

const ADD_CUES: &[&str] = &["add field", "add section", "add new field", "add new section", "add", "include", "insert field", "insert section"];
const REMOVE_CUES: &[&str] = &["remove field", "remove section", "delete field", "delete section", "remove", "delete", "drop field", "drop section"];
const EDIT_CUES: &[&str] = &["edit", "update", "change", "modify", "regenerate", "rewrite", "refresh"];
const FIELD_NAME_CUES: &[&str] = &["ceo", "cto", "revenue", "field", "section", "company"];

const RESEARCH_CUES: &[&str] = &["research", "analyze", "company", "find", "generate", "create"];
const UPLOAD_REFERENCE_CUES: &[&str] = &["uploaded", "pdf", "document", "file", "refer"];

const CLARIFY_CUES: &[&str] = &["yes", "no", "clarify", "answer", "continue", "go with", "prioritize"];
const SHORT_AFFIRMATION_MAX_WORDS: usize = 6;

/// Classifies `message` against `session`'s current state, following the
/// four-rung ladder: update-section (only when a plan already exists) →
/// research → clarify (only right after a conflict question) → general.
#[must_use]
pub fn classify(message: &str, session: Option<&Session>, has_uploaded_documents: bool) -> Intent {
    let message_lower = message.to_lowercase();

    if let Some(session) = session {
        if session.account_plan.is_some() {
            let mentions_field = FIELD_NAME_CUES.iter().any(|cue| message_lower.contains(cue));
            if ADD_CUES.iter().any(|cue| message_lower.contains(cue)) && mentions_field {
                return Intent::UpdateSection;
            }
            if REMOVE_CUES.iter().any(|cue| message_lower.contains(cue)) {
                return Intent::UpdateSection;
            }
            if EDIT_CUES.iter().any(|cue| message_lower.contains(cue)) {
                return Intent::UpdateSection;
            }
        }

        if session.agent_state == crate::core::SessionState::AwaitingConflictDecision {
            let word_count = message_lower.split_whitespace().count();
            if word_count <= SHORT_AFFIRMATION_MAX_WORDS && CLARIFY_CUES.iter().any(|cue| message_lower.contains(cue)) {
                return Intent::Clarify;
            }
        }
    }

    if has_uploaded_documents && UPLOAD_REFERENCE_CUES.iter().any(|cue| message_lower.contains(cue)) {
        return Intent::ResearchCompany;
    }

    if RESEARCH_CUES.iter().any(|cue| message_lower.contains(cue)) {
        return Intent::ResearchCompany;
    }

    Intent::General
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AccountPlan, SessionState};

    fn session_with_plan() -> Session {
        let mut session = Session::new("s1", "u1");
        session.account_plan = Some(AccountPlan::fallback("Acme Corp", "2026-01-01T00:00:00Z"));
        session
    }

    #[test]
    fn update_cue_with_existing_plan_is_update_section() {
        let session = session_with_plan();
        assert_eq!(classify("update the key insights section", Some(&session), false), Intent::UpdateSection);
    }

    #[test]
    fn update_cue_without_plan_falls_through() {
        let session = Session::new("s1", "u1");
        assert_ne!(classify("update the key insights section", Some(&session), false), Intent::UpdateSection);
    }

    #[test]
    fn research_cue_is_research_company() {
        assert_eq!(classify("please research Acme Corp", None, false), Intent::ResearchCompany);
    }

    #[test]
    fn upload_reference_with_uploads_present_is_research() {
        assert_eq!(classify("use the uploaded document", None, true), Intent::ResearchCompany);
    }

    #[test]
    fn short_affirmation_after_conflict_question_is_clarify() {
        let mut session = session_with_plan();
        session.agent_state = SessionState::AwaitingConflictDecision;
        assert_eq!(classify("yes continue", Some(&session), false), Intent::Clarify);
    }

    #[test]
    fn unrelated_message_is_general() {
        assert_eq!(classify("hello there", None, false), Intent::General);
    }

    #[test]
    fn add_cue_without_field_keyword_does_not_trigger_update() {
        let session = session_with_plan();
        assert_ne!(classify("add some spice to dinner", Some(&session), false), Intent::UpdateSection);
    }
}
