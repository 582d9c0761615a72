//! [`AgentController`]: the single entrypoint that classifies intent and
//! dispatches to the research, update-section, clarify, or general
//! workflow.

use crate::agent::company_name::{extract_from_document_text, extract_from_message};
use crate::agent::intent::{classify, Intent};
use crate::agent::sections::{is_text_section, resolve_field_keyword, resolve_section_alias};
use crate::config::PipelineConfig;
use crate::core::{AccountPlan, Conflict, Session, SessionState, Severity, SourceKind, SourceReference};
use crate::external::{Llm, ScrapeApi, SearchApi, VectorStore};
use crate::llm::generate_account_plan;
use crate::orchestrator::SessionMemory;
use crate::retrieval::RetrievalPipeline;
use crate::tools::{detect_conflicts, extract_entities};

const SKIP_CONFLICT_CUES: &[&str] = &["without conflicts", "skip conflicts", "ignore conflicts", "no conflicts", "proceed without"];
const DEEP_CHECK_CUES: &[&str] = &["cross-check", "deeply", "verify", "proceed", "continue", "go ahead"];
const REGENERATE_PLAN_CUES: &[&str] = &["regenerate account plan", "regenerate the account plan", "regenerate plan", "regenerate the plan again"];
const MAX_PRESENTED_CONFLICTS: usize = 3;

const GREETING_CUES: &[&str] = &["hello", "hi", "hey", "greetings", "good morning", "good afternoon", "good evening", "howdy", "sup", "what's up"];
const HELP_CUES: &[&str] = &["what can you do", "what do you do", "how can you help", "who are you", "what is your purpose", "help me", "what capabilities"];
const THANKS_CUES: &[&str] = &["thank you", "thanks", "appreciate", "grateful", "thx"];

/// The result of one [`AgentController::process`] call.
#[derive(Debug, Clone, Default)]
pub struct AgentResponse {
    /// Conversational text to show the user.
    pub response: String,
    /// The plan as it stands after this turn, if any exists.
    pub account_plan: Option<AccountPlan>,
    /// Clarifying questions the caller should surface, if the workflow is
    /// suspended awaiting input.
    pub questions: Vec<String>,
}

/// Ties together retrieval, conflict detection, plan generation, and
/// session state behind one `process` call.
pub struct AgentController<'a> {
    session_memory: &'a SessionMemory,
    search: &'a dyn SearchApi,
    scrape: &'a dyn ScrapeApi,
    llm: &'a dyn Llm,
    vector_store: &'a dyn VectorStore,
    config: &'a PipelineConfig,
}

impl<'a> AgentController<'a> {
    /// Builds a controller over its external collaborators.
    #[must_use]
    pub fn new(session_memory: &'a SessionMemory, search: &'a dyn SearchApi, scrape: &'a dyn ScrapeApi, llm: &'a dyn Llm, vector_store: &'a dyn VectorStore, config: &'a PipelineConfig) -> Self {
        Self { session_memory, search, scrape, llm, vector_store, config }
    }

    /// The single entrypoint: classifies `message`'s intent against
    /// `session_id`'s current state and dispatches to the matching
    /// workflow.
    #[tracing::instrument(skip(self, message, now), fields(session_id))]
    pub async fn process(&self, message: &str, session_id: &str, user_id: &str, now: &str, has_uploaded_documents: bool) -> AgentResponse {
        self.session_memory.add_message(session_id, user_id, "user", message, now).await;
        let session = self.session_memory.get(session_id).await;

        let intent = classify(message, session.as_ref(), has_uploaded_documents);
        let response = match intent {
            Intent::UpdateSection => self.update_section_workflow(message, session_id, user_id, now).await,
            Intent::ResearchCompany => self.research_workflow(message, session_id, user_id, now).await,
            Intent::Clarify => self.clarify_workflow(session_id, user_id, now).await,
            Intent::General => self.general_workflow(message),
        };

        self.session_memory.add_message(session_id, user_id, "assistant", &response.response, now).await;
        response
    }

    async fn research_workflow(&self, message: &str, session_id: &str, user_id: &str, now: &str) -> AgentResponse {
        let session = self.session_memory.get(session_id).await;

        let company_name = extract_from_message(message).or_else(|| {
            session
                .as_ref()
                .and_then(|s| s.research_data.first())
                .map(|chunk| chunk.text.as_str())
                .and_then(extract_from_document_text)
        });

        let Some(company_name) = company_name else {
            return AgentResponse {
                response: "I need to know which company you'd like me to research. Please provide the company name.".to_string(),
                account_plan: session.and_then(|s| s.account_plan),
                questions: vec!["Which company would you like me to research?".to_string()],
            };
        };

        self.session_memory.set_company_name(session_id, user_id, &company_name).await;

        let pipeline = RetrievalPipeline::new(self.search, self.scrape, Some(self.llm), self.vector_store, self.config);
        let research_query = format!("{company_name} company overview news");
        let chunks = pipeline.retrieve(&research_query, &company_name, user_id, now).await;
        self.session_memory.add_research_data(session_id, user_id, chunks).await;

        let session = self.session_memory.get(session_id).await.unwrap_or_else(|| Session::new(session_id, user_id));
        let recent_text: String = session.recent_messages(3).iter().map(|m| m.content.to_lowercase()).collect::<Vec<_>>().join(" ");
        let skip_conflicts = SKIP_CONFLICT_CUES.iter().any(|cue| recent_text.contains(cue));
        let all_uploaded = !session.research_data.is_empty() && session.research_data.iter().all(|c| c.metadata.source_kind == crate::core::SourceOrigin::UploadedDocument);

        let conflicts = if skip_conflicts || all_uploaded {
            Vec::new()
        } else {
            detect_conflicts(&session.research_data)
        };

        let user_wants_deep_check = DEEP_CHECK_CUES.iter().any(|cue| recent_text.contains(cue));
        if !conflicts.is_empty() && !user_wants_deep_check && !skip_conflicts {
            let high_severity: Vec<&Conflict> = conflicts.iter().filter(|c| c.severity == Severity::High).take(MAX_PRESENTED_CONFLICTS).collect();
            if !high_severity.is_empty() {
                tracing::info!(company = company_name.as_str(), count = high_severity.len(), "conflicts detected, suspending for user decision");
                for conflict in &high_severity {
                    self.session_memory.add_conflict(session_id, user_id, (*conflict).clone()).await;
                }
                self.session_memory.set_agent_state(session_id, user_id, SessionState::AwaitingConflictDecision).await;

                let questions: Vec<String> = high_severity
                    .iter()
                    .map(|c| format!("I'm finding conflicting information about {:?}: {}. Dig deeper, proceed, or skip conflicts?", c.topic, c.conflicting_values.join(" vs. ")))
                    .collect();
                return AgentResponse {
                    response: questions.join("\n\n---\n\n"),
                    account_plan: None,
                    questions,
                };
            }
        }

        self.finish_research(&company_name, session_id, user_id, now).await
    }

    async fn finish_research(&self, company_name: &str, session_id: &str, user_id: &str, now: &str) -> AgentResponse {
        let Some(session) = self.session_memory.get(session_id).await else {
            return AgentResponse::default();
        };
        let relevant_chunks: Vec<_> = session.research_data.iter().filter(|c| c.text.to_lowercase().contains(&company_name.to_lowercase())).cloned().collect();
        let research_context = relevant_chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let entities = extract_entities(&research_context);
        let sources = relevant_chunks
            .iter()
            .filter_map(|c| c.metadata.url.clone())
            .map(|url| SourceReference::new(url, SourceKind::Website, now))
            .collect();

        match generate_account_plan(self.llm, company_name, &research_context, &entities, sources, now, self.config).await {
            Ok(plan) => {
                self.session_memory.set_account_plan(session_id, user_id, plan.clone()).await;
                self.session_memory.set_agent_state(session_id, user_id, SessionState::Idle).await;
                AgentResponse {
                    response: format!("I've completed research on {company_name} and generated a structured account plan covering company overview, market position, SWOT, and strategic recommendations."),
                    account_plan: Some(plan),
                    questions: Vec::new(),
                }
            }
            Err(_) => AgentResponse {
                response: format!("I gathered research on {company_name} but could not determine the company name precisely enough to finish the plan."),
                account_plan: None,
                questions: Vec::new(),
            },
        }
    }

    async fn clarify_workflow(&self, session_id: &str, user_id: &str, now: &str) -> AgentResponse {
        let Some(session) = self.session_memory.get(session_id).await else {
            return AgentResponse::default();
        };
        let Some(company_name) = session.company_name.clone() else {
            return AgentResponse::default();
        };
        self.session_memory.set_agent_state(session_id, user_id, SessionState::Processing).await;
        self.finish_research(&company_name, session_id, user_id, now).await
    }

    async fn update_section_workflow(&self, message: &str, session_id: &str, user_id: &str, now: &str) -> AgentResponse {
        let Some(session) = self.session_memory.get(session_id).await else {
            return AgentResponse {
                response: "I don't have an account plan yet. Please start by asking me to research a company first.".to_string(),
                account_plan: None,
                questions: vec!["Would you like me to research a company now?".to_string()],
            };
        };
        let Some(mut plan) = session.account_plan.clone() else {
            return AgentResponse {
                response: "I don't have an account plan yet. Please start by asking me to research a company first.".to_string(),
                account_plan: None,
                questions: vec!["Would you like me to research a company now?".to_string()],
            };
        };

        let message_lower = message.to_lowercase();
        let company_name = session.company_name.clone().unwrap_or_else(|| plan.company_name.clone());
        let research_context = session.research_data.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");

        if REGENERATE_PLAN_CUES.iter().any(|cue| message_lower.contains(cue)) {
            let entities = extract_entities(&research_context);
            let sources = plan.sources.clone();
            if let Ok(new_plan) = generate_account_plan(self.llm, &company_name, &research_context, &entities, sources, now, self.config).await {
                self.session_memory.set_account_plan(session_id, user_id, new_plan.clone()).await;
                return AgentResponse {
                    response: "I've regenerated the entire account plan with fresh insights.".to_string(),
                    account_plan: Some(new_plan),
                    questions: Vec::new(),
                };
            }
        }

        let commands: Vec<String> = split_operations(&message_lower);
        let mut applied = Vec::new();

        for cmd in commands {
            if cmd.is_empty() {
                continue;
            }
            if ["update", "regenerate", "refresh", "rewrite"].iter().any(|cue| cmd.contains(cue)) {
                if let Some(section) = resolve_section_alias(&cmd) {
                    let entities = extract_entities(&research_context);
                    let sources = plan.sources.clone();
                    if let Ok(regenerated) = generate_account_plan(self.llm, &company_name, &research_context, &entities, sources, now, self.config).await {
                        if let Some(text) = regenerated.text_section(section) {
                            plan.set_text_section(section, text.to_string());
                            applied.push(format!("updated {section}"));
                        }
                    }
                }
            } else if cmd.contains("add") {
                if let Some(field) = resolve_field_keyword(&cmd) {
                    plan.set_custom_field(field, serde_json::Value::String(format!("{field} to be determined")));
                    applied.push(format!("added field {field}"));
                }
            } else if ["remove", "delete", "drop"].iter().any(|cue| cmd.contains(cue)) {
                if let Some(section) = resolve_section_alias(&cmd) {
                    if !is_text_section(section) {
                        plan.remove_field(section);
                        applied.push(format!("removed {section}"));
                    }
                } else if let Some(field) = resolve_field_keyword(&cmd) {
                    plan.remove_field(field);
                    applied.push(format!("removed field {field}"));
                }
            }
        }

        plan.last_updated = now.to_string();
        self.session_memory.set_account_plan(session_id, user_id, plan.clone()).await;

        let response = if applied.is_empty() {
            "I couldn't identify a specific section or field to update from that message.".to_string()
        } else {
            format!("Done: {}.", applied.join(", "))
        };

        AgentResponse { response, account_plan: Some(plan), questions: Vec::new() }
    }

    fn general_workflow(&self, message: &str) -> AgentResponse {
        let message_lower = message.to_lowercase();

        if THANKS_CUES.iter().any(|cue| message_lower.contains(cue)) {
            return AgentResponse {
                response: "You're very welcome! I'm here whenever you need help researching companies or generating account plans.".to_string(),
                account_plan: None,
                questions: Vec::new(),
            };
        }
        if GREETING_CUES.iter().any(|cue| message_lower.contains(cue)) || HELP_CUES.iter().any(|cue| message_lower.contains(cue)) {
            return AgentResponse {
                response: "Hello! I'm a research assistant. Ask me to research a company (e.g. \"research Acme Corp\"), and I'll gather information and generate a structured account plan you can then update section by section.".to_string(),
                account_plan: None,
                questions: Vec::new(),
            };
        }

        AgentResponse {
            response: "I'm not sure what you'd like me to do. Try asking me to research a company, or update a section of an existing account plan.".to_string(),
            account_plan: None,
            questions: Vec::new(),
        }
    }
}

/// Splits a message into individual operations on `" and "`, `" then "`,
/// `", "`, and `" & "`.
fn split_operations(message: &str) -> Vec<String> {
    let has_multiple = [" and ", " then ", ", ", " & "].iter().any(|sep| message.contains(sep));
    if !has_multiple {
        return vec![message.trim().to_string()];
    }

    let mut commands = vec![message.to_string()];
    for sep in [" and ", " then ", ", ", " & "] {
        commands = commands.into_iter().flat_map(|cmd| cmd.split(sep).map(str::to_string).collect::<Vec<_>>()).collect();
    }
    commands.into_iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect()
}
