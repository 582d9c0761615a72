//! End-to-end tests driving the agent controller over fake external
//! collaborators: a canned search provider, a canned scraper, and a
//! template-based LLM stand-in.

use async_trait::async_trait;

use account_plan_rs::config::PipelineConfig;
use account_plan_rs::error::Result;
use account_plan_rs::external::{Llm, LlmRequest, ScrapeApi, ScrapedPage, SearchApi, SearchResult, VectorMatch, VectorStore};
use account_plan_rs::Chunk;
use account_plan_rs::orchestrator::SessionMemory;
use account_plan_rs::processing::ContentKind;
use account_plan_rs::{AccountPlan, AgentController};

struct FakeSearch;

#[async_trait]
impl SearchApi for FakeSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
        Ok(vec![
            SearchResult {
                title: "Acme Corp announces record revenue".to_string(),
                url: "https://www.reuters.com/acme-earnings".to_string(),
                snippet: Some("Acme Corp reported quarterly revenue growth".to_string()),
            },
            SearchResult {
                title: "Acme Corp hires new CTO".to_string(),
                url: "https://example.com/acme-cto".to_string(),
                snippet: Some("Acme Corp announced a new chief technology officer".to_string()),
            },
        ])
    }
}

struct FakeScrape;

#[async_trait]
impl ScrapeApi for FakeScrape {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let content = format!(
            "Acme Corp is a company headquartered in Austin, Texas. Acme Corp reported revenue of $500 million \
             last year and employs roughly 2000 people across its offices. Acme Corp was founded in 2010 by \
             Jane Doe and has grown steadily since then, expanding into new markets and hiring aggressively \
             across engineering and sales. The company competes with several larger rivals but has carved out \
             a strong niche in its industry thanks to a loyal customer base and a reputation for reliability. \
             Source page: {url}"
        );
        Ok(ScrapedPage {
            url: url.to_string(),
            content,
            content_kind: ContentKind::Text,
            title: Some("Acme Corp".to_string()),
        })
    }
}

struct FakeLlm;

#[async_trait]
impl Llm for FakeLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<String> {
        if request.system.to_lowercase().contains("swot") {
            return Ok(r#"{"strengths":"Loyal customer base.","weaknesses":"Limited market reach.","opportunities":"New market expansion.","threats":"Larger competitors."}"#.to_string());
        }
        Ok(format!("Generated section text derived from: {}", &request.prompt.chars().take(80).collect::<String>()))
    }
}

struct FakeVectorStore;

#[async_trait]
impl VectorStore for FakeVectorStore {
    async fn upsert(&self, _chunk_id: uuid::Uuid, _embedding: &[f32]) -> Result<()> {
        Ok(())
    }

    async fn query(&self, _query_embedding: &[f32], _limit: usize) -> Result<Vec<VectorMatch>> {
        Ok(Vec::new())
    }

    async fn find_by_metadata(&self, _user_id: &str, _company_name: &str) -> Result<Vec<Chunk>> {
        Ok(Vec::new())
    }
}

fn controller<'a>(
    session_memory: &'a SessionMemory,
    search: &'a FakeSearch,
    scrape: &'a FakeScrape,
    llm: &'a FakeLlm,
    vector_store: &'a FakeVectorStore,
    config: &'a PipelineConfig,
) -> AgentController<'a> {
    AgentController::new(session_memory, search, scrape, llm, vector_store, config)
}

#[tokio::test]
async fn research_request_produces_an_account_plan() {
    let session_memory = SessionMemory::new();
    let search = FakeSearch;
    let scrape = FakeScrape;
    let llm = FakeLlm;
    let vector_store = FakeVectorStore;
    let config = PipelineConfig::default();
    let agent = controller(&session_memory, &search, &scrape, &llm, &vector_store, &config);

    let response = agent.process("please research Acme", "session-1", "user-1", "2026-01-01T00:00:00Z", false).await;

    let plan = response.account_plan.expect("research should produce a plan");
    assert_eq!(plan.company_name, "Acme");
    assert!(!plan.company_overview.is_empty());
    assert!(!plan.swot.strengths.is_empty());
}

#[tokio::test]
async fn greeting_does_not_trigger_research() {
    let session_memory = SessionMemory::new();
    let search = FakeSearch;
    let scrape = FakeScrape;
    let llm = FakeLlm;
    let vector_store = FakeVectorStore;
    let config = PipelineConfig::default();
    let agent = controller(&session_memory, &search, &scrape, &llm, &vector_store, &config);

    let response = agent.process("hello there", "session-2", "user-1", "2026-01-01T00:00:00Z", false).await;

    assert!(response.account_plan.is_none());
    assert!(!response.response.is_empty());
}

#[tokio::test]
async fn update_section_workflow_rewrites_a_plan_field() {
    let session_memory = SessionMemory::new();
    let search = FakeSearch;
    let scrape = FakeScrape;
    let llm = FakeLlm;
    let vector_store = FakeVectorStore;
    let config = PipelineConfig::default();
    let agent = controller(&session_memory, &search, &scrape, &llm, &vector_store, &config);

    agent.process("please research Acme", "session-3", "user-1", "2026-01-01T00:00:00Z", false).await;

    let response = agent
        .process("update the key insights section", "session-3", "user-1", "2026-01-01T00:05:00Z", false)
        .await;

    assert!(response.account_plan.is_some());
}

#[test]
fn account_plan_fallback_names_the_company_in_every_section() {
    let plan = AccountPlan::fallback("Acme Corp", "2026-01-01T00:00:00Z");
    assert_eq!(plan.company_name, "Acme Corp");
    assert!(plan.company_overview.contains("Acme Corp"));
    assert!(plan.sources.is_empty());
}
