//! Section-by-section account plan synthesis.
//!
//! Generates each text section with its own prompt, retry policy, and
//! fallback — deliberately not one giant prompt, since single-prompt
//! generation reliably truncates at the model's token ceiling.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::PipelineConfig;
use crate::core::{AccountPlan, CompetitorEntry, Entities, EntityKind, FinancialEntry, FinancialSummary, KeyPerson, SourceReference, Swot};
use crate::error::{Error, PlanGenerationError, Result};
use crate::external::{Llm, LlmRequest};
use crate::llm::prompts::{build_section_prompt, build_swot_prompt, swot_system_prompt, system_prompt};

/// Text sections generated before the structured `key_people`/`swot`/
/// `competitors` block, in order.
const SECTION_ORDER_BEFORE_STRUCTURED: &[&str] = &[
    "company_overview",
    "market_summary",
    "key_insights",
    "pain_points",
    "opportunities",
    "products_services",
    "competitor_analysis",
];

/// Text sections generated after the structured block, excluding
/// `final_account_plan` (generated last, consuming every prior section's
/// output).
const SECTION_ORDER_AFTER_STRUCTURED: &[&str] = &["strategic_recommendations"];

static TRACKING_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[?&](utm_\w+|ref|source|campaign)=[a-zA-Z0-9_-]+").unwrap());
static URL_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").unwrap());
static PROTOCOL_RELATIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\S*").unwrap());
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static WEB_SOURCE_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)WEB SOURCE:\s*").unwrap());
static HEX_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b[0-9a-f]{32,}\b").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static INCOMPLETE_TAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(relev|focu|into re|continu|strat)$").unwrap());

/// Strips URL fragments, tracking params, markdown code fences,
/// `"WEB SOURCE:"` labels, protocol-relative URLs, and 32+-hex ids; ensures
/// terminal punctuation. Applied twice by [`clean_output`].
fn clean_once(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, "");
    let text = WEB_SOURCE_LABEL.replace_all(&text, "");
    let text = TRACKING_PARAM.replace_all(&text, "");
    let text = URL_FRAGMENT.replace_all(&text, "");
    let text = PROTOCOL_RELATIVE.replace_all(&text, "");
    let text = HEX_ID.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

fn ensure_terminal_punctuation(mut text: String) -> String {
    if !text.is_empty() && !text.ends_with(['.', '!', '?', '"', '}', ')', ']']) {
        text.push('.');
    }
    text
}

/// Applies the output cleaner twice (the design note's "apply at least
/// twice" requirement, since one pass can expose text the next pass should
/// also normalize, e.g. a tracking param hidden by a stripped URL).
#[must_use]
pub fn clean_output(text: &str) -> String {
    let once = clean_once(text);
    let twice = clean_once(&once);
    ensure_terminal_punctuation(twice)
}

/// Whether `text` looks like a truncated model response: missing terminal
/// punctuation, an implausibly short final word, an incomplete-tail
/// pattern, or simply too short overall.
#[must_use]
pub fn is_truncated(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < 50 {
        return true;
    }
    if !trimmed.ends_with(['.', '!', '?', '"', '}', ')', ']']) {
        return true;
    }
    if let Some(last_word) = trimmed.split_whitespace().next_back() {
        let core: String = last_word.chars().filter(|c| c.is_alphanumeric()).collect();
        if core.chars().count() < 4 && !last_word.chars().all(|c| c.is_ascii_punctuation()) {
            return true;
        }
    }
    if INCOMPLETE_TAIL.is_match(trimmed) {
        return true;
    }
    false
}

fn fallback_text(section: &str, company: &str) -> String {
    let label = match section {
        "company_overview" => "Company overview",
        "market_summary" => "Market summary",
        "key_insights" => "Key insights",
        "pain_points" => "Pain points",
        "opportunities" => "Opportunities",
        "products_services" => "Products and services",
        "competitor_analysis" => "Competitor analysis",
        "strategic_recommendations" => "Strategic recommendations",
        "final_account_plan" => "Executive summary",
        _ => section,
    };
    format!("{label} unavailable in current research data for {company}.")
}

/// Calls the LLM for one section, applying the per-failure-kind retry
/// policies: halved context once on [`Error::Truncated`], exponential
/// backoff on timeout/rate-limit, and no retry at all on
/// [`Error::SafetyBlocked`].
async fn generate_with_retry(
    llm: &dyn Llm,
    system: &str,
    prompt_at_budget: impl Fn(usize) -> String,
    initial_budget: usize,
    config: &PipelineConfig,
) -> Result<String> {
    let request = LlmRequest {
        system: system.to_string(),
        prompt: prompt_at_budget(initial_budget),
        temperature: 0.4,
        max_tokens: 1024,
    };

    match llm.complete(&request).await {
        Ok(text) if !text.trim().is_empty() => Ok(text),
        Ok(_) | Err(Error::Truncated) => {
            tracing::debug!("llm response truncated, retrying once with halved context");
            let halved = LlmRequest {
                prompt: prompt_at_budget(initial_budget / 2),
                ..request
            };
            if let Ok(text) = llm.complete(&halved).await {
                if !text.trim().is_empty() {
                    return Ok(text);
                }
            }
            Err(Error::Truncated)
        }
        Err(Error::SafetyBlocked { reason }) => {
            tracing::warn!(%reason, "llm call blocked by safety filter, no retry");
            Err(Error::SafetyBlocked { reason })
        }
        Err(err @ (Error::RateLimit { .. } | Error::Network { .. })) => {
            let policy = if matches!(err, Error::RateLimit { .. }) {
                config.llm_rate_limit_retry
            } else {
                config.llm_timeout_retry
            };
            for attempt in 0..policy.max_retries {
                tracing::debug!(attempt, %err, "retrying llm call after backoff");
                tokio::time::sleep(policy.backoff_for_attempt(attempt)).await;
                match llm.complete(&request).await {
                    Ok(text) if !text.trim().is_empty() => return Ok(text),
                    Ok(_) => continue,
                    Err(Error::SafetyBlocked { reason }) => return Err(Error::SafetyBlocked { reason }),
                    Err(_) => continue,
                }
            }
            Err(err)
        }
        Err(other) => Err(other),
    }
}

/// Generates one text section, falling back to deterministic text on any
/// unrecoverable failure.
///
/// A section whose cleaned output trips [`is_truncated`] is regenerated
/// once with a fresh, independent call before falling back to
/// deterministic text — mirroring the two-pass truncation detector applied
/// across every section after the first full generation pass.
async fn generate_section(llm: &dyn Llm, section: &str, company: &str, research_context: &str, entities: &Entities, config: &PipelineConfig) -> String {
    let prompt_at_budget = |budget: usize| -> String {
        let truncated: String = research_context.chars().take(budget).collect();
        build_section_prompt(section, company, &truncated, entities)
    };
    let budget = crate::llm::prompts::context_budget(section);

    let first = generate_with_retry(llm, system_prompt(), prompt_at_budget, budget, config)
        .await
        .ok()
        .map(|raw| clean_output(&raw));

    if let Some(cleaned) = &first {
        if !is_truncated(cleaned) {
            return cleaned.clone();
        }
    }

    tracing::debug!(section, "truncation detected, regenerating section independently");
    match generate_with_retry(llm, system_prompt(), prompt_at_budget, budget, config).await {
        Ok(raw) => {
            let cleaned = clean_output(&raw);
            if is_truncated(&cleaned) {
                tracing::warn!(section, "section still truncated after regeneration, using fallback text");
                fallback_text(section, company)
            } else {
                cleaned
            }
        }
        Err(error) => {
            tracing::warn!(section, %error, "section generation failed, using fallback text");
            fallback_text(section, company)
        }
    }
}

fn parse_swot_object(raw: &str) -> Option<Swot> {
    let start = raw.find('{')?;
    let mut depth = 0i32;
    let mut end = None;
    for (i, ch) in raw[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + i + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    let value: serde_json::Value = serde_json::from_str(&raw[start..end]).ok()?;
    Some(Swot {
        strengths: value.get("strengths")?.as_str()?.to_string(),
        weaknesses: value.get("weaknesses")?.as_str()?.to_string(),
        opportunities: value.get("opportunities")?.as_str()?.to_string(),
        threats: value.get("threats")?.as_str()?.to_string(),
    })
}

#[tracing::instrument(skip(llm, research_context, entities, config), fields(company))]
async fn generate_swot(llm: &dyn Llm, company: &str, research_context: &str, entities: &Entities, config: &PipelineConfig) -> Swot {
    let prompt_at_budget = |budget: usize| -> String {
        let truncated: String = research_context.chars().take(budget).collect();
        build_swot_prompt(company, &truncated, entities)
    };
    let budget = crate::llm::prompts::context_budget("swot");

    let fallback = || Swot {
        strengths: "Key strengths unavailable in current research data.".to_string(),
        weaknesses: "Key weaknesses unavailable in current research data.".to_string(),
        opportunities: "Growth opportunities unavailable in current research data.".to_string(),
        threats: "Potential threats unavailable in current research data.".to_string(),
    };

    match generate_with_retry(llm, swot_system_prompt(), prompt_at_budget, budget, config).await {
        Ok(raw) => parse_swot_object(&raw).map_or_else(fallback, |swot| Swot {
            strengths: clean_output(&swot.strengths),
            weaknesses: clean_output(&swot.weaknesses),
            opportunities: clean_output(&swot.opportunities),
            threats: clean_output(&swot.threats),
        }),
        Err(error) => {
            tracing::warn!(%error, "swot generation failed, using fallback text");
            fallback()
        }
    }
}

fn first_source_url(sources: &[SourceReference]) -> String {
    sources.first().map(|s| s.url.clone()).unwrap_or_default()
}

/// Up to the first 3 source URLs, used to attribute an extracted financial
/// figure to its backing research.
fn sources_for_field(sources: &[SourceReference]) -> Vec<String> {
    sources.iter().take(3).map(|s| s.url.clone()).collect()
}

fn financial_entry(values: &[String], sources: &[SourceReference], confidence: f32) -> Option<FinancialEntry> {
    let value = values.first()?.clone();
    Some(FinancialEntry {
        value,
        source: sources_for_field(sources),
        confidence,
    })
}

/// Builds the financial summary directly from extracted entities: the
/// first (most relevant) value recorded per kind, attributed to up to 3
/// sources, with a fixed per-kind confidence. `None` if nothing was
/// extracted at all.
fn generate_financial_summary(entities: &Entities, sources: &[SourceReference]) -> Option<FinancialSummary> {
    let summary = FinancialSummary {
        revenue: financial_entry(entities.get(EntityKind::Revenue), sources, 0.85),
        profit: financial_entry(entities.get(EntityKind::Profit), sources, 0.80),
        employees: financial_entry(entities.get(EntityKind::Employees), sources, 0.75),
        market_cap: financial_entry(entities.get(EntityKind::MarketCap), sources, 0.80),
    };
    if summary.is_empty() {
        None
    } else {
        Some(summary)
    }
}

/// Formats up to 5 key people from extracted `People` entities. Each entity
/// value is expected in `"Name, Title"` form; values that don't split into
/// two non-empty comma-separated parts are skipped, matching the
/// original's best-effort formatting of unstructured entity strings.
fn generate_key_people(entities: &Entities, sources: &[SourceReference]) -> Vec<KeyPerson> {
    let source_url = first_source_url(sources);
    entities
        .get(EntityKind::People)
        .iter()
        .filter_map(|person| {
            let mut parts = person.splitn(2, ',');
            let name = parts.next()?.trim();
            let title = parts.next()?.trim();
            if name.is_empty() || title.is_empty() {
                return None;
            }
            Some(KeyPerson {
                name: name.to_string(),
                title: title.to_string(),
                source: source_url.clone(),
            })
        })
        .take(5)
        .collect()
}

/// Formats up to 5 competitors from extracted `Competitors` entities, with
/// a generic reason and the first known source URL.
fn generate_competitors(entities: &Entities, sources: &[SourceReference]) -> Vec<CompetitorEntry> {
    let source_url = first_source_url(sources);
    entities
        .get(EntityKind::Competitors)
        .iter()
        .take(5)
        .map(|name| CompetitorEntry {
            name: name.clone(),
            reason: "Competitor in the same market".to_string(),
            source: source_url.clone(),
        })
        .collect()
}

/// Generates a complete [`AccountPlan`] section-by-section.
///
/// Every text section, the SWOT object, and the structured `key_people`/
/// `competitors`/`financial_summary` fields are generated independently so
/// a single section's failure never discards the rest. Generation order is
/// `company_overview, market_summary, key_insights, pain_points,
/// opportunities, products_services, competitor_analysis, key_people,
/// swot, competitors, strategic_recommendations, final_account_plan`;
/// `final_account_plan` is generated last, referencing the prior text
/// sections' output.
pub async fn generate_account_plan(
    llm: &dyn Llm,
    company: &str,
    research_context: &str,
    entities: &Entities,
    sources: Vec<SourceReference>,
    now: &str,
    config: &PipelineConfig,
) -> Result<AccountPlan> {
    if company.trim().is_empty() {
        return Err(PlanGenerationError::CompanyNameUnknown.into());
    }

    let mut plan = AccountPlan::fallback(company, now);
    plan.sources = sources;
    plan.financial_summary = generate_financial_summary(entities, &plan.sources);

    for section in SECTION_ORDER_BEFORE_STRUCTURED {
        let text = generate_section(llm, section, company, research_context, entities, config).await;
        plan.set_text_section(section, text);
    }

    plan.key_people = generate_key_people(entities, &plan.sources);
    plan.swot = generate_swot(llm, company, research_context, entities, config).await;
    plan.competitors = generate_competitors(entities, &plan.sources);

    for section in SECTION_ORDER_AFTER_STRUCTURED {
        let text = generate_section(llm, section, company, research_context, entities, config).await;
        plan.set_text_section(section, text);
    }

    let synthesis_context = format!(
        "{}\n\n{}\n\n{}\n\n{}\n\n{}\n\n{}\n\n{}\n\n{}",
        plan.company_overview,
        plan.market_summary,
        plan.key_insights,
        plan.pain_points,
        plan.opportunities,
        plan.products_services,
        plan.competitor_analysis,
        plan.strategic_recommendations,
    );
    let final_summary = generate_section(llm, "final_account_plan", company, &synthesis_context, entities, config).await;
    plan.set_text_section("final_account_plan", final_summary);

    Ok(plan)
}
