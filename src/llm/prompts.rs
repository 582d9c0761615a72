//! Per-section system prompts and prompt builders for account-plan synthesis.

use crate::core::Entities;

/// Word-count / structural guidance per section, prepended to its prompt.
fn section_requirements(section: &str) -> &'static str {
    match section {
        "company_overview" => "Write 3-4 sentences covering what the company does, its founding, and its size.",
        "market_summary" => "Write 3-4 sentences on the company's market position, industry, and competitive landscape.",
        "key_insights" => "List 3-5 notable, non-obvious insights as short sentences.",
        "pain_points" => "List 3-5 likely business pain points a vendor could address.",
        "opportunities" => "List 3-5 concrete sales or partnership opportunities.",
        "products_services" => "Describe the company's main products and services in 3-5 sentences.",
        "competitor_analysis" => "Name 2-4 competitors and contrast their positioning in 3-5 sentences.",
        "strategic_recommendations" => "Give 3-5 actionable, specific recommendations.",
        "final_account_plan" => "Write a 4-6 sentence executive summary synthesizing the sections above.",
        _ => "Respond concisely and factually.",
    }
}

/// Context-window budget for a section, in characters, before truncation.
#[must_use]
pub fn context_budget(section: &str) -> usize {
    match section {
        "competitor_analysis" | "final_account_plan" => 5000,
        _ => 2000,
    }
}

/// System prompt shared by every section-generation call.
#[must_use]
pub fn system_prompt() -> &'static str {
    "You are a B2B account research assistant. Write factual, concise prose grounded \
     only in the supplied research context. Never invent facts not present in the \
     context. Do not include markdown formatting, source URLs, or meta-commentary \
     about your own process."
}

/// System prompt for the SWOT section, which must return a JSON object.
#[must_use]
pub fn swot_system_prompt() -> &'static str {
    "You are a B2B account research assistant. Given the research context, return a \
     JSON object with exactly four string keys: \"strengths\", \"weaknesses\", \
     \"opportunities\", \"threats\". Each value should be 2-3 sentences grounded only \
     in the supplied context. Return ONLY the JSON object, no markdown fences, no \
     commentary."
}

/// Builds the prompt for one text section.
#[must_use]
pub fn build_section_prompt(section: &str, company: &str, research_context: &str, entities: &Entities) -> String {
    let budget = context_budget(section);
    let truncated_context: String = research_context.chars().take(budget).collect();
    let entities_json = entities_json_truncated(entities, 500);

    format!(
        "Company: {company}\n\n\
         Research context:\n{truncated_context}\n\n\
         Known entities:\n{entities_json}\n\n\
         Task: {}",
        section_requirements(section)
    )
}

/// Builds the SWOT prompt (same inputs, different requirements block).
#[must_use]
pub fn build_swot_prompt(company: &str, research_context: &str, entities: &Entities) -> String {
    let budget = context_budget("swot");
    let truncated_context: String = research_context.chars().take(budget).collect();
    let entities_json = entities_json_truncated(entities, 500);

    format!(
        "Company: {company}\n\n\
         Research context:\n{truncated_context}\n\n\
         Known entities:\n{entities_json}\n\n\
         Task: Identify strengths, weaknesses, opportunities, and threats."
    )
}

fn entities_json_truncated(entities: &Entities, max_chars: usize) -> String {
    let mut map = serde_json::Map::new();
    for (kind, values) in entities.iter() {
        let key = serde_json::to_value(kind).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        map.insert(key, serde_json::Value::Array(values.iter().map(|v| serde_json::Value::String(v.clone())).collect()));
    }
    let json = serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string());
    json.chars().take(max_chars).collect()
}
