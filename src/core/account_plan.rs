//! The [`AccountPlan`]: the externally-visible business artifact this
//! system produces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::source::SourceReference;

/// The four fixed keys of a SWOT analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Swot {
    /// Key strengths.
    pub strengths: String,
    /// Key weaknesses.
    pub weaknesses: String,
    /// Key opportunities.
    pub opportunities: String,
    /// Key threats.
    pub threats: String,
}

/// One financial figure with its provenance and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEntry {
    /// The extracted value, as display text (e.g. `"$100 million"`).
    pub value: String,
    /// Up to 2-3 source URLs backing this figure.
    pub source: Vec<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Financial figures keyed by the closed set `revenue`, `profit`,
/// `employees`, `market_cap`. Absent if no financial entities were
/// extracted at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// Revenue figure, if extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<FinancialEntry>,
    /// Profit figure, if extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<FinancialEntry>,
    /// Employee count, if extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<FinancialEntry>,
    /// Market capitalization, if extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<FinancialEntry>,
}

impl FinancialSummary {
    /// Whether every field is absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revenue.is_none() && self.profit.is_none() && self.employees.is_none() && self.market_cap.is_none()
    }
}

/// A named executive or leader mentioned in the research data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPerson {
    /// Full name.
    pub name: String,
    /// Title/role.
    pub title: String,
    /// Source URL this person was mentioned in.
    pub source: String,
}

/// A named competitor with the reason it was identified as one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorEntry {
    /// Competitor name.
    pub name: String,
    /// Why this entity is considered a competitor.
    pub reason: String,
    /// Source URL.
    pub source: String,
}

/// The structured business-intelligence artifact this system produces.
///
/// Contains every section key named in the data model, plus an open
/// extension point (`custom_fields`) for ad-hoc fields the update-section
/// workflow adds (e.g. `"add CEO field"`), flattened into the same JSON
/// object on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPlan {
    /// The researched company's name.
    pub company_name: String,
    /// Company overview section.
    pub company_overview: String,
    /// Market summary section.
    pub market_summary: String,
    /// Key insights section.
    pub key_insights: String,
    /// Pain points section.
    pub pain_points: String,
    /// Opportunities section.
    pub opportunities: String,
    /// Products/services section.
    pub products_services: String,
    /// Competitor analysis narrative section.
    pub competitor_analysis: String,
    /// SWOT analysis.
    pub swot: Swot,
    /// Strategic recommendations section.
    pub strategic_recommendations: String,
    /// Financial figures, if any were extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_summary: Option<FinancialSummary>,
    /// Key people identified in the research data.
    pub key_people: Vec<KeyPerson>,
    /// Identified competitors.
    pub competitors: Vec<CompetitorEntry>,
    /// Citations for this plan.
    pub sources: Vec<SourceReference>,
    /// Executive summary, synthesized from earlier sections.
    pub final_account_plan: String,
    /// ISO8601 timestamp of the last mutation.
    pub last_updated: String,
    /// Ad-hoc fields added via the update-section workflow's `add field`
    /// operation. Flattened into the top-level JSON object.
    #[serde(flatten)]
    pub custom_fields: BTreeMap<String, Value>,
}

/// The fixed, named text sections an update/regenerate command may target.
/// Deliberately excludes `sources`, `last_updated`, `financial_summary`,
/// `key_people`, and `competitors`, which are not free-text sections.
pub const TEXT_SECTION_KEYS: &[&str] = &[
    "company_overview",
    "market_summary",
    "key_insights",
    "pain_points",
    "opportunities",
    "products_services",
    "competitor_analysis",
    "strategic_recommendations",
    "final_account_plan",
];

impl AccountPlan {
    /// Builds a plan where every text section is deterministic fallback
    /// text (see the plan generator's fallback policy), `last_updated` is
    /// the caller-supplied timestamp, and every list/optional field is
    /// empty. Used both as the generator's last line of defense and as a
    /// scaffold for tests.
    #[must_use]
    pub fn fallback(company_name: impl Into<String>, now: impl Into<String>) -> Self {
        let company_name = company_name.into();
        let fallback_text = |label: &str| format!("{label} unavailable in current research data for {company_name}.");
        Self {
            company_overview: fallback_text("Company overview"),
            market_summary: fallback_text("Market summary"),
            key_insights: fallback_text("Key insights"),
            pain_points: fallback_text("Pain points"),
            opportunities: fallback_text("Opportunities"),
            products_services: fallback_text("Products and services"),
            competitor_analysis: fallback_text("Competitor analysis"),
            swot: Swot {
                strengths: "Key strengths unavailable in current research data.".to_string(),
                weaknesses: "Key weaknesses unavailable in current research data.".to_string(),
                opportunities: "Growth opportunities unavailable in current research data.".to_string(),
                threats: "Potential threats unavailable in current research data.".to_string(),
            },
            strategic_recommendations: fallback_text("Strategic recommendations"),
            financial_summary: None,
            key_people: Vec::new(),
            competitors: Vec::new(),
            sources: Vec::new(),
            final_account_plan: fallback_text("Executive summary"),
            last_updated: now.into(),
            company_name,
            custom_fields: BTreeMap::new(),
        }
    }

    /// Reads a named text section, including `swot.strengths` /
    /// `swot.weaknesses` / `swot.opportunities` / `swot.threats` dotted
    /// paths. Returns `None` for unknown keys or non-text sections.
    #[must_use]
    pub fn text_section(&self, key: &str) -> Option<&str> {
        match key {
            "company_overview" => Some(&self.company_overview),
            "market_summary" => Some(&self.market_summary),
            "key_insights" => Some(&self.key_insights),
            "pain_points" => Some(&self.pain_points),
            "opportunities" => Some(&self.opportunities),
            "products_services" => Some(&self.products_services),
            "competitor_analysis" => Some(&self.competitor_analysis),
            "strategic_recommendations" => Some(&self.strategic_recommendations),
            "final_account_plan" => Some(&self.final_account_plan),
            "swot.strengths" => Some(&self.swot.strengths),
            "swot.weaknesses" => Some(&self.swot.weaknesses),
            "swot.opportunities" => Some(&self.swot.opportunities),
            "swot.threats" => Some(&self.swot.threats),
            _ => None,
        }
    }

    /// Overwrites a named text section in place. Returns `false` for
    /// unknown keys, leaving the plan untouched.
    pub fn set_text_section(&mut self, key: &str, text: String) -> bool {
        match key {
            "company_overview" => self.company_overview = text,
            "market_summary" => self.market_summary = text,
            "key_insights" => self.key_insights = text,
            "pain_points" => self.pain_points = text,
            "opportunities" => self.opportunities = text,
            "products_services" => self.products_services = text,
            "competitor_analysis" => self.competitor_analysis = text,
            "strategic_recommendations" => self.strategic_recommendations = text,
            "final_account_plan" => self.final_account_plan = text,
            "swot.strengths" => self.swot.strengths = text,
            "swot.weaknesses" => self.swot.weaknesses = text,
            "swot.opportunities" => self.swot.opportunities = text,
            "swot.threats" => self.swot.threats = text,
            _ => return false,
        }
        true
    }

    /// Adds or overwrites a custom field (the `add field <name>` operation).
    pub fn set_custom_field(&mut self, name: impl Into<String>, value: Value) {
        self.custom_fields.insert(name.into(), value);
    }

    /// Removes a custom field, or one of the fixed optional sections named
    /// by key (`financial_summary`). Returns `true` if something was
    /// removed.
    pub fn remove_field(&mut self, name: &str) -> bool {
        if name == "financial_summary" && self.financial_summary.is_some() {
            self.financial_summary = None;
            return true;
        }
        self.custom_fields.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> AccountPlan {
        AccountPlan {
            company_name: "Acme Corp".to_string(),
            company_overview: "Overview.".to_string(),
            market_summary: "Market.".to_string(),
            key_insights: "Old insights.".to_string(),
            pain_points: "Pain.".to_string(),
            opportunities: "Opportunities.".to_string(),
            products_services: "Products.".to_string(),
            competitor_analysis: "Competitors.".to_string(),
            swot: Swot::default(),
            strategic_recommendations: "Strategy.".to_string(),
            financial_summary: None,
            key_people: Vec::new(),
            competitors: Vec::new(),
            sources: Vec::new(),
            final_account_plan: "Summary.".to_string(),
            last_updated: "2026-01-01T00:00:00Z".to_string(),
            custom_fields: BTreeMap::new(),
        }
    }

    #[test]
    fn set_text_section_updates_only_named_field() {
        let mut p = plan();
        let before_overview = p.company_overview.clone();
        assert!(p.set_text_section("key_insights", "New insights.".to_string()));
        assert_eq!(p.key_insights, "New insights.");
        assert_eq!(p.company_overview, before_overview);
    }

    #[test]
    fn set_text_section_rejects_unknown_key() {
        let mut p = plan();
        assert!(!p.set_text_section("not_a_real_section", "x".to_string()));
    }

    #[test]
    fn swot_dotted_paths_resolve() {
        let mut p = plan();
        assert!(p.set_text_section("swot.strengths", "Strong.".to_string()));
        assert_eq!(p.text_section("swot.strengths"), Some("Strong."));
    }

    #[test]
    fn custom_field_add_and_remove() {
        let mut p = plan();
        p.set_custom_field("ceo", Value::String("Jane Doe".to_string()));
        assert_eq!(p.custom_fields.get("ceo"), Some(&Value::String("Jane Doe".to_string())));
        assert!(p.remove_field("ceo"));
        assert!(p.custom_fields.get("ceo").is_none());
    }

    #[test]
    fn custom_fields_flatten_into_serialized_json() {
        let mut p = plan();
        p.set_custom_field("ceo", Value::String("Jane Doe".to_string()));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["ceo"], "Jane Doe");
        assert!(json.get("custom_fields").is_none());
    }

    #[test]
    fn remove_field_drops_financial_summary() {
        let mut p = plan();
        p.financial_summary = Some(FinancialSummary::default());
        assert!(p.remove_field("financial_summary"));
        assert!(p.financial_summary.is_none());
    }
}
