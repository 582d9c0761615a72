//! The fixed alias table mapping natural-language section references onto
//! [`crate::core::account_plan`] keys, and the field-keyword table used by
//! the add/remove operations.

use crate::core::account_plan::TEXT_SECTION_KEYS;

/// Phrase-to-section-key aliases, checked longest-phrase-first so
/// `"swot analysis"` doesn't get shadowed by a shorter `"swot"` alias
/// (order doesn't actually matter here since both map to the same key, but
/// the pattern generalizes to future aliases that don't).
const SECTION_ALIASES: &[(&str, &str)] = &[
    ("company overview", "company_overview"),
    ("overview", "company_overview"),
    ("market summary", "market_summary"),
    ("market", "market_summary"),
    ("key insights", "key_insights"),
    ("insights", "key_insights"),
    ("pain points", "pain_points"),
    ("pain point", "pain_points"),
    ("opportunities", "opportunities"),
    ("products and services", "products_services"),
    ("products", "products_services"),
    ("services", "products_services"),
    ("competitor analysis", "competitor_analysis"),
    ("competitors", "competitor_analysis"),
    ("competitor", "competitor_analysis"),
    ("swot analysis", "swot"),
    ("swot", "swot"),
    ("strengths", "swot.strengths"),
    ("weaknesses", "swot.weaknesses"),
    ("threats", "swot.threats"),
    ("strategic recommendations", "strategic_recommendations"),
    ("recommendations", "strategic_recommendations"),
    ("strategic", "strategic_recommendations"),
    ("executive summary", "final_account_plan"),
    ("account plan", "final_account_plan"),
];

/// Resolves a free-text section reference to a canonical section key (a
/// [`TEXT_SECTION_KEYS`] entry or a `swot.*` dotted path), by longest-match
/// among known aliases appearing in `text`.
#[must_use]
pub fn resolve_section_alias(text: &str) -> Option<&'static str> {
    SECTION_ALIASES
        .iter()
        .filter(|(alias, _)| text.contains(alias))
        .max_by_key(|(alias, _)| alias.len())
        .map(|(_, key)| *key)
}

/// Known custom-field keywords recognized by the add/remove operations
/// (e.g. `"add CEO field"`), normalized to their canonical field name.
const FIELD_KEYWORDS: &[(&str, &str)] = &[
    ("ceo", "ceo"),
    ("cto", "cto"),
    ("founder", "founder"),
    ("headquarters", "headquarters"),
    ("employee count", "employee_count"),
    ("employees", "employees"),
    ("headcount", "headcount"),
    ("revenue", "revenue"),
];

/// Resolves a free-text field reference (used by add/remove operations) to
/// a canonical field name.
#[must_use]
pub fn resolve_field_keyword(text: &str) -> Option<&'static str> {
    FIELD_KEYWORDS
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .max_by_key(|(keyword, _)| keyword.len())
        .map(|(_, field)| *field)
}

/// Whether `key` names one of the fixed text sections (not `swot.*`, not a
/// custom field).
#[must_use]
pub fn is_text_section(key: &str) -> bool {
    TEXT_SECTION_KEYS.contains(&key)
}
