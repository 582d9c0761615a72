//! Regex-driven entity extraction from clean text.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{EntityKind, Entities};

static REVENUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)revenue[s]?\s+(?:of|was|is|reached|totaled|totaling)?\s*\$?\s*[\d,.]+\s*(?:billion|million|thousand|bn|mn|k)?").unwrap()
});
static PROFIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:net\s+)?(?:profit|income|earnings)[s]?\s+(?:of|was|is|reached|totaled)?\s*\$?\s*[\d,.]+\s*(?:billion|million|thousand|bn|mn|k)?").unwrap()
});
static HEADCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\d,]+\+?\s*(?:employees|staff|workers|people|headcount)").unwrap()
});
static MARKET_CAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)market\s+cap(?:italization)?\s+(?:of|was|is|reached)?\s*\$?\s*[\d,.]+\s*(?:billion|million|trillion|bn|mn|tn)?").unwrap()
});
static LOCATION_CUE: &[&str] = &["headquartered in", "based in", "located in", "offices in"];
static PRODUCT_CUE: &[&str] = &["product", "platform", "offers", "provides"];
static SERVICE_CUE: &[&str] = &["service", "solution", "consulting"];
static COMPETITOR_CUE: &[&str] = &["competitor", "competes with", "rival", "versus", "compared to"];
static PEOPLE_CUE: &[&str] = &["ceo", "chief executive", "cfo", "cto", "founder", "president", "chairman"];

const MAX_PER_KIND: usize = 10;
const MAX_LOCATION_LEN: usize = 50;

/// Truncates `s` to at most `max_chars` characters, on a char boundary.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn first_match(re: &Regex, text: &str) -> Vec<String> {
    re.find(text).map(|m| m.as_str().trim().to_string()).into_iter().collect()
}

/// Splits `text` into sentences on `.`/`!`/`?` boundaries, trimmed and
/// non-empty.
fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?']).map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Collects up to `MAX_PER_KIND` sentences containing any of `cues`
/// (case-insensitive).
fn sentences_matching_cues(text: &str, cues: &[&str]) -> Vec<String> {
    sentences(text)
        .into_iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            cues.iter().any(|c| lower.contains(c))
        })
        .take(MAX_PER_KIND)
        .map(std::string::ToString::to_string)
        .collect()
}

/// Extracts all recognized entity kinds from `text`.
///
/// `revenue`, `headcount`, `products`, `services`, `competitors`, and
/// `locations` follow established pattern/cue families; `profit` and
/// `market_cap` are implemented by analogy to the `revenue` pattern, and
/// `people` by analogy to the cue-sentence approach used for locations,
/// since no equivalent extractor existed to model them on directly.
#[must_use]
pub fn extract_entities(text: &str) -> Entities {
    let mut entities = Entities::new();

    for value in first_match(&REVENUE, text) {
        entities.push(EntityKind::Revenue, value);
    }
    for value in first_match(&PROFIT, text) {
        entities.push(EntityKind::Profit, value);
    }
    for value in first_match(&HEADCOUNT, text) {
        entities.push(EntityKind::Employees, value);
    }
    for value in first_match(&MARKET_CAP, text) {
        entities.push(EntityKind::MarketCap, value);
    }
    for value in sentences_matching_cues(text, PRODUCT_CUE) {
        entities.push(EntityKind::Products, value);
    }
    for value in sentences_matching_cues(text, SERVICE_CUE) {
        entities.push(EntityKind::Services, value);
    }
    for value in sentences_matching_cues(text, COMPETITOR_CUE) {
        entities.push(EntityKind::Competitors, value);
    }
    for value in sentences_matching_cues(text, PEOPLE_CUE) {
        entities.push(EntityKind::People, value);
    }
    for value in sentences_matching_cues(text, LOCATION_CUE) {
        entities.push(EntityKind::Locations, truncate_chars(&value, MAX_LOCATION_LEN));
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_revenue_figure() {
        let text = "The company reported revenue of $4.2 billion for the fiscal year.";
        let entities = extract_entities(text);
        assert!(!entities.get(EntityKind::Revenue).is_empty());
    }

    #[test]
    fn extracts_headcount_figure() {
        let text = "Acme Corp employs 1,200 employees across its offices.";
        let entities = extract_entities(text);
        assert!(!entities.get(EntityKind::Employees).is_empty());
    }

    #[test]
    fn extracts_profit_figure() {
        let text = "Net income of $300 million was reported last quarter.";
        let entities = extract_entities(text);
        assert!(!entities.get(EntityKind::Profit).is_empty());
    }

    #[test]
    fn extracts_people_mentions() {
        let text = "Jane Doe serves as the CEO of Acme Corp. The CFO joined in 2021.";
        let entities = extract_entities(text);
        assert!(!entities.get(EntityKind::People).is_empty());
    }

    #[test]
    fn extracts_competitor_mentions() {
        let text = "Acme Corp competes with Globex and Initech in the same market.";
        let entities = extract_entities(text);
        assert!(!entities.get(EntityKind::Competitors).is_empty());
    }

    #[test]
    fn extracts_location_mentions() {
        let text = "The company is headquartered in Austin, Texas with offices in Berlin.";
        let entities = extract_entities(text);
        assert!(!entities.get(EntityKind::Locations).is_empty());
    }

    #[test]
    fn location_values_are_capped_at_fifty_chars() {
        let text = "The company is headquartered in a very long and verbose description of its \
                     primary corporate location that goes on for quite a while and then some more.";
        let entities = extract_entities(text);
        for value in entities.get(EntityKind::Locations) {
            assert!(value.chars().count() <= MAX_LOCATION_LEN, "{value:?} exceeds {MAX_LOCATION_LEN} chars");
        }
    }

    #[test]
    fn caps_sentence_based_extraction_at_ten() {
        let sentence = "This is a product offering from the company. ";
        let text = sentence.repeat(20);
        let entities = extract_entities(&text);
        assert!(entities.get(EntityKind::Products).len() <= 10);
    }

    #[test]
    fn no_false_positives_on_unrelated_text() {
        let text = "The weather today is sunny with a gentle breeze from the west.";
        let entities = extract_entities(text);
        assert!(entities.get(EntityKind::Revenue).is_empty());
        assert!(entities.get(EntityKind::Employees).is_empty());
    }
}
