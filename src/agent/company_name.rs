//! Company-name extraction from a user message or uploaded-document text.

use std::sync::LazyLock;

use regex::Regex;

static MESSAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:generate|create|make|build)\s+(?:account\s+plan|plan)\s+(?:for|about)\s+([A-Z][a-zA-Z\s&.]+?)(?:\s+by|\s+from|\s+refer|\s+please|$)").unwrap(),
        Regex::new(r"(?i)(?:research|analyze|find|about|for)\s+([A-Z][a-zA-Z\s&.]+?)(?:\s+company|\s+corp|\s+inc|\s+ltd|\s+please|$)").unwrap(),
        Regex::new(r"([A-Z][a-zA-Z\s&.]+?)\s+(?:company|corp|inc|ltd)").unwrap(),
        Regex::new(r"(?i)(?:company|corp|inc|ltd)\s+([A-Z][a-zA-Z\s&.]+)").unwrap(),
    ]
});

static TRAILING_WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+(by|from|refer|referring|please|pdf|document|uploaded)$").unwrap());
static TRAILING_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.,;:!?]+$").unwrap());

static DOCUMENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)([A-Z][a-zA-Z\s&]{2,30})\s+(?:inc\.|llc|ltd\.|corp\.|corporation|company)").unwrap(),
        Regex::new(r"(?i)(?:about|regarding|for)\s+([A-Z][a-zA-Z\s&]{2,30})").unwrap(),
    ]
});

fn clean(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_trailing_words = TRAILING_WORDS.replace(trimmed, "");
    let cleaned = TRAILING_PUNCTUATION.replace(&without_trailing_words, "").trim().to_string();
    if cleaned.chars().count() > 1 {
        Some(cleaned)
    } else {
        None
    }
}

fn extract_from(patterns: &[Regex], text: &str, min_len: usize, max_len: usize) -> Option<String> {
    for pattern in patterns {
        if let Some(captures) = pattern.captures(text) {
            if let Some(m) = captures.get(1) {
                let candidate = m.as_str().trim();
                if candidate.chars().count() >= min_len && candidate.chars().count() <= max_len {
                    if let Some(name) = clean(candidate) {
                        return Some(name);
                    }
                }
            }
        }
    }
    None
}

/// Extracts a company name from a user message's free text.
#[must_use]
pub fn extract_from_message(message: &str) -> Option<String> {
    extract_from(&MESSAGE_PATTERNS, message, 2, 200)
}

/// Extracts a company name from uploaded-document text, as a fallback when
/// the message itself names no company. The caller is responsible for the
/// "current message wins" precedence rule: this function should only be
/// consulted when [`extract_from_message`] returns `None`.
#[must_use]
pub fn extract_from_document_text(text: &str) -> Option<String> {
    extract_from(&DOCUMENT_PATTERNS, text, 3, 50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_company_after_research_cue() {
        assert_eq!(extract_from_message("please research Acme"), Some("Acme".to_string()));
    }

    #[test]
    fn extracts_company_before_corp_suffix() {
        assert_eq!(extract_from_message("tell me about Beta Corp"), Some("Beta".to_string()));
    }

    #[test]
    fn returns_none_for_messages_with_no_company() {
        assert_eq!(extract_from_message("hello there"), None);
    }

    #[test]
    fn extracts_from_document_text_inc_suffix() {
        assert_eq!(extract_from_document_text("This report covers Acme Widgets Inc. and its operations."), Some("Acme Widgets".to_string()));
    }

    #[test]
    fn strips_trailing_filler_words_and_punctuation() {
        assert_eq!(extract_from_message("research Acme Corp please."), Some("Acme".to_string()));
    }
}
