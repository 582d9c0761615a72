//! Source references used for citations.

use serde::{Deserialize, Serialize};

/// The kind of a cited source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A news article.
    News,
    /// A PDF document.
    Pdf,
    /// A generic website.
    Website,
    /// A structured API response.
    Api,
}

/// A single citation: where a piece of information came from and when it
/// was extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    /// Source URL.
    pub url: String,
    /// Source kind.
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// ISO8601 extraction timestamp.
    pub extracted_at: String,
}

impl SourceReference {
    /// Builds a new source reference.
    #[must_use]
    pub fn new(url: impl Into<String>, kind: SourceKind, extracted_at: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            extracted_at: extracted_at.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_type_field_as_type_not_kind() {
        let source = SourceReference::new("https://example.com", SourceKind::News, "2026-01-01T00:00:00Z");
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "news");
        assert!(json.get("kind").is_none());
    }
}
