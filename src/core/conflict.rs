//! Cross-document conflicts detected by [`crate::tools::conflict_detector`].

use serde::{Deserialize, Serialize};

use super::chunk::SourceOrigin;

/// The fixed set of topics the conflict detector reconciles across
/// documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictTopic {
    /// Revenue figures.
    Revenue,
    /// Employee headcount.
    Headcount,
    /// Founding year.
    Founded,
    /// Headquarters location.
    Location,
}

/// How serious a conflict is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity.
    Low,
    /// Medium severity (non-factual topics).
    Medium,
    /// High severity (factual topics: revenue, headcount, founded, location).
    High,
}

/// One document's contribution to a conflict: the value it asserted and
/// where that value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictSource {
    /// The value this document asserted for the topic.
    pub value: String,
    /// Stable identifier of the contributing document.
    pub document_id: String,
    /// Where the document's text came from.
    pub source_kind: SourceOrigin,
    /// The document's file path or URL, whichever is known.
    pub source_file_or_url: String,
}

/// A disagreement about a single factual topic across `>=2` distinct
/// documents, where the values differ significantly (see
/// [`crate::tools::conflict_detector`] for thresholds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// The topic in disagreement.
    pub topic: ConflictTopic,
    /// Distinct normalized values asserted across documents.
    pub conflicting_values: Vec<String>,
    /// Per-value provenance.
    pub sources: Vec<ConflictSource>,
    /// Severity of the conflict.
    pub severity: Severity,
}

impl Conflict {
    /// The number of distinct documents backing this conflict.
    #[must_use]
    pub fn distinct_document_count(&self) -> usize {
        let mut ids: Vec<&str> = self.sources.iter().map(|s| s.document_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(doc: &str, value: &str) -> ConflictSource {
        ConflictSource {
            value: value.to_string(),
            document_id: doc.to_string(),
            source_kind: SourceOrigin::WebSearch,
            source_file_or_url: doc.to_string(),
        }
    }

    #[test]
    fn distinct_document_count_dedupes() {
        let conflict = Conflict {
            topic: ConflictTopic::Revenue,
            conflicting_values: vec!["100".to_string(), "250".to_string()],
            sources: vec![
                source("docA", "100"),
                source("docA", "100"),
                source("docB", "250"),
            ],
            severity: Severity::High,
        };
        assert_eq!(conflict.distinct_document_count(), 2);
    }
}
