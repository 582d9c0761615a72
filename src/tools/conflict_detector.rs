//! Cross-document conflict detection over extracted topical values.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Chunk, Conflict, ConflictSource, ConflictTopic, Severity};

static REVENUE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)revenue[s]?\s+(?:of|was|is|reached|totaled|totaling)?\s*\$?\s*([\d,.]+)\s*(billion|million|thousand|bn|mn|k)?").unwrap());
static HEADCOUNT_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)([\d,]+)\+?\s*(?:employees|staff|workers|people|headcount)").unwrap());
static FOUNDED_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)founded\s+in\s+(\d{4})|established\s+in\s+(\d{4})|since\s+(\d{4})").unwrap());
static LOCATION_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:headquartered|based|located)\s+in\s+([A-Z][a-zA-Z\s,]+?)(?:\.|,\s*(?:and|with)|$)").unwrap());

const TOPIC_KEYWORDS: &[(ConflictTopic, &[&str])] = &[
    (ConflictTopic::Revenue, &["revenue"]),
    (ConflictTopic::Headcount, &["employees", "staff", "workers", "headcount"]),
    (ConflictTopic::Founded, &["founded", "established", "since"]),
    (ConflictTopic::Location, &["headquartered", "based in", "located in"]),
];

fn multiplier(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "billion" | "bn" => 1_000_000_000.0,
        "million" | "mn" => 1_000_000.0,
        "thousand" | "k" => 1_000.0,
        _ => 1.0,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Extracts this topic's characteristic value from `text`, if present.
fn extract_value(topic: ConflictTopic, text: &str) -> Option<String> {
    match topic {
        ConflictTopic::Revenue => {
            let caps = REVENUE_VALUE.captures(text)?;
            let number = parse_number(caps.get(1)?.as_str())?;
            let unit = caps.get(2).map_or("", |m| m.as_str());
            Some((number * multiplier(unit)).to_string())
        }
        ConflictTopic::Headcount => {
            let caps = HEADCOUNT_VALUE.captures(text)?;
            Some(parse_number(caps.get(1)?.as_str())?.to_string())
        }
        ConflictTopic::Founded => {
            let caps = FOUNDED_VALUE.captures(text)?;
            caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map(|m| m.as_str().to_string())
        }
        ConflictTopic::Location => LOCATION_VALUE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string()),
    }
}

/// Whether two extracted values for `topic` differ enough to report: revenue
/// >10% relative difference, headcount >15%, founded year >2 years apart,
/// location any distinct normalized string.
fn are_significantly_different(topic: ConflictTopic, a: &str, b: &str) -> bool {
    match topic {
        ConflictTopic::Revenue => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) if x > 0.0 && y > 0.0 => ((x - y).abs() / x.min(y)) > 0.10,
            _ => a != b,
        },
        ConflictTopic::Headcount => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) if x > 0.0 && y > 0.0 => ((x - y).abs() / x.min(y)) > 0.15,
            _ => a != b,
        },
        ConflictTopic::Founded => match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => (x - y).abs() > 2,
            _ => a != b,
        },
        ConflictTopic::Location => !a.eq_ignore_ascii_case(b),
    }
}

/// Every tracked topic is a factual, verifiable claim, so all four are
/// `High` severity.
fn severity_for(topic: ConflictTopic) -> Severity {
    match topic {
        ConflictTopic::Revenue | ConflictTopic::Headcount | ConflictTopic::Founded | ConflictTopic::Location => Severity::High,
    }
}

struct Extraction<'a> {
    value: String,
    chunk: &'a Chunk,
}

/// Scans `chunks` grouped by document for conflicting values on the fixed
/// set of tracked topics. Chunks from the same document are never compared
/// against each other (a document cannot conflict with itself).
#[must_use]
pub fn detect_conflicts(chunks: &[Chunk]) -> Vec<Conflict> {
    let mut by_document: HashMap<String, Vec<&Chunk>> = HashMap::new();
    for chunk in chunks {
        by_document.entry(chunk.document_id()).or_default().push(chunk);
    }

    let mut conflicts = Vec::new();

    for (topic, keywords) in TOPIC_KEYWORDS {
        let mut per_document: Vec<Extraction<'_>> = Vec::new();
        for (_, doc_chunks) in &by_document {
            for chunk in doc_chunks {
                let lower = chunk.text.to_lowercase();
                if !keywords.iter().any(|k| lower.contains(k)) {
                    continue;
                }
                if let Some(value) = extract_value(*topic, &chunk.text) {
                    per_document.push(Extraction { value, chunk });
                    break;
                }
            }
        }

        if per_document.len() < 2 {
            continue;
        }

        let mut conflicting_values = Vec::new();
        let mut sources = Vec::new();
        let mut flagged = false;
        for i in 0..per_document.len() {
            for j in (i + 1)..per_document.len() {
                if per_document[i].chunk.document_id() == per_document[j].chunk.document_id() {
                    continue;
                }
                if are_significantly_different(*topic, &per_document[i].value, &per_document[j].value) {
                    flagged = true;
                    for extraction in [&per_document[i], &per_document[j]] {
                        if !conflicting_values.contains(&extraction.value) {
                            conflicting_values.push(extraction.value.clone());
                            sources.push(ConflictSource {
                                value: extraction.value.clone(),
                                document_id: extraction.chunk.document_id(),
                                source_kind: extraction.chunk.metadata.source_kind,
                                source_file_or_url: extraction.chunk.metadata.url.clone().unwrap_or_else(|| extraction.chunk.document_id()),
                            });
                        }
                    }
                }
            }
        }

        if flagged {
            conflicts.push(Conflict {
                topic: *topic,
                conflicting_values,
                sources,
                severity: severity_for(*topic),
            });
        }
    }

    conflicts
}
