//! Pure scoring function: clean text + metadata (+ optional query) → [`Score`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{ChunkMetadata, Score};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Domains treated as reputable sources. Membership is checked by substring
/// containment against the chunk's domain, so bare TLD-like entries (`gov`,
/// `edu`, `org`) also match subdomains and unrelated domains that merely
/// contain the substring.
const CREDIBLE_DOMAINS: &[&str] = &[
    "reuters.com",
    "bloomberg.com",
    "wsj.com",
    "ft.com",
    "economist.com",
    "nytimes.com",
    "washingtonpost.com",
    "theguardian.com",
    "forbes.com",
    "techcrunch.com",
    "wired.com",
    "gov",
    "edu",
    "org",
    "wikipedia.org",
    "linkedin.com",
    "crunchbase.com",
    "sec.gov",
];

const LOW_CREDIBILITY_DOMAINS: &[&str] = &["blogspot", "wordpress", "tumblr", "medium.com"];

const LOW_QUALITY_PATTERNS: &[&str] = &[
    "click here",
    "buy now",
    "sign up",
    "subscribe",
    "advertisement",
    "sponsored",
    "promoted",
    "cookie policy",
    "privacy policy",
    "terms of service",
];

/// Extracts the lowercased host from a URL, tolerating both
/// `scheme://host/path` and bare `host/path` forms.
fn domain_of(url: &str) -> Option<String> {
    url.split("://")
        .nth(1)
        .or(Some(url))
        .and_then(|rest| rest.split('/').next())
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty())
}

/// Credibility from domain reputation: known-reputable outlets score `1.0`,
/// known low-signal platforms score `0.3`, otherwise the domain's TLD
/// determines a tier (`.gov`/`.edu` `0.9`, `.org` `0.7`, `.com`/`.net`
/// `0.6`, else `0.5`). `0.5` when no domain is known at all.
fn score_credibility(metadata: &ChunkMetadata) -> f32 {
    let Some(domain) = metadata.url.as_deref().and_then(domain_of) else {
        return 0.5;
    };
    if CREDIBLE_DOMAINS.iter().any(|d| domain.contains(d)) {
        return 1.0;
    }
    if LOW_CREDIBILITY_DOMAINS.iter().any(|d| domain.contains(d)) {
        return 0.3;
    }
    if domain.ends_with(".gov") || domain.ends_with(".edu") {
        0.9
    } else if domain.ends_with(".org") {
        0.7
    } else if domain.ends_with(".com") || domain.ends_with(".net") {
        0.6
    } else {
        0.5
    }
}

/// Relevance via substring overlap between query words longer than 3
/// characters and the chunk text, scaled by `1.2` and capped at `1.0`.
/// Falls back to `0.5` when no query is known, or when the query has no
/// words longer than 3 characters.
fn score_relevance(text: &str, query: Option<&str>) -> f32 {
    let Some(query) = query else { return 0.5 };
    let lower_query = query.to_lowercase();
    let query_words: HashSet<String> = WORD.find_iter(&lower_query).map(|m| m.as_str().to_string()).filter(|w| w.len() > 3).collect();
    if query_words.is_empty() {
        return 0.5;
    }
    let lower_text = text.to_lowercase();
    let matches = query_words.iter().filter(|w| lower_text.contains(w.as_str())).count();
    let match_ratio = matches as f32 / query_words.len() as f32;
    (match_ratio * 1.2).min(1.0)
}

/// Quality starts at `1.0` and is penalized for low-quality boilerplate
/// patterns, short length, excessive length, and low lexical diversity; a
/// bonus is applied for paragraph breaks. Clamped to `[0.0, 1.0]`.
fn score_quality(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let lower_text = text.to_lowercase();
    let mut score = 1.0;

    for pattern in LOW_QUALITY_PATTERNS {
        if lower_text.contains(pattern) {
            score -= 0.1;
        }
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();
    if word_count < 50 {
        score -= 0.3;
    } else if word_count < 100 {
        score -= 0.1;
    }

    if text.chars().count() > 50_000 {
        score -= 0.2;
    }

    if text.matches("\n\n").count() > 3 {
        score += 0.1;
    }

    if word_count > 0 {
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let unique_count = lowered.iter().collect::<HashSet<_>>().len();
        let unique_ratio = unique_count as f32 / word_count as f32;
        if unique_ratio < 0.3 {
            score -= 0.3;
        }
    }

    score.clamp(0.0, 1.0)
}

/// Freshness from `retrieved_at` age relative to `now`, bucketed into
/// discrete bands: under 7 days `1.0`, under 30 `0.8`, under 90 `0.6`,
/// under 365 `0.4`, otherwise `0.2`. `0.5` when either timestamp fails to
/// parse.
fn score_freshness(retrieved_at: &str, now: &str) -> f32 {
    let parse_days = |s: &str| -> Option<i64> {
        let date_part = s.split('T').next()?;
        let mut parts = date_part.split('-');
        let year: i64 = parts.next()?.parse().ok()?;
        let month: i64 = parts.next()?.parse().ok()?;
        let day: i64 = parts.next()?.parse().ok()?;
        Some(year * 365 + month * 30 + day)
    };
    match (parse_days(retrieved_at), parse_days(now)) {
        (Some(retrieved), Some(current)) => {
            let age_days = (current - retrieved).max(0);
            if age_days < 7 {
                1.0
            } else if age_days < 30 {
                0.8
            } else if age_days < 90 {
                0.6
            } else if age_days < 365 {
                0.4
            } else {
                0.2
            }
        }
        _ => 0.5,
    }
}

/// Readability from average sentence length (words per sentence, split on
/// `.`/`!`/`?`): `10..=25` words scores `1.0`, `5..10` or `25<..=35` scores
/// `0.7`, otherwise `0.4`. Averaged with the fraction of sentence fragments
/// still ending in terminal punctuation after the split consumed it, which
/// is `0.0` in practice.
fn score_readability(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let sentences: Vec<&str> = text.split(['.', '!', '?']).map(str::trim).filter(|s| !s.is_empty()).collect();
    if sentences.is_empty() {
        return 0.0;
    }
    let total_words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
    let avg_len = total_words as f32 / sentences.len() as f32;
    let readability = if (10.0..=25.0).contains(&avg_len) {
        1.0
    } else if (5.0..10.0).contains(&avg_len) || (25.0..=35.0).contains(&avg_len) {
        0.7
    } else {
        0.4
    };
    let proper_punctuation = sentences.iter().filter(|s| s.ends_with(['.', '!', '?'])).count();
    let punctuation_ratio = proper_punctuation as f32 / sentences.len() as f32;
    (readability + punctuation_ratio) / 2.0
}

/// Scores a chunk's text along all five dimensions. `now` and
/// `metadata.retrieved_at` are ISO8601 timestamps (`YYYY-MM-DD...`).
#[must_use]
pub fn score_chunk(text: &str, metadata: &ChunkMetadata, now: &str) -> Score {
    Score::new(
        score_freshness(&metadata.retrieved_at, now),
        score_credibility(metadata),
        score_quality(text),
        score_relevance(text, metadata.query.as_deref()),
        score_readability(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceOrigin;

    fn metadata(url: Option<&str>, query: Option<&str>, retrieved_at: &str) -> ChunkMetadata {
        ChunkMetadata {
            url: url.map(str::to_string),
            source_kind: SourceOrigin::WebSearch,
            user_id: "u1".to_string(),
            company: "Acme Corp".to_string(),
            retrieved_at: retrieved_at.to_string(),
            chunk_index: 0,
            total_chunks: 1,
            char_count: 0,
            word_count: 0,
            title: None,
            query: query.map(str::to_string),
        }
    }

    #[test]
    fn reputable_domain_scores_higher_credibility_than_unknown() {
        let reputable = metadata(Some("https://www.reuters.com/article"), None, "2026-01-01");
        let unknown = metadata(Some("https://randomblog.xyz/post"), None, "2026-01-01");
        let score_a = score_chunk("some text here that is reasonably long for scoring purposes.", &reputable, "2026-01-01");
        let score_b = score_chunk("some text here that is reasonably long for scoring purposes.", &unknown, "2026-01-01");
        assert!(score_a.credibility > score_b.credibility);
    }

    #[test]
    fn low_credibility_platform_scores_below_unknown_domain() {
        let blog = metadata(Some("https://example.wordpress.com/post"), None, "2026-01-01");
        let score = score_chunk("some text here that is reasonably long for scoring purposes.", &blog, "2026-01-01");
        assert_eq!(score.credibility, 0.3);
    }

    #[test]
    fn named_gov_domain_scores_full_credibility() {
        let gov = metadata(Some("https://www.sec.gov/filing"), None, "2026-01-01");
        let score = score_chunk("some text here that is reasonably long for scoring purposes.", &gov, "2026-01-01");
        assert_eq!(score.credibility, 1.0);
    }

    #[test]
    fn unrecognized_dot_com_domain_scores_commercial_tld_tier() {
        // "examplenews.com" contains none of the named credible/low-credibility
        // substrings, so it falls through to the `.com`/`.net` TLD tier.
        let unknown = metadata(Some("https://www.examplenews.com/story"), None, "2026-01-01");
        let score = score_chunk("some text here that is reasonably long for scoring purposes.", &unknown, "2026-01-01");
        assert_eq!(score.credibility, 0.6);
    }

    #[test]
    fn relevance_reflects_query_term_overlap() {
        let m = metadata(None, Some("Acme revenue growth"), "2026-01-01");
        let matching = score_chunk("Acme reported strong revenue growth this quarter.", &m, "2026-01-01");
        let non_matching = score_chunk("The weather today is sunny and mild.", &m, "2026-01-01");
        assert!(matching.relevance > non_matching.relevance);
    }

    #[test]
    fn relevance_scales_match_ratio_by_1_2_and_caps_at_1() {
        let m = metadata(None, Some("revenue"), "2026-01-01");
        let score = score_chunk("revenue revenue revenue", &m, "2026-01-01");
        assert_eq!(score.relevance, 1.0);
    }

    #[test]
    fn relevance_ignores_query_words_of_three_chars_or_fewer() {
        let m = metadata(None, Some("the and big"), "2026-01-01");
        let score = score_chunk("the and big company reported strong results.", &m, "2026-01-01");
        assert_eq!(score.relevance, 0.5);
    }

    #[test]
    fn freshness_decays_with_age() {
        let recent = metadata(None, None, "2026-01-01");
        let stale = metadata(None, None, "2020-01-01");
        let score_recent = score_chunk("text", &recent, "2026-01-15");
        let score_stale = score_chunk("text", &stale, "2026-01-15");
        assert!(score_recent.freshness > score_stale.freshness);
    }

    #[test]
    fn freshness_buckets_are_discrete() {
        let m = metadata(None, None, "2026-01-01");
        assert_eq!(score_chunk("text", &m, "2026-01-05").freshness, 1.0);
        assert_eq!(score_chunk("text", &m, "2026-01-20").freshness, 0.8);
        assert_eq!(score_chunk("text", &m, "2026-03-01").freshness, 0.6);
        assert_eq!(score_chunk("text", &m, "2026-10-01").freshness, 0.4);
        assert_eq!(score_chunk("text", &m, "2028-01-01").freshness, 0.2);
    }

    #[test]
    fn empty_text_has_zero_quality_and_readability() {
        let m = metadata(None, None, "2026-01-01");
        let score = score_chunk("", &m, "2026-01-01");
        assert_eq!(score.quality, 0.0);
        assert_eq!(score.readability, 0.0);
    }

    #[test]
    fn boilerplate_patterns_reduce_quality_score() {
        let m = metadata(None, None, "2026-01-01");
        let long_text = "word ".repeat(200);
        let clean = score_chunk(&long_text, &m, "2026-01-01");
        let boilerplate = score_chunk(&format!("{long_text} click here to subscribe now"), &m, "2026-01-01");
        assert!(boilerplate.quality < clean.quality);
    }
}
