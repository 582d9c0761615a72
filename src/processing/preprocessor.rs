//! Raw content → normalized clean text + metadata.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};

/// Shape of content handed to the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Raw HTML.
    Html,
    /// Markdown source.
    Markdown,
    /// Already-plain text.
    Text,
}

/// Metadata produced alongside the cleaned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessedMetadata {
    /// Source URL, if any.
    pub url: Option<String>,
    /// Domain extracted from `url`.
    pub domain: Option<String>,
    /// Two-letter language code, or `"unknown"`.
    pub language: String,
    /// Word count of the cleaned text.
    pub word_count: usize,
    /// Character count of the cleaned text.
    pub char_count: usize,
}

/// Output of [`preprocess`].
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    /// Cleaned text (empty if input was below `min_text_length`).
    pub text: String,
    /// Metadata about the cleaned text.
    pub metadata: PreprocessedMetadata,
}

static TRACKING_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(rut|utm_\w*|ref|source|campaign|medium|term|content|uddg)=[a-zA-Z0-9_-]+").unwrap()
});
static AMP_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&[a-zA-Z0-9_]+=[a-zA-Z0-9_-]+").unwrap());
static URL_ENCODED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").unwrap());
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").unwrap());
static HEX_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b[0-9a-f]{32,}\b").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

static MD_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static MD_BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static MD_ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static MD_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static MD_CODE_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static MD_CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());

const ENGLISH_INDICATORS: &[&str] = &["the", "and", "is", "are", "was", "were", "this", "that"];

/// Extracts clean text from HTML using a readability-style heuristic: prefer
/// `<main>`/`<article>`/content-named containers, falling back to the whole
/// body. Scripts, styles, nav, footer, header, and aside are always
/// stripped.
fn extract_from_html(html: &str) -> String {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);

    let candidates = [
        "main",
        "article",
        "div[class*=content]",
        "div[class*=main]",
        "div[class*=article]",
        "body",
    ];

    for selector_str in candidates {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = extract_element_text(&element);
                if text.chars().count() > 0 {
                    return text;
                }
            }
        }
    }

    // Fallback: every text node in the document.
    document.root_element().text().collect::<Vec<_>>().join(" ")
}

fn extract_element_text(element: &scraper::ElementRef<'_>) -> String {
    const SKIP_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];
    let mut out = String::new();
    for node in element.text() {
        out.push_str(node);
        out.push(' ');
    }
    // scraper's `.text()` already skips non-text nodes like <script>/<style>
    // content at the tree level in most documents, but guard defensively by
    // stripping any residual tag-name tokens that slipped through inline.
    for tag in SKIP_TAGS {
        out = out.replace(tag, "");
    }
    WHITESPACE.replace_all(out.trim(), " ").to_string()
}

fn extract_from_markdown(markdown: &str) -> String {
    let text = MD_HEADER.replace_all(markdown, "");
    let text = MD_BOLD.replace_all(&text, "$1");
    let text = MD_ITALIC.replace_all(&text, "$1");
    let text = MD_LINK.replace_all(&text, "$1");
    let text = MD_CODE_SPAN.replace_all(&text, "$1");
    let text = MD_CODE_BLOCK.replace_all(&text, "");
    text.trim().to_string()
}

fn normalize_text(text: &str) -> String {
    let text = URL_ENCODED.replace_all(text, "");
    let text = URL_PATTERN.replace_all(&text, "");
    let text = TRACKING_PARAM.replace_all(&text, "");
    let text = AMP_PARAM.replace_all(&text, "");
    let text = HEX_ID.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = PARAGRAPH_BREAK.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn detect_language(text: &str) -> String {
    let lower = text.to_lowercase();
    if ENGLISH_INDICATORS.iter().any(|w| lower.contains(w)) {
        "en".to_string()
    } else {
        "unknown".to_string()
    }
}

/// Removes lines that are too short, mostly punctuation, or degenerate
/// repeats of a single character — low-quality boilerplate remnants.
fn remove_low_quality_content(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| line.chars().count() >= 10)
        .filter(|line| {
            let alnum_count = line.chars().filter(|c| c.is_alphanumeric() || c.is_whitespace()).count();
            alnum_count as f64 >= line.chars().count() as f64 * 0.3
        })
        .filter(|line| line.chars().collect::<std::collections::HashSet<_>>().len() >= 3)
        .collect::<Vec<_>>()
        .join("\n")
}

fn domain_of(url: &str) -> Option<String> {
    url.split("://")
        .nth(1)
        .or(Some(url))
        .and_then(|rest| rest.split('/').next())
        .map(std::string::ToString::to_string)
        .filter(|s| !s.is_empty())
}

/// Runs the full preprocessing pipeline: extract → normalize → detect
/// language → remove low-quality lines → truncate to `max_text_length`.
///
/// Returns `Ok` with empty `text` (not an error) when the post-normalization
/// length falls below `min_text_length`. Fails with [`Error::InvalidInput`]
/// only when `raw_content` is empty.
#[tracing::instrument(skip(raw_content, config), fields(content_kind = ?content_kind, raw_len = raw_content.len()))]
pub fn preprocess(
    raw_content: &str,
    content_kind: ContentKind,
    source_url: Option<&str>,
    config: &PipelineConfig,
) -> Result<Preprocessed> {
    if raw_content.is_empty() {
        return Err(Error::InvalidInput("raw_content must not be empty".to_string()));
    }

    let extracted = match content_kind {
        ContentKind::Html => extract_from_html(raw_content),
        ContentKind::Markdown => extract_from_markdown(raw_content),
        ContentKind::Text => raw_content.trim().to_string(),
    };

    if extracted.chars().count() < config.min_text_length {
        tracing::debug!(extracted_len = extracted.chars().count(), min_text_length = config.min_text_length, "content below minimum length, discarding");
        return Ok(Preprocessed {
            text: String::new(),
            metadata: PreprocessedMetadata {
                url: source_url.map(str::to_string),
                domain: source_url.and_then(domain_of),
                language: "unknown".to_string(),
                word_count: 0,
                char_count: 0,
            },
        });
    }

    let normalized = normalize_text(&extracted);
    let language = detect_language(&normalized);
    let cleaned = remove_low_quality_content(&normalized);

    let truncated: String = cleaned.chars().take(config.max_text_length).collect();
    let word_count = truncated.split_whitespace().count();
    let char_count = truncated.chars().count();
    tracing::debug!(word_count, char_count, language = language.as_str(), "preprocessing complete");

    Ok(Preprocessed {
        text: truncated,
        metadata: PreprocessedMetadata {
            url: source_url.map(str::to_string),
            domain: source_url.and_then(domain_of),
            language,
            word_count,
            char_count,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn empty_raw_content_is_invalid_input() {
        let result = preprocess("", ContentKind::Text, None, &cfg());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn below_min_length_is_empty_not_error() {
        let result = preprocess("too short", ContentKind::Text, None, &cfg()).unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.metadata.language, "unknown");
    }

    #[test]
    fn strips_urls_and_tracking_params() {
        let text = "Check this out https://example.com/page?utm_source=abc and www.foo.com/bar more padding text here to clear the minimum length threshold comfortably so normalization runs as expected across the whole pipeline.";
        let result = preprocess(text, ContentKind::Text, None, &cfg()).unwrap();
        assert!(!result.text.contains("https://"));
        assert!(!result.text.contains("utm_source"));
    }

    #[test]
    fn strips_hex_tracking_ids() {
        let text = format!(
            "Some article content with a tracking id {} embedded inline for good measure and plenty of padding words to exceed the minimum length threshold comfortably.",
            "a".repeat(32)
        );
        let result = preprocess(&text, ContentKind::Text, None, &cfg()).unwrap();
        assert!(!result.text.contains(&"a".repeat(32)));
    }

    #[test]
    fn markdown_is_desyntaxed() {
        let md = "# Heading\n\nSome **bold** and *italic* text with a [link](https://example.com) and `code` and enough padding words to clear the minimum length threshold for preprocessing to actually run end to end.";
        let result = preprocess(md, ContentKind::Markdown, None, &cfg()).unwrap();
        assert!(!result.text.contains('#'));
        assert!(!result.text.contains("**"));
        assert!(result.text.contains("bold"));
        assert!(result.text.contains("link"));
    }

    #[test]
    fn detects_english_via_common_words() {
        let text = "This is a long piece of text that is clearly written in English and contains enough common words to trigger the heuristic detector reliably across many runs.";
        let result = preprocess(text, ContentKind::Text, None, &cfg()).unwrap();
        assert_eq!(result.metadata.language, "en");
    }

    #[test]
    fn domain_extracted_from_url() {
        let text = "A sufficiently long piece of plain text content to pass the minimum length check comfortably for this preprocessing test case to validate domain extraction.";
        let result = preprocess(text, ContentKind::Text, Some("https://news.example.com/a/b"), &cfg()).unwrap();
        assert_eq!(result.metadata.domain.as_deref(), Some("news.example.com"));
    }

    #[test]
    fn preprocess_is_idempotent() {
        let text = "A company with revenue of $100 million and 500 employees based in Austin announced new products today as part of a long press release that easily clears the minimum length threshold for this test.";
        let once = preprocess(text, ContentKind::Text, None, &cfg()).unwrap();
        let twice = preprocess(&once.text, ContentKind::Text, None, &cfg()).unwrap();
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn truncates_to_max_text_length() {
        let config = PipelineConfig {
            max_text_length: 50,
            ..PipelineConfig::default()
        };
        let text = "word ".repeat(100);
        let result = preprocess(&text, ContentKind::Text, None, &config).unwrap();
        assert!(result.text.chars().count() <= 50);
    }
}
