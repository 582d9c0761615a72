//! Multi-dimensional chunk scoring.

use serde::{Deserialize, Serialize};

/// Weight applied to the credibility dimension when computing [`Score::total`].
pub const WEIGHT_CREDIBILITY: f32 = 0.25;
/// Weight applied to the relevance dimension.
pub const WEIGHT_RELEVANCE: f32 = 0.30;
/// Weight applied to the quality dimension.
pub const WEIGHT_QUALITY: f32 = 0.20;
/// Weight applied to the freshness dimension.
pub const WEIGHT_FRESHNESS: f32 = 0.15;
/// Weight applied to the readability dimension.
pub const WEIGHT_READABILITY: f32 = 0.10;

/// A chunk's score along five dimensions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// How recent the source material is.
    pub freshness: f32,
    /// How trustworthy the source domain is.
    pub credibility: f32,
    /// Intrinsic text quality (length, boilerplate, lexical diversity).
    pub quality: f32,
    /// Keyword overlap with the query.
    pub relevance: f32,
    /// Sentence-length-based readability.
    pub readability: f32,
}

impl Score {
    /// Builds a score from its five dimensions, clamping each to `[0, 1]`.
    #[must_use]
    pub fn new(freshness: f32, credibility: f32, quality: f32, relevance: f32, readability: f32) -> Self {
        Self {
            freshness: freshness.clamp(0.0, 1.0),
            credibility: credibility.clamp(0.0, 1.0),
            quality: quality.clamp(0.0, 1.0),
            relevance: relevance.clamp(0.0, 1.0),
            readability: readability.clamp(0.0, 1.0),
        }
    }

    /// The weighted total across all five dimensions, always in `[0, 1]`.
    #[must_use]
    pub fn total(&self) -> f32 {
        (self.credibility * WEIGHT_CREDIBILITY
            + self.relevance * WEIGHT_RELEVANCE
            + self.quality * WEIGHT_QUALITY
            + self.freshness * WEIGHT_FRESHNESS
            + self.readability * WEIGHT_READABILITY)
            .clamp(0.0, 1.0)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5, 0.5)
    }
}
