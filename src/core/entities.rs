//! The closed set of extractable entity kinds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A closed set of entity kinds the [`crate::tools::entity_extractor`]
/// recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Revenue figures.
    Revenue,
    /// Profit / net income figures.
    Profit,
    /// Employee headcount.
    Employees,
    /// Market capitalization.
    MarketCap,
    /// Named products.
    Products,
    /// Named services.
    Services,
    /// Named competitors.
    Competitors,
    /// Named locations.
    Locations,
    /// Named people (executives, founders).
    People,
}

impl EntityKind {
    /// All entity kinds, in the closed-set enumeration order used when
    /// serializing an [`Entities`] map.
    pub const ALL: [Self; 9] = [
        Self::Revenue,
        Self::Profit,
        Self::Employees,
        Self::MarketCap,
        Self::Products,
        Self::Services,
        Self::Competitors,
        Self::Locations,
        Self::People,
    ];
}

/// A mapping from entity kind to an ordered, deduplicated (case-insensitive)
/// list of normalized string values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    values: BTreeMap<EntityKind, Vec<String>>,
}

impl Entities {
    /// An empty entity map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Values recorded for a given entity kind, or an empty slice.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> &[String] {
        self.values.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Appends a value under `kind`, preserving insertion order and
    /// filtering case-insensitive duplicates.
    pub fn push(&mut self, kind: EntityKind, value: impl Into<String>) {
        let value = value.into();
        let entry = self.values.entry(kind).or_default();
        if !entry.iter().any(|existing| existing.eq_ignore_ascii_case(&value)) {
            entry.push(value);
        }
    }

    /// Replaces all values for `kind`, deduplicating case-insensitively
    /// while preserving first-seen order.
    pub fn set(&mut self, kind: EntityKind, values: impl IntoIterator<Item = String>) {
        let mut deduped: Vec<String> = Vec::new();
        for value in values {
            if !deduped.iter().any(|existing: &String| existing.eq_ignore_ascii_case(&value)) {
                deduped.push(value);
            }
        }
        self.values.insert(kind, deduped);
    }

    /// Iterates over all `(kind, values)` pairs that have at least one
    /// value, in [`EntityKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &[String])> {
        EntityKind::ALL
            .into_iter()
            .filter_map(move |kind| self.values.get(&kind).map(|v| (kind, v.as_slice())))
    }

    /// True if no entity kind has any recorded values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.values().all(Vec::is_empty)
    }
}
