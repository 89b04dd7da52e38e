//! Declarative entity-name → merge-strategy table.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How an incoming value competes with a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep whichever value carries the higher confidence. Ties keep the stored value.
    ConfidenceMax,
    /// The latest value always replaces the stored one.
    MostRecent,
    /// Keep the larger number. Non-numeric values fall back to `ConfidenceMax`.
    NumericMax,
}

/// Entities that express current intent rather than an accumulating fact.
const MOST_RECENT: &[&str] = &[
    "escalate_now",
    "wants_human_agent",
    "wants_demo",
    "wants_trial",
    "ready_to_buy",
    "unsubscribe_requested",
    "urgency",
];

/// Counts where the largest figure mentioned is the meaningful one.
const NUMERIC_MAX: &[&str] = &["team_size", "employee_count", "seat_count", "user_count"];

static DEFAULT_TABLE: Lazy<HashMap<String, MergeStrategy>> = Lazy::new(|| {
    MOST_RECENT
        .iter()
        .map(|name| (name.to_string(), MergeStrategy::MostRecent))
        .chain(
            NUMERIC_MAX
                .iter()
                .map(|name| (name.to_string(), MergeStrategy::NumericMax)),
        )
        .collect()
});

/// Lookup table from normalized entity name to strategy.
///
/// Names missing from the table use `MostRecent` when the incoming value is
/// a JSON boolean (a flag) and `ConfidenceMax` otherwise.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    entries: HashMap<String, MergeStrategy>,
}

impl StrategyTable {
    /// Creates an empty table (every name uses the fallback rule).
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds or replaces the strategy for a name.
    pub fn with(mut self, name: impl AsRef<str>, strategy: MergeStrategy) -> Self {
        self.entries.insert(normalize_name(name.as_ref()), strategy);
        self
    }

    /// Returns the explicitly configured strategy for a name, if any.
    pub fn get(&self, name: &str) -> Option<MergeStrategy> {
        self.entries.get(&normalize_name(name)).copied()
    }

    /// Resolves the strategy for an entity, applying the fallback rule.
    pub fn resolve(&self, name: &str, incoming: &serde_json::Value) -> MergeStrategy {
        self.get(name).unwrap_or(if incoming.is_boolean() {
            MergeStrategy::MostRecent
        } else {
            MergeStrategy::ConfidenceMax
        })
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no explicit entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_TABLE.clone(),
        }
    }
}

/// Canonical form of an entity name: trimmed, lowercase, spaces and dashes as underscores.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
