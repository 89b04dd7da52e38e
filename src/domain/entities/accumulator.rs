//! Cross-turn entity merge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::strategy::{normalize_name, MergeStrategy, StrategyTable};

/// An entity extracted from a single visitor turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Entity name, e.g. "budget".
    pub name: String,
    /// Extracted value.
    pub value: Value,
    /// Extraction confidence (0.0 - 1.0).
    pub confidence: f64,
}

impl ExtractedEntity {
    /// Creates an extracted entity.
    pub fn new(name: impl Into<String>, value: impl Into<Value>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            confidence,
        }
    }
}

/// The durable per-session record of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedEntity {
    /// Current value.
    pub value: Value,
    /// Confidence of the current value.
    pub confidence: f64,
    /// Every turn that mentioned this entity, in order.
    pub source_turns: Vec<u32>,
}

impl AccumulatedEntity {
    /// Returns the value as a string slice when it is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// Accumulated entities keyed by normalized name.
pub type EntityMap = BTreeMap<String, AccumulatedEntity>;

/// Merges newly extracted entities into the accumulated record.
///
/// # Rules
///
/// - A new name is inserted with its confidence and `source_turns = [turn]`.
/// - An existing name keeps or replaces its value according to the
///   strategy table, and the turn is appended to `source_turns` either way.
#[derive(Debug, Clone, Default)]
pub struct EntityAccumulator {
    strategies: StrategyTable,
}

impl EntityAccumulator {
    /// Creates an accumulator with the default strategy table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator with a custom strategy table.
    pub fn with_table(strategies: StrategyTable) -> Self {
        Self { strategies }
    }

    /// Adds or overrides the strategy for one entity name.
    pub fn with_strategy(mut self, name: impl AsRef<str>, strategy: MergeStrategy) -> Self {
        self.strategies = self.strategies.with(name, strategy);
        self
    }

    /// Returns the strategy table.
    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    /// Merges `incoming` into a copy of `existing` for the given turn.
    pub fn merge(&self, existing: &EntityMap, incoming: &[ExtractedEntity], turn: u32) -> EntityMap {
        let mut merged = existing.clone();

        for entity in incoming {
            let name = normalize_name(&entity.name);
            if name.is_empty() || entity.value.is_null() {
                continue;
            }
            let confidence = clamp_confidence(entity.confidence);

            match merged.get_mut(&name) {
                None => {
                    merged.insert(
                        name,
                        AccumulatedEntity {
                            value: entity.value.clone(),
                            confidence,
                            source_turns: vec![turn],
                        },
                    );
                }
                Some(stored) => {
                    let strategy = self.strategies.resolve(&name, &entity.value);
                    if replaces(strategy, stored, &entity.value, confidence) {
                        stored.value = entity.value.clone();
                        stored.confidence = confidence;
                    }
                    if stored.source_turns.last() != Some(&turn) {
                        stored.source_turns.push(turn);
                    }
                }
            }
        }

        merged
    }
}

fn replaces(strategy: MergeStrategy, stored: &AccumulatedEntity, value: &Value, confidence: f64) -> bool {
    match strategy {
        MergeStrategy::MostRecent => true,
        MergeStrategy::ConfidenceMax => confidence > stored.confidence,
        MergeStrategy::NumericMax => match (as_number(&stored.value), as_number(value)) {
            (Some(current), Some(candidate)) => candidate > current,
            _ => confidence > stored.confidence,
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
