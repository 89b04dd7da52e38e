//! Entity accumulation across conversation turns.
//!
//! Each turn the AI interaction extracts structured facts ("budget",
//! "company", "escalate_now", ...). The accumulator folds them into the
//! per-session record, deciding per entity name how a new value competes
//! with the stored one.

mod accumulator;
mod strategy;

pub use accumulator::{AccumulatedEntity, EntityAccumulator, EntityMap, ExtractedEntity};
pub use strategy::{MergeStrategy, StrategyTable};
