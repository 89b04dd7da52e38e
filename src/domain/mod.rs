//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `conversation` - Messages, token budget, intent and flow signals
//! - `entities` - Cross-turn entity accumulation
//! - `session` - Chat session aggregate and lead-qualification sub-state
//! - `chatbot` - Chatbot configuration
//! - `lead` - Lead-capture decision rules and engagement scoring

pub mod chatbot;
pub mod conversation;
pub mod entities;
pub mod foundation;
pub mod lead;
pub mod session;
