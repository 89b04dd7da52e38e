//! Leadchat - conversational session processing with lead qualification
//!
//! This crate turns one inbound visitor message into an updated chat session,
//! a generated reply, accumulated entities and a lead-capture decision, under
//! a strict token budget and fallible external capabilities.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
