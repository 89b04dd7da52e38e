//! Applies the token budget to a session's message history.

use serde::Serialize;

use super::context_window::ConversationContextWindow;
use super::message::{ChatMessage, MessageRole};

/// Visitor messages quoted in an extractive summary.
const MAX_SUMMARY_MESSAGES: usize = 3;
/// Characters quoted per visitor message.
const SUMMARY_SNIPPET_CHARS: usize = 50;

/// The history split into what is sent and what is folded into the summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageWindow {
    /// Newest messages that fit the budget, oldest first.
    pub recent: Vec<ChatMessage>,
    /// Oldest messages that no longer fit, oldest first.
    pub summarized: Vec<ChatMessage>,
    /// Estimated tokens of the whole history.
    pub total_tokens: u32,
    /// Estimated tokens of `recent`.
    pub window_tokens: u32,
}

impl MessageWindow {
    /// Returns true if any message was folded out of the window.
    pub fn was_summarized(&self) -> bool {
        !self.summarized.is_empty()
    }

    /// Extractive summary of the folded messages, or `None` when nothing was folded.
    pub fn summary_text(&self) -> Option<String> {
        if self.summarized.is_empty() {
            return None;
        }

        let snippets: Vec<String> = self
            .summarized
            .iter()
            .filter(|m| m.role() == MessageRole::User)
            .take(MAX_SUMMARY_MESSAGES)
            .map(|m| snippet(m.content()))
            .collect();

        let header = format!(
            "Earlier conversation ({} messages summarized)",
            self.summarized.len()
        );
        Some(if snippets.is_empty() {
            format!("[{}]", header)
        } else {
            format!("[{}: {}]", header, snippets.join("; "))
        })
    }
}

fn snippet(content: &str) -> String {
    let head: String = content.chars().take(SUMMARY_SNIPPET_CHARS).collect();
    if content.chars().count() > SUMMARY_SNIPPET_CHARS {
        format!("{}...", head)
    } else {
        head
    }
}

/// Selects the recent-message window for one pipeline run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageWindowBuilder {
    budget: ConversationContextWindow,
}

impl MessageWindowBuilder {
    pub fn new(budget: ConversationContextWindow) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &ConversationContextWindow {
        &self.budget
    }

    /// Splits `history` (oldest first) into recent and summarized messages.
    ///
    /// The newest message is always kept, even if it alone exceeds the budget.
    pub fn build(&self, history: &[ChatMessage]) -> MessageWindow {
        let total = saturating_total(history.iter().map(ChatMessage::token_count));

        if !self.budget.should_summarize(total) {
            return MessageWindow {
                recent: history.to_vec(),
                summarized: Vec::new(),
                total_tokens: total,
                window_tokens: total,
            };
        }

        let target = u64::from(self.budget.tokens_to_summarize(total));
        let max_fold = history.len().saturating_sub(1);
        let mut folded_tokens = 0u64;
        let mut split = 0;
        while split < max_fold && folded_tokens < target {
            folded_tokens += u64::from(history[split].token_count());
            split += 1;
        }

        let (summarized, recent) = history.split_at(split);
        MessageWindow {
            window_tokens: saturating_total(recent.iter().map(ChatMessage::token_count)),
            recent: recent.to_vec(),
            summarized: summarized.to_vec(),
            total_tokens: total,
        }
    }
}

fn saturating_total(tokens: impl Iterator<Item = u32>) -> u32 {
    let sum: u64 = tokens.map(u64::from).sum();
    sum.min(u64::from(u32::MAX)) as u32
}
