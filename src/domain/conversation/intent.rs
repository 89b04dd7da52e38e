//! Local, deterministic intent pre-classification.
//!
//! Runs before the AI interaction so the pipeline can decide how wide the
//! knowledge search should be. The AI interaction's own analysis remains
//! the authority for everything persisted.

use serde::{Deserialize, Serialize};

use super::signals::IntentType;

/// Outcome of classifying one visitor message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: IntentType,
    /// Classifier confidence (0.0 - 1.0).
    pub confidence: f64,
    /// Sales topics mentioned in the message, e.g. "pricing".
    pub topics: Vec<String>,
}

impl IntentResult {
    /// An unclassified message.
    pub fn unknown() -> Self {
        Self {
            intent: IntentType::Unknown,
            confidence: 0.0,
            topics: Vec::new(),
        }
    }
}

/// Classifies a visitor's intent from their message.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, message: &str) -> IntentResult;
}

/// Keyword rules, checked in order. First match wins.
const INTENT_RULES: &[(IntentType, &[&str])] = &[
    (IntentType::DemoRequest, &["demo", "walkthrough", "show me how"]),
    (
        IntentType::PricingInquiry,
        &["price", "pricing", "cost", "how much", "quote", "plan"],
    ),
    (
        IntentType::Support,
        &["not working", "broken", "error", "bug", "help with", "issue with"],
    ),
    (IntentType::Complaint, &["disappointed", "terrible", "frustrated", "refund"]),
    (IntentType::Objection, &["too expensive", "not sure", "competitor", "already use"]),
    (IntentType::ProductInquiry, &["feature", "integrat", "does it", "can it", "support for"]),
    (IntentType::Goodbye, &["bye", "thanks, that's all", "talk later"]),
    (IntentType::Greeting, &["hello", "hi ", "hey", "good morning"]),
];

/// Topic vocabulary recognized in messages.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("pricing", &["price", "pricing", "cost", "how much", "quote"]),
    ("demo", &["demo", "walkthrough"]),
    ("trial", &["trial", "try it", "free tier"]),
    ("features", &["feature", "integrat", "capabilit"]),
    ("support", &["support", "not working", "broken", "help with"]),
];

/// Simple rule-based intent classifier (default implementation).
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedIntentClassifier;

impl IntentClassifier for RuleBasedIntentClassifier {
    fn classify(&self, message: &str) -> IntentResult {
        let lowercase = message.to_lowercase();
        let padded = format!("{} ", lowercase.trim());

        let topics: Vec<String> = TOPIC_KEYWORDS
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| lowercase.contains(k)))
            .map(|(topic, _)| topic.to_string())
            .collect();

        if lowercase.contains('@') || lowercase.contains("my email") || lowercase.contains("my number") {
            return IntentResult {
                intent: IntentType::ContactShare,
                confidence: 0.8,
                topics,
            };
        }

        for (intent, keywords) in INTENT_RULES {
            if keywords.iter().any(|k| padded.contains(k)) {
                return IntentResult {
                    intent: *intent,
                    confidence: 0.7,
                    topics,
                };
            }
        }

        if lowercase.trim_end().ends_with('?') {
            return IntentResult {
                intent: IntentType::Question,
                confidence: 0.6,
                topics,
            };
        }

        IntentResult {
            topics,
            ..IntentResult::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(message: &str) -> IntentResult {
        RuleBasedIntentClassifier.classify(message)
    }

    #[test]
    fn detects_pricing_with_topic() {
        let result = classify("How much does the Pro plan cost?");
        assert_eq!(result.intent, IntentType::PricingInquiry);
        assert_eq!(result.topics, vec!["pricing".to_string()]);
    }

    #[test]
    fn demo_outranks_pricing() {
        let result = classify("Can I get a demo and a quote?");
        assert_eq!(result.intent, IntentType::DemoRequest);
        assert!(result.topics.contains(&"demo".to_string()));
        assert!(result.topics.contains(&"pricing".to_string()));
    }

    #[test]
    fn question_mark_falls_back_to_question() {
        assert_eq!(classify("Where is your office located?").intent, IntentType::Question);
    }

    #[test]
    fn email_is_contact_share() {
        assert_eq!(classify("reach me at jo@example.com").intent, IntentType::ContactShare);
    }

    #[test]
    fn bare_greeting() {
        assert_eq!(classify("Hi").intent, IntentType::Greeting);
        assert_eq!(classify("HEY there").intent, IntentType::Greeting);
    }

    #[test]
    fn unmatched_message_is_unknown() {
        let result = classify("ok");
        assert_eq!(result.intent, IntentType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(result.topics.is_empty());
    }

    #[test]
    fn support_problem() {
        assert_eq!(classify("The export is not working").intent, IntentType::Support);
    }
}
