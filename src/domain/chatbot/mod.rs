//! Chatbot configuration.
//!
//! A chatbot belongs to one organization and carries the settings the
//! pipeline needs per turn: lead-capture rules, qualification questions,
//! whether knowledge search is enabled and optional token-budget overrides.

use crate::domain::conversation::{
    ContextWindowError, ContextWindowSettings, ConversationContextWindow,
};
use crate::domain::foundation::{ChatbotConfigId, OrganizationId, ValidationError};
use serde::{Deserialize, Serialize};

/// One question asked during lead qualification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationQuestion {
    pub id: String,
    pub question: String,
    /// Relative weight in the lead score.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl QualificationQuestion {
    pub fn new(id: impl Into<String>, question: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            weight,
        }
    }
}

/// Lead-capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadCaptureConfig {
    pub enabled: bool,
    pub qualification_questions: Vec<QualificationQuestion>,
}

impl Default for LeadCaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            qualification_questions: Vec::new(),
        }
    }
}

/// Configuration of one chatbot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotConfig {
    id: ChatbotConfigId,
    organization_id: OrganizationId,
    name: String,
    #[serde(default)]
    personality: String,
    #[serde(default = "default_active")]
    is_active: bool,
    #[serde(default)]
    lead_capture: LeadCaptureConfig,
    #[serde(default)]
    knowledge_base_enabled: bool,
    #[serde(default)]
    context_window: Option<ContextWindowSettings>,
}

fn default_active() -> bool {
    true
}

impl ChatbotConfig {
    /// Creates an active config with lead capture enabled and no knowledge base.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if any identifier or the name is blank
    pub fn new(
        id: impl Into<String>,
        organization_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        Ok(Self {
            id: ChatbotConfigId::new(id)?,
            organization_id: OrganizationId::new(organization_id)?,
            name,
            personality: String::new(),
            is_active: true,
            lead_capture: LeadCaptureConfig::default(),
            knowledge_base_enabled: false,
            context_window: None,
        })
    }

    pub fn with_personality(self, personality: impl Into<String>) -> Self {
        Self {
            personality: personality.into(),
            ..self
        }
    }

    pub fn with_lead_capture(self, lead_capture: LeadCaptureConfig) -> Self {
        Self {
            lead_capture,
            ..self
        }
    }

    pub fn with_knowledge_base(self, enabled: bool) -> Self {
        Self {
            knowledge_base_enabled: enabled,
            ..self
        }
    }

    pub fn with_context_window(self, settings: ContextWindowSettings) -> Self {
        Self {
            context_window: Some(settings),
            ..self
        }
    }

    pub fn deactivated(self) -> Self {
        Self {
            is_active: false,
            ..self
        }
    }

    pub fn id(&self) -> &ChatbotConfigId {
        &self.id
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn personality(&self) -> &str {
        &self.personality
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn lead_capture(&self) -> &LeadCaptureConfig {
        &self.lead_capture
    }

    pub fn knowledge_base_enabled(&self) -> bool {
        self.knowledge_base_enabled
    }

    pub fn context_window_settings(&self) -> Option<&ContextWindowSettings> {
        self.context_window.as_ref()
    }

    /// Number of configured qualification questions.
    pub fn total_questions(&self) -> usize {
        self.lead_capture.qualification_questions.len()
    }

    /// True if this config belongs to the given organization.
    pub fn belongs_to(&self, organization_id: &OrganizationId) -> bool {
        &self.organization_id == organization_id
    }

    /// Builds the token budget, layering this config's overrides on `defaults`.
    ///
    /// # Errors
    ///
    /// - `ContextWindowError` if the combined settings are not a valid budget
    pub fn context_window(
        &self,
        defaults: &ContextWindowSettings,
    ) -> Result<ConversationContextWindow, ContextWindowError> {
        let overrides = self.context_window.unwrap_or_default();
        let settings = ContextWindowSettings {
            max_tokens: overrides.max_tokens.or(defaults.max_tokens),
            system_prompt_tokens: overrides
                .system_prompt_tokens
                .or(defaults.system_prompt_tokens),
            response_reserved_tokens: overrides
                .response_reserved_tokens
                .or(defaults.response_reserved_tokens),
            summary_tokens: overrides.summary_tokens.or(defaults.summary_tokens),
        };
        ConversationContextWindow::create(Some(&settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChatbotConfig {
        ChatbotConfig::new("bot-1", "org-1", "Sales Bot").unwrap()
    }

    #[test]
    fn new_config_defaults() {
        let config = config();
        assert!(config.is_active());
        assert!(config.lead_capture().enabled);
        assert!(!config.knowledge_base_enabled());
        assert_eq!(config.total_questions(), 0);
    }

    #[test]
    fn rejects_blank_organization() {
        assert_eq!(
            ChatbotConfig::new("bot-1", " ", "Sales Bot").unwrap_err(),
            ValidationError::empty_field("organization_id")
        );
    }

    #[test]
    fn belongs_to_checks_organization() {
        let config = config();
        assert!(config.belongs_to(&OrganizationId::new("org-1").unwrap()));
        assert!(!config.belongs_to(&OrganizationId::new("org-2").unwrap()));
    }

    mod context_window {
        use super::*;

        #[test]
        fn config_overrides_win_over_defaults() {
            let config = config().with_context_window(ContextWindowSettings {
                max_tokens: Some(4_000),
                ..Default::default()
            });
            let defaults = ContextWindowSettings {
                max_tokens: Some(8_000),
                summary_tokens: Some(100),
                ..Default::default()
            };
            let window = config.context_window(&defaults).unwrap();
            assert_eq!(window.max_tokens(), 4_000);
            assert_eq!(window.summary_tokens(), 100);
        }

        #[test]
        fn invalid_override_is_reported() {
            let config = config().with_context_window(ContextWindowSettings {
                max_tokens: Some(100),
                ..Default::default()
            });
            assert!(matches!(
                config.context_window(&ContextWindowSettings::default()),
                Err(ContextWindowError::ReservedExceedsMax { .. })
            ));
        }
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ChatbotConfig = serde_json::from_str(
            r#"{"id": "bot-1", "organization_id": "org-1", "name": "Bot",
                "lead_capture": {"qualification_questions": [{"id": "q1", "question": "Budget?"}]}}"#,
        )
        .unwrap();
        assert!(config.is_active());
        assert!(config.lead_capture().enabled);
        assert_eq!(config.lead_capture().qualification_questions[0].weight, 1.0);
    }
}
