//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Unique identifier for a visitor chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatSessionId(Uuid);

impl ChatSessionId {
    /// Creates a new random ChatSessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a ChatSessionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChatSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChatSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatSessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random MessageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a MessageId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a non-empty string identifier.
///
/// Deserialization goes through `TryFrom<String>`, so rehydrated values are
/// held to the same rule as freshly constructed ones.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier, rejecting empty or whitespace-only input.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a configured chatbot instance.
    ChatbotConfigId,
    "chatbot_config_id"
);

string_id!(
    /// Identifier of an anonymous or known website visitor.
    VisitorId,
    "visitor_id"
);

string_id!(
    /// Identifier of the organization owning a chatbot.
    OrganizationId,
    "organization_id"
);

string_id!(
    /// Opaque token handed to the widget to resume a session.
    SessionToken,
    "session_token"
);

impl SessionToken {
    /// Generates a fresh random session token.
    pub fn generate() -> Self {
        Self(format!("st_{}", Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_session_id_generates_unique_values() {
        let id1 = ChatSessionId::new();
        let id2 = ChatSessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn chat_session_id_parses_from_string() {
        let id = ChatSessionId::new();
        let parsed: ChatSessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn chat_session_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ChatSessionId>().is_err());
    }

    #[test]
    fn message_id_serializes_transparently() {
        let id = MessageId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn visitor_id_rejects_empty() {
        assert!(VisitorId::new("").is_err());
        assert!(VisitorId::new("   ").is_err());
    }

    #[test]
    fn chatbot_config_id_accepts_value() {
        let id = ChatbotConfigId::new("bot-1").unwrap();
        assert_eq!(id.as_str(), "bot-1");
        assert_eq!(id.to_string(), "bot-1");
    }

    #[test]
    fn empty_field_error_names_the_field() {
        let err = OrganizationId::new("").unwrap_err();
        assert_eq!(err.to_string(), "Field 'organization_id' cannot be empty");
    }

    #[test]
    fn string_ids_reject_empty_on_deserialize() {
        let result: Result<SessionToken, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());

        let token: SessionToken = serde_json::from_str("\"st_abc\"").unwrap();
        assert_eq!(token.as_str(), "st_abc");
    }

    #[test]
    fn generated_session_tokens_are_unique_and_prefixed() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("st_"));
    }
}
