use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Role of a message in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Label used in transcripts
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// One entry of a session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: MessageRole,
    pub content: String,
    /// Milliseconds since the epoch
    pub timestamp: i64,
}

impl SessionMessage {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp,
        }
    }

    /// Builds the ordered pair for one exchange
    ///
    /// The assistant message is stamped one millisecond after the user
    /// message so the pair keeps its order even when both are written in
    /// the same millisecond.
    pub fn exchange(
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        timestamp: i64,
    ) -> [Self; 2] {
        [
            Self::user(user_text, timestamp),
            Self::assistant(assistant_text, timestamp + 1),
        ]
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| {
            DomainError::serialization(format!("Failed to serialize session message: {}", e))
        })
    }

    pub fn from_json(data: &str) -> Result<Self, DomainError> {
        serde_json::from_str(data).map_err(|e| {
            DomainError::serialization(format!("Failed to deserialize session message: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_orders_timestamps() {
        let [user, assistant] = SessionMessage::exchange("hi", "hello", 1_000);

        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.timestamp, 1_000);
        assert_eq!(assistant.role, MessageRole::Assistant);
        assert_eq!(assistant.timestamp, 1_001);
    }

    #[test]
    fn test_message_json() {
        let message = SessionMessage::user("hi", 5);
        let json = message.to_json().unwrap();

        assert_eq!(json, r#"{"role":"user","content":"hi","timestamp":5}"#);
        assert_eq!(SessionMessage::from_json(&json).unwrap(), message);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = SessionMessage::from_json(r#"{"role":"system","content":"x","timestamp":1}"#);
        assert!(result.is_err());
    }
}
