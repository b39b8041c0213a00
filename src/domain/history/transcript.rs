//! Transcript formatting for prompt replay

use once_cell::sync::Lazy;
use regex::Regex;

use super::{MessageRole, SessionMessage};

/// Name declarations, tried in order against each user message
static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i:\bmy name is)\s+([A-Z][A-Za-z]{1,50})\b",
        r"(?i:\bi am)\s+([A-Z][A-Za-z]{1,50})\b",
        r"(?i:\bi['’]m)\s+([A-Z][A-Za-z]{1,50})\b",
        r"(?i:\bcall me)\s+([A-Z][A-Za-z]{1,50})\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Formatted view of a session for prompt construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationContext {
    pub transcript: String,
    pub user_name: Option<String>,
}

impl ConversationContext {
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}

/// Renders messages as `User: ...` / `Assistant: ...` lines
pub fn format_transcript(messages: &[SessionMessage]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.role.label(), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Finds the first name the user declared about themselves
pub fn extract_user_name(messages: &[SessionMessage]) -> Option<String> {
    messages
        .iter()
        .filter(|message| message.role == MessageRole::User)
        .find_map(|message| {
            NAME_PATTERNS.iter().find_map(|pattern| {
                pattern
                    .captures(&message.content)
                    .and_then(|captures| captures.get(1))
                    .map(|name| name.as_str().to_string())
            })
        })
}

pub fn format_context(messages: &[SessionMessage]) -> ConversationContext {
    ConversationContext {
        transcript: format_transcript(messages),
        user_name: extract_user_name(messages),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(turns: &[(&str, &str)]) -> Vec<SessionMessage> {
        turns
            .iter()
            .enumerate()
            .flat_map(|(i, (user, assistant))| {
                SessionMessage::exchange(*user, *assistant, (i as i64) * 10)
            })
            .collect()
    }

    #[test]
    fn test_format_transcript() {
        let messages = conversation(&[("What is 2+2?", "4"), ("And 3+3?", "6")]);

        assert_eq!(
            format_transcript(&messages),
            "User: What is 2+2?\nAssistant: 4\nUser: And 3+3?\nAssistant: 6"
        );
    }

    #[test]
    fn test_format_transcript_empty() {
        assert_eq!(format_transcript(&[]), "");
        assert!(format_context(&[]).is_empty());
    }

    #[test]
    fn test_extract_each_pattern() {
        for (text, expected) in [
            ("My name is Alice", "Alice"),
            ("hello, i am Bob", "Bob"),
            ("I'm Carla and I like maths", "Carla"),
            ("please CALL ME Dmitri", "Dmitri"),
        ] {
            let messages = conversation(&[(text, "ok")]);
            assert_eq!(extract_user_name(&messages).as_deref(), Some(expected), "{}", text);
        }
    }

    #[test]
    fn test_extract_requires_capitalized_word() {
        let messages = conversation(&[("I am hungry", "ok"), ("my name is X", "ok")]);
        assert_eq!(extract_user_name(&messages), None);
    }

    #[test]
    fn test_extract_rejects_overlong_name() {
        let long_name = format!("A{}", "b".repeat(51));
        let messages = conversation(&[(&format!("call me {}", long_name), "ok")]);
        assert_eq!(extract_user_name(&messages), None);
    }

    #[test]
    fn test_first_match_wins() {
        let messages = conversation(&[("My name is Alice", "hi Alice"), ("Call me Bob", "ok Bob")]);
        assert_eq!(extract_user_name(&messages).as_deref(), Some("Alice"));
    }

    #[test]
    fn test_assistant_messages_ignored() {
        let messages = conversation(&[("hello", "My name is Tutor")]);
        assert_eq!(extract_user_name(&messages), None);
    }

    #[test]
    fn test_format_context() {
        let messages = conversation(&[("I'm Zoe", "Nice to meet you, Zoe")]);
        let context = format_context(&messages);

        assert_eq!(context.user_name.as_deref(), Some("Zoe"));
        assert_eq!(context.transcript, "User: I'm Zoe\nAssistant: Nice to meet you, Zoe");
    }
}
