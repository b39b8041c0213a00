//! Session history domain - conversation messages and transcript formatting

mod message;
mod transcript;

pub use message::{MessageRole, SessionMessage};
pub use transcript::{ConversationContext, extract_user_name, format_context, format_transcript};
