//! Session history infrastructure

mod session_history;

pub use session_history::{HistoryConfig, SessionHistory};
