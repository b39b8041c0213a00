//! History commands

use clap::Subcommand;

use crate::config::AppConfig;
use crate::infrastructure::history::SessionHistory;

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Print the most recent messages of a session
    Show {
        session_id: String,

        /// Number of messages, defaults to the configured load limit
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete a session's history
    Clear { session_id: String },
}

pub async fn run(config: &AppConfig, command: HistoryCommand) -> anyhow::Result<()> {
    let manager = super::connection_manager(config)?;
    manager.ensure_connected().await?;

    let history = SessionHistory::with_config(manager, config.history.clone());

    match command {
        HistoryCommand::Show { session_id, limit } => {
            let limit = limit.unwrap_or(history.config().default_limit);
            let messages = history.load(&session_id, limit).await;

            if messages.is_empty() {
                println!("No history for session {}", session_id);
            }

            for message in messages {
                println!("{}: {}", message.role.label(), message.content);
            }
        }
        HistoryCommand::Clear { session_id } => {
            history.clear(&session_id).await;
            println!("Cleared history for session {}", session_id);
        }
    }

    Ok(())
}
