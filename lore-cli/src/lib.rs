//! Command-line surface for `lore-rag`: `lore ingest`, `lore ask` and `lore chat`.

pub mod cli;
pub mod commands;
pub mod console;

use anyhow::Result;
use lore_rag::{AssistantHandle, LoreConfig};
use tracing::debug;

pub use cli::{Cli, Command, ConfigOverrides};

/// Resolve the configuration and run the selected command.
///
/// Reads the environment (after any `.env` file has been loaded by the
/// caller), applies flag overrides, and refuses to start without an API key.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.overrides.apply(LoreConfig::from_env()?)?;
    config.require_api_key()?;
    debug!(
        raw_data_dir = %config.raw_data_dir.display(),
        index_dir = %config.index_dir.display(),
        command = ?cli.command,
        "configuration resolved"
    );

    match cli.command {
        Command::Ingest => {
            commands::ingest(&config).await?;
        }
        Command::Ask { question, json } => {
            commands::ask(&config, &question.join(" "), json).await?;
        }
        Command::Chat => {
            let handle = AssistantHandle::new(config);
            console::run(&handle).await?;
        }
    }
    Ok(())
}
