//! Command handlers for the Neuron CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod delete;
pub mod index;
pub mod search;
pub mod stats;

// Re-export command types for convenience
pub use delete::DeleteCommand;
pub use index::IndexCommand;
pub use search::SearchCommand;
pub use stats::{CleanCommand, SourcesCommand, StatsCommand};

use neuron_core::{config::AppConfig, AppResult};
use neuron_knowledge::{config::load_config, KnowledgeConfig};
use serde::Serialize;

/// Workspace knowledge config with the CLI's provider/model overrides applied.
pub(crate) fn knowledge_config(config: &AppConfig) -> AppResult<KnowledgeConfig> {
    let knowledge = load_config(&config.workspace)?
        .with_overrides(config.provider.as_deref(), config.model.as_deref());
    tracing::debug!("Store file: {:?}", knowledge.store.file_path());
    Ok(knowledge)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
