//! Delete command handler.

use super::knowledge_config;
use clap::Args;
use neuron_core::{config::AppConfig, AppResult};

/// Remove every record of one source
#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// Source type, e.g. "file"
    #[arg(long)]
    pub source_type: String,

    /// Source name, e.g. the file's indexed name
    #[arg(long)]
    pub source_name: String,
}

impl DeleteCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(
            "Executing delete command for {}:{}",
            self.source_type,
            self.source_name
        );

        let knowledge = knowledge_config(config)?;
        let removed =
            neuron_knowledge::remove_source(&knowledge, &self.source_type, &self.source_name)?;

        println!(
            "Removed {} records for {}:{}",
            removed, self.source_type, self.source_name
        );
        Ok(())
    }
}
