//! Index command handler.

use super::{knowledge_config, print_json};
use clap::Args;
use neuron_core::{config::AppConfig, AppResult};
use neuron_knowledge::{parse_tag, IngestOptions};
use std::path::PathBuf;

/// Index files or directories
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Files or directories to index
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Metadata tag added to every indexed chunk (repeatable)
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag_arg)]
    pub tags: Vec<(String, String)>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_tag_arg(raw: &str) -> Result<(String, String), String> {
    parse_tag(raw).map_err(|e| e.to_string())
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command for {} paths", self.paths.len());

        let knowledge = knowledge_config(config)?;
        let options = IngestOptions {
            paths: self.paths.clone(),
            tags: self.tags.clone(),
        };

        let stats = neuron_knowledge::ingest(&knowledge, &options).await?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!(
                "Indexed {} sources ({} chunks, {} replaced, {} bytes) in {:.2}s",
                stats.sources, stats.documents, stats.removed, stats.bytes, stats.duration_secs
            );
        }

        Ok(())
    }
}
