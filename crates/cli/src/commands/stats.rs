//! Store inspection and maintenance commands.

use super::{knowledge_config, print_json};
use clap::Args;
use neuron_core::{config::AppConfig, AppResult};

/// Show store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let knowledge = knowledge_config(config)?;
        let stats = neuron_knowledge::stats(&knowledge)?;

        if self.json {
            return print_json(&stats);
        }

        println!("Store: {}", stats.path.display());
        println!("  Documents: {}", stats.documents);
        println!("  Sources: {}", stats.sources);
        println!("  Size: {} bytes", stats.size_bytes);
        if stats.invalid_lines > 0 {
            println!("  Invalid lines: {}", stats.invalid_lines);
        }
        println!(
            "  Embedding: {}/{} ({} dims)",
            knowledge.embedding.provider, knowledge.embedding.model, knowledge.embedding.dimensions
        );

        Ok(())
    }
}

/// List indexed sources
#[derive(Args, Debug)]
pub struct SourcesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SourcesCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing sources command");

        let knowledge = knowledge_config(config)?;
        let sources = neuron_knowledge::sources(&knowledge)?;

        if self.json {
            return print_json(&sources);
        }

        if sources.is_empty() {
            println!("No sources indexed");
            return Ok(());
        }

        for summary in &sources {
            println!("{} ({} chunks)", summary.source, summary.documents);
        }

        Ok(())
    }
}

/// Remove all indexed content
#[derive(Args, Debug)]
pub struct CleanCommand {}

impl CleanCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command");

        let knowledge = knowledge_config(config)?;
        neuron_knowledge::clean(&knowledge)?;

        println!("Store {} cleaned", knowledge.store.file_path().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuron_store::{Document, FileVectorStore, VectorStore};
    use tempfile::TempDir;

    fn workspace_config(temp: &TempDir) -> AppConfig {
        AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_commands_on_populated_store() {
        let temp = TempDir::new().unwrap();
        let config = workspace_config(&temp);

        let knowledge = knowledge_config(&config).unwrap();
        let mut store = FileVectorStore::new(knowledge.store.clone());
        store
            .add(&[Document::new("1", "alpha")
                .with_source("file", "a.txt")
                .with_embedding(vec![1.0, 0.0])])
            .unwrap();

        assert!(StatsCommand { json: true }.execute(&config).is_ok());
        assert!(SourcesCommand { json: false }.execute(&config).is_ok());
        assert!(CleanCommand {}.execute(&config).is_ok());
        assert_eq!(store.stats().unwrap().documents, 0);
    }

    #[test]
    fn test_commands_on_missing_store() {
        let temp = TempDir::new().unwrap();
        let config = workspace_config(&temp);

        assert!(StatsCommand { json: false }.execute(&config).is_ok());
        assert!(SourcesCommand { json: true }.execute(&config).is_ok());
        assert!(CleanCommand {}.execute(&config).is_ok());
    }
}
