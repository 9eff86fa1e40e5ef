//! Neuron CLI
//!
//! Main entry point for the neuron command-line tool.
//! Indexes local files into a file-backed vector store and searches them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CleanCommand, DeleteCommand, IndexCommand, SearchCommand, SourcesCommand, StatsCommand};
use neuron_core::{config::AppConfig, logging, AppResult, LogFormat};
use std::path::PathBuf;

/// Neuron - local document indexing and similarity search
#[derive(Parser, Debug)]
#[command(name = "neuron")]
#[command(about = "Local document indexing and similarity search", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NEURON_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NEURON_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format (text, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Embedding provider (mock, ollama)
    #[arg(short, long, global = true, env = "NEURON_PROVIDER")]
    provider: Option<String>,

    /// Embedding model identifier
    #[arg(short, long, global = true, env = "NEURON_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index files or directories, replacing earlier records of the same files
    Index(IndexCommand),

    /// Search indexed content
    Search(SearchCommand),

    /// Remove every record of one source
    Delete(DeleteCommand),

    /// List indexed sources
    Sources(SourcesCommand),

    /// Show store statistics
    Stats(StatsCommand),

    /// Remove all indexed content
    Clean(CleanCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from the config file and environment
    let config = AppConfig::load()?;

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.log_format,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Provider override: {:?}, model override: {:?}",
        config.provider,
        config.model
    );

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Index(_) => "index",
        Commands::Search(_) => "search",
        Commands::Delete(_) => "delete",
        Commands::Sources(_) => "sources",
        Commands::Stats(_) => "stats",
        Commands::Clean(_) => "clean",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Delete(cmd) => cmd.execute(&config),
        Commands::Sources(cmd) => cmd.execute(&config),
        Commands::Stats(cmd) => cmd.execute(&config),
        Commands::Clean(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_with_tags() {
        let cli = Cli::try_parse_from([
            "neuron", "index", "docs", "notes.md", "--tag", "team=ops", "--tag", "lang=en",
        ])
        .unwrap();

        match cli.command {
            Commands::Index(cmd) => {
                assert_eq!(cmd.paths, vec![PathBuf::from("docs"), PathBuf::from("notes.md")]);
                assert_eq!(cmd.tags.len(), 2);
                assert_eq!(cmd.tags[0], ("team".to_string(), "ops".to_string()));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_tag_fails() {
        assert!(Cli::try_parse_from(["neuron", "index", "docs", "--tag", "oops"]).is_err());
    }

    #[test]
    fn test_parse_search_globals() {
        let cli = Cli::try_parse_from([
            "neuron", "search", "water filter", "-k", "3", "--log-format", "json", "--provider", "mock",
        ])
        .unwrap();

        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.provider.as_deref(), Some("mock"));
        match cli.command {
            Commands::Search(cmd) => {
                assert_eq!(cmd.query, "water filter");
                assert_eq!(cmd.top_k, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete_requires_both_fields() {
        assert!(Cli::try_parse_from(["neuron", "delete", "--source-type", "file"]).is_err());
        assert!(Cli::try_parse_from([
            "neuron", "delete", "--source-type", "file", "--source-name", "a.txt"
        ])
        .is_ok());
    }
}
