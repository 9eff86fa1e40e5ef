//! Search command handler.

use super::{knowledge_config, print_json};
use clap::Args;
use neuron_core::{config::AppConfig, AppResult};
use neuron_store::Document;
use serde::Serialize;

/// Characters of content shown per hit in text output.
const PREVIEW_CHARS: usize = 120;

/// Search indexed content
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of results (default: store top_k)
    #[arg(short = 'k', long = "top-k")]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit<'a> {
    rank: usize,
    score: f32,
    id: &'a str,
    source_type: &'a str,
    source_name: &'a str,
    content: &'a str,
    metadata: &'a serde_json::Map<String, serde_json::Value>,
}

impl<'a> SearchHit<'a> {
    fn new(rank: usize, document: &'a Document) -> Self {
        Self {
            rank,
            score: document.score.unwrap_or(0.0),
            id: &document.id,
            source_type: &document.source_type,
            source_name: &document.source_name,
            content: &document.content,
            metadata: &document.metadata,
        }
    }
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let knowledge = knowledge_config(config)?;
        let results = neuron_knowledge::query(&knowledge, &self.query, self.top_k).await?;

        let hits: Vec<SearchHit> = results
            .iter()
            .enumerate()
            .map(|(i, document)| SearchHit::new(i + 1, document))
            .collect();

        if self.json {
            print_json(&hits)?;
            return Ok(());
        }

        if hits.is_empty() {
            println!("No results");
            return Ok(());
        }

        for hit in &hits {
            println!(
                "{}. [{:.3}] {}:{}",
                hit.rank, hit.score, hit.source_type, hit.source_name
            );
            println!("   {}", preview(hit.content, PREVIEW_CHARS));
        }

        Ok(())
    }
}

/// First `max` characters on one line, with an ellipsis if cut.
fn preview(content: &str, max: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}
