//! Embedding generation for the ingestion and query pipelines.
//!
//! The store never embeds text itself; documents arrive with vectors
//! produced by one of these providers.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
