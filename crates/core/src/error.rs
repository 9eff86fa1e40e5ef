//! Error types for the Neuron vector store.
//!
//! This module defines a unified error enum shared by the store, the
//! knowledge pipeline, and the CLI. Record-level decode failures never
//! surface here; they are skipped where they are read.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the Neuron workspace.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Ingestion and query pipeline errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// General vector store errors
    #[error("Store error: {0}")]
    Store(String),

    /// A stored record reached similarity scoring without an embedding.
    #[error("Document '{id}' has no embedding (content: {content:?})")]
    MissingEmbedding { id: String, content: String },

    /// Query and stored embedding lengths differ.
    #[error("Embedding dimension mismatch for document '{id}': expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// Compaction could not produce or install the replacement file.
    /// The original file is left untouched.
    #[error("Compaction of {path:?} failed: {reason}")]
    Compaction { path: PathBuf, reason: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
