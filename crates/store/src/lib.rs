//! Embedded, append-only vector store.
//!
//! Documents are persisted as JSON lines in a single file and retrieved by
//! exhaustive cosine-similarity scan. Removal is scoped to a source and goes
//! through an atomic file rewrite.

pub mod codec;
pub mod config;
pub mod document;
pub mod lines;
pub mod similarity;
pub mod store;
pub mod topk;


// Re-export commonly used types
pub use config::StoreConfig;
pub use document::{Document, SourceKey};
pub use store::{FileVectorStore, SourceSummary, StoreStats, VectorStore};
