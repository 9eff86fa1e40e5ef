//! Knowledge pipeline type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for the ingest operation.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Files or directories to ingest
    pub paths: Vec<PathBuf>,

    /// `key=value` metadata copied onto every document
    pub tags: Vec<(String, String)>,
}

/// Statistics from an ingest operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of sources read
    pub sources: usize,

    /// Number of documents written
    pub documents: usize,

    /// Number of previously stored documents replaced
    pub removed: usize,

    /// Total bytes of text processed
    pub bytes: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}
