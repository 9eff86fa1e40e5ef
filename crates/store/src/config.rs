//! Store location and search settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a store lives and how many results a search returns.
///
/// The backing file is `<directory>/<name><ext>`; compaction writes
/// `<directory>/<name>_tmp<ext>` and renames it into place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the store file
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File stem
    #[serde(default = "default_name")]
    pub name: String,

    /// File extension, including the leading dot
    #[serde(default = "default_ext")]
    pub ext: String,

    /// Maximum number of search results
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_name() -> String {
    "neuron".to_string()
}

fn default_ext() -> String {
    ".store".to_string()
}

fn default_top_k() -> usize {
    4
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            name: default_name(),
            ext: default_ext(),
            top_k: default_top_k(),
        }
    }
}

impl StoreConfig {
    /// Default settings rooted at `directory`.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Path of the backing file.
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(format!("{}{}", self.name, self.ext))
    }

    /// Path of the transient compaction file.
    pub fn tmp_path(&self) -> PathBuf {
        self.directory.join(format!("{}_tmp{}", self.name, self.ext))
    }
}
