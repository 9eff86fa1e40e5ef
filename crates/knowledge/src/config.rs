//! Knowledge base configuration management.

use crate::embeddings::EmbeddingConfig;
use neuron_core::config::STATE_DIR;
use neuron_core::{AppError, AppResult};
use neuron_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for ingestion and retrieval in one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Vector store location and default top-K
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in bytes
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl KnowledgeConfig {
    /// Apply embedding provider/model overrides.
    pub fn with_overrides(mut self, provider: Option<&str>, model: Option<&str>) -> Self {
        self.embedding = self.embedding.with_overrides(provider, model);
        self
    }
}

/// Load the workspace's knowledge configuration.
///
/// Loads from `.neuron/knowledge.yaml` if it exists, otherwise uses
/// defaults. A relative store directory is resolved against `.neuron`.
pub fn load_config(workspace: &Path) -> AppResult<KnowledgeConfig> {
    let config_path = get_config_path(workspace);

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let config: KnowledgeConfig = if content.trim().is_empty() {
            KnowledgeConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                AppError::Knowledge(format!(
                    "Failed to parse config at {:?}: {}",
                    config_path, e
                ))
            })?
        };

        tracing::debug!("Loaded knowledge config from {:?}", config_path);
        config
    } else {
        tracing::debug!("Using default knowledge config (no config file found)");
        KnowledgeConfig::default()
    };

    if config.store.directory.is_relative() {
        config.store.directory = state_dir(workspace).join(&config.store.directory);
    }

    Ok(config)
}

/// Save the workspace's knowledge configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge config to {:?}", config_path);
    Ok(())
}

/// Get the path to the knowledge config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    state_dir(workspace).join("knowledge.yaml")
}

fn state_dir(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();

        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.embedding.provider, "mock");
        assert_eq!(config.store.top_k, 4);
        assert_eq!(
            config.store.file_path(),
            temp.path().join(".neuron").join(".").join("neuron.store")
        );
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let mut config = KnowledgeConfig::default();
        config.chunk_size = 512;
        config.store.directory = PathBuf::from("vectors");
        config.store.top_k = 8;

        save_config(temp.path(), &config).unwrap();
        assert!(get_config_path(temp.path()).exists());

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded.chunk_size, 512);
        assert_eq!(loaded.store.top_k, 8);
        assert_eq!(
            loaded.store.directory,
            temp.path().join(".neuron").join("vectors")
        );
    }

    #[test]
    fn test_absolute_store_directory_is_kept() {
        let temp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let mut config = KnowledgeConfig::default();
        config.store.directory = elsewhere.path().to_path_buf();

        save_config(temp.path(), &config).unwrap();
        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded.store.directory, elsewhere.path());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".neuron")).unwrap();
        fs::write(
            get_config_path(temp.path()),
            "chunk_size: 200\nembedding:\n  provider: ollama\n  model: mxbai-embed-large\n  dimensions: 1024\n",
        )
        .unwrap();

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded.chunk_size, 200);
        assert_eq!(loaded.chunk_overlap, 100);
        assert_eq!(loaded.embedding.provider, "ollama");
        assert_eq!(loaded.embedding.dimensions, 1024);
        assert_eq!(loaded.store.name, "neuron");
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".neuron")).unwrap();
        fs::write(get_config_path(temp.path()), "chunk_size: [not a number").unwrap();

        assert!(matches!(
            load_config(temp.path()),
            Err(AppError::Knowledge(_))
        ));
    }
}
