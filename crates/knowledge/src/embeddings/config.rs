//! Embedding provider settings.

use neuron_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Known provider names.
pub const PROVIDERS: [&str; 3] = ["mock", "trigram", "ollama"];

/// Embedding configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "mock" (alias "trigram") or "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier (provider-specific)
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding vector dimensions
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Provider endpoint, e.g. the Ollama base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_model() -> String {
    "trigram-v1".to_string()
}

fn default_dimensions() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimensions: default_dimensions(),
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Check the provider is known and dimensions are usable.
    pub fn validate(&self) -> AppResult<()> {
        if !PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: '{}'. Supported providers: {}",
                self.provider,
                PROVIDERS.join(", ")
            )));
        }

        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply provider/model overrides from the command line or environment.
    ///
    /// Switching to ollama without an explicit model picks `nomic-embed-text`
    /// at 768 dimensions.
    pub fn with_overrides(mut self, provider: Option<&str>, model: Option<&str>) -> Self {
        if let Some(provider) = provider {
            if provider != self.provider {
                self.provider = provider.to_string();
                if provider == "ollama" && model.is_none() {
                    self.model = "nomic-embed-text".to_string();
                    self.dimensions = 768;
                }
            }
        }

        if let Some(model) = model {
            self.model = model.to_string();
        }

        self
    }
}
