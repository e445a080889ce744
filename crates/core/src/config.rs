//! Configuration management for the Knowhow copilot.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (knowhow.yaml)
//!
//! The configuration is data-dir-centric: the embedding index (the only
//! persistent state) lives under `data_dir`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds all global options that affect copilot behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the embedding index database
    pub data_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider ("ollama", "openai")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// API key for remote providers
    pub api_key: Option<String>,

    /// Custom backend endpoint URL
    pub endpoint: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Document chunking defaults
    #[serde(default)]
    pub chunking: ChunkingSettings,

    /// Input length limits
    #[serde(default)]
    pub limits: InputLimits,

    /// Generation call settings
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Connection probe settings
    #[serde(default)]
    pub probe: ProbeSettings,
}

/// Embedding provider settings.
///
/// Query and chunk embeddings MUST come from the identical model, so these
/// settings are fixed for the lifetime of an index. Changing them against
/// an existing index is a configuration error, surfaced as
/// `EmbeddingDimensionMismatch` when the dimensionality no longer lines up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Embedding provider ("hash", "ollama")
    pub provider: String,

    /// Embedding model identifier
    pub model: String,

    /// Embedding vector dimensionality
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "hash".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        }
    }
}

/// Chunking defaults, tuned for small-context embedding models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingSettings {
    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
        }
    }
}

/// Input length limits enforced before any backend call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLimits {
    /// Maximum query length in characters
    pub max_query_chars: usize,

    /// Maximum analyze-text length in characters
    pub max_analyze_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_query_chars: 500,
            max_analyze_chars: 5000,
        }
    }
}

/// Generation call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Hard timeout for a single generation call, in seconds
    pub timeout_secs: u64,

    /// Maximum tokens to generate per answer
    pub max_tokens: u32,

    /// Sampling temperature (low for factual answers)
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_tokens: 1000,
            temperature: 0.3,
        }
    }
}

/// Connection probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// How long a probe result stays memoized, in seconds
    pub ttl_secs: u64,

    /// Probe latency above this threshold classifies the backend as degraded
    pub degraded_latency_ms: u64,

    /// Hard timeout for the probe round-trip, in seconds
    pub timeout_secs: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 30,
            degraded_latency_ms: 2000,
            timeout_secs: 10,
        }
    }
}

/// Partial configuration file structure (all fields optional).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    data_dir: Option<PathBuf>,
    embedding: Option<EmbeddingSettings>,
    chunking: Option<ChunkingSettings>,
    limits: Option<InputLimits>,
    generation: Option<GenerationSettings>,
    probe: Option<ProbeSettings>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".knowhow"),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            endpoint: None,
            log_level: None,
            verbose: false,
            no_color: false,
            embedding: EmbeddingSettings::default(),
            chunking: ChunkingSettings::default(),
            limits: InputLimits::default(),
            generation: GenerationSettings::default(),
            probe: ProbeSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `KNOWHOW_DATA_DIR`: Override data directory
    /// - `KNOWHOW_CONFIG`: Path to config file
    /// - `KNOWHOW_PROVIDER`: Generation provider
    /// - `KNOWHOW_MODEL`: Model identifier
    /// - `KNOWHOW_API_KEY`: API key for remote providers
    /// - `KNOWHOW_ENDPOINT`: Custom backend endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("KNOWHOW_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("KNOWHOW_CONFIG") {
            config.config_file = Some(PathBuf::from(path));
        }
        if let Ok(provider) = std::env::var("KNOWHOW_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("KNOWHOW_MODEL") {
            config.model = model;
        }
        if let Ok(key) = std::env::var("KNOWHOW_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var("KNOWHOW_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        // Merge config file, if one was pointed at
        if let Some(path) = config.config_file.clone() {
            config.merge_file(&path)?;
        }

        Ok(config)
    }

    /// Apply CLI flag overrides on top of the loaded configuration.
    ///
    /// CLI flags take precedence over environment variables and the config
    /// file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(path) = config_file {
            self.config_file = Some(path);
        }
        if let Some(provider) = provider {
            self.provider = provider;
        }
        if let Some(model) = model {
            self.model = model;
        }
        if verbose {
            self.log_level = Some("debug".to_string());
        } else if let Some(level) = log_level {
            self.log_level = Some(level);
        }
        if no_color {
            self.no_color = true;
        }
        self
    }

    /// Merge values from a YAML config file into this configuration.
    fn merge_file(&mut self, path: &std::path::Path) -> AppResult<()> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&raw)?;

        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(endpoint) = file.endpoint {
            self.endpoint = Some(endpoint);
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(chunking) = file.chunking {
            self.chunking = chunking;
        }
        if let Some(limits) = file.limits {
            self.limits = limits;
        }
        if let Some(generation) = file.generation {
            self.generation = generation;
        }
        if let Some(probe) = file.probe {
            self.probe = probe;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            AppError::Config(format!(
                "Failed to create data directory {:?}: {}",
                self.data_dir, e
            ))
        })
    }

    /// Path to the embedding index database.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 150);
        assert_eq!(config.limits.max_query_chars, 500);
        assert_eq!(config.limits.max_analyze_chars, 5000);
        assert_eq!(config.probe.ttl_secs, 30);
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/tmp/kb")),
            None,
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.data_dir, PathBuf::from("/tmp/kb"));
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_index_path_under_data_dir() {
        let config = AppConfig::default();
        assert!(config.index_path().ends_with("index.db"));
    }
}
