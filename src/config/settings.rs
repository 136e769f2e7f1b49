//! Configuration settings for Svar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub ingest: IngestSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub rag: RagSettings,
    pub transcription: TranscriptionSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Wall-clock limit for a single pipeline run (ingestion or transcription).
    pub request_timeout_seconds: u64,
    /// Maximum number of pipeline runs admitted concurrently.
    pub max_concurrent_pipelines: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/svar".to_string(),
            log_level: "info".to_string(),
            request_timeout_seconds: 1800,
            max_concurrent_pipelines: 2,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Maximum accepted upload body size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Directory where uploaded documents are stored.
    pub upload_dir: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Character overlap between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            upload_dir: "~/.svar/uploads".to_string(),
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Vector index persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Path to the persisted vector index database.
    pub path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: "~/.svar/index.db".to_string(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Minimum similarity score for a retrieved chunk.
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.0,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Sampling temperature for response generation.
    pub temperature: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Speech recognition model to use.
    pub model: String,
    /// Duration in seconds of each transcription window.
    pub window_seconds: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            window_seconds: 15,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants that the splitter and pipelines rely on.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(crate::error::SvarError::Config(
                "ingest.chunk_size must be positive".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(crate::error::SvarError::Config(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.transcription.window_seconds == 0 {
            return Err(crate::error::SvarError::Config(
                "transcription.window_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded upload directory path.
    pub fn upload_dir(&self) -> PathBuf {
        Self::expand_path(&self.ingest.upload_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded vector index path.
    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.index.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ingest.chunk_size, 500);
        assert_eq!(settings.ingest.chunk_overlap, 50);
        assert_eq!(settings.transcription.window_seconds, 15);
        assert_eq!(settings.retrieval.top_k, 5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            [ingest]
            chunk_size = 800
            chunk_overlap = 100

            [server]
            port = 9000
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.ingest.chunk_size, 800);
        assert_eq!(settings.ingest.chunk_overlap, 100);
        assert_eq!(settings.server.port, 9000);
        // Untouched sections keep their defaults
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_validate_rejects_overlap_not_less_than_size() {
        let mut settings = Settings::default();
        settings.ingest.chunk_overlap = settings.ingest.chunk_size;
        assert!(settings.validate().is_err());

        settings.ingest.chunk_size = 0;
        assert!(settings.validate().is_err());
    }
}
