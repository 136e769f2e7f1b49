//! Configuration module for Svar.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    EmbeddingSettings, GeneralSettings, IndexSettings, IngestSettings, RagSettings,
    RetrievalSettings, ServerSettings, Settings, TranscriptionSettings,
};
