//! Svar - Document QA and Video Transcription Backend
//!
//! A backend HTTP service that answers questions over uploaded PDF documents
//! and transcribes the audio track of online videos.
//!
//! The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
//!
//! # Overview
//!
//! Svar exposes three endpoints:
//! - `POST /upload/` - upload a PDF and rebuild the vector index
//! - `POST /predict` - ask a question (RAG answer or raw semantic search)
//! - `POST /transcribe_video` - transcribe a video URL in 15-second windows
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `document` - PDF loading and text splitting
//! - `embedding` - Embedding generation
//! - `index` - Persistent vector index
//! - `ingest` - Document ingestion pipeline
//! - `rag` - Retrieval and question answering
//! - `audio` - Audio download and processing
//! - `transcription` - Speech-to-text transcription
//! - `server` - HTTP API layer
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use svar::config::Settings;
//! use svar::server::AppState;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let state = Arc::new(AppState::new(settings)?);
//!     svar::server::run("127.0.0.1", 8000, state).await?;
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod openai;
pub mod rag;
pub mod server;
pub mod transcription;

pub use error::{Result, SvarError};
