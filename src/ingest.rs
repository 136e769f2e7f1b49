//! Document ingestion pipeline.
//!
//! Coordinates the path from PDF files on disk to a freshly persisted
//! vector index: discover, extract, split, embed, rebuild.

use crate::document::{discover_pdfs, extract_pages, DocumentChunk, TextSplitter};
use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use crate::index::{IndexedChunk, SqliteVectorIndex};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of an ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    /// Number of PDF documents processed.
    pub documents: usize,
    /// Number of chunks written to the index.
    pub chunks_indexed: usize,
}

/// The document ingestion pipeline.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    index_path: PathBuf,
}

impl Ingestor {
    /// Create a new ingestor.
    pub fn new(embedder: Arc<dyn Embedder>, splitter: TextSplitter, index_path: PathBuf) -> Self {
        Self {
            embedder,
            splitter,
            index_path,
        }
    }

    /// Ingest every PDF in a directory and rebuild the vector index.
    ///
    /// The previous index is replaced only after the new one is fully built;
    /// a failure partway through leaves it untouched. Source files stay on
    /// disk regardless of outcome.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn ingest(&self, dir: &Path) -> Result<IngestReport> {
        let pdfs = discover_pdfs(dir)?;
        if pdfs.is_empty() {
            return Err(SvarError::Document(format!(
                "No PDF documents found in {}",
                dir.display()
            )));
        }

        info!("Ingesting {} documents", pdfs.len());

        let mut chunks: Vec<DocumentChunk> = Vec::new();
        let mut readable = 0usize;

        for pdf in &pdfs {
            let source = pdf
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| pdf.display().to_string());

            let pages = match extract_pages(pdf) {
                Ok(pages) => pages,
                Err(e) => {
                    warn!("Skipping unreadable document {}: {}", source, e);
                    continue;
                }
            };
            readable += 1;

            for page in pages {
                for content in self.splitter.split(&page.text) {
                    chunks.push(DocumentChunk {
                        source: source.clone(),
                        page: page.page,
                        order: chunks.len() as i32,
                        content,
                    });
                }
            }
        }

        if readable == 0 {
            return Err(SvarError::Document(format!(
                "No readable PDF documents in {}",
                dir.display()
            )));
        }

        info!("Split into {} chunks", chunks.len());

        // Embed in batch
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(SvarError::Embedding(format!(
                "Provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                IndexedChunk::new(chunk.source, chunk.page, chunk.order, chunk.content, embedding)
            })
            .collect();

        let chunks_indexed = SqliteVectorIndex::rebuild(&self.index_path, &indexed)?;

        Ok(IngestReport {
            documents: readable,
            chunks_indexed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic embedder: maps text length onto a small vector.
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn ingestor(index_path: PathBuf) -> Ingestor {
        Ingestor::new(
            Arc::new(StubEmbedder),
            TextSplitter::new(500, 50).unwrap(),
            index_path,
        )
    }

    #[tokio::test]
    async fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingestor(dir.path().join("index.db"))
            .ingest(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SvarError::Document(_)));
    }

    #[tokio::test]
    async fn test_unreadable_pdfs_only_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();

        let index_path = dir.path().join("index.db");
        let err = ingestor(index_path.clone())
            .ingest(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SvarError::Document(_)));
        // Failure must not create or replace an index
        assert!(!index_path.exists());
    }
}
