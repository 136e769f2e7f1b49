//! Persistent vector index.
//!
//! The index is a flat collection of (embedding, chunk) pairs searched by
//! cosine similarity. Ingestion rebuilds it wholesale; there is no
//! incremental update.

mod sqlite;

pub use sqlite::SqliteVectorIndex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Source document file name.
    pub source: String,
    /// 1-based page number in the source document.
    pub page: u32,
    /// Position of this chunk within the ingestion run.
    pub chunk_order: i32,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexedChunk {
    /// Create a new indexed chunk.
    pub fn new(
        source: String,
        page: u32,
        chunk_order: i32,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            page,
            chunk_order,
            content,
            embedding,
            indexed_at: Utc::now(),
        }
    }

    /// Human-readable source reference, e.g. "report.pdf p.3".
    pub fn format_source(&self) -> String {
        format!("{} p.{}", self.source, self.page)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched chunk.
    pub chunk: IndexedChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_format_source() {
        let chunk = IndexedChunk::new("report.pdf".to_string(), 3, 0, "text".to_string(), vec![]);
        assert_eq!(chunk.format_source(), "report.pdf p.3");
    }
}
