//! SQLite-backed vector index.
//!
//! Embeddings are stored as little-endian f32 blobs and ranked by cosine
//! similarity in Rust. Rebuilds write a fresh database file next to the
//! target path and rename it into place, so a failed ingestion never
//! disturbs the previous index.

use super::{cosine_similarity, IndexedChunk, SearchHit};
use crate::error::{Result, SvarError};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    page INTEGER NOT NULL,
    chunk_order INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
"#;

/// SQLite-backed vector index.
#[derive(Debug)]
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
}

impl SqliteVectorIndex {
    /// Open an existing index for querying.
    ///
    /// Fails with `IndexNotFound` when nothing has been ingested yet.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SvarError::IndexNotFound(path.display().to_string()));
        }

        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Build a fresh index from `chunks` and atomically replace whatever is
    /// at `path`. Returns the number of chunks written.
    #[instrument(skip(chunks), fields(path = %path.display(), chunks = chunks.len()))]
    pub fn rebuild(path: &Path, chunks: &[IndexedChunk]) -> Result<usize> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        // Same directory as the target so the final rename stays on one filesystem
        let staged = tempfile::Builder::new()
            .prefix(".index-rebuild")
            .suffix(".db")
            .tempfile_in(parent)?;

        {
            let mut conn = Connection::open(staged.path())?;
            conn.execute_batch(SCHEMA)?;

            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO chunks
                    (id, source, page, chunk_order, content, embedding, indexed_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                )?;

                for chunk in chunks {
                    stmt.execute(params![
                        chunk.id.to_string(),
                        chunk.source,
                        chunk.page,
                        chunk.chunk_order,
                        chunk.content,
                        embedding_to_bytes(&chunk.embedding),
                        chunk.indexed_at.to_rfc3339(),
                    ])?;
                }
            }
            tx.commit()?;

            conn.close()
                .map_err(|(_, e)| SvarError::VectorStore(format!("Failed to close index: {}", e)))?;
        }

        staged
            .persist(path)
            .map_err(|e| SvarError::VectorStore(format!("Failed to replace index: {}", e)))?;

        info!("Rebuilt vector index with {} chunks", chunks.len());
        Ok(chunks.len())
    }

    /// Rank all stored chunks against a query embedding.
    pub fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SvarError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            "SELECT id, source, page, chunk_order, content, embedding, indexed_at FROM chunks",
        )?;

        let chunks = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(5)?;
            let indexed_at: String = row.get(6)?;
            Ok(IndexedChunk {
                id: id.parse().unwrap_or_default(),
                source: row.get(1)?,
                page: row.get(2)?,
                chunk_order: row.get(3)?,
                content: row.get(4)?,
                embedding: bytes_to_embedding(&embedding_bytes),
                indexed_at: indexed_at
                    .parse()
                    .unwrap_or_else(|_| chrono::Utc::now()),
            })
        })?;

        let mut hits: Vec<SearchHit> = Vec::new();
        for chunk in chunks {
            let chunk = chunk?;
            let score = cosine_similarity(query_embedding, &chunk.embedding);
            if score >= min_score {
                hits.push(SearchHit { chunk, score });
            }
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }

    /// Total number of stored chunks.
    pub fn chunk_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SvarError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Serialize embedding to little-endian bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from little-endian bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(order: i32, content: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk::new("doc.pdf".to_string(), 1, order, content.to_string(), embedding)
    }

    #[test]
    fn test_embedding_roundtrip() {
        let embedding = vec![0.5, -1.25, 3.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes_to_embedding(&bytes), embedding);
    }

    #[test]
    fn test_open_missing_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteVectorIndex::open(&dir.path().join("index.db")).unwrap_err();
        assert!(matches!(err, SvarError::IndexNotFound(_)));
    }

    #[test]
    fn test_rebuild_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        let chunks = vec![
            chunk(0, "the quick brown fox", vec![1.0, 0.0, 0.0]),
            chunk(1, "jumps over the lazy dog", vec![0.0, 1.0, 0.0]),
        ];
        assert_eq!(SqliteVectorIndex::rebuild(&path, &chunks).unwrap(), 2);

        let index = SqliteVectorIndex::open(&path).unwrap();
        assert_eq!(index.chunk_count().unwrap(), 2);

        let hits = index.search(&[1.0, 0.0, 0.0], 10, 0.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.content, "the quick brown fox");
        assert!(hits[0].score > hits[1].score);

        // min_score filters out the orthogonal chunk
        let hits = index.search(&[1.0, 0.0, 0.0], 10, 0.5).unwrap();
        assert_eq!(hits.len(), 1);

        // limit truncates
        let hits = index.search(&[1.0, 0.0, 0.0], 1, 0.0).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_rebuild_replaces_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        let first = vec![
            chunk(0, "first", vec![1.0, 0.0]),
            chunk(1, "second", vec![0.0, 1.0]),
            chunk(2, "third", vec![1.0, 1.0]),
        ];
        SqliteVectorIndex::rebuild(&path, &first).unwrap();

        let second = vec![chunk(0, "only", vec![1.0, 0.0])];
        SqliteVectorIndex::rebuild(&path, &second).unwrap();

        let index = SqliteVectorIndex::open(&path).unwrap();
        assert_eq!(index.chunk_count().unwrap(), 1);
        let hits = index.search(&[1.0, 0.0], 10, 0.0).unwrap();
        assert_eq!(hits[0].chunk.content, "only");
    }

    #[test]
    fn test_rebuild_with_no_chunks_produces_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        SqliteVectorIndex::rebuild(&path, &[]).unwrap();
        let index = SqliteVectorIndex::open(&path).unwrap();
        assert_eq!(index.chunk_count().unwrap(), 0);
        assert!(index.search(&[1.0], 5, 0.0).unwrap().is_empty());
    }
}
