//! Character-window text splitting.

use crate::error::{Result, SvarError};

/// Splits text into overlapping character windows.
///
/// Consecutive chunks share exactly `chunk_overlap` characters and no chunk
/// exceeds `chunk_size` characters. Boundaries fall wherever the window
/// lands; there is no sentence or word alignment.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter. `chunk_size` must be positive and `chunk_overlap`
    /// strictly smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SvarError::InvalidInput(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(SvarError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split text into chunks. Whitespace-only windows are dropped.
    ///
    /// Operates on characters, not bytes, so multi-byte text never splits
    /// inside a code point.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(10, 10).is_err());
        assert!(TextSplitter::new(10, 15).is_err());
        assert!(TextSplitter::new(10, 9).is_ok());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::new(100, 20).unwrap();
        let chunks = splitter.split("hello world");
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let splitter = TextSplitter::new(100, 20).unwrap();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n  ").is_empty());
    }

    #[test]
    fn test_chunk_length_bound_and_overlap() {
        let size = 10;
        let overlap = 3;
        let splitter = TextSplitter::new(size, overlap).unwrap();
        let text: String = ('a'..='z').collect();

        let chunks = splitter.split(&text);
        assert!(chunks.len() > 1);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= size);
        }

        // Each full-size chunk shares exactly `overlap` characters with its successor
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            if prev.len() == size {
                let tail: String = prev[prev.len() - overlap..].iter().collect();
                let head: String = pair[1].chars().take(overlap).collect();
                assert_eq!(tail, head);
            }
        }
    }

    #[test]
    fn test_covers_entire_text() {
        let splitter = TextSplitter::new(7, 2).unwrap();
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";
        let chunks = splitter.split(text);

        // Stitching chunks back together (dropping each successor's overlap)
        // must reproduce the input.
        let mut rebuilt: String = chunks[0].clone();
        for chunk in &chunks[1..] {
            let chars: Vec<char> = chunk.chars().collect();
            rebuilt.extend(&chars[2.min(chars.len())..]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_multibyte_text_never_panics() {
        let splitter = TextSplitter::new(5, 2).unwrap();
        let chunks = splitter.split("æøå日本語テキストのチャンク分割");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 5);
        }
    }
}
