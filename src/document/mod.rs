//! PDF loading and text splitting.
//!
//! Documents enter the system as PDF files in the upload directory. The
//! loader extracts raw text per page and the splitter cuts each page into
//! bounded, overlapping character windows ready for embedding.

mod loader;
mod splitter;

pub use loader::{discover_pdfs, extract_pages, PageText};
pub use splitter::TextSplitter;

/// A bounded segment of a source document, ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    /// Source file name (not the full path).
    pub source: String,
    /// 1-based page number within the source document.
    pub page: u32,
    /// Position of this chunk within the whole ingestion run.
    pub order: i32,
    /// Chunk text.
    pub content: String,
}
