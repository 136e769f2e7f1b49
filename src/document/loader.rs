//! PDF discovery and text extraction.

use crate::error::{Result, SvarError};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Text extracted from one page of a PDF.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    /// Raw page text.
    pub text: String,
}

/// List all PDF files directly inside a directory (non-recursive).
///
/// Matching is by file extension, case-insensitive. Results are sorted by
/// file name so repeated ingestions see documents in a stable order.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        SvarError::Document(format!("Cannot read directory {}: {}", dir.display(), e))
    })?;

    let mut pdfs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    pdfs.sort();
    Ok(pdfs)
}

/// Extract the text of every page of a PDF.
///
/// Pages that contain no extractable text (scans, pure images) are skipped.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
        SvarError::Document(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    let extracted: Vec<PageText> = pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| PageText {
            page: i as u32 + 1,
            text,
        })
        .collect();

    debug!("Extracted {} non-empty pages", extracted.len());
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let found = discover_pdfs(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_discover_missing_directory_is_document_error() {
        let err = discover_pdfs(Path::new("/nonexistent/svar-test")).unwrap_err();
        assert!(matches!(err, SvarError::Document(_)));
    }

    #[test]
    fn test_discover_empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_pdfs(dir.path()).unwrap().is_empty());
    }
}
