#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Plain-text extraction for downloaded bill PDFs.
//!
//! Text comes out page by page via [`pdf_extract`]; pages are joined with a
//! form feed so downstream consumers can still tell where one page ends.

use std::path::Path;

/// Separator placed between page texts.
pub const PAGE_SEPARATOR: char = '\u{c}';

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),
}

/// Joins page texts with [`PAGE_SEPARATOR`] and trims the result.
#[must_use]
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut text = String::new();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            text.push(PAGE_SEPARATOR);
        }
        text.push_str(page.as_ref());
    }

    text.trim().to_owned()
}

/// Extracts the text of an in-memory PDF.
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the bytes are not a readable PDF.
pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<String, PdfError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PdfError::Extraction(format!("failed to extract text from PDF: {e}")))?;

    Ok(join_pages(&pages))
}

/// Reads a PDF from disk and extracts its text.
///
/// # Errors
///
/// Returns [`PdfError::Io`] if the file cannot be read or
/// [`PdfError::Extraction`] if it is not a readable PDF.
pub async fn extract_text(path: &Path) -> Result<String, PdfError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| PdfError::Io {
        path: path.display().to_string(),
        source,
    })?;

    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    let path_owned = path.display().to_string();
    let text = tokio::task::spawn_blocking(move || extract_text_from_bytes(&bytes))
        .await
        .map_err(|e| PdfError::Extraction(format!("extraction task failed: {e}")))??;

    log::debug!("Extracted {} characters of text from {path_owned}", text.len());

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_pages_with_form_feed() {
        let pages = ["  Art. 1º Fica instituído", "Art. 2º Esta Lei entra em vigor\n\n"];
        assert_eq!(
            join_pages(&pages),
            "Art. 1º Fica instituído\u{c}Art. 2º Esta Lei entra em vigor"
        );
    }

    #[test]
    fn empty_document_yields_empty_text() {
        let pages: [&str; 0] = [];
        assert_eq!(join_pages(&pages), "");
        assert_eq!(join_pages(&["\n", " "]), "");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_text(&tmp.path().join("absent.pdf")).await.unwrap_err();
        assert!(matches!(err, PdfError::Io { .. }));
    }
}
