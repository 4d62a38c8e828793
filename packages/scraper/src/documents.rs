//! Document downloads.
//!
//! Each PDF linked from a project's "documentos" tab is streamed to
//! `<pdf_dir>/<project id>/<sanitized name>.pdf`. Nothing is retried, and
//! a failed download leaves whatever bytes were already written on disk.

use std::path::{Path, PathBuf};

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;
use url::Url;
use voz_civica_project_models::FileReference;

use crate::{ScrapeError, Session};

/// Name used when a link has no text or its text sanitizes to nothing.
pub const FALLBACK_NAME: &str = "document";

/// Characters that are not allowed in generated filenames.
const FORBIDDEN_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// A PDF link found on a project page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    /// Link text as displayed (or [`FALLBACK_NAME`]).
    pub name: String,
    /// Absolute URL of the document.
    pub remote_url: Url,
}

/// Builds a filename from a document's display name.
///
/// Strips `\ / * ? : " < > |`, trims surrounding whitespace, falls back to
/// [`FALLBACK_NAME`] when nothing is left, and appends `.pdf` unless the
/// name already ends with it (case-insensitively).
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect();
    let trimmed = stripped.trim();
    let base = if trimmed.is_empty() {
        FALLBACK_NAME
    } else {
        trimmed
    };

    if base.to_ascii_lowercase().ends_with(".pdf") {
        base.to_owned()
    } else {
        format!("{base}.pdf")
    }
}

/// Directory holding one project's documents.
#[must_use]
pub fn project_dir(pdf_dir: &Path, project_id: &str) -> PathBuf {
    pdf_dir.join(project_id)
}

/// Downloads every document of a project, in order.
///
/// The project directory is created when there is at least one link.
///
/// # Errors
///
/// Returns the first [`ScrapeError`] hit; documents downloaded before it
/// stay on disk but are not returned.
pub async fn fetch_documents(
    session: &Session,
    links: &[DocumentLink],
    project_id: &str,
    pdf_dir: &Path,
) -> Result<Vec<FileReference>, ScrapeError> {
    if links.is_empty() {
        return Ok(Vec::new());
    }

    let dir = project_dir(pdf_dir, project_id);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ScrapeError::io(&dir, e))?;

    let mut files = Vec::with_capacity(links.len());

    for link in links {
        let dest = dir.join(sanitize_filename(&link.name));
        let bytes = download_file(session, &link.remote_url, &dest).await?;
        log::info!(
            "[{project_id}] saved '{}' ({bytes} bytes) -> {}",
            link.name,
            dest.display()
        );

        files.push(FileReference {
            name: link.name.clone(),
            local_path: dest.display().to_string(),
            remote_url: link.remote_url.to_string(),
            analysis: None,
        });
    }

    Ok(files)
}

/// Streams a remote file to `dest`, returning the number of bytes written.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the request fails, the status is not 2xx, or
/// the file cannot be written.
pub async fn download_file(session: &Session, url: &Url, dest: &Path) -> Result<u64, ScrapeError> {
    log::debug!("Downloading {url} -> {}", dest.display());

    let response = session.send(url, &[]).await?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| ScrapeError::io(dest, e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ScrapeError::io(dest, e))?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| ScrapeError::io(dest, e))?;

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ScraperConfig;

    #[test]
    fn strips_forbidden_characters() {
        let name = sanitize_filename("Parecer: Jurídico/Final");
        assert_eq!(name, "Parecer JurídicoFinal.pdf");
        assert!(!name.chars().any(|c| FORBIDDEN_CHARS.contains(&c)));
        assert_eq!(name, name.trim());
    }

    #[test]
    fn keeps_existing_pdf_suffix() {
        assert_eq!(sanitize_filename("Lei 14.244.PDF"), "Lei 14.244.PDF");
        assert_eq!(sanitize_filename("  anexo.pdf  "), "anexo.pdf");
    }

    #[test]
    fn falls_back_when_nothing_is_left() {
        assert_eq!(sanitize_filename(r#" /\:*?"<>| "#), "document.pdf");
        assert_eq!(sanitize_filename(""), "document.pdf");
    }

    #[tokio::test]
    async fn downloads_into_project_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/projeto.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 fake".to_vec()))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let config = ScraperConfig {
            base_url: server.uri(),
            ..ScraperConfig::default()
        };
        let session = Session::new(&config).unwrap();
        let links = vec![DocumentLink {
            name: "Projeto".to_owned(),
            remote_url: Url::parse(&format!("{}/docs/projeto.pdf", server.uri())).unwrap(),
        }];

        let files = fetch_documents(&session, &links, "77", tmp.path()).await.unwrap();

        assert_eq!(files.len(), 1);
        let expected = tmp.path().join("77").join("Projeto.pdf");
        assert_eq!(files[0].local_path, expected.display().to_string());
        assert_eq!(files[0].name, "Projeto");
        assert_eq!(std::fs::read(expected).unwrap(), b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn non_success_status_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let config = ScraperConfig {
            base_url: server.uri(),
            ..ScraperConfig::default()
        };
        let session = Session::new(&config).unwrap();
        let links = vec![DocumentLink {
            name: "Projeto".to_owned(),
            remote_url: Url::parse(&format!("{}/missing.pdf", server.uri())).unwrap(),
        }];

        let err = fetch_documents(&session, &links, "77", tmp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn no_links_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::new(&ScraperConfig::default()).unwrap();

        let files = fetch_documents(&session, &[], "77", tmp.path()).await.unwrap();

        assert!(files.is_empty());
        assert!(!tmp.path().join("77").exists());
    }
}
