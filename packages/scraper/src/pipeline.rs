//! Sequential scrape run: listing → project pages → documents → JSON.
//!
//! A failure is confined to the project it happens in. A project page that
//! cannot be fetched is skipped; a document that cannot be downloaded
//! leaves the project in the output with an empty file list.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use url::Url;
use voz_civica_project_models::{FileReference, LegislationAnalysis, ProjectRecord};

use crate::aggregator::ResultAggregator;
use crate::detail::extract_project;
use crate::documents::fetch_documents;
use crate::listing::extract_project_links;
use crate::progress::ProgressCallback;
use crate::{ScrapeError, ScraperConfig, Session};

/// Error type returned by a [`DocumentAnalyzer`].
pub type AnalyzerError = Box<dyn std::error::Error + Send + Sync>;

/// Produces semantic metadata for a downloaded PDF.
///
/// Implemented outside this crate by the LLM legislation parser.
#[async_trait::async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Analyzes the PDF at `pdf_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or analyzed.
    async fn analyze(&self, pdf_path: &Path) -> Result<LegislationAnalysis, AnalyzerError>;
}

/// One processed project.
#[derive(Debug)]
pub struct ProcessedProject {
    /// The finished record.
    pub record: ProjectRecord,
    /// Why the document phase stopped, if it did.
    pub document_error: Option<ScrapeError>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Project links taken from the search page.
    pub links_found: usize,
    /// Records written to the output.
    pub projects_recorded: usize,
    /// Projects whose page could not be processed.
    pub projects_failed: usize,
    /// Projects recorded without files because a download failed.
    pub document_failures: usize,
    /// Documents saved to disk and referenced in the output.
    pub files_downloaded: usize,
    /// Where the JSON array was written.
    pub output_path: PathBuf,
}

/// Runs a full scrape and writes `projects.json`.
///
/// # Errors
///
/// Returns [`ScrapeError`] only for failures that affect the whole run: an
/// unusable configuration, or an output file that cannot be written.
/// Per-project failures are logged and counted instead.
#[allow(clippy::future_not_send)]
pub async fn run(
    config: &ScraperConfig,
    analyzer: Option<&dyn DocumentAnalyzer>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, ScrapeError> {
    let start = Instant::now();
    let mut session = Session::new(config)?;
    let search_url = config.search_url()?;

    if let Err(e) = session.bootstrap(&search_url).await {
        log::warn!("Session bootstrap failed, continuing without CSRF token: {e}");
    }

    let links = collect_project_links(&session, config, &search_url).await;
    progress.set_total(links.len() as u64);

    let pdf_dir = config.pdf_dir();
    let mut aggregator = ResultAggregator::new();
    let mut projects_failed = 0;
    let mut document_failures = 0;
    let mut files_downloaded = 0;

    for link in &links {
        progress.set_message(format!("Processing {link}"));

        match process_project(&session, link, &pdf_dir, analyzer).await {
            Ok(processed) => {
                if let Some(e) = &processed.document_error {
                    log::error!("Failed to download documents for {link}: {e}");
                    document_failures += 1;
                }
                files_downloaded += processed.record.files.len();
                aggregator.add(processed.record);
            }
            Err(e) => {
                log::error!("Failed to process {link}: {e}");
                projects_failed += 1;
            }
        }

        progress.inc(1);
    }

    let output_path = config.json_path();
    aggregator.save(&output_path)?;

    let summary = RunSummary {
        links_found: links.len(),
        projects_recorded: aggregator.len(),
        projects_failed,
        document_failures,
        files_downloaded,
        output_path,
    };

    log::info!(
        "Scrape complete in {:.1}s: {} recorded, {} failed, {} files",
        start.elapsed().as_secs_f64(),
        summary.projects_recorded,
        summary.projects_failed,
        summary.files_downloaded,
    );
    progress.finish(format!(
        "{} project(s) saved to {}",
        summary.projects_recorded,
        summary.output_path.display()
    ));

    Ok(summary)
}

/// Fetches the search page and extracts project links.
///
/// A failed search is logged and yields no links.
#[allow(clippy::future_not_send)]
pub async fn collect_project_links(
    session: &Session,
    config: &ScraperConfig,
    search_url: &Url,
) -> Vec<String> {
    log::info!("Searching for {} projects...", config.project_type);

    let html = match session.fetch_html(search_url, &config.search_query()).await {
        Ok(html) => html,
        Err(e) => {
            log::error!("Search failed: {e}");
            return Vec::new();
        }
    };

    let links = extract_project_links(
        &html,
        session.base_url(),
        &config.link_marker,
        config.limit,
    );
    log::info!("Found {} project(s) to process", links.len());
    links
}

/// Processes one project page and its documents.
///
/// # Errors
///
/// Returns [`ScrapeError`] if the URL is invalid or the project page cannot
/// be fetched. Document failures are reported in
/// [`ProcessedProject::document_error`] instead.
#[allow(clippy::future_not_send)]
pub async fn process_project(
    session: &Session,
    url: &str,
    pdf_dir: &Path,
    analyzer: Option<&dyn DocumentAnalyzer>,
) -> Result<ProcessedProject, ScrapeError> {
    log::info!("Processing: {url}");
    let project_url = Url::parse(url)?;

    let html = session.fetch_html(&project_url, &[]).await?;
    let page = extract_project(&html, &project_url)?;
    let mut record = page.record;

    log::debug!(
        "[{}] {} metadata field(s), {} document link(s)",
        record.id,
        record.metadata.len(),
        page.documents.len()
    );

    let document_error =
        match fetch_documents(session, &page.documents, &record.id, pdf_dir).await {
            Ok(files) => {
                record.files = match analyzer {
                    Some(analyzer) => analyze_files(analyzer, files).await,
                    None => files,
                };
                None
            }
            Err(e) => Some(e),
        };

    Ok(ProcessedProject {
        record,
        document_error,
    })
}

/// Attaches an analysis to each file; failures leave it unset.
async fn analyze_files(
    analyzer: &dyn DocumentAnalyzer,
    files: Vec<FileReference>,
) -> Vec<FileReference> {
    let mut analyzed = Vec::with_capacity(files.len());

    for file in files {
        let analysis = match analyzer.analyze(Path::new(&file.local_path)).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                log::warn!("Analysis failed for {}: {e}", file.local_path);
                None
            }
        };
        analyzed.push(FileReference { analysis, ..file });
    }

    analyzed
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use voz_civica_project_models::Category;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::progress::null_progress;

    const SEARCH_PAGE: &str = r#"
        <html><head><meta name="csrf-token" content="tok"></head><body>
          <a href="/processos/101">PLL 001/25</a>
          <a href="/processos/102">PLL 002/25</a>
          <a href="/processos/103">PLE 003/25</a>
          <a href="/processos/101">PLL 001/25</a>
        </body></html>
    "#;

    fn detail_page(id: &str) -> String {
        format!(
            r#"<html><body>
              <div data-tab="dados"><dl class="dados">
                <dt>Processo</dt><dd>00{id}/25</dd>
                <dt>Situação</dt><dd>EM TRAMITAÇÃO</dd>
                <dt>Localização Atual</dt><dd>DL - DIRETORIA LEGISLATIVA</dd>
              </dl></div>
              <div data-tab="votacoes"></div>
              <div data-tab="documentos">
                <a href="/docs/{id}/projeto.pdf">Projeto</a>
                <a href="/docs/{id}/parecer.pdf">Parecer: CCJ</a>
              </div>
            </body></html>"#
        )
    }

    async fn mount_html(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
            .mount(server)
            .await;
    }

    async fn mount_pdf(server: &MockServer, route: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer, output_dir: &Path) -> ScraperConfig {
        ScraperConfig {
            base_url: server.uri(),
            output_dir: output_dir.to_path_buf(),
            limit: 5,
            ..ScraperConfig::default()
        }
    }

    fn read_output(path: &Path) -> Vec<ProjectRecord> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn scrapes_projects_end_to_end() {
        let server = MockServer::start().await;
        mount_html(&server, "/processos", SEARCH_PAGE.to_owned()).await;
        for id in ["101", "102"] {
            mount_html(&server, &format!("/processos/{id}"), detail_page(id)).await;
            mount_pdf(&server, &format!("/docs/{id}/projeto.pdf")).await;
            mount_pdf(&server, &format!("/docs/{id}/parecer.pdf")).await;
        }

        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(&server, tmp.path());

        let summary = run(&config, None, &null_progress()).await.unwrap();

        assert_eq!(summary.links_found, 2);
        assert_eq!(summary.projects_recorded, 2);
        assert_eq!(summary.files_downloaded, 4);

        let records = read_output(&config.json_path());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "101");
        assert_eq!(records[1].id, "102");
        for record in &records {
            assert_eq!(record.metadata.len(), 3);
            assert!(record.has_votacoes);
            assert!(!record.has_tramitacoes);
            assert_eq!(record.files.len(), 2);
            assert_eq!(record.files[1].name, "Parecer: CCJ");
            assert!(record.files[1].local_path.ends_with("Parecer CCJ.pdf"));
        }
        assert!(config.pdf_dir().join("102").join("Projeto.pdf").exists());
    }

    #[tokio::test]
    async fn failed_download_keeps_project_without_files() {
        let server = MockServer::start().await;
        mount_html(&server, "/processos", SEARCH_PAGE.to_owned()).await;
        mount_html(&server, "/processos/101", detail_page("101")).await;
        mount_html(&server, "/processos/102", detail_page("102")).await;
        // 101's parecer is missing, so the server falls through to a 404.
        mount_pdf(&server, "/docs/101/projeto.pdf").await;
        mount_pdf(&server, "/docs/102/projeto.pdf").await;
        mount_pdf(&server, "/docs/102/parecer.pdf").await;

        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(&server, tmp.path());

        let summary = run(&config, None, &null_progress()).await.unwrap();

        assert_eq!(summary.projects_recorded, 2);
        assert_eq!(summary.document_failures, 1);

        let records = read_output(&config.json_path());
        assert_eq!(records[0].id, "101");
        assert!(records[0].files.is_empty());
        assert!(!records[0].metadata.is_empty());
        assert_eq!(records[1].files.len(), 2);
        // Bytes fetched before the failure are left in place.
        assert!(config.pdf_dir().join("101").join("Projeto.pdf").exists());
    }

    #[tokio::test]
    async fn failed_project_page_is_skipped() {
        let server = MockServer::start().await;
        mount_html(&server, "/processos", SEARCH_PAGE.to_owned()).await;
        mount_html(&server, "/processos/102", detail_page("102")).await;
        mount_pdf(&server, "/docs/102/projeto.pdf").await;
        mount_pdf(&server, "/docs/102/parecer.pdf").await;

        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(&server, tmp.path());

        let summary = run(&config, None, &null_progress()).await.unwrap();

        assert_eq!(summary.projects_failed, 1);
        let records = read_output(&config.json_path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "102");
    }

    #[tokio::test]
    async fn failed_search_writes_empty_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(&server, tmp.path());

        let summary = run(&config, None, &null_progress()).await.unwrap();

        assert_eq!(summary.links_found, 0);
        assert_eq!(std::fs::read_to_string(config.json_path()).unwrap(), "[]");
    }

    struct CountingAnalyzer {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DocumentAnalyzer for CountingAnalyzer {
        async fn analyze(&self, pdf_path: &Path) -> Result<LegislationAnalysis, AnalyzerError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 1 {
                return Err("model returned garbage".into());
            }
            Ok(LegislationAnalysis {
                resumo: pdf_path.display().to_string(),
                justificativa: String::new(),
                evidencias: Vec::new(),
                categorias: vec![Category::Urbanismo],
            })
        }
    }

    #[tokio::test]
    async fn analysis_failures_do_not_drop_files() {
        let server = MockServer::start().await;
        mount_html(&server, "/processos/101", detail_page("101")).await;
        mount_pdf(&server, "/docs/101/projeto.pdf").await;
        mount_pdf(&server, "/docs/101/parecer.pdf").await;

        let tmp = tempfile::tempdir().unwrap();
        let config = config_for(&server, tmp.path());
        let session = Session::new(&config).unwrap();
        let analyzer = CountingAnalyzer {
            calls: AtomicUsize::new(0),
        };

        let processed = process_project(
            &session,
            &format!("{}/processos/101", server.uri()),
            &config.pdf_dir(),
            Some(&analyzer as &dyn DocumentAnalyzer),
        )
        .await
        .unwrap();

        assert!(processed.document_error.is_none());
        let files = &processed.record.files;
        assert_eq!(files.len(), 2);
        assert_eq!(
            files[0].analysis.as_ref().map(|a| a.resumo.clone()),
            Some(files[0].local_path.clone())
        );
        assert!(files[1].analysis.is_none());
    }
}
