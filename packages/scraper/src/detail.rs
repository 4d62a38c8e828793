//! Project detail page extraction.
//!
//! A project page is split into tab containers flagged with a `data-tab`
//! attribute. The "dados" tab holds a `<dl class="dados">` of label/value
//! pairs, "votacoes" and "tramitacoes" are only checked for presence, and
//! "documentos" lists the attached files.

use scraper::{ElementRef, Html, Selector};
use unicode_normalization::UnicodeNormalization as _;
use url::Url;
use voz_civica_project_models::{ProjectMetadata, ProjectRecord};

use crate::ScrapeError;
use crate::documents::{DocumentLink, FALLBACK_NAME};
use crate::listing::visible_text;

/// Everything extracted from one project page.
///
/// `record.files` is always empty here; it is filled once the documents
/// have been downloaded.
#[derive(Debug, Clone)]
pub struct ProjectPage {
    /// The project record, without files.
    pub record: ProjectRecord,
    /// PDF links found in the "documentos" tab, in page order.
    pub documents: Vec<DocumentLink>,
}

/// Derives a project id from the last path segment of its URL.
///
/// The segment is not required to be numeric.
///
/// # Errors
///
/// Returns [`ScrapeError::EmptyProjectId`] if the URL has no path segments
/// or ends with a slash.
pub fn project_id_from_url(url: &Url) -> Result<String, ScrapeError> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ScrapeError::EmptyProjectId {
            url: url.to_string(),
        })
}

/// Turns a field label into a metadata key.
///
/// Accents are stripped via NFKD decomposition, anything left outside ASCII
/// is dropped, the text is lowercased, every run of characters outside
/// `[a-z0-9]` becomes a single `_`, and leading and trailing underscores
/// are removed.
#[must_use]
pub fn normalize_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let mut pending_underscore = false;

    for c in label.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_underscore && !key.is_empty() {
                key.push('_');
            }
            pending_underscore = false;
            key.push(c);
        } else {
            pending_underscore = true;
        }
    }

    key
}

/// Parses a project page.
///
/// Missing tab containers are not errors: an absent "dados" tab yields
/// empty metadata (with a warning), absent tabs yield `false` flags and an
/// absent "documentos" tab yields no documents.
///
/// # Errors
///
/// Returns [`ScrapeError::EmptyProjectId`] if no id can be derived from
/// `project_url`.
pub fn extract_project(html: &str, project_url: &Url) -> Result<ProjectPage, ScrapeError> {
    let id = project_id_from_url(project_url)?;
    let document = Html::parse_document(html);

    let metadata = match tab(&document, "dados") {
        Some(container) => extract_metadata(container),
        None => {
            log::warn!("No identification tab on {project_url}; metadata will be empty");
            ProjectMetadata::new()
        }
    };

    let has_votacoes = tab(&document, "votacoes").is_some();
    let has_tramitacoes = tab(&document, "tramitacoes").is_some();

    let documents = tab(&document, "documentos")
        .map(|container| extract_document_links(container, project_url))
        .unwrap_or_default();

    Ok(ProjectPage {
        record: ProjectRecord {
            url: project_url.to_string(),
            id,
            metadata,
            has_votacoes,
            has_tramitacoes,
            files: Vec::new(),
        },
        documents,
    })
}

/// Finds the first element flagged `data-tab="<name>"`.
fn tab<'a>(document: &'a Html, name: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(&format!(r#"[data-tab="{name}"]"#)).ok()?;
    document.select(&selector).next()
}

/// Reads `dl.dados` label/value pairs.
///
/// A `dt` counts only when its next element sibling is a `dd`.
fn extract_metadata(container: ElementRef<'_>) -> ProjectMetadata {
    let label_sel = Selector::parse("dl.dados dt").unwrap_or_else(|_| unreachable!());
    let mut metadata = ProjectMetadata::new();

    for label in container.select(&label_sel) {
        let Some(value) = label.next_siblings().find_map(ElementRef::wrap) else {
            continue;
        };
        if value.value().name() != "dd" {
            continue;
        }

        let key = normalize_key(&visible_text(label));
        metadata.insert(key, visible_text(value));
    }

    metadata
}

/// Collects links whose resolved path ends in `.pdf`.
fn extract_document_links(container: ElementRef<'_>, page_url: &Url) -> Vec<DocumentLink> {
    let anchor_sel = Selector::parse("a[href]").unwrap_or_else(|_| unreachable!());

    container
        .select(&anchor_sel)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let remote_url = page_url.join(href).ok()?;
            if !remote_url.path().to_ascii_lowercase().ends_with(".pdf") {
                return None;
            }

            let text = visible_text(anchor);
            let name = if text.is_empty() {
                FALLBACK_NAME.to_owned()
            } else {
                text
            };

            Some(DocumentLink { name, remote_url })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use voz_civica_project_models::WellKnownKey;

    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div data-tab="dados">
            <dl class="dados">
              <dt>Processo:</dt><dd> 00362/25 </dd>
              <dt>Situação Plenária:</dt>
              <dd>
                APROVADO
              </dd>
              <dt>Sem valor</dt>
              <dt>Autores</dt><dd>Fulana <b>(PSOL)</b></dd>
            </dl>
          </div>
          <div data-tab="votacoes"><table></table></div>
          <div data-tab="documentos">
            <a href="/documentos/1/projeto.pdf">Projeto</a>
            <a href="https://cdn.example.com/Parecer.PDF?v=2"> </a>
            <a href="/documentos/3/planilha.xlsx">Planilha</a>
            <a href="/processos/140595">Voltar</a>
          </div>
        </body></html>
    "#;

    fn url() -> Url {
        Url::parse("https://www.camarapoa.rs.gov.br/processos/140595").unwrap()
    }

    #[test]
    fn normalizes_accented_labels() {
        assert_eq!(normalize_key("Situação Plenária:"), "situacao_plenaria");
        assert_eq!(normalize_key("Data de Criação"), "data_de_criacao");
        assert_eq!(normalize_key("  --Última   Tramitação--  "), "ultima_tramitacao");
        assert_eq!(normalize_key("Nº do Processo"), "no_do_processo");
        assert_eq!(normalize_key("!!!"), "");
    }

    #[test]
    fn key_normalization_is_deterministic() {
        let first = normalize_key("Localização Atual");
        let _ = normalize_key("something else");
        assert_eq!(normalize_key("Localização Atual"), first);
    }

    #[test]
    fn derives_id_from_last_segment() {
        assert_eq!(project_id_from_url(&url()).unwrap(), "140595");

        let odd = Url::parse("https://x.test/processos/abc").unwrap();
        assert_eq!(project_id_from_url(&odd).unwrap(), "abc");

        let trailing = Url::parse("https://x.test/processos/").unwrap();
        assert!(matches!(
            project_id_from_url(&trailing),
            Err(ScrapeError::EmptyProjectId { .. })
        ));
    }

    #[test]
    fn extracts_metadata_in_page_order() {
        let page = extract_project(PAGE, &url()).unwrap();
        let metadata = &page.record.metadata;

        let pairs: Vec<(&str, &str)> = metadata.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("processo", "00362/25"),
                ("situacao_plenaria", "APROVADO"),
                ("autores", "Fulana (PSOL)"),
            ]
        );
        assert_eq!(
            metadata.well_known(WellKnownKey::SituacaoPlenaria),
            Some("APROVADO")
        );
    }

    #[test]
    fn detects_tabs() {
        let page = extract_project(PAGE, &url()).unwrap();
        assert!(page.record.has_votacoes);
        assert!(!page.record.has_tramitacoes);
        assert_eq!(page.record.id, "140595");
        assert!(page.record.files.is_empty());
    }

    #[test]
    fn collects_pdf_links_only() {
        let page = extract_project(PAGE, &url()).unwrap();

        let found: Vec<(&str, &str)> = page
            .documents
            .iter()
            .map(|d| (d.name.as_str(), d.remote_url.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (
                    "Projeto",
                    "https://www.camarapoa.rs.gov.br/documentos/1/projeto.pdf"
                ),
                ("document", "https://cdn.example.com/Parecer.PDF?v=2"),
            ]
        );
    }

    #[test]
    fn missing_sections_yield_defaults() {
        let page = extract_project("<html><body><p>vazio</p></body></html>", &url()).unwrap();
        assert!(page.record.metadata.is_empty());
        assert!(!page.record.has_votacoes);
        assert!(!page.record.has_tramitacoes);
        assert!(page.documents.is_empty());
    }
}
