//! Search results → project URLs.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Project detail links end in `/processos/<digits>`.
static PROJECT_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/processos/\d+$").unwrap_or_else(|_| unreachable!()));

/// Extracts project detail URLs from a search results page.
///
/// Only anchors whose `href` ends in `/processos/<digits>` and whose
/// visible text contains `marker` (case-insensitively) are kept. Each is
/// resolved against `base_url`, duplicates are dropped while keeping the
/// first occurrence, and the result is cut to `limit` entries.
#[must_use]
pub fn extract_project_links(
    html: &str,
    base_url: &Url,
    marker: &str,
    limit: usize,
) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_sel = Selector::parse("a[href]").unwrap_or_else(|_| unreachable!());
    let marker = marker.to_uppercase();

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut links: Vec<String> = Vec::new();

    for anchor in document.select(&anchor_sel) {
        if links.len() >= limit {
            break;
        }

        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !PROJECT_HREF.is_match(href) {
            continue;
        }
        if !visible_text(anchor).to_uppercase().contains(&marker) {
            continue;
        }

        let url = match base_url.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                log::debug!("Skipping unresolvable project link '{href}': {e}");
                continue;
            }
        };

        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

/// Text content of an element with whitespace runs collapsed and trimmed.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
