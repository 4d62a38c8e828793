//! HTTP session shared by every request of a scrape run.
//!
//! Cookies persist in the client's store, and once [`Session::bootstrap`]
//! has found a CSRF token on the search page it is sent as
//! `X-CSRF-Token` with every later request.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use url::Url;

use crate::normalize::normalize;
use crate::{ScrapeError, ScraperConfig};

/// Header carrying the Rails CSRF token.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Cookie- and header-preserving HTTP client for one scrape run.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
    base_url: Url,
    csrf_token: Option<String>,
}

/// A fetched response body together with its declared content type.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    /// Value of the `Content-Type` header, or empty if absent.
    pub content_type: String,
    /// Response body decoded as text.
    pub body: String,
}

impl Session {
    /// Builds a session from the scraper configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the base URL or the `Accept` header value
    /// is invalid, or the HTTP client cannot be built.
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        let accept = HeaderValue::from_str(&config.accept).map_err(|e| ScrapeError::Config {
            message: format!("invalid Accept header '{}': {e}", config.accept),
        })?;
        headers.insert(ACCEPT, accept);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
            csrf_token: None,
        })
    }

    /// Site root that relative links are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The CSRF token captured by [`Self::bootstrap`], if any.
    #[must_use]
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Loads `url` once to collect session cookies and the CSRF token.
    ///
    /// A page without a `csrf-token` meta tag is not an error: later
    /// requests simply go out without the header.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the request fails or returns a
    /// non-success status.
    pub async fn bootstrap(&mut self, url: &Url) -> Result<(), ScrapeError> {
        log::info!("Loading {url} for session cookies");
        let page = self.fetch_page(url, &[]).await?;

        match extract_csrf_token(&page.body) {
            Some(token) => {
                log::info!("CSRF token captured; attaching it to subsequent requests");
                self.csrf_token = Some(token);
            }
            None => log::warn!("No csrf-token meta tag found on {url}; continuing without it"),
        }

        Ok(())
    }

    /// Starts a GET request carrying the session's CSRF token.
    pub(crate) fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    /// Sends a GET and fails on any non-success status.
    pub(crate) async fn send(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, ScrapeError> {
        let mut request = self.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// Fetches a page as raw text along with its content type.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the request fails, the status is not
    /// 2xx, or the body cannot be read.
    pub async fn fetch_page(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<FetchedPage, ScrapeError> {
        let response = self.send(url, query).await?;

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = response.text().await?;

        log::debug!(
            "Fetched {} bytes ({content_type}) from {final_url}",
            body.len()
        );

        Ok(FetchedPage {
            url: final_url,
            content_type,
            body,
        })
    }

    /// Fetches a page and normalizes script responses to HTML.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_page`].
    pub async fn fetch_html(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<String, ScrapeError> {
        let page = self.fetch_page(url, query).await?;
        Ok(normalize(&page.body, &page.content_type))
    }
}

/// Reads the `content` of `<meta name="csrf-token">`.
#[must_use]
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(r#"meta[name="csrf-token"]"#).unwrap_or_else(|_| unreachable!());

    document
        .select(&selector)
        .find_map(|meta| meta.value().attr("content"))
        .map(str::to_owned)
}
