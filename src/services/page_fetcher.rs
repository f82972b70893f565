//! Timeout-bounded HTTP fetching and the HTML helpers built on it.
//!
//! The favicon pipeline and the title resolver reach the network only
//! through [`PageFetcher`], so both can run against an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::types::errors::FetchError;

/// Body and metadata of one successful GET.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// URL after redirects.
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResource {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Fetches a single URL within `timeout`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedResource, FetchError>;
}

/// reqwest-backed [`PageFetcher`].
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, max_body_bytes: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            max_body_bytes,
        })
    }

    async fn fetch_inner(&self, url: &Url, timeout: Duration) -> Result<FetchedResource, FetchError> {
        let mut response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_body_bytes {
                return Err(FetchError::ContentTooLarge(len as usize));
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() > self.max_body_bytes {
                return Err(FetchError::ContentTooLarge(body.len()));
            }
        }

        Ok(FetchedResource {
            final_url,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedResource, FetchError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(FetchError::InvalidUrl(format!("unsupported scheme {}", other))),
        }
        // The request timeout does not always cover a slow body, so bound the whole exchange.
        match tokio::time::timeout(timeout, self.fetch_inner(url, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }
}

/// Text of the document's `<title>`, whitespace collapsed. `None` when absent or blank.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let raw: String = document.select(&selector).next()?.text().collect();
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn is_icon_rel(rel: &str) -> bool {
    rel.split_ascii_whitespace().any(|token| {
        let token = token.to_ascii_lowercase();
        token == "icon" || token.starts_with("apple-touch-icon")
    })
}

/// Icon-family `<link>` targets in document order, resolved to absolute URLs.
///
/// Relative hrefs resolve against `<base href>` when present, else `page_url`.
pub fn extract_icon_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    let base = Selector::parse("base[href]")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone());

    let selector = match Selector::parse("link[rel][href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter(|el| el.value().attr("rel").map_or(false, is_icon_rel))
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| base.join(href).ok())
        .collect()
}

/// Fetches `url` and returns its `<title>`. Any failure yields `None`.
pub async fn fetch_page_title(fetcher: &dyn PageFetcher, url: &str, timeout: Duration) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(url, error = %e, "not fetching title of unparsable URL");
            return None;
        }
    };
    match fetcher.fetch(&parsed, timeout).await {
        Ok(resource) => extract_title(&resource.text()),
        Err(e) => {
            tracing::warn!(url, error = %e, "page title fetch failed");
            None
        }
    }
}
