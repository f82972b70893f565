//! Favicon acquisition.
//!
//! Strategies, first success wins:
//!
//! 1. the first icon-family `<link>` of the page, else `{scheme}://{host}/favicon.ico`;
//! 2. the configured lookup service, keyed by domain.
//!
//! Each download is time-bounded and validated through
//! [`image_validation::prepare_icon`]. Failures are logged and never returned.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use url::Url;

use crate::services::image_validation;
use crate::services::page_fetcher::{extract_icon_links, PageFetcher};
use crate::types::settings::FaviconSettings;

/// Per-step timeouts and the lookup service template.
#[derive(Debug, Clone)]
pub struct FaviconPipelineConfig {
    pub page_timeout: Duration,
    pub icon_timeout: Duration,
    pub lookup_timeout: Duration,
    /// `{domain}` is replaced with the page host.
    pub lookup_service_url: String,
}

impl Default for FaviconPipelineConfig {
    fn default() -> Self {
        Self::from(&FaviconSettings::default())
    }
}

impl From<&FaviconSettings> for FaviconPipelineConfig {
    fn from(settings: &FaviconSettings) -> Self {
        Self {
            page_timeout: Duration::from_secs(settings.page_timeout_secs),
            icon_timeout: Duration::from_secs(settings.icon_timeout_secs),
            lookup_timeout: Duration::from_secs(settings.lookup_timeout_secs),
            lookup_service_url: settings.lookup_service_url.clone(),
        }
    }
}

impl FaviconPipelineConfig {
    /// Upper bound on the time one [`FaviconPipeline::acquire`] call can take.
    pub fn total_budget(&self) -> Duration {
        self.page_timeout + self.icon_timeout + self.lookup_timeout
    }
}

pub struct FaviconPipeline {
    fetcher: Arc<dyn PageFetcher>,
    config: FaviconPipelineConfig,
}

impl FaviconPipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: FaviconPipelineConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &FaviconPipelineConfig {
        &self.config
    }

    /// Returns validated image bytes for the page's icon, or `None`.
    pub async fn acquire(&self, page_url: &str) -> Option<Vec<u8>> {
        let page = match Url::parse(page_url) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(url = page_url, error = %e, "cannot acquire favicon for unparsable URL");
                return None;
            }
        };
        let host = match page.host_str().filter(|h| !h.is_empty()) {
            Some(host) => host.to_ascii_lowercase(),
            None => {
                tracing::warn!(url = page_url, "cannot acquire favicon for URL without host");
                return None;
            }
        };

        let candidate = match self.discover_icon(&page).await {
            Some(link) => link,
            None => match Url::parse(&format!("{}://{}/favicon.ico", page.scheme(), host)) {
                Ok(default) => default,
                Err(e) => {
                    tracing::warn!(url = page_url, error = %e, "cannot build default favicon URL");
                    return self.lookup(&host).await;
                }
            },
        };

        if let Some(bytes) = self.download(&candidate, self.config.icon_timeout).await {
            return Some(bytes);
        }
        tracing::info!(url = page_url, icon = %candidate, "direct favicon failed, trying lookup service");
        self.lookup(&host).await
    }

    async fn discover_icon(&self, page: &Url) -> Option<Url> {
        let resource = match self.fetcher.fetch(page, self.config.page_timeout).await {
            Ok(resource) => resource,
            Err(e) => {
                tracing::warn!(url = %page, error = %e, "page fetch for icon discovery failed");
                return None;
            }
        };
        let link = extract_icon_links(&resource.text(), &resource.final_url)
            .into_iter()
            .next();
        tracing::debug!(url = %page, icon = ?link.as_ref().map(Url::as_str), "icon discovery finished");
        link
    }

    async fn download(&self, icon: &Url, timeout: Duration) -> Option<Vec<u8>> {
        if icon.scheme() == "data" {
            let (content_type, body) = decode_data_uri(icon.as_str())?;
            return match image_validation::prepare_icon(content_type.as_deref(), "", &body) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(error = %e, "inline data favicon rejected");
                    None
                }
            };
        }

        let resource = match self.fetcher.fetch(icon, timeout).await {
            Ok(resource) => resource,
            Err(e) => {
                tracing::warn!(icon = %icon, error = %e, "favicon download failed");
                return None;
            }
        };
        match image_validation::prepare_icon(
            resource.content_type.as_deref(),
            resource.final_url.as_str(),
            &resource.body,
        ) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(icon = %icon, error = %e, "downloaded favicon rejected");
                None
            }
        }
    }

    async fn lookup(&self, domain: &str) -> Option<Vec<u8>> {
        let raw = self.config.lookup_service_url.replace("{domain}", domain);
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(lookup = %raw, error = %e, "invalid favicon lookup URL");
                return None;
            }
        };
        let result = self.download(&url, self.config.lookup_timeout).await;
        if result.is_none() {
            tracing::info!(domain, "no favicon available");
        }
        result
    }
}

/// Splits a `data:` URI into its media type and decoded payload.
pub fn decode_data_uri(uri: &str) -> Option<(Option<String>, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;

    let is_base64 = meta
        .rsplit(';')
        .next()
        .map_or(false, |p| p.eq_ignore_ascii_case("base64"));
    let media_type = meta.split(';').next().filter(|m| !m.is_empty()).map(str::to_string);

    let body = if is_base64 {
        let cleaned: String = percent_encoding::percent_decode_str(payload)
            .decode_utf8_lossy()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD.decode(cleaned).ok()?
    } else {
        percent_encoding::percent_decode_str(payload).collect()
    };
    Some((media_type, body))
}
