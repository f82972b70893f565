//! Unit tests for favicon acquisition against an in-memory fetcher, plus one
//! bounded-time run against an unreachable host.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use linkshelf::services::favicon_pipeline::{FaviconPipeline, FaviconPipelineConfig};
use linkshelf::services::page_fetcher::{FetchedResource, HttpPageFetcher, PageFetcher};
use linkshelf::types::errors::FetchError;
use url::Url;

/// Serves canned responses and records every requested URL.
#[derive(Default)]
struct FakeFetcher {
    responses: HashMap<String, (Option<String>, Vec<u8>)>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn with(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(url.to_string(), (Some(content_type.to_string()), body.into()));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<FetchedResource, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.responses.get(url.as_str()) {
            Some((content_type, body)) => Ok(FetchedResource {
                final_url: url.clone(),
                content_type: content_type.clone(),
                body: body.clone(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([0, 128, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn config() -> FaviconPipelineConfig {
    FaviconPipelineConfig {
        lookup_service_url: "https://lookup.test/icons?domain={domain}".to_string(),
        ..FaviconPipelineConfig::default()
    }
}

/// Helper: pipeline over `fetcher`, keeping a handle to inspect requests.
fn setup(fetcher: FakeFetcher) -> (FaviconPipeline, Arc<FakeFetcher>) {
    let fetcher = Arc::new(fetcher);
    (FaviconPipeline::new(fetcher.clone(), config()), fetcher)
}

/// The first icon link of the page wins.
#[tokio::test]
async fn test_uses_first_icon_link() {
    let html = r#"<html><head>
        <link rel="stylesheet" href="/style.css">
        <link rel="icon" href="/static/icon.png">
        <link rel="apple-touch-icon" href="/touch.png">
    </head></html>"#;
    let (pipeline, fetcher) = setup(
        FakeFetcher::default()
            .with("https://example.com/page", "text/html", html)
            .with("https://example.com/static/icon.png", "image/png", png_bytes()),
    );

    let icon = pipeline.acquire("https://example.com/page").await;

    assert_eq!(icon, Some(png_bytes()));
    assert_eq!(
        fetcher.requested(),
        vec!["https://example.com/page", "https://example.com/static/icon.png"]
    );
}

/// Without icon links the root favicon.ico is tried, without the page's port.
#[tokio::test]
async fn test_falls_back_to_root_favicon() {
    let (pipeline, fetcher) = setup(
        FakeFetcher::default()
            .with("https://example.com:8443/docs", "text/html", "<html><head></head></html>")
            .with("https://example.com/favicon.ico", "image/png", png_bytes()),
    );

    assert!(pipeline.acquire("https://example.com:8443/docs").await.is_some());
    assert_eq!(fetcher.requested()[1], "https://example.com/favicon.ico");
}

/// An icon that is not an image falls through to the lookup service.
#[tokio::test]
async fn test_invalid_icon_uses_lookup_service() {
    let (pipeline, fetcher) = setup(
        FakeFetcher::default()
            .with("https://example.com/favicon.ico", "text/html", "<html>404 page</html>")
            .with("https://lookup.test/icons?domain=example.com", "image/png", png_bytes()),
    );

    let icon = pipeline.acquire("https://Example.com/").await;

    assert_eq!(icon, Some(png_bytes()));
    assert_eq!(
        fetcher.requested().last().map(String::as_str),
        Some("https://lookup.test/icons?domain=example.com")
    );
}

#[tokio::test]
async fn test_everything_failing_yields_none() {
    let (pipeline, fetcher) = setup(FakeFetcher::default());

    assert!(pipeline.acquire("https://example.com/").await.is_none());
    assert_eq!(fetcher.requested().len(), 3);
}

/// Inline SVG icons are decoded and rasterized without a request.
#[tokio::test]
async fn test_inline_svg_link_is_rasterized() {
    let html = r#"<link rel="icon" href="data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='8' height='8'%3E%3Crect width='8' height='8'/%3E%3C/svg%3E">"#;
    let (pipeline, fetcher) =
        setup(FakeFetcher::default().with("https://example.com/", "text/html", html));

    let icon = pipeline.acquire("https://example.com/").await.unwrap();

    assert_eq!(image::guess_format(&icon).unwrap(), image::ImageFormat::Png);
    assert_eq!(fetcher.requested(), vec!["https://example.com/"]);
}

#[tokio::test]
async fn test_unparsable_url_yields_none() {
    let (pipeline, fetcher) = setup(FakeFetcher::default());
    assert!(pipeline.acquire("not a url").await.is_none());
    assert!(fetcher.requested().is_empty());
}

/// An unreachable host gives up within the configured budget.
#[tokio::test]
async fn test_unreachable_host_is_bounded() {
    let fetcher = Arc::new(HttpPageFetcher::new("linkshelf-test", 1024 * 1024).unwrap());
    let config = FaviconPipelineConfig {
        page_timeout: Duration::from_millis(500),
        icon_timeout: Duration::from_millis(500),
        lookup_timeout: Duration::from_millis(500),
        lookup_service_url: "http://127.0.0.1:1/icons?domain={domain}".to_string(),
    };
    let budget = config.total_budget();
    let pipeline = FaviconPipeline::new(fetcher, config);

    let started = Instant::now();
    let icon = pipeline.acquire("http://127.0.0.1:1/").await;

    assert!(icon.is_none());
    assert!(started.elapsed() < budget + Duration::from_secs(1));
}
