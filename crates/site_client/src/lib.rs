//! Collaborators around the extraction core: page acquisition over HTTP and
//! the local logo cache.

pub mod images;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use std::time::Duration;
use tracing::info;

pub use images::{localize_logos, DiskImageCache, ImageCache, TEAM_LOGO_FOLDER};

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub(crate) fn browser_client() -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pt-PT,pt;q=0.9,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(10))
        .gzip(true)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Fetches listing pages. The HTML it returns is already rendered server side;
/// pages that need a browser must be saved to disk by other means.
pub struct SiteClient {
    client: reqwest::Client,
}

impl Default for SiteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteClient {
    pub fn new() -> Self {
        Self {
            client: browser_client(),
        }
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request failed for {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("HTTP {} for {}", status, url));
        }

        let body = resp
            .text()
            .await
            .with_context(|| format!("read body of {url}"))?;
        info!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
